use std::path::{Path, PathBuf};

use jobvault_logging::vault_warn;
use walkdir::WalkDir;

/// Every structured-metadata artifact (`*.json`) below `root`, in a stable
/// order. Unreadable directories are logged and skipped.
pub fn metadata_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                vault_warn!("Skipping unreadable archive path: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_metadata_file(path))
}

fn is_metadata_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("json")
}
