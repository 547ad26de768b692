use std::fs;
use std::path::Path;

use jobvault_core::EnqueueTime;
use jobvault_logging::{vault_info, vault_warn};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::tree::metadata_files;

/// The archive scan was interrupted before it finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("archive scan interrupted")]
pub struct ScanCancelled;

/// Starting point for a crawl.
///
/// An explicit value is returned unchanged. Otherwise the archive is scanned
/// and the newest `enqueue_time` found is returned in its original text.
pub async fn resolve_cursor(
    archive_root: &Path,
    explicit: Option<&str>,
    cancel: &CancellationToken,
) -> Result<Option<String>, ScanCancelled> {
    if let Some(explicit) = explicit {
        vault_info!("Using explicit from-date {}", explicit);
        return Ok(Some(explicit.to_string()));
    }
    let latest = latest_enqueue_time(archive_root, cancel).await?;
    match &latest {
        Some(time) => vault_info!("Latest enqueue_time found in archive: {}", time),
        None => vault_info!("No existing enqueue_time found in archive"),
    }
    Ok(latest.map(|time| time.as_str().to_string()))
}

/// Newest parseable `enqueue_time` across all metadata files under `root`.
///
/// `cancel` is checked before every file.
pub async fn latest_enqueue_time(
    root: &Path,
    cancel: &CancellationToken,
) -> Result<Option<EnqueueTime>, ScanCancelled> {
    let mut latest: Option<EnqueueTime> = None;
    for path in metadata_files(root) {
        if cancel.is_cancelled() {
            vault_warn!("Archive scan interrupted before {:?}", path);
            return Err(ScanCancelled);
        }
        if let Some(time) = read_enqueue_time(&path) {
            if latest.as_ref().is_none_or(|current| time > *current) {
                latest = Some(time);
            }
        }
        // Lets the interrupt listener run on a single-threaded runtime.
        tokio::task::yield_now().await;
    }
    Ok(latest)
}

fn read_enqueue_time(path: &Path) -> Option<EnqueueTime> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            vault_warn!("Could not read {:?}: {}", path, err);
            return None;
        }
    };
    let value: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(err) => {
            vault_warn!("Could not decode JSON from {:?}: {}", path, err);
            return None;
        }
    };
    let Some(raw) = value.get("enqueue_time").and_then(Value::as_str) else {
        vault_warn!("No enqueue_time in {:?}", path);
        return None;
    };
    match EnqueueTime::parse(raw) {
        Ok(time) => Some(time),
        Err(err) => {
            vault_warn!("{} in {:?}", err, path);
            None
        }
    }
}
