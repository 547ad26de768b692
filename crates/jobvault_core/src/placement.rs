use std::path::{Path, PathBuf};

use crate::record::{JobRecord, RecordError};
use crate::timestamp::EnqueueTime;

pub const METADATA_SUFFIX: &str = ".json";
pub const SUMMARY_SUFFIX: &str = ".prompt.txt";

/// Where one job lives inside an archive root.
///
/// The stem depends only on `enqueue_time` and `id`, so re-deriving it for the
/// same job always points at the entry written by an earlier run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryLocation {
    pub dir: PathBuf,
    pub stem: String,
}

impl EntryLocation {
    pub fn new(archive_root: &Path, enqueue_time: &EnqueueTime, id: &str) -> Self {
        Self {
            dir: archive_root.join(enqueue_time.partition_dir()),
            stem: entry_stem(enqueue_time, id),
        }
    }

    pub fn for_record(archive_root: &Path, record: &JobRecord) -> Result<Self, RecordError> {
        let id = record.id().ok_or(RecordError::MissingField("id"))?;
        let enqueue_time = record.enqueue_time()?;
        Ok(Self::new(archive_root, &enqueue_time, id))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(format!("{}{METADATA_SUFFIX}", self.stem))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(format!("{}{SUMMARY_SUFFIX}", self.stem))
    }
}

/// `<YYYYMMDD-HHMMSS>_<id>`
pub fn entry_stem(enqueue_time: &EnqueueTime, id: &str) -> String {
    format!("{}_{}", enqueue_time.compact(), sanitize_id(id))
}

/// Ids are opaque; keep them from escaping the partition directory.
fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect()
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}
