use std::path::{Path, PathBuf};

use jobvault_core::{
    keys, render_summary, EntryLocation, JobRecord, JsonIndent, RecordError, RunStats,
};
use jobvault_logging::{vault_debug, vault_error, vault_info};

use crate::persist::{ensure_output_dir, AtomicFileWriter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    NewlyArchived,
    SkippedExisting,
    Failed(ArchiveFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArchiveFailure {
    #[error("cannot place job record: {0}")]
    InvalidRecord(#[from] RecordError),
    #[error("could not create directory {path:?}: {message}")]
    CreateDir { path: PathBuf, message: String },
    #[error("could not write metadata {path:?}: {message}")]
    WriteMetadata { path: PathBuf, message: String },
    /// The metadata artifact is on disk but its summary is not.
    #[error("metadata written but summary {path:?} failed: {message}")]
    WriteSummary { path: PathBuf, message: String },
}

/// Persists job records as `<stem>.json` + `<stem>.prompt.txt` pairs.
#[derive(Debug, Clone)]
pub struct RecordArchiver {
    archive_root: PathBuf,
    json_indent: JsonIndent,
}

impl RecordArchiver {
    pub fn new(archive_root: PathBuf, json_indent: JsonIndent) -> Self {
        Self {
            archive_root,
            json_indent,
        }
    }

    pub fn archive_root(&self) -> &Path {
        &self.archive_root
    }

    pub fn archive(
        &self,
        record: &JobRecord,
        overwrite: bool,
        stats: &mut RunStats,
    ) -> ArchiveOutcome {
        stats.incr(keys::JOB_PROCESSED);
        stats.incr_tagged(keys::JOB_TYPE, record.job_type().unwrap_or("unknown"));

        let job_id = record.id().unwrap_or("<no id>");
        match self.try_archive(record, overwrite) {
            Ok(Stored::New) => {
                stats.incr(keys::ARCHIVED_NEWLY);
                vault_info!("Archived job {}", job_id);
                ArchiveOutcome::NewlyArchived
            }
            Ok(Stored::Existing) => {
                stats.incr(keys::SKIPPED_EXISTING);
                vault_debug!("Skipping job {}, metadata already archived", job_id);
                ArchiveOutcome::SkippedExisting
            }
            Err(failure) => {
                stats.incr(failure_stat_key(&failure));
                if matches!(failure, ArchiveFailure::WriteSummary { .. }) {
                    stats.incr(keys::ARCHIVED_JSON_ONLY_PROMPT_FAILED);
                }
                vault_error!("Job {}: {}", job_id, failure);
                ArchiveOutcome::Failed(failure)
            }
        }
    }

    fn try_archive(
        &self,
        record: &JobRecord,
        overwrite: bool,
    ) -> Result<Stored, ArchiveFailure> {
        let location = EntryLocation::for_record(&self.archive_root, record)?;
        ensure_output_dir(&location.dir).map_err(|err| ArchiveFailure::CreateDir {
            path: location.dir.clone(),
            message: err.to_string(),
        })?;

        let metadata_path = location.metadata_path();
        let summary_path = location.summary_path();
        if !overwrite && metadata_path.exists() && summary_path.exists() {
            return Ok(Stored::Existing);
        }

        let writer = AtomicFileWriter::new(location.dir.clone());
        let metadata = record
            .to_json(self.json_indent)
            .map_err(|err| err.to_string())
            .and_then(|bytes| {
                writer
                    .write(&file_name(&metadata_path), &bytes)
                    .map_err(|err| err.to_string())
            });
        if let Err(message) = metadata {
            return Err(ArchiveFailure::WriteMetadata {
                path: metadata_path,
                message,
            });
        }

        let summary = render_summary(record);
        writer
            .write(&file_name(&summary_path), summary.as_bytes())
            .map_err(|err| ArchiveFailure::WriteSummary {
                path: summary_path,
                message: err.to_string(),
            })?;

        Ok(Stored::New)
    }
}

enum Stored {
    New,
    Existing,
}

fn failure_stat_key(failure: &ArchiveFailure) -> &'static str {
    match failure {
        ArchiveFailure::InvalidRecord(RecordError::Timestamp(_)) => {
            keys::ERROR_PARSING_ENQUEUE_TIME
        }
        ArchiveFailure::InvalidRecord(_) => keys::ERROR_MISSING_FIELD,
        ArchiveFailure::CreateDir { .. } => keys::ERROR_CREATING_DIRECTORY,
        ArchiveFailure::WriteMetadata { .. } => keys::ERROR_WRITING_JSON,
        ArchiveFailure::WriteSummary { .. } => keys::ERROR_WRITING_PROMPT,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
