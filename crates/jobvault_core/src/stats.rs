use std::collections::BTreeMap;
use std::fmt;

/// Counter names shared by both passes. Categories carrying a job type or an
/// extension are built with [`RunStats::incr_tagged`].
pub mod keys {
    pub const JOB_PROCESSED: &str = "job_processed";
    pub const JOB_TYPE: &str = "job_type";
    pub const ARCHIVED_NEWLY: &str = "archived_newly";
    pub const SKIPPED_EXISTING: &str = "skipped_existing";
    pub const ARCHIVED_JSON_ONLY_PROMPT_FAILED: &str = "archived_json_only_prompt_failed";
    pub const ERROR_MISSING_FIELD: &str = "error_missing_field";
    pub const ERROR_PARSING_ENQUEUE_TIME: &str = "error_parsing_enqueue_time";
    pub const ERROR_CREATING_DIRECTORY: &str = "error_creating_directory";
    pub const ERROR_WRITING_JSON: &str = "error_writing_json";
    pub const ERROR_WRITING_PROMPT: &str = "error_writing_prompt";

    pub const PAGES_REQUESTED: &str = "pages_requested";
    pub const LISTING_END_REACHED: &str = "listing_end_reached";
    pub const ERROR_LISTING_REQUEST: &str = "error_listing_request";
    pub const ERROR_LISTING_MALFORMED: &str = "error_listing_malformed";
    pub const ERROR_INVALID_JOB_RECORD: &str = "error_invalid_job_record";

    pub const ERROR_JSON_DECODE: &str = "error_json_decode";
    pub const ERROR_FILE_READ: &str = "error_file_read";
    pub const SKIPPED_MISSING_TYPE: &str = "skipped_missing_type";
    pub const SKIPPED_TYPE: &str = "skipped_type";
    pub const PROCESSED_TYPE: &str = "processed_type";
    pub const SKIPPED_NO_IMAGE_PATHS: &str = "skipped_no_image_paths";
    pub const SKIPPED_INVALID_IMAGE_PATHS_FORMAT: &str = "skipped_invalid_image_paths_format";
    pub const SKIPPED_INVALID_IMAGE_URL: &str = "skipped_invalid_image_url";
    pub const SKIPPED_UNSUPPORTED_EXTENSION: &str = "skipped_unsupported_extension";
    pub const SKIPPED_ALREADY_EXISTS: &str = "skipped_already_exists";
    pub const DOWNLOADED_SUCCESSFULLY: &str = "downloaded_successfully";
    pub const ERROR_HTTP: &str = "error_http";
    pub const ERROR_CONNECTION: &str = "error_connection";
    pub const ERROR_TIMEOUT: &str = "error_timeout";
    pub const ERROR_IO_WRITE: &str = "error_io_write";
    pub const ERROR_UNEXPECTED_DOWNLOAD: &str = "error_unexpected_download";

    pub const INTERRUPTED: &str = "interrupted";
}

const ERROR_PREFIX: &str = "error_";

/// Outcome counters for one run. Each run owns its own instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    counts: BTreeMap<String, u64>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&mut self, key: &str) {
        self.add(key, 1);
    }

    /// Increment `<prefix>_<tag>`, e.g. `skipped_type_grid`.
    pub fn incr_tagged(&mut self, prefix: &str, tag: &str) {
        self.incr(&format!("{prefix}_{tag}"));
    }

    pub fn add(&mut self, key: &str, amount: u64) {
        *self.counts.entry(key.to_string()).or_insert(0) += amount;
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn merge(&mut self, other: &RunStats) {
        for (key, value) in &other.counts {
            self.add(key, *value);
        }
    }

    /// Error categories with a non-zero count.
    pub fn errors(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts
            .iter()
            .filter(|(key, count)| key.starts_with(ERROR_PREFIX) && **count > 0)
            .map(|(key, count)| (key.as_str(), *count))
    }

    /// A run is degraded when any error category was counted; the process
    /// exit status reflects this.
    pub fn is_degraded(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(key, count)| (key.as_str(), *count))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.counts.is_empty() {
            return f.write_str("(none)");
        }
        let mut first = true;
        for (key, count) in &self.counts {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{key}={count}")?;
            first = false;
        }
        Ok(())
    }
}
