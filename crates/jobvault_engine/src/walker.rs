use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use jobvault_core::{eligible_image, image_target, keys, ImagePaths, RunStats, UrlRejection};
use jobvault_logging::{vault_debug, vault_error, vault_info, vault_warn};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::fetch::AssetFetcher;
use crate::tree::metadata_files;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub metadata_files: usize,
    pub downloaded: usize,
    pub cancelled: bool,
}

/// Fills in images referenced by archived metadata that are not on disk yet.
///
/// Safe to re-run at any time: existing images are never fetched again, and a
/// failed download leaves nothing under the final name.
pub struct AssetWalker<'a, F: AssetFetcher + ?Sized> {
    fetcher: &'a F,
    type_filter: BTreeSet<String>,
    cancel: CancellationToken,
}

enum FileOutcome {
    Done { downloaded: usize },
    Cancelled { downloaded: usize },
}

impl<'a, F: AssetFetcher + ?Sized> AssetWalker<'a, F> {
    /// An empty `type_filter` accepts every job type.
    pub fn new(fetcher: &'a F, type_filter: BTreeSet<String>, cancel: CancellationToken) -> Self {
        Self {
            fetcher,
            type_filter,
            cancel,
        }
    }

    pub async fn complete(&self, archive_root: &Path, stats: &mut RunStats) -> WalkSummary {
        vault_info!("Walking archive root {:?}", archive_root);
        if self.type_filter.is_empty() {
            vault_info!("Downloading images for all job types");
        } else {
            vault_info!("Downloading images for job types {:?}", self.type_filter);
        }

        let mut summary = WalkSummary::default();
        for path in metadata_files(archive_root) {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            summary.metadata_files += 1;
            match self.process_file(&path, stats).await {
                FileOutcome::Done { downloaded } => summary.downloaded += downloaded,
                FileOutcome::Cancelled { downloaded } => {
                    summary.downloaded += downloaded;
                    summary.cancelled = true;
                    break;
                }
            }
            // Lets the interrupt listener run on a single-threaded runtime.
            tokio::task::yield_now().await;
        }

        if summary.metadata_files == 0 && !summary.cancelled {
            vault_warn!("No metadata files found under {:?}", archive_root);
        }
        summary
    }

    async fn process_file(&self, path: &Path, stats: &mut RunStats) -> FileOutcome {
        vault_debug!("Processing metadata file {:?}", path);
        let nothing = FileOutcome::Done { downloaded: 0 };

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                vault_error!("Error reading file {:?}: {}", path, err);
                stats.incr(keys::ERROR_FILE_READ);
                return nothing;
            }
        };
        let job: Value = match serde_json::from_str(&text) {
            Ok(job) => job,
            Err(err) => {
                vault_error!("Error decoding JSON from {:?}: {}", path, err);
                stats.incr(keys::ERROR_JSON_DECODE);
                return nothing;
            }
        };
        let job_id = job.get("id").and_then(Value::as_str).unwrap_or("unknown_id");

        let Some(job_type) = job
            .get("type")
            .and_then(Value::as_str)
            .filter(|job_type| !job_type.is_empty())
        else {
            vault_warn!("Job type missing in {:?} for job {}", path, job_id);
            stats.incr(keys::SKIPPED_MISSING_TYPE);
            return nothing;
        };
        if !self.type_filter.is_empty() && !self.type_filter.contains(job_type) {
            vault_debug!("Skipping job {} of type '{}'", job_id, job_type);
            stats.incr_tagged(keys::SKIPPED_TYPE, job_type);
            return nothing;
        }
        stats.incr_tagged(keys::PROCESSED_TYPE, job_type);

        let urls = match ImagePaths::from_field(job.get("image_paths")) {
            ImagePaths::Urls(urls) => urls,
            ImagePaths::None => {
                vault_debug!("No image_paths for job {} ({:?})", job_id, path);
                stats.incr(keys::SKIPPED_NO_IMAGE_PATHS);
                return nothing;
            }
            ImagePaths::Invalid => {
                vault_warn!("image_paths in {:?} for job {} is not a list", path, job_id);
                stats.incr(keys::SKIPPED_INVALID_IMAGE_PATHS_FORMAT);
                return nothing;
            }
        };

        let mut downloaded = 0;
        for (index, entry) in urls.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return FileOutcome::Cancelled { downloaded };
            }
            let (url, extension) = match eligible_image(entry) {
                Ok(eligible) => eligible,
                Err(UrlRejection::Invalid) => {
                    vault_warn!("Invalid image URL {} for job {}", entry, job_id);
                    stats.incr(keys::SKIPPED_INVALID_IMAGE_URL);
                    continue;
                }
                Err(UrlRejection::UnsupportedExtension(extension)) => {
                    vault_warn!(
                        "Unsupported image extension '{}' in {} for job {}",
                        extension,
                        entry,
                        job_id
                    );
                    stats.incr_tagged(keys::SKIPPED_UNSUPPORTED_EXTENSION, &extension);
                    continue;
                }
            };

            let target = image_target(path, index, urls.len(), &extension);
            if target.exists() {
                vault_debug!("Image already exists, skipping {:?}", target);
                stats.incr(keys::SKIPPED_ALREADY_EXISTS);
                continue;
            }

            vault_info!("Downloading {:?} for job {} from {}", target, job_id, url);
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                result = self.fetcher.download(url, &target) => Some(result),
            };
            match result {
                None => return FileOutcome::Cancelled { downloaded },
                Some(Ok(bytes)) => {
                    vault_debug!("Downloaded {} bytes to {:?}", bytes, target);
                    stats.incr(keys::DOWNLOADED_SUCCESSFULLY);
                    downloaded += 1;
                }
                Some(Err(err)) => {
                    vault_error!("Downloading {} for job {} failed: {}", url, job_id, err);
                    stats.incr(err.download_stat_key());
                }
            }
        }
        FileOutcome::Done { downloaded }
    }
}
