use jobvault_core::RunStats;
use jobvault_logging::vault_info;
use tokio_util::sync::CancellationToken;

use crate::archive::{ArchiveOutcome, RecordArchiver};
use crate::crawl::{CrawlOptions, Pager, StopReason};
use crate::fetch::ListingSource;

#[derive(Debug, Clone, Default)]
pub struct ArchivePassOptions {
    pub crawl: CrawlOptions,
    /// Re-write entries that are already archived.
    pub overwrite: bool,
    /// Stop after the first page that archived nothing new. Only sound when
    /// nothing newer than the cursor can be missing, so it is off by default
    /// and should only be enabled together with an archive-derived cursor.
    pub stop_when_caught_up: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePassSummary {
    pub pages_requested: u32,
    pub records_seen: usize,
    pub newly_archived: usize,
    pub reference: Option<String>,
    pub stop: Option<StopReason>,
}

/// One crawl + archive pass: page through the listing from `cursor` and hand
/// every job to the archiver.
pub async fn run_archive_pass<S: ListingSource + ?Sized>(
    source: &S,
    archiver: &RecordArchiver,
    cursor: Option<String>,
    options: ArchivePassOptions,
    cancel: &CancellationToken,
    stats: &mut RunStats,
) -> ArchivePassSummary {
    let mut pager = Pager::new(source, options.crawl.clone(), cursor, cancel.clone());
    let mut records_seen = 0;
    let mut newly_archived = 0;

    'pages: while let Some(batch) = pager.next_batch(stats).await {
        let mut new_on_page = 0;
        for record in &batch {
            if cancel.is_cancelled() {
                pager.stop(StopReason::Cancelled);
                break 'pages;
            }
            records_seen += 1;
            let outcome = archiver.archive(record, options.overwrite, stats);
            if matches!(outcome, ArchiveOutcome::NewlyArchived) {
                new_on_page += 1;
            }
        }
        newly_archived += new_on_page;

        if options.stop_when_caught_up && !options.overwrite && new_on_page == 0 {
            vault_info!("Nothing new archived on this page; assuming the archive is up to date");
            pager.stop(StopReason::CaughtUp);
            break;
        }
    }

    let summary = ArchivePassSummary {
        pages_requested: pager.pages_requested(),
        records_seen,
        newly_archived,
        reference: pager.reference().map(str::to_string),
        stop: pager.stop_reason(),
    };
    vault_info!(
        "Archive pass finished: pages={} records={} new={} stop={:?}",
        summary.pages_requested,
        summary.records_seen,
        summary.newly_archived,
        summary.stop
    );
    summary
}
