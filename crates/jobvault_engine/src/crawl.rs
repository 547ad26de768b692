use jobvault_core::{keys, JobRecord, Listing, RunStats};
use jobvault_logging::{vault_error, vault_info};
use tokio_util::sync::CancellationToken;

use crate::fetch::{ListingQuery, ListingSource};
use crate::{FailureKind, FetchError};

/// Jobs requested per listing page.
pub const PAGE_SIZE: usize = 50;

/// The listing endpoint only exposes roughly this many jobs in total, however
/// far a crawl pages. Older jobs are unreachable through paging.
pub const LISTING_WINDOW: usize = 2500;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlOptions {
    /// `None` lists every job type.
    pub job_type: Option<String>,
    /// Highest page number to request.
    pub page_limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page came back empty.
    EndOfListing,
    PageLimit,
    RequestFailed,
    MalformedResponse,
    Cancelled,
    /// A page archived nothing new while resuming from the archive.
    CaughtUp,
}

/// Walks the listing page by page against one reference timestamp.
///
/// The reference is the starting cursor when there is one. Without a cursor
/// the first request goes out without `fromDate`, and the `enqueue_time` of
/// the first job it returns becomes the reference for every later page. It
/// never moves after that, which keeps page numbers meaningful while new jobs
/// keep arriving at the head of the listing.
pub struct Pager<'a, S: ListingSource + ?Sized> {
    source: &'a S,
    options: CrawlOptions,
    reference: Option<String>,
    page: u32,
    cancel: CancellationToken,
    stop: Option<StopReason>,
}

impl<'a, S: ListingSource + ?Sized> Pager<'a, S> {
    pub fn new(
        source: &'a S,
        options: CrawlOptions,
        cursor: Option<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            options,
            reference: cursor,
            page: 1,
            cancel,
            stop: None,
        }
    }

    /// Next non-empty batch, or `None` once the crawl is over.
    pub async fn next_batch(&mut self, stats: &mut RunStats) -> Option<Vec<JobRecord>> {
        if self.stop.is_some() {
            return None;
        }
        if self.options.page_limit.is_some_and(|limit| self.page > limit) {
            vault_info!("Page limit reached after page {}", self.page - 1);
            return self.finish(StopReason::PageLimit);
        }
        if self.cancel.is_cancelled() {
            return self.finish(StopReason::Cancelled);
        }

        let page = self.page;
        let query = ListingQuery {
            job_type: self.options.job_type.clone(),
            from_date: self.reference.clone(),
            page: Some(page),
            amount: PAGE_SIZE,
        };
        vault_info!(
            "Crawling job listing page={} fromDate={:?}",
            page,
            query.from_date
        );
        self.page += 1;
        stats.incr(keys::PAGES_REQUESTED);

        let cancel = self.cancel.clone();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.source.list_jobs(&query) => Some(result),
        };
        let Some(result) = result else {
            return self.finish(StopReason::Cancelled);
        };

        match result {
            Ok(Listing::Jobs { jobs, rejected }) => {
                vault_info!("Got job listing with {} jobs", jobs.len());
                if rejected > 0 {
                    vault_error!(
                        "Listing page {}: dropped {} entries that are not job objects",
                        page,
                        rejected
                    );
                    stats.add(keys::ERROR_INVALID_JOB_RECORD, rejected as u64);
                }
                if self.reference.is_none() {
                    self.reference = jobs
                        .iter()
                        .find_map(JobRecord::enqueue_time_raw)
                        .map(str::to_string);
                    if let Some(reference) = &self.reference {
                        vault_info!("Paging relative to fromDate={}", reference);
                    }
                }
                Some(jobs)
            }
            Ok(Listing::Empty) => {
                vault_info!("Empty job listing page: end of available listing");
                stats.incr(keys::LISTING_END_REACHED);
                self.finish(StopReason::EndOfListing)
            }
            Ok(Listing::Malformed(description)) => {
                vault_error!("Listing page {}: {}", page, description);
                stats.incr(keys::ERROR_LISTING_MALFORMED);
                self.finish(StopReason::MalformedResponse)
            }
            Err(err) => {
                log_request_failure(&err);
                stats.incr(keys::ERROR_LISTING_REQUEST);
                self.finish(StopReason::RequestFailed)
            }
        }
    }

    /// End the crawl early, e.g. after the caller decided it caught up.
    pub fn stop(&mut self, reason: StopReason) {
        self.stop.get_or_insert(reason);
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    /// Frozen `fromDate`, once known.
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Pages requested so far.
    pub fn pages_requested(&self) -> u32 {
        self.page - 1
    }

    fn finish(&mut self, reason: StopReason) -> Option<Vec<JobRecord>> {
        self.stop(reason);
        None
    }
}

fn log_request_failure(err: &FetchError) {
    match err.kind {
        FailureKind::HttpStatus(401) => vault_error!(
            "Listing request unauthorized (401): the session token is invalid or expired"
        ),
        FailureKind::HttpStatus(403) => vault_error!(
            "Listing request forbidden (403): check the user id and account permissions"
        ),
        _ => vault_error!("Listing request failed: {}", err),
    }
}
