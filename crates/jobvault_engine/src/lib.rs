//! Jobvault engine: listing crawl, archive writes and image completion.
mod archive;
mod crawl;
mod cursor;
mod fetch;
mod pass;
mod persist;
mod tree;
mod types;
mod walker;

pub use archive::{ArchiveFailure, ArchiveOutcome, RecordArchiver};
pub use crawl::{CrawlOptions, Pager, StopReason, LISTING_WINDOW, PAGE_SIZE};
pub use cursor::{latest_enqueue_time, resolve_cursor, ScanCancelled};
pub use fetch::{
    AssetFetcher, Credentials, FetchSettings, ListingQuery, ListingSource, ReqwestAssetFetcher,
    ReqwestListingSource, DEFAULT_API_BASE,
};
pub use pass::{run_archive_pass, ArchivePassOptions, ArchivePassSummary};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError, StagedFile};
pub use tree::metadata_files;
pub use types::{FailureKind, FetchError};
pub use walker::{AssetWalker, WalkSummary};
pub use tokio_util::sync::CancellationToken;
