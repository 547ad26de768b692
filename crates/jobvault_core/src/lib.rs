//! Jobvault core: pure archive rules shared by the crawl and download passes.
mod assets;
mod listing;
mod placement;
mod record;
mod stats;
mod summary;
mod timestamp;

pub use assets::{
    eligible_image, image_extension, image_filename, image_target, ImagePaths, UrlRejection,
    ALLOWED_EXTENSIONS, DEFAULT_EXTENSION,
};
pub use listing::Listing;
pub use placement::{entry_stem, EntryLocation, METADATA_SUFFIX, SUMMARY_SUFFIX};
pub use record::{JobRecord, JsonIndent, RecordError};
pub use stats::{keys, RunStats};
pub use summary::{render_summary, MISSING_FULL_COMMAND, MISSING_PROMPT, SUMMARY_WIDTH};
pub use timestamp::{validate_from_date, EnqueueTime, TimestampError};
