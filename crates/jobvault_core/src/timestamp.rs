use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;

/// `2023-10-26 18:19:40.038313`
const FORMAT_FRACTIONAL: &str = "%Y-%m-%d %H:%M:%S%.f";
/// `2023-10-26 18:19:40`
const FORMAT_SECONDS: &str = "%Y-%m-%d %H:%M:%S";
/// `2023-10-26`, accepted only for user supplied start dates.
const FORMAT_DATE: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unparseable timestamp '{0}'")]
pub struct TimestampError(pub String);

/// A job's `enqueue_time`, keeping the exact text the service sent.
///
/// Ordering and equality follow the parsed instant; the raw text is what gets
/// sent back to the listing endpoint.
#[derive(Debug, Clone)]
pub struct EnqueueTime {
    raw: String,
    parsed: NaiveDateTime,
}

impl EnqueueTime {
    pub fn parse(raw: &str) -> Result<Self, TimestampError> {
        let parsed = NaiveDateTime::parse_from_str(raw, FORMAT_FRACTIONAL)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, FORMAT_SECONDS))
            .map_err(|_| TimestampError(raw.to_string()))?;
        Ok(Self {
            raw: raw.to_string(),
            parsed,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.parsed
    }

    /// Relative directory `YYYY/YYYY-MM/YYYY-MM-DD`.
    pub fn partition_dir(&self) -> PathBuf {
        let date = self.parsed.date();
        PathBuf::from(date.format("%Y").to_string())
            .join(date.format("%Y-%m").to_string())
            .join(date.format("%Y-%m-%d").to_string())
    }

    /// Second-precision prefix for filenames, `YYYYMMDD-HHMMSS`.
    pub fn compact(&self) -> String {
        self.parsed.format("%Y%m%d-%H%M%S").to_string()
    }
}

impl PartialEq for EnqueueTime {
    fn eq(&self, other: &Self) -> bool {
        self.parsed == other.parsed
    }
}

impl Eq for EnqueueTime {}

impl PartialOrd for EnqueueTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EnqueueTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parsed.cmp(&other.parsed)
    }
}

impl fmt::Display for EnqueueTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Validate a user supplied start date.
///
/// Accepts both record formats plus a bare `YYYY-MM-DD` (midnight).
pub fn validate_from_date(raw: &str) -> Result<NaiveDateTime, TimestampError> {
    if let Ok(time) = EnqueueTime::parse(raw) {
        return Ok(time.datetime());
    }
    chrono::NaiveDate::parse_from_str(raw, FORMAT_DATE)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| TimestampError(raw.to_string()))
}
