use std::fmt;

use jobvault_core::keys;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Statistics category used when an image download fails this way.
    pub fn download_stat_key(&self) -> &'static str {
        match self.kind {
            FailureKind::HttpStatus(_) => keys::ERROR_HTTP,
            FailureKind::Network => keys::ERROR_CONNECTION,
            FailureKind::Timeout => keys::ERROR_TIMEOUT,
            FailureKind::Io => keys::ERROR_IO_WRITE,
            FailureKind::InvalidUrl
            | FailureKind::UnsupportedContentType { .. }
            | FailureKind::Decode
            | FailureKind::Cancelled => keys::ERROR_UNEXPECTED_DOWNLOAD,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    UnsupportedContentType { content_type: String },
    Decode,
    Io,
    Cancelled,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Decode => write!(f, "undecodable body"),
            FailureKind::Io => write!(f, "local io error"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
