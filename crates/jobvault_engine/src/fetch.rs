use std::fmt;
use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use jobvault_core::Listing;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use url::Url;

use crate::persist::{AtomicFileWriter, PersistError};
use crate::{FailureKind, FetchError};

pub const DEFAULT_API_BASE: &str = "https://www.midjourney.com";
const LISTING_PATH: &str = "/api/app/recent-jobs/";
const SESSION_COOKIE: &str = "__Secure-next-auth.session-token";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub api_base: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub download_timeout: Duration,
    pub redirect_limit: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            download_timeout: Duration::from_secs(30),
            redirect_limit: 5,
        }
    }
}

/// Account the listing requests are made for.
#[derive(Clone)]
pub struct Credentials {
    pub user_id: String,
    pub session_token: String,
}

impl Credentials {
    fn cookie(&self) -> String {
        format!("{SESSION_COOKIE}={}", self.session_token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("session_token", &"<redacted>")
            .finish()
    }
}

/// Parameters that vary between listing requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    /// `None` requests every job type.
    pub job_type: Option<String>,
    pub from_date: Option<String>,
    pub page: Option<u32>,
    pub amount: usize,
}

impl ListingQuery {
    /// Query string pairs in the order the endpoint documents them.
    pub fn pairs(&self, user_id: &str) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("amount", self.amount.to_string()),
            ("orderBy", "new".to_string()),
            ("jobStatus", "completed".to_string()),
            ("userId", user_id.to_string()),
            ("dedupe", "true".to_string()),
            ("refreshApi", "0".to_string()),
        ];
        if let Some(job_type) = &self.job_type {
            pairs.push(("jobType", job_type.clone()));
        }
        if let Some(from_date) = &self.from_date {
            pairs.push(("fromDate", from_date.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }
}

/// Source of job listing batches.
///
/// `Err` covers transport and HTTP level failures; a response that arrived but
/// has an unexpected shape is `Ok(Listing::Malformed(..))`.
#[async_trait::async_trait]
pub trait ListingSource: Send + Sync {
    async fn list_jobs(&self, query: &ListingQuery) -> Result<Listing, FetchError>;
}

/// Downloads one asset to a local path.
#[async_trait::async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Stream `url` into `target`, returning the number of bytes written.
    /// `target` must not exist afterwards unless the whole body was received.
    async fn download(&self, url: &str, target: &Path) -> Result<u64, FetchError>;
}

fn build_client(
    settings: &FetchSettings,
    timeout: Duration,
) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
        .build()
        .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
}

#[derive(Debug, Clone)]
pub struct ReqwestListingSource {
    client: reqwest::Client,
    endpoint: Url,
    credentials: Credentials,
}

impl ReqwestListingSource {
    pub fn new(settings: &FetchSettings, credentials: Credentials) -> Result<Self, FetchError> {
        let base = settings.api_base.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{base}{LISTING_PATH}"))
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        Ok(Self {
            client: build_client(settings, settings.request_timeout)?,
            endpoint,
            credentials,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ListingSource for ReqwestListingSource {
    async fn list_jobs(&self, query: &ListingQuery) -> Result<Listing, FetchError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .extend_pairs(query.pairs(&self.credentials.user_id));

        let response = self
            .client
            .get(url)
            .header(COOKIE, self.credentials.cookie())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.starts_with("application/json") {
            return Err(FetchError::new(
                FailureKind::UnsupportedContentType { content_type },
                "listing response is not JSON",
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let value: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;
        Ok(Listing::classify(value))
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestAssetFetcher {
    client: reqwest::Client,
}

impl ReqwestAssetFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(settings, settings.download_timeout)?,
        })
    }
}

#[async_trait::async_trait]
impl AssetFetcher for ReqwestAssetFetcher {
    async fn download(&self, url: &str, target: &Path) -> Result<u64, FetchError> {
        let parsed = Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let (dir, filename) = split_target(target)?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let mut staged = AtomicFileWriter::new(dir.to_path_buf())
            .stage()
            .map_err(map_persist_error)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            staged.write_chunk(&chunk).map_err(map_persist_error)?;
        }
        let written = staged.bytes_written();
        staged.commit(filename).map_err(map_persist_error)?;
        Ok(written)
    }
}

fn split_target(target: &Path) -> Result<(&Path, &str), FetchError> {
    let dir = target
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let filename = target
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            FetchError::new(
                FailureKind::Io,
                format!("invalid target path {}", target.display()),
            )
        })?;
    Ok((dir, filename))
}

fn map_persist_error(err: PersistError) -> FetchError {
    FetchError::new(FailureKind::Io, err.to_string())
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return FetchError::new(FailureKind::Decode, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
