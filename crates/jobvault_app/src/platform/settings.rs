//! Optional RON settings file and its merge with command line flags.
//!
//! Precedence: explicit flag, then settings file, then built-in default.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use jobvault_core::{validate_from_date, JsonIndent};
use jobvault_engine::{Credentials, FetchSettings};
use log::LevelFilter;
use serde::Deserialize;

use crate::cli::{ImagesArgs, MetadataArgs};

const DEFAULT_ARCHIVE_DIR: &str = "mj-archive";
const DEFAULT_JOB_TYPE: &str = "upscale";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub archive_root: Option<PathBuf>,
    pub json_indent: Option<usize>,
    pub job_type: Option<String>,
    pub download_types: Option<String>,
    pub api_base: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub download_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        ron::from_str(&content).with_context(|| format!("parsing settings file {}", path.display()))
    }

    pub fn log_level(&self, flag: Option<&str>) -> Result<LevelFilter> {
        match flag.or(self.log_level.as_deref()) {
            None => Ok(LevelFilter::Info),
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid log level '{raw}'")),
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        let defaults = FetchSettings::default();
        FetchSettings {
            api_base: self.api_base.clone().unwrap_or(defaults.api_base),
            connect_timeout: secs_or(self.connect_timeout_secs, defaults.connect_timeout),
            request_timeout: secs_or(self.request_timeout_secs, defaults.request_timeout),
            download_timeout: secs_or(self.download_timeout_secs, defaults.download_timeout),
            redirect_limit: defaults.redirect_limit,
        }
    }

    fn archive_root(&self, flag: Option<&Path>) -> Result<PathBuf> {
        let root = match flag.or(self.archive_root.as_deref()) {
            Some(root) => root.to_path_buf(),
            None => std::env::current_dir()
                .context("resolving the current directory")?
                .join(DEFAULT_ARCHIVE_DIR),
        };
        Ok(std::path::absolute(&root).unwrap_or(root))
    }
}

fn secs_or(value: Option<u64>, default: Duration) -> Duration {
    value.map(Duration::from_secs).unwrap_or(default)
}

/// Everything the metadata pass needs, validated.
#[derive(Debug, Clone)]
pub struct MetadataConfig {
    pub archive_root: PathBuf,
    pub credentials: Credentials,
    pub page_limit: Option<u32>,
    /// `None` lists every job type.
    pub job_type: Option<String>,
    pub from_date: Option<String>,
    pub from_archive: bool,
    pub overwrite: bool,
    pub stop_when_caught_up: bool,
    pub json_indent: JsonIndent,
    pub fetch: FetchSettings,
}

impl MetadataConfig {
    pub fn resolve(args: MetadataArgs, settings: &Settings) -> Result<Self> {
        let Some(user_id) = non_empty(args.user_id) else {
            bail!("user id not provided via --user-id or JOBVAULT_USER_ID");
        };
        let Some(session_token) = non_empty(args.session_token) else {
            bail!("session token not provided via --session-token or JOBVAULT_SESSION_TOKEN");
        };
        if let Some(from_date) = &args.from_date {
            validate_from_date(from_date).with_context(|| {
                format!(
                    "invalid --from-date '{from_date}', use 'YYYY-MM-DD HH:MM:SS.ffffff', \
                     'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD'"
                )
            })?;
        }
        let job_type = args
            .job_type
            .or_else(|| settings.job_type.clone())
            .unwrap_or_else(|| DEFAULT_JOB_TYPE.to_string());

        Ok(Self {
            archive_root: settings.archive_root(args.archive_root.as_deref())?,
            credentials: Credentials {
                user_id,
                session_token,
            },
            page_limit: args.page_limit,
            job_type: parse_job_type(&job_type),
            from_date: args.from_date,
            from_archive: args.get_from_date_from_archive,
            overwrite: args.overwrite_metadata,
            stop_when_caught_up: args.stop_when_caught_up,
            json_indent: args
                .json_indent
                .or(settings.json_indent)
                .map(JsonIndent)
                .unwrap_or_default(),
            fetch: settings.fetch_settings(),
        })
    }
}

/// Everything the images pass needs, validated.
#[derive(Debug, Clone)]
pub struct ImagesConfig {
    pub archive_root: PathBuf,
    /// Empty means every job type.
    pub download_types: BTreeSet<String>,
    pub fetch: FetchSettings,
}

impl ImagesConfig {
    pub fn resolve(args: ImagesArgs, settings: &Settings) -> Result<Self> {
        let archive_root = settings.archive_root(args.archive_root.as_deref())?;
        if !archive_root.is_dir() {
            bail!(
                "archive root not found or not a directory: {}",
                archive_root.display()
            );
        }
        let download_types = args
            .download_types
            .or_else(|| settings.download_types.clone())
            .unwrap_or_else(|| DEFAULT_JOB_TYPE.to_string());
        Ok(Self {
            archive_root,
            download_types: parse_download_types(&download_types),
            fetch: settings.fetch_settings(),
        })
    }
}

/// `all` and `none` select every job type.
pub fn parse_job_type(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("all")
        || trimmed.eq_ignore_ascii_case("none")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Comma separated types; empty or `all` selects every type.
pub fn parse_download_types(raw: &str) -> BTreeSet<String> {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() || lowered == "all" {
        return BTreeSet::new();
    }
    lowered
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
