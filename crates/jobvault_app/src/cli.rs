use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "jobvault")]
#[command(about = "Archive generative job metadata and the images it references")]
pub struct Cli {
    /// RON settings file providing defaults for the options below.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// off, error, warn, info, debug or trace.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Also write the log to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Crawl the job listing and archive metadata for new jobs.
    Metadata(MetadataArgs),
    /// Download images referenced by archived metadata.
    Images(ImagesArgs),
}

#[derive(Debug, Args)]
pub struct MetadataArgs {
    /// Root directory of the archive [default: ./mj-archive].
    #[arg(long)]
    pub archive_root: Option<PathBuf>,

    #[arg(long, env = "JOBVAULT_USER_ID", hide_env_values = true)]
    pub user_id: Option<String>,

    /// Value of the `__Secure-next-auth.session-token` cookie.
    #[arg(long, env = "JOBVAULT_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    /// Highest listing page to request (50 jobs per page).
    #[arg(long)]
    pub page_limit: Option<u32>,

    /// Job type to list, e.g. upscale or grid; `all` lists every type
    /// [default: upscale].
    #[arg(long)]
    pub job_type: Option<String>,

    /// Start from this time: `YYYY-MM-DD HH:MM:SS[.ffffff]` or `YYYY-MM-DD`.
    #[arg(long)]
    pub from_date: Option<String>,

    /// Start from the newest enqueue_time already in the archive. Ignored
    /// when --from-date is given.
    #[arg(long)]
    pub get_from_date_from_archive: bool,

    /// Rewrite entries that are already archived.
    #[arg(long)]
    pub overwrite_metadata: bool,

    /// Stop after a page that archived nothing new. Only honoured together
    /// with --get-from-date-from-archive.
    #[arg(long)]
    pub stop_when_caught_up: bool,

    /// Indentation of archived JSON; 0 writes compact JSON [default: 2].
    #[arg(long)]
    pub json_indent: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ImagesArgs {
    /// Root directory of the archive [default: ./mj-archive].
    #[arg(long)]
    pub archive_root: Option<PathBuf>,

    /// Comma separated job types, e.g. `upscale,grid`; empty or `all`
    /// downloads for every type [default: upscale].
    #[arg(long)]
    pub download_types: Option<String>,
}
