use anyhow::{Context, Result};
use jobvault_core::{keys, RunStats};
use jobvault_engine::{
    ensure_output_dir, resolve_cursor, run_archive_pass, ArchivePassOptions, AssetWalker,
    CancellationToken, CrawlOptions, RecordArchiver, ReqwestAssetFetcher, ReqwestListingSource,
    ScanCancelled, StopReason,
};
use jobvault_logging::{vault_info, vault_warn};

use super::settings::{ImagesConfig, MetadataConfig, Settings};
use crate::cli::Command;

/// Run one subcommand to completion.
///
/// `Err` means the run could not start; per-item failures are only counted in
/// the returned statistics.
pub fn execute(command: Command, settings: &Settings) -> Result<RunStats> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting the async runtime")?;

    runtime.block_on(async {
        let cancel = CancellationToken::new();
        spawn_interrupt_listener(cancel.clone());
        // The listener installs the signal handler on its first poll.
        tokio::task::yield_now().await;

        let mut stats = RunStats::new();
        match command {
            Command::Metadata(args) => {
                let config = MetadataConfig::resolve(args, settings)?;
                archive_metadata(config, &cancel, &mut stats).await?;
            }
            Command::Images(args) => {
                let config = ImagesConfig::resolve(args, settings)?;
                download_images(config, &cancel, &mut stats).await?;
            }
        }
        Ok::<_, anyhow::Error>(stats)
    })
}

fn spawn_interrupt_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            vault_warn!("Interrupt received, stopping after the current step");
            cancel.cancel();
        }
    });
}

async fn archive_metadata(
    config: MetadataConfig,
    cancel: &CancellationToken,
    stats: &mut RunStats,
) -> Result<()> {
    ensure_output_dir(&config.archive_root)
        .with_context(|| format!("cannot use archive root {}", config.archive_root.display()))?;
    vault_info!("Archive root: {:?}", config.archive_root);
    match &config.job_type {
        Some(job_type) => vault_info!("Listing jobs of type '{}'", job_type),
        None => vault_info!("Listing jobs of all types"),
    }

    let cursor = if config.from_date.is_some() || config.from_archive {
        match resolve_cursor(&config.archive_root, config.from_date.as_deref(), cancel).await {
            Ok(cursor) => cursor,
            Err(ScanCancelled) => {
                stats.incr(keys::INTERRUPTED);
                return Ok(());
            }
        }
    } else {
        None
    };
    if config.from_date.is_some() && config.from_archive {
        vault_info!("--from-date given, not reading the start date from the archive");
    }

    let resuming_from_archive = config.from_archive && config.from_date.is_none();
    if config.stop_when_caught_up && !resuming_from_archive {
        vault_warn!(
            "--stop-when-caught-up only applies with --get-from-date-from-archive, ignoring it"
        );
    }

    let source = ReqwestListingSource::new(&config.fetch, config.credentials)
        .context("building the HTTP client")?;
    vault_info!("Listing endpoint: {}", source.endpoint());

    let archiver = RecordArchiver::new(config.archive_root, config.json_indent);
    let options = ArchivePassOptions {
        crawl: CrawlOptions {
            job_type: config.job_type,
            page_limit: config.page_limit,
        },
        overwrite: config.overwrite,
        stop_when_caught_up: config.stop_when_caught_up && resuming_from_archive,
    };

    let summary = run_archive_pass(&source, &archiver, cursor, options, cancel, stats).await;
    if summary.stop == Some(StopReason::Cancelled) {
        stats.incr(keys::INTERRUPTED);
    }
    Ok(())
}

async fn download_images(
    config: ImagesConfig,
    cancel: &CancellationToken,
    stats: &mut RunStats,
) -> Result<()> {
    let fetcher = ReqwestAssetFetcher::new(&config.fetch).context("building the HTTP client")?;
    let walker = AssetWalker::new(&fetcher, config.download_types, cancel.clone());

    let summary = walker.complete(&config.archive_root, stats).await;
    vault_info!(
        "Image pass finished: metadata_files={} downloaded={}",
        summary.metadata_files,
        summary.downloaded
    );
    if summary.cancelled {
        stats.incr(keys::INTERRUPTED);
    }
    Ok(())
}
