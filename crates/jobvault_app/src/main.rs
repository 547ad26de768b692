mod cli;
mod platform;

use std::process::ExitCode;

use clap::Parser;
use jobvault_logging::{vault_error, vault_info, vault_warn};

use cli::Cli;
use platform::settings::Settings;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    let level = match settings.log_level(cli.log_level.as_deref()) {
        Ok(level) => level,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    let log_file = cli.log_file.as_deref().or(settings.log_file.as_deref());
    platform::logging::initialize(level, log_file);

    match platform::execute(cli.command, &settings) {
        Ok(stats) => {
            vault_info!("Finished. Stats: {}", stats);
            if stats.is_degraded() {
                for (key, count) in stats.errors() {
                    vault_warn!("{} failures counted under {}", count, key);
                }
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            vault_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
