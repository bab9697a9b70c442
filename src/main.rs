// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

mod app;
mod cli;
mod config;
mod copy;
mod debug;
mod delete;
mod download;
mod drives;
mod error;
mod extract;
mod github;
mod state_store;

#[cfg(test)]
mod test_support;

use app::ui::{self, StatusKind};
use app::{FirmwareOptions, InstallOptions, Installer};
use clap::Parser;
use cli::{Cli, Commands};
use config::InstallerConfig;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    debug::init(
        &config::program_dir().join(config::LOG_FILE_NAME),
        cli.verbose,
    );
    log::debug!("Arguments: {:?}", cli);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start async runtime: {}", e);
            ui::status(StatusKind::Error, &format!("Failed to start: {}", e));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> error::Result<()> {
    let mut config = InstallerConfig::default();
    if let Some(mount_point) = &cli.mount_point {
        config = config.with_mount_point(mount_point.clone());
    }
    let mut installer = Installer::new(config)?;

    let firmware = FirmwareOptions {
        include_world_map: !cli.no_world_map,
        backup: cli.backup,
    };

    ui::print_banner();

    match cli.operation() {
        Commands::InstallAll => {
            let summary = installer
                .install_all(InstallOptions {
                    firmware,
                    countries: cli.selected_countries(),
                })
                .await?;
            ui::print_summary(&summary);
        }
        Commands::FirmwareOnly => {
            let report = installer.install_firmware(firmware).await?;
            ui::print_firmware_report(&report);
        }
        Commands::FrequencyOnly => {
            let countries = cli.selected_countries();
            let report = installer.install_frequencies(countries.as_deref()).await?;
            ui::print_frequency_report(&report);
        }
        Commands::ThemesOnly => {
            ui::status(StatusKind::Progress, "Refreshing themes (pp_res)...");
            let report = installer.install_themes().await?;
            ui::print_themes_report(&report);
        }
        Commands::Check => {
            // Informational only; a failed check still exits 0
            match installer.check_for_update().await {
                Ok(check) => ui::print_update_check(&check),
                Err(e) => ui::report_error(&e),
            }
        }
    }

    log::info!("{:?} finished", cli.operation());
    Ok(())
}
