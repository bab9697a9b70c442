// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

// Terminal rendering. The install steps only emit progress events; this
// module decides how they look.

use super::{FirmwareReport, FrequencyReport, InstallSummary, ThemesReport, UpdateCheck};
use crate::config::VOLUME_LABEL;
use crate::copy::CopyProgress;
use crate::delete::DeleteProgress;
use crate::download::{format_size, DownloadProgress};
use crate::error::InstallError;
use crate::extract::ExtractProgress;
use crossterm::style::Stylize;
use std::io::Write;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const BAR_LEN: u64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
    Progress,
}

/// Print a status line with a coloured marker
pub fn status(kind: StatusKind, msg: &str) {
    let icon = match kind {
        StatusKind::Info => "[*]".blue(),
        StatusKind::Success => "[+]".green(),
        StatusKind::Warning => "[!]".yellow(),
        StatusKind::Error => "[✗]".red(),
        StatusKind::Progress => "[→]".magenta(),
    };
    println!("{} {}", icon, msg);
}

pub fn print_banner() {
    let rule = "═".repeat(63);
    println!("{}", format!("╔{}╗", rule).cyan());
    println!(
        "{}  {}{}",
        "║".cyan(),
        "PORTAPACK MAYHEM - COMPREHENSIVE UPDATER".bold(),
        format!("{:>22}", "║").cyan()
    );
    println!(
        "{}",
        "║  Firmware • Themes • Frequencies • Everything                 ║".cyan()
    );
    println!("{}", format!("╚{}╝", rule).cyan());
    println!();
}

pub fn print_heading(title: &str) {
    println!("\n{}", format!("═══ {} ═══", title).bold());
}

/// Print an error, with the fix the user can apply for precondition failures
pub fn report_error(err: &InstallError) {
    status(StatusKind::Error, &err.to_string());
    if !err.is_precondition() {
        if let Some(path) = crate::debug::get_log_path() {
            status(StatusKind::Info, &format!("Details in {}", path.display()));
        }
        if let InstallError::CorruptArchive { .. } = err {
            status(
                StatusKind::Warning,
                "The download looks damaged; running the update again usually fixes this",
            );
        }
        return;
    }
    match err {
        InstallError::VolumeAbsent { .. } => status(
            StatusKind::Warning,
            &format!(
                "Please insert your {} SD card and ensure it's mounted (or pass --mount-point)",
                VOLUME_LABEL
            ),
        ),
        InstallError::InsufficientSpace { .. } => status(
            StatusKind::Warning,
            "Free up space on the SD card and try again",
        ),
        _ => {}
    }
}

fn draw_bar(label: &str, current: u64, total: u64, detail: &str) {
    let current = current.min(total);
    let pct = if total > 0 { current * 100 / total } else { 100 };
    let filled = if total > 0 { BAR_LEN * current / total } else { BAR_LEN };
    let bar = format!(
        "{}{}",
        "█".repeat(filled as usize),
        "░".repeat((BAR_LEN - filled) as usize)
    );
    print!("\r{}", format!("{}: {} {}% {}", label, bar, pct, detail).cyan());
    let _ = std::io::stdout().flush();
}

/// Spawn a task that feeds every event from the returned sender to `render`.
/// The task ends once the sender is dropped; await the handle to make sure
/// the last line has been drawn.
pub fn spawn_printer<P, F>(mut render: F) -> (mpsc::UnboundedSender<P>, JoinHandle<()>)
where
    P: Send + 'static,
    F: FnMut(P) + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<P>();
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            render(event);
        }
    });
    (tx, handle)
}

pub fn download_printer(label: &str) -> (mpsc::UnboundedSender<DownloadProgress>, JoinHandle<()>) {
    let label = label.to_string();
    let mut last_pct = None;
    spawn_printer(move |event| match event {
        DownloadProgress::Started { total_bytes } => {
            log::debug!("{}: {:?} bytes announced", label, total_bytes);
        }
        DownloadProgress::Progress {
            downloaded,
            total: Some(total),
        } if total > 0 => {
            let pct = downloaded * 100 / total;
            if last_pct != Some(pct) {
                last_pct = Some(pct);
                draw_bar(
                    &label,
                    downloaded,
                    total,
                    &format!("({}/{})", format_size(downloaded), format_size(total)),
                );
            }
        }
        DownloadProgress::Progress { downloaded, .. } => {
            // No Content-Length: only the running count can be shown
            print!("\r{}", format!("{}: {}", label, format_size(downloaded)).cyan());
            let _ = std::io::stdout().flush();
        }
        DownloadProgress::Completed { bytes } => {
            println!();
            log::debug!("{}: finished at {} bytes", label, bytes);
        }
    })
}

pub fn extract_printer() -> (mpsc::UnboundedSender<ExtractProgress>, JoinHandle<()>) {
    spawn_printer(|event| match event {
        ExtractProgress::Started { total_entries } => {
            log::debug!("Archive holds {} entries", total_entries);
        }
        ExtractProgress::Progress { processed, total } => {
            draw_bar(
                "Extracting",
                processed as u64,
                total as u64,
                &format!("({}/{} files)", processed, total),
            );
        }
        ExtractProgress::Skipped { name } => {
            println!();
            status(StatusKind::Warning, &format!("Skipping suspicious path: {}", name));
        }
        ExtractProgress::Completed { extracted, skipped } => {
            println!();
            log::debug!("Extracted {} entries, skipped {}", extracted, skipped);
        }
    })
}

pub fn delete_printer() -> (mpsc::UnboundedSender<DeleteProgress>, JoinHandle<()>) {
    spawn_printer(|event| match event {
        DeleteProgress::Started { total_dirs } => {
            status(
                StatusKind::Progress,
                &format!("Cleaning system folders on {}...", VOLUME_LABEL),
            );
            log::debug!("{} folders to clean", total_dirs);
        }
        DeleteProgress::DeletingDirectory { name } => {
            log::debug!("Deleting {}", name);
        }
        DeleteProgress::Failed { name, error } => {
            status(StatusKind::Warning, &format!("Could not remove {}: {}", name, error));
        }
        DeleteProgress::Completed { removed, failed } => {
            let kind = if failed == 0 {
                StatusKind::Success
            } else {
                StatusKind::Warning
            };
            status(
                kind,
                &format!("Cleaned {} system folders ({} failed)", removed, failed),
            );
        }
    })
}

pub fn copy_printer() -> (mpsc::UnboundedSender<CopyProgress>, JoinHandle<()>) {
    spawn_printer(|event| match event {
        CopyProgress::Started {
            total_dirs,
            destination,
        } => {
            status(
                StatusKind::Progress,
                &format!("Creating backup at: {}", destination.display()),
            );
            log::debug!("{} user folders to back up", total_dirs);
        }
        CopyProgress::CopyingDirectory { name, files, bytes } => {
            status(
                StatusKind::Info,
                &format!("Backing up {} ({} files, {})", name, files, format_size(bytes)),
            );
        }
        CopyProgress::Failed { name, error } => {
            status(StatusKind::Warning, &format!("Could not backup {}: {}", name, error));
        }
        CopyProgress::Completed { copied, failed } => {
            let kind = if failed == 0 {
                StatusKind::Success
            } else {
                StatusKind::Warning
            };
            status(
                kind,
                &format!("Backed up {} user folders ({} failed)", copied, failed),
            );
        }
    })
}

pub fn print_update_check(check: &UpdateCheck) {
    status(
        StatusKind::Info,
        &format!("Latest available: {}", check.latest.clone().green()),
    );
    status(
        StatusKind::Info,
        &format!(
            "Last installed: {}",
            check
                .installed
                .clone()
                .unwrap_or_else(|| "None".to_string())
                .yellow()
        ),
    );
    if check.update_available {
        status(StatusKind::Success, "Update available!");
    } else {
        status(StatusKind::Success, "You're up to date");
    }
}

pub fn print_firmware_report(report: &FirmwareReport) {
    status(
        StatusKind::Success,
        &format!(
            "Firmware {} installed ({}, {} entries extracted)",
            report.version,
            format_size(report.downloaded_bytes),
            report.extracted.extracted
        ),
    );
    log::info!(
        "Package {}: {} system folders cleaned, {} failed",
        report.asset_name,
        report.cleaned.removed,
        report.cleaned.failed
    );
    if !report.extracted.skipped.is_empty() {
        status(
            StatusKind::Warning,
            &format!("{} unsafe archive entries skipped", report.extracted.skipped.len()),
        );
    }
    if let Some(backup) = &report.backup {
        status(
            StatusKind::Info,
            &format!(
                "Backup of {} folders saved to {} ({} failed)",
                backup.copied,
                backup.destination.display(),
                backup.failed
            ),
        );
    }
}

pub fn print_frequency_report(report: &FrequencyReport) {
    let kind = if report.failed == 0 && report.failed_listings.is_empty() {
        StatusKind::Success
    } else {
        StatusKind::Warning
    };
    status(
        kind,
        &format!(
            "Installed {} frequency files ({} failed)",
            report.installed, report.failed
        ),
    );
    log::info!("Countries: {}", report.countries.join(", "));
    for path in &report.failed_listings {
        status(StatusKind::Warning, &format!("Could not list {}", path));
    }
}

pub fn print_themes_report(report: &ThemesReport) {
    status(
        StatusKind::Success,
        &format!(
            "Extracted {} theme files from {}",
            report.extracted.extracted, report.version
        ),
    );
}

pub fn print_summary(summary: &InstallSummary) {
    let rule = "═".repeat(50);
    let check = "✓".green();

    println!("\n{}", rule.clone().green());
    println!("{}", "  INSTALLATION COMPLETE".green());
    println!("{}\n", rule.clone().green());

    println!("{}", "What was installed:".bold());
    println!("  {} Mayhem firmware {}", check, summary.firmware.version);
    println!("  {} Theme resources (pp_res)", check);
    println!(
        "  {} World map data{}",
        check,
        if summary.include_world_map { "" } else { " (SKIPPED)" }
    );
    println!("  {} ADSB & AIS databases", check);
    match &summary.frequencies {
        Some(freq) => println!("  {} Frequency manager files ({})", check, freq.installed),
        None => println!("  {} Frequency manager files (FAILED)", "✗".red()),
    }
    println!("  {} HackRF firmware", check);

    println!("\n{}", "Next steps:".bold());
    println!("  1. {} for write buffers to flush", "Wait 30 seconds".yellow());
    println!("  2. {} the SD card", "Safely eject".yellow());
    println!("  3. Insert into Portapack and power on");
    println!(
        "  4. Go to {} to flash new firmware",
        "Options → Firmware Update".cyan()
    );
    println!("\n{}", rule.clone().green());
}
