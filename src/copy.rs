// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

use crate::config::BACKUP_PREFIX;
use crate::error::{InstallError, Result};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum CopyProgress {
    Started { total_dirs: usize, destination: PathBuf },
    CopyingDirectory { name: String, files: u64, bytes: u64 },
    Failed { name: String, error: String },
    Completed { copied: usize, failed: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackupReport {
    pub destination: PathBuf,
    pub copied: usize,
    pub failed: usize,
}

/// Recursively collect all files in a directory (including hidden files)
fn collect_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_files_recursive(dir, &mut files)?;
    Ok(files)
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    if dir.is_dir() {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                collect_files_recursive(&path, files)?;
            } else {
                files.push(path);
            }
        }
    }
    Ok(())
}

/// Calculate total size of all files
fn calculate_total_size(files: &[PathBuf]) -> u64 {
    files
        .iter()
        .filter_map(|f| std::fs::metadata(f).ok())
        .map(|m| m.len())
        .sum()
}

/// Copy a directory tree, creating `dest_dir` and any missing parents
pub fn copy_directory(source_dir: &Path, dest_dir: &Path) -> Result<u64> {
    let files = collect_files(source_dir).map_err(|e| InstallError::io(source_dir, e))?;

    std::fs::create_dir_all(dest_dir).map_err(|e| InstallError::io(dest_dir, e))?;

    for file_path in &files {
        let relative_path = file_path.strip_prefix(source_dir).map_err(|e| {
            InstallError::io(
                file_path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()),
            )
        })?;
        let dest_path = dest_dir.join(relative_path);

        if let Some(parent) = dest_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| InstallError::io(parent, e))?;
            }
        }

        // std::fs::copy preserves permissions
        std::fs::copy(file_path, &dest_path).map_err(|e| InstallError::io(file_path, e))?;
    }

    Ok(files.len() as u64)
}

/// Timestamped default backup folder, e.g. PORTAPACK_BACKUP_20261018_142530
pub fn default_backup_dir(backup_root: &Path) -> PathBuf {
    backup_root.join(format!(
        "{}_{}",
        BACKUP_PREFIX,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// Copy the user directories off the SD card.
///
/// Each directory is copied on its own; a failure is logged and the rest
/// still get copied. Nothing on the card is modified. Only failing to create
/// the destination itself is an error.
pub async fn backup_user_directories(
    mount_path: &Path,
    directories: &[String],
    destination: Option<&Path>,
    backup_root: &Path,
    progress_tx: mpsc::UnboundedSender<CopyProgress>,
) -> Result<BackupReport> {
    let destination = destination
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_backup_dir(backup_root));

    crate::debug::log_section("Backup");
    log::info!("Source: {:?}", mount_path);
    log::info!("Destination: {:?}", destination);

    tokio::fs::create_dir_all(&destination)
        .await
        .map_err(|e| InstallError::io(&destination, e))?;

    let _ = progress_tx.send(CopyProgress::Started {
        total_dirs: directories.len(),
        destination: destination.clone(),
    });

    let mut report = BackupReport {
        destination: destination.clone(),
        copied: 0,
        failed: 0,
    };

    for dir_name in directories {
        let src = mount_path.join(dir_name);
        if !src.is_dir() {
            log::debug!("Nothing to back up for {}", dir_name);
            continue;
        }

        let files = collect_files(&src).unwrap_or_default();
        let _ = progress_tx.send(CopyProgress::CopyingDirectory {
            name: dir_name.to_string(),
            files: files.len() as u64,
            bytes: calculate_total_size(&files),
        });

        let dst = destination.join(dir_name);
        let result = tokio::task::spawn_blocking(move || copy_directory(&src, &dst))
            .await
            .unwrap_or_else(|e| {
                Err(InstallError::io(
                    mount_path.join(dir_name),
                    std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
                ))
            });

        match result {
            Ok(count) => {
                log::info!("Backed up: {} ({} files)", dir_name, count);
                report.copied += 1;
            }
            Err(e) => {
                log::warn!("Could not backup {}: {}", dir_name, e);
                let _ = progress_tx.send(CopyProgress::Failed {
                    name: dir_name.to_string(),
                    error: e.to_string(),
                });
                report.failed += 1;
            }
        }
    }

    log::info!("Backed up {} user folders ({} failed)", report.copied, report.failed);
    let _ = progress_tx.send(CopyProgress::Completed {
        copied: report.copied,
        failed: report.failed,
    });

    Ok(report)
}
