// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

use std::path::Path;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteProgress {
    Started { total_dirs: usize },
    DeletingDirectory { name: String },
    Failed { name: String, error: String },
    Completed { removed: usize, failed: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanReport {
    pub removed: usize,
    pub failed: usize,
}

/// Delete the firmware-owned directories from the SD card.
///
/// Best effort: a directory that cannot be removed is logged and counted,
/// and the remaining directories are still processed. Directories that do
/// not exist are skipped, so cleaning twice is harmless.
pub async fn clean_system_directories(
    mount_path: &Path,
    directories: &[String],
    progress_tx: mpsc::UnboundedSender<DeleteProgress>,
) -> CleanReport {
    let _ = progress_tx.send(DeleteProgress::Started {
        total_dirs: directories.len(),
    });

    crate::debug::log_section("Cleaning System Directories");
    log::info!("Mount path: {:?}", mount_path);

    let mut report = CleanReport::default();

    for dir_name in directories {
        let dir_path = mount_path.join(dir_name);

        if !dir_path.exists() {
            log::debug!("Directory does not exist, skipping: {}", dir_name);
            continue;
        }

        let _ = progress_tx.send(DeleteProgress::DeletingDirectory {
            name: dir_name.to_string(),
        });
        log::info!("Removing: {:?}", dir_path);

        let result = if dir_path.is_dir() {
            tokio::fs::remove_dir_all(&dir_path).await
        } else {
            tokio::fs::remove_file(&dir_path).await
        };

        match result {
            Ok(_) => {
                report.removed += 1;
            }
            Err(e) => {
                log::error!("Failed to clean {:?}: {}", dir_path, e);
                let _ = progress_tx.send(DeleteProgress::Failed {
                    name: dir_name.to_string(),
                    error: e.to_string(),
                });
                report.failed += 1;
            }
        }
    }

    log::info!(
        "Cleaned {} system folders ({} failed)",
        report.removed,
        report.failed
    );
    let _ = progress_tx.send(DeleteProgress::Completed {
        removed: report.removed,
        failed: report.failed,
    });

    report
}
