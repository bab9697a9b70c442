// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

use crate::error::{InstallError, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use tokio::sync::mpsc;
use zip::ZipArchive;

/// Progress is reported every this many entries
const PROGRESS_INTERVAL: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractProgress {
    Started { total_entries: usize },
    Progress { processed: usize, total: usize },
    /// Entry refused because it would land outside the target directory
    Skipped { name: String },
    Completed { extracted: usize, skipped: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractReport {
    /// Files and directories written under the target root
    pub extracted: usize,
    /// Entry names refused as unsafe
    pub skipped: Vec<String>,
}

/// Extract every entry of a zip archive under `target_root`
pub async fn extract_all(
    archive_path: &Path,
    target_root: &Path,
    progress_tx: mpsc::UnboundedSender<ExtractProgress>,
) -> Result<ExtractReport> {
    spawn_extract(archive_path, target_root, None, progress_tx).await
}

/// Extract only entries whose path starts with `prefix` (e.g. "pp_res/")
pub async fn extract_subtree(
    archive_path: &Path,
    target_root: &Path,
    prefix: &str,
    progress_tx: mpsc::UnboundedSender<ExtractProgress>,
) -> Result<ExtractReport> {
    spawn_extract(archive_path, target_root, Some(prefix.to_string()), progress_tx).await
}

/// Decompress every entry without writing anything, so damaged data and
/// CRC mismatches surface before the card is touched. Returns the entry count.
pub async fn verify_archive(archive_path: &Path) -> Result<usize> {
    let archive_path = archive_path.to_path_buf();
    tokio::task::spawn_blocking(move || verify_archive_sync(&archive_path))
        .await
        .map_err(|e| InstallError::Extract {
            path: PathBuf::new(),
            message: format!("Task join error: {}", e),
        })?
}

fn verify_archive_sync(archive_path: &Path) -> Result<usize> {
    let corrupt = |message: String| InstallError::CorruptArchive {
        path: archive_path.to_path_buf(),
        message,
    };

    let file = File::open(archive_path).map_err(|e| InstallError::io(archive_path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| corrupt(e.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| corrupt(format!("entry {}: {}", i, e)))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        std::io::copy(&mut entry, &mut std::io::sink())
            .map_err(|e| corrupt(format!("{}: {}", name, e)))?;
    }

    log::debug!("Verified {} entries in {:?}", archive.len(), archive_path);
    Ok(archive.len())
}

async fn spawn_extract(
    archive_path: &Path,
    target_root: &Path,
    prefix: Option<String>,
    progress_tx: mpsc::UnboundedSender<ExtractProgress>,
) -> Result<ExtractReport> {
    let archive_path = archive_path.to_path_buf();
    let target_root = target_root.to_path_buf();

    // zip is synchronous; run it on the blocking pool and wait for it
    tokio::task::spawn_blocking(move || {
        extract_zip_sync(&archive_path, &target_root, prefix.as_deref(), &progress_tx)
    })
    .await
    .map_err(|e| InstallError::Extract {
        path: PathBuf::new(),
        message: format!("Task join error: {}", e),
    })?
}

fn extract_zip_sync(
    archive_path: &Path,
    target_root: &Path,
    prefix: Option<&str>,
    progress_tx: &mpsc::UnboundedSender<ExtractProgress>,
) -> Result<ExtractReport> {
    let file = File::open(archive_path).map_err(|e| InstallError::io(archive_path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| InstallError::CorruptArchive {
        path: archive_path.to_path_buf(),
        message: e.to_string(),
    })?;

    std::fs::create_dir_all(target_root).map_err(|e| InstallError::io(target_root, e))?;

    let total = archive.len();
    let _ = progress_tx.send(ExtractProgress::Started {
        total_entries: total,
    });
    log::info!("Extracting {} entries from {:?} to {:?}", total, archive_path, target_root);

    let mut report = ExtractReport::default();

    for i in 0..total {
        let mut entry = archive.by_index(i).map_err(|e| InstallError::CorruptArchive {
            path: archive_path.to_path_buf(),
            message: format!("entry {}: {}", i, e),
        })?;
        let name = entry.name().to_string();

        let in_scope = prefix.map_or(true, |p| name.starts_with(p));
        if in_scope {
            match safe_relative_path(&name) {
                Some(relative) => {
                    let out_path = target_root.join(&relative);
                    let is_dir = entry.is_dir();
                    let mode = entry.unix_mode();
                    write_entry(&mut entry, is_dir, mode, &out_path).map_err(|e| match e {
                        EntryError::Read(e) => InstallError::CorruptArchive {
                            path: archive_path.to_path_buf(),
                            message: format!("{}: {}", name, e),
                        },
                        EntryError::Write(e) => InstallError::Extract {
                            path: out_path.clone(),
                            message: e.to_string(),
                        },
                    })?;
                    report.extracted += 1;
                }
                None => {
                    log::warn!("Skipping suspicious path: {}", name);
                    let _ = progress_tx.send(ExtractProgress::Skipped { name: name.clone() });
                    report.skipped.push(name);
                }
            }
        }

        if (i + 1) % PROGRESS_INTERVAL == 0 || i + 1 == total {
            let _ = progress_tx.send(ExtractProgress::Progress {
                processed: i + 1,
                total,
            });
        }
    }

    log::info!(
        "Extraction complete: {} written, {} skipped",
        report.extracted,
        report.skipped.len()
    );
    let _ = progress_tx.send(ExtractProgress::Completed {
        extracted: report.extracted,
        skipped: report.skipped.len(),
    });

    Ok(report)
}

/// Which side of an entry copy failed: reading means the archive data is
/// damaged, writing means the target filesystem refused it
#[derive(Debug)]
enum EntryError {
    Read(std::io::Error),
    Write(std::io::Error),
}

fn write_entry<R: Read>(
    entry: &mut R,
    is_dir: bool,
    unix_mode: Option<u32>,
    out_path: &Path,
) -> std::result::Result<(), EntryError> {
    if is_dir {
        std::fs::create_dir_all(out_path).map_err(EntryError::Write)?;
        return Ok(());
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(EntryError::Write)?;
    }
    let mut out_file = File::create(out_path).map_err(EntryError::Write)?;

    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = match entry.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(EntryError::Read(e)),
        };
        out_file.write_all(&buf[..n]).map_err(EntryError::Write)?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Plain rwx bits only; FAT volumes reject chmod, which is not worth failing over
        if let Some(mode) = unix_mode.map(|m| m & 0o777).filter(|m| *m != 0) {
            if let Err(e) =
                std::fs::set_permissions(out_path, std::fs::Permissions::from_mode(mode))
            {
                log::debug!("Could not set mode {:o} on {:?}: {}", mode, out_path, e);
            }
        }
    }
    #[cfg(not(unix))]
    let _ = unix_mode;

    Ok(())
}

/// Turn an archive entry name into a path relative to the target root.
///
/// Returns None for absolute names (leading slash or backslash, drive
/// prefix) and for names with a `..` segment.
pub fn safe_relative_path(name: &str) -> Option<PathBuf> {
    if name.starts_with('/') || name.starts_with('\\') {
        return None;
    }
    // "C:..." style names
    let mut chars = name.chars();
    if let (Some(first), Some(':')) = (chars.next(), chars.next()) {
        if first.is_ascii_alphabetic() {
            return None;
        }
    }

    let mut relative = PathBuf::new();
    for segment in name.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return None,
            other => relative.push(other),
        }
    }

    // Both separators are handled above; this catches platform oddities
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }

    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}
