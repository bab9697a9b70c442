// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

use crate::error::{InstallError, Result};
use futures_util::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;

/// Writes to disk are batched into blocks of this size
pub const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadProgress {
    /// `total_bytes` is None when the server sends no Content-Length
    Started { total_bytes: Option<u64> },
    Progress { downloaded: u64, total: Option<u64> },
    Completed { bytes: u64 },
}

/// Stream `url` into `dest_path`.
///
/// `idle_timeout` bounds the wait for the response headers and for every
/// following chunk. On failure the partial file stays on disk; callers
/// download into a staging directory that is removed afterwards.
pub async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    dest_path: &Path,
    idle_timeout: Duration,
    progress_tx: mpsc::UnboundedSender<DownloadProgress>,
) -> Result<u64> {
    log::info!("Downloading {} -> {:?}", url, dest_path);

    let response = tokio::time::timeout(idle_timeout, client.get(url).send())
        .await
        .map_err(|_| InstallError::download(url, "timed out waiting for response"))?
        .map_err(|e| InstallError::download(url, format!("Failed to start download: {}", e)))?;

    if !response.status().is_success() {
        return Err(InstallError::download(
            url,
            format!("server returned {}", response.status()),
        ));
    }

    let total_size = response.content_length();
    let _ = progress_tx.send(DownloadProgress::Started {
        total_bytes: total_size,
    });

    let file = File::create(dest_path)
        .await
        .map_err(|e| InstallError::io(dest_path, e))?;
    let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);

    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();

    loop {
        let next = tokio::time::timeout(idle_timeout, stream.next())
            .await
            .map_err(|_| {
                InstallError::download(url, format!("stalled after {} bytes", downloaded))
            })?;

        match next {
            Some(Ok(chunk)) => {
                writer
                    .write_all(&chunk)
                    .await
                    .map_err(|e| InstallError::io(dest_path, e))?;

                downloaded += chunk.len() as u64;
                let _ = progress_tx.send(DownloadProgress::Progress {
                    downloaded,
                    total: total_size,
                });
            }
            Some(Err(e)) => {
                return Err(InstallError::download(url, format!("Download error: {}", e)));
            }
            None => break,
        }
    }

    writer
        .flush()
        .await
        .map_err(|e| InstallError::io(dest_path, e))?;

    log::info!("Download complete: {:?} ({} bytes)", dest_path, downloaded);
    let _ = progress_tx.send(DownloadProgress::Completed { bytes: downloaded });

    Ok(downloaded)
}

/// Fetch a small file in a single bounded request and write it out whole
pub async fn fetch_file(
    client: &reqwest::Client,
    url: &str,
    dest_path: &Path,
    timeout: Duration,
) -> Result<u64> {
    log::debug!("GET {}", url);
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| InstallError::download(url, e))?;

    if !response.status().is_success() {
        return Err(InstallError::download(
            url,
            format!("server returned {}", response.status()),
        ));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| InstallError::download(url, e))?;

    tokio::fs::write(dest_path, &bytes)
        .await
        .map_err(|e| InstallError::io(dest_path, e))?;

    Ok(bytes.len() as u64)
}

/// Format bytes as a human readable size
pub fn format_size(size_bytes: u64) -> String {
    let mut size = size_bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} TB", size)
}
