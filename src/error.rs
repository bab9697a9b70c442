// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

//! Error type shared by every install step.
//!
//! Variants are grouped the way the updater reacts to them: preconditions the
//! user has to fix by hand, remote failures, transfer failures, archive
//! failures and local filesystem failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallError {
    /// The SD card is not mounted at the expected path
    #[error("SD card not found at {}", .mount.display())]
    VolumeAbsent { mount: PathBuf },

    /// Not enough free space on the SD card
    #[error("Insufficient space: {available_mb}MB available, {required_mb}MB required")]
    InsufficientSpace { available_mb: u64, required_mb: u64 },

    /// Release metadata could not be fetched or parsed
    #[error("Failed to fetch release from {url}: {message}")]
    Remote { url: String, message: String },

    /// No release asset matched the requested variant
    #[error("Could not find firmware asset in release {tag}")]
    AssetNotFound { tag: String },

    /// A directory listing could not be fetched or parsed
    #[error("Failed to list {path} ({url}): {message}")]
    Listing {
        path: String,
        url: String,
        message: String,
    },

    /// Transfer of a file failed part-way or never started
    #[error("Download of {url} failed: {message}")]
    Download { url: String, message: String },

    /// The downloaded file is not a readable archive
    #[error("Downloaded file {} is corrupted: {message}", .path.display())]
    CorruptArchive { path: PathBuf, message: String },

    /// Writing an archive entry to disk failed
    #[error("Extraction to {} failed: {message}", .path.display())]
    Extract { path: PathBuf, message: String },

    /// Persisting the state record failed
    #[error("Failed to save state to {}: {message}", .path.display())]
    State { path: PathBuf, message: String },

    /// Inconsistent updater configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Frequency run ended without a single installed file
    #[error("No frequency files were installed ({failed} failed)")]
    NothingInstalled { failed: usize },

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, InstallError>;

impl InstallError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn download(url: &str, message: impl ToString) -> Self {
        Self::Download {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    /// Errors the user resolves outside the program (insert card, free space)
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::VolumeAbsent { .. } | Self::InsufficientSpace { .. }
        )
    }
}
