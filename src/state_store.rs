// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

use crate::error::{InstallError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// What the updater remembers between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallState {
    /// Release tag of the last firmware written to the card
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_firmware_version: Option<String>,
    /// RFC 3339 timestamp of the last firmware install
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_firmware_update: Option<String>,
    /// RFC 3339 timestamp of the last frequency database sync
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_freqman_update: Option<String>,
    /// Countries requested by the last frequency database sync
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub freqman_countries: Vec<String>,
    /// Keys written by other versions of the updater, kept as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl InstallState {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// JSON record of `InstallState` on local disk
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load state from disk. A missing or unreadable record yields empty state.
    pub fn load(&self) -> InstallState {
        if !self.path.exists() {
            log::debug!("No state file at {:?}, starting empty", self.path);
            return InstallState::default();
        }

        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to read state file {:?}: {}", self.path, e);
                return InstallState::default();
            }
        };

        match serde_json::from_str::<InstallState>(&json) {
            Ok(state) => {
                log::debug!("Loaded state from {:?}", self.path);
                state
            }
            Err(e) => {
                log::warn!("Ignoring corrupt state file {:?}: {}", self.path, e);
                InstallState::default()
            }
        }
    }

    /// Save the whole record. The new content is written to a temp file in
    /// the same directory and renamed over the old one.
    pub fn save(&self, state: &InstallState) -> Result<()> {
        let fail = |message: String| InstallError::State {
            path: self.path.clone(),
            message,
        };

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| fail(format!("Failed to serialize state: {}", e)))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .map_err(|e| fail(format!("Failed to create state directory: {}", e)))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| fail(format!("Failed to create temp file: {}", e)))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| fail(format!("Failed to write state: {}", e)))?;
        tmp.persist(&self.path)
            .map_err(|e| fail(format!("Failed to replace state file: {}", e.error)))?;

        log::debug!("Saved state to {:?}", self.path);
        Ok(())
    }
}
