// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

use crate::config::InstallerConfig;
use crate::copy::BackupReport;
use crate::delete::CleanReport;
use crate::error::Result;
use crate::extract::ExtractReport;
use crate::state_store::StateStore;

/// Where an install operation currently is.
///
/// Firmware installs walk the full sequence; the other operations use the
/// subset of steps they need. `Failed` can follow any step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Idle,
    CheckingVolume,
    VerifyingSpace,
    BackingUp,
    Downloading,
    Cleaning,
    Extracting,
    UpdatingState,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareOptions {
    pub include_world_map: bool,
    pub backup: bool,
}

impl Default for FirmwareOptions {
    fn default() -> Self {
        Self {
            include_world_map: true,
            backup: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    pub firmware: FirmwareOptions,
    /// None installs every configured country
    pub countries: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct FirmwareReport {
    pub version: String,
    pub asset_name: String,
    pub downloaded_bytes: u64,
    pub cleaned: CleanReport,
    pub extracted: ExtractReport,
    pub backup: Option<BackupReport>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyReport {
    /// Countries that were attempted, in order
    pub countries: Vec<String>,
    pub installed: usize,
    /// Files whose download failed
    pub failed: usize,
    /// Remote paths whose listing could not be fetched
    pub failed_listings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ThemesReport {
    pub version: String,
    pub extracted: ExtractReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheck {
    pub latest: String,
    pub installed: Option<String>,
    pub update_available: bool,
}

#[derive(Debug, Clone)]
pub struct InstallSummary {
    pub firmware: FirmwareReport,
    pub frequencies: Option<FrequencyReport>,
    pub include_world_map: bool,
}

/// Runs the install operations against one SD card.
///
/// Owns the configuration, the HTTP client and the state record; nothing
/// else writes the state record.
pub struct Installer {
    pub(super) config: InstallerConfig,
    pub(super) client: reqwest::Client,
    pub(super) store: StateStore,
    pub(super) state: AppState,
}

impl Installer {
    pub fn new(config: InstallerConfig) -> Result<Self> {
        config.validate()?;
        let client = crate::github::build_client()?;
        let store = StateStore::new(config.state_file.clone());

        log::debug!("Installer configured: {:?}", config);

        Ok(Self {
            config,
            client,
            store,
            state: AppState::Idle,
        })
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub(super) fn set_state(&mut self, next: AppState) {
        log::debug!("State: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
