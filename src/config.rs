// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

// ============================================================================
// UPDATER CONFIGURATION
// ============================================================================
// Edit this file to point the updater at different repositories or a
// different SD card layout.
//
// QUICK START - the values most forks change:
//   1. VOLUME_LABEL        - SD card label the device formats its card with
//   2. FIRMWARE_RELEASE_URL - GitHub "latest release" endpoint of the firmware
//   3. FREQMAN_*           - GitHub contents/raw endpoints of the freqman repo
//
// SYSTEM_DIRECTORIES and USER_DIRECTORIES must never share a name: system
// directories are wiped on every firmware install, user directories are only
// ever read (for backups).
// ============================================================================

use crate::error::{InstallError, Result};
use std::path::PathBuf;
use std::time::Duration;

// ----------------------------------------------------------------------------
// BRANDING
// ----------------------------------------------------------------------------

/// Name shown in the banner and log header
pub const APP_NAME: &str = "PortaPack Mayhem Updater";

/// Volume label of the PortaPack SD card
pub const VOLUME_LABEL: &str = "PORTAPACK";

/// User-Agent string for HTTP requests to GitHub
pub const USER_AGENT: &str = env!("CARGO_PKG_NAME");

/// Prefix for temporary folders and files
pub const TEMP_PREFIX: &str = env!("CARGO_PKG_NAME");

// ----------------------------------------------------------------------------
// REMOTE REPOSITORIES
// ----------------------------------------------------------------------------

pub const FIRMWARE_RELEASE_URL: &str =
    "https://api.github.com/repos/portapack-mayhem/mayhem-firmware/releases/latest";

pub const FREQMAN_CONTENTS_URL: &str =
    "https://api.github.com/repos/portapack-mayhem/mayhem-freqman-files/contents";

pub const FREQMAN_RAW_URL: &str =
    "https://raw.githubusercontent.com/portapack-mayhem/mayhem-freqman-files/main";

/// Every installable firmware asset carries this token in its name
pub const FIRMWARE_ASSET_MARKER: &str = "COPY_TO_SDCARD";

/// Token identifying the smaller build without the world map
pub const NO_WORLD_MAP_MARKER: &str = "no-world-map";

/// Remote bucket holding the frequency files every user gets
pub const FREQMAN_GENERIC_BUCKET: &str = "generic";

/// Remote prefix under which each country has its own bucket
pub const FREQMAN_COUNTRY_PREFIX: &str = "country-specific";

/// Countries with frequency files in the freqman repository
pub const FREQ_COUNTRIES: &[&str] = &[
    "Australia", "Belgium", "France", "India", "Norway", "Poland", "Romanian", "Slovakia",
    "Sweden", "USA", "WorldWide",
];

// ----------------------------------------------------------------------------
// SD CARD LAYOUT
// ----------------------------------------------------------------------------

/// Directories owned by the firmware image, wiped before every extraction
pub const SYSTEM_DIRECTORIES: &[&str] = &["pp_res", "firmware", "ADSB", "AIS", "hackrf", "APPS"];

/// Directories holding user data, never deleted
pub const USER_DIRECTORIES: &[&str] =
    &["CAPTURES", "RECORDINGS", "SCREENSHOTS", "LOGS", "DEBUG", "FREQMAN"];

/// Directory frequency files are installed into
pub const FREQMAN_DIRECTORY: &str = "FREQMAN";

/// Directory holding the UI themes, the only part refreshed by themes-only
pub const THEMES_DIRECTORY: &str = "pp_res";

/// Minimum free space on the card before a firmware install starts
pub const MIN_SPACE_MB: u64 = 700;

// ----------------------------------------------------------------------------
// LOCAL FILES
// ----------------------------------------------------------------------------

pub const STATE_FILE_NAME: &str = ".updater_state.json";
pub const LOG_FILE_NAME: &str = "portapack_updater.log";
pub const BACKUP_PREFIX: &str = "PORTAPACK_BACKUP";

// ----------------------------------------------------------------------------
// TIMEOUTS (seconds)
// ----------------------------------------------------------------------------

pub const METADATA_TIMEOUT_SECS: u64 = 15;
pub const FREQ_FILE_TIMEOUT_SECS: u64 = 30;
pub const FIRMWARE_TIMEOUT_SECS: u64 = 60;
pub const THEMES_TIMEOUT_SECS: u64 = 120;

/// Immutable settings handed to the installer at construction.
///
/// `Default` builds the production configuration from the constants above;
/// tests override endpoints and paths to point at fake servers and temp dirs.
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    pub firmware_release_url: String,
    pub freqman_contents_url: String,
    pub freqman_raw_url: String,
    pub mount_point: PathBuf,
    pub system_directories: Vec<String>,
    pub user_directories: Vec<String>,
    pub countries: Vec<String>,
    pub min_space_mb: u64,
    pub state_file: PathBuf,
    /// Parent directory for per-run staging directories
    pub staging_root: PathBuf,
    /// Parent directory for auto-named backups
    pub backup_root: PathBuf,
    pub metadata_timeout: Duration,
    pub freq_file_timeout: Duration,
    pub firmware_timeout: Duration,
    pub themes_timeout: Duration,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            firmware_release_url: FIRMWARE_RELEASE_URL.to_string(),
            freqman_contents_url: FREQMAN_CONTENTS_URL.to_string(),
            freqman_raw_url: FREQMAN_RAW_URL.to_string(),
            mount_point: default_mount_point(),
            system_directories: to_owned_list(SYSTEM_DIRECTORIES),
            user_directories: to_owned_list(USER_DIRECTORIES),
            countries: to_owned_list(FREQ_COUNTRIES),
            min_space_mb: MIN_SPACE_MB,
            state_file: program_dir().join(STATE_FILE_NAME),
            staging_root: dirs::cache_dir().unwrap_or_else(std::env::temp_dir),
            backup_root: dirs::desktop_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(std::env::temp_dir),
            metadata_timeout: Duration::from_secs(METADATA_TIMEOUT_SECS),
            freq_file_timeout: Duration::from_secs(FREQ_FILE_TIMEOUT_SECS),
            firmware_timeout: Duration::from_secs(FIRMWARE_TIMEOUT_SECS),
            themes_timeout: Duration::from_secs(THEMES_TIMEOUT_SECS),
        }
    }
}

impl InstallerConfig {
    pub fn with_mount_point(mut self, mount_point: PathBuf) -> Self {
        self.mount_point = mount_point;
        self
    }

    /// Reject layouts where a user directory would be wiped as a system one
    pub fn validate(&self) -> Result<()> {
        let overlap: Vec<&String> = self
            .system_directories
            .iter()
            .filter(|d| self.user_directories.contains(d))
            .collect();

        if !overlap.is_empty() {
            return Err(InstallError::Config(format!(
                "directories listed as both system and user: {:?}",
                overlap
            )));
        }
        Ok(())
    }
}

/// Conventional mount point of the card on this OS
pub fn default_mount_point() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        PathBuf::from(format!("/Volumes/{}", VOLUME_LABEL))
    }

    #[cfg(not(target_os = "macos"))]
    {
        match std::env::var("USER") {
            Ok(user) if !user.is_empty() => {
                PathBuf::from(format!("/media/{}/{}", user, VOLUME_LABEL))
            }
            _ => PathBuf::from(format!("/media/{}", VOLUME_LABEL)),
        }
    }
}

/// Directory holding the executable; state and log files live beside it
pub fn program_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_and_user_directories_are_disjoint() {
        for dir in SYSTEM_DIRECTORIES {
            assert!(
                !USER_DIRECTORIES.contains(dir),
                "{} is listed as both system and user directory",
                dir
            );
        }
        assert!(InstallerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let mut config = InstallerConfig::default();
        config.user_directories.push("firmware".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_country_list() {
        assert_eq!(FREQ_COUNTRIES.len(), 11);
        assert_eq!(InstallerConfig::default().countries.len(), 11);
    }
}
