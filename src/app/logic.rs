// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

// ============================================================================
// Install sequences
// ============================================================================
// Every operation runs its steps strictly one after another. Progress of the
// long steps (download, extraction, cleaning, backup) goes out over an mpsc
// channel to a printer task from ui.rs; the step awaits that printer before
// moving on so terminal output never interleaves.
//
// A sequence is split into an outer pub fn that handles the Done/Failed
// transition and an inner run_* fn that uses `?` freely.
// ============================================================================

use super::ui::{self, StatusKind};
use super::{
    AppState, FirmwareOptions, FirmwareReport, InstallOptions, InstallSummary, Installer,
    ThemesReport, UpdateCheck,
};
use crate::config::{TEMP_PREFIX, THEMES_DIRECTORY};
use crate::copy::{backup_user_directories, BackupReport};
use crate::delete::{clean_system_directories, CleanReport};
use crate::download::{download_to_file, format_size};
use crate::drives::{inspect_volume, VolumeInfo};
use crate::error::{InstallError, Result};
use crate::extract::{extract_all, extract_subtree, verify_archive, ExtractReport};
use crate::github::{find_firmware_asset, get_latest_release, Asset, AssetVariant, Release};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub(super) fn now_rfc3339() -> String {
    chrono::Local::now().to_rfc3339()
}

impl Installer {
    /// Download the latest firmware package and install it onto the card.
    pub async fn install_firmware(&mut self, options: FirmwareOptions) -> Result<FirmwareReport> {
        crate::debug::log_section("Firmware Update");
        match self.run_firmware(options).await {
            Ok(report) => {
                self.set_state(AppState::Done);
                Ok(report)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Replace only the theme resources (`pp_res/`) from the latest release.
    pub async fn install_themes(&mut self) -> Result<ThemesReport> {
        crate::debug::log_section("Themes Update");
        match self.run_themes().await {
            Ok(report) => {
                self.set_state(AppState::Done);
                Ok(report)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Compare the latest published release with the last installed one.
    /// Reads the state record but never writes it, and never touches the card.
    pub async fn check_for_update(&mut self) -> Result<UpdateCheck> {
        crate::debug::log_section("Update Check");
        let release = match self.fetch_release().await {
            Ok(release) => release,
            Err(e) => return Err(self.fail(e)),
        };

        let state = self.store.load();
        if state.is_empty() {
            log::debug!("No install recorded in {:?}", self.store.path());
        }
        let installed = state.last_firmware_version;
        let update_available = installed.as_deref() != Some(release.tag_name.as_str());
        log::info!(
            "Latest: {}, installed: {:?}, update available: {}",
            release.tag_name,
            installed,
            update_available
        );

        self.set_state(AppState::Done);
        Ok(UpdateCheck {
            latest: release.tag_name,
            installed,
            update_available,
        })
    }

    /// Firmware, then frequency files, then a filesystem sync.
    ///
    /// Only a firmware failure fails the whole run; a frequency failure is
    /// reported and leaves `frequencies` empty in the summary.
    pub async fn install_all(&mut self, options: InstallOptions) -> Result<InstallSummary> {
        crate::debug::log_section("Full Install");

        ui::print_heading("FIRMWARE");
        let firmware = self.install_firmware(options.firmware).await?;
        ui::print_firmware_report(&firmware);

        ui::print_heading("FREQUENCIES");
        let frequencies = match self
            .install_frequencies(options.countries.as_deref())
            .await
        {
            Ok(report) => {
                ui::print_frequency_report(&report);
                Some(report)
            }
            Err(e) => {
                log::warn!("Frequency install failed, continuing: {}", e);
                ui::report_error(&e);
                None
            }
        };

        ui::status(StatusKind::Progress, "Syncing filesystem...");
        sync_filesystem();
        self.set_state(AppState::Done);

        Ok(InstallSummary {
            firmware,
            frequencies,
            include_world_map: options.firmware.include_world_map,
        })
    }

    async fn run_firmware(&mut self, options: FirmwareOptions) -> Result<FirmwareReport> {
        let volume = self.require_volume()?;

        self.set_state(AppState::VerifyingSpace);
        if volume.available_mb < self.config.min_space_mb {
            return Err(InstallError::InsufficientSpace {
                available_mb: volume.available_mb,
                required_mb: self.config.min_space_mb,
            });
        }
        log::info!("Space check passed: {}", volume.display_name());
        ui::status(
            StatusKind::Success,
            &format!("Space check passed: {} MB available", volume.available_mb),
        );

        let backup = if options.backup {
            self.set_state(AppState::BackingUp);
            self.backup(&volume.mount_path).await
        } else {
            None
        };

        self.set_state(AppState::Downloading);
        let release = self.fetch_release().await?;
        let variant = AssetVariant::from_world_map(options.include_world_map);
        let asset = find_firmware_asset(&release, variant)
            .cloned()
            .ok_or_else(|| InstallError::AssetNotFound {
                tag: release.tag_name.clone(),
            })?;
        ui::status(
            StatusKind::Info,
            &format!("Selected: {} ({})", asset.name, format_size(asset.size)),
        );

        let staging = self.staging_dir()?;
        let timeout = self.config.firmware_timeout;
        let (archive, downloaded_bytes) = self
            .download_asset(&asset, staging.path(), timeout, "Firmware")
            .await?;

        // Refuse a damaged download before anything on the card is removed
        let entries = verify_archive(&archive).await?;
        log::info!("Archive holds {} entries", entries);

        self.set_state(AppState::Cleaning);
        let cleaned = self.clean(&volume.mount_path).await;

        self.set_state(AppState::Extracting);
        ui::status(StatusKind::Progress, "Extracting firmware to SD card...");
        let extracted = self.extract(&archive, &volume.mount_path, None).await?;
        drop(staging);

        self.set_state(AppState::UpdatingState);
        let mut state = self.store.load();
        state.last_firmware_version = Some(release.tag_name.clone());
        state.last_firmware_update = Some(now_rfc3339());
        self.store.save(&state)?;
        log::debug!("State saved to {:?}", self.store.path());

        log::info!(
            "Firmware {} installed: {} entries, {} skipped",
            release.tag_name,
            extracted.extracted,
            extracted.skipped.len()
        );

        Ok(FirmwareReport {
            version: release.tag_name,
            asset_name: asset.name,
            downloaded_bytes,
            cleaned,
            extracted,
            backup,
        })
    }

    async fn run_themes(&mut self) -> Result<ThemesReport> {
        let volume = self.require_volume()?;

        self.set_state(AppState::Downloading);
        let release = self.fetch_release().await?;
        // The small package carries the same pp_res tree
        let asset = find_firmware_asset(&release, AssetVariant::NoWorldMap)
            .cloned()
            .ok_or_else(|| InstallError::AssetNotFound {
                tag: release.tag_name.clone(),
            })?;

        let staging = self.staging_dir()?;
        let timeout = self.config.themes_timeout;
        let (archive, _) = self
            .download_asset(&asset, staging.path(), timeout, "Themes")
            .await?;
        verify_archive(&archive).await?;

        self.set_state(AppState::Cleaning);
        let themes = vec![THEMES_DIRECTORY.to_string()];
        let (tx, printer) = ui::delete_printer();
        clean_system_directories(&volume.mount_path, &themes, tx).await;
        let _ = printer.await;

        self.set_state(AppState::Extracting);
        let prefix = format!("{}/", THEMES_DIRECTORY);
        let extracted = self
            .extract(&archive, &volume.mount_path, Some(&prefix))
            .await?;
        drop(staging);

        Ok(ThemesReport {
            version: release.tag_name,
            extracted,
        })
    }

    /// Log the error and move to `Failed`
    pub(super) fn fail(&mut self, err: InstallError) -> InstallError {
        log::error!("{}", err);
        self.set_state(AppState::Failed);
        err
    }

    pub(super) fn require_volume(&mut self) -> Result<VolumeInfo> {
        self.set_state(AppState::CheckingVolume);
        let mount = self.config.mount_point.clone();
        match inspect_volume(&mount) {
            Some(volume) => {
                ui::status(
                    StatusKind::Success,
                    &format!("SD card found at: {}", volume.mount_path.display()),
                );
                Ok(volume)
            }
            None => Err(InstallError::VolumeAbsent { mount }),
        }
    }

    async fn fetch_release(&self) -> Result<Release> {
        ui::status(StatusKind::Progress, "Fetching latest release info...");
        let release = get_latest_release(
            &self.client,
            &self.config.firmware_release_url,
            self.config.metadata_timeout,
        )
        .await?;
        log::info!(
            "Latest release: {} \"{}\" ({} assets)",
            release.tag_name,
            release.name.as_deref().unwrap_or(""),
            release.assets.len()
        );
        ui::status(
            StatusKind::Success,
            &format!("Latest version: {}", release.tag_name),
        );
        Ok(release)
    }

    /// Fresh staging directory, removed when the returned guard drops
    fn staging_dir(&self) -> Result<TempDir> {
        let root = &self.config.staging_root;
        std::fs::create_dir_all(root).map_err(|e| InstallError::io(root, e))?;
        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir_in(root)
            .map_err(|e| InstallError::io(root, e))?;
        log::debug!("Staging directory: {:?}", dir.path());
        Ok(dir)
    }

    async fn download_asset(
        &self,
        asset: &Asset,
        staging: &Path,
        timeout: Duration,
        label: &str,
    ) -> Result<(PathBuf, u64)> {
        // Asset names come from the server; keep only the final component
        let file_name = Path::new(&asset.name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "package.zip".into());
        let dest = staging.join(file_name);

        let (tx, printer) = ui::download_printer(label);
        let result =
            download_to_file(&self.client, &asset.browser_download_url, &dest, timeout, tx).await;
        let _ = printer.await;

        let bytes = result?;
        ui::status(
            StatusKind::Success,
            &format!("Downloaded {}", format_size(bytes)),
        );
        Ok((dest, bytes))
    }

    async fn backup(&self, mount_path: &Path) -> Option<BackupReport> {
        let (tx, printer) = ui::copy_printer();
        let result = backup_user_directories(
            mount_path,
            &self.config.user_directories,
            None,
            &self.config.backup_root,
            tx,
        )
        .await;
        let _ = printer.await;

        match result {
            Ok(report) => Some(report),
            Err(e) => {
                log::warn!("Backup failed, continuing without it: {}", e);
                ui::status(StatusKind::Warning, &format!("Backup failed: {}", e));
                None
            }
        }
    }

    async fn clean(&self, mount_path: &Path) -> CleanReport {
        let (tx, printer) = ui::delete_printer();
        let report = clean_system_directories(mount_path, &self.config.system_directories, tx).await;
        let _ = printer.await;
        report
    }

    async fn extract(
        &self,
        archive: &Path,
        target: &Path,
        prefix: Option<&str>,
    ) -> Result<ExtractReport> {
        let (tx, printer) = ui::extract_printer();
        let result = match prefix {
            Some(prefix) => extract_subtree(archive, target, prefix, tx).await,
            None => extract_all(archive, target, tx).await,
        };
        let _ = printer.await;
        result
    }
}

/// Flush OS write buffers so the card can be pulled soon after
fn sync_filesystem() {
    #[cfg(unix)]
    unsafe {
        libc::sync();
    }
    #[cfg(not(unix))]
    log::debug!("No filesystem sync on this platform");
}
