// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

use super::logic::now_rfc3339;
use super::ui::{self, StatusKind};
use super::{AppState, FrequencyReport, Installer};
use crate::config::{FREQMAN_COUNTRY_PREFIX, FREQMAN_DIRECTORY, FREQMAN_GENERIC_BUCKET};
use crate::download::fetch_file;
use crate::error::{InstallError, Result};
use crate::github::{list_directory, CatalogEntry};
use std::collections::HashSet;
use std::path::Path;

fn is_text_file(name: &str) -> bool {
    name.ends_with(".txt") || name.ends_with(".TXT")
}

impl Installer {
    /// Sync frequency manager files into `FREQMAN/`.
    ///
    /// `countries` of None means every configured country. Failed listings and
    /// failed files are counted and skipped; the run only fails when nothing
    /// at all could be installed. The state record is updated either way.
    pub async fn install_frequencies(
        &mut self,
        countries: Option<&[String]>,
    ) -> Result<FrequencyReport> {
        crate::debug::log_section("Frequency Databases");
        match self.run_frequencies(countries).await {
            Ok(report) => {
                self.set_state(AppState::Done);
                Ok(report)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn run_frequencies(&mut self, countries: Option<&[String]>) -> Result<FrequencyReport> {
        let volume = self.require_volume()?;

        let freqman_dir = volume.mount_path.join(FREQMAN_DIRECTORY);
        tokio::fs::create_dir_all(&freqman_dir)
            .await
            .map_err(|e| InstallError::io(&freqman_dir, e))?;

        let countries: Vec<String> = match countries {
            Some(list) if !list.is_empty() => list.to_vec(),
            _ => self.config.countries.clone(),
        };
        let mut report = FrequencyReport {
            countries: countries.clone(),
            ..Default::default()
        };

        self.set_state(AppState::Downloading);
        ui::status(StatusKind::Progress, "Installing frequency databases...");

        ui::status(StatusKind::Info, "Fetching generic frequency files...");
        self.install_bucket(FREQMAN_GENERIC_BUCKET, true, &freqman_dir, &mut report)
            .await;

        for country in &countries {
            ui::status(
                StatusKind::Info,
                &format!("Fetching {} frequency files...", country),
            );
            let bucket = format!("{}/{}", FREQMAN_COUNTRY_PREFIX, country);
            self.install_bucket(&bucket, false, &freqman_dir, &mut report)
                .await;
        }

        log::info!(
            "Installed {} frequency files ({} failed, {} listings failed)",
            report.installed,
            report.failed,
            report.failed_listings.len()
        );

        self.set_state(AppState::UpdatingState);
        let mut state = self.store.load();
        state.last_freqman_update = Some(now_rfc3339());
        state.freqman_countries = countries;
        self.store.save(&state)?;

        if report.installed == 0 {
            return Err(InstallError::NothingInstalled {
                failed: report.failed,
            });
        }
        Ok(report)
    }

    /// Walk one remote directory tree and copy its files flat into `dest_dir`
    async fn install_bucket(
        &self,
        bucket: &str,
        text_only: bool,
        dest_dir: &Path,
        report: &mut FrequencyReport,
    ) {
        let mut pending = vec![bucket.to_string()];
        let mut visited = HashSet::new();

        while let Some(path) = pending.pop() {
            if !visited.insert(path.clone()) {
                log::debug!("Already listed {}, skipping", path);
                continue;
            }
            let entries = match list_directory(
                &self.client,
                &self.config.freqman_contents_url,
                &path,
                self.config.metadata_timeout,
            )
            .await
            {
                Ok(entries) => entries,
                Err(e) => {
                    log::error!("{}", e);
                    report.failed_listings.push(path);
                    continue;
                }
            };
            log::debug!("{}: {} entries", path, entries.len());

            for entry in entries {
                if entry.is_dir() {
                    pending.push(entry.path);
                } else if entry.is_file() && (!text_only || is_text_file(&entry.name)) {
                    match self.install_file(&entry, dest_dir).await {
                        Ok(_) => report.installed += 1,
                        Err(e) => {
                            log::warn!("Failed to download {}: {}", entry.path, e);
                            report.failed += 1;
                        }
                    }
                }
            }
        }
    }

    async fn install_file(&self, entry: &CatalogEntry, dest_dir: &Path) -> Result<u64> {
        let url = format!(
            "{}/{}",
            self.config.freqman_raw_url.trim_end_matches('/'),
            entry.path
        );
        let file_name = Path::new(&entry.name).file_name().ok_or_else(|| {
            InstallError::download(&url, format!("unusable file name {:?}", entry.name))
        })?;
        fetch_file(
            &self.client,
            &url,
            &dest_dir.join(file_name),
            self.config.freq_file_timeout,
        )
        .await
    }
}
