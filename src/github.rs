// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

use crate::config::{FIRMWARE_ASSET_MARKER, NO_WORLD_MAP_MARKER, USER_AGENT};
use crate::error::{InstallError, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Release {
    pub tag_name: String,
    pub name: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Asset {
    pub name: String,
    pub size: u64,
    pub browser_download_url: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    #[serde(other)]
    Other,
}

/// One item of a repository directory listing
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    /// Path relative to the repository root
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl CatalogEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Which firmware package to pick from a release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetVariant {
    WithWorldMap,
    /// Smaller package without the world map tiles
    NoWorldMap,
}

impl AssetVariant {
    pub fn from_world_map(include_world_map: bool) -> Self {
        if include_world_map {
            Self::WithWorldMap
        } else {
            Self::NoWorldMap
        }
    }

    fn matches(self, asset_name: &str) -> bool {
        if !asset_name.contains(FIRMWARE_ASSET_MARKER) {
            return false;
        }
        let without_map = asset_name.contains(NO_WORLD_MAP_MARKER);
        match self {
            Self::WithWorldMap => !without_map,
            Self::NoWorldMap => without_map,
        }
    }
}

pub fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| InstallError::Config(format!("Failed to build HTTP client: {}", e)))
}

pub async fn get_latest_release(
    client: &reqwest::Client,
    api_url: &str,
    timeout: Duration,
) -> Result<Release> {
    let remote_err = |message: String| InstallError::Remote {
        url: api_url.to_string(),
        message,
    };

    log::debug!("GET {}", api_url);
    let response = client
        .get(api_url)
        .header("Accept", "application/vnd.github.v3+json")
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| remote_err(format!("request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(remote_err(format!("GitHub API error: {}", response.status())));
    }

    response
        .json::<Release>()
        .await
        .map_err(|e| remote_err(format!("Failed to parse release: {}", e)))
}

/// First asset of the release matching the variant, in release order
pub fn find_firmware_asset(release: &Release, variant: AssetVariant) -> Option<&Asset> {
    release.assets.iter().find(|a| variant.matches(&a.name))
}

/// List one directory of a repository through the contents API.
///
/// A failed request is an error; `Ok` with no entries means the directory
/// really is empty.
pub async fn list_directory(
    client: &reqwest::Client,
    contents_url: &str,
    path: &str,
    timeout: Duration,
) -> Result<Vec<CatalogEntry>> {
    let url = if path.is_empty() {
        contents_url.to_string()
    } else {
        format!("{}/{}", contents_url.trim_end_matches('/'), path)
    };
    let listing_err = |message: String| InstallError::Listing {
        path: path.to_string(),
        url: url.clone(),
        message,
    };

    log::debug!("GET {}", url);
    let response = client
        .get(&url)
        .header("Accept", "application/vnd.github.v3+json")
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| listing_err(format!("request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(listing_err(format!("GitHub API error: {}", response.status())));
    }

    response
        .json::<Vec<CatalogEntry>>()
        .await
        .map_err(|e| listing_err(format!("Failed to parse listing: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, size: u64) -> Asset {
        Asset {
            name: name.to_string(),
            size,
            browser_download_url: format!("https://example.com/{}", name),
        }
    }

    fn release(names: &[&str]) -> Release {
        Release {
            tag_name: "v2.1.0".to_string(),
            name: None,
            assets: names.iter().map(|n| asset(n, 1)).collect(),
        }
    }

    #[test]
    fn test_find_firmware_asset_by_world_map_preference() {
        let release = release(&[
            "mayhem_v2.1.0_FIRMWARE.zip",
            "mayhem_v2.1.0_COPY_TO_SDCARD-no-world-map.zip",
            "mayhem_v2.1.0_COPY_TO_SDCARD.zip",
        ]);

        let with_map = find_firmware_asset(&release, AssetVariant::WithWorldMap).unwrap();
        assert_eq!(with_map.name, "mayhem_v2.1.0_COPY_TO_SDCARD.zip");

        let without_map = find_firmware_asset(&release, AssetVariant::NoWorldMap).unwrap();
        assert_eq!(without_map.name, "mayhem_v2.1.0_COPY_TO_SDCARD-no-world-map.zip");
    }

    #[test]
    fn test_find_firmware_asset_is_deterministic() {
        let release = release(&[
            "a_COPY_TO_SDCARD.zip",
            "b_COPY_TO_SDCARD.zip",
            "c_COPY_TO_SDCARD-no-world-map.zip",
        ]);
        for _ in 0..5 {
            let picked = find_firmware_asset(&release, AssetVariant::WithWorldMap).unwrap();
            assert_eq!(picked.name, "a_COPY_TO_SDCARD.zip");
        }
    }

    #[test]
    fn test_find_firmware_asset_without_marker_fails() {
        let release = release(&["mayhem_v2.1.0_FIRMWARE.zip", "hackrf_one.bin"]);
        assert!(find_firmware_asset(&release, AssetVariant::WithWorldMap).is_none());
        assert!(find_firmware_asset(&release, AssetVariant::NoWorldMap).is_none());
    }

    #[test]
    fn test_missing_variant_is_not_substituted() {
        let release = release(&["mayhem_COPY_TO_SDCARD.zip"]);
        assert!(find_firmware_asset(&release, AssetVariant::NoWorldMap).is_none());
    }

    #[test]
    fn test_parse_catalog_entries() {
        let json = r#"[
            {"name": "USA", "path": "country-specific/USA", "type": "dir", "sha": "x"},
            {"name": "AIRPORTS.TXT", "path": "generic/AIRPORTS.TXT", "type": "file", "size": 12},
            {"name": "link", "path": "generic/link", "type": "symlink"}
        ]"#;
        let entries: Vec<CatalogEntry> = serde_json::from_str(json).unwrap();
        assert!(entries[0].is_dir());
        assert!(entries[1].is_file());
        assert_eq!(entries[2].kind, EntryKind::Other);
        assert!(!entries[2].is_file() && !entries[2].is_dir());
    }

    #[test]
    fn test_parse_release() {
        let json = r#"{
            "tag_name": "v2.1.0",
            "name": "Mayhem v2.1.0",
            "assets": [{
                "name": "mayhem_v2.1.0_COPY_TO_SDCARD.zip",
                "size": 104857600,
                "browser_download_url": "https://github.com/x/y/releases/download/v2.1.0/a.zip"
            }]
        }"#;
        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name, "v2.1.0");
        assert_eq!(release.assets[0].size, 104_857_600);
    }
}
