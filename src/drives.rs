// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

use std::path::{Path, PathBuf};

/// The PortaPack SD card as seen by this machine
#[derive(Debug, Clone)]
pub struct VolumeInfo {
    /// Mount point (e.g. "/Volumes/PORTAPACK" on macOS)
    pub mount_path: PathBuf,
    /// Free space in MB at the time of the check
    pub available_mb: u64,
}

impl VolumeInfo {
    pub fn display_name(&self) -> String {
        format!("{} ({} MB free)", self.mount_path.display(), self.available_mb)
    }
}

/// The card counts as present iff its mount point exists and is a directory
pub fn detect_volume(mount_path: &Path) -> bool {
    let present = mount_path.is_dir();
    if present {
        log::info!("SD Card detected at: {:?}", mount_path);
    } else {
        log::info!("No SD Card at: {:?}", mount_path);
    }
    present
}

/// Detect the card and measure its free space in one go
pub fn inspect_volume(mount_path: &Path) -> Option<VolumeInfo> {
    if !detect_volume(mount_path) {
        return None;
    }
    Some(VolumeInfo {
        mount_path: mount_path.to_path_buf(),
        available_mb: available_space_mb(mount_path),
    })
}

/// Available space for a given path in MB
pub fn available_space_mb(path: &Path) -> u64 {
    get_available_disk_space(path) / 1_048_576
}

/// Get available disk space for a given path (in bytes)
pub fn get_available_disk_space(path: &Path) -> u64 {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        let Ok(path_cstr) = std::ffi::CString::new(path.as_os_str().as_bytes()) else {
            log::warn!("Path {:?} contains a NUL byte, assuming sufficient space", path);
            return u64::MAX;
        };
        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };

        unsafe {
            if libc::statvfs(path_cstr.as_ptr(), &mut stat) == 0 {
                // Available space = fragment size * blocks available to unprivileged users
                // Cast both to u64 to handle platforms where they're u32 (macOS, ARM32)
                return (stat.f_bavail as u64) * (stat.f_frsize as u64);
            }
        }
        log::warn!(
            "Failed to get disk space for {:?}: {}, assuming sufficient space",
            path,
            std::io::Error::last_os_error()
        );
        u64::MAX
    }

    #[cfg(not(unix))]
    {
        log::warn!("Disk space check not supported on this platform ({:?})", path);
        u64::MAX
    }
}
