// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

// Centralized logging for the PortaPack updater
// Records from the `log` macros are appended to a log file beside the
// executable; with --verbose they are echoed to stderr as well.

use log::{LevelFilter, Log, Metadata, Record};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

lazy_static::lazy_static! {
    static ref DEBUG_LOG: Mutex<DebugLog> = Mutex::new(DebugLog::disabled());
}

static LOGGER: FileLogger = FileLogger;

pub struct DebugLog {
    path: Option<PathBuf>,
    echo: bool,
}

impl DebugLog {
    fn disabled() -> Self {
        Self {
            path: None,
            echo: false,
        }
    }

    fn write_line(&self, line: &str) {
        if let Some(path) = &self.path {
            if let Ok(mut f) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
            {
                let _ = writeln!(f, "{}", line);
            }
        }
        if self.echo {
            eprintln!("{}", line);
        }
    }
}

struct FileLogger;

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "{} - {} - {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.args()
        );
        if let Ok(debug_log) = DEBUG_LOG.lock() {
            debug_log.write_line(&line);
        }
    }

    fn flush(&self) {}
}

/// Install the file logger. Safe to call once per process; later calls only
/// update the destination and level.
pub fn init(log_path: &Path, verbose: bool) {
    if let Ok(mut debug_log) = DEBUG_LOG.lock() {
        debug_log.path = Some(log_path.to_path_buf());
        debug_log.echo = verbose;
    }

    let _ = log::set_logger(&LOGGER);
    log::set_max_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    log::info!("=== {} {} ===", crate::config::APP_NAME, env!("CARGO_PKG_VERSION"));
    log::debug!("Log file: {:?}", log_path);
    log::debug!("Platform: {} / {}", std::env::consts::OS, std::env::consts::ARCH);
}

/// Log a section header
pub fn log_section(section: &str) {
    log::info!("=== {} ===", section);
}

/// Get the path to the log file, if logging to a file is set up
pub fn get_log_path() -> Option<PathBuf> {
    DEBUG_LOG.lock().ok().and_then(|debug_log| debug_log.path.clone())
}
