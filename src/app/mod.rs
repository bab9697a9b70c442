// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

// Module structure for the updater:
//
// - state.rs: Core types (AppState, option and report structs, Installer) and initialization
// - logic.rs: Firmware, themes and check operations plus the full install
// - freqman.rs: Frequency database sync
// - ui.rs: Terminal rendering of status lines, progress bars and summaries

mod state;
mod logic;
mod freqman;
pub mod ui;

pub use state::{
    AppState, FirmwareOptions, FirmwareReport, FrequencyReport, InstallOptions, InstallSummary,
    Installer, ThemesReport, UpdateCheck,
};
