// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

use crate::config::FREQ_COUNTRIES;
use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PortaPack Mayhem updater - firmware, themes and frequency files for the SD card
#[derive(Parser, Debug)]
#[command(name = "portapack-updater")]
#[command(about = "Update a PortaPack Mayhem SD card: firmware, themes and frequency databases")]
#[command(version)]
pub struct Cli {
    /// Install the smaller firmware package without the world map tiles
    #[arg(long, global = true)]
    pub no_world_map: bool,

    /// Copy user folders off the card before installing firmware
    #[arg(long, global = true)]
    pub backup: bool,

    /// Debug-level logging, also echoed to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Where the PORTAPACK card is mounted, if not the usual place
    #[arg(long, global = true, value_name = "PATH")]
    pub mount_point: Option<PathBuf>,

    /// Countries for frequency files (default: all)
    #[arg(long, global = true, num_args = 1.., value_parser = PossibleValuesParser::new(FREQ_COUNTRIES.iter().copied()))]
    pub countries: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Firmware, themes, world map and frequency files (default)
    InstallAll,
    /// Firmware package only (includes themes)
    FirmwareOnly,
    /// Frequency manager files only
    FrequencyOnly,
    /// Replace only the theme resources (pp_res)
    ThemesOnly,
    /// Report whether a newer firmware release exists
    Check,
}

impl Cli {
    pub fn operation(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::InstallAll)
    }

    /// None when no country was named, meaning all of them
    pub fn selected_countries(&self) -> Option<Vec<String>> {
        if self.countries.is_empty() {
            None
        } else {
            Some(self.countries.clone())
        }
    }
}
