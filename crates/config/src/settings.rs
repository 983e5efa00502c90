//! User settings
//!
//! Stored at `<config_dir>/linelist/settings.json` with flat dotted keys.
//! Lines starting with `//` are treated as comments.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use linelist_engine::column::TableLayout;
use linelist_engine::history::DEFAULT_MAX_ENTRIES;
use linelist_engine::stats::StatisticsOptions;
use linelist_engine::{SessionConfig, TableTemplate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory available on this platform")]
    NoConfigDir,
    #[error("settings I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Grid
    #[serde(rename = "grid.serialColumnWidth")]
    pub serial_column_width: f32,

    #[serde(rename = "grid.defaultColumnWidth")]
    pub default_column_width: f32,

    // Table
    #[serde(rename = "table.showConfirmedCase")]
    pub show_confirmed_case: bool,

    #[serde(rename = "table.individualExposureMode")]
    pub individual_exposure_mode: bool,

    #[serde(rename = "table.defaultRowCount")]
    pub default_row_count: usize,

    // Statistics
    #[serde(rename = "statistics.yatesCorrection")]
    pub yates_correction: bool,

    #[serde(rename = "statistics.haldaneCorrection")]
    pub haldane_correction: bool,

    // History
    #[serde(rename = "history.maxEntries")]
    pub history_max_entries: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let layout = TableLayout::default();
        let statistics = StatisticsOptions::default();
        Self {
            serial_column_width: layout.serial_width,
            default_column_width: layout.default_width,
            show_confirmed_case: layout.show_confirmed_case,
            individual_exposure_mode: layout.individual_exposure_mode,
            default_row_count: TableTemplate::default().row_count,
            yates_correction: statistics.yates_correction,
            haldane_correction: statistics.haldane_correction,
            history_max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

const DEFAULT_FILE: &str = r#"{
    // Column widths in pixels
    "grid.serialColumnWidth": 50,
    "grid.defaultColumnWidth": 80,

    // Table shape
    "table.showConfirmedCase": false,
    "table.individualExposureMode": false,
    "table.defaultRowCount": 10,

    // Statistics
    // Yates continuity correction is applied to chi-square when enabled
    // Haldane adds 0.5 to every cell of a table with a zero cell
    "statistics.yatesCorrection": false,
    "statistics.haldaneCorrection": true,

    // Undo depth
    "history.maxEntries": 100
}
"#;

impl Settings {
    /// `<config_dir>/linelist/settings.json`
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("linelist").join("settings.json"))
    }

    /// Load settings from the platform config dir, falling back to defaults.
    pub fn load() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// Load settings from `path`. A missing file is created with the
    /// commented defaults; an unreadable or malformed one yields defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            if let Err(e) = Self::write_default_file(path) {
                log::warn!("{}", e);
            }
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("error parsing {}: {}; using default settings", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON, skipping `//` comment lines. Unknown keys are
    /// ignored and missing ones take their defaults.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim_start().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(serde_json::from_str(&cleaned)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        ensure_parent(path)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })
    }

    fn write_default_file(path: &Path) -> Result<(), ConfigError> {
        ensure_parent(path)?;
        fs::write(path, DEFAULT_FILE)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        log::info!("created default settings at {}", path.display());
        Ok(())
    }

    pub fn layout(&self) -> TableLayout {
        TableLayout {
            serial_width: self.serial_column_width,
            default_width: self.default_column_width,
            show_confirmed_case: self.show_confirmed_case,
            individual_exposure_mode: self.individual_exposure_mode,
            ..TableLayout::default()
        }
    }

    pub fn statistics(&self) -> StatisticsOptions {
        StatisticsOptions {
            yates_correction: self.yates_correction,
            haldane_correction: self.haldane_correction,
        }
    }

    /// Session configuration built from these settings.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            template: TableTemplate { row_count: self.default_row_count, ..TableTemplate::default() },
            layout: self.layout(),
            statistics: self.statistics(),
            history_depth: self.history_max_entries.max(1),
        }
    }
}

fn ensure_parent(path: &Path) -> Result<(), ConfigError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|source| ConfigError::Io { path: parent.to_path_buf(), source }),
        _ => Ok(()),
    }
}
