//! Configuration Module
//! The cosmetic knobs that drifted between versions of the original sheets
//! (palette, pitch-type ordering, outcome rule table, strike-zone box) live
//! in one optional JSON file next to the data folder. UI state (the last
//! folder opened) persists separately in the platform config directory.

use crate::data::derive::{default_outcome_rules, OutcomeRule};
use crate::data::schema::DEFAULT_PITCH_ORDER;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name probed inside the data folder.
pub const CONFIG_FILE: &str = "pitchscope.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Strike-zone rectangle drawn on the plate-location chart, in centimeters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrikeZone {
    pub side_min: f64,
    pub width: f64,
    pub height_min: f64,
    pub height: f64,
}

impl Default for StrikeZone {
    fn default() -> Self {
        Self {
            side_min: -25.0,
            width: 50.0,
            height_min: 45.0,
            height: 60.0,
        }
    }
}

/// Presentation configuration. Every field falls back to a built-in default
/// when missing from the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// RGB triples cycled per pitch type.
    pub palette: Vec<[u8; 3]>,
    /// Canonical pitch-type priority order for tables and legends.
    pub pitch_order: Vec<String>,
    /// Ordered outcome-classification cascade.
    pub outcome_rules: Vec<OutcomeRule>,
    pub strike_zone: StrikeZone,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            palette: vec![
                [231, 76, 60],  // Red
                [52, 152, 219], // Blue
                [46, 204, 113], // Green
                [155, 89, 182], // Purple
                [243, 156, 18], // Orange
                [26, 188, 156], // Teal
                [233, 30, 99],  // Pink
                [0, 188, 212],  // Cyan
                [121, 85, 72],  // Brown
                [96, 125, 139], // Blue Grey
            ],
            pitch_order: DEFAULT_PITCH_ORDER.iter().map(|s| s.to_string()).collect(),
            outcome_rules: default_outcome_rules(),
            strike_zone: StrikeZone::default(),
        }
    }
}

impl DashboardConfig {
    /// Load `pitchscope.json` from a data folder. A missing file is the
    /// default config; a present-but-broken file is an error the caller may
    /// degrade to defaults with a warning.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::IoError {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::ParseError { path, source })
    }
}

/// Persisted UI state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiState {
    pub last_folder: Option<PathBuf>,
}

impl UiState {
    fn state_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "pitchscope").map(|d| d.config_dir().join("ui_state.json"))
    }

    /// Best-effort restore; any failure is a fresh state.
    pub fn restore() -> Self {
        Self::state_path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    /// Best-effort persist; failures are logged by the caller at most.
    pub fn persist(&self) -> std::io::Result<()> {
        let Some(path) = Self::state_path() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_default_config() {
        let dir = std::env::temp_dir().join(format!("pitchscope_cfg_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let cfg = DashboardConfig::load_from_dir(&dir).unwrap();
        assert_eq!(cfg.pitch_order[0], "Fastball");
        assert_eq!(cfg.outcome_rules[0].label, "home run");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = std::env::temp_dir().join(format!("pitchscope_cfg2_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(CONFIG_FILE),
            r#"{"pitch_order": ["Sinker", "Slider"]}"#,
        )
        .unwrap();

        let cfg = DashboardConfig::load_from_dir(&dir).unwrap();
        assert_eq!(cfg.pitch_order, vec!["Sinker", "Slider"]);
        // Untouched sections keep their defaults.
        assert!(!cfg.outcome_rules.is_empty());
        assert_eq!(cfg.strike_zone.width, 50.0);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("pitchscope_cfg3_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE), "{not json").unwrap();

        assert!(matches!(
            DashboardConfig::load_from_dir(&dir),
            Err(ConfigError::ParseError { .. })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rule_table_round_trips_through_json() {
        let cfg = DashboardConfig::default();
        let text = serde_json::to_string(&cfg).unwrap();
        let back: DashboardConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back.outcome_rules.len(), cfg.outcome_rules.len());
        assert_eq!(back.outcome_rules[0].label, "home run");
    }
}
