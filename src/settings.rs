//! Session settings and debug switches
//!
//! Persisted as a JSON file next to the binary; every field has a default so
//! partial files are accepted.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Obstacles ===
    /// Chasers come back once their spawn point scrolls out of view
    pub respawn_chasers: bool,

    // === Debug ===
    /// Start on this platform instead of the start floor
    pub start_platform_index: Option<usize>,

    // === Feel ===
    /// Extra vertical jump multiplier on viewports wider than the reference
    /// width: `1 + boost * max(0, scale - 1)`
    pub wide_jump_boost: f32,

    // === Input ===
    /// False when no keyboard is attached; input then comes only from
    /// virtual controls
    pub keyboard_available: bool,

    /// Seed for obstacle randomness (initial flier directions)
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            respawn_chasers: false,
            start_platform_index: None,
            wide_jump_boost: 0.0,
            keyboard_available: true,
            seed: 0x5eed_c0de,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_from(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    /// Vertical jump multiplier for the given horizontal scale factor
    pub fn jump_height_multiplier(&self, scale: f32) -> f32 {
        1.0 + self.wide_jump_boost * (scale - 1.0).max(0.0)
    }
}
