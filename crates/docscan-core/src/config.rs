// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::types::{EdgeSensitivity, EnhancementLevel};

/// Persistent scanner settings.
///
/// Every field has a default, so a config file only needs to name the values
/// it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Period of the live detection tick in milliseconds.
    pub tick_interval_ms: u64,
    /// Edge-detector sensitivity (30–100).
    pub edge_sensitivity: EdgeSensitivity,
    /// Enhancement applied after rectification.
    pub enhancement_level: EnhancementLevel,
    /// Start scan mode with auto-detection rather than manual corners.
    pub auto_detect: bool,
    /// Switch the torch on when a stream opens (if the track supports it).
    pub use_torch: bool,
    /// Ideal capture width in pixels (a hint to the camera).
    pub ideal_width: u32,
    /// Ideal capture height in pixels (a hint to the camera).
    pub ideal_height: u32,
    /// Ideal frame rate (a hint to the camera).
    pub ideal_frame_rate: u32,
    /// How long the fallback vision backend may take to load, in milliseconds.
    pub fallback_load_timeout_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            edge_sensitivity: EdgeSensitivity::default(),
            enhancement_level: EnhancementLevel::Binarized,
            auto_detect: true,
            use_torch: false,
            ideal_width: 1920,
            ideal_height: 1080,
            ideal_frame_rate: 30,
            fallback_load_timeout_ms: 10_000,
        }
    }
}

impl ScanConfig {
    /// Parse a JSON config and validate it. Well-formed JSON carrying a
    /// value the types reject is reported as `InvalidConfig`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|err| {
            if err.is_data() {
                ScanError::InvalidConfig(err.to_string())
            } else {
                ScanError::from(err)
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(ScanError::InvalidConfig(
                "tick_interval_ms must be greater than zero".into(),
            ));
        }
        if self.ideal_width == 0 || self.ideal_height == 0 {
            return Err(ScanError::InvalidConfig(format!(
                "ideal resolution must be non-zero (got {}x{})",
                self.ideal_width, self.ideal_height
            )));
        }
        if self.ideal_frame_rate == 0 {
            return Err(ScanError::InvalidConfig(
                "ideal_frame_rate must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn fallback_load_timeout(&self) -> Duration {
        Duration::from_millis(self.fallback_load_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behaviour() {
        let config = ScanConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.edge_sensitivity.value(), 50);
        assert_eq!(config.enhancement_level, EnhancementLevel::Binarized);
        assert_eq!((config.ideal_width, config.ideal_height), (1920, 1080));
        assert_eq!(config.fallback_load_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config =
            ScanConfig::from_json_str(r#"{ "edge_sensitivity": 80, "enhancement_level": 3 }"#)
                .expect("valid config");
        assert_eq!(config.edge_sensitivity.value(), 80);
        assert_eq!(config.enhancement_level, EnhancementLevel::DenoisedBinarized);
        assert_eq!(config.tick_interval_ms, 100);
    }

    #[test]
    fn out_of_range_sensitivity_is_rejected() {
        for json in [r#"{ "edge_sensitivity": 5 }"#, r#"{ "edge_sensitivity": 101 }"#] {
            let err = ScanConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, ScanError::InvalidConfig(_)), "{json}: {err:?}");
        }
        let edge = ScanConfig::from_json_str(r#"{ "edge_sensitivity": 30 }"#).expect("parse");
        assert_eq!(edge.edge_sensitivity.value(), 30);
    }

    #[test]
    fn bad_enhancement_level_is_rejected() {
        let err = ScanConfig::from_json_str(r#"{ "enhancement_level": 7 }"#).unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = ScanConfig::from_json_str(r#"{ "edge_sensitivity": "#).unwrap_err();
        assert!(matches!(err, ScanError::Serialization(_)));
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let err = ScanConfig::from_json_str(r#"{ "tick_interval_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig(_)));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scan.json");
        let config = ScanConfig {
            auto_detect: false,
            use_torch: true,
            ..ScanConfig::default()
        };
        config.save(&path).expect("save");
        let loaded = ScanConfig::load(&path).expect("load");
        assert_eq!(loaded, config);
    }
}
