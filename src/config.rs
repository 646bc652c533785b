use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::accuracy::DEFAULT_MAX_ACCURACY_M;
use crate::error::{TrackerError, TrackerResult};
use crate::smoothing::{DEFAULT_ALPHA, DEFAULT_WINDOW_SIZE};

/// Movement below this many meters between accepted fixes is treated as jitter
pub const DEFAULT_NOISE_FLOOR_M: f64 = 0.1;

/// Tuning for the fix pipeline and the async driver.
///
/// All fields have defaults, so a config file only needs the keys it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Exponential smoothing factor in (0, 1]
    pub smoothing_alpha: f64,
    /// Number of smoothed speeds averaged for the estimate
    pub smoothing_window: usize,
    /// Fixes with a larger accuracy radius are rejected (meters)
    pub max_accuracy_m: f64,
    /// Minimum counted step between accepted fixes (meters)
    pub noise_floor_m: f64,
    /// Clock tick period (milliseconds)
    pub tick_interval_ms: u64,
    /// Where to write the live status JSON every tick, if anywhere
    pub status_path: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: DEFAULT_ALPHA,
            smoothing_window: DEFAULT_WINDOW_SIZE,
            max_accuracy_m: DEFAULT_MAX_ACCURACY_M,
            noise_floor_m: DEFAULT_NOISE_FLOOR_M,
            tick_interval_ms: 1000,
            status_path: None,
        }
    }
}

impl TrackerConfig {
    /// Load and validate a JSON config file
    pub fn from_file(path: &Path) -> TrackerResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: TrackerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TrackerResult<()> {
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(TrackerError::Config(format!(
                "smoothing_alpha must be in (0, 1], got {}",
                self.smoothing_alpha
            )));
        }
        if self.smoothing_window == 0 {
            return Err(TrackerError::Config(
                "smoothing_window must be at least 1".to_string(),
            ));
        }
        if !(self.max_accuracy_m > 0.0) {
            return Err(TrackerError::Config(format!(
                "max_accuracy_m must be positive, got {}",
                self.max_accuracy_m
            )));
        }
        if !(self.noise_floor_m >= 0.0) {
            return Err(TrackerError::Config(format!(
                "noise_floor_m must be non-negative, got {}",
                self.noise_floor_m
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(TrackerError::Config(
                "tick_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.smoothing_alpha, 0.3);
        assert_eq!(config.smoothing_window, 10);
        assert_eq!(config.max_accuracy_m, 20.0);
        assert_eq!(config.noise_floor_m, 0.1);
        assert_eq!(config.tick_interval_ms, 1000);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = TrackerConfig::default();
        config.smoothing_alpha = 0.0;
        assert!(matches!(config.validate(), Err(TrackerError::Config(_))));

        let mut config = TrackerConfig::default();
        config.smoothing_alpha = 1.5;
        assert!(config.validate().is_err());

        let mut config = TrackerConfig::default();
        config.smoothing_window = 0;
        assert!(config.validate().is_err());

        let mut config = TrackerConfig::default();
        config.max_accuracy_m = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = TrackerConfig::default();
        config.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TrackerConfig = serde_json::from_str(r#"{"max_accuracy_m": 15.0}"#).unwrap();
        assert_eq!(config.max_accuracy_m, 15.0);
        assert_eq!(config.smoothing_window, 10);
        assert!(config.status_path.is_none());
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("track_meter_config_{}.json", std::process::id()));
        fs::write(&path, r#"{"smoothing_alpha": 0.5, "tick_interval_ms": 500}"#).unwrap();

        let config = TrackerConfig::from_file(&path).unwrap();
        assert_eq!(config.smoothing_alpha, 0.5);
        assert_eq!(config.tick_interval_ms, 500);

        fs::write(&path, r#"{"smoothing_alpha": 2.0}"#).unwrap();
        assert!(TrackerConfig::from_file(&path).is_err());

        let _ = fs::remove_file(&path);
    }
}
