//! Configuration for the purity tracker.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Signal thresholds for the keystroke tracker
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// IANA time zone used for `hour_of_day`; host local time when unset
    #[serde(default)]
    pub timezone: Option<String>,

    /// Path for storing transparency stats
    pub data_path: PathBuf,

    /// Vote submission endpoint
    #[serde(default)]
    pub gateway: Option<GatewaySettings>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("purity-tracker");

        Self {
            tracker: TrackerConfig::default(),
            timezone: None,
            data_path: data_dir,
            gateway: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when absent.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.tracker.validate()?;
        config.time_zone()?;
        Ok(config)
    }

    /// Load from the default location, warning and using defaults when the
    /// file is unreadable or invalid.
    pub fn load_or_default() -> Self {
        Self::load_or_default_from(&Self::config_path())
    }

    pub fn load_or_default_from(path: &std::path::Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            tracing::warn!("Ignoring config at {}: {e}", path.display());
            Self::default()
        })
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("purity-tracker")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    /// Path of the persisted transparency stats.
    pub fn transparency_path(&self) -> PathBuf {
        self.data_path.join("transparency.json")
    }

    /// Parse the configured time zone.
    pub fn time_zone(&self) -> Result<Option<Tz>, ConfigError> {
        self.timezone.as_deref().map(parse_time_zone).transpose()
    }
}

/// Parse an IANA time zone name such as `America/New_York`.
pub fn parse_time_zone(name: &str) -> Result<Tz, ConfigError> {
    name.parse::<Tz>()
        .map_err(|_| ConfigError::InvalidTimeZone(name.to_string()))
}

/// Thresholds governing the keystroke tracker.
///
/// Defaults are the production values; they are rarely changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Flight-time samples kept for jitter
    pub max_flight_samples: usize,
    /// Dwell-time samples kept
    pub max_dwell_samples: usize,
    /// Accepted flight time range in milliseconds (inclusive)
    pub flight_bounds_ms: (f64, f64),
    /// Accepted dwell time range in milliseconds (inclusive)
    pub dwell_bounds_ms: (f64, f64),
    /// Characters (human + alien) needed before purity is reported
    pub min_chars_for_score: usize,
    /// Flight samples needed before jitter is reported
    pub min_jitter_samples: usize,
    /// Flight samples needed before a jitter profile is produced
    pub min_profile_samples: usize,
    /// Mutation growth tolerated as autocorrect/autocomplete
    pub autocorrect_tolerance: usize,
    /// Keystrokes per fatigue window
    pub fatigue_window_keystrokes: u64,
    /// Fatigue windows kept
    pub fatigue_window_count: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_flight_samples: 100,
            max_dwell_samples: 100,
            flight_bounds_ms: (20.0, 2000.0),
            dwell_bounds_ms: (10.0, 500.0),
            min_chars_for_score: 20,
            min_jitter_samples: 5,
            min_profile_samples: 10,
            autocorrect_tolerance: 15,
            fatigue_window_keystrokes: 25,
            fatigue_window_count: 4,
        }
    }
}

impl TrackerConfig {
    /// Reject configurations the tracker cannot operate under.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_flight_samples == 0 || self.max_dwell_samples == 0 {
            return Err(ConfigError::Invalid(
                "sample capacities must be positive".to_string(),
            ));
        }
        if self.fatigue_window_keystrokes == 0 || self.fatigue_window_count == 0 {
            return Err(ConfigError::Invalid(
                "fatigue windows must be positive".to_string(),
            ));
        }
        for (name, (lo, hi)) in [
            ("flight_bounds_ms", self.flight_bounds_ms),
            ("dwell_bounds_ms", self.dwell_bounds_ms),
        ] {
            if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be an ordered finite range, got ({lo}, {hi})"
                )));
            }
        }
        Ok(())
    }

    pub fn flight_in_bounds(&self, ms: f64) -> bool {
        (self.flight_bounds_ms.0..=self.flight_bounds_ms.1).contains(&ms)
    }

    pub fn dwell_in_bounds(&self, ms: f64) -> bool {
        (self.dwell_bounds_ms.0..=self.dwell_bounds_ms.1).contains(&ms)
    }
}

/// Where submissions are posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Full URL of the vote submission endpoint
    pub endpoint: String,
    /// Bearer token; read from `PURITY_GATEWAY_TOKEN` when absent
    #[serde(default)]
    pub token: Option<String>,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unknown time zone: {0}")]
    InvalidTimeZone(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tracker.max_flight_samples, 100);
        assert_eq!(config.tracker.flight_bounds_ms, (20.0, 2000.0));
        assert_eq!(config.tracker.dwell_bounds_ms, (10.0, 500.0));
        assert_eq!(config.tracker.min_chars_for_score, 20);
        assert!(config.timezone.is_none());
        assert!(config.tracker.validate().is_ok());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let tracker = TrackerConfig::default();
        assert!(tracker.flight_in_bounds(20.0));
        assert!(tracker.flight_in_bounds(2000.0));
        assert!(!tracker.flight_in_bounds(5.0));
        assert!(!tracker.flight_in_bounds(3000.0));
        assert!(tracker.dwell_in_bounds(10.0));
        assert!(!tracker.dwell_in_bounds(500.5));
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let tracker = TrackerConfig {
            dwell_bounds_ms: (500.0, 10.0),
            ..TrackerConfig::default()
        };
        assert!(matches!(tracker.validate(), Err(ConfigError::Invalid(_))));

        let tracker = TrackerConfig {
            fatigue_window_keystrokes: 0,
            ..TrackerConfig::default()
        };
        assert!(tracker.validate().is_err());
    }

    #[test]
    fn test_partial_tracker_section_uses_defaults() {
        let json = r#"{"tracker":{"min_chars_for_score":40},"data_path":"/tmp/x"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.tracker.min_chars_for_score, 40);
        assert_eq!(config.tracker.max_dwell_samples, 100);
        assert!(config.gateway.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            timezone: Some("Europe/Berlin".to_string()),
            data_path: dir.path().to_path_buf(),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.timezone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(loaded.time_zone().unwrap(), Some(chrono_tz::Europe::Berlin));
    }

    #[test]
    fn test_unknown_time_zone_is_rejected() {
        assert!(matches!(
            parse_time_zone("Mars/Olympus"),
            Err(ConfigError::InvalidTimeZone(_))
        ));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.tracker, TrackerConfig::default());
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config {
            timezone: Some("Mars/Olympus".to_string()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidTimeZone(_))
        ));

        let fallback = Config::load_or_default_from(&path);
        assert!(fallback.timezone.is_none());
        assert_eq!(fallback.tracker, TrackerConfig::default());
    }
}
