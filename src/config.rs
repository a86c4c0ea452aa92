//! Engine configuration - prediction and scheduling tunables as TOML values
//!
//! Every threshold the engine uses is a field in this module. Each struct
//! implements `Default` with values matching the original constants, so
//! behavior is unchanged when no config file is present.
//!
//! ## Loading Order
//!
//! 1. `$OPSENTRY_CONFIG` environment variable (path to TOML file)
//! 2. `./opsentry.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Unlike a global-singleton config, an `EngineConfig` is passed into the
//! predictor and scheduler constructors so tests can build isolated
//! instances with their own tunables.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for an engine deployment.
///
/// Load with `EngineConfig::load()` which searches:
/// 1. `$OPSENTRY_CONFIG` env var
/// 2. `./opsentry.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Failure prediction tunables
    #[serde(default)]
    pub prediction: PredictionConfig,

    /// Technician scheduling tunables
    #[serde(default)]
    pub scheduling: SchedulingConfig,
}

impl EngineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$OPSENTRY_CONFIG` environment variable
    /// 2. `./opsentry.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("OPSENTRY_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded engine config from OPSENTRY_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from OPSENTRY_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "OPSENTRY_CONFIG points to non-existent file, falling back");
            }
        }

        let local = Path::new("opsentry.toml");
        if local.exists() {
            match Self::load_from_file(local) {
                Ok(config) => {
                    info!(path = %local.display(), "Loaded engine config from working directory");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./opsentry.toml, using defaults");
                }
            }
        }

        info!("No config file found, using built-in defaults");
        Self::default()
    }

    /// Load and validate a config from a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML, for writing an editable template.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("failed to serialize engine config")
    }

    /// Reject configurations that would make the engine misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prediction.history_cap == 0 {
            return Err(ConfigError::Invalid(
                "prediction.history_cap must be at least 1".into(),
            ));
        }
        if self.prediction.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "prediction.cache_ttl_secs must be nonzero".into(),
            ));
        }
        if self.prediction.default_critical_runtime_hours <= 0.0 {
            return Err(ConfigError::Invalid(
                "prediction.default_critical_runtime_hours must be positive".into(),
            ));
        }
        if self.prediction.default_base_timeframe_days <= 0.0 {
            return Err(ConfigError::Invalid(
                "prediction.default_base_timeframe_days must be positive".into(),
            ));
        }
        for (kind, hours) in &self.prediction.critical_runtime_hours {
            if *hours <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "prediction.critical_runtime_hours.{kind} must be positive"
                )));
            }
        }
        if self.scheduling.workday_minutes == 0 {
            return Err(ConfigError::Invalid(
                "scheduling.workday_minutes must be nonzero".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.scheduling.availability_cutoff) {
            return Err(ConfigError::Invalid(
                "scheduling.availability_cutoff must be within 0-100".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Prediction Tunables
// ============================================================================

/// Failure predictor tunables.
///
/// The runtime-threshold table is per-equipment-type; types without an
/// entry fall back to `default_critical_runtime_hours` (configurable, not
/// hard-coded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Most-recent-N readings retained per equipment unit
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,

    /// Prediction cache lifetime per equipment id (seconds)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Critical runtime hours per equipment type
    #[serde(default = "default_runtime_table")]
    pub critical_runtime_hours: HashMap<String, f64>,

    /// Fallback critical runtime for types missing from the table
    #[serde(default = "default_runtime_fallback")]
    pub default_critical_runtime_hours: f64,

    /// Base failure timeframe (days) per equipment type
    #[serde(default = "default_timeframe_table")]
    pub base_timeframe_days: HashMap<String, f64>,

    /// Fallback base timeframe for types missing from the table
    #[serde(default = "default_timeframe_fallback")]
    pub default_base_timeframe_days: f64,
}

fn default_history_cap() -> usize {
    100
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_runtime_table() -> HashMap<String, f64> {
    HashMap::from([("generator".to_string(), 3000.0)])
}

fn default_runtime_fallback() -> f64 {
    3000.0
}

fn default_timeframe_table() -> HashMap<String, f64> {
    HashMap::from([("generator".to_string(), 30.0)])
}

fn default_timeframe_fallback() -> f64 {
    45.0
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            history_cap: default_history_cap(),
            cache_ttl_secs: default_cache_ttl(),
            critical_runtime_hours: default_runtime_table(),
            default_critical_runtime_hours: default_runtime_fallback(),
            base_timeframe_days: default_timeframe_table(),
            default_base_timeframe_days: default_timeframe_fallback(),
        }
    }
}

impl PredictionConfig {
    /// Critical runtime threshold for an equipment type, with fallback.
    pub fn runtime_threshold(&self, equipment_type: &str) -> f64 {
        self.critical_runtime_hours
            .get(equipment_type)
            .copied()
            .unwrap_or(self.default_critical_runtime_hours)
    }

    /// Base failure timeframe for an equipment type, with fallback.
    pub fn base_timeframe(&self, equipment_type: &str) -> f64 {
        self.base_timeframe_days
            .get(equipment_type)
            .copied()
            .unwrap_or(self.default_base_timeframe_days)
    }
}

// ============================================================================
// Scheduling Tunables
// ============================================================================

/// Technician assignment tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Minutes in a technician workday; workload percentages are relative
    /// to this
    #[serde(default = "default_workday_minutes")]
    pub workday_minutes: u32,

    /// Workload percentage above which a technician stops being offered
    /// new assignments
    #[serde(default = "default_availability_cutoff")]
    pub availability_cutoff: f64,
}

fn default_workday_minutes() -> u32 {
    480
}

fn default_availability_cutoff() -> f64 {
    80.0
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            workday_minutes: default_workday_minutes(),
            availability_cutoff: default_availability_cutoff(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_original_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.prediction.history_cap, 100);
        assert_eq!(config.prediction.cache_ttl_secs, 3600);
        assert_eq!(config.prediction.runtime_threshold("generator"), 3000.0);
        assert_eq!(config.prediction.base_timeframe("generator"), 30.0);
        assert_eq!(config.prediction.base_timeframe("pump"), 45.0);
        assert_eq!(config.scheduling.workday_minutes, 480);
        assert_eq!(config.scheduling.availability_cutoff, 80.0);
    }

    #[test]
    fn test_unknown_type_falls_back_to_configured_default() {
        let mut config = EngineConfig::default();
        config.prediction.default_critical_runtime_hours = 5000.0;
        assert_eq!(config.prediction.runtime_threshold("chiller"), 5000.0);
        assert_eq!(config.prediction.runtime_threshold("generator"), 3000.0);
    }

    #[test]
    fn test_load_from_file_partial_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[prediction]
history_cap = 50

[prediction.critical_runtime_hours]
generator = 3000.0
pump = 8000.0
"#
        )
        .unwrap();

        let config = EngineConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.prediction.history_cap, 50);
        assert_eq!(config.prediction.runtime_threshold("pump"), 8000.0);
        // Untouched sections keep defaults
        assert_eq!(config.scheduling.workday_minutes, 480);
    }

    #[test]
    fn test_validate_rejects_zero_history_cap() {
        let mut config = EngineConfig::default();
        config.prediction.history_cap = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_cutoff() {
        let mut config = EngineConfig::default();
        config.scheduling.availability_cutoff = 120.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::default();
        let raw = config.to_toml().unwrap();
        let parsed: EngineConfig = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.prediction.history_cap, config.prediction.history_cap);
        assert_eq!(
            parsed.scheduling.availability_cutoff,
            config.scheduling.availability_cutoff
        );
    }
}
