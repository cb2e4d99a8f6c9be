//! Configuration loading and typed config structures for Drillwatch.
//!
//! The canonical configuration lives in `drillwatch-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads and validates the file.
//!
//! The `signals` section holds the host's global settings. Those may be
//! partially missing (a fresh save has not initialised them yet), so the
//! compositor never reads them directly: it receives a resolved
//! [`GlobalConfig`] snapshot in which every gap has been filled with a
//! hardcoded fallback.

use std::path::Path;

use drillwatch_types::SignalId;
use serde::Deserialize;

/// Depletion signal used when no global default has been configured.
pub const FALLBACK_DEPLETION_SIGNAL: &str = "signal-D";

/// Rate indicator signal used when the setting is empty or absent.
pub const FALLBACK_RATE_INDICATOR_SIGNAL: &str = "signal-R";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but holds an unusable value.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `drillwatch-config.yaml`. All fields have
/// defaults, so a file only needs the keys it wants to change.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ControllerConfig {
    /// Reconciliation cadence and emitter prototype.
    #[serde(default)]
    pub controller: ReconcileConfig,

    /// Global signal settings.
    #[serde(default)]
    pub signals: GlobalSettings,

    /// Demo engine pacing.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ControllerConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot reject on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.controller.reconcile_interval_ticks == 0 {
            return Err(ConfigError::Invalid {
                reason: "controller.reconcile_interval_ticks must be at least 1".to_owned(),
            });
        }
        if self.controller.emitter_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "controller.emitter_name must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

/// Reconciliation loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReconcileConfig {
    /// Host ticks between two reconciliation passes.
    #[serde(default = "default_reconcile_interval_ticks")]
    pub reconcile_interval_ticks: u64,

    /// Prototype name of the emitter entity the controller places.
    #[serde(default = "default_emitter_name")]
    pub emitter_name: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            reconcile_interval_ticks: default_reconcile_interval_ticks(),
            emitter_name: default_emitter_name(),
        }
    }
}

/// Global settings as stored by the host. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GlobalSettings {
    /// Virtual signal emitted when a depleted device has no override.
    #[serde(default)]
    pub default_depletion_signal: Option<String>,

    /// Hide the counter signal of devices with nothing left to extract.
    #[serde(default)]
    pub suppress_counter_when_depleted: bool,

    /// Virtual signal appended when any effective-yield output is a rate.
    #[serde(default)]
    pub rate_indicator_signal: Option<String>,
}

impl GlobalSettings {
    /// Resolve the settings into a snapshot with every gap filled.
    pub fn snapshot(&self) -> GlobalConfig {
        GlobalConfig {
            depletion_signal: SignalId::virtual_signal(non_empty_or(
                self.default_depletion_signal.as_deref(),
                FALLBACK_DEPLETION_SIGNAL,
            )),
            suppress_counter_when_depleted: self.suppress_counter_when_depleted,
            rate_indicator_signal: SignalId::virtual_signal(non_empty_or(
                self.rate_indicator_signal.as_deref(),
                FALLBACK_RATE_INDICATOR_SIGNAL,
            )),
        }
    }
}

fn non_empty_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => fallback,
    }
}

/// Resolved global settings passed explicitly into every recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalConfig {
    /// Default depletion signal.
    pub depletion_signal: SignalId,
    /// Hide the counter of depleted devices.
    pub suppress_counter_when_depleted: bool,
    /// Trailing indicator for rate outputs.
    pub rate_indicator_signal: SignalId,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalSettings::default().snapshot()
    }
}

/// Demo engine pacing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Real-time milliseconds per host tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Ticks to run before the engine stops.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Random seed for simulated extraction.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: default_max_ticks(),
            seed: default_seed(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_reconcile_interval_ticks() -> u64 {
    60
}

fn default_emitter_name() -> String {
    "drillwatch-signal-emitter".to_owned()
}

const fn default_tick_interval_ms() -> u64 {
    16
}

const fn default_max_ticks() -> u64 {
    600
}

const fn default_seed() -> u64 {
    42
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.controller.reconcile_interval_ticks, 60);
        assert_eq!(config.engine.seed, 42);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
controller:
  reconcile_interval_ticks: 30
  emitter_name: "hidden-combinator"

signals:
  default_depletion_signal: "signal-N"
  suppress_counter_when_depleted: true
  rate_indicator_signal: "signal-Z"

engine:
  tick_interval_ms: 5
  max_ticks: 120
  seed: 9

logging:
  level: "debug"
  json: true
"#;
        let config = ControllerConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.controller.reconcile_interval_ticks, 30);
        assert_eq!(config.controller.emitter_name, "hidden-combinator");
        assert!(config.signals.suppress_counter_when_depleted);
        assert_eq!(config.engine.max_ticks, 120);
        assert!(config.logging.json);

        let snapshot = config.signals.snapshot();
        assert_eq!(snapshot.depletion_signal, SignalId::virtual_signal("signal-N"));
        assert_eq!(snapshot.rate_indicator_signal, SignalId::virtual_signal("signal-Z"));
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "engine:\n  seed: 7\n";
        let config = ControllerConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.engine.seed, 7);
        assert_eq!(config.controller.reconcile_interval_ticks, 60);
        assert_eq!(config.signals, GlobalSettings::default());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let yaml = "controller:\n  reconcile_interval_ticks: 0\n";
        assert!(matches!(
            ControllerConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn missing_settings_fall_back() {
        let snapshot = GlobalSettings::default().snapshot();
        assert_eq!(
            snapshot.depletion_signal,
            SignalId::virtual_signal(FALLBACK_DEPLETION_SIGNAL)
        );
        assert_eq!(snapshot.rate_indicator_signal.name, "signal-R");
        assert!(!snapshot.suppress_counter_when_depleted);
    }

    #[test]
    fn empty_rate_indicator_falls_back() {
        let settings = GlobalSettings {
            rate_indicator_signal: Some("   ".to_owned()),
            ..GlobalSettings::default()
        };
        assert_eq!(settings.snapshot().rate_indicator_signal.name, "signal-R");
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("drillwatch-config.yaml");
        if path.exists() {
            let config = ControllerConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
