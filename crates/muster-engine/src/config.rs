//! Configuration for the engine host.
//!
//! The configuration lives in `muster-config.yaml` (or wherever
//! `MUSTER_CONFIG` points). Every section is optional; missing fields fall
//! back to the documented defaults.

use std::path::Path;

use muster_groups::PartyPolicy;
use serde::Deserialize;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "MUSTER_CONFIG";

/// Environment variable overriding `logging.level`.
pub const LOG_LEVEL_ENV: &str = "MUSTER_LOG_LEVEL";

/// Config file used when `MUSTER_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "muster-config.yaml";

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

    /// A policy value is out of range.
    #[error("invalid party policy: {source}")]
    Policy {
        /// The underlying validation error.
        #[from]
        source: muster_groups::ConfigError,
    },

    /// The sweep section is out of range.
    #[error("invalid sweep config: {reason}")]
    Sweep {
        /// What was wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level host configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MusterConfig {
    /// Party capacity and invitation timeout.
    #[serde(default)]
    pub party: PartyPolicy,

    /// How often the party sweep runs.
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Log level and output format.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Actors and parties present at startup.
    #[serde(default)]
    pub roster: RosterConfig,
}

impl MusterConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `MUSTER_LOG_LEVEL` overrides `logging.level`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, and a
    /// validation error if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// Unlike [`from_file`](Self::from_file), this ignores the environment.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the party policy and sweep timing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.party.validate()?;
        if self.sweep.interval_ms == 0 {
            return Err(ConfigError::Sweep {
                reason: "interval_ms must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Sweep scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SweepConfig {
    /// Milliseconds between sweeps.
    #[serde(default = "default_sweep_interval_ms")]
    pub interval_ms: u64,

    /// Stop after this many sweeps. 0 runs until interrupted.
    #[serde(default)]
    pub max_sweeps: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_sweep_interval_ms(),
            max_sweeps: 0,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Apply `MUSTER_LOG_LEVEL` if set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(LOG_LEVEL_ENV) {
            self.level = val;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Who exists when the host starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RosterConfig {
    /// Actor names to spawn.
    #[serde(default)]
    pub actors: Vec<String>,

    /// Parties to found among those actors.
    #[serde(default)]
    pub parties: Vec<SeedParty>,
}

/// A party founded at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedParty {
    /// Owner, by actor name.
    pub owner: String,

    /// Display name. The generated default is kept when absent.
    #[serde(default)]
    pub name: Option<String>,

    /// Further members, by actor name.
    #[serde(default)]
    pub members: Vec<String>,

    /// Actors invited at startup, by name.
    #[serde(default)]
    pub invited: Vec<String>,
}

const fn default_sweep_interval_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_owned()
}
