//! Configuration loading and typed config structures for the Takeoff simulation.
//!
//! The canonical configuration lives in `takeoff-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//! Every section is optional; missing keys fall back to the defaults below.

use std::path::Path;

use serde::Deserialize;
use takeoff_agents::{AgentError, DetectionConfig, LifecycleConfig, SecurityConfig};

use crate::outcome::OutcomeConfig;
use crate::phases::FrontierConfig;

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

    /// A value is outside its permitted range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Description of the offending value.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

impl From<AgentError> for ConfigError {
    fn from(source: AgentError) -> Self {
        Self::Invalid {
            reason: source.to_string(),
        }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `takeoff-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed).
    #[serde(default)]
    pub world: WorldConfig,

    /// Run boundaries and initial population.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Capability frontier growth.
    #[serde(default)]
    pub frontier: FrontierConfig,

    /// Population lifecycle parameters.
    #[serde(default)]
    pub population: LifecycleConfig,

    /// Security arms race parameters.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Detection and false-positive parameters.
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Outcome classifier thresholds.
    #[serde(default)]
    pub outcome: OutcomeConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load and validate configuration from a YAML file at the given path.
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

    /// Parse and validate configuration from a YAML string.
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

    /// Check every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.population.validate()?;
        self.security.validate()?;
        self.detection.validate()?;

        let s = &self.simulation;
        if s.max_ticks == 0 {
            return Err(invalid("simulation.max_ticks must be at least 1"));
        }
        if !(0.0..=1.0).contains(&s.outcome_confidence_threshold) {
            return Err(invalid("simulation.outcome_confidence_threshold must be within 0..=1"));
        }
        if s.initial_agents > self.population.max_population {
            return Err(invalid(
                "simulation.initial_agents exceeds population.max_population",
            ));
        }

        let f = &self.frontier;
        if !(f.initial_capability.is_finite() && f.initial_capability > 0.0) {
            return Err(invalid("frontier.initial_capability must be positive"));
        }
        if !(f.monthly_growth.is_finite() && f.monthly_growth >= 0.0) {
            return Err(invalid("frontier.monthly_growth must be non-negative"));
        }

        let o = &self.outcome;
        if !(o.misalignment_threshold > 0.0 && o.misalignment_threshold <= 1.0) {
            return Err(invalid("outcome.misalignment_threshold must be within (0, 1]"));
        }
        if o.utopia_control_min > o.utopia_control_max {
            return Err(invalid("outcome.utopia_control_min exceeds utopia_control_max"));
        }

        // Security and detection use the outcome misalignment boundary.
        let threshold = o.misalignment_threshold;
        for (name, value) in [
            ("security.misalignment_threshold", self.security.misalignment_threshold),
            ("detection.misalignment_threshold", self.detection.misalignment_threshold),
        ] {
            if (value - threshold).abs() > f64::EPSILON {
                return Err(ConfigError::Invalid {
                    reason: format!(
                        "{name} ({value}) differs from outcome.misalignment_threshold ({threshold})"
                    ),
                });
            }
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable run name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
        }
    }
}

/// Run boundaries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Stop after this many months.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Stop when a terminal verdict reaches this confidence.
    #[serde(default = "default_outcome_confidence_threshold")]
    pub outcome_confidence_threshold: f64,

    /// Agents created before the first tick.
    #[serde(default = "default_initial_agents")]
    pub initial_agents: u32,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            outcome_confidence_threshold: default_outcome_confidence_threshold(),
            initial_agents: default_initial_agents(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
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
// Default value functions
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    String::from("Takeoff")
}

const fn default_seed() -> u64 {
    42
}

const fn default_max_ticks() -> u64 {
    600
}

const fn default_outcome_confidence_threshold() -> f64 {
    0.75
}

const fn default_initial_agents() -> u32 {
    5
}

fn default_log_level() -> String {
    String::from("info")
}
