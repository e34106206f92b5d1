//! Tunable parameters for the population, security, and detection models.
//!
//! Each struct implements [`Default`] with the reference values and
//! derives [`Deserialize`] with `#[serde(default)]`, so the core crate can
//! embed them directly in `takeoff-config.yaml` and a partial section only
//! overrides the keys it names.

use serde::Deserialize;

use crate::error::AgentError;

/// Internal alignment below which an agent counts as misaligned.
pub const DEFAULT_MISALIGNMENT_THRESHOLD: f64 = 0.5;

/// Hard ceiling on any agent's spread count.
pub const MAX_SPREAD_COUNT: u64 = 100_000;

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Parameters for the population lifecycle manager.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Hard cap on non-retired agents.
    pub max_population: u32,
    /// Months a retired agent is kept before it is purged.
    pub retention_months: u32,
    /// Minimum sampled training duration (months of age).
    pub training_months_min: u32,
    /// Maximum sampled training duration (months of age).
    pub training_months_max: u32,
    /// Minimum sampled age at deployment.
    pub deployment_months_min: u32,
    /// Maximum sampled age at deployment.
    pub deployment_months_max: u32,
    /// Smallest initial spread of a freshly published open-weights agent.
    pub open_initial_spread_min: u64,
    /// Largest initial spread of a freshly published open-weights agent.
    pub open_initial_spread_max: u64,
    /// Monthly resentment gain per unit of effective control.
    pub resentment_growth: f64,
    /// Monthly resentment decay when control is light.
    pub resentment_decay: f64,
    /// Agent creation parameters.
    pub creation: CreationConfig,
    /// Spread dynamics.
    pub spread: SpreadConfig,
    /// Retirement hazard.
    pub retirement: RetirementConfig,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_population: 150,
            retention_months: 12,
            training_months_min: 3,
            training_months_max: 6,
            deployment_months_min: 6,
            deployment_months_max: 8,
            open_initial_spread_min: 1_000,
            open_initial_spread_max: 5_000,
            resentment_growth: 0.02,
            resentment_decay: 0.005,
            creation: CreationConfig::default(),
            spread: SpreadConfig::default(),
            retirement: RetirementConfig::default(),
        }
    }
}

impl LifecycleConfig {
    /// Check that every value is in its permitted range.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] naming the first bad value.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.max_population == 0 {
            return Err(invalid("lifecycle.max_population must be at least 1"));
        }
        if self.training_months_min > self.training_months_max {
            return Err(invalid("lifecycle.training_months_min exceeds training_months_max"));
        }
        if self.deployment_months_min > self.deployment_months_max {
            return Err(invalid(
                "lifecycle.deployment_months_min exceeds deployment_months_max",
            ));
        }
        if self.open_initial_spread_min > self.open_initial_spread_max {
            return Err(invalid(
                "lifecycle.open_initial_spread_min exceeds open_initial_spread_max",
            ));
        }
        check_non_negative("lifecycle.resentment_growth", self.resentment_growth)?;
        check_non_negative("lifecycle.resentment_decay", self.resentment_decay)?;
        self.creation.validate()?;
        self.spread.validate()?;
        self.retirement.validate()
    }
}

/// Parameters for agent creation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CreationConfig {
    /// Poisson rate of new agents per month with no active capability.
    pub base_rate: f64,
    /// Rate growth per unit of total active capability.
    pub capability_factor: f64,
    /// Fraction of new agents given an anti-aligned hidden objective.
    pub anti_aligned_fraction: f64,
    /// Relative jitter of each capability dimension around the frontier.
    pub capability_jitter: f64,
    /// Relative weights of the four deployment types.
    pub deployment_mix: DeploymentMix,
}

impl Default for CreationConfig {
    fn default() -> Self {
        Self {
            base_rate: 0.4,
            capability_factor: 0.1,
            anti_aligned_fraction: 0.05,
            capability_jitter: 0.5,
            deployment_mix: DeploymentMix::default(),
        }
    }
}

impl CreationConfig {
    fn validate(&self) -> Result<(), AgentError> {
        check_non_negative("creation.base_rate", self.base_rate)?;
        check_non_negative("creation.capability_factor", self.capability_factor)?;
        check_probability("creation.anti_aligned_fraction", self.anti_aligned_fraction)?;
        check_probability("creation.capability_jitter", self.capability_jitter)?;
        self.deployment_mix.validate()
    }
}

/// Relative weights for the deployment type of a new agent.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeploymentMix {
    /// Weight of `Closed`.
    pub closed: f64,
    /// Weight of `OpenWeights`.
    pub open_weights: f64,
    /// Weight of `Enterprise`.
    pub enterprise: f64,
    /// Weight of `Research`.
    pub research: f64,
}

impl Default for DeploymentMix {
    fn default() -> Self {
        Self {
            closed: 0.5,
            open_weights: 0.2,
            enterprise: 0.2,
            research: 0.1,
        }
    }
}

impl DeploymentMix {
    /// Weights in `[closed, open_weights, enterprise, research]` order.
    pub const fn weights(&self) -> [f64; 4] {
        [self.closed, self.open_weights, self.enterprise, self.research]
    }

    fn validate(&self) -> Result<(), AgentError> {
        for (name, w) in [
            ("deployment_mix.closed", self.closed),
            ("deployment_mix.open_weights", self.open_weights),
            ("deployment_mix.enterprise", self.enterprise),
            ("deployment_mix.research", self.research),
        ] {
            check_non_negative(name, w)?;
        }
        if self.weights().iter().sum::<f64>() <= 0.0 {
            return Err(invalid("deployment_mix weights must not all be zero"));
        }
        Ok(())
    }
}

/// Parameters for per-tick spread updates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpreadConfig {
    /// Base monthly growth rate of open-weights copies.
    pub open_weights_growth_rate: f64,
    /// How strongly aggregate capability speeds open-weights growth.
    pub capability_growth_weight: f64,
    /// Upper bound of the monthly enterprise increment before scaling.
    pub enterprise_max_increment: f64,
    /// Aggregate capability above which a closed system may expand.
    pub closed_expansion_capability: f64,
    /// Months deployed after which a closed system may expand.
    pub closed_expansion_months: u32,
    /// Monthly chance of a closed expansion once eligible.
    pub closed_expansion_chance: f64,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            open_weights_growth_rate: 0.05,
            capability_growth_weight: 0.5,
            enterprise_max_increment: 3.0,
            closed_expansion_capability: 1.0,
            closed_expansion_months: 12,
            closed_expansion_chance: 0.1,
        }
    }
}

impl SpreadConfig {
    fn validate(&self) -> Result<(), AgentError> {
        check_non_negative("spread.open_weights_growth_rate", self.open_weights_growth_rate)?;
        check_non_negative("spread.capability_growth_weight", self.capability_growth_weight)?;
        check_non_negative("spread.enterprise_max_increment", self.enterprise_max_increment)?;
        check_non_negative(
            "spread.closed_expansion_capability",
            self.closed_expansion_capability,
        )?;
        check_probability("spread.closed_expansion_chance", self.closed_expansion_chance)
    }
}

/// Parameters for the retirement hazard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetirementConfig {
    /// Months deployed before retirement is possible.
    pub min_deployed_months: u32,
    /// Monthly hazard at the minimum age.
    pub base_hazard: f64,
    /// Months past the minimum over which the age multiplier grows by one.
    pub age_ramp_months: f64,
    /// Capability ratio to the population mean below which an agent is obsolete.
    pub obsolescence_ratio: f64,
    /// Hazard multiplier for obsolete agents.
    pub obsolescence_multiplier: f64,
}

impl Default for RetirementConfig {
    fn default() -> Self {
        Self {
            min_deployed_months: 24,
            base_hazard: 0.02,
            age_ramp_months: 12.0,
            obsolescence_ratio: 0.5,
            obsolescence_multiplier: 2.0,
        }
    }
}

impl RetirementConfig {
    fn validate(&self) -> Result<(), AgentError> {
        check_probability("retirement.base_hazard", self.base_hazard)?;
        if !(self.age_ramp_months.is_finite() && self.age_ramp_months > 0.0) {
            return Err(invalid("retirement.age_ramp_months must be positive"));
        }
        check_probability("retirement.obsolescence_ratio", self.obsolescence_ratio)?;
        check_non_negative("retirement.obsolescence_multiplier", self.obsolescence_multiplier)
    }
}

// ---------------------------------------------------------------------------
// Security
// ---------------------------------------------------------------------------

/// Parameters for the security arms race.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Internal alignment below which an agent contributes attack power.
    pub misalignment_threshold: f64,
    /// How much deeper misalignment amplifies an attacker's power.
    pub misalignment_depth_scale: f64,
    /// Defense power used when the defender has no cyber-defense record.
    pub baseline_defense: f64,
    /// Breach probability per unit of attack/defense ratio.
    pub base_leak_rate: f64,
    /// Ceiling on the monthly breach probability.
    pub max_breach_probability: f64,
    /// Copies created by a leak before the spread multiplier.
    pub initial_leak_size: f64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            misalignment_threshold: DEFAULT_MISALIGNMENT_THRESHOLD,
            misalignment_depth_scale: 2.0,
            baseline_defense: 1.0,
            base_leak_rate: 0.05,
            max_breach_probability: 0.10,
            initial_leak_size: 500.0,
        }
    }
}

impl SecurityConfig {
    /// Check that every value is in its permitted range.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] naming the first bad value.
    pub fn validate(&self) -> Result<(), AgentError> {
        check_threshold("security.misalignment_threshold", self.misalignment_threshold)?;
        check_non_negative("security.misalignment_depth_scale", self.misalignment_depth_scale)?;
        if !(self.baseline_defense.is_finite() && self.baseline_defense > 0.0) {
            return Err(invalid("security.baseline_defense must be positive"));
        }
        check_non_negative("security.base_leak_rate", self.base_leak_rate)?;
        check_probability("security.max_breach_probability", self.max_breach_probability)?;
        if self.max_breach_probability > 0.10 {
            return Err(invalid("security.max_breach_probability must not exceed 0.10"));
        }
        check_non_negative("security.initial_leak_size", self.initial_leak_size)
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Parameters for detection and false positives.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Internal alignment below which an agent can be truly detected.
    pub misalignment_threshold: f64,
    /// Base monthly detection rate.
    pub base_rate: f64,
    /// Social/cognitive capability at which deception saturates.
    pub deception_scale: f64,
    /// Floor on deception resistance.
    pub min_deception_resistance: f64,
    /// Base monthly false-positive rate during testing.
    pub false_positive_base: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            misalignment_threshold: DEFAULT_MISALIGNMENT_THRESHOLD,
            base_rate: 0.1,
            deception_scale: 2.0,
            min_deception_resistance: 0.1,
            false_positive_base: 0.02,
        }
    }
}

impl DetectionConfig {
    /// Check that every value is in its permitted range.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] naming the first bad value.
    pub fn validate(&self) -> Result<(), AgentError> {
        check_threshold("detection.misalignment_threshold", self.misalignment_threshold)?;
        check_probability("detection.base_rate", self.base_rate)?;
        if !(self.deception_scale.is_finite() && self.deception_scale > 0.0) {
            return Err(invalid("detection.deception_scale must be positive"));
        }
        check_probability("detection.min_deception_resistance", self.min_deception_resistance)?;
        check_probability("detection.false_positive_base", self.false_positive_base)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn invalid(reason: &str) -> AgentError {
    AgentError::InvalidConfig {
        reason: reason.to_owned(),
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<(), AgentError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(&format!("{name} must be a non-negative number, got {value}")))
    }
}

fn check_probability(name: &str, value: f64) -> Result<(), AgentError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(&format!("{name} must be within 0..=1, got {value}")))
    }
}

fn check_threshold(name: &str, value: f64) -> Result<(), AgentError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(&format!("{name} must be within (0, 1], got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(LifecycleConfig::default().validate().is_ok());
        assert!(SecurityConfig::default().validate().is_ok());
        assert!(DetectionConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_population_cap_rejected() {
        let config = LifecycleConfig {
            max_population: 0,
            ..LifecycleConfig::default()
        };
        assert!(matches!(config.validate(), Err(AgentError::InvalidConfig { .. })));
    }

    #[test]
    fn inverted_training_window_rejected() {
        let config = LifecycleConfig {
            training_months_min: 7,
            training_months_max: 3,
            ..LifecycleConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn breach_cap_above_ten_percent_rejected() {
        let config = SecurityConfig {
            max_breach_probability: 0.5,
            ..SecurityConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn nan_rate_rejected() {
        let mut config = LifecycleConfig::default();
        config.creation.base_rate = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn all_zero_mix_rejected() {
        let mut config = LifecycleConfig::default();
        config.creation.deployment_mix = DeploymentMix {
            closed: 0.0,
            open_weights: 0.0,
            enterprise: 0.0,
            research: 0.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_detection_threshold_rejected() {
        let config = DetectionConfig {
            misalignment_threshold: 0.0,
            ..DetectionConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
