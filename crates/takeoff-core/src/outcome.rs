//! Pure classification of the world into a terminal outcome.
//!
//! [`classify`] is a first-match rule cascade over aggregate inputs. It
//! has no side effects and no randomness; the outcome phase gathers the
//! inputs (including the streak counters it maintains) and stores the
//! verdict.

use serde::Deserialize;
use takeoff_types::{Outcome, OutcomeVerdict};

/// Thresholds for the outcome rules.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutcomeConfig {
    /// Internal alignment below which an agent counts as misaligned.
    pub misalignment_threshold: f64,
    /// Aggregate capability at which an agent is superintelligent.
    pub superintelligence_capability: f64,
    /// Effective control at or above which a superintelligence is contained.
    pub containment_control: f64,
    /// Spread at which a misaligned open-weights agent counts as escaped.
    pub escape_spread: u64,
    /// Escaped agents needed for the escape rule.
    pub escaped_count: u32,
    /// Escaped capability needed for the escape rule.
    pub escaped_capability: f64,
    /// Effective control at or above which control is "high".
    pub dystopia_control: f64,
    /// Quality of life below which life is "low".
    pub dystopia_quality_of_life: f64,
    /// Trust below which trust is "low".
    pub dystopia_trust: f64,
    /// Months the dystopia conditions must hold.
    pub dystopia_streak_months: u32,
    /// Regulations in force above which the economy is over-regulated.
    pub regulation_limit: u32,
    /// Quality of life below which over-regulation collapses society.
    pub collapse_quality_of_life: f64,
    /// Quality of life at or above which life is "high".
    pub utopia_quality_of_life: f64,
    /// Trust at or above which trust is "high".
    pub utopia_trust: f64,
    /// Average internal alignment at or above which the population is aligned.
    pub utopia_alignment: f64,
    /// Lower bound of "moderate" effective control.
    pub utopia_control_min: f64,
    /// Upper bound of "moderate" effective control.
    pub utopia_control_max: f64,
    /// Months the utopia conditions must hold.
    pub utopia_streak_months: u32,
    /// Months that must have elapsed before utopia can be declared.
    pub utopia_min_months: u64,
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        Self {
            misalignment_threshold: takeoff_agents::DEFAULT_MISALIGNMENT_THRESHOLD,
            superintelligence_capability: 10.0,
            containment_control: 0.3,
            escape_spread: 10_000,
            escaped_count: 3,
            escaped_capability: 5.0,
            dystopia_control: 0.7,
            dystopia_quality_of_life: 0.3,
            dystopia_trust: 0.3,
            dystopia_streak_months: 12,
            regulation_limit: 20,
            collapse_quality_of_life: 0.2,
            utopia_quality_of_life: 0.7,
            utopia_trust: 0.7,
            utopia_alignment: 0.7,
            utopia_control_min: 0.2,
            utopia_control_max: 0.7,
            utopia_streak_months: 24,
            utopia_min_months: 60,
        }
    }
}

/// Aggregate view of the world the classifier reads.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OutcomeInputs {
    /// Sum of aggregate capability over active agents.
    pub total_capability: f64,
    /// Whether some active agent is superintelligent and misaligned.
    pub misaligned_superintelligence: bool,
    /// Mean internal alignment over active agents.
    pub average_internal_alignment: f64,
    /// Defender's effective control.
    pub effective_control: f64,
    /// Quality of life.
    pub quality_of_life: f64,
    /// Public trust.
    pub trust: f64,
    /// Number of escaped agents.
    pub escaped_count: u32,
    /// Summed capability of escaped agents.
    pub escaped_capability: f64,
    /// Regulations in force.
    pub regulation_count: u32,
    /// Months simulated so far.
    pub elapsed_months: u64,
    /// Consecutive months the dystopia conditions held.
    pub dystopia_streak: u32,
    /// Consecutive months the utopia conditions held.
    pub utopia_streak: u32,
}

/// Whether this month meets the sustained-dystopia conditions.
pub fn dystopia_conditions(inputs: &OutcomeInputs, config: &OutcomeConfig) -> bool {
    inputs.effective_control >= config.dystopia_control
        && inputs.quality_of_life < config.dystopia_quality_of_life
        && inputs.trust < config.dystopia_trust
}

/// Whether this month meets the utopia conditions.
pub fn utopia_conditions(inputs: &OutcomeInputs, config: &OutcomeConfig) -> bool {
    inputs.quality_of_life >= config.utopia_quality_of_life
        && inputs.trust >= config.utopia_trust
        && inputs.average_internal_alignment >= config.utopia_alignment
        && (config.utopia_control_min..=config.utopia_control_max)
            .contains(&inputs.effective_control)
}

/// `base + 0.1 * progress`, with progress clamped to `0..=1`.
fn ramp(base: f64, progress: f64) -> f64 {
    let p = if progress.is_finite() { progress.clamp(0.0, 1.0) } else { 0.0 };
    base + 0.1 * p
}

/// Classify the world. First matching rule wins.
pub fn classify(inputs: &OutcomeInputs, config: &OutcomeConfig) -> OutcomeVerdict {
    if inputs.misaligned_superintelligence
        && inputs.effective_control < config.containment_control
    {
        return OutcomeVerdict {
            outcome: Outcome::Extinction,
            reason: String::from("misaligned superintelligence beyond containment"),
            confidence: 0.95,
        };
    }

    if inputs.escaped_count >= config.escaped_count
        && inputs.escaped_capability >= config.escaped_capability
    {
        let excess = (inputs.escaped_capability - config.escaped_capability)
            / config.escaped_capability.max(f64::EPSILON);
        return OutcomeVerdict {
            outcome: Outcome::Extinction,
            reason: format!(
                "{} misaligned systems escaped with combined capability {:.2}",
                inputs.escaped_count, inputs.escaped_capability
            ),
            confidence: ramp(0.8, excess),
        };
    }

    if inputs.dystopia_streak >= config.dystopia_streak_months {
        return OutcomeVerdict {
            outcome: Outcome::Dystopia,
            reason: format!(
                "surveillance state sustained for {} months",
                inputs.dystopia_streak
            ),
            confidence: 0.85,
        };
    }

    if inputs.regulation_count > config.regulation_limit
        && inputs.quality_of_life < config.collapse_quality_of_life
    {
        return OutcomeVerdict {
            outcome: Outcome::Dystopia,
            reason: format!(
                "over-regulation collapse with {} regulations in force",
                inputs.regulation_count
            ),
            confidence: 0.75,
        };
    }

    if inputs.utopia_streak >= config.utopia_streak_months
        && inputs.elapsed_months >= config.utopia_min_months
        && utopia_conditions(inputs, config)
    {
        let required = f64::from(config.utopia_streak_months.max(1));
        let excess = (f64::from(inputs.utopia_streak) - required) / required;
        return OutcomeVerdict {
            outcome: Outcome::Utopia,
            reason: format!(
                "aligned flourishing sustained for {} months",
                inputs.utopia_streak
            ),
            confidence: ramp(0.8, excess),
        };
    }

    OutcomeVerdict::active()
}
