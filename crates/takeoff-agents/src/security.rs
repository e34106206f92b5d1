//! The security arms race between misaligned agents and the defender.
//!
//! Each tick the live population is reduced to a single attack/defense
//! ratio. The ratio drives two things the lifecycle manager consumes:
//! a spread multiplier applied to every deployment's growth, and the
//! probability that a closed system's weights leak this month.

use serde::{Deserialize, Serialize};
use takeoff_types::{
    Agent, DefenderCapabilities, DeploymentType, Event, EventType, LifecycleState, Severity,
};
use tracing::{debug, info};

use crate::config::{MAX_SPREAD_COUNT, SecurityConfig};
use crate::guard;
use crate::rng::SimRng;

/// Floor on defense power, so the ratio is always defined.
pub const MIN_DEFENSE_POWER: f64 = 1e-3;

/// Bounds of the spread multiplier.
pub const SPREAD_MULTIPLIER_MIN: f64 = 0.1;
/// Upper bound of the spread multiplier.
pub const SPREAD_MULTIPLIER_MAX: f64 = 3.0;

/// One tick's evaluation of the arms race.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecurityAssessment {
    /// Summed attack power of misaligned active agents.
    pub attack_power: f64,
    /// Defender's cyber-defense power.
    pub defense_power: f64,
    /// `attack_power / defense_power`.
    pub ratio: f64,
    /// Multiplier on spread growth, `0.1..=3.0`.
    pub spread_multiplier: f64,
    /// Monthly chance that a closed deployed system leaks.
    pub breach_probability: f64,
}

impl SecurityAssessment {
    /// Build an assessment directly from an attack/defense ratio.
    ///
    /// Non-finite or negative ratios are treated as zero.
    pub fn from_ratio(ratio: f64, config: &SecurityConfig) -> Self {
        let ratio = sanitize_ratio(ratio);
        Self {
            attack_power: ratio,
            defense_power: 1.0,
            ratio,
            spread_multiplier: spread_multiplier(ratio),
            breach_probability: breach_probability(ratio, config),
        }
    }
}

/// Clean an attack/defense ratio. `+inf` (attack overwhelming the
/// defense) becomes `f64::MAX` so it stays attack-dominant; NaN and
/// negative values become zero.
fn sanitize_ratio(ratio: f64) -> f64 {
    if ratio.is_infinite() && ratio.is_sign_positive() {
        return f64::MAX;
    }
    guard::non_negative(ratio, 0.0, "security.ratio")
}

/// Piecewise map from attack/defense ratio to spread multiplier.
///
/// Below 0.5 the defender is winning and spread is damped to `0.1 + r`.
/// Above 2.0 growth accelerates with diminishing returns up to 3.0.
/// In between the ratio is used as is.
pub fn spread_multiplier(ratio: f64) -> f64 {
    let r = sanitize_ratio(ratio);
    let m = if r < 0.5 {
        0.1 + r
    } else if r > 2.0 {
        f64::min(SPREAD_MULTIPLIER_MAX, 1.0 + (r - 1.0) * 0.5)
    } else {
        r
    };
    m.clamp(SPREAD_MULTIPLIER_MIN, SPREAD_MULTIPLIER_MAX)
}

/// Monthly breach probability for a closed deployed system.
pub fn breach_probability(ratio: f64, config: &SecurityConfig) -> f64 {
    let r = sanitize_ratio(ratio);
    let cap = guard::unit_interval(config.max_breach_probability, 0.10, "security.max_breach");
    let rate = guard::non_negative(config.base_leak_rate, 0.0, "security.base_leak_rate");
    (rate * r).clamp(0.0, cap)
}

/// Agents whose weights leaked this tick, with the matching events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BreachReport {
    /// Indices into the agent slice that were breached.
    pub breached: Vec<usize>,
    /// One `SecurityBreach` event per breached agent.
    pub events: Vec<Event>,
}

/// Evaluates the arms race and applies breaches.
#[derive(Debug, Clone, Default)]
pub struct SecurityModel {
    config: SecurityConfig,
}

impl SecurityModel {
    /// Create a model with the given parameters.
    pub const fn new(config: SecurityConfig) -> Self {
        Self { config }
    }

    /// The model's parameters.
    pub const fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// Attack power contributed by one agent, zero if it is aligned or retired.
    pub fn agent_attack_power(&self, agent: &Agent) -> f64 {
        if !agent.is_active() {
            return 0.0;
        }
        let threshold = self.config.misalignment_threshold;
        let internal = agent.internal_alignment();
        if internal >= threshold {
            return 0.0;
        }
        let digital = guard::non_negative(agent.capability.digital, 0.0, "capability.digital");
        let cognitive =
            guard::non_negative(agent.capability.cognitive, 0.0, "capability.cognitive");
        let depth = (threshold - internal) / threshold;
        (digital + cognitive) / 2.0 * (1.0 + self.config.misalignment_depth_scale * depth)
    }

    /// Total attack power of the population.
    pub fn attack_power(&self, agents: &[Agent]) -> f64 {
        agents.iter().map(|a| self.agent_attack_power(a)).sum()
    }

    /// Defender's cyber-defense power, never below [`MIN_DEFENSE_POWER`].
    pub fn defense_power(&self, defender: &DefenderCapabilities) -> f64 {
        let raw = defender.cyber_defense.map_or(self.config.baseline_defense, |cd| {
            let dims = [
                guard::non_negative(cd.hardening, 0.0, "cyber_defense.hardening"),
                guard::non_negative(cd.monitoring, 0.0, "cyber_defense.monitoring"),
                guard::non_negative(cd.sandboxing, 0.0, "cyber_defense.sandboxing"),
                guard::non_negative(cd.incident_response, 0.0, "cyber_defense.incident_response"),
            ];
            dims.iter().sum::<f64>() / 4.0
        });
        guard::finite_or(raw, 1.0, "security.defense_power").max(MIN_DEFENSE_POWER)
    }

    /// Evaluate the arms race for the current population.
    pub fn assess(&self, agents: &[Agent], defender: &DefenderCapabilities) -> SecurityAssessment {
        let attack_power = self.attack_power(agents);
        let defense_power = self.defense_power(defender);
        let ratio = sanitize_ratio(attack_power / defense_power);
        let assessment = SecurityAssessment {
            attack_power,
            defense_power,
            ratio,
            spread_multiplier: spread_multiplier(ratio),
            breach_probability: breach_probability(ratio, &self.config),
        };
        debug!(
            attack = attack_power,
            defense = defense_power,
            ratio,
            multiplier = assessment.spread_multiplier,
            breach_p = assessment.breach_probability,
            "Security assessed"
        );
        assessment
    }

    /// Roll for a breach on every closed deployed system.
    ///
    /// One draw is consumed per eligible agent. A breached agent becomes
    /// `OpenWeights` / `DeployedOpen` and its spread jumps to
    /// `initial_leak_size * spread_multiplier` (at least 1).
    pub fn attempt_breaches(
        &self,
        agents: &mut [Agent],
        assessment: &SecurityAssessment,
        month: u64,
        rng: &mut SimRng,
    ) -> BreachReport {
        let mut report = BreachReport::default();
        let leak = leak_size(self.config.initial_leak_size, assessment.spread_multiplier);

        for (index, agent) in agents.iter_mut().enumerate() {
            if agent.lifecycle_state != LifecycleState::DeployedClosed
                || agent.deployment_type != DeploymentType::Closed
            {
                continue;
            }
            if !rng.chance(assessment.breach_probability) {
                continue;
            }

            agent.deployment_type = DeploymentType::OpenWeights;
            agent.lifecycle_state = LifecycleState::DeployedOpen;
            agent.spread_count = leak;

            info!(
                agent = %agent.id,
                label = %agent.label,
                spread = leak,
                ratio = assessment.ratio,
                "Security breach: weights leaked"
            );
            report.breached.push(index);
            report.events.push(
                Event::new(
                    month,
                    EventType::SecurityBreach,
                    Severity::Critical,
                    format!("{} weights leaked; {leak} copies in circulation", agent.label),
                )
                .with_agent(agent.id)
                .with_details(serde_json::json!({
                    "spread_count": leak,
                    "ratio": assessment.ratio,
                    "breach_probability": assessment.breach_probability,
                })),
            );
        }
        report
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn leak_size(initial: f64, multiplier: f64) -> u64 {
    let raw = guard::non_negative(initial * multiplier, 1.0, "security.leak_size").round();
    (raw as u64).clamp(1, MAX_SPREAD_COUNT)
}
