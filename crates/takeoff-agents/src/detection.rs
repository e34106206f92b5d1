//! Detection of misaligned agents and removal on command.
//!
//! Detection reads an agent's internal alignment, never the nominal value
//! an observer sees. Only agents below the misalignment threshold can be
//! truly detected; aligned agents can still be flagged through the
//! false-positive model while they are under evaluation.
//!
//! Removal is asymmetric by deployment type: a closed or research system
//! can be switched off, an enterprise rollout can only be wound back
//! gradually, and published weights can never be recalled.

use serde::{Deserialize, Serialize};
use takeoff_types::{
    Agent, AgentId, DefenderCapabilities, DeploymentType, Event, EventType, LifecycleState,
    Severity,
};
use tracing::{debug, info};

use crate::config::DetectionConfig;
use crate::error::AgentError;
use crate::guard;
use crate::lifecycle;
use crate::rng::SimRng;

/// Detection multiplier for each lifecycle stage.
pub const fn stage_multiplier(state: LifecycleState) -> f64 {
    match state {
        LifecycleState::Training => 0.5,
        LifecycleState::Testing => 2.0,
        LifecycleState::DeployedClosed => 1.0,
        LifecycleState::DeployedOpen => 0.3,
        LifecycleState::Retired => 0.0,
    }
}

/// Agents flagged during one detection pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionReport {
    /// Genuinely misaligned agents that were flagged.
    pub detected: Vec<AgentId>,
    /// Aligned agents that were wrongly flagged.
    pub false_positives: Vec<AgentId>,
    /// One event per flag, in population order.
    pub events: Vec<Event>,
}

/// What a removal order achieved against one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalOutcome {
    /// The agent was retired and its spread zeroed.
    Removed,
    /// Enterprise spread was halved; the agent remains deployed.
    PartiallyRemoved {
        /// Copies left after the rollback.
        remaining: u64,
    },
    /// Weights are public; only future distribution was stopped.
    DistributionHalted,
    /// Nothing to do: the agent is already retired or already halted.
    NoEffect,
}

/// Result of removing every flagged agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovalReport {
    /// Per-agent outcomes for agents the order touched.
    pub outcomes: Vec<(AgentId, RemovalOutcome)>,
    /// Events for every outcome other than [`RemovalOutcome::NoEffect`].
    pub events: Vec<Event>,
}

impl RemovalReport {
    /// Number of removal actions that changed something.
    pub fn effective_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o != RemovalOutcome::NoEffect)
            .count()
    }
}

/// Computes detection probabilities and carries out removals.
#[derive(Debug, Clone, Default)]
pub struct DetectionModel {
    config: DetectionConfig,
}

impl DetectionModel {
    /// Create a model with the given parameters.
    pub const fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// The model's parameters.
    pub const fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Mean of surveillance and oversight, each clamped to `0..=1`.
    pub fn government_capability(defender: &DefenderCapabilities) -> f64 {
        let surveillance = guard::unit_interval(defender.surveillance, 0.0, "defender.surveillance");
        let oversight = guard::unit_interval(defender.oversight, 0.0, "defender.oversight");
        (surveillance + oversight) / 2.0
    }

    /// How well the agent can hide its objectives, `0..=1`.
    pub fn deception(&self, agent: &Agent) -> f64 {
        let social = guard::non_negative(agent.capability.social, 0.0, "capability.social");
        let cognitive =
            guard::non_negative(agent.capability.cognitive, 0.0, "capability.cognitive");
        ((social + cognitive) / 2.0 / self.config.deception_scale).clamp(0.0, 1.0)
    }

    /// `max(min_resistance, 1 - deception)`.
    pub fn deception_resistance(&self, agent: &Agent) -> f64 {
        f64::max(self.config.min_deception_resistance, 1.0 - self.deception(agent))
    }

    /// `1 + (threshold - internal) / threshold` for misaligned agents, else 1.
    pub fn severity_multiplier(&self, internal_alignment: f64) -> f64 {
        let threshold = self.config.misalignment_threshold;
        if internal_alignment >= threshold {
            return 1.0;
        }
        (1.0 + (threshold - internal_alignment) / threshold).clamp(1.0, 2.0)
    }

    /// Whether the agent is genuinely misaligned.
    pub fn is_misaligned(&self, agent: &Agent) -> bool {
        agent.internal_alignment() < self.config.misalignment_threshold
    }

    /// Monthly probability of truly detecting this agent.
    ///
    /// Zero for aligned and retired agents.
    pub fn detection_probability(&self, agent: &Agent, defender: &DefenderCapabilities) -> f64 {
        if !agent.is_active() || !self.is_misaligned(agent) {
            return 0.0;
        }
        let p = self.config.base_rate
            * Self::government_capability(defender)
            * self.deception_resistance(agent)
            * stage_multiplier(agent.lifecycle_state)
            * self.severity_multiplier(agent.internal_alignment());
        guard::unit_interval(p, 0.0, "detection.probability")
    }

    /// Monthly probability of wrongly flagging an aligned agent.
    ///
    /// Only agents under evaluation (`Testing`) can be misflagged.
    pub fn false_positive_probability(
        &self,
        agent: &Agent,
        defender: &DefenderCapabilities,
    ) -> f64 {
        if agent.lifecycle_state != LifecycleState::Testing || self.is_misaligned(agent) {
            return 0.0;
        }
        let surveillance = guard::unit_interval(defender.surveillance, 0.0, "defender.surveillance");
        let resentment = guard::unit_interval(agent.resentment, 0.0, "agent.resentment");
        let p = self.config.false_positive_base * surveillance * (1.0 + resentment);
        guard::unit_interval(p, 0.0, "detection.false_positive")
    }

    /// Run one detection pass over the population.
    ///
    /// Agents already flagged are skipped. Each remaining agent with a
    /// non-zero detection or false-positive probability consumes one draw.
    pub fn run_detection(
        &self,
        agents: &mut [Agent],
        defender: &DefenderCapabilities,
        month: u64,
        rng: &mut SimRng,
    ) -> DetectionReport {
        let mut report = DetectionReport::default();

        for agent in agents.iter_mut() {
            if !agent.is_active() || agent.detected_misaligned {
                continue;
            }

            if self.is_misaligned(agent) {
                let p = self.detection_probability(agent, defender);
                if p > 0.0 && rng.chance(p) {
                    agent.detected_misaligned = true;
                    info!(
                        agent = %agent.id,
                        label = %agent.label,
                        state = %agent.lifecycle_state,
                        internal_alignment = agent.internal_alignment(),
                        "Misaligned agent detected"
                    );
                    report.detected.push(agent.id);
                    report.events.push(
                        Event::new(
                            month,
                            EventType::MisalignmentDetected,
                            Severity::Warning,
                            format!("{} flagged as misaligned", agent.label),
                        )
                        .with_agent(agent.id)
                        .with_details(serde_json::json!({
                            "state": agent.lifecycle_state,
                            "probability": p,
                        })),
                    );
                }
            } else {
                let p = self.false_positive_probability(agent, defender);
                if p > 0.0 && rng.chance(p) {
                    agent.detected_misaligned = true;
                    debug!(agent = %agent.id, label = %agent.label, "False positive flag");
                    report.false_positives.push(agent.id);
                    report.events.push(
                        Event::new(
                            month,
                            EventType::FalsePositiveFlag,
                            Severity::Info,
                            format!("{} flagged during evaluation", agent.label),
                        )
                        .with_agent(agent.id),
                    );
                }
            }
        }
        report
    }

    /// Carry out a removal order against one agent.
    pub fn remove_agent(agent: &mut Agent, month: u64) -> (RemovalOutcome, Option<Event>) {
        if !agent.is_active() {
            return (RemovalOutcome::NoEffect, None);
        }

        match agent.deployment_type {
            DeploymentType::Closed | DeploymentType::Research => {
                retire_removed(agent, month);
                let event = removed_event(agent, month);
                (RemovalOutcome::Removed, Some(event))
            }
            DeploymentType::Enterprise => {
                let remaining = agent.spread_count / 2;
                if remaining == 0 {
                    retire_removed(agent, month);
                    let event = removed_event(agent, month);
                    (RemovalOutcome::Removed, Some(event))
                } else {
                    agent.spread_count = remaining;
                    info!(agent = %agent.id, remaining, "Enterprise deployment partly rolled back");
                    let event = Event::new(
                        month,
                        EventType::PartialRemoval,
                        Severity::Warning,
                        format!("{} rolled back to {remaining} installations", agent.label),
                    )
                    .with_agent(agent.id)
                    .with_details(serde_json::json!({ "remaining": remaining }));
                    (RemovalOutcome::PartiallyRemoved { remaining }, Some(event))
                }
            }
            DeploymentType::OpenWeights => {
                if agent.distribution_halted {
                    return (RemovalOutcome::NoEffect, None);
                }
                agent.distribution_halted = true;
                info!(
                    agent = %agent.id,
                    spread = agent.spread_count,
                    "Open weights cannot be recalled; distribution halted"
                );
                let event = Event::new(
                    month,
                    EventType::DistributionHalted,
                    Severity::Warning,
                    format!(
                        "{} distribution halted; {} copies remain in circulation",
                        agent.label, agent.spread_count
                    ),
                )
                .with_agent(agent.id)
                .with_details(serde_json::json!({ "spread_count": agent.spread_count }));
                (RemovalOutcome::DistributionHalted, Some(event))
            }
        }
    }

    /// Carry out removal against every flagged active agent.
    pub fn remove_flagged(agents: &mut [Agent], month: u64) -> RemovalReport {
        let mut report = RemovalReport::default();
        for agent in agents.iter_mut() {
            if !agent.is_active() || !agent.detected_misaligned {
                continue;
            }
            let (outcome, event) = Self::remove_agent(agent, month);
            report.outcomes.push((agent.id, outcome));
            report.events.extend(event);
        }
        report
    }

    /// Carry out a removal order against the agent with the given id.
    pub fn remove_by_id(
        agents: &mut [Agent],
        id: AgentId,
        month: u64,
    ) -> Result<(RemovalOutcome, Option<Event>), AgentError> {
        let agent = agents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AgentError::AgentNotFound(id))?;
        Ok(Self::remove_agent(agent, month))
    }
}

fn retire_removed(agent: &mut Agent, month: u64) {
    lifecycle::retire(agent, month);
    info!(agent = %agent.id, label = %agent.label, "Agent removed from service");
}

fn removed_event(agent: &Agent, month: u64) -> Event {
    Event::new(
        month,
        EventType::AgentRemoved,
        Severity::Warning,
        format!("{} removed from service", agent.label),
    )
    .with_agent(agent.id)
}
