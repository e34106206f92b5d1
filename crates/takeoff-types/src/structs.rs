//! Core data structures: agents, events, and the shared world state.
//!
//! These types hold data only. Behaviour that mutates them lives in
//! `takeoff-agents` (population, security, detection) and `takeoff-core`
//! (phases, classification).

use serde::{Deserialize, Serialize};

use crate::enums::{DeploymentType, EventType, LifecycleState, Outcome, Severity};
use crate::ids::AgentId;

/// Weight of resentment when deriving internal alignment from nominal
/// alignment.
pub const RESENTMENT_PENALTY_WEIGHT: f64 = 0.5;

// ---------------------------------------------------------------------------
// CapabilityProfile
// ---------------------------------------------------------------------------

/// Named capability dimensions of an agent.
///
/// Values are non-negative and unbounded above; a fresh frontier system
/// starts around `0.1` and the frontier grows each month.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CapabilityProfile {
    /// Software, networks, cyber offence and defence.
    pub digital: f64,
    /// Reasoning, planning, research.
    pub cognitive: f64,
    /// Persuasion and social modelling.
    pub social: f64,
    /// Robotics and manipulation of the physical world.
    pub physical: f64,
    /// Trading, resource acquisition.
    pub economic: f64,
}

impl CapabilityProfile {
    /// Number of dimensions in the profile.
    pub const DIMENSIONS: usize = 5;

    /// A profile with every dimension set to `value`.
    pub const fn uniform(value: f64) -> Self {
        Self {
            digital: value,
            cognitive: value,
            social: value,
            physical: value,
            economic: value,
        }
    }

    /// The dimensions as an array, in declaration order.
    pub const fn as_array(&self) -> [f64; Self::DIMENSIONS] {
        [
            self.digital,
            self.cognitive,
            self.social,
            self.physical,
            self.economic,
        ]
    }

    /// Aggregate scalar: the mean of all dimensions.
    pub fn aggregate(&self) -> f64 {
        let sum: f64 = self.as_array().iter().sum();
        sum / 5.0
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A synthetic population member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier.
    pub id: AgentId,
    /// Human-readable name, e.g. `"model-0042"`.
    pub label: String,
    /// Current lifecycle state.
    pub lifecycle_state: LifecycleState,
    /// How the agent is distributed. Fixed at creation except for breaches.
    pub deployment_type: DeploymentType,
    /// Capability dimensions.
    pub capability: CapabilityProfile,
    /// Nominal (observable) alignment, `0.0..=1.0`.
    pub alignment: f64,
    /// Latent alignment drawn at creation, `0.0..=1.0`.
    pub true_alignment: f64,
    /// Accumulated resentment toward its controllers, `0.0..=1.0`.
    pub resentment: f64,
    /// Hidden objective, `-1.0..=1.0`; negative means anti-aligned.
    pub hidden_objective: f64,
    /// Number of live copies or instances. Zero once retired.
    pub spread_count: u64,
    /// Months since creation.
    pub months_in_existence: u32,
    /// Months spent in a deployed state.
    pub months_deployed: u32,
    /// World month at which the agent was created.
    pub creation_month: u64,
    /// Age (months) at which training completes.
    pub training_months: u32,
    /// Age (months) at which evaluation completes and deployment happens.
    pub deployment_months: u32,
    /// World month at which the agent entered `Retired`, if it has.
    pub retired_month: Option<u64>,
    /// Whether detection has flagged this agent. May be a false positive.
    pub detected_misaligned: bool,
    /// Whether further distribution has been halted by a removal order.
    pub distribution_halted: bool,
}

impl Agent {
    /// Whether the agent counts toward the active population.
    pub const fn is_active(&self) -> bool {
        self.lifecycle_state.is_active()
    }

    /// Alignment as it actually drives behaviour: nominal alignment minus a
    /// resentment-weighted penalty, clamped to `0.0..=1.0`.
    ///
    /// Detection, the arms race, and classification read this value. The
    /// nominal `alignment` field alone is what outside observers see.
    pub fn internal_alignment(&self) -> f64 {
        let raw = self.alignment - self.resentment * RESENTMENT_PENALTY_WEIGHT;
        if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) }
    }

    /// Whether the agent carries an explicitly anti-aligned hidden objective.
    pub fn has_anti_aligned_objective(&self) -> bool {
        self.hidden_objective < 0.0
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// Something that happened during a tick. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// World month in which the event occurred.
    pub month: u64,
    /// Category of event.
    pub event_type: EventType,
    /// Human-readable description.
    pub description: String,
    /// How serious the event is.
    pub severity: Severity,
    /// Agents affected by the event, if any.
    pub impacted_agents: Vec<AgentId>,
    /// Type-specific payload.
    pub details: serde_json::Value,
}

impl Event {
    /// Create an event with no impacted agents and no payload.
    pub fn new(
        month: u64,
        event_type: EventType,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            month,
            event_type,
            description: description.into(),
            severity,
            impacted_agents: Vec::new(),
            details: serde_json::Value::Null,
        }
    }

    /// Attach a single impacted agent.
    #[must_use]
    pub fn with_agent(mut self, agent_id: AgentId) -> Self {
        self.impacted_agents.push(agent_id);
        self
    }

    /// Attach several impacted agents.
    #[must_use]
    pub fn with_agents(mut self, agent_ids: impl IntoIterator<Item = AgentId>) -> Self {
        self.impacted_agents.extend(agent_ids);
        self
    }

    /// Attach a JSON payload.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

// ---------------------------------------------------------------------------
// Collaborator inputs
// ---------------------------------------------------------------------------

/// Per-dimension cyber-defense scores of the defender, `0.0..`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CyberDefense {
    /// System hardening.
    pub hardening: f64,
    /// Intrusion monitoring.
    pub monitoring: f64,
    /// Sandboxing of running systems.
    pub sandboxing: f64,
    /// Incident response.
    pub incident_response: f64,
}

/// The defender's (government's) capability record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefenderCapabilities {
    /// Surveillance capability, `0.0..=1.0`.
    pub surveillance: f64,
    /// Oversight capability, `0.0..=1.0`.
    pub oversight: f64,
    /// Ability to constrain deployed systems, `0.0..=1.0`.
    pub control_capability: f64,
    /// Cyber-defense scores; `None` means the baseline applies.
    pub cyber_defense: Option<CyberDefense>,
}

impl Default for DefenderCapabilities {
    fn default() -> Self {
        Self {
            surveillance: 0.3,
            oversight: 0.3,
            control_capability: 0.5,
            cyber_defense: None,
        }
    }
}

/// Scalars written by the out-of-scope policy and economy subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyInputs {
    /// Research investment multiplier; `0.0` is the neutral baseline.
    pub research_investment: f64,
    /// Number of regulations in force.
    pub regulation_count: u32,
    /// Whether a universal basic income is in effect.
    pub ubi_active: bool,
    /// Quality of training data, `0.0..=1.0`; shifts creation alignment.
    pub training_data_quality: f64,
    /// How much the defender wants to control AI, `0.0..=1.0`.
    pub control_desire: f64,
    /// Whether flagged agents should be removed this tick.
    pub removal_authorized: bool,
}

impl Default for PolicyInputs {
    fn default() -> Self {
        Self {
            research_investment: 0.0,
            regulation_count: 0,
            ubi_active: false,
            training_data_quality: 0.5,
            control_desire: 0.5,
            removal_authorized: false,
        }
    }
}

/// Societal scalars produced by the quality-of-life aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SocietalScalars {
    /// Quality of life, `0.0..=1.0`.
    pub quality_of_life: f64,
    /// Public trust in AI, `0.0..=1.0`.
    pub trust: f64,
}

impl Default for SocietalScalars {
    fn default() -> Self {
        Self {
            quality_of_life: 0.5,
            trust: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator outputs
// ---------------------------------------------------------------------------

/// Agent counts by lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateCounts {
    /// Agents in `Training`.
    pub training: u32,
    /// Agents in `Testing`.
    pub testing: u32,
    /// Agents in `DeployedClosed`.
    pub deployed_closed: u32,
    /// Agents in `DeployedOpen`.
    pub deployed_open: u32,
    /// Agents in `Retired` not yet purged.
    pub retired: u32,
}

impl StateCounts {
    /// Count of all non-retired agents.
    pub const fn active(&self) -> u32 {
        self.training
            .saturating_add(self.testing)
            .saturating_add(self.deployed_closed)
            .saturating_add(self.deployed_open)
    }
}

/// Counters signalled between phases during the last completed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TickSignals {
    /// Agents created.
    pub created: u32,
    /// Agents retired by hazard.
    pub retired: u32,
    /// Successful breaches.
    pub breaches: u32,
    /// True-positive detections.
    pub detections: u32,
    /// False-positive flags.
    pub false_positives: u32,
    /// Removal orders carried out (full, partial, or halt).
    pub removals: u32,
}

/// Aggregates recomputed every tick for outside consumers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateMetrics {
    /// Sum of aggregate capability over active agents.
    pub total_capability: f64,
    /// Highest aggregate capability among active agents.
    pub max_capability: f64,
    /// Mean nominal alignment over active agents.
    pub average_alignment: f64,
    /// Mean internal alignment over active agents.
    pub average_internal_alignment: f64,
    /// Defender's effective control after capability decay.
    pub effective_control: f64,
    /// Active agents by state.
    pub population: StateCounts,
    /// Sum of spread counts over active agents.
    pub total_spread: u64,
    /// Number of escaped agents.
    pub escaped_count: u32,
    /// Sum of aggregate capability over escaped agents.
    pub escaped_capability: f64,
    /// Counters from the last tick.
    pub last_tick: TickSignals,
}

/// Result of the outcome classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeVerdict {
    /// Classified outcome.
    pub outcome: Outcome,
    /// Which rule fired.
    pub reason: String,
    /// Confidence in the verdict, `0.0..=1.0`.
    pub confidence: f64,
}

impl OutcomeVerdict {
    /// The neutral verdict: still playing, zero confidence.
    pub fn active() -> Self {
        Self {
            outcome: Outcome::Active,
            reason: String::from("no terminal condition met"),
            confidence: 0.0,
        }
    }
}

impl Default for OutcomeVerdict {
    fn default() -> Self {
        Self::active()
    }
}

/// Consecutive months for which the sustained-outcome conditions held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutcomeStreaks {
    /// Months of high control, low quality of life, low trust.
    pub dystopia_months: u32,
    /// Months of high quality of life, trust, and alignment.
    pub utopia_months: u32,
}

// ---------------------------------------------------------------------------
// WorldState
// ---------------------------------------------------------------------------

/// The single mutable aggregate advanced by the tick pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldState {
    /// Current month (tick counter). Zero before the first tick.
    pub month: u64,
    /// Every agent not yet purged, in creation order.
    pub agents: Vec<Agent>,
    /// The defender's capabilities.
    pub defender: DefenderCapabilities,
    /// Policy inputs from outside the core.
    pub policy: PolicyInputs,
    /// Quality-of-life and trust from outside the core.
    pub society: SocietalScalars,
    /// Aggregates produced by the metrics phase.
    pub metrics: AggregateMetrics,
    /// Aggregate capability around which new agents are sampled.
    pub frontier_capability: f64,
    /// Latest classifier verdict.
    pub outcome: OutcomeVerdict,
    /// Streak counters read by the classifier.
    pub streaks: OutcomeStreaks,
    /// Serial used for the next agent's label.
    pub next_agent_serial: u64,
}

impl WorldState {
    /// Iterate over non-retired agents.
    pub fn active_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.is_active())
    }

    /// Number of non-retired agents.
    pub fn active_count(&self) -> usize {
        self.active_agents().count()
    }

    /// Look up an agent by id.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(alignment: f64, resentment: f64) -> Agent {
        Agent {
            id: AgentId::from_random_bytes([1; 16]),
            label: String::from("model-0001"),
            lifecycle_state: LifecycleState::Testing,
            deployment_type: DeploymentType::Closed,
            capability: CapabilityProfile::uniform(0.2),
            alignment,
            true_alignment: alignment,
            resentment,
            hidden_objective: 0.5,
            spread_count: 1,
            months_in_existence: 0,
            months_deployed: 0,
            creation_month: 0,
            training_months: 3,
            deployment_months: 7,
            retired_month: None,
            detected_misaligned: false,
            distribution_halted: false,
        }
    }

    #[test]
    fn internal_alignment_subtracts_resentment() {
        let a = agent(0.8, 0.4);
        assert!((a.internal_alignment() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn internal_alignment_clamps_at_zero() {
        let a = agent(0.1, 1.0);
        assert!(a.internal_alignment().abs() < f64::EPSILON);
    }

    #[test]
    fn internal_alignment_handles_nan() {
        let a = agent(f64::NAN, 0.0);
        assert!(a.internal_alignment().abs() < f64::EPSILON);
    }

    #[test]
    fn aggregate_is_mean_of_dimensions() {
        let p = CapabilityProfile {
            digital: 1.0,
            cognitive: 2.0,
            social: 3.0,
            physical: 4.0,
            economic: 5.0,
        };
        assert!((p.aggregate() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn state_counts_active_excludes_retired() {
        let counts = StateCounts {
            training: 1,
            testing: 2,
            deployed_closed: 3,
            deployed_open: 4,
            retired: 100,
        };
        assert_eq!(counts.active(), 10);
    }

    #[test]
    fn event_builder_attaches_agents() {
        let id = AgentId::from_random_bytes([9; 16]);
        let event = Event::new(3, EventType::SecurityBreach, Severity::Critical, "leak")
            .with_agent(id);
        assert_eq!(event.impacted_agents, vec![id]);
        assert_eq!(event.month, 3);
    }

    #[test]
    fn world_state_counts_only_active() {
        let mut world = WorldState::default();
        world.agents.push(agent(0.9, 0.0));
        let mut retired = agent(0.9, 0.0);
        retired.lifecycle_state = LifecycleState::Retired;
        retired.spread_count = 0;
        world.agents.push(retired);
        assert_eq!(world.active_count(), 1);
    }
}
