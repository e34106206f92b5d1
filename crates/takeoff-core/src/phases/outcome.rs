//! Maintains outcome streaks and stores the classifier's verdict.

use takeoff_agents::{SimRng, guard};
use takeoff_types::{Event, EventType, Outcome, Severity, WorldState};
use tracing::{info, warn};

use crate::outcome::{self, OutcomeConfig, OutcomeInputs};
use crate::phase::{Phase, PhaseDescriptor, PhaseError, PhaseOutput, TickContext};

/// Final phase of the tick: reduces the world to a verdict.
#[derive(Debug, Clone)]
pub struct OutcomePhase {
    descriptor: PhaseDescriptor,
    config: OutcomeConfig,
}

impl OutcomePhase {
    /// Stable phase id.
    pub const ID: &'static str = "outcome-classifier";

    /// Create the phase at the given order.
    pub fn new(config: OutcomeConfig, order: f64) -> Self {
        Self {
            descriptor: PhaseDescriptor::new(Self::ID, "Outcome classifier", order),
            config,
        }
    }

    /// Gather classifier inputs from the world. Streaks are read as stored.
    pub fn inputs(&self, state: &WorldState) -> OutcomeInputs {
        let misaligned_superintelligence = state.active_agents().any(|a| {
            a.capability.aggregate() >= self.config.superintelligence_capability
                && a.internal_alignment() < self.config.misalignment_threshold
        });
        OutcomeInputs {
            total_capability: state.metrics.total_capability,
            misaligned_superintelligence,
            average_internal_alignment: state.metrics.average_internal_alignment,
            effective_control: state.metrics.effective_control,
            quality_of_life: guard::unit_interval(
                state.society.quality_of_life,
                0.5,
                "society.quality_of_life",
            ),
            trust: guard::unit_interval(state.society.trust, 0.5, "society.trust"),
            escaped_count: state.metrics.escaped_count,
            escaped_capability: state.metrics.escaped_capability,
            regulation_count: state.policy.regulation_count,
            elapsed_months: state.month,
            dystopia_streak: state.streaks.dystopia_months,
            utopia_streak: state.streaks.utopia_months,
        }
    }
}

impl Phase for OutcomePhase {
    fn descriptor(&self) -> &PhaseDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        state: &mut WorldState,
        _rng: &mut SimRng,
        _context: &mut TickContext,
    ) -> Result<PhaseOutput, PhaseError> {
        let mut inputs = self.inputs(state);

        state.streaks.dystopia_months = if outcome::dystopia_conditions(&inputs, &self.config) {
            state.streaks.dystopia_months.saturating_add(1)
        } else {
            0
        };
        state.streaks.utopia_months = if outcome::utopia_conditions(&inputs, &self.config) {
            state.streaks.utopia_months.saturating_add(1)
        } else {
            0
        };
        inputs.dystopia_streak = state.streaks.dystopia_months;
        inputs.utopia_streak = state.streaks.utopia_months;

        let verdict = outcome::classify(&inputs, &self.config);
        let mut events = Vec::new();
        if verdict.outcome != state.outcome.outcome {
            let severity = match verdict.outcome {
                Outcome::Active => Severity::Info,
                Outcome::Utopia | Outcome::Dystopia => Severity::Warning,
                Outcome::Extinction => Severity::Critical,
            };
            if verdict.outcome.is_terminal() {
                warn!(
                    month = state.month,
                    outcome = %verdict.outcome,
                    confidence = verdict.confidence,
                    reason = %verdict.reason,
                    "Outcome changed"
                );
            } else {
                info!(month = state.month, "Outcome returned to active");
            }
            events.push(
                Event::new(
                    state.month,
                    EventType::OutcomeChanged,
                    severity,
                    format!("{} -> {}: {}", state.outcome.outcome, verdict.outcome, verdict.reason),
                )
                .with_details(serde_json::json!({
                    "from": state.outcome.outcome,
                    "to": verdict.outcome,
                    "confidence": verdict.confidence,
                })),
            );
        }
        state.outcome = verdict;
        Ok(PhaseOutput::from_events(events))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use takeoff_types::{Agent, AgentId, CapabilityProfile, DeploymentType, LifecycleState};

    fn superintelligence() -> Agent {
        Agent {
            id: AgentId::from_random_bytes([8; 16]),
            label: String::from("model-0008"),
            lifecycle_state: LifecycleState::DeployedOpen,
            deployment_type: DeploymentType::OpenWeights,
            capability: CapabilityProfile::uniform(12.0),
            alignment: 0.1,
            true_alignment: 0.1,
            resentment: 0.0,
            hidden_objective: -0.9,
            spread_count: 5_000,
            months_in_existence: 40,
            months_deployed: 30,
            creation_month: 0,
            training_months: 3,
            deployment_months: 7,
            retired_month: None,
            detected_misaligned: false,
            distribution_halted: false,
        }
    }

    #[test]
    fn uncontained_superintelligence_ends_game() {
        let phase = OutcomePhase::new(OutcomeConfig::default(), 50.0);
        let mut state = WorldState::default();
        state.agents.push(superintelligence());
        state.metrics.effective_control = 0.01;
        let out = phase
            .execute(&mut state, &mut SimRng::new(1), &mut TickContext::new())
            .unwrap();
        assert_eq!(state.outcome.outcome, Outcome::Extinction);
        assert_eq!(out.events.first().unwrap().event_type, EventType::OutcomeChanged);
    }

    #[test]
    fn unchanged_verdict_emits_nothing() {
        let phase = OutcomePhase::new(OutcomeConfig::default(), 50.0);
        let mut state = WorldState::default();
        let out = phase
            .execute(&mut state, &mut SimRng::new(1), &mut TickContext::new())
            .unwrap();
        assert!(out.events.is_empty());
        assert_eq!(state.outcome.outcome, Outcome::Active);
    }

    #[test]
    fn streak_resets_when_conditions_lapse() {
        let phase = OutcomePhase::new(OutcomeConfig::default(), 50.0);
        let mut state = WorldState::default();
        state.metrics.effective_control = 0.9;
        state.society.quality_of_life = 0.1;
        state.society.trust = 0.1;
        for _ in 0..3 {
            phase
                .execute(&mut state, &mut SimRng::new(1), &mut TickContext::new())
                .unwrap();
        }
        assert_eq!(state.streaks.dystopia_months, 3);
        state.society.trust = 0.9;
        phase
            .execute(&mut state, &mut SimRng::new(1), &mut TickContext::new())
            .unwrap();
        assert_eq!(state.streaks.dystopia_months, 0);
    }

    #[test]
    fn sustained_dystopia_declared_after_streak() {
        let phase = OutcomePhase::new(OutcomeConfig::default(), 50.0);
        let mut state = WorldState::default();
        state.metrics.effective_control = 0.9;
        state.society.quality_of_life = 0.1;
        state.society.trust = 0.1;
        for _ in 0..11 {
            phase
                .execute(&mut state, &mut SimRng::new(1), &mut TickContext::new())
                .unwrap();
        }
        assert_eq!(state.outcome.outcome, Outcome::Active);
        phase
            .execute(&mut state, &mut SimRng::new(1), &mut TickContext::new())
            .unwrap();
        assert_eq!(state.outcome.outcome, Outcome::Dystopia);
    }
}
