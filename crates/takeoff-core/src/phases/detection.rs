//! Phase wrapper around detection and authorized removal.

use takeoff_agents::{DetectionModel, SimRng};
use takeoff_types::WorldState;
use tracing::info;

use crate::phase::{Phase, PhaseDescriptor, PhaseError, PhaseOutput, TickContext, keys};

/// Flags misaligned agents and, when the policy input authorizes it,
/// removes every flagged agent.
#[derive(Debug, Clone)]
pub struct DetectionPhase {
    descriptor: PhaseDescriptor,
    model: DetectionModel,
}

impl DetectionPhase {
    /// Stable phase id.
    pub const ID: &'static str = "detection";

    /// Create the phase around an already-configured model.
    pub fn new(model: DetectionModel, order: f64) -> Self {
        Self {
            descriptor: PhaseDescriptor::new(Self::ID, "Detection and removal", order),
            model,
        }
    }
}

impl Phase for DetectionPhase {
    fn descriptor(&self) -> &PhaseDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        state: &mut WorldState,
        rng: &mut SimRng,
        context: &mut TickContext,
    ) -> Result<PhaseOutput, PhaseError> {
        let month = state.month;
        let defender = state.defender;
        let report = self
            .model
            .run_detection(&mut state.agents, &defender, month, rng);

        context.set_count(keys::DETECTIONS, count(report.detected.len()));
        context.set_count(keys::FALSE_POSITIVES, count(report.false_positives.len()));

        let mut events = report.events;
        let mut removals = 0;
        if state.policy.removal_authorized {
            let removal = DetectionModel::remove_flagged(&mut state.agents, month);
            removals = count(removal.effective_count());
            if removals > 0 {
                info!(month, removals, "Removal order carried out");
            }
            events.extend(removal.events);
        }
        context.set_count(keys::REMOVALS, removals);

        Ok(PhaseOutput::from_events(events))
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use takeoff_agents::DetectionConfig;
    use takeoff_types::{
        Agent, AgentId, CapabilityProfile, DefenderCapabilities, DeploymentType, EventType,
        LifecycleState,
    };

    fn misaligned(id: u8) -> Agent {
        Agent {
            id: AgentId::from_random_bytes([id; 16]),
            label: format!("model-{id:04}"),
            lifecycle_state: LifecycleState::DeployedClosed,
            deployment_type: DeploymentType::Closed,
            capability: CapabilityProfile::uniform(0.1),
            alignment: 0.0,
            true_alignment: 0.0,
            resentment: 0.0,
            hidden_objective: -0.5,
            spread_count: 1,
            months_in_existence: 10,
            months_deployed: 3,
            creation_month: 0,
            training_months: 3,
            deployment_months: 7,
            retired_month: None,
            detected_misaligned: false,
            distribution_halted: false,
        }
    }

    fn certain_phase() -> DetectionPhase {
        DetectionPhase::new(
            DetectionModel::new(DetectionConfig {
                base_rate: 1.0,
                ..DetectionConfig::default()
            }),
            30.0,
        )
    }

    fn watched_world() -> WorldState {
        WorldState {
            agents: vec![misaligned(1)],
            defender: DefenderCapabilities {
                surveillance: 1.0,
                oversight: 1.0,
                ..DefenderCapabilities::default()
            },
            ..WorldState::default()
        }
    }

    #[test]
    fn detection_without_authorization_only_flags() {
        let mut state = watched_world();
        let mut ctx = TickContext::new();
        certain_phase()
            .execute(&mut state, &mut SimRng::new(1), &mut ctx)
            .unwrap();
        assert_eq!(ctx.count(keys::DETECTIONS), 1);
        assert_eq!(ctx.count(keys::REMOVALS), 0);
        let a = state.agents.first().unwrap();
        assert!(a.detected_misaligned);
        assert_eq!(a.lifecycle_state, LifecycleState::DeployedClosed);
    }

    #[test]
    fn authorized_removal_retires_flagged() {
        let mut state = watched_world();
        state.policy.removal_authorized = true;
        let mut ctx = TickContext::new();
        let out = certain_phase()
            .execute(&mut state, &mut SimRng::new(1), &mut ctx)
            .unwrap();
        assert_eq!(ctx.count(keys::REMOVALS), 1);
        assert_eq!(
            state.agents.first().unwrap().lifecycle_state,
            LifecycleState::Retired
        );
        assert!(out.events.iter().any(|e| e.event_type == EventType::AgentRemoved));
    }
}
