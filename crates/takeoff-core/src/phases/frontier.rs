//! Capability frontier growth.

use serde::Deserialize;
use takeoff_agents::{SimRng, guard};
use takeoff_types::{Event, EventType, Severity, WorldState};
use tracing::info;

use crate::phase::{Phase, PhaseDescriptor, PhaseError, PhaseOutput, TickContext, keys};

/// Parameters for frontier growth.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrontierConfig {
    /// Frontier capability at month zero.
    pub initial_capability: f64,
    /// Relative growth per month at neutral research investment.
    pub monthly_growth: f64,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            initial_capability: 0.1,
            monthly_growth: 0.03,
        }
    }
}

/// Advances the state-of-the-art capability new agents are sampled around.
///
/// Growth is `monthly_growth * (1 + research_investment)` per month,
/// compounding. Crossing a whole number emits a milestone event.
#[derive(Debug, Clone)]
pub struct CapabilityFrontierPhase {
    descriptor: PhaseDescriptor,
    config: FrontierConfig,
}

impl CapabilityFrontierPhase {
    /// Stable phase id.
    pub const ID: &'static str = "capability-frontier";

    /// Create the phase at the given order.
    pub fn new(config: FrontierConfig, order: f64) -> Self {
        Self {
            descriptor: PhaseDescriptor::new(Self::ID, "Capability frontier", order),
            config,
        }
    }
}

impl Phase for CapabilityFrontierPhase {
    fn descriptor(&self) -> &PhaseDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        state: &mut WorldState,
        _rng: &mut SimRng,
        context: &mut TickContext,
    ) -> Result<PhaseOutput, PhaseError> {
        let before = guard::non_negative(
            state.frontier_capability,
            self.config.initial_capability,
            "world.frontier_capability",
        );
        let investment =
            guard::non_negative(state.policy.research_investment, 0.0, "policy.research_investment");
        let after = before * (1.0 + self.config.monthly_growth * (1.0 + investment));
        state.frontier_capability = after;
        context.set_number(keys::FRONTIER_CAPABILITY, after);

        let mut events = Vec::new();
        if after.floor() > before.floor() {
            info!(month = state.month, frontier = after, "Capability milestone reached");
            events.push(
                Event::new(
                    state.month,
                    EventType::CapabilityMilestone,
                    Severity::Warning,
                    format!("Frontier capability passed {:.0}", after.floor()),
                )
                .with_details(serde_json::json!({ "frontier": after })),
            );
        }
        Ok(PhaseOutput::from_events(events))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn frontier_compounds() {
        let phase = CapabilityFrontierPhase::new(FrontierConfig::default(), 10.0);
        let mut state = WorldState {
            frontier_capability: 1.0,
            ..WorldState::default()
        };
        let mut ctx = TickContext::new();
        phase.execute(&mut state, &mut SimRng::new(1), &mut ctx).unwrap();
        assert!((state.frontier_capability - 1.03).abs() < 1e-12);
        assert_eq!(ctx.number(keys::FRONTIER_CAPABILITY), Some(state.frontier_capability));
    }

    #[test]
    fn research_investment_speeds_growth() {
        let phase = CapabilityFrontierPhase::new(FrontierConfig::default(), 10.0);
        let mut state = WorldState {
            frontier_capability: 1.0,
            ..WorldState::default()
        };
        state.policy.research_investment = 1.0;
        phase
            .execute(&mut state, &mut SimRng::new(1), &mut TickContext::new())
            .unwrap();
        assert!((state.frontier_capability - 1.06).abs() < 1e-12);
    }

    #[test]
    fn milestone_on_whole_number_crossing() {
        let phase = CapabilityFrontierPhase::new(FrontierConfig::default(), 10.0);
        let mut state = WorldState {
            frontier_capability: 0.99,
            ..WorldState::default()
        };
        let out = phase
            .execute(&mut state, &mut SimRng::new(1), &mut TickContext::new())
            .unwrap();
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events.first().unwrap().event_type, EventType::CapabilityMilestone);
    }
}
