//! Phase wrapper around the population lifecycle manager.

use takeoff_agents::{LifecycleManager, SimRng};
use takeoff_types::WorldState;

use crate::phase::{Phase, PhaseDescriptor, PhaseError, PhaseOutput, TickContext, keys};

/// Runs one month of population dynamics and signals its counters.
#[derive(Debug, Clone)]
pub struct PopulationLifecyclePhase {
    descriptor: PhaseDescriptor,
    manager: LifecycleManager,
}

impl PopulationLifecyclePhase {
    /// Stable phase id.
    pub const ID: &'static str = "population-lifecycle";

    /// Create the phase around an already-configured manager.
    pub fn new(manager: LifecycleManager, order: f64) -> Self {
        Self {
            descriptor: PhaseDescriptor::new(Self::ID, "Population lifecycle", order),
            manager,
        }
    }

    /// The wrapped manager.
    pub const fn manager(&self) -> &LifecycleManager {
        &self.manager
    }
}

impl Phase for PopulationLifecyclePhase {
    fn descriptor(&self) -> &PhaseDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        state: &mut WorldState,
        rng: &mut SimRng,
        context: &mut TickContext,
    ) -> Result<PhaseOutput, PhaseError> {
        let report = self.manager.process_tick(state, rng);

        context.set_count(keys::CREATED, report.created);
        context.set_count(keys::RETIRED, report.retired);
        context.set_count(keys::PURGED, report.purged);
        context.set_count(keys::BREACHES, report.breaches);
        context.set_flag(keys::CAP_REACHED, report.cap_reached);
        context.set_number(keys::SPREAD_MULTIPLIER, report.security.spread_multiplier);
        context.set_number(keys::BREACH_PROBABILITY, report.security.breach_probability);

        Ok(PhaseOutput::from_events(report.events))
    }
}
