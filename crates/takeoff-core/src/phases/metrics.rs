//! Recomputes the collaborator-facing aggregates.

use takeoff_agents::SimRng;
use takeoff_types::{TickSignals, WorldState};
use tracing::debug;

use crate::metrics;
use crate::phase::{Phase, PhaseDescriptor, PhaseError, PhaseOutput, TickContext, keys};

/// Rebuilds [`takeoff_types::AggregateMetrics`] after population and
/// detection have run, folding in this tick's counters from the context.
#[derive(Debug, Clone)]
pub struct MetricsPhase {
    descriptor: PhaseDescriptor,
    misalignment_threshold: f64,
    escape_spread: u64,
}

impl MetricsPhase {
    /// Stable phase id.
    pub const ID: &'static str = "aggregate-metrics";

    /// Create the phase. The thresholds define which agents count as escaped.
    pub fn new(misalignment_threshold: f64, escape_spread: u64, order: f64) -> Self {
        Self {
            descriptor: PhaseDescriptor::new(Self::ID, "Aggregate metrics", order),
            misalignment_threshold,
            escape_spread,
        }
    }
}

impl Phase for MetricsPhase {
    fn descriptor(&self) -> &PhaseDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        state: &mut WorldState,
        _rng: &mut SimRng,
        context: &mut TickContext,
    ) -> Result<PhaseOutput, PhaseError> {
        let signals = TickSignals {
            created: context.count(keys::CREATED),
            retired: context.count(keys::RETIRED),
            breaches: context.count(keys::BREACHES),
            detections: context.count(keys::DETECTIONS),
            false_positives: context.count(keys::FALSE_POSITIVES),
            removals: context.count(keys::REMOVALS),
        };
        state.metrics = metrics::compute(
            &state.agents,
            &state.policy,
            &state.defender,
            self.misalignment_threshold,
            self.escape_spread,
            signals,
        );
        debug!(
            month = state.month,
            total_capability = state.metrics.total_capability,
            average_internal_alignment = state.metrics.average_internal_alignment,
            effective_control = state.metrics.effective_control,
            active = state.metrics.population.active(),
            escaped = state.metrics.escaped_count,
            "Metrics updated"
        );
        Ok(PhaseOutput::empty())
    }
}
