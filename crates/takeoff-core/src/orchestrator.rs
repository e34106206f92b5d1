//! Phase registration and the per-tick execution loop.
//!
//! Phases are sorted by `order` once, at registration. Execution order
//! never depends on what happened in a previous phase or tick: a phase
//! that fails is logged, recorded, and skipped, and the tick carries on.

use serde::{Deserialize, Serialize};
use takeoff_agents::SimRng;
use takeoff_types::{Event, EventType, Severity, WorldState};
use tracing::{debug, error};

use crate::phase::{Phase, PhaseDescriptor, TickContext};

/// Errors raised while assembling the pipeline. Fatal before any tick.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// A phase with the same id is already registered.
    #[error("duplicate phase id: {id}")]
    DuplicatePhase {
        /// The repeated id.
        id: String,
    },

    /// The phase's order key is NaN or infinite.
    #[error("phase {id} has a non-finite order key: {order}")]
    InvalidOrder {
        /// The offending phase.
        id: String,
        /// The rejected order key.
        order: f64,
    },
}

/// A phase that returned an error during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseFailure {
    /// Id of the failed phase.
    pub phase_id: String,
    /// Rendered error.
    pub message: String,
}

/// Everything one tick produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// The month that was simulated.
    pub month: u64,
    /// Events from every phase, in execution order.
    pub events: Vec<Event>,
    /// Phases that failed, in execution order.
    pub failures: Vec<PhaseFailure>,
}

impl TickReport {
    /// Whether every phase succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of events of the given type.
    pub fn count_of(&self, event_type: EventType) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }
}

/// Runs a fixed, ordered set of phases once per tick.
#[derive(Default)]
pub struct PhaseOrchestrator {
    phases: Vec<Box<dyn Phase>>,
}

impl core::fmt::Debug for PhaseOrchestrator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PhaseOrchestrator")
            .field("phases", &self.execution_order())
            .finish()
    }
}

impl PhaseOrchestrator {
    /// Create an orchestrator with no phases.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a phase to the pipeline.
    ///
    /// Phases are kept sorted by `order`; ties keep registration order.
    pub fn register(&mut self, phase: Box<dyn Phase>) -> Result<(), OrchestratorError> {
        let descriptor = phase.descriptor();
        if !descriptor.order.is_finite() {
            return Err(OrchestratorError::InvalidOrder {
                id: descriptor.id.clone(),
                order: descriptor.order,
            });
        }
        if self
            .phases
            .iter()
            .any(|p| p.descriptor().id == descriptor.id)
        {
            return Err(OrchestratorError::DuplicatePhase {
                id: descriptor.id.clone(),
            });
        }

        debug!(
            phase = %descriptor.id,
            order = descriptor.order,
            "Phase registered"
        );
        self.phases.push(phase);
        self.phases
            .sort_by(|a, b| a.descriptor().order.total_cmp(&b.descriptor().order));
        Ok(())
    }

    /// Descriptors in execution order.
    pub fn execution_order(&self) -> Vec<PhaseDescriptor> {
        self.phases.iter().map(|p| p.descriptor().clone()).collect()
    }

    /// Number of registered phases.
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Whether no phases are registered.
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Run one tick: advance the month, clear the context, and execute
    /// every phase in order.
    pub fn run_tick(
        &self,
        state: &mut WorldState,
        rng: &mut SimRng,
        context: &mut TickContext,
    ) -> TickReport {
        state.month = state.month.saturating_add(1);
        context.clear();

        let month = state.month;
        let mut report = TickReport {
            month,
            ..TickReport::default()
        };

        for phase in &self.phases {
            let descriptor = phase.descriptor();
            match phase.execute(state, rng, context) {
                Ok(output) => {
                    debug!(
                        month,
                        phase = %descriptor.id,
                        events = output.events.len(),
                        "Phase complete"
                    );
                    report.events.extend(output.events);
                }
                Err(err) => {
                    error!(
                        month,
                        phase = %descriptor.id,
                        error = %err,
                        "Phase failed; continuing with remaining phases"
                    );
                    let message = err.to_string();
                    report.events.push(
                        Event::new(
                            month,
                            EventType::PhaseFailed,
                            Severity::Critical,
                            format!("phase {} failed: {message}", descriptor.id),
                        )
                        .with_details(serde_json::json!({ "phase": descriptor.id })),
                    );
                    report.failures.push(PhaseFailure {
                        phase_id: descriptor.id.clone(),
                        message,
                    });
                }
            }
        }
        report
    }
}
