//! Simulation loop runner.
//!
//! This module provides [`run_simulation`], which drives ticks until one
//! of two conditions holds:
//!
//! - **Outcome reached**: the classifier returned a terminal verdict at or
//!   above the configured confidence threshold.
//! - **Tick limit**: `max_ticks` months have been simulated.
//!
//! The runner wraps [`PhaseOrchestrator::run_tick`] and adds the stop
//! conditions and a per-tick callback around it.

use serde::Serialize;
use takeoff_agents::SimRng;
use takeoff_types::{Outcome, OutcomeVerdict, WorldState};
use tracing::{info, warn};

use crate::config::SimulationBoundsConfig;
use crate::orchestrator::{PhaseOrchestrator, TickReport};
use crate::phase::TickContext;

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The orchestrator has no phases, so ticks would do nothing.
    #[error("cannot run a simulation with no registered phases")]
    EmptyPipeline,
}

/// Why the run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimulationEndReason {
    /// A terminal verdict reached the confidence threshold.
    OutcomeReached(Outcome),
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
}

/// Result of the simulation run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The verdict in force when the run stopped.
    pub verdict: OutcomeVerdict,
    /// The last tick report, if any tick ran.
    pub final_report: Option<TickReport>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// Total phase failures across the run.
    pub phase_failures: u64,
}

/// Callback invoked after each tick completes.
pub trait TickCallback {
    /// Called after every tick with its report and the updated world.
    fn on_tick(&mut self, report: &TickReport, state: &WorldState);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _report: &TickReport, _state: &WorldState) {}
}

/// Run the simulation loop until a stop condition is met.
///
/// # Errors
///
/// Returns [`RunnerError::EmptyPipeline`] if no phases are registered.
pub fn run_simulation(
    state: &mut WorldState,
    orchestrator: &PhaseOrchestrator,
    rng: &mut SimRng,
    bounds: &SimulationBoundsConfig,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    if orchestrator.is_empty() {
        return Err(RunnerError::EmptyPipeline);
    }

    info!(
        max_ticks = bounds.max_ticks,
        confidence_threshold = bounds.outcome_confidence_threshold,
        seed = rng.seed(),
        agents = state.agents.len(),
        "Simulation starting"
    );

    let mut context = TickContext::new();
    let mut final_report: Option<TickReport> = None;
    let mut total_ticks: u64 = 0;
    let mut phase_failures: u64 = 0;

    while total_ticks < bounds.max_ticks {
        let report = orchestrator.run_tick(state, rng, &mut context);
        total_ticks = total_ticks.saturating_add(1);
        phase_failures = phase_failures.saturating_add(report.failures.len() as u64);
        if !report.is_clean() {
            warn!(
                month = report.month,
                failures = report.failures.len(),
                "Tick completed with phase failures"
            );
        }

        callback.on_tick(&report, state);
        final_report = Some(report);

        let verdict = &state.outcome;
        if verdict.outcome.is_terminal()
            && verdict.confidence >= bounds.outcome_confidence_threshold
        {
            info!(
                month = state.month,
                outcome = %verdict.outcome,
                confidence = verdict.confidence,
                reason = %verdict.reason,
                "Terminal outcome reached"
            );
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::OutcomeReached(verdict.outcome),
                verdict: verdict.clone(),
                final_report,
                total_ticks,
                phase_failures,
            });
        }
    }

    info!(
        month = state.month,
        max_ticks = bounds.max_ticks,
        "Tick limit reached"
    );
    Ok(SimulationResult {
        end_reason: SimulationEndReason::MaxTicksReached,
        verdict: state.outcome.clone(),
        final_report,
        total_ticks,
        phase_failures,
    })
}

/// Log the simulation end.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        outcome = %result.verdict.outcome,
        confidence = result.verdict.confidence,
        phase_failures = result.phase_failures,
        final_month = result.final_report.as_ref().map(|r| r.month),
        "Simulation ended"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::phase::{Phase, PhaseDescriptor, PhaseError, PhaseOutput};

    /// Declares the given verdict on the month it is told to.
    struct Declare {
        descriptor: PhaseDescriptor,
        at_month: u64,
        verdict: OutcomeVerdict,
    }

    impl Phase for Declare {
        fn descriptor(&self) -> &PhaseDescriptor {
            &self.descriptor
        }

        fn execute(
            &self,
            state: &mut WorldState,
            _rng: &mut SimRng,
            _context: &mut TickContext,
        ) -> Result<PhaseOutput, PhaseError> {
            if state.month == self.at_month {
                state.outcome = self.verdict.clone();
            }
            Ok(PhaseOutput::empty())
        }
    }

    struct Counter(u64);

    impl TickCallback for Counter {
        fn on_tick(&mut self, _report: &TickReport, _state: &WorldState) {
            self.0 += 1;
        }
    }

    fn pipeline(at_month: u64, outcome: Outcome, confidence: f64) -> PhaseOrchestrator {
        let mut o = PhaseOrchestrator::new();
        o.register(Box::new(Declare {
            descriptor: PhaseDescriptor::new("declare", "declare", 1.0),
            at_month,
            verdict: OutcomeVerdict {
                outcome,
                reason: String::from("test"),
                confidence,
            },
        }))
        .unwrap();
        o
    }

    fn bounds(max_ticks: u64) -> SimulationBoundsConfig {
        SimulationBoundsConfig {
            max_ticks,
            ..SimulationBoundsConfig::default()
        }
    }

    #[test]
    fn stops_at_tick_limit() {
        let o = pipeline(u64::MAX, Outcome::Active, 0.0);
        let mut state = WorldState::default();
        let mut counter = Counter(0);
        let result =
            run_simulation(&mut state, &o, &mut SimRng::new(1), &bounds(7), &mut counter).unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 7);
        assert_eq!(counter.0, 7);
        assert_eq!(state.month, 7);
    }

    #[test]
    fn stops_on_confident_terminal_outcome() {
        let o = pipeline(4, Outcome::Extinction, 0.95);
        let mut state = WorldState::default();
        let result =
            run_simulation(&mut state, &o, &mut SimRng::new(1), &bounds(100), &mut NoOpCallback)
                .unwrap();
        assert_eq!(
            result.end_reason,
            SimulationEndReason::OutcomeReached(Outcome::Extinction)
        );
        assert_eq!(result.total_ticks, 4);
    }

    #[test]
    fn low_confidence_verdict_does_not_stop() {
        let o = pipeline(2, Outcome::Dystopia, 0.5);
        let mut state = WorldState::default();
        let result =
            run_simulation(&mut state, &o, &mut SimRng::new(1), &bounds(10), &mut NoOpCallback)
                .unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.verdict.outcome, Outcome::Dystopia);
    }

    #[test]
    fn empty_pipeline_rejected() {
        let mut state = WorldState::default();
        let err = run_simulation(
            &mut state,
            &PhaseOrchestrator::new(),
            &mut SimRng::new(1),
            &bounds(10),
            &mut NoOpCallback,
        )
        .unwrap_err();
        assert!(matches!(err, RunnerError::EmptyPipeline));
    }
}
