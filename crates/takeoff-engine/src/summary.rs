//! End-of-run summary printed to stdout as JSON.

use serde::Serialize;
use takeoff_core::{SimulationEndReason, SimulationResult};
use takeoff_types::{AggregateMetrics, OutcomeVerdict, WorldState};

/// What a finished run reports.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Run name from `world.name`.
    pub name: String,
    /// Seed the run was started with.
    pub seed: u64,
    /// Why the run stopped.
    pub end_reason: SimulationEndReason,
    /// Months simulated.
    pub total_ticks: u64,
    /// Final world month.
    pub final_month: u64,
    /// The verdict in force at the end.
    pub verdict: OutcomeVerdict,
    /// Metrics as of the last tick.
    pub metrics: AggregateMetrics,
    /// Agents ever created, including ones since purged.
    pub agents_created: u64,
    /// Agents still held in the world, retired ones included.
    pub agents_tracked: usize,
    /// Phase failures across the run.
    pub phase_failures: u64,
    /// Events logged by the tick callback.
    pub events_logged: u64,
}

impl RunSummary {
    /// Collect the summary from the run result and final world.
    pub fn new(
        name: &str,
        seed: u64,
        result: &SimulationResult,
        state: &WorldState,
        events_logged: u64,
    ) -> Self {
        Self {
            name: name.to_owned(),
            seed,
            end_reason: result.end_reason,
            total_ticks: result.total_ticks,
            final_month: state.month,
            verdict: result.verdict.clone(),
            metrics: state.metrics,
            agents_created: state.next_agent_serial,
            agents_tracked: state.agents.len(),
            phase_failures: result.phase_failures,
            events_logged,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use takeoff_types::Outcome;

    #[test]
    fn summary_serializes_end_reason_and_verdict() {
        // Five created, one since purged.
        let state = WorldState {
            month: 30,
            next_agent_serial: 5,
            agents: vec![takeoff_types::Agent {
                id: takeoff_types::AgentId::from_random_bytes([1; 16]),
                label: String::from("model-0001"),
                lifecycle_state: takeoff_types::LifecycleState::Training,
                deployment_type: takeoff_types::DeploymentType::Closed,
                capability: takeoff_types::CapabilityProfile::uniform(0.1),
                alignment: 0.8,
                true_alignment: 0.8,
                resentment: 0.0,
                hidden_objective: 0.2,
                spread_count: 1,
                months_in_existence: 2,
                months_deployed: 0,
                creation_month: 28,
                training_months: 3,
                deployment_months: 7,
                retired_month: None,
                detected_misaligned: false,
                distribution_halted: false,
            }; 4],
            ..WorldState::default()
        };
        let result = SimulationResult {
            end_reason: SimulationEndReason::OutcomeReached(Outcome::Dystopia),
            verdict: OutcomeVerdict {
                outcome: Outcome::Dystopia,
                reason: String::from("sustained control"),
                confidence: 0.8,
            },
            final_report: None,
            total_ticks: 30,
            phase_failures: 0,
        };
        let summary = RunSummary::new("Takeoff", 42, &result, &state, 7);
        let value: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(value["seed"], 42);
        assert_eq!(value["final_month"], 30);
        assert_eq!(value["events_logged"], 7);
        assert_eq!(value["agents_created"], 5);
        assert_eq!(value["agents_tracked"], 4);
        assert_eq!(value["end_reason"]["OutcomeReached"], "Dystopia");
        assert_eq!(value["verdict"]["reason"], "sustained control");
    }
}
