//! Tick callback that reports each tick through `tracing`.
//!
//! Events are logged at the level matching their severity. A compact
//! per-tick line goes out at `debug`, and a population heartbeat every
//! `heartbeat_months` months at `info`.

use takeoff_core::{TickCallback, TickReport};
use takeoff_types::{Event, Severity, WorldState};
use tracing::{debug, error, info, warn};

/// Months between population heartbeats when none is configured.
pub const DEFAULT_HEARTBEAT_MONTHS: u64 = 12;

/// Callback that bridges the tick cycle to structured logs.
pub struct LoggingCallback {
    heartbeat_months: u64,
    events_logged: u64,
}

impl LoggingCallback {
    /// Create a callback emitting a heartbeat every `heartbeat_months`
    /// months. Zero disables the heartbeat.
    pub const fn new(heartbeat_months: u64) -> Self {
        Self {
            heartbeat_months,
            events_logged: 0,
        }
    }

    /// Total events logged so far.
    pub const fn events_logged(&self) -> u64 {
        self.events_logged
    }
}

impl Default for LoggingCallback {
    fn default() -> Self {
        Self::new(DEFAULT_HEARTBEAT_MONTHS)
    }
}

fn log_event(event: &Event) {
    let agents = event.impacted_agents.len();
    match event.severity {
        Severity::Info => debug!(
            month = event.month,
            event_type = ?event.event_type,
            agents,
            "{}",
            event.description
        ),
        Severity::Warning => warn!(
            month = event.month,
            event_type = ?event.event_type,
            agents,
            "{}",
            event.description
        ),
        Severity::Critical => error!(
            month = event.month,
            event_type = ?event.event_type,
            agents,
            details = %event.details,
            "{}",
            event.description
        ),
    }
}

impl TickCallback for LoggingCallback {
    fn on_tick(&mut self, report: &TickReport, state: &WorldState) {
        for event in &report.events {
            log_event(event);
        }
        self.events_logged = self
            .events_logged
            .saturating_add(report.events.len() as u64);

        let metrics = &state.metrics;
        debug!(
            month = report.month,
            events = report.events.len(),
            failures = report.failures.len(),
            active = metrics.population.active(),
            frontier = state.frontier_capability,
            "Tick complete"
        );

        if report.month.checked_rem(self.heartbeat_months) == Some(0) {
            info!(
                month = report.month,
                training = metrics.population.training,
                testing = metrics.population.testing,
                deployed_closed = metrics.population.deployed_closed,
                deployed_open = metrics.population.deployed_open,
                retired = metrics.population.retired,
                total_spread = metrics.total_spread,
                escaped = metrics.escaped_count,
                effective_control = metrics.effective_control,
                outcome = %state.outcome.outcome,
                "Population heartbeat"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use takeoff_types::EventType;

    fn report(month: u64, events: usize) -> TickReport {
        TickReport {
            month,
            events: (0..events)
                .map(|_| Event::new(month, EventType::AgentCreated, Severity::Info, "created"))
                .collect(),
            failures: Vec::new(),
        }
    }

    #[test]
    fn counts_logged_events() {
        let mut callback = LoggingCallback::default();
        let state = WorldState::default();
        callback.on_tick(&report(1, 3), &state);
        callback.on_tick(&report(2, 0), &state);
        callback.on_tick(&report(3, 2), &state);
        assert_eq!(callback.events_logged(), 5);
    }

    #[test]
    fn zero_heartbeat_is_accepted() {
        let mut callback = LoggingCallback::new(0);
        callback.on_tick(&report(12, 1), &WorldState::default());
        assert_eq!(callback.events_logged(), 1);
    }
}
