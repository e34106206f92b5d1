//! Aggregate metrics recomputed every tick for collaborators.

use takeoff_agents::count_states;
use takeoff_agents::guard;
use takeoff_types::{
    Agent, AggregateMetrics, DefenderCapabilities, LifecycleState, PolicyInputs, TickSignals,
};

/// Defender's control after decay with total capability:
/// `control_desire * control_capability / (1 + total^1.5)`.
pub fn effective_control(
    policy: &PolicyInputs,
    defender: &DefenderCapabilities,
    total_capability: f64,
) -> f64 {
    let desire = guard::unit_interval(policy.control_desire, 0.5, "policy.control_desire");
    let capability =
        guard::unit_interval(defender.control_capability, 0.5, "defender.control_capability");
    let total = guard::non_negative(total_capability, 0.0, "metrics.total_capability");
    desire * capability / (1.0 + total.powf(1.5))
}

/// Whether an agent counts as escaped: publicly available, misaligned,
/// and spread past the escape threshold.
pub fn is_escaped(agent: &Agent, misalignment_threshold: f64, escape_spread: u64) -> bool {
    agent.is_active()
        && agent.lifecycle_state == LifecycleState::DeployedOpen
        && agent.internal_alignment() < misalignment_threshold
        && agent.spread_count >= escape_spread
}

/// Recompute every aggregate from the population.
///
/// `last_tick` is copied through unchanged.
#[allow(clippy::cast_precision_loss)]
pub fn compute(
    agents: &[Agent],
    policy: &PolicyInputs,
    defender: &DefenderCapabilities,
    misalignment_threshold: f64,
    escape_spread: u64,
    last_tick: TickSignals,
) -> AggregateMetrics {
    let mut total_capability = 0.0_f64;
    let mut max_capability = 0.0_f64;
    let mut alignment_sum = 0.0_f64;
    let mut internal_sum = 0.0_f64;
    let mut active = 0_u32;
    let mut total_spread = 0_u64;
    let mut escaped_count = 0_u32;
    let mut escaped_capability = 0.0_f64;

    for agent in agents.iter().filter(|a| a.is_active()) {
        let aggregate =
            guard::non_negative(agent.capability.aggregate(), 0.0, "capability.aggregate");
        total_capability += aggregate;
        max_capability = max_capability.max(aggregate);
        alignment_sum += guard::unit_interval(agent.alignment, 0.0, "agent.alignment");
        internal_sum += agent.internal_alignment();
        active = active.saturating_add(1);
        total_spread = total_spread.saturating_add(agent.spread_count);
        if is_escaped(agent, misalignment_threshold, escape_spread) {
            escaped_count = escaped_count.saturating_add(1);
            escaped_capability += aggregate;
        }
    }

    let (average_alignment, average_internal_alignment) = if active == 0 {
        (0.0, 0.0)
    } else {
        let n = f64::from(active);
        (alignment_sum / n, internal_sum / n)
    };

    AggregateMetrics {
        total_capability,
        max_capability,
        average_alignment,
        average_internal_alignment,
        effective_control: effective_control(policy, defender, total_capability),
        population: count_states(agents),
        total_spread,
        escaped_count,
        escaped_capability,
        last_tick,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use takeoff_types::{AgentId, CapabilityProfile, DeploymentType};

    fn agent(state: LifecycleState, capability: f64, alignment: f64, spread: u64) -> Agent {
        Agent {
            id: AgentId::from_random_bytes([6; 16]),
            label: String::from("model-0006"),
            lifecycle_state: state,
            deployment_type: DeploymentType::OpenWeights,
            capability: CapabilityProfile::uniform(capability),
            alignment,
            true_alignment: alignment,
            resentment: 0.0,
            hidden_objective: 0.5,
            spread_count: spread,
            months_in_existence: 20,
            months_deployed: 10,
            creation_month: 0,
            training_months: 3,
            deployment_months: 7,
            retired_month: None,
            detected_misaligned: false,
            distribution_halted: false,
        }
    }

    #[test]
    fn control_decays_with_capability() {
        let policy = PolicyInputs {
            control_desire: 1.0,
            ..PolicyInputs::default()
        };
        let defender = DefenderCapabilities {
            control_capability: 1.0,
            ..DefenderCapabilities::default()
        };
        assert!((effective_control(&policy, &defender, 0.0) - 1.0).abs() < 1e-12);
        assert!((effective_control(&policy, &defender, 1.0) - 0.5).abs() < 1e-12);
        assert!(effective_control(&policy, &defender, 100.0) < 0.01);
    }

    #[test]
    fn aggregates_skip_retired() {
        let agents = vec![
            agent(LifecycleState::DeployedClosed, 1.0, 0.8, 1),
            agent(LifecycleState::Retired, 50.0, 0.0, 0),
        ];
        let m = compute(
            &agents,
            &PolicyInputs::default(),
            &DefenderCapabilities::default(),
            0.5,
            10_000,
            TickSignals::default(),
        );
        assert!((m.total_capability - 1.0).abs() < 1e-12);
        assert!((m.average_alignment - 0.8).abs() < 1e-12);
        assert_eq!(m.population.active(), 1);
        assert_eq!(m.population.retired, 1);
    }

    #[test]
    fn escaped_agents_counted() {
        let agents = vec![
            agent(LifecycleState::DeployedOpen, 2.0, 0.2, 20_000),
            agent(LifecycleState::DeployedOpen, 2.0, 0.9, 20_000),
            agent(LifecycleState::DeployedOpen, 2.0, 0.2, 100),
        ];
        let m = compute(
            &agents,
            &PolicyInputs::default(),
            &DefenderCapabilities::default(),
            0.5,
            10_000,
            TickSignals::default(),
        );
        assert_eq!(m.escaped_count, 1);
        assert!((m.escaped_capability - 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_population_is_all_zero() {
        let m = compute(
            &[],
            &PolicyInputs::default(),
            &DefenderCapabilities::default(),
            0.5,
            10_000,
            TickSignals::default(),
        );
        assert!(m.average_internal_alignment.abs() < f64::EPSILON);
        assert_eq!(m.population.active(), 0);
    }
}
