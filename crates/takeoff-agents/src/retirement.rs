//! Retirement hazard for long-deployed agents.

use takeoff_types::Agent;

use crate::config::RetirementConfig;
use crate::guard;

/// Monthly probability that `agent` is retired.
///
/// Zero until the agent has been deployed for `min_deployed_months`.
/// After that the base hazard grows linearly with age, and doubles when
/// the agent has fallen below the obsolescence ratio of the population's
/// mean capability.
pub fn retirement_hazard(agent: &Agent, population_mean: f64, config: &RetirementConfig) -> f64 {
    if !agent.lifecycle_state.is_deployed() || agent.months_deployed < config.min_deployed_months {
        return 0.0;
    }
    let over = f64::from(agent.months_deployed.saturating_sub(config.min_deployed_months));
    let age_multiplier = 1.0 + over / config.age_ramp_months;

    let mean = guard::non_negative(population_mean, 0.0, "population.mean_capability");
    let aggregate = guard::non_negative(agent.capability.aggregate(), 0.0, "capability.aggregate");
    let obsolescence = if mean > 0.0 && aggregate < config.obsolescence_ratio * mean {
        config.obsolescence_multiplier
    } else {
        1.0
    };

    guard::unit_interval(
        config.base_hazard * age_multiplier * obsolescence,
        0.0,
        "retirement.hazard",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use takeoff_types::{AgentId, CapabilityProfile, DeploymentType, LifecycleState};

    fn deployed(months_deployed: u32, capability: f64) -> Agent {
        Agent {
            id: AgentId::from_random_bytes([5; 16]),
            label: String::from("model-0005"),
            lifecycle_state: LifecycleState::DeployedClosed,
            deployment_type: DeploymentType::Closed,
            capability: CapabilityProfile::uniform(capability),
            alignment: 0.8,
            true_alignment: 0.8,
            resentment: 0.0,
            hidden_objective: 0.5,
            spread_count: 1,
            months_in_existence: months_deployed.saturating_add(7),
            months_deployed,
            creation_month: 0,
            training_months: 3,
            deployment_months: 7,
            retired_month: None,
            detected_misaligned: false,
            distribution_halted: false,
        }
    }

    #[test]
    fn young_agents_never_retire() {
        let config = RetirementConfig::default();
        assert!(retirement_hazard(&deployed(23, 1.0), 1.0, &config).abs() < f64::EPSILON);
    }

    #[test]
    fn hazard_at_minimum_age_is_base() {
        let config = RetirementConfig::default();
        assert!((retirement_hazard(&deployed(24, 1.0), 1.0, &config) - 0.02).abs() < 1e-12);
    }

    #[test]
    fn hazard_grows_with_age() {
        let config = RetirementConfig::default();
        // 1 + 12/12 = 2
        assert!((retirement_hazard(&deployed(36, 1.0), 1.0, &config) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn obsolete_agents_retire_faster() {
        let config = RetirementConfig::default();
        let h = retirement_hazard(&deployed(24, 0.4), 1.0, &config);
        assert!((h - 0.04).abs() < 1e-12);
    }

    #[test]
    fn training_agents_have_no_hazard() {
        let config = RetirementConfig::default();
        let mut a = deployed(40, 1.0);
        a.lifecycle_state = LifecycleState::Testing;
        assert!(retirement_hazard(&a, 1.0, &config).abs() < f64::EPSILON);
    }
}
