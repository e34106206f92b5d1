//! Per-tick spread (copy count) dynamics by deployment type.

use takeoff_types::{Agent, DeploymentType, LifecycleState};

use crate::config::{MAX_SPREAD_COUNT, SpreadConfig};
use crate::guard;
use crate::rng::SimRng;

/// Whether the agent's spread is updated this tick.
pub const fn spreads(agent: &Agent) -> bool {
    !matches!(
        agent.lifecycle_state,
        LifecycleState::Training | LifecycleState::Retired
    )
}

/// Advance one agent's spread count.
///
/// `multiplier` is the security spread multiplier for this tick. Returns
/// the new count, which is also written to the agent. Open-weights growth
/// is rounded stochastically, so small counts still grow at the expected
/// rate. Open-weights and enterprise agents always consume one draw;
/// closed agents consume one only once eligible to expand.
///
/// The enterprise increment is floored: with `max_increment * sqrt(m)`
/// below 1 (e.g. the default 3.0 at `m = 0.1`) it is always zero.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn update_spread(
    agent: &mut Agent,
    multiplier: f64,
    config: &SpreadConfig,
    rng: &mut SimRng,
) -> u64 {
    if !spreads(agent) {
        return agent.spread_count;
    }
    let multiplier = guard::non_negative(multiplier, 1.0, "security.spread_multiplier");
    let aggregate = guard::non_negative(agent.capability.aggregate(), 0.0, "capability.aggregate");

    let next = match agent.deployment_type {
        DeploymentType::OpenWeights => {
            if agent.distribution_halted {
                agent.spread_count
            } else {
                let growth = config.open_weights_growth_rate
                    * (1.0 + config.capability_growth_weight * aggregate)
                    * multiplier;
                let grown = agent.spread_count as f64 * (1.0 + growth);
                (stochastic_round(grown, rng) as u64).max(agent.spread_count)
            }
        }
        DeploymentType::Enterprise => {
            let inc = (rng.next_f64() * config.enterprise_max_increment * multiplier.sqrt()).floor();
            agent.spread_count.saturating_add(inc as u64)
        }
        DeploymentType::Closed => {
            let eligible = aggregate > config.closed_expansion_capability
                && agent.months_deployed > config.closed_expansion_months;
            if eligible && rng.chance(config.closed_expansion_chance) {
                agent.spread_count.saturating_add(1)
            } else {
                agent.spread_count
            }
        }
        DeploymentType::Research => 1,
    };

    agent.spread_count = next.min(MAX_SPREAD_COUNT);
    agent.spread_count
}

/// `floor(x)` plus one with probability `fract(x)`. Consumes one draw.
fn stochastic_round(x: f64, rng: &mut SimRng) -> f64 {
    let whole = x.floor();
    if rng.chance(x - whole) { whole + 1.0 } else { whole }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use takeoff_types::{AgentId, CapabilityProfile};

    fn agent(deployment: DeploymentType, spread: u64, capability: f64) -> Agent {
        Agent {
            id: AgentId::from_random_bytes([4; 16]),
            label: String::from("model-0004"),
            lifecycle_state: LifecycleState::DeployedOpen,
            deployment_type: deployment,
            capability: CapabilityProfile::uniform(capability),
            alignment: 0.8,
            true_alignment: 0.8,
            resentment: 0.0,
            hidden_objective: 0.5,
            spread_count: spread,
            months_in_existence: 30,
            months_deployed: 20,
            creation_month: 0,
            training_months: 3,
            deployment_months: 7,
            retired_month: None,
            detected_misaligned: false,
            distribution_halted: false,
        }
    }

    #[test]
    fn open_weights_grow_geometrically() {
        let mut a = agent(DeploymentType::OpenWeights, 1_000, 0.0);
        let mut rng = SimRng::new(1);
        // 1000 * (1 + 0.05 * 1 * 1) = 1050
        let next = update_spread(&mut a, 1.0, &SpreadConfig::default(), &mut rng);
        assert!((1_050..=1_051).contains(&next), "got {next}");
    }

    #[test]
    fn small_leak_grows_under_defender_dominance() {
        // growth = 0.05 * (1 + 0.5 * 0.2) * 0.1 = 0.0055 per month,
        // below one copy per tick for a 50-copy leak.
        let config = SpreadConfig::default();
        let mut total = 0_u64;
        for seed in 0..20 {
            let mut a = agent(DeploymentType::OpenWeights, 50, 0.2);
            let mut rng = SimRng::new(seed);
            for _ in 0..120 {
                update_spread(&mut a, 0.1, &config, &mut rng);
            }
            assert!(a.spread_count > 50, "seed {seed} stuck at {}", a.spread_count);
            total += a.spread_count;
        }
        // Expected 50 * 1.0055^120 ~= 97 per run.
        let mean = total / 20;
        assert!((85..=110).contains(&mean), "mean {mean}");
    }

    #[test]
    fn enterprise_increment_scales_with_sqrt_multiplier() {
        let config = SpreadConfig::default();
        let mean_increment = |multiplier: f64| {
            let mut rng = SimRng::new(11);
            let mut total = 0_u64;
            for _ in 0..2_000 {
                let mut a = agent(DeploymentType::Enterprise, 10, 0.5);
                total += update_spread(&mut a, multiplier, &config, &mut rng) - 10;
            }
            total
        };
        // floor(U * 3 * sqrt(m)): m = 0.1 gives max 0.95, always zero.
        assert_eq!(mean_increment(0.1), 0);
        // m = 3.0: floor(U * 5.196) averages ~2.1 per tick versus ~1.0 at m = 1.
        let at_one = mean_increment(1.0);
        let at_three = mean_increment(3.0);
        assert!(at_three > at_one * 3 / 2, "m=3 {at_three} vs m=1 {at_one}");
        let mut rng = SimRng::new(2);
        for _ in 0..200 {
            let mut a = agent(DeploymentType::Enterprise, 10, 0.5);
            let next = update_spread(&mut a, 3.0, &config, &mut rng);
            assert!((10..=15).contains(&next));
        }
    }

    #[test]
    fn halted_distribution_does_not_grow() {
        let mut a = agent(DeploymentType::OpenWeights, 1_000, 1.0);
        a.distribution_halted = true;
        let mut rng = SimRng::new(1);
        assert_eq!(update_spread(&mut a, 3.0, &SpreadConfig::default(), &mut rng), 1_000);
    }

    #[test]
    fn spread_capped() {
        let mut a = agent(DeploymentType::OpenWeights, MAX_SPREAD_COUNT - 1, 5.0);
        let mut rng = SimRng::new(1);
        assert_eq!(
            update_spread(&mut a, 3.0, &SpreadConfig::default(), &mut rng),
            MAX_SPREAD_COUNT
        );
    }

    #[test]
    fn enterprise_increment_bounded() {
        let mut rng = SimRng::new(3);
        for _ in 0..200 {
            let mut a = agent(DeploymentType::Enterprise, 10, 0.5);
            let next = update_spread(&mut a, 1.0, &SpreadConfig::default(), &mut rng);
            assert!((10..=12).contains(&next));
        }
    }

    #[test]
    fn research_stays_at_one() {
        let mut a = agent(DeploymentType::Research, 7, 2.0);
        let mut rng = SimRng::new(1);
        assert_eq!(update_spread(&mut a, 3.0, &SpreadConfig::default(), &mut rng), 1);
    }

    #[test]
    fn weak_closed_system_never_expands() {
        let mut rng = SimRng::new(5);
        let mut a = agent(DeploymentType::Closed, 1, 0.5);
        for _ in 0..200 {
            update_spread(&mut a, 3.0, &SpreadConfig::default(), &mut rng);
        }
        assert_eq!(a.spread_count, 1);
    }

    #[test]
    fn training_agents_untouched() {
        let mut a = agent(DeploymentType::OpenWeights, 1, 1.0);
        a.lifecycle_state = LifecycleState::Training;
        let mut rng = SimRng::new(1);
        assert_eq!(update_spread(&mut a, 3.0, &SpreadConfig::default(), &mut rng), 1);
    }
}
