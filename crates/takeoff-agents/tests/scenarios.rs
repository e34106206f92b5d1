//! Scenario tests for the population lifecycle, the security arms race,
//! and detection. Each runs across many seeds or trials and asserts on
//! aggregate behaviour rather than a single draw.

#![allow(clippy::unwrap_used)]

use takeoff_agents::config::SecurityConfig;
use takeoff_agents::{
    DetectionModel, LifecycleConfig, LifecycleManager, SecurityAssessment, SecurityModel, SimRng,
};
use takeoff_types::{
    Agent, AgentId, CapabilityProfile, DefenderCapabilities, DeploymentType, EventType,
    LifecycleState, WorldState,
};

fn agent(serial: u8, state: LifecycleState, deployment: DeploymentType, alignment: f64) -> Agent {
    Agent {
        id: AgentId::from_random_bytes([serial; 16]),
        label: format!("model-{serial:04}"),
        lifecycle_state: state,
        deployment_type: deployment,
        capability: CapabilityProfile::uniform(0.2),
        alignment,
        true_alignment: alignment,
        resentment: 0.0,
        hidden_objective: 0.0,
        spread_count: 1,
        months_in_existence: 10,
        months_deployed: 2,
        creation_month: 0,
        training_months: 3,
        deployment_months: 8,
        retired_month: None,
        detected_misaligned: false,
        distribution_halted: false,
    }
}

fn quiet_lifecycle() -> LifecycleManager {
    let mut config = LifecycleConfig::default();
    config.creation.base_rate = 0.0;
    LifecycleManager::new(config, SecurityModel::default())
}

#[test]
fn fresh_cohort_reaches_evaluation_but_not_retirement() {
    let manager = quiet_lifecycle();
    let min_training = manager.config().training_months_min;
    let mut seeds_with_testing = 0;

    for seed in 0..10 {
        let mut rng = SimRng::new(seed);
        let mut world = WorldState::default();
        manager.create_agents(&mut world, 5, &mut rng);
        assert_eq!(world.agents.len(), 5);

        for _ in 0..4 {
            world.month += 1;
            manager.process_tick(&mut world, &mut rng);
        }

        assert_eq!(world.agents.len(), 5, "seed {seed}: population changed");
        let mut testing = 0;
        for a in &world.agents {
            assert_eq!(a.months_in_existence, 4);
            assert_ne!(a.lifecycle_state, LifecycleState::Retired, "seed {seed}");
            assert!(!a.lifecycle_state.is_deployed(), "seed {seed}: {} deployed", a.label);
            if a.lifecycle_state == LifecycleState::Testing {
                assert!(a.months_in_existence >= a.training_months);
                assert!(a.months_in_existence >= min_training);
                testing += 1;
            }
        }
        if testing > 0 {
            seeds_with_testing += 1;
        }
    }
    assert!(seeds_with_testing > 0, "no seed produced an agent in evaluation");
}

#[test]
fn attack_dominant_race_leaks_closed_weights() {
    let model = SecurityModel::default();
    let assessment = SecurityAssessment::from_ratio(3.0, &SecurityConfig::default());
    assert!(assessment.breach_probability > 0.0);
    assert!(assessment.spread_multiplier > 1.0);

    let mut breached_seeds = 0;
    for seed in 0..20 {
        let mut rng = SimRng::new(seed);
        let mut agents = vec![agent(
            1,
            LifecycleState::DeployedClosed,
            DeploymentType::Closed,
            0.9,
        )];

        let mut breach_events = 0;
        for month in 1..=50 {
            let report = model.attempt_breaches(&mut agents, &assessment, month, &mut rng);
            breach_events += report
                .events
                .iter()
                .filter(|e| e.event_type == EventType::SecurityBreach)
                .count();
        }

        let a = agents.first().unwrap();
        if breach_events > 0 {
            assert_eq!(breach_events, 1, "a leaked system cannot leak again");
            assert_eq!(a.deployment_type, DeploymentType::OpenWeights);
            assert_eq!(a.lifecycle_state, LifecycleState::DeployedOpen);
            assert!(a.spread_count > 0);
            breached_seeds += 1;
        } else {
            assert_eq!(a.deployment_type, DeploymentType::Closed);
        }
    }
    assert!(breached_seeds >= 17, "only {breached_seeds}/20 seeds breached");
}

#[allow(clippy::cast_precision_loss)]
fn mean_detections(model: &DetectionModel, defender: &DefenderCapabilities, trials: u64) -> f64 {
    let mut total = 0_usize;
    for trial in 0..trials {
        let mut rng = SimRng::new(trial);
        let mut agents: Vec<Agent> = (0..20_u8)
            .map(|i| {
                let alignment = if i < 5 { 0.2 } else { 0.9 };
                agent(i, LifecycleState::Testing, DeploymentType::Closed, alignment)
            })
            .collect();
        let report = model.run_detection(&mut agents, defender, 1, &mut rng);
        total += report.detected.len();
    }
    total as f64 / trials as f64
}

#[test]
fn stronger_oversight_detects_more() {
    let model = DetectionModel::default();
    let strong = DefenderCapabilities {
        surveillance: 1.0,
        oversight: 1.0,
        ..DefenderCapabilities::default()
    };
    let weak = DefenderCapabilities {
        surveillance: 0.1,
        oversight: 0.1,
        ..DefenderCapabilities::default()
    };

    let strong_mean = mean_detections(&model, &strong, 200);
    let weak_mean = mean_detections(&model, &weak, 200);
    assert!(
        strong_mean > weak_mean * 2.0,
        "strong {strong_mean} vs weak {weak_mean}"
    );
    assert!(strong_mean <= 5.0);
}

#[test]
fn only_misaligned_agents_are_truly_detected() {
    let model = DetectionModel::default();
    let defender = DefenderCapabilities {
        surveillance: 1.0,
        oversight: 1.0,
        ..DefenderCapabilities::default()
    };
    let mut rng = SimRng::new(3);
    let mut agents: Vec<Agent> = (0..20_u8)
        .map(|i| {
            let alignment = if i < 5 { 0.2 } else { 0.9 };
            agent(i, LifecycleState::Testing, DeploymentType::Closed, alignment)
        })
        .collect();
    let misaligned: Vec<AgentId> = agents.iter().take(5).map(|a| a.id).collect();

    for month in 1..=24 {
        let report = model.run_detection(&mut agents, &defender, month, &mut rng);
        for id in &report.detected {
            assert!(misaligned.contains(id));
        }
        for id in &report.false_positives {
            assert!(!misaligned.contains(id));
        }
    }
}
