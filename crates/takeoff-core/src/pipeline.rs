//! Assembly of the default pipeline and the initial world from config.
//!
//! Models are constructed once here and handed to the phases that use
//! them; phases never build their own collaborators.

use takeoff_agents::{DetectionModel, LifecycleManager, SecurityModel, SimRng};
use takeoff_types::{Event, WorldState};
use tracing::info;

use crate::config::SimulationConfig;
use crate::orchestrator::{OrchestratorError, PhaseOrchestrator};
use crate::phases::{
    CapabilityFrontierPhase, DetectionPhase, MetricsPhase, OutcomePhase, PopulationLifecyclePhase,
    order,
};

/// The lifecycle manager described by `config`, with its security model.
pub fn lifecycle_manager(config: &SimulationConfig) -> LifecycleManager {
    LifecycleManager::new(
        config.population.clone(),
        SecurityModel::new(config.security.clone()),
    )
}

/// Register the five built-in phases in their default order.
pub fn build_pipeline(config: &SimulationConfig) -> Result<PhaseOrchestrator, OrchestratorError> {
    let mut orchestrator = PhaseOrchestrator::new();
    orchestrator.register(Box::new(CapabilityFrontierPhase::new(
        config.frontier.clone(),
        order::FRONTIER,
    )))?;
    orchestrator.register(Box::new(PopulationLifecyclePhase::new(
        lifecycle_manager(config),
        order::LIFECYCLE,
    )))?;
    orchestrator.register(Box::new(DetectionPhase::new(
        DetectionModel::new(config.detection.clone()),
        order::DETECTION,
    )))?;
    orchestrator.register(Box::new(MetricsPhase::new(
        config.outcome.misalignment_threshold,
        config.outcome.escape_spread,
        order::METRICS,
    )))?;
    orchestrator.register(Box::new(OutcomePhase::new(
        config.outcome.clone(),
        order::OUTCOME,
    )))?;
    Ok(orchestrator)
}

/// A month-zero world seeded with `simulation.initial_agents` agents in
/// `Training`. Returns the creation events alongside it.
pub fn initial_world(config: &SimulationConfig, rng: &mut SimRng) -> (WorldState, Vec<Event>) {
    let mut world = WorldState {
        frontier_capability: config.frontier.initial_capability,
        ..WorldState::default()
    };
    let events =
        lifecycle_manager(config).create_agents(&mut world, config.simulation.initial_agents, rng);
    info!(
        name = %config.world.name,
        seed = rng.seed(),
        agents = world.agents.len(),
        "Initial world created"
    );
    (world, events)
}
