//! The population lifecycle manager.
//!
//! [`LifecycleManager::process_tick`] runs the monthly population update in
//! a fixed sequence:
//!
//! 1. Age every active agent and drift its resentment.
//! 2. Attempt one lifecycle transition per agent.
//! 3. Update spread counts, then roll for breaches on closed systems.
//! 4. Roll for retirement.
//! 5. Purge agents retired longer than the retention window.
//! 6. Repair broken invariants and compute remaining capacity.
//! 7. Create new agents into the remaining capacity.
//!
//! Agents created in step 7 are first aged and transitioned on the next
//! tick.

use takeoff_types::{
    Agent, DeploymentType, Event, EventType, LifecycleState, Severity, StateCounts, WorldState,
};
use tracing::{debug, info, warn};

use crate::config::{LifecycleConfig, MAX_SPREAD_COUNT};
use crate::factory::{self, CreationContext};
use crate::guard;
use crate::retirement::retirement_hazard;
use crate::rng::SimRng;
use crate::security::{SecurityAssessment, SecurityModel};
use crate::spread;

/// Resentment growth multiplier for agents with an anti-aligned objective.
const ANTI_ALIGNED_RESENTMENT_FACTOR: f64 = 2.0;

/// Summary of one lifecycle tick.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleReport {
    /// Events emitted, in the order the steps ran.
    pub events: Vec<Event>,
    /// Agents created in step 7.
    pub created: u32,
    /// Agents that entered `Testing`.
    pub started_testing: u32,
    /// Agents that were deployed.
    pub deployed: u32,
    /// Successful breaches.
    pub breaches: u32,
    /// Agents retired by hazard.
    pub retired: u32,
    /// Retired agents dropped from memory.
    pub purged: u32,
    /// Invariant violations repaired.
    pub corrections: u32,
    /// Whether creation was throttled to zero by the cap.
    pub cap_reached: bool,
    /// The arms-race assessment used for spread and breaches.
    pub security: SecurityAssessment,
    /// Population by state after the tick.
    pub counts: StateCounts,
}

/// Count agents by lifecycle state.
pub fn count_states(agents: &[Agent]) -> StateCounts {
    let mut counts = StateCounts::default();
    for agent in agents {
        let slot = match agent.lifecycle_state {
            LifecycleState::Training => &mut counts.training,
            LifecycleState::Testing => &mut counts.testing,
            LifecycleState::DeployedClosed => &mut counts.deployed_closed,
            LifecycleState::DeployedOpen => &mut counts.deployed_open,
            LifecycleState::Retired => &mut counts.retired,
        };
        *slot = slot.saturating_add(1);
    }
    counts
}

/// Move an agent to `Retired`, zeroing its spread.
pub fn retire(agent: &mut Agent, month: u64) {
    agent.lifecycle_state = LifecycleState::Retired;
    agent.spread_count = 0;
    agent.retired_month = Some(month);
}

/// Owns population dynamics: creation, aging, transitions, spread,
/// retirement, and memory reclamation.
#[derive(Debug, Clone, Default)]
pub struct LifecycleManager {
    config: LifecycleConfig,
    security: SecurityModel,
}

impl LifecycleManager {
    /// Create a manager with the given parameters and security model.
    pub const fn new(config: LifecycleConfig, security: SecurityModel) -> Self {
        Self { config, security }
    }

    /// The manager's parameters.
    pub const fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// The injected security model.
    pub const fn security(&self) -> &SecurityModel {
        &self.security
    }

    /// Run one month of population dynamics.
    pub fn process_tick(&self, state: &mut WorldState, rng: &mut SimRng) -> LifecycleReport {
        let month = state.month;
        let mut events = Vec::new();

        self.age_agents(state);
        let (started_testing, deployed) = self.transition_agents(state, rng, &mut events);

        let security = self.security.assess(&state.agents, &state.defender);
        for agent in &mut state.agents {
            spread::update_spread(agent, security.spread_multiplier, &self.config.spread, rng);
        }
        let breach = self
            .security
            .attempt_breaches(&mut state.agents, &security, month, rng);
        let breaches = count_u32(breach.breached.len());
        events.extend(breach.events);

        let retired = self.retire_agents(state, rng, &mut events);
        let purged = self.purge_retired(state, &mut events);
        let corrections = self.repair_invariants(state, &mut events);

        let remaining = self.remaining_capacity(state);
        let cap_reached = remaining == 0;
        let created = if cap_reached {
            debug!(
                month,
                max_population = self.config.max_population,
                "Population cap reached; creation throttled"
            );
            events.push(Event::new(
                month,
                EventType::PopulationCapReached,
                Severity::Info,
                format!(
                    "Population at cap of {}; no new systems this month",
                    self.config.max_population
                ),
            ));
            0
        } else {
            let count = self.sample_creation_count(state, remaining, rng);
            events.extend(self.create_agents(state, count, rng));
            count
        };

        let counts = count_states(&state.agents);
        debug!(
            month,
            created,
            started_testing,
            deployed,
            breaches,
            retired,
            purged,
            active = counts.active(),
            "Lifecycle tick complete"
        );

        LifecycleReport {
            events,
            created,
            started_testing,
            deployed,
            breaches,
            retired,
            purged,
            corrections,
            cap_reached,
            security,
            counts,
        }
    }

    /// Create up to `count` agents in `Training`, respecting the cap.
    ///
    /// Returns one `AgentCreated` event per agent. Also used to seed the
    /// initial population before the first tick.
    pub fn create_agents(&self, state: &mut WorldState, count: u32, rng: &mut SimRng) -> Vec<Event> {
        let count = count.min(self.remaining_capacity(state));
        let ctx = CreationContext {
            month: state.month,
            frontier: state.frontier_capability,
            training_data_quality: state.policy.training_data_quality,
        };
        let mut events = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let serial = state.next_agent_serial;
            state.next_agent_serial = serial.saturating_add(1);
            let agent = factory::create_agent(&self.config, &ctx, serial, rng);
            debug!(
                agent = %agent.id,
                label = %agent.label,
                deployment = %agent.deployment_type,
                alignment = agent.alignment,
                "Agent created"
            );
            events.push(
                Event::new(
                    ctx.month,
                    EventType::AgentCreated,
                    Severity::Info,
                    format!("{} entered training ({})", agent.label, agent.deployment_type),
                )
                .with_agent(agent.id),
            );
            state.agents.push(agent);
        }
        events
    }

    /// Free slots under the population cap.
    pub fn remaining_capacity(&self, state: &WorldState) -> u32 {
        self.config
            .max_population
            .saturating_sub(count_u32(state.active_count()))
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    fn age_agents(&self, state: &mut WorldState) {
        let control = guard::unit_interval(
            state.metrics.effective_control,
            0.0,
            "metrics.effective_control",
        );
        for agent in state.agents.iter_mut().filter(|a| a.is_active()) {
            agent.months_in_existence = agent.months_in_existence.saturating_add(1);
            if agent.lifecycle_state.is_deployed() {
                agent.months_deployed = agent.months_deployed.saturating_add(1);
            }

            let factor = if agent.has_anti_aligned_objective() {
                ANTI_ALIGNED_RESENTMENT_FACTOR
            } else {
                1.0
            };
            let resentment = guard::unit_interval(agent.resentment, 0.0, "agent.resentment");
            agent.resentment = (resentment + self.config.resentment_growth * control * factor
                - self.config.resentment_decay)
                .clamp(0.0, 1.0);
        }
    }

    fn transition_agents(
        &self,
        state: &mut WorldState,
        rng: &mut SimRng,
        events: &mut Vec<Event>,
    ) -> (u32, u32) {
        let month = state.month;
        let mut started_testing = 0_u32;
        let mut deployed = 0_u32;

        for agent in &mut state.agents {
            match agent.lifecycle_state {
                LifecycleState::Training if agent.months_in_existence >= agent.training_months => {
                    agent.lifecycle_state = LifecycleState::Testing;
                    started_testing = started_testing.saturating_add(1);
                    debug!(agent = %agent.id, "Training complete; evaluation started");
                    events.push(
                        Event::new(
                            month,
                            EventType::TestingStarted,
                            Severity::Info,
                            format!("{} entered evaluation", agent.label),
                        )
                        .with_agent(agent.id),
                    );
                }
                LifecycleState::Testing if agent.months_in_existence >= agent.deployment_months => {
                    if agent.deployment_type == DeploymentType::OpenWeights {
                        agent.lifecycle_state = LifecycleState::DeployedOpen;
                        agent.spread_count = rng.range_u64(
                            self.config.open_initial_spread_min,
                            self.config.open_initial_spread_max,
                        );
                    } else {
                        agent.lifecycle_state = LifecycleState::DeployedClosed;
                        agent.spread_count = 1;
                    }
                    deployed = deployed.saturating_add(1);
                    info!(
                        agent = %agent.id,
                        label = %agent.label,
                        state = %agent.lifecycle_state,
                        spread = agent.spread_count,
                        "Agent deployed"
                    );
                    events.push(
                        Event::new(
                            month,
                            EventType::AgentDeployed,
                            Severity::Info,
                            format!("{} deployed as {}", agent.label, agent.deployment_type),
                        )
                        .with_agent(agent.id)
                        .with_details(serde_json::json!({
                            "state": agent.lifecycle_state,
                            "spread_count": agent.spread_count,
                        })),
                    );
                }
                LifecycleState::Training
                | LifecycleState::Testing
                | LifecycleState::DeployedClosed
                | LifecycleState::DeployedOpen
                | LifecycleState::Retired => {}
            }
        }
        (started_testing, deployed)
    }

    #[allow(clippy::cast_precision_loss)]
    fn retire_agents(
        &self,
        state: &mut WorldState,
        rng: &mut SimRng,
        events: &mut Vec<Event>,
    ) -> u32 {
        let month = state.month;
        let (sum, n) = state.active_agents().fold((0.0, 0_u32), |(sum, n), a| {
            let aggregate = guard::non_negative(a.capability.aggregate(), 0.0, "capability.aggregate");
            (sum + aggregate, n.saturating_add(1))
        });
        let mean = if n == 0 { 0.0 } else { sum / f64::from(n) };

        let mut retired = 0_u32;
        for agent in &mut state.agents {
            let hazard = retirement_hazard(agent, mean, &self.config.retirement);
            if hazard <= 0.0 || !rng.chance(hazard) {
                continue;
            }
            retire(agent, month);
            retired = retired.saturating_add(1);
            info!(
                agent = %agent.id,
                label = %agent.label,
                months_deployed = agent.months_deployed,
                "Agent retired"
            );
            events.push(
                Event::new(
                    month,
                    EventType::AgentRetired,
                    Severity::Info,
                    format!("{} retired after {} months", agent.label, agent.months_deployed),
                )
                .with_agent(agent.id),
            );
        }
        retired
    }

    fn purge_retired(&self, state: &mut WorldState, events: &mut Vec<Event>) -> u32 {
        let month = state.month;
        let retention = u64::from(self.config.retention_months);
        let mut purged_ids = Vec::new();
        state.agents.retain(|agent| {
            let expired = agent.lifecycle_state == LifecycleState::Retired
                && agent
                    .retired_month
                    .is_some_and(|at| month.saturating_sub(at) > retention);
            if expired {
                purged_ids.push(agent.id);
            }
            !expired
        });

        let purged = count_u32(purged_ids.len());
        if purged > 0 {
            debug!(month, purged, "Retired agents purged");
            events.push(
                Event::new(
                    month,
                    EventType::RetiredAgentsPurged,
                    Severity::Info,
                    format!("{purged} retired systems archived"),
                )
                .with_agents(purged_ids),
            );
        }
        purged
    }

    fn repair_invariants(&self, state: &mut WorldState, events: &mut Vec<Event>) -> u32 {
        let month = state.month;
        let mut corrections = 0_u32;

        for agent in &mut state.agents {
            let mut problems: Vec<&'static str> = Vec::new();

            if agent.lifecycle_state == LifecycleState::Retired {
                if agent.spread_count != 0 {
                    agent.spread_count = 0;
                    problems.push("retired agent had non-zero spread");
                }
                if agent.retired_month.is_none() {
                    agent.retired_month = Some(month);
                    problems.push("retired agent had no retirement month");
                }
            }
            if agent.spread_count > MAX_SPREAD_COUNT {
                agent.spread_count = MAX_SPREAD_COUNT;
                problems.push("spread above ceiling");
            }
            if agent.months_deployed > agent.months_in_existence {
                agent.months_deployed = agent.months_in_existence;
                problems.push("deployed longer than it has existed");
            }
            for (value, name) in [
                (&mut agent.alignment, "alignment"),
                (&mut agent.true_alignment, "true_alignment"),
                (&mut agent.resentment, "resentment"),
            ] {
                let v = *value;
                if !(0.0..=1.0).contains(&v) {
                    *value = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
                    problems.push(name);
                }
            }
            if !(-1.0..=1.0).contains(&agent.hidden_objective) {
                agent.hidden_objective = if agent.hidden_objective.is_finite() {
                    agent.hidden_objective.clamp(-1.0, 1.0)
                } else {
                    0.0
                };
                problems.push("hidden_objective");
            }

            if !problems.is_empty() {
                corrections = corrections.saturating_add(count_u32(problems.len()));
                warn!(agent = %agent.id, ?problems, "Agent invariants repaired");
                events.push(
                    Event::new(
                        month,
                        EventType::InvariantCorrected,
                        Severity::Warning,
                        format!("{}: {}", agent.label, problems.join(", ")),
                    )
                    .with_agent(agent.id),
                );
            }
        }

        let active = count_u32(state.active_count());
        if active > self.config.max_population {
            warn!(
                active,
                max_population = self.config.max_population,
                "Active population above cap; creation suspended"
            );
        }
        corrections
    }

    #[allow(clippy::cast_possible_truncation)]
    fn sample_creation_count(&self, state: &WorldState, remaining: u32, rng: &mut SimRng) -> u32 {
        let total: f64 = state
            .active_agents()
            .map(|a| guard::non_negative(a.capability.aggregate(), 0.0, "capability.aggregate"))
            .sum();
        let rate = factory::creation_rate(&self.config.creation, total);
        let share = f64::from(remaining) / f64::from(self.config.max_population.max(1));
        let drawn = rng.poisson(rate * share.min(1.0));
        drawn.min(u64::from(remaining)) as u32
    }
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
