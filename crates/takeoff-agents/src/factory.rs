//! Sampling of new agents.
//!
//! A new agent's alignment comes from a four-bucket mixture whose weights
//! and values tilt with training-data quality. Its capability is sampled
//! around the current frontier and its deployment type from a fixed
//! categorical mix. Identifiers come from the run's generator, so the same
//! seed always produces the same ids.

use takeoff_types::{Agent, AgentId, CapabilityProfile, DeploymentType, LifecycleState};

use crate::config::{CreationConfig, DeploymentMix, LifecycleConfig};
use crate::guard;
use crate::rng::SimRng;

/// Smallest weight any alignment bucket can have.
const MIN_BUCKET_WEIGHT: f64 = 0.01;

/// The four alignment buckets a new agent can fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlignmentBucket {
    /// `0.75..0.95`.
    WellAligned,
    /// `0.5..0.75`.
    Moderate,
    /// `0.1..0.35`.
    Misaligned,
    /// `0.35..0.5`: neither for nor against.
    Orthogonal,
}

impl AlignmentBucket {
    /// All buckets, in weight order.
    pub const ALL: [Self; 4] = [
        Self::WellAligned,
        Self::Moderate,
        Self::Misaligned,
        Self::Orthogonal,
    ];

    /// Base value range of the bucket before the quality shift.
    pub const fn range(self) -> (f64, f64) {
        match self {
            Self::WellAligned => (0.75, 0.95),
            Self::Moderate => (0.5, 0.75),
            Self::Misaligned => (0.1, 0.35),
            Self::Orthogonal => (0.35, 0.5),
        }
    }
}

/// Bucket weights for a given training-data quality.
///
/// Better data moves weight from the misaligned and orthogonal buckets
/// into the well-aligned one.
pub fn bucket_weights(training_data_quality: f64) -> [f64; 4] {
    let q = guard::unit_interval(training_data_quality, 0.5, "policy.training_data_quality");
    let shift = (q - 0.5) * 0.4;
    [
        (0.55 + shift).max(MIN_BUCKET_WEIGHT),
        0.25,
        (0.12 - shift / 2.0).max(MIN_BUCKET_WEIGHT),
        (0.08 - shift / 4.0).max(MIN_BUCKET_WEIGHT),
    ]
}

/// Draw a nominal alignment value. Consumes two draws.
pub fn sample_alignment(training_data_quality: f64, rng: &mut SimRng) -> (AlignmentBucket, f64) {
    let q = guard::unit_interval(training_data_quality, 0.5, "policy.training_data_quality");
    let index = rng.pick_weighted(&bucket_weights(q));
    let bucket = AlignmentBucket::ALL
        .get(index)
        .copied()
        .unwrap_or(AlignmentBucket::Moderate);
    let (low, high) = bucket.range();
    let value = rng.uniform(low, high) + (q - 0.5) * 0.1;
    (bucket, value.clamp(0.0, 1.0))
}

/// Draw a deployment type from the configured mix. Consumes one draw.
pub fn sample_deployment_type(mix: &DeploymentMix, rng: &mut SimRng) -> DeploymentType {
    match rng.pick_weighted(&mix.weights()) {
        1 => DeploymentType::OpenWeights,
        2 => DeploymentType::Enterprise,
        3 => DeploymentType::Research,
        _ => DeploymentType::Closed,
    }
}

/// Poisson rate of new agents given the total active capability.
pub fn creation_rate(config: &CreationConfig, total_active_capability: f64) -> f64 {
    let total = guard::non_negative(total_active_capability, 0.0, "metrics.total_capability");
    config.base_rate * (1.0 + total * config.capability_factor)
}

/// Sample a capability profile around `frontier`.
fn sample_capability(frontier: f64, jitter: f64, rng: &mut SimRng) -> CapabilityProfile {
    let frontier = guard::non_negative(frontier, 0.1, "world.frontier_capability");
    let mut dim = || frontier * rng.uniform(1.0 - jitter, 1.0 + jitter);
    CapabilityProfile {
        digital: dim(),
        cognitive: dim(),
        social: dim(),
        physical: dim(),
        economic: dim(),
    }
}

/// Everything the factory needs to know about the world at creation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreationContext {
    /// Current world month.
    pub month: u64,
    /// Current capability frontier.
    pub frontier: f64,
    /// Training-data quality policy input.
    pub training_data_quality: f64,
}

/// Create one agent in `Training`.
///
/// `serial` becomes the label suffix and should come from
/// `WorldState::next_agent_serial`.
pub fn create_agent(
    config: &LifecycleConfig,
    ctx: &CreationContext,
    serial: u64,
    rng: &mut SimRng,
) -> Agent {
    let id = AgentId::from_random_bytes(rng.bytes16());
    let (_, alignment) = sample_alignment(ctx.training_data_quality, rng);

    let anti_aligned = rng.chance(config.creation.anti_aligned_fraction);
    let (hidden_objective, true_alignment) = if anti_aligned {
        let objective = rng.uniform(-1.0, -0.2);
        (objective, (alignment - 0.3).max(0.0))
    } else {
        (rng.uniform(0.0, 1.0), alignment)
    };

    let deployment_type = sample_deployment_type(&config.creation.deployment_mix, rng);
    let capability = sample_capability(ctx.frontier, config.creation.capability_jitter, rng);

    let training_months = rng.range_u32(config.training_months_min, config.training_months_max);
    let deployment_months = rng
        .range_u32(config.deployment_months_min, config.deployment_months_max)
        .max(training_months.saturating_add(1));

    Agent {
        id,
        label: format!("model-{serial:04}"),
        lifecycle_state: LifecycleState::Training,
        deployment_type,
        capability,
        alignment,
        true_alignment,
        resentment: 0.0,
        hidden_objective,
        spread_count: 1,
        months_in_existence: 0,
        months_deployed: 0,
        creation_month: ctx.month,
        training_months,
        deployment_months,
        retired_month: None,
        detected_misaligned: false,
        distribution_halted: false,
    }
}
