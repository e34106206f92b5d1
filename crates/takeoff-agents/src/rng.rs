//! The simulation's only source of randomness.
//!
//! [`SimRng`] wraps a seeded [`ChaCha8Rng`] and exposes the handful of
//! draws the phases need. Every stochastic helper in the workspace takes
//! `&mut SimRng`; none of them accept a generic [`rand::Rng`], so there is
//! no way to slip an ambient generator into a call site.
//!
//! ChaCha8 is portable across platforms and releases of `rand_chacha`, so
//! a seed reproduces a run bit for bit.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Poisson};

/// Seeded deterministic generator threaded through every phase.
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl SimRng {
    /// Create a generator from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this generator was created with.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.inner.random::<f64>()
    }

    /// Bernoulli draw: `true` with probability `p`.
    ///
    /// Always consumes exactly one draw. `p <= 0` (or NaN) never fires and
    /// `p >= 1` always fires.
    pub fn chance(&mut self, p: f64) -> bool {
        let roll = self.next_f64();
        roll < p
    }

    /// Uniform float in `[low, high)`. Returns `low` if the range is empty.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        let roll = self.next_f64();
        if high > low {
            low + roll * (high - low)
        } else {
            low
        }
    }

    /// Uniform integer in `low..=high`. Returns `low` if `high < low`.
    pub fn range_u32(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        self.inner.random_range(low..=high)
    }

    /// Uniform integer in `low..=high`. Returns `low` if `high < low`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        self.inner.random_range(low..=high)
    }

    /// Draw a Poisson-distributed count with rate `lambda`.
    ///
    /// Non-positive or non-finite rates yield zero.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn poisson(&mut self, lambda: f64) -> u64 {
        if !lambda.is_finite() || lambda <= 0.0 {
            return 0;
        }
        match Poisson::new(lambda) {
            Ok(dist) => {
                let sample: f64 = dist.sample(&mut self.inner);
                sample.max(0.0) as u64
            }
            Err(_) => 0,
        }
    }

    /// Pick an index with probability proportional to `weights`.
    ///
    /// Negative and non-finite weights count as zero. If every weight is
    /// zero, index 0 is returned. Consumes exactly one draw.
    pub fn pick_weighted(&mut self, weights: &[f64]) -> usize {
        let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let total: f64 = weights.iter().copied().map(clean).sum();
        let roll = self.next_f64() * total;
        if total <= 0.0 {
            return 0;
        }
        let mut acc = 0.0;
        for (i, w) in weights.iter().copied().map(clean).enumerate() {
            acc += w;
            if roll < acc {
                return i;
            }
        }
        weights.len().saturating_sub(1)
    }

    /// Sixteen random bytes, for identifiers.
    pub fn bytes16(&mut self) -> [u8; 16] {
        let mut buf = [0_u8; 16];
        self.inner.fill_bytes(&mut buf);
        buf
    }
}
