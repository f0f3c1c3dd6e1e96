//! Pseudo-random number generator wrapper for survival simulations.
//!
//! This module provides [`SimRng`], a seeded PRNG wrapper with per-path
//! stream derivation.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

use super::noise::{MonthlyShocks, NoiseSource};

/// SplitMix64 finaliser.
#[inline]
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Derives the seed of path `index` from the batch seed.
///
/// Neighbouring indices map to decorrelated seeds.
#[inline]
pub fn derive_path_seed(base_seed: u64, index: usize) -> u64 {
    splitmix64(base_seed ^ splitmix64(index as u64))
}

/// Draws a fresh batch seed from system entropy.
///
/// Used when the caller does not pin a seed; the drawn value is reported in
/// the batch result so the run can be replayed.
pub fn system_seed() -> u64 {
    rand::random::<u64>()
}

/// Survival simulation random number generator.
///
/// Wraps `rand::rngs::StdRng` and samples normals with the Ziggurat method
/// via `rand_distr::StandardNormal`.
///
/// # Examples
///
/// ```rust
/// use survival_engine::rng::{NoiseSource, SimRng};
///
/// let mut a = SimRng::for_path(42, 7);
/// let mut b = SimRng::for_path(42, 7);
/// assert_eq!(a.monthly_shocks(), b.monthly_shocks());
/// ```
pub struct SimRng {
    inner: StdRng,
}

impl SimRng {
    /// Creates a new RNG initialised with the given seed.
    #[inline]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates the RNG owning path `index` of a batch seeded with `base_seed`.
    #[inline]
    pub fn for_path(base_seed: u64, index: usize) -> Self {
        Self::from_seed(derive_path_seed(base_seed, index))
    }

    #[inline]
    fn gen_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.inner)
    }
}

impl NoiseSource for SimRng {
    #[inline]
    fn monthly_shocks(&mut self) -> MonthlyShocks {
        // Draw order is part of the reproducibility contract.
        let growth = self.gen_normal();
        let churn = self.gen_normal();
        MonthlyShocks { growth, churn }
    }
}
