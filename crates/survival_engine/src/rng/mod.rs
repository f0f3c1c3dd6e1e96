//! # Random Number Generation Infrastructure
//!
//! This module provides the randomness used by the path simulator.
//!
//! ## Design Rationale
//!
//! - **Reproducibility**: every path owns an independent stream derived from
//!   `(base_seed, path_index)`, so a seeded batch is byte-identical no matter
//!   how rayon schedules the paths
//! - **Prefix stability**: the first `k` paths of an `N`-path batch equal a
//!   `k`-path batch under the same seed
//! - **Pluggability**: the simulator draws through the [`NoiseSource`] trait;
//!   [`SimRng`] is the stochastic source and [`FixedNoise`] drives the
//!   deterministic quantile paths of the fast projector
//!
//! ## Usage Example
//!
//! ```rust
//! use survival_engine::rng::{NoiseSource, SimRng};
//!
//! let mut a = SimRng::for_path(42, 7);
//! let mut b = SimRng::for_path(42, 7);
//! assert_eq!(a.monthly_shocks(), b.monthly_shocks());
//! ```

mod noise;
mod prng;

pub use noise::{FixedNoise, MonthlyShocks, NoiseSource};
pub use prng::{derive_path_seed, system_seed, SimRng};

#[cfg(test)]
mod tests;
