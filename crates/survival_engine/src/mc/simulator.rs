//! Batch path simulation.
//!
//! [`PathSimulator`] owns a validated [`SimulationConfig`] and generates
//! independent paths, one RNG stream per path index. Batches at or above the
//! [`ParallelConfig`] threshold are generated with Rayon; the per-index
//! seeding makes the output identical either way.

use std::time::Instant;

use rayon::prelude::*;
use survival_core::{ConfigError, LeverState, SimulationConfig};
use tracing::{debug, warn};

use super::aggregate::{aggregate, MonteCarloResult};
use super::calibration::{DriftParams, ShockProfile};
use super::paths::{evolve_path, FailureCause, SimulationPath};
use crate::rng::{system_seed, SimRng};

/// Minimum paths handed to one Rayon task.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Batches smaller than this run on the calling thread.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

/// Configuration for parallel path generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Minimum number of paths per parallel task.
    pub batch_size: usize,
    /// Minimum paths before using parallelism.
    pub parallel_threshold: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl ParallelConfig {
    /// Creates a new parallel configuration.
    pub fn new(batch_size: usize, parallel_threshold: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            parallel_threshold,
        }
    }

    /// Always sequential.
    pub fn sequential() -> Self {
        Self::new(DEFAULT_BATCH_SIZE, usize::MAX)
    }

    /// Returns whether to use parallel processing for the given path count.
    #[inline]
    pub fn should_parallelize(&self, n_paths: usize) -> bool {
        n_paths >= self.parallel_threshold
    }
}

/// Raw output of one batch.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationBatch {
    /// Base seed actually used.
    pub seed: u64,
    /// Paths in index order.
    pub paths: Vec<SimulationPath>,
}

/// Monte Carlo path generator.
///
/// # Examples
///
/// ```rust
/// use survival_core::{LeverState, SimulationConfig};
/// use survival_engine::mc::PathSimulator;
///
/// let config = SimulationConfig::builder()
///     .iterations(100)
///     .starting_cash(4_000_000.0)
///     .starting_arr(4_800_000.0)
///     .monthly_burn(47_000.0)
///     .build()
///     .unwrap();
///
/// let simulator = PathSimulator::new(config).unwrap();
/// let first = simulator.run(&LeverState::neutral(), Some(42));
/// let second = simulator.run(&LeverState::neutral(), Some(42));
/// assert_eq!(first, second);
/// ```
#[derive(Clone, Debug)]
pub struct PathSimulator {
    config: SimulationConfig,
    parallel: ParallelConfig,
}

impl PathSimulator {
    /// Creates a simulator after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns any error from [`SimulationConfig::validate`].
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            parallel: ParallelConfig::default(),
        })
    }

    /// Replaces the parallel execution settings.
    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    /// The validated configuration.
    #[inline]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulates the unstressed batch.
    pub fn run(&self, levers: &LeverState, seed: Option<u64>) -> SimulationBatch {
        self.run_shocked(levers, seed, &ShockProfile::none())
    }

    /// Simulates the batch under `shock`.
    ///
    /// Without a seed a base seed is drawn once from system entropy and
    /// returned in the batch.
    pub fn run_shocked(
        &self,
        levers: &LeverState,
        seed: Option<u64>,
        shock: &ShockProfile,
    ) -> SimulationBatch {
        let seed = seed.unwrap_or_else(system_seed);
        let params = DriftParams::from_levers(levers, shock);
        let n = self.config.iterations;
        let config = &self.config;

        let started = Instant::now();
        let one = |index: usize| evolve_path(&params, config, &mut SimRng::for_path(seed, index));

        let paths: Vec<SimulationPath> = if self.parallel.should_parallelize(n) {
            (0..n)
                .into_par_iter()
                .with_min_len(self.parallel.batch_size)
                .map(one)
                .collect()
        } else {
            (0..n).map(one).collect()
        };

        let unstable = paths
            .iter()
            .filter(|p| p.failure_cause == Some(FailureCause::NumericalInstability))
            .count();
        if unstable > 0 {
            warn!(unstable, seed, sigma = shock.sigma(), "paths failed on non-finite values");
        }
        debug!(
            paths = n,
            horizon = config.time_horizon_months,
            seed,
            sigma = shock.sigma(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "simulated batch"
        );

        SimulationBatch { seed, paths }
    }

    /// Simulates under `shock` and aggregates, recording the seed used.
    pub fn simulate_and_aggregate(
        &self,
        levers: &LeverState,
        seed: Option<u64>,
        shock: &ShockProfile,
    ) -> MonteCarloResult {
        let batch = self.run_shocked(levers, seed, shock);
        aggregate(&batch.paths).with_seed(batch.seed)
    }
}

/// Simulates `config.iterations` independent paths.
///
/// # Errors
///
/// Returns `ConfigError` when `config` fails validation.
pub fn simulate(
    levers: &LeverState,
    config: &SimulationConfig,
    seed: Option<u64>,
) -> Result<Vec<SimulationPath>, ConfigError> {
    Ok(PathSimulator::new(config.clone())?.run(levers, seed).paths)
}

/// Simulates under `shock` and aggregates in one call.
///
/// # Errors
///
/// Returns `ConfigError` when `config` fails validation.
pub fn run_monte_carlo(
    levers: &LeverState,
    config: &SimulationConfig,
    seed: Option<u64>,
    shock: &ShockProfile,
) -> Result<MonteCarloResult, ConfigError> {
    Ok(PathSimulator::new(config.clone())?.simulate_and_aggregate(levers, seed, shock))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(iterations: usize) -> SimulationConfig {
        SimulationConfig::builder()
            .iterations(iterations)
            .starting_cash(4_000_000.0)
            .starting_arr(4_800_000.0)
            .monthly_burn(47_000.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_parallel_config_default() {
        let parallel = ParallelConfig::default();
        assert_eq!(parallel.batch_size, DEFAULT_BATCH_SIZE);
        assert!(!parallel.should_parallelize(255));
        assert!(parallel.should_parallelize(256));
        assert!(!ParallelConfig::sequential().should_parallelize(1_000_000));
        assert_eq!(ParallelConfig::new(0, 1).batch_size, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut bad = config(10);
        bad.starting_cash = 0.0;
        assert!(PathSimulator::new(bad.clone()).is_err());
        assert!(simulate(&LeverState::neutral(), &bad, Some(1)).is_err());
    }

    #[test]
    fn test_batch_size_matches_iterations() {
        let paths = simulate(&LeverState::neutral(), &config(37), Some(3)).unwrap();
        assert_eq!(paths.len(), 37);
        assert!(paths.iter().all(|p| p.snapshots.len() == 36));
    }

    #[test]
    fn test_parallel_equals_sequential() {
        let levers = LeverState::neutral();
        let parallel = PathSimulator::new(config(600))
            .unwrap()
            .with_parallel(ParallelConfig::new(8, 1));
        let sequential = PathSimulator::new(config(600))
            .unwrap()
            .with_parallel(ParallelConfig::sequential());

        assert_eq!(parallel.run(&levers, Some(11)), sequential.run(&levers, Some(11)));
    }

    #[test]
    fn test_system_seed_is_reported() {
        let simulator = PathSimulator::new(config(20)).unwrap();
        let levers = LeverState::neutral();
        let batch = simulator.run(&levers, None);
        assert_eq!(simulator.run(&levers, Some(batch.seed)), batch);
    }

    #[test]
    fn test_aggregate_records_seed() {
        let result = run_monte_carlo(
            &LeverState::neutral(),
            &config(10),
            Some(5),
            &ShockProfile::none(),
        )
        .unwrap();
        assert_eq!(result.seed, Some(5));
        assert_eq!(result.iteration_count, 10);
    }
}
