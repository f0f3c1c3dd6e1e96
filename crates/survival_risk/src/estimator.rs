//! Outcome estimation seam.
//!
//! Every risk computation in this crate reads outcomes through
//! [`OutcomeEstimator`], so the shock layer, the sensitivity analyser and the
//! [`RiskEngine`](crate::engine::RiskEngine) facade share one set of
//! semantics whichever [`Fidelity`] produced the numbers.
//!
//! | Fidelity | Estimator | Cost |
//! |---|---|---|
//! | `FullMonteCarlo` | [`MonteCarloEstimator`] | `iterations x horizon` path steps |
//! | `Fast` | [`FastEstimator`] | five deterministic paths |

use serde::{Deserialize, Serialize};
use survival_core::{ConfigError, Fidelity, LeverState, SimulationConfig};
use survival_core::INSTITUTIONAL_SAMPLE_THRESHOLD;
use survival_engine::fast::{project, FastProjection};
use survival_engine::mc::{
    BaselineMetrics, MonteCarloResult, ParallelConfig, PathSimulator, Percentiles, ShockProfile,
};

/// Outcome of one estimation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    /// Fidelity that produced the estimate.
    pub fidelity: Fidelity,
    /// Simulated paths; 0 for an analytic estimate.
    pub iteration_count: usize,
    /// Base seed of a stochastic estimate.
    pub seed: Option<u64>,
    /// Headline metrics.
    pub metrics: BaselineMetrics,
    /// Terminal ARR percentiles.
    pub arr_percentiles: Percentiles,
    /// Implied runway percentiles.
    pub runway_percentiles: Percentiles,
    /// Survival curve; empty for an analytic estimate.
    pub survival_by_month: Vec<f64>,
}

impl Estimate {
    /// Builds an estimate from a Monte Carlo batch.
    pub fn from_result(result: &MonteCarloResult) -> Self {
        Self {
            fidelity: Fidelity::FullMonteCarlo,
            iteration_count: result.iteration_count,
            seed: result.seed,
            metrics: BaselineMetrics::from_result(result),
            arr_percentiles: result.arr_percentiles,
            runway_percentiles: result.runway_percentiles,
            survival_by_month: result.survival_by_month.clone(),
        }
    }

    /// Builds an estimate from a fast projection.
    pub fn from_projection(projection: &FastProjection) -> Self {
        Self {
            fidelity: Fidelity::Fast,
            iteration_count: 0,
            seed: None,
            metrics: projection.metrics(),
            arr_percentiles: projection.arr_percentiles,
            runway_percentiles: projection.runway_percentiles,
            survival_by_month: Vec::new(),
        }
    }

    /// Whether a stochastic estimate used fewer than
    /// [`INSTITUTIONAL_SAMPLE_THRESHOLD`] paths.
    ///
    /// Analytic estimates are never small samples.
    pub fn is_small_sample(&self) -> bool {
        self.fidelity == Fidelity::FullMonteCarlo
            && self.iteration_count < INSTITUTIONAL_SAMPLE_THRESHOLD
    }
}

/// Source of outcome estimates.
pub trait OutcomeEstimator: Send + Sync {
    /// Fidelity of the produced estimates.
    fn fidelity(&self) -> Fidelity;

    /// Estimates the outcome of `levers` under `shock`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when `config` fails validation.
    fn estimate(
        &self,
        levers: &LeverState,
        config: &SimulationConfig,
        shock: &ShockProfile,
    ) -> Result<Estimate, ConfigError>;
}

/// Stochastic estimator backed by the path simulator.
///
/// A seeded estimator is deterministic. An unseeded one draws a fresh system
/// seed on every call and reports it in [`Estimate::seed`].
#[derive(Clone, Debug, Default)]
pub struct MonteCarloEstimator {
    seed: Option<u64>,
    parallel: ParallelConfig,
}

impl MonteCarloEstimator {
    /// Unseeded estimator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimator pinned to `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Replaces the parallel execution settings.
    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    /// The pinned seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl OutcomeEstimator for MonteCarloEstimator {
    fn fidelity(&self) -> Fidelity {
        Fidelity::FullMonteCarlo
    }

    fn estimate(
        &self,
        levers: &LeverState,
        config: &SimulationConfig,
        shock: &ShockProfile,
    ) -> Result<Estimate, ConfigError> {
        let simulator = PathSimulator::new(config.clone())?.with_parallel(self.parallel.clone());
        let result = simulator.simulate_and_aggregate(levers, self.seed, shock);
        Ok(Estimate::from_result(&result))
    }
}

/// Deterministic estimator backed by the quantile projection.
#[derive(Clone, Copy, Debug, Default)]
pub struct FastEstimator;

impl OutcomeEstimator for FastEstimator {
    fn fidelity(&self) -> Fidelity {
        Fidelity::Fast
    }

    fn estimate(
        &self,
        levers: &LeverState,
        config: &SimulationConfig,
        shock: &ShockProfile,
    ) -> Result<Estimate, ConfigError> {
        Ok(Estimate::from_projection(&project(levers, config, shock)?))
    }
}

/// Boxed estimator for `fidelity`; `seed` applies to Monte Carlo only.
pub fn estimator_for(fidelity: Fidelity, seed: Option<u64>) -> Box<dyn OutcomeEstimator> {
    match (fidelity, seed) {
        (Fidelity::Fast, _) => Box::new(FastEstimator),
        (Fidelity::FullMonteCarlo, Some(seed)) => Box::new(MonteCarloEstimator::seeded(seed)),
        (Fidelity::FullMonteCarlo, None) => Box::new(MonteCarloEstimator::new()),
    }
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
    fn test_seeded_monte_carlo_is_deterministic() {
        let estimator = MonteCarloEstimator::seeded(17);
        let levers = LeverState::neutral();
        let a = estimator.estimate(&levers, &config(100), &ShockProfile::none()).unwrap();
        let b = estimator.estimate(&levers, &config(100), &ShockProfile::none()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.seed, Some(17));
        assert_eq!(a.iteration_count, 100);
        assert!(a.is_small_sample());
    }

    #[test]
    fn test_unseeded_reports_seed() {
        let estimate = MonteCarloEstimator::new()
            .estimate(&LeverState::neutral(), &config(10), &ShockProfile::none())
            .unwrap();
        assert!(estimate.seed.is_some());
    }

    #[test]
    fn test_fast_estimate_shape() {
        let estimate = FastEstimator
            .estimate(&LeverState::neutral(), &config(5_000), &ShockProfile::none())
            .unwrap();
        assert_eq!(estimate.fidelity, Fidelity::Fast);
        assert_eq!(estimate.iteration_count, 0);
        assert!(estimate.survival_by_month.is_empty());
        assert!(!estimate.is_small_sample());
    }

    #[test]
    fn test_estimator_for() {
        assert_eq!(estimator_for(Fidelity::Fast, Some(1)).fidelity(), Fidelity::Fast);
        assert_eq!(
            estimator_for(Fidelity::FullMonteCarlo, None).fidelity(),
            Fidelity::FullMonteCarlo
        );
    }

    #[test]
    fn test_invalid_config_propagates() {
        let mut bad = config(10);
        bad.time_horizon_months = 0;
        let levers = LeverState::neutral();
        assert!(FastEstimator.estimate(&levers, &bad, &ShockProfile::none()).is_err());
        assert!(MonteCarloEstimator::seeded(1)
            .estimate(&levers, &bad, &ShockProfile::none())
            .is_err());
    }
}
