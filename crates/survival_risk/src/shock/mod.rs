//! Shock perturbation layer.
//!
//! A shock of sigma `s` in `[0, 3]` re-runs the baseline under stress: noise
//! (the market volatility and execution risk channel), mean churn and opex
//! are inflated and growth is damped, at a reduced iteration count. At
//! `s = 0` every stress factor is exactly one, so the shocked batch equals
//! the unstressed batch under the same seed and iteration count.
//!
//! ## Classification
//!
//! Cut points on the shocked survival rate and median runway (months):
//!
//! | Class | Rule (first match) |
//! |---|---|
//! | Critical | survival < 0.30 or runway < 6 |
//! | Resilient | survival > 0.80 and runway > 24 |
//! | Stable | survival >= 0.60 and runway >= 12 |
//! | Fragile | otherwise |

use serde::{Deserialize, Serialize};
use survival_core::{ConfigError, Fidelity, LeverState, SimulationConfig};
use survival_engine::mc::{BaselineMetrics, Percentiles, ShockProfile};
use tracing::debug;

use crate::estimator::{Estimate, MonteCarloEstimator, OutcomeEstimator};

/// Iterations used by a shock batch unless overridden.
pub const DEFAULT_MINI_ITERATIONS: usize = 200;

/// Below this survival rate a result is critical.
pub const CRITICAL_SURVIVAL: f64 = 0.30;
/// Below this median runway (months) a result is critical.
pub const CRITICAL_RUNWAY_MONTHS: f64 = 6.0;
/// Above this survival rate a result may be resilient.
pub const RESILIENT_SURVIVAL: f64 = 0.80;
/// Above this median runway (months) a result may be resilient.
pub const RESILIENT_RUNWAY_MONTHS: f64 = 24.0;
/// Minimum survival rate of a stable result.
pub const STABLE_SURVIVAL: f64 = 0.60;
/// Minimum median runway (months) of a stable result.
pub const STABLE_RUNWAY_MONTHS: f64 = 12.0;

/// Resilience class of a shocked batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Comfortably survives the stress.
    Resilient,
    /// Survives with adequate runway.
    Stable,
    /// Neither critical nor stable.
    Fragile,
    /// Likely failure or imminent cash-out.
    Critical,
}

impl Classification {
    /// Classifies a survival rate and median runway.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use survival_risk::shock::Classification;
    ///
    /// assert_eq!(Classification::classify(0.95, 40.0), Classification::Resilient);
    /// assert_eq!(Classification::classify(0.95, 5.0), Classification::Critical);
    /// assert_eq!(Classification::classify(0.5, 30.0), Classification::Fragile);
    /// ```
    pub fn classify(survival_rate: f64, median_runway: f64) -> Self {
        if survival_rate < CRITICAL_SURVIVAL || median_runway < CRITICAL_RUNWAY_MONTHS {
            Classification::Critical
        } else if survival_rate > RESILIENT_SURVIVAL && median_runway > RESILIENT_RUNWAY_MONTHS {
            Classification::Resilient
        } else if survival_rate >= STABLE_SURVIVAL && median_runway >= STABLE_RUNWAY_MONTHS {
            Classification::Stable
        } else {
            Classification::Fragile
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Classification::Resilient => "Resilient",
            Classification::Stable => "Stable",
            Classification::Fragile => "Fragile",
            Classification::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a shock batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShockedBatchResult {
    /// Shocked headline metrics.
    #[serde(flatten)]
    pub metrics: BaselineMetrics,
    /// Effective (clamped) sigma.
    pub sigma: f64,
    /// Paths simulated; 0 for an analytic estimate.
    pub iteration_count: usize,
    /// Base seed of a stochastic batch.
    pub seed: Option<u64>,
    /// Fidelity that produced the batch.
    pub fidelity: Fidelity,
    /// Shocked terminal ARR percentiles.
    pub arr_percentiles: Percentiles,
    /// Resilience class.
    pub classification: Classification,
}

impl ShockedBatchResult {
    /// Wraps a shocked estimate.
    pub fn from_estimate(estimate: Estimate, sigma: f64) -> Self {
        let classification =
            Classification::classify(estimate.metrics.survival_rate, estimate.metrics.median_runway);
        Self {
            metrics: estimate.metrics,
            sigma,
            iteration_count: estimate.iteration_count,
            seed: estimate.seed,
            fidelity: estimate.fidelity,
            arr_percentiles: estimate.arr_percentiles,
            classification,
        }
    }
}

/// Runs a Monte Carlo shock batch of `mini_iterations` paths.
///
/// `mini_iterations` replaces `config.iterations`; sigma is clamped to
/// `[0, 3]`.
///
/// # Errors
///
/// Returns `ConfigError` when the config (with the replaced iteration count)
/// fails validation.
///
/// # Examples
///
/// ```rust
/// use survival_core::{LeverState, SimulationConfig};
/// use survival_risk::shock::shock;
///
/// let config = SimulationConfig::builder()
///     .starting_cash(4_000_000.0)
///     .starting_arr(4_800_000.0)
///     .monthly_burn(47_000.0)
///     .build()
///     .unwrap();
///
/// let shocked = shock(&LeverState::neutral(), &config, 1.5, 100, Some(42)).unwrap();
/// assert_eq!(shocked.iteration_count, 100);
/// assert_eq!(shocked.sigma, 1.5);
/// ```
pub fn shock(
    levers: &LeverState,
    config: &SimulationConfig,
    sigma: f64,
    mini_iterations: usize,
    seed: Option<u64>,
) -> Result<ShockedBatchResult, ConfigError> {
    let estimator = match seed {
        Some(seed) => MonteCarloEstimator::seeded(seed),
        None => MonteCarloEstimator::new(),
    };
    shock_with(&estimator, levers, config, sigma, mini_iterations)
}

/// Runs a shock batch through `estimator`.
///
/// # Errors
///
/// Returns `ConfigError` when the config fails validation.
pub fn shock_with(
    estimator: &dyn OutcomeEstimator,
    levers: &LeverState,
    config: &SimulationConfig,
    sigma: f64,
    mini_iterations: usize,
) -> Result<ShockedBatchResult, ConfigError> {
    let profile = ShockProfile::new(sigma);
    let mini = config.with_iterations(mini_iterations);
    let estimate = estimator.estimate(levers, &mini, &profile)?;
    let result = ShockedBatchResult::from_estimate(estimate, profile.sigma());

    debug!(
        sigma = result.sigma,
        fidelity = result.fidelity.name(),
        survival = result.metrics.survival_rate,
        classification = result.classification.name(),
        "shock batch"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_cut_points() {
        assert_eq!(Classification::classify(0.29, 100.0), Classification::Critical);
        assert_eq!(Classification::classify(1.0, 5.9), Classification::Critical);
        assert_eq!(Classification::classify(0.81, 24.1), Classification::Resilient);
        assert_eq!(Classification::classify(0.80, 30.0), Classification::Stable);
        assert_eq!(Classification::classify(0.60, 12.0), Classification::Stable);
        assert_eq!(Classification::classify(0.59, 12.0), Classification::Fragile);
        assert_eq!(Classification::classify(0.9, 11.0), Classification::Fragile);
        assert_eq!(Classification::classify(0.30, 6.0), Classification::Fragile);
    }

    #[test]
    fn test_classification_serialises_as_name() {
        let json = serde_json::to_string(&Classification::Critical).unwrap();
        assert_eq!(json, "\"Critical\"");
        assert_eq!(Classification::Stable.to_string(), "Stable");
    }

    #[test]
    fn test_flattened_metrics() {
        let config = SimulationConfig::builder()
            .starting_cash(1_000_000.0)
            .starting_arr(1_200_000.0)
            .monthly_burn(80_000.0)
            .build()
            .unwrap();
        let shocked = shock(&LeverState::neutral(), &config, 0.5, 20, Some(3)).unwrap();
        let json = serde_json::to_value(&shocked).unwrap();
        assert!(json.get("survivalRate").is_some());
        assert!(json.get("medianARR").is_some());
        assert_eq!(json["classification"], shocked.classification.name());
    }

    #[test]
    fn test_zero_mini_iterations_rejected() {
        let config = SimulationConfig::builder()
            .starting_cash(1.0)
            .starting_arr(0.0)
            .monthly_burn(0.0)
            .build()
            .unwrap();
        assert!(shock(&LeverState::neutral(), &config, 1.0, 0, Some(1)).is_err());
    }
}
