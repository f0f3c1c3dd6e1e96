//! Summary projection of a batch result.

use serde::{Deserialize, Serialize};
use survival_core::math::median;

use super::aggregate::MonteCarloResult;
use super::paths::SimulationPath;

/// Headline metrics of a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineMetrics {
    /// Fraction of paths solvent through the horizon.
    pub survival_rate: f64,
    /// Median terminal ARR.
    #[serde(rename = "medianARR")]
    pub median_arr: f64,
    /// Median implied runway in months.
    pub median_runway: f64,
    /// Median terminal net monthly burn.
    pub median_burn: f64,
    /// Median per-path mean monthly churn, in percent.
    pub churn_rate: f64,
}

impl BaselineMetrics {
    /// Projects a batch result onto its headline metrics.
    pub fn from_result(result: &MonteCarloResult) -> Self {
        Self {
            survival_rate: result.survival_rate,
            median_arr: result.arr_percentiles.p50,
            median_runway: result.runway_percentiles.p50,
            median_burn: result.burn_percentiles.p50,
            churn_rate: churn_rate_percent(&result.paths),
        }
    }
}

impl From<&MonteCarloResult> for BaselineMetrics {
    fn from(result: &MonteCarloResult) -> Self {
        Self::from_result(result)
    }
}

/// Median over paths of each path's mean monthly churn, in percent.
///
/// Only months in which a path was alive contribute to its mean.
pub fn churn_rate_percent(paths: &[SimulationPath]) -> f64 {
    let per_path: Vec<f64> = paths.iter().map(SimulationPath::mean_churn).collect();
    median(&per_path) * 100.0
}
