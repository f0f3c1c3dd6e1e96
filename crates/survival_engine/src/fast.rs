//! Deterministic quantile projection.
//!
//! The fast projector replaces the stochastic batch with five deterministic
//! paths. Path `q` applies the constant monthly growth shock `z_q / sqrt(H)`
//! so that its cumulative log shock after `H` months equals the `z_q` normal
//! quantile of a stochastic path. Churn noise is held at zero.
//!
//! Terminal percentiles are read directly from these paths. Survival is the
//! normal probability that the implied runway exceeds the horizon:
//!
//! ```text
//! P(survive) = Phi( ln(max(runway_p50, eps) / H) / max(0.05, v sqrt(H)) )
//! ```
//!
//! The projection costs five path evaluations, which makes it suitable for
//! interactive use where a full batch is too slow.

use serde::{Deserialize, Serialize};
use survival_core::math::{norm_cdf, EPSILON};
use survival_core::{ConfigError, LeverState, SimulationConfig};

use crate::mc::{
    evolve_path, BaselineMetrics, DriftParams, Percentiles, ShockProfile, SimulationPath,
};
use crate::rng::FixedNoise;

/// Standard normal quantiles of p10, p25, p50, p75 and p90.
pub const QUANTILE_Z: [f64; 5] = [-1.2816, -0.6745, 0.0, 0.6745, 1.2816];

/// Lower bound on the log-runway dispersion used by the survival estimate.
pub const MIN_LOG_DISPERSION: f64 = 0.05;

/// Result of a fast projection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FastProjection {
    /// Analytic survival probability.
    pub survival_rate: f64,
    /// Terminal ARR percentiles.
    pub arr_percentiles: Percentiles,
    /// Implied runway percentiles.
    pub runway_percentiles: Percentiles,
    /// Terminal net burn percentiles.
    pub burn_percentiles: Percentiles,
    /// Mean monthly churn on the median path, in percent.
    pub churn_rate: f64,
    /// The five quantile paths, from p10 to p90 growth shock.
    pub quantile_paths: Vec<SimulationPath>,
}

impl FastProjection {
    /// Headline metrics of the projection.
    pub fn metrics(&self) -> BaselineMetrics {
        BaselineMetrics {
            survival_rate: self.survival_rate,
            median_arr: self.arr_percentiles.p50,
            median_runway: self.runway_percentiles.p50,
            median_burn: self.burn_percentiles.p50,
            churn_rate: self.churn_rate,
        }
    }
}

/// Projects `levers` under `shock` without random sampling.
///
/// The iteration count of `config` is ignored, but the config must still
/// validate.
///
/// # Errors
///
/// Returns `ConfigError` when `config` fails validation.
///
/// # Examples
///
/// ```rust
/// use survival_core::{LeverState, SimulationConfig};
/// use survival_engine::fast::project;
/// use survival_engine::mc::ShockProfile;
///
/// let config = SimulationConfig::builder()
///     .starting_cash(4_000_000.0)
///     .starting_arr(4_800_000.0)
///     .monthly_burn(47_000.0)
///     .build()
///     .unwrap();
///
/// let projection = project(&LeverState::neutral(), &config, &ShockProfile::none()).unwrap();
/// assert!(projection.arr_percentiles.is_monotonic());
/// assert!(projection.survival_rate > 0.5);
/// ```
pub fn project(
    levers: &LeverState,
    config: &SimulationConfig,
    shock: &ShockProfile,
) -> Result<FastProjection, ConfigError> {
    config.validate()?;

    let params = DriftParams::from_levers(levers, shock);
    let horizon = config.time_horizon_months as f64;
    let root_h = horizon.sqrt();

    let quantile_paths: Vec<SimulationPath> = QUANTILE_Z
        .iter()
        .map(|&z| evolve_path(&params, config, &mut FixedNoise::growth(z / root_h)))
        .collect();

    let arr_percentiles = band(&quantile_paths, |p| p.terminal().map_or(0.0, |s| s.arr));
    let burn_percentiles = band(&quantile_paths, |p| p.terminal().map_or(0.0, |s| s.burn));
    let runway_percentiles = band(&quantile_paths, |p| p.runway_months);

    let dispersion = (params.noise_sd * root_h).max(MIN_LOG_DISPERSION);
    let log_cover = (runway_percentiles.p50.max(EPSILON) / horizon).ln();
    let survival_rate = norm_cdf(log_cover / dispersion);

    let churn_rate = quantile_paths[2].mean_churn() * 100.0;

    Ok(FastProjection {
        survival_rate,
        arr_percentiles,
        runway_percentiles,
        burn_percentiles,
        churn_rate,
        quantile_paths,
    })
}

fn band(paths: &[SimulationPath], f: impl Fn(&SimulationPath) -> f64) -> Percentiles {
    Percentiles::from_unsorted(paths.iter().map(f).collect())
}
