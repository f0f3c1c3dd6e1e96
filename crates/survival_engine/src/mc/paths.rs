//! Single-path company evolution.
//!
//! One path is a month-by-month trajectory of cash, ARR and net burn. ARR is
//! updated in log space (as a GBM step) so it stays non-negative:
//!
//! ```text
//! churn_t = min(1, c exp(0.25 z_c - 0.03125))
//! arr_t   = arr_{t-1} exp(g - churn_t - v^2 / 2 + v z_g)
//! burn_t  = burn_0 o + (arr_0 - arr_t) / 12
//! cash_t  = cash_{t-1} - burn_t
//! ```
//!
//! # Absorbing failure
//!
//! The first month with `cash < 0` ends the path: the failing state is
//! recorded and every later snapshot repeats it. A non-finite intermediate
//! value is a failure in that month and the snapshot repeats the last finite
//! state. A failed path never recovers.

use serde::{Deserialize, Serialize};
use survival_core::math::{safe_ratio, EPSILON};
use survival_core::SimulationConfig;

use super::calibration::DriftParams;
use crate::rng::NoiseSource;

/// Cap on implied runway, in months.
pub const RUNWAY_CAP_MONTHS: f64 = 120.0;

/// Dispersion of the monthly churn draw (log-space standard deviation).
pub const CHURN_DISPERSION: f64 = 0.25;

/// One path's state at the end of one month.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySnapshot {
    /// Cash on hand.
    pub cash: f64,
    /// Annual recurring revenue.
    pub arr: f64,
    /// Net burn for the month; negative when cash generative.
    pub burn: f64,
    /// ARR growth versus the previous month.
    pub growth_rate: f64,
    /// Churn fraction realised in the month.
    pub churn_rate: f64,
}

impl MonthlySnapshot {
    fn is_finite(&self) -> bool {
        self.cash.is_finite()
            && self.arr.is_finite()
            && self.burn.is_finite()
            && self.growth_rate.is_finite()
            && self.churn_rate.is_finite()
    }
}

/// Why a path failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureCause {
    /// Cash fell below zero.
    Insolvent,
    /// An intermediate value became NaN or infinite.
    NumericalInstability,
}

/// One simulated trajectory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationPath {
    /// Snapshots for months `1..=H`.
    pub snapshots: Vec<MonthlySnapshot>,
    /// Whether the path stayed solvent through the whole horizon.
    pub survived: bool,
    /// Month (1-based) in which the path failed.
    pub failure_month: Option<usize>,
    /// Why the path failed.
    pub failure_cause: Option<FailureCause>,
    /// Implied months of solvency from month 0, capped at
    /// [`RUNWAY_CAP_MONTHS`].
    pub runway_months: f64,
}

impl SimulationPath {
    /// Whether the path was still solvent after `month` months.
    ///
    /// Month 0 is the starting state, so every path is solvent at month 0.
    #[inline]
    pub fn is_solvent_at(&self, month: usize) -> bool {
        self.failure_month.map_or(true, |failed| failed > month)
    }

    /// Final snapshot, or `None` for an empty path.
    #[inline]
    pub fn terminal(&self) -> Option<&MonthlySnapshot> {
        self.snapshots.last()
    }

    /// Snapshots recorded while the path was alive (including the failing
    /// month for an insolvent path).
    pub fn live_snapshots(&self) -> &[MonthlySnapshot] {
        let live = match (self.failure_month, self.failure_cause) {
            (Some(month), Some(FailureCause::NumericalInstability)) => month - 1,
            (Some(month), _) => month,
            (None, _) => self.snapshots.len(),
        };
        &self.snapshots[..live.min(self.snapshots.len())]
    }

    /// Mean monthly churn over the live months; 0 with no live months.
    pub fn mean_churn(&self) -> f64 {
        let live = self.live_snapshots();
        if live.is_empty() {
            return 0.0;
        }
        live.iter().map(|s| s.churn_rate).sum::<f64>() / live.len() as f64
    }
}

/// Evolves one path over the configured horizon.
///
/// The config is assumed validated (horizon >= 1, finite amounts).
pub fn evolve_path<N: NoiseSource>(
    params: &DriftParams,
    config: &SimulationConfig,
    noise: &mut N,
) -> SimulationPath {
    let horizon = config.time_horizon_months;
    let base_burn = config.monthly_burn * params.opex_multiplier;
    let variance_drift = 0.5 * params.noise_sd * params.noise_sd;
    let churn_drift = 0.5 * CHURN_DISPERSION * CHURN_DISPERSION;

    let mut snapshots = Vec::with_capacity(horizon);
    let mut last = MonthlySnapshot {
        cash: config.starting_cash,
        arr: config.starting_arr,
        burn: base_burn,
        growth_rate: 0.0,
        churn_rate: params.mean_churn,
    };

    for month in 1..=horizon {
        let shocks = noise.monthly_shocks();

        let churn = (params.mean_churn * (CHURN_DISPERSION * shocks.churn - churn_drift).exp())
            .min(1.0);
        let log_growth =
            params.growth_drift - churn - variance_drift + params.noise_sd * shocks.growth;
        let arr = last.arr * log_growth.exp();
        let burn = base_burn + (config.starting_arr - arr) / 12.0;
        let cash = last.cash - burn;
        let growth_rate = if last.arr > 0.0 {
            arr / last.arr - 1.0
        } else {
            0.0
        };

        let snapshot = MonthlySnapshot {
            cash,
            arr,
            burn,
            growth_rate,
            churn_rate: churn,
        };

        if !snapshot.is_finite() {
            snapshots.resize(horizon, last);
            return failed(
                snapshots,
                month,
                FailureCause::NumericalInstability,
                (month - 1) as f64,
            );
        }

        snapshots.push(snapshot);

        if cash < 0.0 {
            // Fraction of the failing month covered by the previous balance.
            let partial = safe_ratio(last.cash, burn, 0.0).clamp(0.0, 1.0);
            snapshots.resize(horizon, snapshot);
            return failed(
                snapshots,
                month,
                FailureCause::Insolvent,
                (month - 1) as f64 + partial,
            );
        }

        last = snapshot;
    }

    let runway = if last.burn > EPSILON {
        horizon as f64 + last.cash / last.burn
    } else {
        RUNWAY_CAP_MONTHS
    };

    SimulationPath {
        snapshots,
        survived: true,
        failure_month: None,
        failure_cause: None,
        runway_months: runway.min(RUNWAY_CAP_MONTHS),
    }
}

fn failed(
    snapshots: Vec<MonthlySnapshot>,
    month: usize,
    cause: FailureCause,
    runway: f64,
) -> SimulationPath {
    SimulationPath {
        snapshots,
        survived: false,
        failure_month: Some(month),
        failure_cause: Some(cause),
        runway_months: runway.min(RUNWAY_CAP_MONTHS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mc::calibration::ShockProfile;
    use crate::rng::{FixedNoise, SimRng};
    use survival_core::LeverState;

    fn config(cash: f64, arr: f64, burn: f64, horizon: usize) -> SimulationConfig {
        SimulationConfig::builder()
            .iterations(1)
            .time_horizon_months(horizon)
            .starting_cash(cash)
            .starting_arr(arr)
            .monthly_burn(burn)
            .build()
            .unwrap()
    }

    fn neutral_params() -> DriftParams {
        DriftParams::from_levers(&LeverState::neutral(), &ShockProfile::none())
    }

    #[test]
    fn test_path_length_equals_horizon() {
        let cfg = config(4_000_000.0, 4_800_000.0, 47_000.0, 36);
        let path = evolve_path(&neutral_params(), &cfg, &mut SimRng::from_seed(1));
        assert_eq!(path.snapshots.len(), 36);
    }

    #[test]
    fn test_deterministic_burn_without_revenue() {
        // No ARR: burn is constant, cash runs out in month 11.
        let cfg = config(1_000.0, 0.0, 100.0, 24);
        let path = evolve_path(&neutral_params(), &cfg, &mut FixedNoise::median());

        assert!(!path.survived);
        assert_eq!(path.failure_month, Some(11));
        assert_eq!(path.failure_cause, Some(FailureCause::Insolvent));
        // Month 10 ends with exactly zero cash, month 11 goes negative.
        assert!((path.runway_months - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_absorbing_failure_repeats_state() {
        let cfg = config(1_000.0, 0.0, 100.0, 24);
        let path = evolve_path(&neutral_params(), &cfg, &mut FixedNoise::median());
        let failing = path.snapshots[10];
        assert!(failing.cash < 0.0);
        for snapshot in &path.snapshots[10..] {
            assert_eq!(*snapshot, failing);
        }
        assert!(path.is_solvent_at(10));
        assert!(!path.is_solvent_at(11));
        assert!(!path.is_solvent_at(24));
    }

    #[test]
    fn test_survivor_runway_capped() {
        let cfg = config(10_000_000.0, 1_000_000.0, 1.0, 12);
        let path = evolve_path(&neutral_params(), &cfg, &mut FixedNoise::median());
        assert!(path.survived);
        assert!(path.runway_months <= RUNWAY_CAP_MONTHS);
        assert!(path.runway_months >= 12.0);
    }

    #[test]
    fn test_non_finite_is_failure() {
        let mut params = neutral_params();
        params.growth_drift = f64::INFINITY;
        let cfg = config(1_000_000.0, 1_000_000.0, 1_000.0, 12);
        let path = evolve_path(&params, &cfg, &mut FixedNoise::median());

        assert!(!path.survived);
        assert_eq!(path.failure_month, Some(1));
        assert_eq!(path.failure_cause, Some(FailureCause::NumericalInstability));
        assert!(path.runway_months.is_finite());
        for snapshot in &path.snapshots {
            assert!(snapshot.cash.is_finite());
            assert_eq!(snapshot.cash, 1_000_000.0);
        }
        assert_eq!(path.mean_churn(), 0.0);
    }

    #[test]
    fn test_mean_churn_near_calibrated_mean() {
        let cfg = config(4_000_000.0, 4_800_000.0, 47_000.0, 36);
        let path = evolve_path(&neutral_params(), &cfg, &mut FixedNoise::median());
        // Median churn draw is exp(-dispersion^2 / 2) of the mean.
        let expected = 0.025 * (-0.5 * CHURN_DISPERSION * CHURN_DISPERSION).exp();
        assert!((path.mean_churn() - expected).abs() < 1e-12);
    }
}
