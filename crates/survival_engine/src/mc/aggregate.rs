//! Reduction of raw paths into batch statistics.
//!
//! Percentiles sort the per-path terminal values and index at `floor(N p)`,
//! so they are monotone (`p10 <= p25 <= p50 <= p75 <= p90`) by construction.
//! Because failure is absorbing, the survival-by-month curve is
//! non-increasing without extra bookkeeping.

use serde::{Deserialize, Serialize};
use survival_core::math::percentile_index;
use survival_core::INSTITUTIONAL_SAMPLE_THRESHOLD;

use super::paths::{FailureCause, MonthlySnapshot, SimulationPath};

/// Five-point percentile band.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    /// 10th percentile.
    pub p10: f64,
    /// 25th percentile.
    pub p25: f64,
    /// Median.
    pub p50: f64,
    /// 75th percentile.
    pub p75: f64,
    /// 90th percentile.
    pub p90: f64,
}

impl Percentiles {
    /// Percentiles of an unsorted sample; all zeros for an empty sample.
    pub fn from_unsorted(mut values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Percentiles of an ascending sample.
    pub fn from_sorted(sorted: &[f64]) -> Self {
        if sorted.is_empty() {
            return Self::default();
        }
        let n = sorted.len();
        let at = |p: f64| sorted[percentile_index(n, p)];
        Self {
            p10: at(0.10),
            p25: at(0.25),
            p50: at(0.50),
            p75: at(0.75),
            p90: at(0.90),
        }
    }

    /// Whether the band is ordered.
    pub fn is_monotonic(&self) -> bool {
        self.p10 <= self.p25 && self.p25 <= self.p50 && self.p50 <= self.p75 && self.p75 <= self.p90
    }
}

/// Aggregate over a batch of paths.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloResult {
    /// Number of paths aggregated.
    pub iteration_count: usize,
    /// Months per path.
    pub horizon_months: usize,
    /// Batch seed, when the result came from a seeded simulator run.
    pub seed: Option<u64>,
    /// Fraction of paths solvent through the whole horizon.
    pub survival_rate: f64,
    /// Terminal ARR percentiles.
    pub arr_percentiles: Percentiles,
    /// Implied runway percentiles (months).
    pub runway_percentiles: Percentiles,
    /// Terminal net burn percentiles.
    pub burn_percentiles: Percentiles,
    /// `survival_by_month[m]` is the fraction solvent after `m` months;
    /// length `horizon + 1`.
    pub survival_by_month: Vec<f64>,
    /// Paths that failed through numerical instability.
    pub unstable_paths: usize,
    /// The raw paths, retained for downstream re-derivation.
    pub paths: Vec<SimulationPath>,
}

impl MonteCarloResult {
    /// Returns `true` when fewer than [`INSTITUTIONAL_SAMPLE_THRESHOLD`]
    /// paths were aggregated.
    #[inline]
    pub fn is_small_sample(&self) -> bool {
        self.iteration_count < INSTITUTIONAL_SAMPLE_THRESHOLD
    }

    /// Attaches the batch seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Aggregates paths into a [`MonteCarloResult`].
///
/// The reduction is order-independent. An empty slice yields a zero result
/// (`iteration_count = 0`, empty survival curve).
///
/// # Examples
///
/// ```rust
/// use survival_core::{LeverState, SimulationConfig};
/// use survival_engine::mc::{aggregate, simulate};
///
/// let config = SimulationConfig::builder()
///     .iterations(200)
///     .starting_cash(4_000_000.0)
///     .starting_arr(4_800_000.0)
///     .monthly_burn(47_000.0)
///     .build()
///     .unwrap();
///
/// let paths = simulate(&LeverState::neutral(), &config, Some(7)).unwrap();
/// let result = aggregate(&paths);
/// assert!((0.0..=1.0).contains(&result.survival_rate));
/// assert!(result.arr_percentiles.is_monotonic());
/// ```
pub fn aggregate(paths: &[SimulationPath]) -> MonteCarloResult {
    let n = paths.len();
    let horizon = paths.iter().map(|p| p.snapshots.len()).max().unwrap_or(0);

    if n == 0 {
        return MonteCarloResult {
            iteration_count: 0,
            horizon_months: 0,
            seed: None,
            survival_rate: 0.0,
            arr_percentiles: Percentiles::default(),
            runway_percentiles: Percentiles::default(),
            burn_percentiles: Percentiles::default(),
            survival_by_month: Vec::new(),
            unstable_paths: 0,
            paths: Vec::new(),
        };
    }

    let total = n as f64;
    let survived = paths.iter().filter(|p| p.survived).count();

    let arr_percentiles = Percentiles::from_unsorted(terminal_values(paths, |s| s.arr));
    let burn_percentiles = Percentiles::from_unsorted(terminal_values(paths, |s| s.burn));
    let runway_percentiles =
        Percentiles::from_unsorted(paths.iter().map(|p| p.runway_months).collect());

    // Failures per month, then a running total.
    let mut failures_at = vec![0usize; horizon + 1];
    for month in paths.iter().filter_map(|p| p.failure_month) {
        failures_at[month.min(horizon)] += 1;
    }
    let mut alive = n;
    let survival_by_month = failures_at
        .iter()
        .map(|&failed| {
            alive -= failed;
            alive as f64 / total
        })
        .collect();

    let unstable_paths = paths
        .iter()
        .filter(|p| p.failure_cause == Some(FailureCause::NumericalInstability))
        .count();

    MonteCarloResult {
        iteration_count: n,
        horizon_months: horizon,
        seed: None,
        survival_rate: survived as f64 / total,
        arr_percentiles,
        runway_percentiles,
        burn_percentiles,
        survival_by_month,
        unstable_paths,
        paths: paths.to_vec(),
    }
}

fn terminal_values(paths: &[SimulationPath], f: impl Fn(&MonthlySnapshot) -> f64) -> Vec<f64> {
    paths
        .iter()
        .map(|p| p.terminal().map(&f).unwrap_or(0.0))
        .collect()
}
