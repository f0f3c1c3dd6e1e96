//! Lever sensitivity and tornado ranking.
//!
//! Each lever is nudged five points down and up (clamped to `[0, 100]`) and
//! re-estimated. Base, low and high runs share one seed, so differences come
//! from the lever and not from sampling noise.
//!
//! For one direction the effect is
//!
//! ```text
//! effect = 0.6 |dSurvival| + 0.4 |dRunway| / max(eps, baseRunway)
//! ```
//!
//! and a lever's raw magnitude is its larger directional effect. Scores are
//! raw magnitudes divided by the largest one, so the top lever scores 1 (all
//! scores are 0 when nothing moves). Levers are analysed in parallel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use survival_core::math::{finite_or_zero, EPSILON};
use survival_core::{ConfigError, Fidelity, LeverId, LeverState, SimulationConfig};
use survival_engine::mc::ShockProfile;
use tracing::debug;

use crate::estimator::{estimator_for, Estimate, OutcomeEstimator};

/// Lever points moved in each direction.
pub const NUDGE_POINTS: i64 = 5;

/// Iterations per sensitivity run.
pub const DEFAULT_SENSITIVITY_ITERATIONS: usize = 200;

/// Seed shared by every sensitivity run unless overridden.
pub const DEFAULT_SENSITIVITY_SEED: u64 = 0x5EED;

/// Weight of the survival change in a directional effect.
pub const SURVIVAL_EFFECT_WEIGHT: f64 = 0.6;

/// Weight of the relative runway change in a directional effect.
pub const RUNWAY_EFFECT_WEIGHT: f64 = 0.4;

/// Sensitivity run settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityConfig {
    /// Points moved in each direction.
    pub nudge: i64,
    /// Paths per run (Monte Carlo only).
    pub iterations: usize,
    /// Common seed (Monte Carlo only).
    pub seed: u64,
    /// Estimation fidelity.
    pub fidelity: Fidelity,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            nudge: NUDGE_POINTS,
            iterations: DEFAULT_SENSITIVITY_ITERATIONS,
            seed: DEFAULT_SENSITIVITY_SEED,
            fidelity: Fidelity::FullMonteCarlo,
        }
    }
}

impl SensitivityConfig {
    /// Returns a copy with a different fidelity.
    pub fn with_fidelity(mut self, fidelity: Fidelity) -> Self {
        self.fidelity = fidelity;
        self
    }

    /// Returns a copy with a different iteration count.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Returns a copy with a different seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Which nudge improves survival.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElasticityDirection {
    /// Raising the lever helps.
    Positive,
    /// Lowering the lever helps.
    Negative,
    /// No measurable difference.
    Neutral,
}

/// Sensitivity of one lever.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElasticityResult {
    /// Lever analysed.
    pub variable: LeverId,
    /// Lever label.
    pub label: String,
    /// Raw magnitude over the largest raw magnitude, `[0, 1]`.
    pub elasticity_score: f64,
    /// Which nudge improves survival.
    pub direction: ElasticityDirection,
    /// Signed survival change of the stronger direction.
    pub delta_survival: f64,
    /// Signed runway change of the stronger direction.
    pub delta_runway: f64,
    /// Survival with the lever nudged down.
    pub low_survival: f64,
    /// Survival with the lever nudged up.
    pub high_survival: f64,
    /// Median runway with the lever nudged down.
    pub low_runway: f64,
    /// Median runway with the lever nudged up.
    pub high_runway: f64,
    /// `high_survival - low_survival`.
    pub spread: f64,
    #[serde(skip)]
    raw_magnitude: f64,
}

/// Chart-facing projection of an [`ElasticityResult`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TornadoBar {
    /// Lever.
    pub variable: LeverId,
    /// Lever label.
    pub label: String,
    /// Survival at the unperturbed levers.
    pub base_survival: f64,
    /// Survival with the lever nudged down.
    pub low_survival: f64,
    /// Survival with the lever nudged up.
    pub high_survival: f64,
    /// `high_survival - low_survival`.
    pub spread: f64,
    /// Normalised score.
    pub elasticity_score: f64,
}

/// Ranked sensitivities plus the base run they were measured against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityReport {
    /// Fidelity used.
    pub fidelity: Fidelity,
    /// Survival at the unperturbed levers.
    pub base_survival: f64,
    /// Median runway at the unperturbed levers.
    pub base_runway: f64,
    /// Levers by descending score.
    pub levers: Vec<ElasticityResult>,
}

impl SensitivityReport {
    /// Tornado bars in ranking order.
    pub fn tornado(&self) -> Vec<TornadoBar> {
        self.levers
            .iter()
            .map(|r| TornadoBar {
                variable: r.variable,
                label: r.label.clone(),
                base_survival: self.base_survival,
                low_survival: r.low_survival,
                high_survival: r.high_survival,
                spread: r.spread,
                elasticity_score: r.elasticity_score,
            })
            .collect()
    }
}

/// Ranks the nine levers with default settings.
///
/// # Errors
///
/// Returns `ConfigError` when `config` fails validation.
pub fn rank_levers(
    levers: &LeverState,
    config: &SimulationConfig,
) -> Result<Vec<ElasticityResult>, ConfigError> {
    rank_levers_with(levers, config, &SensitivityConfig::default())
}

/// Ranks the nine levers with explicit settings.
///
/// # Errors
///
/// Returns `ConfigError` when `config` fails validation.
pub fn rank_levers_with(
    levers: &LeverState,
    config: &SimulationConfig,
    settings: &SensitivityConfig,
) -> Result<Vec<ElasticityResult>, ConfigError> {
    Ok(analyse(levers, config, settings)?.levers)
}

/// Tornado bars with default settings.
///
/// # Errors
///
/// Returns `ConfigError` when `config` fails validation.
pub fn tornado(
    levers: &LeverState,
    config: &SimulationConfig,
) -> Result<Vec<TornadoBar>, ConfigError> {
    Ok(analyse(levers, config, &SensitivityConfig::default())?.tornado())
}

/// Full sensitivity analysis with explicit settings.
///
/// # Errors
///
/// Returns `ConfigError` when `config` fails validation.
///
/// # Examples
///
/// ```rust
/// use survival_core::{Fidelity, LeverState, SimulationConfig};
/// use survival_risk::sensitivity::{analyse, SensitivityConfig};
///
/// let config = SimulationConfig::builder()
///     .starting_cash(2_000_000.0)
///     .starting_arr(1_500_000.0)
///     .monthly_burn(120_000.0)
///     .build()
///     .unwrap();
///
/// let settings = SensitivityConfig::default().with_fidelity(Fidelity::Fast);
/// let report = analyse(&LeverState::neutral(), &config, &settings).unwrap();
/// assert_eq!(report.levers.len(), 9);
/// assert!(report.levers.windows(2).all(|w| w[0].elasticity_score >= w[1].elasticity_score));
/// ```
pub fn analyse(
    levers: &LeverState,
    config: &SimulationConfig,
    settings: &SensitivityConfig,
) -> Result<SensitivityReport, ConfigError> {
    let estimator = estimator_for(settings.fidelity, Some(settings.seed));
    let run_config = config.with_iterations(settings.iterations);
    analyse_with(estimator.as_ref(), levers, &run_config, settings.nudge)
}

/// Sensitivity analysis through `estimator`; `config` is used as given.
///
/// # Errors
///
/// Returns `ConfigError` when `config` fails validation.
pub fn analyse_with(
    estimator: &dyn OutcomeEstimator,
    levers: &LeverState,
    config: &SimulationConfig,
    nudge: i64,
) -> Result<SensitivityReport, ConfigError> {
    let none = ShockProfile::none();
    let base = estimator.estimate(levers, config, &none)?;
    let base_survival = base.metrics.survival_rate;
    let base_runway = base.metrics.median_runway;

    let mut results = LeverId::ALL
        .par_iter()
        .map(|&id| -> Result<ElasticityResult, ConfigError> {
            let low = estimator.estimate(&levers.nudged(id, -nudge), config, &none)?;
            let high = estimator.estimate(&levers.nudged(id, nudge), config, &none)?;
            Ok(measure(id, &base, &low, &high))
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    let max_raw = results
        .iter()
        .map(|r| r.raw_magnitude)
        .fold(0.0_f64, f64::max);
    for result in &mut results {
        result.elasticity_score = if max_raw > 0.0 {
            (result.raw_magnitude / max_raw).clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    // Stable sort keeps canonical lever order among ties.
    results.sort_by(|a, b| b.elasticity_score.total_cmp(&a.elasticity_score));

    debug!(
        fidelity = estimator.fidelity().name(),
        base_survival,
        top = results.first().map(|r| r.variable.key()),
        "ranked levers"
    );

    Ok(SensitivityReport {
        fidelity: estimator.fidelity(),
        base_survival,
        base_runway,
        levers: results,
    })
}

fn measure(id: LeverId, base: &Estimate, low: &Estimate, high: &Estimate) -> ElasticityResult {
    let base_runway = base.metrics.median_runway;
    let effect = |outcome: &Estimate| -> (f64, f64, f64) {
        let d_survival = outcome.metrics.survival_rate - base.metrics.survival_rate;
        let d_runway = outcome.metrics.median_runway - base_runway;
        let magnitude = SURVIVAL_EFFECT_WEIGHT * d_survival.abs()
            + RUNWAY_EFFECT_WEIGHT * d_runway.abs() / base_runway.abs().max(EPSILON);
        (finite_or_zero(magnitude), d_survival, d_runway)
    };

    let (low_effect, low_ds, low_dr) = effect(low);
    let (high_effect, high_ds, high_dr) = effect(high);
    let (raw_magnitude, delta_survival, delta_runway) = if high_effect >= low_effect {
        (high_effect, high_ds, high_dr)
    } else {
        (low_effect, low_ds, low_dr)
    };

    let low_survival = low.metrics.survival_rate;
    let high_survival = high.metrics.survival_rate;
    let low_runway = low.metrics.median_runway;
    let high_runway = high.metrics.median_runway;

    let direction = if (high_survival - low_survival).abs() > EPSILON {
        if high_survival > low_survival {
            ElasticityDirection::Positive
        } else {
            ElasticityDirection::Negative
        }
    } else if (high_runway - low_runway).abs() > EPSILON {
        if high_runway > low_runway {
            ElasticityDirection::Positive
        } else {
            ElasticityDirection::Negative
        }
    } else {
        ElasticityDirection::Neutral
    };

    ElasticityResult {
        variable: id,
        label: id.label().to_string(),
        elasticity_score: 0.0,
        direction,
        delta_survival,
        delta_runway,
        low_survival,
        high_survival,
        low_runway,
        high_runway,
        spread: high_survival - low_survival,
        raw_magnitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survival_engine::mc::{BaselineMetrics, Percentiles};

    fn estimate(survival: f64, runway: f64) -> Estimate {
        Estimate {
            fidelity: Fidelity::Fast,
            iteration_count: 0,
            seed: None,
            metrics: BaselineMetrics {
                survival_rate: survival,
                median_runway: runway,
                ..Default::default()
            },
            arr_percentiles: Percentiles::default(),
            runway_percentiles: Percentiles::default(),
            survival_by_month: Vec::new(),
        }
    }

    fn config() -> SimulationConfig {
        SimulationConfig::builder()
            .starting_cash(2_000_000.0)
            .starting_arr(1_500_000.0)
            .monthly_burn(120_000.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_measure_picks_stronger_direction() {
        let base = estimate(0.5, 20.0);
        let low = estimate(0.4, 18.0);
        let high = estimate(0.55, 21.0);
        let result = measure(LeverId::DemandStrength, &base, &low, &high);

        // low: 0.6 * 0.1 + 0.4 * 2 / 20 = 0.10; high: 0.6 * 0.05 + 0.4 * 1 / 20 = 0.05
        assert!((result.raw_magnitude - 0.10).abs() < 1e-12);
        assert!((result.delta_survival + 0.1).abs() < 1e-12);
        assert!((result.delta_runway + 2.0).abs() < 1e-12);
        assert_eq!(result.direction, ElasticityDirection::Positive);
        assert!((result.spread - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_direction_tie_broken_by_runway() {
        let base = estimate(1.0, 40.0);
        let result = measure(LeverId::HiringIntensity, &base, &estimate(1.0, 45.0), &estimate(1.0, 35.0));
        assert_eq!(result.direction, ElasticityDirection::Negative);

        let flat = measure(LeverId::HiringIntensity, &base, &base, &base);
        assert_eq!(flat.direction, ElasticityDirection::Neutral);
        assert_eq!(flat.raw_magnitude, 0.0);
    }

    #[test]
    fn test_zero_base_runway_is_finite() {
        let base = estimate(0.0, 0.0);
        let result = measure(LeverId::CostDiscipline, &base, &estimate(0.0, 0.0), &estimate(0.0, 1.0));
        assert!(result.raw_magnitude.is_finite());
    }

    #[test]
    fn test_fast_ranking_shape() {
        let settings = SensitivityConfig::default().with_fidelity(Fidelity::Fast);
        let report = analyse(&LeverState::neutral(), &config(), &settings).unwrap();

        assert_eq!(report.levers.len(), 9);
        let top = report.levers[0].elasticity_score;
        assert!(top == 1.0 || top == 0.0);
        assert!(report.levers.iter().all(|r| (0.0..=1.0).contains(&r.elasticity_score)));

        let bars = report.tornado();
        assert_eq!(bars.len(), 9);
        assert!(bars.iter().all(|b| b.base_survival == report.base_survival));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut bad = config();
        bad.starting_cash = f64::NAN;
        assert!(rank_levers(&LeverState::neutral(), &bad).is_err());
    }

    #[test]
    fn test_raw_magnitude_not_serialised() {
        let result = measure(
            LeverId::PricingPower,
            &estimate(0.5, 10.0),
            &estimate(0.4, 9.0),
            &estimate(0.6, 11.0),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("rawMagnitude").is_none());
        assert_eq!(json["variable"], "pricingPower");
        assert_eq!(json["direction"], "positive");
    }
}
