//! Unified risk engine facade.
//!
//! [`RiskEngine`] runs the whole pipeline (baseline, shock, transmission
//! chain, risk index) at one [`Fidelity`]. It holds only settings, so a
//! single instance can be cloned and shared across threads, and every call
//! is independent of the previous one.
//!
//! Configuration errors never escape the facade: they are reported as
//! [`Computation::NotComputed`] with a reason the caller can display.

use serde::{Deserialize, Serialize};
use survival_core::{ConfigError, Fidelity, LeverId, LeverState, SimulationConfig};
use survival_engine::mc::{BaselineMetrics, Percentiles, ShockProfile};
use survival_engine::rng::system_seed;
use tracing::{debug, warn};

use crate::estimator::estimator_for;
use crate::risk_index::{compose_risk_index, RiskIndexInputs, RiskIndexResult};
use crate::sensitivity::{analyse, SensitivityConfig, TornadoBar};
use crate::shock::{shock_with, ShockedBatchResult, DEFAULT_MINI_ITERATIONS};
use crate::transmission::{build_chain, TransmissionNode};

/// Settings of a [`RiskEngine`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    /// Estimation fidelity for every stage.
    pub fidelity: Fidelity,
    /// Paths in each shock batch.
    pub shock_iterations: usize,
    /// Sensitivity settings; its fidelity is overridden by [`Self::fidelity`].
    pub sensitivity: SensitivityConfig,
    /// Seed shared by the baseline and shock batches. Drawn from system
    /// entropy per call when absent.
    pub seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fidelity: Fidelity::FullMonteCarlo,
            shock_iterations: DEFAULT_MINI_ITERATIONS,
            sensitivity: SensitivityConfig::default(),
            seed: None,
        }
    }
}

impl EngineSettings {
    /// Default settings at `fidelity`.
    pub fn with_fidelity(fidelity: Fidelity) -> Self {
        Self {
            fidelity,
            ..Self::default()
        }
    }

    /// Returns a copy pinned to `seed`.
    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Result of an engine call that may not have been computed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Computation<T> {
    /// The computation ran.
    Computed(T),
    /// Inputs were invalid; nothing was computed.
    NotComputed {
        /// Human-readable reason.
        reason: String,
    },
}

impl<T> Computation<T> {
    /// Whether the computation ran.
    pub fn is_computed(&self) -> bool {
        matches!(self, Computation::Computed(_))
    }

    /// The computed value, if any.
    pub fn computed(&self) -> Option<&T> {
        match self {
            Computation::Computed(value) => Some(value),
            Computation::NotComputed { .. } => None,
        }
    }

    /// Consumes the outcome, returning the computed value if any.
    pub fn into_computed(self) -> Option<T> {
        match self {
            Computation::Computed(value) => Some(value),
            Computation::NotComputed { .. } => None,
        }
    }

    /// The reason nothing was computed, if so.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Computation::Computed(_) => None,
            Computation::NotComputed { reason } => Some(reason),
        }
    }

    fn from_result(result: Result<T, ConfigError>) -> Self {
        match result {
            Ok(value) => Computation::Computed(value),
            Err(err) => {
                debug!(error = %err, "computation skipped");
                Computation::NotComputed {
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// Outcome of [`RiskEngine::analyze`].
pub type AnalysisOutcome = Computation<Box<ScenarioAnalysis>>;

/// Outcome of [`RiskEngine::tornado`].
pub type TornadoOutcome = Computation<TornadoReport>;

/// Full stress analysis of one scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioAnalysis {
    /// Fidelity used.
    pub fidelity: Fidelity,
    /// Baseline paths; 0 for an analytic estimate.
    pub iteration_count: usize,
    /// Seed shared by the baseline and shock batches.
    pub seed: Option<u64>,
    /// Whether the baseline sample is below the institutional threshold.
    pub small_sample: bool,
    /// Unstressed metrics over the full baseline sample.
    pub headline: BaselineMetrics,
    /// Unstressed metrics at the shock batch size and seed; the chain and
    /// risk index compare against these.
    pub baseline: BaselineMetrics,
    /// Unstressed terminal ARR percentiles.
    pub baseline_arr_percentiles: Percentiles,
    /// Unstressed runway percentiles.
    pub baseline_runway_percentiles: Percentiles,
    /// Unstressed survival curve; empty for an analytic estimate.
    pub survival_by_month: Vec<f64>,
    /// Stressed batch.
    pub shocked: ShockedBatchResult,
    /// Causal chain from baseline to stress.
    pub chain: [TransmissionNode; 5],
    /// Composite risk index.
    pub risk_index: RiskIndexResult,
}

/// Tornado bars with the fidelity that produced them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TornadoReport {
    /// Fidelity used.
    pub fidelity: Fidelity,
    /// Survival at the unperturbed levers.
    pub base_survival: f64,
    /// Bars by descending elasticity.
    pub bars: Vec<TornadoBar>,
}

/// Stateless risk engine.
///
/// # Examples
///
/// ```rust
/// use survival_core::{Fidelity, LeverState, SimulationConfig};
/// use survival_risk::engine::{EngineSettings, RiskEngine};
///
/// let engine = RiskEngine::new(EngineSettings::with_fidelity(Fidelity::Fast));
/// let config = SimulationConfig::builder()
///     .starting_cash(4_000_000.0)
///     .starting_arr(4_800_000.0)
///     .monthly_burn(47_000.0)
///     .build()
///     .unwrap();
///
/// let outcome = engine.analyze(&LeverState::neutral(), &config, 1.0);
/// let analysis = outcome.computed().unwrap();
/// assert_eq!(analysis.chain.len(), 5);
/// assert!((0.0..=1.0).contains(&analysis.risk_index.score));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RiskEngine {
    settings: EngineSettings,
}

impl RiskEngine {
    /// Creates an engine.
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    /// The engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Analyses `levers` under a shock of `sigma`.
    ///
    /// The baseline uses `config.iterations`; the shock batch uses
    /// [`EngineSettings::shock_iterations`].
    pub fn analyze(
        &self,
        levers: &LeverState,
        config: &SimulationConfig,
        sigma: f64,
    ) -> AnalysisOutcome {
        Computation::from_result(self.try_analyze(levers, config, sigma).map(Box::new))
    }

    /// Ranks lever sensitivities as tornado bars.
    pub fn tornado(&self, levers: &LeverState, config: &SimulationConfig) -> TornadoOutcome {
        let settings = self
            .settings
            .sensitivity
            .clone()
            .with_fidelity(self.settings.fidelity);
        Computation::from_result(analyse(levers, config, &settings).map(|report| TornadoReport {
            fidelity: report.fidelity,
            base_survival: report.base_survival,
            bars: report.tornado(),
        }))
    }

    fn try_analyze(
        &self,
        levers: &LeverState,
        config: &SimulationConfig,
        sigma: f64,
    ) -> Result<ScenarioAnalysis, ConfigError> {
        let fidelity = self.settings.fidelity;
        let seed = match fidelity {
            Fidelity::Fast => None,
            Fidelity::FullMonteCarlo => Some(self.settings.seed.unwrap_or_else(system_seed)),
        };
        let estimator = estimator_for(fidelity, seed);

        let baseline = estimator.estimate(levers, config, &ShockProfile::none())?;
        if baseline.is_small_sample() {
            warn!(
                iterations = baseline.iteration_count,
                "baseline sample is below the institutional threshold"
            );
        }

        // Same paths and sample size as the shock batch, so sigma 0 is an
        // exact identity.
        let mini = self.settings.shock_iterations;
        let reference = shock_with(estimator.as_ref(), levers, config, 0.0, mini)?.metrics;
        let shocked = shock_with(estimator.as_ref(), levers, config, sigma, mini)?;

        let chain = build_chain(&reference, &shocked);
        let risk_index = compose_risk_index(&RiskIndexInputs {
            sigma: shocked.sigma,
            baseline_survival: reference.survival_rate,
            shocked_survival: shocked.metrics.survival_rate,
            baseline_runway: reference.median_runway,
            shocked_runway: shocked.metrics.median_runway,
            arr_p25: baseline.arr_percentiles.p25,
            arr_p50: baseline.arr_percentiles.p50,
            arr_p75: baseline.arr_percentiles.p75,
            lever_debt_exposure: f64::from(levers.get(LeverId::FundingPressure)),
        });

        debug!(
            fidelity = fidelity.name(),
            sigma = shocked.sigma,
            score = risk_index.score,
            band = risk_index.band.name(),
            "scenario analysed"
        );

        Ok(ScenarioAnalysis {
            fidelity,
            iteration_count: baseline.iteration_count,
            seed,
            small_sample: baseline.is_small_sample(),
            headline: baseline.metrics,
            baseline: reference,
            baseline_arr_percentiles: baseline.arr_percentiles,
            baseline_runway_percentiles: baseline.runway_percentiles,
            survival_by_month: baseline.survival_by_month,
            shocked,
            chain,
            risk_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{MonteCarloEstimator, OutcomeEstimator};
    use crate::transmission::{Direction, Impact};

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
    fn test_invalid_config_not_computed() {
        let mut bad = config(100);
        bad.starting_cash = -5.0;
        let outcome = RiskEngine::default().analyze(&LeverState::neutral(), &bad, 1.0);
        assert!(!outcome.is_computed());
        assert!(outcome.reason().unwrap().contains("startingCash"));

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "notComputed");
    }

    #[test]
    fn test_seeded_analysis_is_deterministic() {
        let engine = RiskEngine::new(EngineSettings::default().seeded(77));
        let levers = LeverState::neutral();
        let a = engine.analyze(&levers, &config(300), 1.5);
        let b = engine.analyze(&levers, &config(300), 1.5);
        assert_eq!(a, b);

        let analysis = a.into_computed().unwrap();
        assert_eq!(analysis.seed, Some(77));
        assert_eq!(analysis.iteration_count, 300);
        assert!(analysis.small_sample);
        assert_eq!(analysis.shocked.iteration_count, DEFAULT_MINI_ITERATIONS);
    }

    #[test]
    fn test_fast_and_full_share_shape() {
        let levers = LeverState::neutral();
        let fast = RiskEngine::new(EngineSettings::with_fidelity(Fidelity::Fast))
            .analyze(&levers, &config(1_000), 2.0)
            .into_computed()
            .unwrap();
        let full = RiskEngine::new(EngineSettings::default().seeded(1))
            .analyze(&levers, &config(1_000), 2.0)
            .into_computed()
            .unwrap();

        assert_eq!(fast.fidelity, Fidelity::Fast);
        assert_eq!(fast.iteration_count, 0);
        assert_eq!(fast.seed, None);
        assert!(!fast.small_sample);
        assert_eq!(full.fidelity, Fidelity::FullMonteCarlo);
        assert!(!full.small_sample);

        let fast_json = serde_json::to_value(&fast).unwrap();
        let full_json = serde_json::to_value(&full).unwrap();
        let keys = |v: &serde_json::Value| {
            let mut k: Vec<String> = v.as_object().unwrap().keys().cloned().collect();
            k.sort();
            k
        };
        assert_eq!(keys(&fast_json), keys(&full_json));
    }

    #[test]
    fn test_computed_serialises_with_status() {
        let outcome = RiskEngine::new(EngineSettings::with_fidelity(Fidelity::Fast)).analyze(
            &LeverState::neutral(),
            &config(1_000),
            0.5,
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "computed");
        assert!(json["riskIndex"]["score"].is_number());
        assert_eq!(json["chain"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_zero_sigma_reports_no_stress() {
        let engine = RiskEngine::new(EngineSettings::default().seeded(42));
        let levers = LeverState::neutral()
            .with(LeverId::DemandStrength, 20)
            .with(LeverId::PricingPower, 20);
        let analysis = engine
            .analyze(&levers, &config(1_000), 0.0)
            .into_computed()
            .unwrap();

        assert_eq!(analysis.baseline, analysis.shocked.metrics);
        assert_eq!(analysis.iteration_count, 1_000);
        for node in &analysis.chain {
            assert_eq!(node.delta_pct, 0.0);
            assert_eq!(node.direction, Direction::Neutral);
            assert_eq!(node.impact, Impact::Neutral);
        }
        assert_eq!(analysis.risk_index.components.survival_elasticity, 0.0);
        assert_eq!(analysis.risk_index.components.runway_elasticity, 0.0);
    }

    #[test]
    fn test_headline_uses_full_sample() {
        let engine = RiskEngine::new(EngineSettings::default().seeded(42));
        let levers = LeverState::neutral();
        let analysis = engine
            .analyze(&levers, &config(1_000), 1.0)
            .into_computed()
            .unwrap();

        let full = MonteCarloEstimator::seeded(42)
            .estimate(&levers, &config(1_000), &ShockProfile::none())
            .unwrap();
        assert_eq!(analysis.headline, full.metrics);
        assert_eq!(analysis.survival_by_month, full.survival_by_month);
    }

    #[test]
    fn test_tornado_outcome() {
        let engine = RiskEngine::new(EngineSettings::with_fidelity(Fidelity::Fast));
        let report = engine
            .tornado(&LeverState::neutral(), &config(1_000))
            .into_computed()
            .unwrap();
        assert_eq!(report.fidelity, Fidelity::Fast);
        assert_eq!(report.bars.len(), 9);
    }
}
