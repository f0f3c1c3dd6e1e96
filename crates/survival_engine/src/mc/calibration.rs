//! Lever-to-dynamics calibration.
//!
//! Maps a [`LeverState`] and an optional stress [`ShockProfile`] onto the
//! four per-path dynamics parameters in [`DriftParams`]. Every mapping is
//! monotonic in each lever and bounded for levers in `[0, 100]` and sigma in
//! `[0, 3]`.
//!
//! With `x = lever / 100` and shock sigma `s`:
//!
//! ```text
//! growth drift  g = 0.08 (0.45 demand + 0.30 pricing + 0.25 expansion) max(0, 1 - 0.15 s)
//! mean churn    c = (0.010 + 0.020 (1 - demand) + 0.010 execution) (1 + 0.35 s)
//! noise sd      v = (0.015 + 0.060 volatility + 0.030 execution) (1 + 0.5 s)
//! opex          o = max(0.1, 1 + 0.6 (hiring - .5) + 0.5 (drag - .5) + 0.3 (expansion - .5)
//!                           + 0.25 (funding - .5) - 0.6 (cost - .5)) (1 + 0.10 s)
//! ```
//!
//! All rates are monthly. At `s = 0` every shock factor is exactly `1.0`.

use serde::{Deserialize, Serialize};
use survival_core::{LeverId, LeverState};

/// Largest accepted shock sigma.
pub const MAX_SIGMA: f64 = 3.0;

/// Monthly growth drift at full demand, pricing and expansion.
pub const MAX_MONTHLY_GROWTH: f64 = 0.08;

/// Floor of monthly churn with perfect demand and no execution risk.
pub const BASE_MONTHLY_CHURN: f64 = 0.010;

/// Noise floor for a perfectly calm market.
pub const BASE_NOISE_SD: f64 = 0.015;

/// Lower bound of the opex multiplier.
pub const MIN_OPEX_MULTIPLIER: f64 = 0.1;

/// Fractional growth lost per unit of sigma.
pub const GROWTH_SHOCK_DAMPING: f64 = 0.15;

/// Fractional churn added per unit of sigma.
pub const CHURN_SHOCK_LOADING: f64 = 0.35;

/// Fractional volatility added per unit of sigma.
pub const VOLATILITY_SHOCK_LOADING: f64 = 0.5;

/// Fractional opex added per unit of sigma.
pub const OPEX_SHOCK_LOADING: f64 = 0.10;

/// Stress applied to a simulation run.
///
/// Sigma is clamped to `[0, MAX_SIGMA]`; NaN becomes 0.
///
/// # Examples
///
/// ```rust
/// use survival_engine::mc::ShockProfile;
///
/// assert_eq!(ShockProfile::new(7.5).sigma(), 3.0);
/// assert_eq!(ShockProfile::none().volatility_factor(), 1.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShockProfile {
    sigma: f64,
}

impl ShockProfile {
    /// No stress.
    pub fn none() -> Self {
        Self::default()
    }

    /// Stress of the given sigma, clamped to `[0, 3]`.
    pub fn new(sigma: f64) -> Self {
        let sigma = if sigma.is_nan() {
            0.0
        } else {
            sigma.clamp(0.0, MAX_SIGMA)
        };
        Self { sigma }
    }

    /// The effective sigma.
    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Multiplier on growth drift.
    #[inline]
    pub fn growth_factor(&self) -> f64 {
        (1.0 - GROWTH_SHOCK_DAMPING * self.sigma).max(0.0)
    }

    /// Multiplier on mean churn.
    #[inline]
    pub fn churn_factor(&self) -> f64 {
        1.0 + CHURN_SHOCK_LOADING * self.sigma
    }

    /// Multiplier on the noise standard deviation.
    #[inline]
    pub fn volatility_factor(&self) -> f64 {
        1.0 + VOLATILITY_SHOCK_LOADING * self.sigma
    }

    /// Multiplier on operating expenses.
    #[inline]
    pub fn opex_factor(&self) -> f64 {
        1.0 + OPEX_SHOCK_LOADING * self.sigma
    }
}

/// Per-path dynamics derived from levers and stress.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftParams {
    /// Monthly log growth drift of ARR before churn.
    pub growth_drift: f64,
    /// Mean monthly churn fraction.
    pub mean_churn: f64,
    /// Monthly standard deviation of log ARR growth.
    pub noise_sd: f64,
    /// Multiplier applied to the configured monthly burn.
    pub opex_multiplier: f64,
}

impl DriftParams {
    /// Derives the dynamics for `levers` under `shock`.
    pub fn from_levers(levers: &LeverState, shock: &ShockProfile) -> Self {
        let demand = levers.fraction(LeverId::DemandStrength);
        let pricing = levers.fraction(LeverId::PricingPower);
        let expansion = levers.fraction(LeverId::ExpansionVelocity);
        let cost = levers.fraction(LeverId::CostDiscipline);
        let hiring = levers.fraction(LeverId::HiringIntensity);
        let drag = levers.fraction(LeverId::OperatingDrag);
        let volatility = levers.fraction(LeverId::MarketVolatility);
        let execution = levers.fraction(LeverId::ExecutionRisk);
        let funding = levers.fraction(LeverId::FundingPressure);

        let growth_drift = MAX_MONTHLY_GROWTH
            * (0.45 * demand + 0.30 * pricing + 0.25 * expansion)
            * shock.growth_factor();

        let mean_churn =
            (BASE_MONTHLY_CHURN + 0.020 * (1.0 - demand) + 0.010 * execution) * shock.churn_factor();

        let noise_sd =
            (BASE_NOISE_SD + 0.060 * volatility + 0.030 * execution) * shock.volatility_factor();

        let opex = 1.0 + 0.6 * (hiring - 0.5) + 0.5 * (drag - 0.5) + 0.3 * (expansion - 0.5)
            + 0.25 * (funding - 0.5)
            - 0.6 * (cost - 0.5);
        let opex_multiplier = opex.max(MIN_OPEX_MULTIPLIER) * shock.opex_factor();

        Self {
            growth_drift,
            mean_churn,
            noise_sd,
            opex_multiplier,
        }
    }
}
