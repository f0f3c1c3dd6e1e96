//! Composite risk index.
//!
//! Four components, each normalised to `[0, 1]`:
//!
//! ```text
//! survivalElasticity = clamp((|dSurvival| / max(eps, sigma)) / 0.33, 0, 1)
//! runwayElasticity   = clamp(|dRunway| / baselineRunway, 0, 1)   (0 if baselineRunway <= eps)
//! varianceDispersion = clamp((arrP75 - arrP25) / max(eps, arrP50), 0, 1)
//! debtSensitivity    = clamp(leverDebtExposure / 100, 0, 1)
//! ```
//!
//! The score is a fixed weighted sum (weights sum to one) and is therefore in
//! `[0, 1]`. Non-finite components are treated as zero.

use serde::{Deserialize, Serialize};
use survival_core::math::{finite_or_zero, EPSILON};

/// Survival loss per unit sigma that saturates the survival component.
pub const SURVIVAL_ELASTICITY_SCALE: f64 = 0.33;

/// Weight of the survival elasticity component.
pub const SURVIVAL_WEIGHT: f64 = 0.35;
/// Weight of the runway elasticity component.
pub const RUNWAY_WEIGHT: f64 = 0.25;
/// Weight of the ARR dispersion component.
pub const DISPERSION_WEIGHT: f64 = 0.20;
/// Weight of the debt sensitivity component.
pub const DEBT_WEIGHT: f64 = 0.20;

/// Threshold above which a survival, runway or dispersion component is
/// reported.
pub const COMPONENT_REASON_THRESHOLD: f64 = 0.5;
/// Threshold above which the debt component is reported.
pub const DEBT_REASON_THRESHOLD: f64 = 0.6;

/// Raw inputs to the composer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskIndexInputs {
    /// Effective shock sigma.
    pub sigma: f64,
    /// Unstressed survival rate.
    pub baseline_survival: f64,
    /// Stressed survival rate.
    pub shocked_survival: f64,
    /// Unstressed median runway, months.
    pub baseline_runway: f64,
    /// Stressed median runway, months.
    pub shocked_runway: f64,
    /// 25th percentile of terminal ARR.
    pub arr_p25: f64,
    /// Median terminal ARR.
    pub arr_p50: f64,
    /// 75th percentile of terminal ARR.
    pub arr_p75: f64,
    /// Debt exposure lever, `[0, 100]`.
    pub lever_debt_exposure: f64,
}

/// Normalised risk components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskComponents {
    /// Survival loss per unit of stress.
    pub survival_elasticity: f64,
    /// Relative runway loss under stress.
    pub runway_elasticity: f64,
    /// Interquartile spread of terminal ARR relative to its median.
    pub variance_dispersion: f64,
    /// Funding pressure.
    pub debt_sensitivity: f64,
}

fn unit(value: f64) -> f64 {
    finite_or_zero(value).clamp(0.0, 1.0)
}

impl RiskComponents {
    /// Computes the components from raw inputs.
    pub fn from_inputs(inputs: &RiskIndexInputs) -> Self {
        let d_survival = (inputs.baseline_survival - inputs.shocked_survival).abs();
        let survival_elasticity =
            unit(d_survival / inputs.sigma.max(EPSILON) / SURVIVAL_ELASTICITY_SCALE);

        let runway_elasticity = if inputs.baseline_runway <= EPSILON {
            0.0
        } else {
            unit((inputs.baseline_runway - inputs.shocked_runway).abs() / inputs.baseline_runway)
        };

        let variance_dispersion =
            unit((inputs.arr_p75 - inputs.arr_p25) / inputs.arr_p50.max(EPSILON));

        Self {
            survival_elasticity,
            runway_elasticity,
            variance_dispersion,
            debt_sensitivity: unit(inputs.lever_debt_exposure / 100.0),
        }
    }

    /// Clamps every component to `[0, 1]`, mapping non-finite values to 0.
    pub fn sanitised(&self) -> Self {
        Self {
            survival_elasticity: unit(self.survival_elasticity),
            runway_elasticity: unit(self.runway_elasticity),
            variance_dispersion: unit(self.variance_dispersion),
            debt_sensitivity: unit(self.debt_sensitivity),
        }
    }

    /// Weighted score of sanitised components.
    pub fn score(&self) -> f64 {
        let c = self.sanitised();
        let score = SURVIVAL_WEIGHT * c.survival_elasticity
            + RUNWAY_WEIGHT * c.runway_elasticity
            + DISPERSION_WEIGHT * c.variance_dispersion
            + DEBT_WEIGHT * c.debt_sensitivity;
        score.clamp(0.0, 1.0)
    }

    fn weighted(&self) -> [(&'static str, f64); 4] {
        [
            ("survival elasticity", SURVIVAL_WEIGHT * self.survival_elasticity),
            ("runway elasticity", RUNWAY_WEIGHT * self.runway_elasticity),
            ("revenue dispersion", DISPERSION_WEIGHT * self.variance_dispersion),
            ("debt sensitivity", DEBT_WEIGHT * self.debt_sensitivity),
        ]
    }

    /// Name of the component contributing most to the score.
    pub fn dominant(&self) -> &'static str {
        self.sanitised()
            .weighted()
            .into_iter()
            .fold(("survival elasticity", f64::NEG_INFINITY), |best, item| {
                if item.1 > best.1 {
                    item
                } else {
                    best
                }
            })
            .0
    }
}

/// Risk band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskBand {
    /// Score below 0.25.
    Low,
    /// Score below 0.45.
    Moderate,
    /// Score below 0.60.
    Elevated,
    /// Score of 0.60 or more.
    Critical,
}

impl RiskBand {
    /// Band of a score.
    pub fn from_score(score: f64) -> Self {
        if score < 0.25 {
            RiskBand::Low
        } else if score < 0.45 {
            RiskBand::Moderate
        } else if score < 0.60 {
            RiskBand::Elevated
        } else {
            RiskBand::Critical
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            RiskBand::Low => "Low",
            RiskBand::Moderate => "Moderate",
            RiskBand::Elevated => "Elevated",
            RiskBand::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Composite risk index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskIndexResult {
    /// Weighted score in `[0, 1]`.
    pub score: f64,
    /// Band of the score.
    pub band: RiskBand,
    /// Sanitised components.
    pub components: RiskComponents,
    /// Triggered explanations.
    pub reasons: Vec<String>,
}

/// Composes the index from raw inputs.
///
/// # Examples
///
/// ```rust
/// use survival_risk::risk_index::{compose_risk_index, RiskBand, RiskIndexInputs};
///
/// let result = compose_risk_index(&RiskIndexInputs {
///     sigma: 1.0,
///     baseline_survival: 0.95,
///     shocked_survival: 0.90,
///     baseline_runway: 60.0,
///     shocked_runway: 55.0,
///     arr_p25: 90.0,
///     arr_p50: 100.0,
///     arr_p75: 110.0,
///     lever_debt_exposure: 10.0,
/// });
/// assert_eq!(result.band, RiskBand::Low);
/// assert!(result.reasons.is_empty());
/// ```
pub fn compose_risk_index(inputs: &RiskIndexInputs) -> RiskIndexResult {
    compose_from_components(RiskComponents::from_inputs(inputs))
}

/// Composes the index from precomputed components.
pub fn compose_from_components(components: RiskComponents) -> RiskIndexResult {
    let components = components.sanitised();
    let score = components.score();
    let band = RiskBand::from_score(score);

    let mut reasons = Vec::new();
    if band != RiskBand::Low {
        reasons.push(format!(
            "Risk exposure exceeds {} threshold: review {}",
            band.name().to_lowercase(),
            components.dominant()
        ));
    }
    if components.survival_elasticity > COMPONENT_REASON_THRESHOLD {
        reasons.push("Survival probability is highly sensitive to stress".to_string());
    }
    if components.runway_elasticity > COMPONENT_REASON_THRESHOLD {
        reasons.push("Runway contracts sharply under stress".to_string());
    }
    if components.variance_dispersion > COMPONENT_REASON_THRESHOLD {
        reasons.push("Revenue outcomes are widely dispersed".to_string());
    }
    if components.debt_sensitivity > DEBT_REASON_THRESHOLD {
        reasons.push("Funding pressure amplifies downside exposure".to_string());
    }

    RiskIndexResult {
        score,
        band,
        components,
        reasons,
    }
}
