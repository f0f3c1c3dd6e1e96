//! Strategic input levers.
//!
//! A [`LeverState`] holds nine bounded dials in `[0, 100]`. Values outside
//! the range are clamped on every construction path (including
//! deserialisation), so a `LeverState` is always valid and never rejected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Lower bound of every lever.
pub const LEVER_MIN: u8 = 0;

/// Upper bound of every lever.
pub const LEVER_MAX: u8 = 100;

/// Neutral lever position (no tilt in either direction).
pub const LEVER_NEUTRAL: u8 = 50;

/// Identifier of a single lever.
///
/// The declaration order is the canonical order used for iteration,
/// tie-breaking in tornado rankings and positional construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeverId {
    /// Strength of underlying market demand.
    DemandStrength,
    /// Ability to raise prices without losing customers.
    PricingPower,
    /// Speed of entering new markets and segments.
    ExpansionVelocity,
    /// Rigour of spend control.
    CostDiscipline,
    /// Pace of headcount growth.
    HiringIntensity,
    /// Structural overhead and friction.
    OperatingDrag,
    /// Volatility of the surrounding market.
    MarketVolatility,
    /// Likelihood of plans not landing as intended.
    ExecutionRisk,
    /// Pressure from debt service and funding terms.
    FundingPressure,
}

impl LeverId {
    /// All levers in canonical order.
    pub const ALL: [LeverId; 9] = [
        LeverId::DemandStrength,
        LeverId::PricingPower,
        LeverId::ExpansionVelocity,
        LeverId::CostDiscipline,
        LeverId::HiringIntensity,
        LeverId::OperatingDrag,
        LeverId::MarketVolatility,
        LeverId::ExecutionRisk,
        LeverId::FundingPressure,
    ];

    /// Stable camelCase identifier, identical to the serialised field name.
    pub fn key(&self) -> &'static str {
        match self {
            LeverId::DemandStrength => "demandStrength",
            LeverId::PricingPower => "pricingPower",
            LeverId::ExpansionVelocity => "expansionVelocity",
            LeverId::CostDiscipline => "costDiscipline",
            LeverId::HiringIntensity => "hiringIntensity",
            LeverId::OperatingDrag => "operatingDrag",
            LeverId::MarketVolatility => "marketVolatility",
            LeverId::ExecutionRisk => "executionRisk",
            LeverId::FundingPressure => "fundingPressure",
        }
    }

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            LeverId::DemandStrength => "Demand Strength",
            LeverId::PricingPower => "Pricing Power",
            LeverId::ExpansionVelocity => "Expansion Velocity",
            LeverId::CostDiscipline => "Cost Discipline",
            LeverId::HiringIntensity => "Hiring Intensity",
            LeverId::OperatingDrag => "Operating Drag",
            LeverId::MarketVolatility => "Market Volatility",
            LeverId::ExecutionRisk => "Execution Risk",
            LeverId::FundingPressure => "Funding Pressure",
        }
    }

    #[inline]
    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for LeverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for LeverId {
    type Err = ConfigError;

    /// Parses camelCase, snake_case or kebab-case lever names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        LeverId::ALL
            .into_iter()
            .find(|id| id.key().to_lowercase() == normalised)
            .ok_or_else(|| ConfigError::invalid("lever", format!("unknown lever '{}'", s)))
    }
}

/// Immutable snapshot of all nine lever positions.
///
/// # Examples
///
/// ```rust
/// use survival_core::{LeverId, LeverState};
///
/// let levers = LeverState::neutral()
///     .with(LeverId::ExecutionRisk, 90)
///     .with(LeverId::CostDiscipline, -20);
///
/// assert_eq!(levers.get(LeverId::ExecutionRisk), 90);
/// assert_eq!(levers.get(LeverId::CostDiscipline), 0);
/// assert_eq!(levers.get(LeverId::PricingPower), 50);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "LeverInput")]
pub struct LeverState {
    demand_strength: u8,
    pricing_power: u8,
    expansion_velocity: u8,
    cost_discipline: u8,
    hiring_intensity: u8,
    operating_drag: u8,
    market_volatility: u8,
    execution_risk: u8,
    funding_pressure: u8,
}

impl Default for LeverState {
    fn default() -> Self {
        Self::neutral()
    }
}

impl LeverState {
    /// All levers at the neutral position (50).
    pub fn neutral() -> Self {
        Self::uniform(LEVER_NEUTRAL as i64)
    }

    /// All levers at the same (clamped) value.
    pub fn uniform(value: i64) -> Self {
        Self::from_values([value; 9])
    }

    /// Builds a state from values in canonical [`LeverId::ALL`] order.
    pub fn from_values(values: [i64; 9]) -> Self {
        let v = values.map(clamp_lever);
        Self {
            demand_strength: v[0],
            pricing_power: v[1],
            expansion_velocity: v[2],
            cost_discipline: v[3],
            hiring_intensity: v[4],
            operating_drag: v[5],
            market_volatility: v[6],
            execution_risk: v[7],
            funding_pressure: v[8],
        }
    }

    /// Lever values in canonical order.
    pub fn values(&self) -> [u8; 9] {
        [
            self.demand_strength,
            self.pricing_power,
            self.expansion_velocity,
            self.cost_discipline,
            self.hiring_intensity,
            self.operating_drag,
            self.market_volatility,
            self.execution_risk,
            self.funding_pressure,
        ]
    }

    /// Returns the value of one lever.
    #[inline]
    pub fn get(&self, id: LeverId) -> u8 {
        self.values()[id.index()]
    }

    /// Returns the value of one lever scaled to `[0, 1]`.
    #[inline]
    pub fn fraction(&self, id: LeverId) -> f64 {
        f64::from(self.get(id)) / f64::from(LEVER_MAX)
    }

    /// Returns a copy with one lever replaced (clamped to `[0, 100]`).
    pub fn with(&self, id: LeverId, value: i64) -> Self {
        let mut values = self.values().map(i64::from);
        values[id.index()] = value;
        Self::from_values(values)
    }

    /// Returns a copy with one lever moved by `delta` points (clamped).
    pub fn nudged(&self, id: LeverId, delta: i64) -> Self {
        self.with(id, i64::from(self.get(id)) + delta)
    }

    /// Iterates `(lever, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (LeverId, u8)> + '_ {
        LeverId::ALL.into_iter().map(move |id| (id, self.get(id)))
    }
}

#[inline]
fn clamp_lever(value: i64) -> u8 {
    value.clamp(i64::from(LEVER_MIN), i64::from(LEVER_MAX)) as u8
}

/// Unbounded wire form of [`LeverState`]; missing dials default to neutral.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LeverInput {
    demand_strength: i64,
    pricing_power: i64,
    expansion_velocity: i64,
    cost_discipline: i64,
    hiring_intensity: i64,
    operating_drag: i64,
    market_volatility: i64,
    execution_risk: i64,
    funding_pressure: i64,
}

impl Default for LeverInput {
    fn default() -> Self {
        let n = i64::from(LEVER_NEUTRAL);
        Self {
            demand_strength: n,
            pricing_power: n,
            expansion_velocity: n,
            cost_discipline: n,
            hiring_intensity: n,
            operating_drag: n,
            market_volatility: n,
            execution_risk: n,
            funding_pressure: n,
        }
    }
}

impl From<LeverInput> for LeverState {
    fn from(raw: LeverInput) -> Self {
        LeverState::from_values([
            raw.demand_strength,
            raw.pricing_power,
            raw.expansion_velocity,
            raw.cost_discipline,
            raw.hiring_intensity,
            raw.operating_drag,
            raw.market_volatility,
            raw.execution_risk,
            raw.funding_pressure,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_neutral_is_fifty_everywhere() {
        let levers = LeverState::neutral();
        assert!(levers.iter().all(|(_, v)| v == 50));
        assert_eq!(levers, LeverState::default());
    }

    #[test]
    fn test_with_clamps_out_of_range() {
        let levers = LeverState::neutral()
            .with(LeverId::MarketVolatility, 250)
            .with(LeverId::FundingPressure, -7);
        assert_eq!(levers.get(LeverId::MarketVolatility), 100);
        assert_eq!(levers.get(LeverId::FundingPressure), 0);
    }

    #[test]
    fn test_nudged_respects_bounds() {
        let levers = LeverState::uniform(98);
        assert_eq!(levers.nudged(LeverId::PricingPower, 5).get(LeverId::PricingPower), 100);
        assert_eq!(levers.nudged(LeverId::PricingPower, -5).get(LeverId::PricingPower), 93);
        // Other levers untouched
        assert_eq!(levers.nudged(LeverId::PricingPower, 5).get(LeverId::DemandStrength), 98);
    }

    #[test]
    fn test_fraction() {
        let levers = LeverState::neutral().with(LeverId::ExecutionRisk, 90);
        assert!((levers.fraction(LeverId::ExecutionRisk) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_from_values_canonical_order() {
        let levers = LeverState::from_values([1, 2, 3, 4, 5, 6, 7, 8, 9]);
        for (i, id) in LeverId::ALL.iter().enumerate() {
            assert_eq!(levers.get(*id) as usize, i + 1);
        }
    }

    #[test]
    fn test_lever_id_parse_variants() {
        assert_eq!("marketVolatility".parse::<LeverId>().unwrap(), LeverId::MarketVolatility);
        assert_eq!("market_volatility".parse::<LeverId>().unwrap(), LeverId::MarketVolatility);
        assert_eq!("MARKET-VOLATILITY".parse::<LeverId>().unwrap(), LeverId::MarketVolatility);
        assert!("velocity".parse::<LeverId>().is_err());
    }

    #[test]
    fn test_serialise_camel_case() {
        let json = serde_json::to_value(LeverState::neutral()).unwrap();
        assert_eq!(json["demandStrength"], 50);
        assert_eq!(json["fundingPressure"], 50);
    }

    #[test]
    fn test_deserialise_clamps_and_defaults() {
        let levers: LeverState =
            serde_json::from_str(r#"{"marketVolatility": 400, "executionRisk": -3}"#).unwrap();
        assert_eq!(levers.get(LeverId::MarketVolatility), 100);
        assert_eq!(levers.get(LeverId::ExecutionRisk), 0);
        assert_eq!(levers.get(LeverId::DemandStrength), 50);
    }

    proptest! {
        #[test]
        fn prop_values_always_in_range(values in proptest::array::uniform9(-1000i64..1000)) {
            let levers = LeverState::from_values(values);
            for (_, v) in levers.iter() {
                prop_assert!(v <= LEVER_MAX);
            }
        }
    }
}
