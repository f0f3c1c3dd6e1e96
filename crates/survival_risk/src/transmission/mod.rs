//! Transmission chain builder.
//!
//! Explains a shock as five causal stages, always in the order
//! `churn -> revenue -> burn -> runway -> survival`. Each node compares the
//! baseline metric with its shocked counterpart.
//!
//! The adverse direction of each stage is fixed: more churn or burn is bad,
//! less revenue, runway or survival is bad. It is part of the stage
//! definition rather than read from the sign of the delta.

use serde::{Deserialize, Serialize};
use survival_core::math::EPSILON;
use survival_engine::mc::BaselineMetrics;

use crate::shock::ShockedBatchResult;

/// Moves smaller than this many percentage points are neutral.
pub const DIRECTION_EPSILON_PCT: f64 = 0.1;

/// `|deltaPct|` at or above which severity is medium.
pub const MEDIUM_SEVERITY_PCT: f64 = 10.0;

/// `|deltaPct|` above which severity is high.
pub const HIGH_SEVERITY_PCT: f64 = 25.0;

/// Chain stage identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Monthly churn, percent.
    Churn,
    /// Median terminal ARR.
    Revenue,
    /// Median terminal net burn.
    Burn,
    /// Median runway, months.
    Runway,
    /// Survival rate.
    Survival,
}

impl Stage {
    /// Chain order.
    pub const ALL: [Stage; 5] = [
        Stage::Churn,
        Stage::Revenue,
        Stage::Burn,
        Stage::Runway,
        Stage::Survival,
    ];

    /// Stable identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Stage::Churn => "churn",
            Stage::Revenue => "revenue",
            Stage::Burn => "burn",
            Stage::Runway => "runway",
            Stage::Survival => "survival",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Churn => "Customer Churn",
            Stage::Revenue => "Revenue (ARR)",
            Stage::Burn => "Net Burn",
            Stage::Runway => "Cash Runway",
            Stage::Survival => "Survival Probability",
        }
    }

    /// Direction of movement that hurts the company.
    pub fn adverse_direction(&self) -> Direction {
        match self {
            Stage::Churn | Stage::Burn => Direction::Up,
            Stage::Revenue | Stage::Runway | Stage::Survival => Direction::Down,
        }
    }

    /// Reads this stage's value from a metrics set.
    pub fn value(&self, metrics: &BaselineMetrics) -> f64 {
        match self {
            Stage::Churn => metrics.churn_rate,
            Stage::Revenue => metrics.median_arr,
            Stage::Burn => metrics.median_burn,
            Stage::Runway => metrics.median_runway,
            Stage::Survival => metrics.survival_rate,
        }
    }
}

/// Direction of a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Increase beyond the tolerance.
    Up,
    /// Decrease beyond the tolerance.
    Down,
    /// Within the tolerance.
    Neutral,
}

impl Direction {
    /// Direction of a percentage change.
    pub fn from_delta_pct(delta_pct: f64) -> Self {
        if delta_pct > DIRECTION_EPSILON_PCT {
            Direction::Up
        } else if delta_pct < -DIRECTION_EPSILON_PCT {
            Direction::Down
        } else {
            Direction::Neutral
        }
    }
}

/// Magnitude class of a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Under 10%.
    Low,
    /// 10% to 25% inclusive.
    Medium,
    /// Over 25%.
    High,
}

impl Severity {
    /// Severity of a percentage change.
    pub fn from_delta_pct(delta_pct: f64) -> Self {
        let magnitude = delta_pct.abs();
        if magnitude > HIGH_SEVERITY_PCT {
            Severity::High
        } else if magnitude >= MEDIUM_SEVERITY_PCT {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Whether a move helps or hurts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    /// Moved in the stage's adverse direction.
    Adverse,
    /// Moved against the stage's adverse direction.
    Favorable,
    /// No material move.
    Neutral,
}

/// One stage of the chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransmissionNode {
    /// Stage identifier.
    pub id: Stage,
    /// Stage label.
    pub label: String,
    /// Baseline value.
    pub baseline: f64,
    /// Shocked value.
    pub shocked: f64,
    /// `(shocked - baseline) / |baseline| * 100`; 0 for a zero baseline.
    pub delta_pct: f64,
    /// Direction of the move.
    pub direction: Direction,
    /// Magnitude class.
    pub severity: Severity,
    /// Whether the move is adverse for this stage.
    pub impact: Impact,
}

impl TransmissionNode {
    /// Compares `baseline` with `shocked` for `stage`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use survival_risk::transmission::{Direction, Impact, Severity, Stage, TransmissionNode};
    ///
    /// let node = TransmissionNode::new(Stage::Churn, 6.0, 9.0);
    /// assert_eq!(node.delta_pct, 50.0);
    /// assert_eq!(node.direction, Direction::Up);
    /// assert_eq!(node.severity, Severity::High);
    /// assert_eq!(node.impact, Impact::Adverse);
    /// ```
    pub fn new(stage: Stage, baseline: f64, shocked: f64) -> Self {
        let delta_pct = if baseline.abs() < EPSILON || !baseline.is_finite() {
            0.0
        } else {
            let pct = (shocked - baseline) / baseline.abs() * 100.0;
            if pct.is_finite() {
                pct
            } else {
                0.0
            }
        };

        let direction = Direction::from_delta_pct(delta_pct);
        let impact = if direction == Direction::Neutral {
            Impact::Neutral
        } else if direction == stage.adverse_direction() {
            Impact::Adverse
        } else {
            Impact::Favorable
        };

        Self {
            id: stage,
            label: stage.label().to_string(),
            baseline,
            shocked,
            delta_pct,
            direction,
            severity: Severity::from_delta_pct(delta_pct),
            impact,
        }
    }
}

/// Builds the five-stage chain from baseline and shocked metrics.
pub fn build_chain(baseline: &BaselineMetrics, shocked: &ShockedBatchResult) -> [TransmissionNode; 5] {
    chain_between(baseline, &shocked.metrics)
}

/// Builds the chain between two metric sets.
pub fn chain_between(baseline: &BaselineMetrics, shocked: &BaselineMetrics) -> [TransmissionNode; 5] {
    Stage::ALL.map(|stage| TransmissionNode::new(stage, stage.value(baseline), stage.value(shocked)))
}
