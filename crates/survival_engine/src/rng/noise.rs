//! Noise source abstraction consumed by the path simulator.

/// Standard normal shocks applied in one simulated month.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MonthlyShocks {
    /// Shock to log ARR growth.
    pub growth: f64,
    /// Shock to the month's churn draw.
    pub churn: f64,
}

/// Source of monthly shocks.
///
/// Implemented by [`SimRng`](super::SimRng) for stochastic paths and by
/// [`FixedNoise`] for deterministic projections. Static dispatch only; the
/// simulator is generic over the source.
pub trait NoiseSource {
    /// Returns the shocks for the next month.
    fn monthly_shocks(&mut self) -> MonthlyShocks;
}

/// Constant shocks, identical every month.
///
/// `FixedNoise::median()` (all zeros) traces the median path; a constant
/// growth shock of `z / sqrt(H)` traces the `z` quantile path over a horizon
/// of `H` months.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FixedNoise {
    shocks: MonthlyShocks,
}

impl FixedNoise {
    /// Zero shocks.
    pub fn median() -> Self {
        Self::default()
    }

    /// Constant growth shock, zero churn shock.
    pub fn growth(z: f64) -> Self {
        Self {
            shocks: MonthlyShocks {
                growth: z,
                churn: 0.0,
            },
        }
    }
}

impl NoiseSource for FixedNoise {
    #[inline]
    fn monthly_shocks(&mut self) -> MonthlyShocks {
        self.shocks
    }
}
