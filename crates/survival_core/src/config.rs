//! Simulation run configuration.
//!
//! This module provides the run parameters consumed by the path simulator
//! and a builder that validates them at build time.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Maximum number of simulated paths per batch.
pub const MAX_ITERATIONS: usize = 1_000_000;

/// Maximum simulated horizon in months.
pub const MAX_HORIZON_MONTHS: usize = 600;

/// Iteration count used when none is specified.
pub const DEFAULT_ITERATIONS: usize = 1_000;

/// Horizon used when none is specified.
pub const DEFAULT_HORIZON_MONTHS: usize = 36;

/// Iteration counts below this are reported as small samples.
///
/// A small sample is never an error; callers decide whether to surface a
/// caution.
pub const INSTITUTIONAL_SAMPLE_THRESHOLD: usize = 1_000;

/// Estimation fidelity for the unified risk engine.
///
/// - `Fast`: deterministic quantile projection, cheap enough for every
///   slider movement
/// - `FullMonteCarlo`: stochastic batch simulation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Fidelity {
    /// Deterministic quantile-path projection.
    Fast,
    /// Full stochastic Monte Carlo batch.
    #[default]
    FullMonteCarlo,
}

impl Fidelity {
    /// Stable name for logging and output.
    pub fn name(&self) -> &'static str {
        match self {
            Fidelity::Fast => "fast",
            Fidelity::FullMonteCarlo => "fullMonteCarlo",
        }
    }
}

impl std::str::FromStr for Fidelity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "fast" => Ok(Fidelity::Fast),
            "full" | "fullmontecarlo" | "montecarlo" | "mc" => Ok(Fidelity::FullMonteCarlo),
            _ => Err(ConfigError::invalid("fidelity", format!("unknown fidelity '{}'", s))),
        }
    }
}

/// Run parameters for a simulation batch.
///
/// Currency amounts share one (caller-defined) unit. Construct through
/// [`SimulationConfig::builder`] or deserialise and call
/// [`SimulationConfig::validate`].
///
/// # Examples
///
/// ```rust
/// use survival_core::SimulationConfig;
///
/// let config = SimulationConfig::builder()
///     .starting_cash(4_000_000.0)
///     .starting_arr(4_800_000.0)
///     .monthly_burn(47_000.0)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.iterations, 1_000);
/// assert_eq!(config.time_horizon_months, 36);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Number of independent paths.
    pub iterations: usize,
    /// Months simulated per path.
    pub time_horizon_months: usize,
    /// Cash on hand at month 0.
    pub starting_cash: f64,
    /// Annual recurring revenue at month 0.
    #[serde(rename = "startingARR")]
    pub starting_arr: f64,
    /// Net monthly burn at month 0.
    pub monthly_burn: f64,
}

impl SimulationConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// Returns a copy running a different number of iterations.
    ///
    /// The result is not re-validated; callers that pass user input should
    /// call [`SimulationConfig::validate`].
    pub fn with_iterations(&self, iterations: usize) -> Self {
        Self {
            iterations,
            ..self.clone()
        }
    }

    /// Returns `true` when the iteration count is below
    /// [`INSTITUTIONAL_SAMPLE_THRESHOLD`].
    #[inline]
    pub fn is_small_sample(&self) -> bool {
        self.iterations < INSTITUTIONAL_SAMPLE_THRESHOLD
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `iterations` is 0 or greater than 1,000,000
    /// - `time_horizon_months` is 0 or greater than 600
    /// - `starting_cash` is not finite or not strictly positive
    /// - `starting_arr` or `monthly_burn` is not finite or negative
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 || self.iterations > MAX_ITERATIONS {
            return Err(ConfigError::InvalidIterationCount(self.iterations));
        }
        if self.time_horizon_months == 0 || self.time_horizon_months > MAX_HORIZON_MONTHS {
            return Err(ConfigError::InvalidHorizon(self.time_horizon_months));
        }
        if !self.starting_cash.is_finite() || self.starting_cash <= 0.0 {
            return Err(ConfigError::invalid(
                "startingCash",
                format!("must be finite and positive, got {}", self.starting_cash),
            ));
        }
        check_non_negative("startingARR", self.starting_arr)?;
        check_non_negative("monthlyBurn", self.monthly_burn)?;
        Ok(())
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::invalid(
            name,
            format!("must be finite and non-negative, got {}", value),
        ));
    }
    Ok(())
}

/// Builder for [`SimulationConfig`].
///
/// Iterations and horizon fall back to [`DEFAULT_ITERATIONS`] and
/// [`DEFAULT_HORIZON_MONTHS`]; the three baseline amounts are mandatory.
#[derive(Clone, Debug, Default)]
pub struct SimulationConfigBuilder {
    iterations: Option<usize>,
    time_horizon_months: Option<usize>,
    starting_cash: Option<f64>,
    starting_arr: Option<f64>,
    monthly_burn: Option<f64>,
}

impl SimulationConfigBuilder {
    /// Sets the number of paths.
    #[inline]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// Sets the horizon in months.
    #[inline]
    pub fn time_horizon_months(mut self, months: usize) -> Self {
        self.time_horizon_months = Some(months);
        self
    }

    /// Sets the starting cash.
    #[inline]
    pub fn starting_cash(mut self, cash: f64) -> Self {
        self.starting_cash = Some(cash);
        self
    }

    /// Sets the starting ARR.
    #[inline]
    pub fn starting_arr(mut self, arr: f64) -> Self {
        self.starting_arr = Some(arr);
        self
    }

    /// Sets the starting net monthly burn.
    #[inline]
    pub fn monthly_burn(mut self, burn: f64) -> Self {
        self.monthly_burn = Some(burn);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` when a baseline amount was not
    /// set, or any error from [`SimulationConfig::validate`].
    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let config = SimulationConfig {
            iterations: self.iterations.unwrap_or(DEFAULT_ITERATIONS),
            time_horizon_months: self.time_horizon_months.unwrap_or(DEFAULT_HORIZON_MONTHS),
            starting_cash: self
                .starting_cash
                .ok_or(ConfigError::MissingField("startingCash"))?,
            starting_arr: self
                .starting_arr
                .ok_or(ConfigError::MissingField("startingARR"))?,
            monthly_burn: self
                .monthly_burn
                .ok_or(ConfigError::MissingField("monthlyBurn"))?,
        };

        config.validate()?;
        Ok(config)
    }
}
