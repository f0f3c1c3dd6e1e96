//! Error types for configuration validation.
//!
//! A [`ConfigError`] means the engine was asked to run without a usable
//! baseline. Library entry points return it; the engine facade turns it into
//! a "not computed" outcome carrying the rendered message as its reason.

use thiserror::Error;

/// Configuration error for the simulation engine.
///
/// These errors occur during construction when invalid or missing baseline
/// inputs are provided.
///
/// # Examples
/// ```
/// use survival_core::ConfigError;
///
/// let err = ConfigError::InvalidIterationCount(0);
/// assert!(err.to_string().contains("Invalid iteration count 0"));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Iteration count outside valid range [1, 1_000_000].
    #[error("Invalid iteration count {0}: must be in range [1, 1_000_000]")]
    InvalidIterationCount(usize),

    /// Horizon outside valid range [1, 600] months.
    #[error("Invalid time horizon {0} months: must be in range [1, 600]")]
    InvalidHorizon(usize),

    /// A mandatory baseline input was never supplied.
    #[error("Missing baseline input '{0}'")]
    MissingField(&'static str),

    /// A baseline input was supplied but is unusable.
    #[error("Invalid baseline input '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an [`ConfigError::InvalidParameter`] error.
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
