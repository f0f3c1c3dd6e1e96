//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod analyze;
pub mod check;
pub mod simulate;
pub mod stress;
pub mod tornado;

use survival_risk::engine::Computation;

use crate::{CliError, Result};

/// Unwraps a computed outcome or surfaces its reason as an error.
pub(crate) fn require<T>(outcome: Computation<T>) -> Result<T> {
    match outcome {
        Computation::Computed(value) => Ok(value),
        Computation::NotComputed { reason } => Err(CliError::NotComputed(reason)),
    }
}
