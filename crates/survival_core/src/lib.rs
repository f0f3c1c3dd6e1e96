//! # survival_core: Foundation Types for the Survival Risk Engine
//!
//! ## Layer 1 (Foundation) Role
//!
//! survival_core is the bottom layer of the workspace and provides:
//! - The bounded strategic input model (`levers`)
//! - Run parameters with builder-time validation (`config`)
//! - Structured configuration errors (`error`)
//! - Small numerical helpers shared by the upper layers (`math`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other survival_* crates, with minimal external
//! dependencies:
//! - thiserror: Error derivation
//! - serde: Serialisation of every boundary type (camelCase JSON)
//!
//! ## Usage Examples
//!
//! ```rust
//! use survival_core::{LeverId, LeverState, SimulationConfig};
//!
//! let levers = LeverState::neutral().with(LeverId::MarketVolatility, 140);
//! assert_eq!(levers.get(LeverId::MarketVolatility), 100);
//!
//! let config = SimulationConfig::builder()
//!     .iterations(1_000)
//!     .time_horizon_months(36)
//!     .starting_cash(4_000_000.0)
//!     .starting_arr(4_800_000.0)
//!     .monthly_burn(47_000.0)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.iterations, 1_000);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod config;
pub mod error;
pub mod levers;
pub mod math;

pub use config::{
    Fidelity, SimulationConfig, SimulationConfigBuilder, DEFAULT_HORIZON_MONTHS,
    DEFAULT_ITERATIONS, INSTITUTIONAL_SAMPLE_THRESHOLD, MAX_HORIZON_MONTHS, MAX_ITERATIONS,
};
pub use error::ConfigError;
pub use levers::{LeverId, LeverState, LEVER_MAX, LEVER_MIN, LEVER_NEUTRAL};
