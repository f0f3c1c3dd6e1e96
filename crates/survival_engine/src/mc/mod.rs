//! Monte Carlo survival simulation.
//!
//! This module contains the stochastic core of the engine:
//!
//! - [`calibration`]: lever and stress mapping onto per-path dynamics
//! - [`paths`]: month-by-month evolution of a single path
//! - [`simulator`]: seeded batch generation, parallel above a threshold
//! - [`aggregate`](mod@aggregate): percentiles and survival curves
//! - [`metrics`]: headline metrics consumed by the risk layer
//!
//! # Example
//!
//! ```rust
//! use survival_core::{LeverState, SimulationConfig};
//! use survival_engine::mc::{run_monte_carlo, BaselineMetrics, ShockProfile};
//!
//! let config = SimulationConfig::builder()
//!     .iterations(200)
//!     .starting_cash(4_000_000.0)
//!     .starting_arr(4_800_000.0)
//!     .monthly_burn(47_000.0)
//!     .build()
//!     .unwrap();
//!
//! let result = run_monte_carlo(&LeverState::neutral(), &config, Some(42), &ShockProfile::none())
//!     .unwrap();
//! let metrics = BaselineMetrics::from_result(&result);
//! assert!((0.0..=1.0).contains(&metrics.survival_rate));
//! ```

pub mod aggregate;
pub mod calibration;
pub mod metrics;
pub mod paths;
pub mod simulator;

pub use aggregate::{aggregate, MonteCarloResult, Percentiles};
pub use calibration::{DriftParams, ShockProfile, MAX_SIGMA};
pub use metrics::BaselineMetrics;
pub use paths::{
    evolve_path, FailureCause, MonthlySnapshot, SimulationPath, RUNWAY_CAP_MONTHS,
};
pub use simulator::{
    run_monte_carlo, simulate, ParallelConfig, PathSimulator, SimulationBatch,
};
