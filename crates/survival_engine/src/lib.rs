//! # survival_engine: Monte Carlo Survival Simulation (Layer 3)
//!
//! ## Layer 3 Role
//!
//! survival_engine turns a lever state and a company baseline into
//! stochastic outcomes:
//! - Seeded per-path random streams ([`rng`])
//! - Lever calibration, path evolution, batch simulation and aggregation
//!   ([`mc`])
//! - A deterministic five-path quantile projection for interactive use
//!   ([`fast`])
//!
//! ## Determinism
//!
//! Each path owns an RNG stream derived from `(seed, path index)`. A seeded
//! batch is therefore identical whether it runs on one thread or on the
//! Rayon pool, and the first `k` paths of a larger batch equal a `k`-path
//! batch.
//!
//! ## Usage Example
//!
//! ```rust
//! use survival_core::{LeverState, SimulationConfig};
//! use survival_engine::mc::{aggregate, simulate};
//!
//! let config = SimulationConfig::builder()
//!     .iterations(500)
//!     .starting_cash(4_000_000.0)
//!     .starting_arr(4_800_000.0)
//!     .monthly_burn(47_000.0)
//!     .build()
//!     .unwrap();
//!
//! let paths = simulate(&LeverState::neutral(), &config, Some(42)).unwrap();
//! let result = aggregate(&paths);
//! assert_eq!(result.survival_by_month[0], 1.0);
//! assert!(result.runway_percentiles.is_monotonic());
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fast;
pub mod mc;
pub mod rng;
