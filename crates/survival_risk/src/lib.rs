//! # survival_risk: Stress and Sensitivity Analysis (L4: Application)
//!
//! Turns simulated outcomes into explanations of risk:
//! - Shock batches with resilience classification ([`shock`])
//! - The five-stage causal chain from churn to survival ([`transmission`])
//! - A composite, banded risk index ([`risk_index`])
//! - Lever sensitivity ranking and tornado bars ([`sensitivity`])
//! - A single facade running all of it at one fidelity ([`engine`])
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            survival_risk (L4)           │
//! ├─────────────────────────────────────────┤
//! │  engine/        - RiskEngine facade     │
//! │  shock/         - stress batches        │
//! │  transmission/  - causal chain          │
//! │  risk_index/    - composite score       │
//! │  sensitivity/   - tornado ranking       │
//! │  estimator      - fidelity seam         │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │          survival_engine (L3)           │
//! │  Monte Carlo paths, fast projection     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use survival_core::{LeverId, LeverState, SimulationConfig};
//! use survival_risk::engine::{EngineSettings, RiskEngine};
//!
//! let config = SimulationConfig::builder()
//!     .iterations(1_000)
//!     .starting_cash(4_000_000.0)
//!     .starting_arr(4_800_000.0)
//!     .monthly_burn(47_000.0)
//!     .build()
//!     .unwrap();
//! let levers = LeverState::neutral().with(LeverId::FundingPressure, 80);
//!
//! let engine = RiskEngine::new(EngineSettings::default().seeded(42));
//! let analysis = engine.analyze(&levers, &config, 2.0).into_computed().unwrap();
//!
//! assert_eq!(analysis.chain[0].id.id(), "churn");
//! assert!(analysis.risk_index.components.debt_sensitivity > 0.79);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod engine;
pub mod estimator;
pub mod risk_index;
pub mod sensitivity;
pub mod shock;
pub mod transmission;

pub use engine::{
    AnalysisOutcome, Computation, EngineSettings, RiskEngine, ScenarioAnalysis, TornadoOutcome,
    TornadoReport,
};
pub use estimator::{Estimate, FastEstimator, MonteCarloEstimator, OutcomeEstimator};
pub use risk_index::{compose_risk_index, RiskBand, RiskComponents, RiskIndexInputs, RiskIndexResult};
pub use sensitivity::{
    rank_levers, rank_levers_with, tornado, ElasticityDirection, ElasticityResult,
    SensitivityConfig, SensitivityReport, TornadoBar,
};
pub use shock::{shock, Classification, ShockedBatchResult};
pub use transmission::{build_chain, Direction, Impact, Severity, Stage, TransmissionNode};
