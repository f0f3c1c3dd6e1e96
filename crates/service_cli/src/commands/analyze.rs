//! Analyze command implementation
//!
//! Baseline, shock batch, transmission chain and risk index in one pass.

use survival_risk::engine::{RiskEngine, ScenarioAnalysis};
use tracing::{info, warn};

use super::require;
use crate::config::AppConfig;
use crate::output::{money, months, pct, print_json, OutputFormat, Table};
use crate::{CliError, Result};

/// Run the analyze command
pub fn run(config: &AppConfig, format: OutputFormat, sigma: f64) -> Result<()> {
    if !sigma.is_finite() {
        return Err(CliError::InvalidArgument(format!(
            "sigma must be a finite number, got {}",
            sigma
        )));
    }

    let sim = config.simulation_config()?;
    let engine = RiskEngine::new(config.engine_settings());

    info!("Starting stress analysis...");
    info!("  Fidelity: {}", engine.settings().fidelity.name());
    info!("  Sigma: {}", sigma);

    let analysis = require(engine.analyze(&config.levers, &sim, sigma))?;
    if analysis.small_sample {
        warn!("baseline sample is small; risk index is indicative only");
    }

    match format {
        OutputFormat::Json => print_json(&analysis)?,
        OutputFormat::Table => print_tables(&analysis),
    }

    info!("Analysis complete");
    Ok(())
}

fn print_tables(analysis: &ScenarioAnalysis) {
    let base = &analysis.baseline;
    let shocked = &analysis.shocked;

    let mut outcomes = Table::new(["Metric", "Baseline", "Shocked"]);
    outcomes
        .row([
            "Survival".to_string(),
            pct(base.survival_rate),
            pct(shocked.metrics.survival_rate),
        ])
        .row([
            "Median runway".to_string(),
            months(base.median_runway),
            months(shocked.metrics.median_runway),
        ])
        .row([
            "Median ARR".to_string(),
            money(base.median_arr),
            money(shocked.metrics.median_arr),
        ])
        .row([
            "Median burn".to_string(),
            money(base.median_burn),
            money(shocked.metrics.median_burn),
        ])
        .row([
            "Churn".to_string(),
            format!("{:.2}%", base.churn_rate),
            format!("{:.2}%", shocked.metrics.churn_rate),
        ]);
    outcomes.print();
    println!(
        "Full sample: survival {}, runway {}",
        pct(analysis.headline.survival_rate),
        months(analysis.headline.median_runway)
    );
    println!("Sigma {:.2}: {}", shocked.sigma, shocked.classification);

    let mut chain = Table::new(["Stage", "Change", "Direction", "Severity", "Impact"]);
    for node in &analysis.chain {
        chain.row([
            node.label.clone(),
            format!("{:+.1}%", node.delta_pct),
            format!("{:?}", node.direction).to_lowercase(),
            format!("{:?}", node.severity).to_lowercase(),
            format!("{:?}", node.impact).to_lowercase(),
        ]);
    }
    chain.print();

    let risk = &analysis.risk_index;
    let c = &risk.components;
    let mut index = Table::new(["Component", "Value"]);
    index
        .row(["Survival elasticity".to_string(), format!("{:.3}", c.survival_elasticity)])
        .row(["Runway elasticity".to_string(), format!("{:.3}", c.runway_elasticity)])
        .row(["Variance dispersion".to_string(), format!("{:.3}", c.variance_dispersion)])
        .row(["Debt sensitivity".to_string(), format!("{:.3}", c.debt_sensitivity)])
        .row(["Score".to_string(), format!("{:.3}", risk.score)])
        .row(["Band".to_string(), risk.band.to_string()]);
    index.print();

    for reason in &risk.reasons {
        println!("  - {}", reason);
    }
}
