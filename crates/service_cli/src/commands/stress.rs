//! Stress command implementation
//!
//! Runs one shock batch per sigma. Every batch shares the base seed, so a
//! sweep compares like with like.

use survival_core::Fidelity;
use survival_engine::rng::system_seed;
use survival_risk::estimator::estimator_for;
use survival_risk::shock::{shock_with, ShockedBatchResult};
use tracing::info;

use crate::config::AppConfig;
use crate::output::{money, months, pct, print_json, OutputFormat, Table};
use crate::{CliError, Result};

/// Run the stress command
pub fn run(
    config: &AppConfig,
    format: OutputFormat,
    sigmas: &[f64],
    mini_iterations: Option<usize>,
) -> Result<()> {
    if let Some(bad) = sigmas.iter().find(|s| !s.is_finite()) {
        return Err(CliError::InvalidArgument(format!(
            "sigma must be a finite number, got {}",
            bad
        )));
    }

    let sim = config.simulation_config()?;
    let fidelity = config.engine.fidelity;
    let mini = mini_iterations.unwrap_or(config.engine.shock_iterations);
    let seed = match fidelity {
        Fidelity::Fast => None,
        Fidelity::FullMonteCarlo => Some(config.simulation.seed.unwrap_or_else(system_seed)),
    };
    let estimator = estimator_for(fidelity, seed);

    info!("Starting stress sweep...");
    info!("  Sigmas: {:?}", sigmas);
    info!("  Paths per batch: {}", mini);

    let batches = sigmas
        .iter()
        .map(|&sigma| shock_with(estimator.as_ref(), &config.levers, &sim, sigma, mini))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    match format {
        OutputFormat::Json => print_json(&batches)?,
        OutputFormat::Table => print_table(&batches),
    }

    info!("Stress sweep complete");
    Ok(())
}

fn print_table(batches: &[ShockedBatchResult]) {
    let mut table = Table::new([
        "Sigma",
        "Survival",
        "Runway",
        "Median ARR",
        "Churn",
        "Classification",
    ]);
    for batch in batches {
        table.row([
            format!("{:.2}", batch.sigma),
            pct(batch.metrics.survival_rate),
            months(batch.metrics.median_runway),
            money(batch.metrics.median_arr),
            format!("{:.2}%", batch.metrics.churn_rate),
            batch.classification.to_string(),
        ]);
    }
    table.print();
}
