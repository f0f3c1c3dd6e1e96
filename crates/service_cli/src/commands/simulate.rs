//! Simulate command implementation
//!
//! Runs the unstressed baseline at the configured fidelity.

use survival_core::Fidelity;
use survival_engine::mc::ShockProfile;
use survival_engine::rng::system_seed;
use survival_risk::estimator::{estimator_for, Estimate};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::output::{money, months, pct, print_json, OutputFormat, Table};
use crate::Result;

/// Months between rows of the printed survival curve.
const CURVE_STEP: usize = 6;

/// Run the simulate command
pub fn run(config: &AppConfig, format: OutputFormat, curve: bool) -> Result<()> {
    let sim = config.simulation_config()?;
    let fidelity = config.engine.fidelity;
    let seed = match fidelity {
        Fidelity::Fast => None,
        Fidelity::FullMonteCarlo => Some(config.simulation.seed.unwrap_or_else(system_seed)),
    };

    info!("Starting simulation...");
    info!("  Fidelity: {}", fidelity.name());
    info!("  Paths: {}", sim.iterations);
    info!("  Horizon: {} months", sim.time_horizon_months);

    let estimator = estimator_for(fidelity, seed);
    let estimate = estimator.estimate(&config.levers, &sim, &ShockProfile::none())?;
    if estimate.is_small_sample() {
        warn!(
            iterations = estimate.iteration_count,
            "sample is below the institutional threshold; treat bands with caution"
        );
    }

    match format {
        OutputFormat::Json => print_json(&estimate)?,
        OutputFormat::Table => print_tables(&estimate, curve),
    }

    info!("Simulation complete");
    Ok(())
}

fn print_tables(estimate: &Estimate, curve: bool) {
    let m = &estimate.metrics;
    let mut summary = Table::new(["Metric", "Value"]);
    summary
        .row(["Fidelity".to_string(), estimate.fidelity.name().to_string()])
        .row(["Paths".to_string(), estimate.iteration_count.to_string()])
        .row([
            "Seed".to_string(),
            estimate.seed.map_or_else(|| "-".to_string(), |s| s.to_string()),
        ])
        .row(["Survival".to_string(), pct(m.survival_rate)])
        .row(["Median ARR".to_string(), money(m.median_arr)])
        .row(["Median runway".to_string(), months(m.median_runway)])
        .row(["Median burn".to_string(), money(m.median_burn)])
        .row(["Churn (monthly)".to_string(), format!("{:.2}%", m.churn_rate)]);
    summary.print();

    let arr = &estimate.arr_percentiles;
    let runway = &estimate.runway_percentiles;
    let mut bands = Table::new(["Band", "P10", "P25", "P50", "P75", "P90"]);
    bands
        .row([
            "ARR".to_string(),
            money(arr.p10),
            money(arr.p25),
            money(arr.p50),
            money(arr.p75),
            money(arr.p90),
        ])
        .row([
            "Runway".to_string(),
            months(runway.p10),
            months(runway.p25),
            months(runway.p50),
            months(runway.p75),
            months(runway.p90),
        ]);
    bands.print();

    if curve {
        let mut table = Table::new(["Month", "Solvent"]);
        let last = estimate.survival_by_month.len().saturating_sub(1);
        for (month, rate) in estimate.survival_by_month.iter().enumerate() {
            if month % CURVE_STEP == 0 || month == last {
                table.row([month.to_string(), pct(*rate)]);
            }
        }
        table.print();
    }
}
