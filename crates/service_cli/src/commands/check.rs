//! Check command implementation
//!
//! Prints the resolved configuration and verifies it forms a runnable
//! simulation.

use serde::Serialize;
use survival_core::LeverId;
use tracing::info;

use crate::config::AppConfig;
use crate::output::{print_json, OutputFormat, Table};
use crate::Result;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport {
    version: &'static str,
    threads: usize,
    log_level: &'static str,
    fidelity: &'static str,
    iterations: usize,
    horizon_months: usize,
    shock_iterations: usize,
    sensitivity_iterations: usize,
    seed: Option<u64>,
    levers: Vec<(LeverId, u8)>,
    ready: bool,
    problem: Option<String>,
}

/// Run the check command
pub fn run(config: &AppConfig, format: OutputFormat) -> Result<()> {
    info!("Checking configuration...");

    let problem = config.simulation_config().err().map(|e| e.to_string());
    let report = CheckReport {
        version: env!("CARGO_PKG_VERSION"),
        threads: rayon::current_num_threads(),
        log_level: config.log_level.as_filter_str(),
        fidelity: config.engine.fidelity.name(),
        iterations: config.simulation.iterations,
        horizon_months: config.simulation.horizon_months,
        shock_iterations: config.engine.shock_iterations,
        sensitivity_iterations: config.engine.sensitivity_iterations,
        seed: config.simulation.seed,
        levers: config.levers.iter().collect(),
        ready: problem.is_none(),
        problem,
    };

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_table(&report),
    }

    info!("Check complete");
    Ok(())
}

fn print_table(report: &CheckReport) {
    let mut table = Table::new(["Setting", "Value"]);
    table
        .row(["Version".to_string(), report.version.to_string()])
        .row(["Worker threads".to_string(), report.threads.to_string()])
        .row(["Log level".to_string(), report.log_level.to_string()])
        .row(["Fidelity".to_string(), report.fidelity.to_string()])
        .row(["Iterations".to_string(), report.iterations.to_string()])
        .row(["Horizon".to_string(), format!("{} months", report.horizon_months)])
        .row(["Shock iterations".to_string(), report.shock_iterations.to_string()])
        .row([
            "Sensitivity iterations".to_string(),
            report.sensitivity_iterations.to_string(),
        ])
        .row([
            "Seed".to_string(),
            report.seed.map_or_else(|| "system".to_string(), |s| s.to_string()),
        ]);
    for (id, value) in &report.levers {
        table.row([id.label().to_string(), value.to_string()]);
    }
    table.print();

    match &report.problem {
        None => println!("✓ Configuration is ready"),
        Some(problem) => println!("✗ {}", problem),
    }
}
