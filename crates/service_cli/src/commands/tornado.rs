//! Tornado command implementation

use survival_risk::engine::{RiskEngine, TornadoReport};
use tracing::info;

use super::require;
use crate::config::AppConfig;
use crate::output::{pct, print_json, OutputFormat, Table};
use crate::Result;

/// Run the tornado command
pub fn run(config: &AppConfig, format: OutputFormat) -> Result<()> {
    let sim = config.simulation_config()?;
    let engine = RiskEngine::new(config.engine_settings());

    info!("Ranking lever sensitivities...");
    info!("  Fidelity: {}", engine.settings().fidelity.name());

    let report = require(engine.tornado(&config.levers, &sim))?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_table(&report),
    }

    info!("Ranking complete");
    Ok(())
}

fn print_table(report: &TornadoReport) {
    println!("Base survival: {}", pct(report.base_survival));
    let mut table = Table::new(["Lever", "Low", "High", "Spread", "Score"]);
    for bar in &report.bars {
        table.row([
            bar.label.clone(),
            pct(bar.low_survival),
            pct(bar.high_survival),
            format!("{:+.2}pp", bar.spread * 100.0),
            format!("{:.3}", bar.elasticity_score),
        ]);
    }
    table.print();
}
