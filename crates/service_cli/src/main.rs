//! Survival CLI - Command Line Operations for Runway Risk
//!
//! Operational entry point for the survival simulation and stress engine.
//!
//! # Commands
//!
//! - `survival simulate` - Run the baseline simulation and print outcome bands
//! - `survival stress --sigma 1 --sigma 2` - Shock batches across a sigma sweep
//! - `survival tornado` - Rank lever sensitivities
//! - `survival analyze --sigma 2` - Full stress analysis with risk index
//! - `survival check` - Show the resolved configuration
//!
//! # Architecture
//!
//! As part of the **S**ervice layer, this crate resolves configuration from
//! file, environment and flags, then drives `survival_risk` and
//! `survival_engine`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use survival_core::{Fidelity, LeverId};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;
mod output;

pub use error::{CliError, Result};

use config::{build_config, parse_lever, CliOverrides};
use output::OutputFormat;

/// Monte Carlo survival simulation and stress propagation
#[derive(Parser)]
#[command(name = "survival")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (defaults to ./survival.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Company profile and run overrides shared by every command.
#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    /// Starting cash
    #[arg(long)]
    cash: Option<f64>,

    /// Starting annual recurring revenue
    #[arg(long)]
    arr: Option<f64>,

    /// Net monthly burn
    #[arg(long)]
    burn: Option<f64>,

    /// Number of baseline paths
    #[arg(short = 'n', long)]
    iterations: Option<usize>,

    /// Horizon in months
    #[arg(long)]
    horizon: Option<usize>,

    /// Base seed for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Estimation fidelity (fast, full)
    #[arg(long)]
    fidelity: Option<Fidelity>,

    /// Lever position, e.g. `--lever demandStrength=70` (repeatable)
    #[arg(short, long = "lever", value_parser = parse_lever)]
    levers: Vec<(LeverId, i64)>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the baseline simulation
    Simulate {
        #[command(flatten)]
        run: RunArgs,

        /// Print the month-by-month survival curve
        #[arg(long)]
        curve: bool,
    },

    /// Run shock batches for one or more sigma values
    Stress {
        #[command(flatten)]
        run: RunArgs,

        /// Shock intensity in [0, 3] (repeatable for a sweep)
        #[arg(long = "sigma", default_value = "1.0")]
        sigmas: Vec<f64>,

        /// Paths per shock batch
        #[arg(long)]
        mini_iterations: Option<usize>,
    },

    /// Rank lever sensitivities as tornado bars
    Tornado {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Full stress analysis: shock, transmission chain and risk index
    Analyze {
        #[command(flatten)]
        run: RunArgs,

        /// Shock intensity in [0, 3]
        #[arg(long, default_value_t = 1.0)]
        sigma: f64,
    },

    /// Check configuration and runtime
    Check {
        #[command(flatten)]
        run: RunArgs,
    },
}

impl Commands {
    fn run_args(&self) -> &RunArgs {
        match self {
            Commands::Simulate { run, .. }
            | Commands::Stress { run, .. }
            | Commands::Tornado { run }
            | Commands::Analyze { run, .. }
            | Commands::Check { run } => run,
        }
    }
}

fn overrides(cli: &Cli) -> CliOverrides {
    let run = cli.command.run_args().clone();
    CliOverrides {
        config_file: cli.config.clone(),
        verbose: cli.verbose,
        cash: run.cash,
        arr: run.arr,
        burn: run.burn,
        iterations: run.iterations,
        horizon_months: run.horizon,
        seed: run.seed,
        fidelity: run.fidelity,
        levers: run.levers,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = build_config(&overrides(&cli))?;

    // Initialise tracing; logs go to stderr so JSON on stdout stays clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter_str()));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if cli.verbose {
        info!("Verbose mode enabled");
    }
    debug!(?config, "resolved configuration");

    let format = cli.format;
    match cli.command {
        Commands::Simulate { curve, .. } => commands::simulate::run(&config, format, curve),
        Commands::Stress {
            sigmas,
            mini_iterations,
            ..
        } => commands::stress::run(&config, format, &sigmas, mini_iterations),
        Commands::Tornado { .. } => commands::tornado::run(&config, format),
        Commands::Analyze { sigma, .. } => commands::analyze::run(&config, format, sigma),
        Commands::Check { .. } => commands::check::run(&config, format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_stress_sweep() {
        let cli = Cli::parse_from([
            "survival", "stress", "--sigma", "0.5", "--sigma", "2", "--cash", "1e6", "-l",
            "executionRisk=90",
        ]);
        let overrides = overrides(&cli);
        assert_eq!(overrides.cash, Some(1_000_000.0));
        assert_eq!(overrides.levers, vec![(LeverId::ExecutionRisk, 90)]);
        match cli.command {
            Commands::Stress { sigmas, .. } => assert_eq!(sigmas, vec![0.5, 2.0]),
            _ => panic!("expected stress command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["survival", "analyze", "--fidelity", "fast", "-f", "json"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(overrides(&cli).fidelity, Some(Fidelity::Fast));
    }

    #[test]
    fn test_rejects_bad_lever() {
        assert!(Cli::try_parse_from(["survival", "simulate", "--lever", "luck=99"]).is_err());
    }
}
