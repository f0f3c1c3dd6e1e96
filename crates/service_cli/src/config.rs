//! CLI configuration management
//!
//! Resolves run settings from a TOML file, `SURVIVAL_*` environment
//! variables and command line flags.
//!
//! Priority (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Config file
//! 4. Default values
//!
//! ```toml
//! log_level = "info"
//!
//! [company]
//! cash = 4000000.0
//! arr = 4800000.0
//! burn = 47000.0
//!
//! [simulation]
//! iterations = 1000
//! horizon_months = 36
//! seed = 42
//!
//! [engine]
//! fidelity = "full"
//! shock_iterations = 200
//!
//! [levers]
//! demandStrength = 60
//! marketVolatility = 70
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use survival_core::{
    ConfigError, Fidelity, LeverId, LeverState, SimulationConfig, DEFAULT_HORIZON_MONTHS,
    DEFAULT_ITERATIONS,
};
use survival_risk::engine::EngineSettings;
use survival_risk::sensitivity::{
    SensitivityConfig, DEFAULT_SENSITIVITY_ITERATIONS, DEFAULT_SENSITIVITY_SEED,
};
use survival_risk::shock::DEFAULT_MINI_ITERATIONS;

use crate::{CliError, Result};

/// Config file read when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG_FILE: &str = "survival.toml";

/// Log levels accepted in the config file and environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(CliError::InvalidArgument(format!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                s
            ))),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

fn deserialize_log_level<'de, D>(deserializer: D) -> std::result::Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

fn deserialize_fidelity<'de, D>(deserializer: D) -> std::result::Result<Fidelity, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Fidelity::from_str(&s).map_err(serde::de::Error::custom)
}

/// `[company]`: the baseline financial profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompanySection {
    /// Cash on hand.
    pub cash: Option<f64>,
    /// Annual recurring revenue.
    pub arr: Option<f64>,
    /// Net monthly burn.
    pub burn: Option<f64>,
}

/// `[simulation]`: run size and seeding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    /// Baseline paths.
    pub iterations: usize,
    /// Months simulated.
    pub horizon_months: usize,
    /// Base seed; system entropy when absent.
    pub seed: Option<u64>,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            horizon_months: DEFAULT_HORIZON_MONTHS,
            seed: None,
        }
    }
}

/// `[engine]`: fidelity and batch sizes of the risk layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Estimation fidelity.
    #[serde(deserialize_with = "deserialize_fidelity")]
    pub fidelity: Fidelity,
    /// Paths per shock batch.
    pub shock_iterations: usize,
    /// Paths per sensitivity run.
    pub sensitivity_iterations: usize,
    /// Common seed of sensitivity runs.
    pub sensitivity_seed: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            fidelity: Fidelity::FullMonteCarlo,
            shock_iterations: DEFAULT_MINI_ITERATIONS,
            sensitivity_iterations: DEFAULT_SENSITIVITY_ITERATIONS,
            sensitivity_seed: DEFAULT_SENSITIVITY_SEED,
        }
    }
}

/// Fully resolved CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log level when `RUST_LOG` is unset.
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Baseline financial profile.
    pub company: CompanySection,
    /// Run size and seeding.
    pub simulation: SimulationSection,
    /// Risk layer settings.
    pub engine: EngineSection,
    /// Lever positions; unspecified levers are neutral.
    pub levers: LeverState,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::ConfigFile(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CliError::ConfigFile(format!("Failed to parse TOML: {}", e)))
    }

    /// Apply `SURVIVAL_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply `SURVIVAL_*` overrides read through `lookup`
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("SURVIVAL_LOG_LEVEL") {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(cash) = lookup("SURVIVAL_CASH") {
            self.company.cash = Some(parse_env("SURVIVAL_CASH", &cash)?);
        }
        if let Some(arr) = lookup("SURVIVAL_ARR") {
            self.company.arr = Some(parse_env("SURVIVAL_ARR", &arr)?);
        }
        if let Some(burn) = lookup("SURVIVAL_BURN") {
            self.company.burn = Some(parse_env("SURVIVAL_BURN", &burn)?);
        }
        if let Some(iterations) = lookup("SURVIVAL_ITERATIONS") {
            self.simulation.iterations = parse_env("SURVIVAL_ITERATIONS", &iterations)?;
        }
        if let Some(horizon) = lookup("SURVIVAL_HORIZON") {
            self.simulation.horizon_months = parse_env("SURVIVAL_HORIZON", &horizon)?;
        }
        if let Some(seed) = lookup("SURVIVAL_SEED") {
            self.simulation.seed = Some(parse_env("SURVIVAL_SEED", &seed)?);
        }
        if let Some(fidelity) = lookup("SURVIVAL_FIDELITY") {
            self.engine.fidelity = Fidelity::from_str(&fidelity)?;
        }
        if let Some(shock) = lookup("SURVIVAL_SHOCK_ITERATIONS") {
            self.engine.shock_iterations = parse_env("SURVIVAL_SHOCK_ITERATIONS", &shock)?;
        }
        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliOverrides) {
        if let Some(cash) = cli.cash {
            self.company.cash = Some(cash);
        }
        if let Some(arr) = cli.arr {
            self.company.arr = Some(arr);
        }
        if let Some(burn) = cli.burn {
            self.company.burn = Some(burn);
        }
        if let Some(iterations) = cli.iterations {
            self.simulation.iterations = iterations;
        }
        if let Some(horizon) = cli.horizon_months {
            self.simulation.horizon_months = horizon;
        }
        if let Some(seed) = cli.seed {
            self.simulation.seed = Some(seed);
        }
        if let Some(fidelity) = cli.fidelity {
            self.engine.fidelity = fidelity;
        }
        if cli.verbose {
            self.log_level = LogLevel::Debug;
        }
        for &(id, value) in &cli.levers {
            self.levers = self.levers.with(id, value);
        }
    }

    /// The validated simulation configuration.
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingField` when a company amount was never supplied,
    /// or any validation error.
    pub fn simulation_config(&self) -> std::result::Result<SimulationConfig, ConfigError> {
        let mut builder = SimulationConfig::builder()
            .iterations(self.simulation.iterations)
            .time_horizon_months(self.simulation.horizon_months);
        if let Some(cash) = self.company.cash {
            builder = builder.starting_cash(cash);
        }
        if let Some(arr) = self.company.arr {
            builder = builder.starting_arr(arr);
        }
        if let Some(burn) = self.company.burn {
            builder = builder.monthly_burn(burn);
        }
        builder.build()
    }

    /// Sensitivity settings at the configured fidelity.
    pub fn sensitivity_config(&self) -> SensitivityConfig {
        SensitivityConfig::default()
            .with_fidelity(self.engine.fidelity)
            .with_iterations(self.engine.sensitivity_iterations)
            .with_seed(self.engine.sensitivity_seed)
    }

    /// Risk engine settings.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            fidelity: self.engine.fidelity,
            shock_iterations: self.engine.shock_iterations,
            sensitivity: self.sensitivity_config(),
            seed: self.simulation.seed,
        }
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::InvalidArgument(format!("{}={} is not a valid value", key, value)))
}

/// Overrides taken from command line flags.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Force debug logging
    pub verbose: bool,
    /// Starting cash
    pub cash: Option<f64>,
    /// Starting ARR
    pub arr: Option<f64>,
    /// Monthly burn
    pub burn: Option<f64>,
    /// Baseline paths
    pub iterations: Option<usize>,
    /// Horizon in months
    pub horizon_months: Option<usize>,
    /// Base seed
    pub seed: Option<u64>,
    /// Estimation fidelity
    pub fidelity: Option<Fidelity>,
    /// Individual lever assignments
    pub levers: Vec<(LeverId, i64)>,
}

/// Parses a `name=value` lever assignment.
pub fn parse_lever(s: &str) -> std::result::Result<(LeverId, i64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <lever>=<value>, got '{}'", s))?;
    let id = LeverId::from_str(name.trim()).map_err(|e| e.to_string())?;
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("lever value '{}' is not an integer", value.trim()))?;
    Ok((id, value))
}

/// Build configuration from all sources
///
/// An explicit config file must exist; the default `survival.toml` is read
/// only when present.
pub fn build_config(cli: &CliOverrides) -> Result<AppConfig> {
    let mut config = match &cli.config_file {
        Some(path) if !path.exists() => {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }
        Some(path) => AppConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            AppConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => AppConfig::default(),
    };

    config.apply_env()?;
    config.merge_with_cli(cli);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
log_level = "warn"

[company]
cash = 4000000.0
arr = 4800000.0
burn = 47000.0

[simulation]
iterations = 500
seed = 42

[engine]
fidelity = "fast"

[levers]
demandStrength = 70
marketVolatility = 140
"#;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.simulation.iterations, DEFAULT_ITERATIONS);
        assert_eq!(config.simulation.horizon_months, DEFAULT_HORIZON_MONTHS);
        assert_eq!(config.engine.fidelity, Fidelity::FullMonteCarlo);
        assert_eq!(config.levers, LeverState::neutral());
    }

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.company.cash, Some(4_000_000.0));
        assert_eq!(config.simulation.iterations, 500);
        assert_eq!(config.simulation.horizon_months, DEFAULT_HORIZON_MONTHS);
        assert_eq!(config.simulation.seed, Some(42));
        assert_eq!(config.engine.fidelity, Fidelity::Fast);
        assert_eq!(config.engine.shock_iterations, DEFAULT_MINI_ITERATIONS);
        assert_eq!(config.levers.get(LeverId::DemandStrength), 70);
        assert_eq!(config.levers.get(LeverId::MarketVolatility), 100);
        assert_eq!(config.levers.get(LeverId::CostDiscipline), 50);

        let sim = config.simulation_config().unwrap();
        assert_eq!(sim.starting_arr, 4_800_000.0);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            AppConfig::from_toml("log_level = \"loud\""),
            Err(CliError::ConfigFile(_))
        ));
        assert!(AppConfig::from_toml("[engine]\nfidelity = \"slow\"").is_err());
    }

    #[test]
    fn test_missing_company_amount() {
        let config = AppConfig::default();
        assert!(matches!(
            config.simulation_config(),
            Err(ConfigError::MissingField("startingCash"))
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = AppConfig::from_toml(SAMPLE).unwrap();
        let env: HashMap<&str, &str> = [
            ("SURVIVAL_ITERATIONS", "2000"),
            ("SURVIVAL_FIDELITY", "full"),
            ("SURVIVAL_CASH", "1e6"),
        ]
        .into_iter()
        .collect();
        config
            .apply_env_with(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.simulation.iterations, 2_000);
        assert_eq!(config.engine.fidelity, Fidelity::FullMonteCarlo);
        assert_eq!(config.company.cash, Some(1_000_000.0));
        assert_eq!(config.simulation.seed, Some(42));
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = AppConfig::default();
        let result = config.apply_env_with(|key| {
            (key == "SURVIVAL_HORIZON").then(|| "three years".to_string())
        });
        assert!(matches!(result, Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = AppConfig::from_toml(SAMPLE).unwrap();
        config
            .apply_env_with(|key| (key == "SURVIVAL_SEED").then(|| "7".to_string()))
            .unwrap();
        config.merge_with_cli(&CliOverrides {
            seed: Some(99),
            verbose: true,
            levers: vec![(LeverId::DemandStrength, 10), (LeverId::FundingPressure, -5)],
            ..Default::default()
        });

        assert_eq!(config.simulation.seed, Some(99));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.levers.get(LeverId::DemandStrength), 10);
        assert_eq!(config.levers.get(LeverId::FundingPressure), 0);
    }

    #[test]
    fn test_parse_lever() {
        assert_eq!(parse_lever("demandStrength=70").unwrap(), (LeverId::DemandStrength, 70));
        assert_eq!(parse_lever("market-volatility = 90").unwrap(), (LeverId::MarketVolatility, 90));
        assert!(parse_lever("demandStrength").is_err());
        assert!(parse_lever("unknown=1").is_err());
        assert!(parse_lever("pricingPower=high").is_err());
    }

    #[test]
    fn test_engine_settings() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        let settings = config.engine_settings();
        assert_eq!(settings.fidelity, Fidelity::Fast);
        assert_eq!(settings.seed, Some(42));
        assert_eq!(settings.sensitivity.fidelity, Fidelity::Fast);
        assert_eq!(settings.sensitivity.seed, DEFAULT_SENSITIVITY_SEED);
    }

    #[test]
    fn test_explicit_missing_file() {
        let cli = CliOverrides {
            config_file: Some(PathBuf::from("/nonexistent/survival.toml")),
            ..Default::default()
        };
        assert!(matches!(build_config(&cli), Err(CliError::FileNotFound(_))));
    }
}
