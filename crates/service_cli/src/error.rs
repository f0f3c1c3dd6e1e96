//! CLI error type.

use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file named on the command line does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// A command line or environment value could not be used.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The configuration file could not be read or parsed.
    #[error("Configuration file error: {0}")]
    ConfigFile(String),

    /// The resolved inputs do not form a valid simulation.
    #[error(transparent)]
    Config(#[from] survival_core::ConfigError),

    /// The engine declined to compute a result.
    #[error("Not computed: {0}")]
    NotComputed(String),

    /// JSON output failed.
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}

/// Result alias for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;
