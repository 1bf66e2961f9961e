//! Error types for ETHx CLI.
//!
//! CliError wraps CoreError from the shared library and adds CLI-specific variants.

use ethx_core::error::CoreError;
use ethx_core::types::Status;
use thiserror::Error;

// Re-export core error types so command modules can use them via crate::error
pub use ethx_core::error::{CommandError, ConfigError, DiscoveryError};

/// Exit codes for the CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NETWORK_ERROR: i32 = 2;
    pub const DEVICE_ERROR: i32 = 3;
    pub const INVALID_ARGS: i32 = 4;
    pub const PARTIAL_FAILURE: i32 = 5;
}

/// Main error type for the CLI
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Partial failure: {succeeded} succeeded, {failed} failed")]
    PartialFailure { succeeded: usize, failed: usize },

    #[error("No modules found")]
    NoModulesFound,

    #[error("{command} failed on module ({status})")]
    CommandFailed { command: String, status: Status },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Core(e) => match e {
                CoreError::Command(e) if e.is_transport() => exit_codes::NETWORK_ERROR,
                CoreError::Command(e) if e.is_invalid_argument() => exit_codes::INVALID_ARGS,
                CoreError::Command(_) => exit_codes::DEVICE_ERROR,
                CoreError::Discovery(_) => exit_codes::NETWORK_ERROR,
                CoreError::Config(_) => exit_codes::GENERAL_ERROR,
                CoreError::Io(_) => exit_codes::GENERAL_ERROR,
            },
            CliError::Io(_) => exit_codes::GENERAL_ERROR,
            CliError::InvalidArgument(_) => exit_codes::INVALID_ARGS,
            CliError::PartialFailure { .. } => exit_codes::PARTIAL_FAILURE,
            CliError::NoModulesFound => exit_codes::GENERAL_ERROR,
            CliError::CommandFailed { .. } => exit_codes::DEVICE_ERROR,
        }
    }
}

// Conversions from core error subtypes to CliError
impl From<CommandError> for CliError {
    fn from(e: CommandError) -> Self {
        CliError::Core(CoreError::Command(e))
    }
}

impl From<DiscoveryError> for CliError {
    fn from(e: DiscoveryError) -> Self {
        CliError::Core(CoreError::Discovery(e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Core(CoreError::Config(e))
    }
}
