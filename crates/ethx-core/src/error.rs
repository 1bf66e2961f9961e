//! Error types for ETHx core.

use thiserror::Error;

/// Core error type for shared operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Module command errors.
///
/// Transport failures and local precondition violations are kept apart so a
/// caller can never mistake a rejected argument for a dead module.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The stream failed: reset, closed, or the read timeout elapsed.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The connected module has no channels of the kind this command needs.
    #[error("{command} is not supported by {module}")]
    Unsupported {
        command: &'static str,
        module: String,
    },

    /// Channel index outside `1..=available`.
    #[error("Channel {channel} out of range (module has {available})")]
    ChannelOutOfRange { channel: u8, available: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The module answered a handshake step with a non-success status.
    #[error("{command} rejected by module (status {status})")]
    Rejected { command: &'static str, status: u8 },
}

impl CommandError {
    /// True for the transport-failure outcome.
    pub fn is_transport(&self) -> bool {
        matches!(self, CommandError::Transport(_))
    }

    /// True when the command was refused locally before any byte was sent.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            CommandError::Unsupported { .. }
                | CommandError::ChannelOutOfRange { .. }
                | CommandError::InvalidArgument(_)
        )
    }
}

/// Discovery engine errors
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Failed to open discovery socket on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to send discovery probe to {addr}: {source}")]
    Probe {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Discovery cannot start while {0}")]
    InvalidState(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid config file: {0}")]
    InvalidFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
