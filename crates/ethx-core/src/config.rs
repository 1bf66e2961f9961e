//! Client configuration.
//!
//! Loaded from a JSON file; every field has a default so a partial or missing
//! file is valid.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::ConfigError;

/// TCP port ETHx modules listen on for commands.
pub const DEFAULT_MODULE_PORT: u16 = 17494;

/// UDP port used for the discovery probe and replies.
pub const DISCOVERY_PORT: u16 = 30303;

/// Config file name inside the platform config directory.
const CONFIG_FILE_NAME: &str = "config.json";

/// Get the default config file location.
///
/// Uses the `directories` crate to find the platform-specific config directory.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "ethx", "ethx-tools")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Settings for one TCP connection to a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleConfig {
    pub port: u16,
    pub password: Option<String>,
    pub connect_timeout_ms: u64,
    /// Per-command transport timeout.
    pub read_timeout_ms: u64,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_MODULE_PORT,
            password: None,
            connect_timeout_ms: 5000,
            read_timeout_ms: 5000,
        }
    }
}

impl ModuleConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Settings for the discovery engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
    /// Local address the discovery socket binds to.
    pub bind_addr: SocketAddr,
    /// Where the probe is sent.
    pub target_addr: SocketAddr,
    /// Wait per receive call before looping again.
    pub receive_timeout_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DISCOVERY_PORT)),
            target_addr: SocketAddr::from(([255, 255, 255, 255], DISCOVERY_PORT)),
            receive_timeout_ms: 2000,
        }
    }
}

impl ScanConfig {
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    pub module: ModuleConfig,
    pub scan: ScanConfig,
}

impl ClientConfig {
    /// Load a config file. A missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.module.port == 0 {
            return Err(ConfigError::InvalidFile(
                "module port cannot be 0".to_string(),
            ));
        }

        if self.module.connect_timeout_ms == 0
            || self.module.read_timeout_ms == 0
            || self.scan.receive_timeout_ms == 0
        {
            return Err(ConfigError::InvalidFile(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        if let Some(ref password) = self.module.password {
            if password.len() > crate::protocol::codec::MAX_PAYLOAD_LEN {
                return Err(ConfigError::InvalidFile(format!(
                    "password exceeds maximum length of {} bytes",
                    crate::protocol::codec::MAX_PAYLOAD_LEN
                )));
            }
        }

        Ok(())
    }
}
