//! UDP discovery for ETHx modules.
//!
//! Thin wrapper around core's discovery engine with CLI-specific filtering.

use std::time::Duration;

use ethx_core::config::ScanConfig;
use ethx_core::discovery::DiscoveryEngine;
use ethx_core::types::ScanResult;

use crate::cli::FamilyFilter;
use crate::error::CliError;

/// Discovery options
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Socket and probe settings
    pub scan: ScanConfig,
    /// Discovery duration
    pub duration: Duration,
}

/// Discover modules on the network.
///
/// Delegates to core's `DiscoveryEngine::discover_once`.
pub async fn discover_modules(options: &DiscoveryOptions) -> Result<Vec<ScanResult>, CliError> {
    let modules = DiscoveryEngine::discover_once(&options.scan, options.duration).await?;
    Ok(modules)
}

/// Keep only modules of the requested model.
pub fn filter_modules(modules: Vec<ScanResult>, family: Option<FamilyFilter>) -> Vec<ScanResult> {
    match family {
        Some(family) => modules
            .into_iter()
            .filter(|m| m.kind() == family.kind())
            .collect(),
        None => modules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(ip: &str, device_id: u8) -> ScanResult {
        ScanResult {
            ip_address: ip.to_string(),
            host_name: "ETHX".to_string(),
            device_id,
            mac_address: format!("00:04:a3:00:00:{:02x}", device_id),
        }
    }

    #[test]
    fn test_filter_modules() {
        let modules = vec![module("10.0.0.1", 18), module("10.0.0.2", 19), module("10.0.0.3", 18)];

        let all = filter_modules(modules.clone(), None);
        assert_eq!(all.len(), 3);

        let eth002 = filter_modules(modules.clone(), Some(FamilyFilter::Eth002));
        let ips: Vec<&str> = eth002.iter().map(|m| m.ip_address.as_str()).collect();
        assert_eq!(ips, vec!["10.0.0.1", "10.0.0.3"]);

        assert!(filter_modules(modules, Some(FamilyFilter::Uploader)).is_empty());
    }
}
