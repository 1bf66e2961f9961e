//! Info command implementation.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use ethx_core::config::{ClientConfig, ModuleConfig};
use ethx_core::device::EthModule;
use ethx_core::types::{MacAddress, ModuleKind};

use crate::cli::InfoArgs;
use crate::device::discovery::{discover_modules, DiscoveryOptions};
use crate::error::{CliError, CommandError};
use crate::output::get_formatter;
use crate::types::ModuleReport;

/// Run the info command
pub async fn run_info(
    args: InfoArgs,
    config: &ClientConfig,
    json: bool,
    strict: bool,
) -> Result<(), CliError> {
    let formatter = get_formatter(json);

    if !args.target.eq_ignore_ascii_case("all") {
        let report = read_report(&args.target, &config.module).await?;
        println!("{}", formatter.format_module_report(&report));
        return Ok(());
    }

    let options = DiscoveryOptions {
        scan: config.scan.clone(),
        duration: Duration::from_secs(args.discovery_duration),
    };

    // The uploader answers discovery but has no command port.
    let ips: Vec<String> = discover_modules(&options)
        .await?
        .into_iter()
        .filter(|m| m.kind() != ModuleKind::EthUploader)
        .map(|m| m.ip_address)
        .collect();

    if ips.is_empty() {
        return Err(CliError::NoModulesFound);
    }

    let pb = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(ips.len() as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message("querying modules");

    let module_config = &config.module;
    let mut results: Vec<(String, Result<ModuleReport, String>)> = stream::iter(ips)
        .map(|ip| {
            let pb = pb.clone();
            async move {
                let result = read_report(&ip, module_config).await.map_err(|e| {
                    debug!(%ip, error = %e, "module query failed");
                    e.to_string()
                });
                pb.inc(1);
                (ip, result)
            }
        })
        .buffer_unordered(args.concurrency.max(1))
        .collect()
        .await;

    pb.finish_and_clear();
    results.sort_by(|a, b| a.0.cmp(&b.0));

    println!("{}", formatter.format_bulk_reports(&results));

    let failed_count = results.iter().filter(|(_, r)| r.is_err()).count();
    if strict && failed_count > 0 {
        return Err(CliError::PartialFailure {
            succeeded: results.len() - failed_count,
            failed: failed_count,
        });
    }

    Ok(())
}

async fn read_report(ip: &str, config: &ModuleConfig) -> Result<ModuleReport, CliError> {
    let mut module = EthModule::connect(ip, config).await?;
    let queried = query(&mut module).await;
    let identity = module.identity().clone();
    module.close().await;

    let (serial, psu) = queried?;
    Ok(ModuleReport {
        ip: ip.to_string(),
        identity,
        serial_number: serial.to_string(),
        psu_voltage: ModuleReport::volts(psu),
    })
}

async fn query(module: &mut EthModule) -> Result<(MacAddress, u8), CommandError> {
    let serial = module.serial_number().await?;
    let psu = module.psu_voltage().await?;
    Ok((serial, psu))
}
