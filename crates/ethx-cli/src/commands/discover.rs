//! Discover command implementation.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use colored::*;
use serde_json::json;

use ethx_core::config::ScanConfig;
use ethx_core::discovery::{ChannelObserver, DiscoveryEngine, ScanObserver};
use ethx_core::types::ScanResult;

use crate::cli::{DiscoverArgs, FamilyFilter};
use crate::device::discovery::{discover_modules, filter_modules, DiscoveryOptions};
use crate::error::CliError;
use crate::output::{get_formatter, OutputFormatter};

/// Run the discover command
pub async fn run_discover(
    args: DiscoverArgs,
    scan: &ScanConfig,
    json: bool,
) -> Result<(), CliError> {
    if args.duration == 0 {
        return Err(CliError::InvalidArgument(
            "discovery duration must be at least 1 second".to_string(),
        ));
    }

    let options = DiscoveryOptions {
        scan: scan.clone(),
        duration: Duration::from_secs(args.duration),
    };

    if args.watch {
        run_watch_mode(options, args.family, json).await
    } else {
        let formatter = get_formatter(json);
        run_oneshot_mode(options, args.family, json, formatter.as_ref()).await
    }
}

async fn run_oneshot_mode(
    options: DiscoveryOptions,
    family: Option<FamilyFilter>,
    json: bool,
    formatter: &dyn OutputFormatter,
) -> Result<(), CliError> {
    if !json {
        eprintln!("Discovering modules for {} seconds...", options.duration.as_secs());
    }

    let modules = discover_modules(&options).await?;
    let modules = filter_modules(modules, family);

    println!("{}", formatter.format_modules(&modules));

    if modules.is_empty() {
        return Err(CliError::NoModulesFound);
    }

    Ok(())
}

/// A module seen during watch mode.
struct Sighting {
    module: ScanResult,
    first_seen: DateTime<Local>,
}

/// Probe every `duration` seconds and report modules as they appear.
async fn run_watch_mode(
    options: DiscoveryOptions,
    family: Option<FamilyFilter>,
    json: bool,
) -> Result<(), CliError> {
    if !json {
        eprintln!("Watching for modules (press Ctrl+C to stop)...");
    }

    let (observer, mut rx) = ChannelObserver::new();
    let observer: Arc<dyn ScanObserver> = Arc::new(observer);

    let mut sightings: BTreeMap<String, Sighting> = BTreeMap::new();
    let mut engine: Option<DiscoveryEngine> = None;
    let mut ticker = tokio::time::interval(options.duration);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Engines are single-shot; each probe gets a fresh one.
                if let Some(mut previous) = engine.take() {
                    previous.close();
                }
                let mut next = DiscoveryEngine::new(options.scan.clone());
                next.add_observer(observer.clone());
                next.scan().await?;
                engine = Some(next);
            }
            Some(module) = rx.recv() => {
                let wanted = family.map_or(true, |f| module.kind() == f.kind());
                if wanted && !sightings.contains_key(&module.mac_address) {
                    let sighting = Sighting {
                        module,
                        first_seen: Local::now(),
                    };
                    if json {
                        print_sighting_json(&sighting);
                    }
                    sightings.insert(sighting.module.mac_address.clone(), sighting);
                    if !json {
                        redraw(&sightings);
                    }
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    if let Some(mut engine) = engine.take() {
        engine.close();
    }

    Ok(())
}

fn print_sighting_json(sighting: &Sighting) {
    let line = json!({
        "timestamp": sighting.first_seen.to_rfc3339(),
        "module": sighting.module,
    });
    println!("{}", line);
}

fn redraw(sightings: &BTreeMap<String, Sighting>) {
    // Clear screen and print header
    print!("\x1B[2J\x1B[1;1H");
    println!("{}", "ETHx Module Watch".bold());
    println!("{}", "Press Ctrl+C to stop".dimmed());
    println!();

    println!(
        "{:<16} {:<18} {:<12} {:<18} {:<10}",
        "IP".bold(),
        "Host Name".bold(),
        "Model".bold(),
        "MAC".bold(),
        "First Seen".bold()
    );
    println!("{}", "-".repeat(78));

    let mut rows: Vec<&Sighting> = sightings.values().collect();
    rows.sort_by(|a, b| a.module.ip_address.cmp(&b.module.ip_address));

    for sighting in rows {
        let module = &sighting.module;
        println!(
            "{:<16} {:<18} {:<12} {:<18} {:<10}",
            module.ip_address,
            truncate(&module.host_name, 16),
            module.kind().display_name(),
            module.mac_address,
            sighting.first_seen.format("%H:%M:%S")
        );
    }

    println!();
    println!("Found {} module(s)", sightings.len());

    io::stdout().flush().ok();
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
