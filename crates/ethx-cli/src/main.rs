//! ETHx CLI - Command-line interface for ETHx Ethernet I/O modules.
//!
//! This tool discovers modules on the local network and drives their relays,
//! digital inputs and analogue channels from scripts or a terminal.

mod cli;
mod commands;
mod device;
mod error;
mod output;
mod types;

use clap::Parser;
use ethx_core::config::{default_config_path, ClientConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::{exit_codes, CliError};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Logs go to stderr so JSON on stdout stays parseable.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli).await?;

    match cli.command {
        Commands::Discover(args) => {
            commands::run_discover(args, &config.scan, cli.json).await
        }
        Commands::Info(args) => {
            commands::run_info(args, &config, cli.json, cli.strict).await
        }
        Commands::Outputs(args) => {
            commands::run_outputs(args, &config.module, cli.json).await
        }
        Commands::Inputs(args) => {
            commands::run_inputs(args, &config.module, cli.json).await
        }
        Commands::Analogue(args) => {
            commands::run_analogue(args, &config.module, cli.json).await
        }
        Commands::Session(args) => {
            commands::run_session(args, &config.module, cli.json).await
        }
    }
}

/// Read the config file, then apply command-line overrides.
async fn load_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = match cli.config.clone().or_else(default_config_path) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            ClientConfig::load(&path).await?
        }
        None => ClientConfig::default(),
    };

    if let Some(port) = cli.port {
        if port == 0 {
            return Err(CliError::InvalidArgument("port cannot be 0".to_string()));
        }
        config.module.port = port;
    }

    if let Some(timeout) = cli.timeout {
        if timeout == 0 {
            return Err(CliError::InvalidArgument(
                "timeout must be greater than 0".to_string(),
            ));
        }
        config.module.connect_timeout_ms = timeout;
        config.module.read_timeout_ms = timeout;
    }

    if let Some(ref password) = cli.password {
        config.module.password = Some(password.clone());
    }

    Ok(config)
}
