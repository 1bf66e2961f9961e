//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ethx_core::types::ModuleKind;

/// ETHx CLI - discover and control ETHx Ethernet I/O modules
#[derive(Parser, Debug)]
#[command(name = "ethx-cli")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Module connect and command timeout in milliseconds
    #[arg(long, global = true, env = "ETHX_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Exit non-zero on any partial failure (for "all" targets)
    #[arg(long, global = true)]
    pub strict: bool,

    /// Config file (default: platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Module TCP port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Module password, sent before any other command
    #[arg(long, global = true, env = "ETHX_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover modules on the network
    Discover(DiscoverArgs),

    /// Show module identity, serial number and supply voltage
    Info(InfoArgs),

    /// Read or switch digital outputs
    Outputs(OutputsArgs),

    /// Read digital inputs
    Inputs(InputsArgs),

    /// Read analogue inputs or set analogue outputs
    Analogue(AnalogueArgs),

    /// Password session management
    Session(SessionArgs),
}

// ==================== Discover ====================

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Watch mode - probe again every `duration` seconds until Ctrl+C
    #[arg(short, long)]
    pub watch: bool,

    /// Discovery duration in seconds
    #[arg(short, long, default_value = "3")]
    pub duration: u64,

    /// Only show one model
    #[arg(long, value_enum)]
    pub family: Option<FamilyFilter>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FamilyFilter {
    Eth002,
    Eth008,
    Eth484,
    Eth8020,
    Eth1620,
    Eth1610,
    Eth24v008,
    Uploader,
}

impl FamilyFilter {
    pub fn kind(&self) -> ModuleKind {
        match self {
            FamilyFilter::Eth002 => ModuleKind::Eth002,
            FamilyFilter::Eth008 => ModuleKind::Eth008,
            FamilyFilter::Eth484 => ModuleKind::Eth484,
            FamilyFilter::Eth8020 => ModuleKind::Eth8020,
            FamilyFilter::Eth1620 => ModuleKind::Eth1620,
            FamilyFilter::Eth1610 => ModuleKind::Eth1610,
            FamilyFilter::Eth24v008 => ModuleKind::Eth24v008,
            FamilyFilter::Uploader => ModuleKind::EthUploader,
        }
    }
}

// ==================== Info ====================

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Module IP address or "all" for all discovered modules
    pub target: String,

    /// Concurrency limit when using "all"
    #[arg(long, default_value = "5")]
    pub concurrency: usize,

    /// Discovery duration when using "all" (seconds)
    #[arg(long, default_value = "3")]
    pub discovery_duration: u64,
}

// ==================== Outputs ====================

#[derive(Args, Debug)]
pub struct OutputsArgs {
    /// Module IP address
    pub ip: String,

    #[command(subcommand)]
    pub command: OutputsCommands,
}

#[derive(Subcommand, Debug)]
pub enum OutputsCommands {
    /// Read the state of every digital output
    Get,

    /// Make an output active
    On(SwitchArgs),

    /// Make an output inactive
    Off(SwitchArgs),
}

#[derive(Args, Debug)]
pub struct SwitchArgs {
    /// Output channel, starting at 1
    pub channel: u8,

    /// Pulse time in 100ms units, 0 to latch
    #[arg(short, long, default_value = "0")]
    pub time: u8,
}

// ==================== Inputs ====================

#[derive(Args, Debug)]
pub struct InputsArgs {
    /// Module IP address
    pub ip: String,
}

// ==================== Analogue ====================

#[derive(Args, Debug)]
pub struct AnalogueArgs {
    /// Module IP address
    pub ip: String,

    #[command(subcommand)]
    pub command: AnalogueCommands,
}

#[derive(Subcommand, Debug)]
pub enum AnalogueCommands {
    /// Read an analogue input
    Read(AnalogueReadArgs),

    /// Set an analogue output
    Set(AnalogueSetArgs),
}

#[derive(Args, Debug)]
pub struct AnalogueReadArgs {
    /// Input channel, starting at 1
    pub channel: u8,

    /// Use the 12-bit read command
    #[arg(long)]
    pub twelve_bit: bool,
}

#[derive(Args, Debug)]
pub struct AnalogueSetArgs {
    /// Output channel, starting at 1
    pub channel: u8,

    /// Output value
    pub value: u8,

    /// Pulse time in 100ms units, 0 to latch
    #[arg(short, long, default_value = "0")]
    pub time: u8,
}

// ==================== Session ====================

#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Module IP address
    pub ip: String,

    #[command(subcommand)]
    pub command: SessionCommands,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Seconds until the module locks again
    UnlockTime,

    /// End the password session
    Logout,
}
