//! Digital output commands.

use ethx_core::config::ModuleConfig;
use ethx_core::device::EthModule;
use ethx_core::types::Status;

use crate::cli::{OutputsArgs, OutputsCommands};
use crate::commands::report_status;
use crate::error::{CliError, CommandError};
use crate::output::get_formatter;
use crate::types::ChannelStates;

enum Reply {
    States(Vec<u8>),
    Switched(String, Status),
}

/// Run the outputs command
pub async fn run_outputs(
    args: OutputsArgs,
    config: &ModuleConfig,
    json: bool,
) -> Result<(), CliError> {
    let formatter = get_formatter(json);

    let mut module = EthModule::connect(&args.ip, config).await?;
    let result = execute(&mut module, &args.command).await;
    module.close().await;

    match result? {
        Reply::States(raw) => {
            let states = ChannelStates::from_bytes(&args.ip, "outputs", raw);
            println!("{}", formatter.format_channel_states(&states));
            Ok(())
        }
        Reply::Switched(command, status) => {
            report_status(formatter.as_ref(), &args.ip, &command, status)
        }
    }
}

async fn execute(
    module: &mut EthModule,
    command: &OutputsCommands,
) -> Result<Reply, CommandError> {
    match command {
        OutputsCommands::Get => Ok(Reply::States(module.digital_output_states().await?)),
        OutputsCommands::On(switch) => {
            let status = module.digital_output_active(switch.channel, switch.time).await?;
            Ok(Reply::Switched(format!("output {} on", switch.channel), status))
        }
        OutputsCommands::Off(switch) => {
            let status = module.digital_output_inactive(switch.channel, switch.time).await?;
            Ok(Reply::Switched(format!("output {} off", switch.channel), status))
        }
    }
}
