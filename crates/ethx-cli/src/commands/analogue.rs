//! Analogue input and output commands.

use ethx_core::config::ModuleConfig;
use ethx_core::device::EthModule;
use ethx_core::types::Status;

use crate::cli::{AnalogueArgs, AnalogueCommands};
use crate::commands::report_status;
use crate::error::{CliError, CommandError};
use crate::output::get_formatter;

enum Reply {
    Reading(String, u16),
    Set(String, Status),
}

/// Run the analogue command
pub async fn run_analogue(
    args: AnalogueArgs,
    config: &ModuleConfig,
    json: bool,
) -> Result<(), CliError> {
    let formatter = get_formatter(json);

    let mut module = EthModule::connect(&args.ip, config).await?;
    let result = execute(&mut module, &args.command).await;
    module.close().await;

    match result? {
        Reply::Reading(command, value) => {
            println!(
                "{}",
                formatter.format_command_result(&args.ip, &command, &value.to_string(), true)
            );
            Ok(())
        }
        Reply::Set(command, status) => {
            report_status(formatter.as_ref(), &args.ip, &command, status)
        }
    }
}

async fn execute(
    module: &mut EthModule,
    command: &AnalogueCommands,
) -> Result<Reply, CommandError> {
    match command {
        AnalogueCommands::Read(read) => {
            let value = if read.twelve_bit {
                module.analogue_input_12bit(read.channel).await?
            } else {
                module.analogue_input(read.channel).await?
            };
            Ok(Reply::Reading(format!("analogue input {}", read.channel), value))
        }
        AnalogueCommands::Set(set) => {
            let status = module
                .set_analogue_output(set.channel, set.value, set.time)
                .await?;
            Ok(Reply::Set(
                format!("analogue output {} = {}", set.channel, set.value),
                status,
            ))
        }
    }
}
