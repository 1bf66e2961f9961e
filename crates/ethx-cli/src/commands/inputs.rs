//! Digital input command.

use ethx_core::config::ModuleConfig;
use ethx_core::device::EthModule;

use crate::cli::InputsArgs;
use crate::error::CliError;
use crate::output::get_formatter;
use crate::types::ChannelStates;

/// Run the inputs command
pub async fn run_inputs(
    args: InputsArgs,
    config: &ModuleConfig,
    json: bool,
) -> Result<(), CliError> {
    let formatter = get_formatter(json);

    let mut module = EthModule::connect(&args.ip, config).await?;
    let result = module.digital_input_states().await;
    module.close().await;

    let states = ChannelStates::from_bytes(&args.ip, "inputs", result?);
    println!("{}", formatter.format_channel_states(&states));

    Ok(())
}
