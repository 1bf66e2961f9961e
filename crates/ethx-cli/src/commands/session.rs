//! Password session commands.

use ethx_core::config::ModuleConfig;
use ethx_core::device::EthModule;
use ethx_core::types::Status;

use crate::cli::{SessionArgs, SessionCommands};
use crate::commands::report_status;
use crate::error::{CliError, CommandError};
use crate::output::get_formatter;

enum Reply {
    UnlockTime(u8),
    LoggedOut(Status),
}

/// Run the session command
pub async fn run_session(
    args: SessionArgs,
    config: &ModuleConfig,
    json: bool,
) -> Result<(), CliError> {
    let formatter = get_formatter(json);

    let mut module = EthModule::connect(&args.ip, config).await?;
    let result = execute(&mut module, &args.command).await;
    module.close().await;

    match result? {
        Reply::UnlockTime(seconds) => {
            println!(
                "{}",
                formatter.format_command_result(&args.ip, "unlock time", &seconds.to_string(), true)
            );
            Ok(())
        }
        Reply::LoggedOut(status) => report_status(formatter.as_ref(), &args.ip, "logout", status),
    }
}

async fn execute(
    module: &mut EthModule,
    command: &SessionCommands,
) -> Result<Reply, CommandError> {
    match command {
        SessionCommands::UnlockTime => Ok(Reply::UnlockTime(module.unlock_time().await?)),
        SessionCommands::Logout => Ok(Reply::LoggedOut(module.logout().await?)),
    }
}
