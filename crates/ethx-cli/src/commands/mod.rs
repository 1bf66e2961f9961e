//! Command implementations.

pub mod analogue;
pub mod discover;
pub mod info;
pub mod inputs;
pub mod outputs;
pub mod session;

pub use analogue::run_analogue;
pub use discover::run_discover;
pub use info::run_info;
pub use inputs::run_inputs;
pub use outputs::run_outputs;
pub use session::run_session;

use ethx_core::types::Status;

use crate::error::CliError;
use crate::output::OutputFormatter;

/// Print a status reply; a non-success status becomes an error.
pub(crate) fn report_status(
    formatter: &dyn OutputFormatter,
    ip: &str,
    command: &str,
    status: Status,
) -> Result<(), CliError> {
    println!(
        "{}",
        formatter.format_command_result(ip, command, &status.to_string(), status.is_success())
    );

    if status.is_success() {
        Ok(())
    } else {
        Err(CliError::CommandFailed {
            command: command.to_string(),
            status,
        })
    }
}
