//! Output formatting for CLI results.

pub mod json;
pub mod table;

pub use json::JsonOutput;
pub use table::TableOutput;

use ethx_core::types::ScanResult;

use crate::types::{ChannelStates, ModuleReport};

/// Output formatter trait
pub trait OutputFormatter {
    /// Format discovered module list
    fn format_modules(&self, modules: &[ScanResult]) -> String;

    /// Format the info report of one module
    fn format_module_report(&self, report: &ModuleReport) -> String;

    /// Format digital output or input states
    fn format_channel_states(&self, states: &ChannelStates) -> String;

    /// Format command result
    fn format_command_result(&self, ip: &str, command: &str, result: &str, success: bool) -> String;

    /// Format per-module reports from an "all" query
    fn format_bulk_reports(&self, results: &[(String, Result<ModuleReport, String>)]) -> String;
}

/// Get the appropriate formatter based on JSON flag
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonOutput::new())
    } else {
        Box::new(TableOutput::new())
    }
}
