//! JSON-formatted output for CLI.

use ethx_core::types::ScanResult;
use serde::Serialize;
use serde_json::{json, Value};

use super::OutputFormatter;
use crate::types::{ChannelStates, ModuleReport};

pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }

    fn to_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for JsonOutput {
    fn format_modules(&self, modules: &[ScanResult]) -> String {
        let output = json!({
            "modules": modules,
            "count": modules.len()
        });
        Self::to_json(&output)
    }

    fn format_module_report(&self, report: &ModuleReport) -> String {
        Self::to_json(report)
    }

    fn format_channel_states(&self, states: &ChannelStates) -> String {
        Self::to_json(states)
    }

    fn format_command_result(
        &self,
        ip: &str,
        command: &str,
        result: &str,
        success: bool,
    ) -> String {
        // Numeric readings come through as JSON numbers
        let result_value: Value = serde_json::from_str(result).unwrap_or_else(|_| json!(result));

        Self::to_json(&json!({
            "ip": ip,
            "command": command,
            "success": success,
            "result": result_value
        }))
    }

    fn format_bulk_reports(&self, results: &[(String, Result<ModuleReport, String>)]) -> String {
        let items: Vec<Value> = results
            .iter()
            .map(|(ip, result)| match result {
                Ok(report) => json!({
                    "ip": ip,
                    "success": true,
                    "result": report
                }),
                Err(message) => json!({
                    "ip": ip,
                    "success": false,
                    "error": message
                }),
            })
            .collect();

        let success_count = results.iter().filter(|(_, r)| r.is_ok()).count();
        let fail_count = results.len() - success_count;

        Self::to_json(&json!({
            "results": items,
            "summary": {
                "total": results.len(),
                "succeeded": success_count,
                "failed": fail_count
            }
        }))
    }
}
