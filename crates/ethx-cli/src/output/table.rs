//! Table-formatted output for CLI.

use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use ethx_core::types::ScanResult;

use super::OutputFormatter;
use crate::types::{ChannelStates, ModuleReport};

pub struct TableOutput;

impl TableOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TableOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TableOutput {
    fn format_modules(&self, modules: &[ScanResult]) -> String {
        if modules.is_empty() {
            return "No modules found.".to_string();
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["IP", "Host Name", "Model", "ID", "MAC"]);

        for module in modules {
            table.add_row(vec![
                Cell::new(&module.ip_address),
                Cell::new(&module.host_name),
                Cell::new(module.kind().display_name()),
                Cell::new(module.device_id.to_string()),
                Cell::new(&module.mac_address),
            ]);
        }

        format!("{}\n\nFound {} module(s)", table, modules.len())
    }

    fn format_module_report(&self, report: &ModuleReport) -> String {
        let identity = &report.identity;
        let caps = &identity.capabilities;
        let mut lines = Vec::new();

        lines.push(format!("Module: {} ({})", report.ip, identity.name.bold()));
        lines.push(format!("  Type ID:    {}", identity.id));
        lines.push(format!("  Hardware:   {}", identity.hardware_version));
        lines.push(format!("  Firmware:   {}", identity.firmware_version));
        lines.push(format!("  Serial:     {}", report.serial_number));
        lines.push(format!("  Supply:     {:.1} V", report.psu_voltage));
        lines.push("  Channels:".to_string());
        lines.push(format!("    Digital outputs: {}", caps.digital_output_channels()));
        lines.push(format!("    Digital inputs:  {} byte(s)", caps.digital_input_bytes));
        lines.push(format!("    Analogue inputs: {}", caps.analogue_inputs));
        lines.push(format!("    Analogue outputs: {}", caps.analogue_outputs));

        lines.join("\n")
    }

    fn format_channel_states(&self, states: &ChannelStates) -> String {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Channel", "State"]);

        for (index, on) in states.channels.iter().enumerate() {
            let state_cell = if *on {
                Cell::new("ON").fg(Color::Green)
            } else {
                Cell::new("off").fg(Color::DarkGrey)
            };
            table.add_row(vec![Cell::new(index + 1), state_cell]);
        }

        let raw: Vec<String> = states.raw.iter().map(|b| format!("{:02X}", b)).collect();
        format!(
            "Digital {} on {} (raw {})\n{}",
            states.direction,
            states.ip,
            raw.join(" "),
            table
        )
    }

    fn format_command_result(
        &self,
        ip: &str,
        command: &str,
        result: &str,
        success: bool,
    ) -> String {
        let status = if success {
            "[OK]".green()
        } else {
            "[FAIL]".red()
        };

        format!("{} {} '{}'\n{}", status, ip, command, result)
    }

    fn format_bulk_reports(&self, results: &[(String, Result<ModuleReport, String>)]) -> String {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["IP", "Status", "Result"]);

        let mut success_count = 0;
        let mut fail_count = 0;

        for (ip, result) in results {
            let (status_cell, message) = match result {
                Ok(report) => {
                    success_count += 1;
                    (Cell::new("OK").fg(Color::Green), report.summary())
                }
                Err(e) => {
                    fail_count += 1;
                    (Cell::new("FAIL").fg(Color::Red), e.clone())
                }
            };

            table.add_row(vec![Cell::new(ip), status_cell, Cell::new(message)]);
        }

        let summary = format!(
            "\nSummary: {} succeeded, {} failed",
            success_count.to_string().green(),
            fail_count.to_string().red()
        );

        format!("{}{}", table, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_module_list() {
        assert_eq!(TableOutput::new().format_modules(&[]), "No modules found.");
    }

    #[test]
    fn test_module_list_shows_model_name() {
        let modules = vec![ScanResult {
            ip_address: "192.168.0.10".to_string(),
            host_name: "MYDEVICE".to_string(),
            device_id: 21,
            mac_address: "de:ad:be:ef:00:01".to_string(),
        }];
        let output = TableOutput::new().format_modules(&modules);
        assert!(output.contains("ETH8020"));
        assert!(output.contains("192.168.0.10"));
        assert!(output.contains("Found 1 module(s)"));
    }

    #[test]
    fn test_channel_states_raw_bytes() {
        let states = ChannelStates::from_bytes("10.0.0.1", "outputs", vec![0x05]);
        let output = TableOutput::new().format_channel_states(&states);
        assert!(output.starts_with("Digital outputs on 10.0.0.1 (raw 05)"));
        assert!(output.contains("ON"));
    }
}
