//! Output formatting for session collections and reports.

use auth_session_core::{DetailClient, DetailSessions, ScalarField, SummarySessions};
use serde::{Deserialize, Serialize};

use crate::ParsedSessions;
use crate::report::{BatchReport, ParseReport};

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Markdown,
    Table,
}

impl OutputFormat {
    /// File extension used for batch outputs.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Markdown => "md",
            Self::Table => "txt",
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

fn to_yaml<T: Serialize>(value: &T) -> Result<String, String> {
    serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}"))
}

/// Formats a summary collection in the requested output format.
pub fn format_summary(sessions: &SummarySessions, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => to_json(sessions),
        OutputFormat::Yaml => to_yaml(sessions),
        OutputFormat::Markdown => Ok(summary_to_markdown(sessions)),
        OutputFormat::Table => Ok(summary_to_table(sessions)),
    }
}

/// Formats a detail collection in the requested output format.
pub fn format_details(sessions: &DetailSessions, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => to_json(sessions),
        OutputFormat::Yaml => to_yaml(sessions),
        OutputFormat::Markdown => Ok(details_to_markdown(sessions)),
        OutputFormat::Table => Ok(details_to_table(sessions)),
    }
}

/// Formats either collection.
pub fn format_sessions(sessions: &ParsedSessions, format: OutputFormat) -> Result<String, String> {
    match sessions {
        ParsedSessions::Summary(summary) => format_summary(summary, format),
        ParsedSessions::Details(details) => format_details(details, format),
    }
}

/// Formats a parse report in the requested output format.
pub fn format_report(report: &ParseReport, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Yaml => to_yaml(report),
        OutputFormat::Markdown => Ok(report_to_markdown(report)),
        OutputFormat::Table => Ok(report_to_table(report)),
    }
}

/// Formats a batch report in the requested output format.
pub fn format_batch_report(report: &BatchReport, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Yaml => to_yaml(report),
        OutputFormat::Markdown => Ok(batch_to_markdown(report)),
        OutputFormat::Table => Ok(batch_to_table(report)),
    }
}

fn summary_rows(sessions: &SummarySessions) -> Vec<[String; 6]> {
    let mut rows = Vec::new();
    for (name, intf) in &sessions.interfaces {
        for (mac, client) in &intf.client {
            for session_id in client.session.keys() {
                rows.push([
                    name.clone(),
                    mac.clone(),
                    client.method.clone(),
                    client.domain.clone(),
                    client.status.clone(),
                    session_id.clone(),
                ]);
            }
        }
    }
    rows
}

const SUMMARY_HEADERS: [&str; 6] = ["Interface", "MAC Address", "Method", "Domain", "Status", "Session ID"];

fn summary_to_table(sessions: &SummarySessions) -> String {
    let rows = summary_rows(sessions);
    let mut widths = SUMMARY_HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    out.push_str(&render_row(SUMMARY_HEADERS, widths));
    out.push('\n');
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    out.push('\n');
    for row in &rows {
        out.push_str(&render_row(row.each_ref().map(String::as_str), widths));
        out.push('\n');
    }
    out
}

fn render_row(cells: [&str; 6], widths: [usize; 6]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn summary_to_markdown(sessions: &SummarySessions) -> String {
    let mut out = String::new();
    out.push_str("# Authentication Sessions\n\n");
    out.push_str("| Interface | MAC Address | Method | Domain | Status | Session ID |\n");
    out.push_str("|-----------|-------------|--------|--------|--------|------------|\n");
    for [name, mac, method, domain, status, session] in summary_rows(sessions) {
        out.push_str(&format!(
            "| {name} | `{mac}` | {method} | {domain} | {status} | `{session}` |\n"
        ));
    }
    out
}

/// Label/value pairs for one detail client, in display order.
fn detail_fields(client: &DetailClient) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    for field in ScalarField::ALL {
        if let Some(value) = client.get(field) {
            fields.push((field.key().to_string(), value.to_string()));
        }
    }
    if let Some(timer) = &client.session_timeout {
        let value = match (&timer.timeout, &timer.remaining) {
            (Some(timeout), Some(remaining)) => {
                format!("{timeout} ({}), remaining {remaining}", timer.kind)
            }
            _ => timer.kind.clone(),
        };
        fields.push(("session_timeout".to_string(), value));
    }
    if let Some(policies) = &client.local_policies {
        for (name, template) in &policies.template {
            fields.push((
                "template".to_string(),
                format!("{name} (priority {})", template.priority),
            ));
        }
        if let Some(group) = policies.vlan_group {
            fields.push(("vlan_group".to_string(), group.vlan.to_string()));
        }
        if let Some(policy) = &policies.security_policy {
            fields.push(("security_policy".to_string(), policy.clone()));
        }
        if let Some(status) = &policies.security_status {
            fields.push(("security_status".to_string(), status.clone()));
        }
    }
    for status in client.method_status.values() {
        fields.push((format!("method {}", status.method), status.state.clone()));
    }
    fields
}

fn details_to_table(sessions: &DetailSessions) -> String {
    let mut out = String::new();
    for (name, intf) in &sessions.interfaces {
        for (mac, client) in &intf.mac_address {
            out.push_str(&format!("{name}  {mac}\n"));
            let fields = detail_fields(client);
            let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
            for (label, value) in fields {
                out.push_str(&format!("  {label:<width$}  {value}\n"));
            }
            out.push('\n');
        }
    }
    out
}

fn details_to_markdown(sessions: &DetailSessions) -> String {
    let mut out = String::new();
    out.push_str("# Authentication Session Details\n\n");
    for (name, intf) in &sessions.interfaces {
        out.push_str(&format!("## {name}\n\n"));
        for (mac, client) in &intf.mac_address {
            out.push_str(&format!("### `{mac}`\n\n"));
            out.push_str("| Attribute | Value |\n");
            out.push_str("|-----------|-------|\n");
            for (label, value) in detail_fields(client) {
                out.push_str(&format!("| {label} | {value} |\n"));
            }
            out.push('\n');
        }
    }
    out
}

fn report_to_markdown(report: &ParseReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Parse Report: {}\n\n", report.form));
    if let Some(interface) = &report.interface {
        out.push_str(&format!("**Interface:** {interface}\n\n"));
    }
    out.push_str(&format!("**Success:** {}\n\n", report.success));
    if let Some(code) = report.failure_code {
        out.push_str(&format!("**Failure:** {code}"));
        if let Some(detail) = &report.failure_detail {
            out.push_str(&format!(" ({detail})"));
        }
        out.push_str("\n\n");
    }
    out.push_str(&format!(
        "**Coverage:** {:.0}% ({} of {} relevant lines)\n\n",
        report.coverage * 100.0,
        report.recognized_lines,
        report.relevant_lines
    ));
    out.push_str(&format!(
        "**Interfaces:** {}  **Clients:** {}\n\n",
        report.interface_count, report.client_count
    ));
    if !report.warnings.is_empty() {
        out.push_str("## Warnings\n\n");
        for warning in &report.warnings {
            out.push_str(&format!("- {warning}\n"));
        }
        out.push('\n');
    }
    if !report.unresolved_lines.is_empty() {
        out.push_str("## Unresolved Lines\n\n");
        for line in &report.unresolved_lines {
            out.push_str(&format!("- `{line}`\n"));
        }
        out.push('\n');
    }
    out
}

fn report_to_table(report: &ParseReport) -> String {
    let mut out = String::new();
    let status = match report.failure_code {
        None => "ok".to_string(),
        Some(code) => format!("FAILED ({code})"),
    };
    out.push_str(&format!(
        "Form: {}  Status: {status}  Coverage: {:.0}%\n",
        report.form,
        report.coverage * 100.0
    ));
    if let Some(interface) = &report.interface {
        out.push_str(&format!("  Interface: {interface}\n"));
    }
    if let Some(detail) = &report.failure_detail {
        out.push_str(&format!("  Detail: {detail}\n"));
    }
    out.push_str(&format!(
        "  Lines: {} total, {} relevant, {} recognized\n",
        report.total_lines, report.relevant_lines, report.recognized_lines
    ));
    out.push_str(&format!(
        "  Interfaces: {}  Clients: {}  Filtered: {}  Dropped: {}\n",
        report.interface_count, report.client_count, report.filtered_records, report.dropped_records
    ));
    for warning in &report.warnings {
        out.push_str(&format!("  warning: {warning}\n"));
    }
    out
}

fn batch_to_markdown(report: &BatchReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Batch Report: {}\n\n", report.form));
    out.push_str(&format!(
        "**Total:** {}  **Succeeded:** {}  **Failed:** {}\n\n",
        report.total, report.succeeded, report.failed
    ));
    out.push_str("| Input | Result | Clients | Coverage |\n");
    out.push_str("|-------|--------|---------|----------|\n");
    for entry in &report.entries {
        let (result, clients, coverage) = batch_entry_cells(entry);
        out.push_str(&format!("| `{}` | {result} | {clients} | {coverage} |\n", entry.input));
    }
    out
}

fn batch_to_table(report: &BatchReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Form: {}  Total: {}  Succeeded: {}  Failed: {}\n",
        report.form, report.total, report.succeeded, report.failed
    ));
    for entry in &report.entries {
        let (result, clients, coverage) = batch_entry_cells(entry);
        out.push_str(&format!(
            "  {}  {result}  clients={clients}  coverage={coverage}\n",
            entry.input
        ));
    }
    for (code, count) in &report.failure_codes {
        out.push_str(&format!("  {code}: {count}\n"));
    }
    out
}

fn batch_entry_cells(entry: &crate::report::BatchEntry) -> (String, String, String) {
    match (&entry.report, &entry.error) {
        (Some(report), _) => (
            report
                .failure_code
                .map_or_else(|| "ok".to_string(), |code| code.to_string()),
            report.client_count.to_string(),
            format!("{:.0}%", report.coverage * 100.0),
        ),
        (None, Some(error)) => (format!("error: {error}"), "-".to_string(), "-".to_string()),
        (None, None) => ("-".to_string(), "-".to_string(), "-".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use auth_session_core::SessionForm;

    use super::*;

    fn sample_summary() -> SummarySessions {
        let mut sessions = SummarySessions::new();
        sessions.record_row(
            "GigabitEthernet1/0/48",
            "0015.63b0.f676",
            "dot1x",
            "DATA",
            "Authz Success",
            "0A3462B1000000102983C05C",
        );
        sessions
    }

    #[test]
    fn test_summary_json_has_interfaces_root() {
        let json = format_summary(&sample_summary(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value["interfaces"]["GigabitEthernet1/0/48"]["client"]["0015.63b0.f676"]["status"],
            "Authz Success"
        );
    }

    #[test]
    fn test_summary_table_aligns_columns() {
        let table = format_summary(&sample_summary(), OutputFormat::Table).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Interface"));
        assert_eq!(lines[0].find("MAC Address"), lines[2].find("0015.63b0.f676"));
    }

    #[test]
    fn test_details_markdown_lists_attributes() {
        let mut sessions = DetailSessions::new();
        let mut client = DetailClient::default();
        client.set(ScalarField::Status, "Authorized");
        client.set_method_state("dot1x", "Authc Success");
        sessions.merge_client("GigabitEthernet1/12", "6390.c2f7.5d21", client);

        let md = format_details(&sessions, OutputFormat::Markdown).unwrap();
        assert!(md.contains("## GigabitEthernet1/12"));
        assert!(md.contains("| status | Authorized |"));
        assert!(md.contains("| method dot1x | Authc Success |"));
    }

    #[test]
    fn test_report_table_shows_failure() {
        let mut report = ParseReport::new(SessionForm::Summary, None, "");
        report.record_failure(&crate::ParseError::EmptyInput);
        let table = format_report(&report, OutputFormat::Table).unwrap();
        assert!(table.contains("FAILED (empty_result)"));
    }

    #[test]
    fn test_output_format_serde_lowercase() {
        let format: OutputFormat = serde_yaml::from_str("markdown").unwrap();
        assert_eq!(format, OutputFormat::Markdown);
        assert_eq!(OutputFormat::Table.extension(), "txt");
    }
}
