//! Parser for the tabular `show authentication sessions` layout.

use auth_session_core::{SummarySessions, canonical_interface_name, validate_summary};
use tracing::debug;

use super::classify::{LineClass, classify_line};
use super::normalize::{normalize_output, to_indexed_lines};
use super::{PATTERNS, ParseDiagnostics};
use crate::error::ParseError;

/// One data row of the summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    /// Canonical long-form interface name.
    pub interface: String,
    pub mac: String,
    pub method: String,
    pub domain: String,
    /// Everything between the domain and session id columns, except the
    /// flag.
    pub status: String,
    /// `Fg` column (`A`, `D`, `F`, `I`, `P`, `R`, `U` or `X`), when filled.
    pub flag: Option<String>,
    pub session_id: String,
}

/// Splits a summary row into its columns.
///
/// Returns `None` for lines that are not data rows. The interface column is
/// expanded to its canonical name (`Gi1/0/48` → `GigabitEthernet1/0/48`).
pub fn parse_summary_row(line: &str) -> Option<SummaryRow> {
    let caps = PATTERNS.summary_row.captures(line.trim())?;
    Some(SummaryRow {
        interface: canonical_interface_name(&caps["interface"]),
        mac: caps["mac"].to_string(),
        method: caps["method"].to_string(),
        domain: caps["domain"].to_string(),
        status: caps["status"].to_string(),
        flag: caps.name("flag").map(|m| m.as_str().to_string()),
        session_id: caps["session"].to_string(),
    })
}

/// Parser for summary (tabular) output.
pub struct SummaryParser {
    raw_output: String,
    filter: Option<String>,
    warnings: Vec<String>,
    diagnostics: ParseDiagnostics,
}

impl SummaryParser {
    /// Creates a parser. Rows whose interface does not match `filter` are
    /// skipped.
    pub fn new(text: &str, filter: Option<&str>) -> Self {
        Self {
            raw_output: text.to_string(),
            filter: filter
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(canonical_interface_name),
            warnings: Vec::new(),
            diagnostics: ParseDiagnostics::default(),
        }
    }

    /// Parses the table and runs the result through the schema gate.
    pub fn parse(&mut self) -> Result<SummarySessions, ParseError> {
        self.warnings.clear();
        self.diagnostics = ParseDiagnostics::default();

        if self.raw_output.trim().is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let normalized = normalize_output(&self.raw_output);
        let lines = to_indexed_lines(&normalized);
        self.diagnostics.total_lines = lines.len();

        let mut sessions = SummarySessions::new();
        for line in &lines {
            let class = classify_line(&line.text);
            if class.is_structural_noise() {
                continue;
            }

            let row = match &class {
                LineClass::Text(text) => parse_summary_row(text),
                _ => None,
            };
            let Some(row) = row else {
                debug!(line = line.index + 1, text = %line.text.trim(), "Unrecognized summary line");
                self.diagnostics.note_unresolved(line);
                continue;
            };
            self.diagnostics.note_recognized();

            if let Some(filter) = &self.filter {
                if *filter != row.interface {
                    debug!(interface = %row.interface, filter = %filter, "Skipping filtered row");
                    self.diagnostics.filtered_records += 1;
                    continue;
                }
            }

            let already_seen = sessions
                .interface(&row.interface)
                .and_then(|intf| intf.client.get(&row.mac))
                .is_some_and(|client| client.session.contains_key(&row.session_id));
            if already_seen {
                self.warnings.push(format!(
                    "line {}: session {} repeated for {} on {}",
                    line.index + 1,
                    row.session_id,
                    row.mac,
                    row.interface
                ));
            }

            sessions.record_row(
                &row.interface,
                &row.mac,
                &row.method,
                &row.domain,
                &row.status,
                &row.session_id,
            );
        }

        debug!(
            interfaces = sessions.len(),
            clients = sessions.client_count(),
            filtered = self.diagnostics.filtered_records,
            "Parsed summary table"
        );

        validate_summary(&sessions)?;
        Ok(sessions)
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn diagnostics(&self) -> &ParseDiagnostics {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use auth_session_core::ValidationError;

    use super::*;

    const TABLE: &str = "\
show authentication sessions
Interface    MAC Address     Method   Domain   Status         Session ID
Gi1/0/48     0015.63b0.f676  dot1x    DATA     Authz Success  0A3462B1000000102983C05C
Gi1/0/5      000f.23c4.a401  mab      DATA     Authz Success  0A3462B10000000D24F80B58
";

    #[test]
    fn test_row_keeps_multi_word_status() {
        let row = parse_summary_row(
            "Gi1/0/48     0015.63b0.f676  dot1x    DATA     Authz Success  0A3462B1000000102983C05C",
        )
        .unwrap();
        assert_eq!(row.interface, "GigabitEthernet1/0/48");
        assert_eq!(row.status, "Authz Success");
        assert_eq!(row.session_id, "0A3462B1000000102983C05C");
    }

    #[test]
    fn test_row_with_single_word_status_and_empty_flag_column() {
        let row =
            parse_summary_row("Gi1/7/35  0000.0022.2222 dot1x  UNKNOWN Auth      141927640000000E0B40EDB0")
                .unwrap();
        assert_eq!(row.domain, "UNKNOWN");
        assert_eq!(row.status, "Auth");
        assert_eq!(row.flag, None);
    }

    #[test]
    fn test_row_splits_filled_flag_column_from_status() {
        let row = parse_summary_row(
            "Te1/0/2  0011.2233.4455  dot1x  VOICE  Authz Success  D  ABCDEF0123456789",
        )
        .unwrap();
        assert_eq!(row.interface, "TenGigabitEthernet1/0/2");
        assert_eq!(row.status, "Authz Success");
        assert_eq!(row.flag.as_deref(), Some("D"));
        assert_eq!(row.session_id, "ABCDEF0123456789");

        let row =
            parse_summary_row("Gi1/0/3  0011.2233.4466  mab  DATA  Unauth  P  0A3462B1000000F0")
                .unwrap();
        assert_eq!(row.status, "Unauth");
        assert_eq!(row.flag.as_deref(), Some("P"));
    }

    #[test]
    fn test_non_rows_are_rejected() {
        assert!(parse_summary_row("Interface    MAC Address     Method").is_none());
        assert!(parse_summary_row("Gi1/0/1  not-a-mac  dot1x  DATA  Auth  0A1").is_none());
    }

    #[test]
    fn test_parse_builds_one_entry_per_row() {
        let mut parser = SummaryParser::new(TABLE, None);
        let sessions = parser.parse().unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions.client_count(), 2);
        assert_eq!(parser.diagnostics().recognized_lines, 2);
        assert!(parser.diagnostics().unresolved_lines.is_empty());
    }

    #[test]
    fn test_filter_skips_other_interfaces() {
        let mut parser = SummaryParser::new(TABLE, Some("gi1/0/5"));
        let sessions = parser.parse().unwrap();
        assert_eq!(
            sessions.interfaces.keys().collect::<Vec<_>>(),
            vec!["GigabitEthernet1/0/5"]
        );
        assert_eq!(parser.diagnostics().filtered_records, 1);
    }

    #[test]
    fn test_filter_without_match_is_empty_result() {
        let mut parser = SummaryParser::new(TABLE, Some("GigabitEthernet9/9/9"));
        assert!(matches!(
            parser.parse(),
            Err(ParseError::Schema(ValidationError::EmptyResult(_)))
        ));
    }

    #[test]
    fn test_whitespace_input_is_empty_input() {
        let mut parser = SummaryParser::new("      ", None);
        assert_eq!(parser.parse(), Err(ParseError::EmptyInput));
    }

    #[test]
    fn test_repeated_row_accumulates_and_warns() {
        let text = format!("{TABLE}Gi1/0/5      000f.23c4.a401  mab      DATA     Authz Success  0A3462B10000000D24F80B58\n");
        let mut parser = SummaryParser::new(&text, None);
        let sessions = parser.parse().unwrap();
        assert_eq!(sessions.client_count(), 2);
        assert_eq!(parser.warnings().len(), 1);
    }
}
