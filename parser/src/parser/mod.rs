//! Parsers for `show authentication sessions` output.
//!
//! Two layouts are supported:
//!
//! - **Summary**: one table row per session:
//!   `Gi1/0/48  0015.63b0.f676  dot1x  DATA  Authz Success  0A3462B1…`
//! - **Details**: one `Label:  value` block per client, with nested
//!   `Local Policies:`, `Server Policies:` and method list sections. Several
//!   blocks may share an interface; dashed lines separate them.
//!
//! # Architecture
//!
//! Both parsers share one pipeline: raw text is normalized, each line is
//! classified without context against the noise patterns and the label
//! table ([`classify_line`], [`match_label`]), and a stateful single-pass accumulator turns classified lines
//! into records that are merged into the output collection with
//! get-or-create semantics. The finished collection passes through the
//! schema gate in `auth-session-core` before it is returned.
//!
//! Most consumers should use [`parse_summary`](crate::parse_summary) and
//! [`parse_details`](crate::parse_details) instead of driving
//! [`SummaryParser`] or [`DetailParser`] directly.

mod classify;
mod detail;
mod labels;
mod normalize;
mod summary;

use regex::Regex;
use std::sync::LazyLock;

pub use classify::{LineClass, classify_line, is_noise_line};
pub use detail::{DetailParser, parse_session_timeout};
pub use labels::{LABELS, LabelTarget, SECTIONS, Section, match_label, match_section};
pub use normalize::{normalize_output, to_indexed_lines};
pub use summary::{SummaryParser, SummaryRow, parse_summary_row};

/// Diagnostics for a single parse run.
#[derive(Debug, Clone, Default)]
pub struct ParseDiagnostics {
    /// Lines in the normalized input.
    pub total_lines: usize,
    /// Lines that were not blank, noise, separators or headers.
    pub relevant_lines: usize,
    /// Relevant lines that contributed to (or were absorbed by) a record.
    pub recognized_lines: usize,
    /// Rows or records dropped by the interface filter.
    pub filtered_records: usize,
    /// Detail records dropped because they had no MAC address.
    pub dropped_records: usize,
    /// Relevant lines nothing understood, verbatim.
    pub unresolved_lines: Vec<String>,
}

impl ParseDiagnostics {
    pub fn coverage(&self) -> f64 {
        if self.relevant_lines == 0 {
            return 0.0;
        }
        self.recognized_lines as f64 / self.relevant_lines as f64
    }

    fn note_recognized(&mut self) {
        self.relevant_lines += 1;
        self.recognized_lines += 1;
    }

    fn note_unresolved(&mut self, line: &IndexedLine) {
        self.relevant_lines += 1;
        self.unresolved_lines.push(line.text.trim().to_string());
    }
}

#[derive(Debug, Clone)]
pub struct IndexedLine {
    pub index: usize,
    pub text: String,
}

/// Regex patterns shared by the classifier and both parsers.
static PATTERNS: LazyLock<SessionPatterns> = LazyLock::new(SessionPatterns::new);

struct SessionPatterns {
    // Noise
    command_echo: Regex,
    bare_prompt: Regex,
    banner: Regex,

    // Structure
    delimiter: Regex,
    table_header: Regex,
    method_header: Regex,

    // Summary rows
    summary_row: Regex,
    mac_address: Regex,

    // Detail values
    session_timeout: Regex,
    template: Regex,
    vlan_group: Regex,
    method_row: Regex,
}

/// Dotted (`0015.63b0.f676`), colon or hyphen separated MAC address.
const MAC_PATTERN: &str = r"(?:[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}|[0-9a-fA-F]{2}(?:[:-][0-9a-fA-F]{2}){5})";

impl SessionPatterns {
    fn new() -> Self {
        // All regexes here are compile-time constants. An expect() failure indicates
        // a programmer error in the pattern, not a runtime condition.
        Self {
            // show authentication sessions / Switch# show authentication sessions ...
            command_echo: Regex::new(r"(?i)^(?:\S+[#>]\s*)?show\s+\S").expect("static regex must compile"),
            // Switch#
            bare_prompt: Regex::new(r"^\S+[#>]$").expect("static regex must compile"),
            banner: Regex::new(
                r"(?i)^(?:load for\s|time source is\s|session count\s*=|no sessions?\b)"
            ).expect("static regex must compile"),

            delimiter: Regex::new(r"^-{4,}$").expect("static regex must compile"),
            // Interface  MAC Address  Method ... / Interface  Identifier  Method ...
            table_header: Regex::new(
                r"(?i)^interface\s+(?:identifier|mac(?:\s+address)?)\b"
            ).expect("static regex must compile"),
            method_header: Regex::new(r"(?i)^method\s+state$").expect("static regex must compile"),

            // Everything between the domain token and the trailing session id
            // is the status phrase ("Authz Success", "Auth"), minus a
            // one-letter Fg flag column when the device fills it.
            summary_row: Regex::new(&format!(
                r"^(?P<interface>\S+)\s+(?P<mac>{MAC_PATTERN})\s+(?P<method>\S+)\s+(?P<domain>\S+)\s+(?P<status>\S.*?)(?:\s+(?P<flag>[ADFIPRUX]))?\s+(?P<session>\S+)$"
            )).expect("static regex must compile"),
            mac_address: Regex::new(&format!("^{MAC_PATTERN}$")).expect("static regex must compile"),

            // 43200s (local), Remaining: 31799s
            session_timeout: Regex::new(
                r"(?i)^(?P<timeout>\S+)\s*\(\s*(?P<kind>[^)]+?)\s*\)\s*,?\s*remaining\s*:?\s*(?P<remaining>\S+)"
            ).expect("static regex must compile"),
            // CRITICAL_VLAN (priority 150)
            template: Regex::new(
                r"(?i)^(?P<name>\S+)\s*\(\s*priority\s+(?P<priority>\d+)\s*\)"
            ).expect("static regex must compile"),
            // Vlan: 130
            vlan_group: Regex::new(r"(?i)^(?:vlan\s*:?\s*)?(?P<vlan>\d+)\b").expect("static regex must compile"),
            // dot1x            Authc Success
            method_row: Regex::new(r"^(?P<method>\S+)\s+(?P<state>\S.*)$").expect("static regex must compile"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        assert!(PATTERNS.mac_address.is_match("0015.63b0.f676"));
        assert!(PATTERNS.mac_address.is_match("00:15:63:B0:F6:76"));
        assert!(!PATTERNS.mac_address.is_match("0015.63b0"));
    }

    #[test]
    fn test_coverage_ratio() {
        let mut diagnostics = ParseDiagnostics::default();
        assert_eq!(diagnostics.coverage(), 0.0);
        diagnostics.note_recognized();
        diagnostics.note_unresolved(&IndexedLine {
            index: 4,
            text: "  Postures:  none ".to_string(),
        });
        assert_eq!(diagnostics.coverage(), 0.5);
        assert_eq!(diagnostics.unresolved_lines, vec!["Postures:  none"]);
    }
}
