//! Structured parse reporting.
//!
//! Every `*_with_report` entry point pairs its result with a [`ParseReport`]
//! describing what was read: line coverage, dropped or filtered records,
//! warnings, and a digest of the input so reports can be matched to the
//! capture they came from.

use std::collections::BTreeMap;

use auth_session_core::SessionForm;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ParseError;
use crate::parser::ParseDiagnostics;

/// Structured failure code for unsuccessful parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    /// Input was blank, or nothing matched the requested interface.
    EmptyResult,
    /// A record lacks a mandatory attribute.
    MissingRequiredKey,
    /// The required-field list names an unknown attribute.
    InvalidRequirement,
}

impl std::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyResult => write!(f, "empty_result"),
            Self::MissingRequiredKey => write!(f, "missing_required_key"),
            Self::InvalidRequirement => write!(f, "invalid_requirement"),
        }
    }
}

/// Report for one parse call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseReport {
    pub form: SessionForm,
    /// Requested interface in canonical form, when one was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    pub success: bool,
    /// Structured failure code when the parse did not succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_code: Option<FailureCode>,
    /// Human-readable detail about the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_detail: Option<String>,
    pub total_lines: usize,
    pub relevant_lines: usize,
    pub recognized_lines: usize,
    pub coverage: f64,
    pub filtered_records: usize,
    pub dropped_records: usize,
    pub unresolved_lines: Vec<String>,
    pub interface_count: usize,
    pub client_count: usize,
    pub warnings: Vec<String>,
    /// Hex SHA-256 of the raw input text.
    pub input_sha256: String,
    /// RFC 3339 timestamp.
    pub generated_at: String,
}

impl ParseReport {
    /// Creates a report for `input` with no outcome recorded yet.
    pub fn new(form: SessionForm, interface: Option<&str>, input: &str) -> Self {
        Self {
            form,
            interface: interface.map(str::to_string),
            success: false,
            failure_code: None,
            failure_detail: None,
            total_lines: 0,
            relevant_lines: 0,
            recognized_lines: 0,
            coverage: 0.0,
            filtered_records: 0,
            dropped_records: 0,
            unresolved_lines: Vec::new(),
            interface_count: 0,
            client_count: 0,
            warnings: Vec::new(),
            input_sha256: input_digest(input),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub(crate) fn record_diagnostics(&mut self, diagnostics: &ParseDiagnostics, warnings: &[String]) {
        self.total_lines = diagnostics.total_lines;
        self.relevant_lines = diagnostics.relevant_lines;
        self.recognized_lines = diagnostics.recognized_lines;
        self.coverage = diagnostics.coverage();
        self.filtered_records = diagnostics.filtered_records;
        self.dropped_records = diagnostics.dropped_records;
        self.unresolved_lines = diagnostics.unresolved_lines.clone();
        self.warnings = warnings.to_vec();
    }

    pub(crate) fn record_success(&mut self, interface_count: usize, client_count: usize) {
        self.success = true;
        self.failure_code = None;
        self.failure_detail = None;
        self.interface_count = interface_count;
        self.client_count = client_count;
    }

    pub(crate) fn record_failure(&mut self, error: &ParseError) {
        self.success = false;
        self.failure_code = Some(error.failure_code());
        self.failure_detail = Some(error.to_string());
    }
}

/// Hex-encoded SHA-256 of `text`.
pub fn input_digest(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// A parse result paired with its report.
#[derive(Debug, Clone)]
pub struct ParseRun<T> {
    pub result: Result<T, ParseError>,
    pub report: ParseReport,
}

impl<T> ParseRun<T> {
    /// Discards the report.
    pub fn into_result(self) -> Result<T, ParseError> {
        self.result
    }
}

/// One capture in a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Capture file that was parsed.
    pub input: String,
    /// Rendered output file, when the parse succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Read or write failure for this capture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ParseReport>,
}

impl BatchEntry {
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.report.as_ref().is_some_and(|report| report.success)
    }
}

/// Summary of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub form: SessionForm,
    pub generated_at: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Failure code → number of captures that failed with it.
    pub failure_codes: BTreeMap<String, usize>,
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn new(form: SessionForm, entries: Vec<BatchEntry>) -> Self {
        let succeeded = entries.iter().filter(|entry| entry.succeeded()).count();
        let reports: Vec<&ParseReport> = entries
            .iter()
            .filter_map(|entry| entry.report.as_ref())
            .collect();
        Self {
            form,
            generated_at: chrono::Utc::now().to_rfc3339(),
            total: entries.len(),
            succeeded,
            failed: entries.len() - succeeded,
            failure_codes: failure_code_summary(reports),
            entries,
        }
    }
}

/// Counts failure codes across `reports`.
pub fn failure_code_summary<'a>(
    reports: impl IntoIterator<Item = &'a ParseReport>,
) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for code in reports.into_iter().filter_map(|report| report.failure_code) {
        *counts.entry(code.to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use auth_session_core::ValidationError;

    use super::*;

    #[test]
    fn test_failure_code_display_matches_serde() {
        let codes = [
            (FailureCode::EmptyResult, "empty_result"),
            (FailureCode::MissingRequiredKey, "missing_required_key"),
            (FailureCode::InvalidRequirement, "invalid_requirement"),
        ];

        for (code, expected) in codes {
            assert_eq!(code.to_string(), expected);
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{expected}\""));
        }
    }

    #[test]
    fn test_input_digest_is_stable_hex() {
        let digest = input_digest("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_report_omits_failure_fields_on_success() {
        let mut report = ParseReport::new(SessionForm::Summary, None, "text");
        report.record_success(1, 1);
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("failure_code"));
        assert!(!json.contains("\"interface\""));
    }

    #[test]
    fn test_report_records_failure() {
        let mut report = ParseReport::new(SessionForm::Details, Some("GigabitEthernet1/0/1"), "");
        report.record_failure(&ParseError::Schema(ValidationError::MissingRequiredKey {
            path: "interfaces.GigabitEthernet1/0/1.mac_address.0010.0010.0001".to_string(),
            key: "status".to_string(),
        }));
        assert!(!report.success);
        assert_eq!(report.failure_code, Some(FailureCode::MissingRequiredKey));
        assert!(report.failure_detail.as_deref().unwrap().contains("'status'"));
    }

    #[test]
    fn test_failure_code_summary_counts() {
        let mut empty = ParseReport::new(SessionForm::Summary, None, "");
        empty.record_failure(&ParseError::EmptyInput);
        let mut ok = ParseReport::new(SessionForm::Summary, None, "x");
        ok.record_success(1, 1);

        let counts = failure_code_summary([&empty, &ok, &empty]);
        assert_eq!(counts.get("empty_result"), Some(&2));
        assert_eq!(counts.len(), 1);
    }
}
