//! Parsing of `show authentication sessions` output.
//!
//! This crate turns the raw text of the IOS-XE authentication session
//! commands into the structured session model defined in
//! `auth-session-core`. Both layouts are supported: the compact summary
//! table and the per-client `details` blocks.
//!
//! # Main entry points
//!
//! - [`parse_summary`]: parse summary table text, optionally restricted to
//!   one interface.
//! - [`parse_details`]: parse detail blocks for one interface.
//! - [`parse_summary_with_report`] / [`parse_details_with_report`]: same,
//!   paired with a [`ParseReport`](report::ParseReport) carrying coverage
//!   and warnings.
//! - [`source::collect_summary`] / [`source::collect_details`]: fetch text
//!   from a [`CommandSource`](source::CommandSource) and parse it.
//!
//! # Example
//!
//! ```
//! use auth_session_parser::parse_summary;
//!
//! let text = "\
//! Interface    MAC Address     Method   Domain   Status         Session ID
//! Gi1/0/48     0015.63b0.f676  dot1x    DATA     Authz Success  0A3462B1000000102983C05C
//! ";
//!
//! let sessions = parse_summary(text, None).unwrap();
//! let client = &sessions.interfaces["GigabitEthernet1/0/48"].client["0015.63b0.f676"];
//! assert_eq!(client.status, "Authz Success");
//! assert!(client.session.contains_key("0A3462B1000000102983C05C"));
//! ```
//!
//! Empty input, or input where nothing matches the requested interface, is
//! an error rather than an empty mapping:
//!
//! ```
//! use auth_session_parser::parse_details;
//!
//! let err = parse_details("      ", "GigabitEthernet3/0/2").unwrap_err();
//! assert!(err.is_empty_result());
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod report;
pub mod source;

use auth_session_core::{
    DetailSessions, RequiredFields, SessionForm, SummarySessions, canonical_interface_name,
};
use serde::Serialize;

pub use error::{CollectError, ParseError};
use parser::{DetailParser, SummaryParser};
use report::{ParseReport, ParseRun};
use source::SourceRequest;

/// Output of either parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParsedSessions {
    Summary(SummarySessions),
    Details(DetailSessions),
}

impl ParsedSessions {
    pub fn form(&self) -> SessionForm {
        match self {
            Self::Summary(_) => SessionForm::Summary,
            Self::Details(_) => SessionForm::Details,
        }
    }

    pub fn interface_count(&self) -> usize {
        match self {
            Self::Summary(sessions) => sessions.len(),
            Self::Details(sessions) => sessions.len(),
        }
    }

    pub fn client_count(&self) -> usize {
        match self {
            Self::Summary(sessions) => sessions.client_count(),
            Self::Details(sessions) => sessions.client_count(),
        }
    }
}

/// Parses summary table text.
///
/// When `interface` is given, rows for other interfaces are skipped; the
/// filter accepts any device spelling (`Gi1/0/5`, `GigabitEthernet1/0/5`).
///
/// # Errors
///
/// [`ParseError::EmptyInput`] for blank text, and the schema gate's
/// empty-result error when no row survives the filter.
pub fn parse_summary(text: &str, interface: Option<&str>) -> Result<SummarySessions, ParseError> {
    SummaryParser::new(text, interface).parse()
}

/// Parses detail blocks for `interface` with the default required fields.
///
/// # Errors
///
/// [`ParseError::EmptyInput`] for blank text, the schema gate's empty-result
/// error when no block for `interface` was found, and its
/// missing-required-key error when a block lacks a mandatory attribute.
pub fn parse_details(text: &str, interface: &str) -> Result<DetailSessions, ParseError> {
    parse_details_with_fields(text, interface, &RequiredFields::default())
}

/// Like [`parse_details`], with an explicit required-field list.
pub fn parse_details_with_fields(
    text: &str,
    interface: &str,
    required: &RequiredFields,
) -> Result<DetailSessions, ParseError> {
    DetailParser::new(text, interface)
        .with_required_fields(required.clone())
        .parse()
}

/// Parses summary table text and reports on the run.
pub fn parse_summary_with_report(
    text: &str,
    interface: Option<&str>,
) -> ParseRun<SummarySessions> {
    let canonical = interface.map(canonical_interface_name);
    let mut report = ParseReport::new(SessionForm::Summary, canonical.as_deref(), text);
    let mut parser = SummaryParser::new(text, interface);
    let result = parser.parse();

    report.record_diagnostics(parser.diagnostics(), parser.warnings());
    match &result {
        Ok(sessions) => report.record_success(sessions.len(), sessions.client_count()),
        Err(e) => report.record_failure(e),
    }
    ParseRun { result, report }
}

/// Parses detail blocks for `interface` and reports on the run.
pub fn parse_details_with_report(
    text: &str,
    interface: &str,
    required: &RequiredFields,
) -> ParseRun<DetailSessions> {
    let mut parser = DetailParser::new(text, interface).with_required_fields(required.clone());
    let mut report = ParseReport::new(SessionForm::Details, Some(parser.interface()), text);
    let result = parser.parse();

    report.record_diagnostics(parser.diagnostics(), parser.warnings());
    match &result {
        Ok(sessions) => report.record_success(sessions.len(), sessions.client_count()),
        Err(e) => report.record_failure(e),
    }
    ParseRun { result, report }
}

/// Parses `text` as the output of `request`.
pub fn parse_request(
    request: &SourceRequest,
    text: &str,
    required: &RequiredFields,
) -> ParseRun<ParsedSessions> {
    match request {
        SourceRequest::Summary { interface } => {
            let run = parse_summary_with_report(text, interface.as_deref());
            ParseRun {
                result: run.result.map(ParsedSessions::Summary),
                report: run.report,
            }
        }
        SourceRequest::Details { interface } => {
            let run = parse_details_with_report(text, interface, required);
            ParseRun {
                result: run.result.map(ParsedSessions::Details),
                report: run.report,
            }
        }
    }
}
