//! Parser for the `show authentication sessions ... details` layout.
//!
//! The input is a sequence of client blocks. Each block opens with an
//! `Interface:` line and is keyed by its `MAC Address:` value; a dashed
//! delimiter or the next `Interface:` line closes it. Blocks are merged into
//! the output collection only when they close, so a partially read block
//! never leaks into the result.

use auth_session_core::{
    DetailClient, DetailSessions, RequiredFields, SessionTimeout, TemplatePolicy, VlanGroup,
    canonical_interface_name, validate_details,
};
use tracing::{debug, warn};

use super::classify::{LineClass, classify_line};
use super::labels::{LabelTarget, Section};
use super::normalize::{normalize_output, to_indexed_lines};
use super::{IndexedLine, PATTERNS, ParseDiagnostics};
use crate::error::ParseError;

/// Where the parser is inside the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between blocks, or before the first one.
    Scanning,
    InRecord,
    InLocalPolicies,
    /// Content is absorbed until the next section header or block boundary.
    InServerPolicies,
    /// `rows` counts method rows seen so far; a blank line only ends the
    /// list once at least one row was read.
    InMethodList { rows: usize },
}

/// The block being accumulated.
#[derive(Debug)]
struct OpenRecord {
    interface: String,
    opened_at: usize,
    mac: Option<String>,
    client: DetailClient,
}

/// Parses a `Session timeout:` value.
///
/// `43200s (local), Remaining: 31799s` yields a countdown typed by the
/// parenthesized source; anything else (`N/A`, unknown layouts) yields
/// `{type: "N/A"}`.
pub fn parse_session_timeout(value: &str) -> SessionTimeout {
    match PATTERNS.session_timeout.captures(value.trim()) {
        Some(caps) => SessionTimeout::countdown(&caps["kind"], &caps["timeout"], &caps["remaining"]),
        None => SessionTimeout::not_applicable(),
    }
}

/// Parser for detail (key/value block) output.
pub struct DetailParser {
    raw_output: String,
    interface: String,
    required: RequiredFields,
    state: State,
    open: Option<OpenRecord>,
    sessions: DetailSessions,
    warnings: Vec<String>,
    diagnostics: ParseDiagnostics,
}

impl DetailParser {
    /// Creates a parser for the blocks belonging to `interface`.
    ///
    /// `interface` may use any device spelling (`gigabitEthernet 1/12`);
    /// it is canonicalized before matching and in the output keys.
    pub fn new(text: &str, interface: &str) -> Self {
        Self {
            raw_output: text.to_string(),
            interface: canonical_interface_name(interface),
            required: RequiredFields::default(),
            state: State::Scanning,
            open: None,
            sessions: DetailSessions::new(),
            warnings: Vec::new(),
            diagnostics: ParseDiagnostics::default(),
        }
    }

    /// Replaces the attributes every committed record must carry.
    pub fn with_required_fields(mut self, required: RequiredFields) -> Self {
        self.required = required;
        self
    }

    /// Canonical name of the requested interface.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Parses the blocks and runs the result through the schema gate.
    pub fn parse(&mut self) -> Result<DetailSessions, ParseError> {
        self.state = State::Scanning;
        self.open = None;
        self.sessions = DetailSessions::new();
        self.warnings.clear();
        self.diagnostics = ParseDiagnostics::default();

        if self.raw_output.trim().is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let normalized = normalize_output(&self.raw_output);
        let lines = to_indexed_lines(&normalized);
        self.diagnostics.total_lines = lines.len();

        for line in &lines {
            self.process_line(line);
        }
        self.commit();
        self.apply_defaults();

        let sessions = std::mem::take(&mut self.sessions);
        debug!(
            interface = %self.interface,
            clients = sessions.client_count(),
            dropped = self.diagnostics.dropped_records,
            filtered = self.diagnostics.filtered_records,
            "Parsed session details"
        );

        validate_details(&sessions, &self.required)?;
        Ok(sessions)
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn diagnostics(&self) -> &ParseDiagnostics {
        &self.diagnostics
    }

    fn process_line(&mut self, line: &IndexedLine) {
        match classify_line(&line.text) {
            LineClass::Blank => {
                if let State::InMethodList { rows } = self.state {
                    if rows > 0 {
                        self.state = State::InRecord;
                    }
                }
            }
            LineClass::Delimiter => {
                self.commit();
            }
            LineClass::Noise | LineClass::TableHeader => {}
            LineClass::MethodHeader => {
                if matches!(self.state, State::InMethodList { .. }) {
                    self.diagnostics.note_recognized();
                } else {
                    self.diagnostics.note_unresolved(line);
                }
            }
            LineClass::Section(section) => self.enter_section(line, section),
            LineClass::Label(LabelTarget::Interface, value) => {
                self.commit();
                self.open(line, &value);
                self.diagnostics.note_recognized();
            }
            LineClass::Label(target, value) => self.apply_label(line, target, &value),
            LineClass::Text(text) => self.apply_text(line, &text),
        }
    }

    fn open(&mut self, line: &IndexedLine, value: &str) {
        let interface = canonical_interface_name(value);
        debug!(line = line.index + 1, interface = %interface, "Opening session record");
        self.open = Some(OpenRecord {
            interface,
            opened_at: line.index,
            mac: None,
            client: DetailClient::default(),
        });
        self.state = State::InRecord;
    }

    fn enter_section(&mut self, line: &IndexedLine, section: Section) {
        if self.open.is_none() {
            self.diagnostics.note_unresolved(line);
            return;
        }
        self.state = match section {
            Section::LocalPolicies => State::InLocalPolicies,
            Section::ServerPolicies => State::InServerPolicies,
            Section::MethodList => State::InMethodList { rows: 0 },
        };
        self.diagnostics.note_recognized();
    }

    fn apply_label(&mut self, line: &IndexedLine, target: LabelTarget, value: &str) {
        let state = self.state;
        let Some(record) = self.open.as_mut() else {
            self.diagnostics.note_unresolved(line);
            return;
        };

        if state == State::InServerPolicies {
            self.diagnostics.note_recognized();
            return;
        }

        if target.is_policy() {
            if state != State::InLocalPolicies {
                self.warnings.push(format!(
                    "line {}: policy attribute outside Local Policies ignored",
                    line.index + 1
                ));
                self.diagnostics.note_unresolved(line);
                return;
            }
            if apply_policy(&mut record.client, target, value) {
                self.diagnostics.note_recognized();
            } else {
                self.warnings.push(format!(
                    "line {}: unrecognized policy value '{}'",
                    line.index + 1,
                    value
                ));
                self.diagnostics.note_unresolved(line);
            }
            return;
        }

        // A client attribute after a sub-section means the section ended.
        if matches!(state, State::InLocalPolicies | State::InMethodList { .. }) {
            self.state = State::InRecord;
        }

        match target {
            LabelTarget::MacAddress => {
                if !PATTERNS.mac_address.is_match(value) {
                    self.warnings.push(format!(
                        "line {}: unexpected MAC address format '{}'",
                        line.index + 1,
                        value
                    ));
                }
                if let Some(previous) = record.mac.as_deref() {
                    if previous != value {
                        self.warnings.push(format!(
                            "line {}: second MAC address {} in record opened at line {}; keeping the last",
                            line.index + 1,
                            value,
                            record.opened_at + 1
                        ));
                    }
                }
                record.mac = Some(value.to_string());
            }
            LabelTarget::Scalar(field) => record.client.set(field, value),
            LabelTarget::SessionTimeout => {
                record.client.session_timeout = Some(parse_session_timeout(value));
            }
            // Handled above.
            LabelTarget::Interface
            | LabelTarget::Template
            | LabelTarget::VlanGroup
            | LabelTarget::SecurityPolicy
            | LabelTarget::SecurityStatus => {}
        }
        self.diagnostics.note_recognized();
    }

    fn apply_text(&mut self, line: &IndexedLine, text: &str) {
        match self.state {
            State::InServerPolicies => self.diagnostics.note_recognized(),
            State::InMethodList { rows } => {
                let row = PATTERNS.method_row.captures(text);
                match (row, self.open.as_mut()) {
                    (Some(caps), Some(record)) => {
                        record.client.set_method_state(&caps["method"], &caps["state"]);
                        self.state = State::InMethodList { rows: rows + 1 };
                        self.diagnostics.note_recognized();
                    }
                    _ => self.diagnostics.note_unresolved(line),
                }
            }
            State::Scanning | State::InRecord | State::InLocalPolicies => {
                debug!(line = line.index + 1, text = %text, "Unrecognized detail line");
                self.diagnostics.note_unresolved(line);
            }
        }
    }

    /// Closes the open block and merges it into the collection.
    fn commit(&mut self) {
        self.state = State::Scanning;
        let Some(record) = self.open.take() else {
            return;
        };

        let Some(mac) = record.mac else {
            warn!(line = record.opened_at + 1, interface = %record.interface, "Dropping session record without MAC address");
            self.warnings.push(format!(
                "record opened at line {} has no MAC address; dropped",
                record.opened_at + 1
            ));
            self.diagnostics.dropped_records += 1;
            return;
        };

        if record.interface != self.interface {
            debug!(interface = %record.interface, requested = %self.interface, "Skipping record for other interface");
            self.diagnostics.filtered_records += 1;
            return;
        }

        debug!(interface = %record.interface, mac = %mac, "Committing session record");
        self.sessions
            .merge_client(&record.interface, &mac, record.client);
    }

    /// The session timer defaults to `N/A` when no countdown was reported.
    fn apply_defaults(&mut self) {
        for intf in self.sessions.interfaces.values_mut() {
            for client in intf.mac_address.values_mut() {
                client
                    .session_timeout
                    .get_or_insert_with(SessionTimeout::not_applicable);
            }
        }
    }
}

/// Writes one `Local Policies:` attribute. Returns `false` if the value does
/// not have the expected shape.
fn apply_policy(client: &mut DetailClient, target: LabelTarget, value: &str) -> bool {
    match target {
        LabelTarget::Template => {
            let Some(caps) = PATTERNS.template.captures(value) else {
                return false;
            };
            let Ok(priority) = caps["priority"].parse::<u32>() else {
                return false;
            };
            client
                .local_policies_mut()
                .template
                .insert(caps["name"].to_string(), TemplatePolicy { priority });
            true
        }
        LabelTarget::VlanGroup => {
            let Some(caps) = PATTERNS.vlan_group.captures(value) else {
                return false;
            };
            let Ok(vlan) = caps["vlan"].parse::<u32>() else {
                return false;
            };
            client.local_policies_mut().vlan_group = Some(VlanGroup { vlan });
            true
        }
        LabelTarget::SecurityPolicy => {
            client.local_policies_mut().security_policy = Some(value.to_string());
            true
        }
        LabelTarget::SecurityStatus => {
            client.local_policies_mut().security_status = Some(value.to_string());
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use auth_session_core::ValidationError;

    use super::*;

    const TWO_CLIENTS: &str = "\
            Interface:  GigabitEthernet2/0/47
          MAC Address:  0001.1010.0101
               Status:  Authz Success
               Domain:  DATA
       Oper host mode:  multi-host
     Oper control dir:  both
      Session timeout:  N/A
    Common Session ID:  0A3462C8000000000002763C
      Acct Session ID:  0x00000002
               Handle:  0x25000000
Runnable methods list:
       Method   State
       mab      Failed over
----------------------------------------
            Interface:  GigabitEthernet2/0/47
          MAC Address:  0005.5e7c.da05
               Status:  Authz Success
               Domain:  VOICE
       Oper host mode:  multi-domain
     Oper control dir:  both
      Session timeout:  N/A
    Common Session ID:  0A3462C8000000010002A238
      Acct Session ID:  0x00000003
               Handle:  0x91000001
Runnable methods list:
       Method   State
       dot1x    Not run
";

    #[test]
    fn test_session_timeout_forms() {
        assert_eq!(parse_session_timeout("N/A"), SessionTimeout::not_applicable());
        assert_eq!(
            parse_session_timeout("43200s (local), Remaining: 31799s"),
            SessionTimeout::countdown("local", "43200s", "31799s")
        );
        assert_eq!(parse_session_timeout("soon"), SessionTimeout::not_applicable());
    }

    #[test]
    fn test_delimiter_separates_clients_on_same_interface() {
        let mut parser = DetailParser::new(TWO_CLIENTS, "GigabitEthernet2/0/47");
        let sessions = parser.parse().unwrap();
        let intf = &sessions.interfaces["GigabitEthernet2/0/47"];
        assert_eq!(intf.mac_address.len(), 2);

        let first = &intf.mac_address["0001.1010.0101"];
        let second = &intf.mac_address["0005.5e7c.da05"];
        assert_eq!(first.domain.as_deref(), Some("DATA"));
        assert_eq!(second.domain.as_deref(), Some("VOICE"));
        assert_eq!(first.method_status.keys().collect::<Vec<_>>(), vec!["mab"]);
        assert_eq!(second.method_status.keys().collect::<Vec<_>>(), vec!["dot1x"]);
    }

    #[test]
    fn test_interface_line_commits_without_delimiter() {
        let text = "\
Interface:  GigabitEthernet1/0/1
MAC Address:  0000.0000.0001
Status:  Running
Method status list:
    Method   State
    mab      Running
Interface:  GigabitEthernet1/0/1
MAC Address:  0000.0000.0002
Status:  Authorized
Local Policies:
    Vlan Group:  Vlan: 10
";
        let mut parser = DetailParser::new(text, "Gi1/0/1")
            .with_required_fields(RequiredFields::none());
        let sessions = parser.parse().unwrap();
        let intf = &sessions.interfaces["GigabitEthernet1/0/1"];
        assert_eq!(intf.mac_address.len(), 2);

        let first = &intf.mac_address["0000.0000.0001"];
        assert_eq!(first.status.as_deref(), Some("Running"));
        assert_eq!(first.method_status["mab"].state, "Running");
        assert!(first.local_policies.is_none());

        let second = &intf.mac_address["0000.0000.0002"];
        assert_eq!(second.status.as_deref(), Some("Authorized"));
        assert!(second.method_status.is_empty());
        assert_eq!(
            second.local_policies.as_ref().unwrap().vlan_group,
            Some(VlanGroup { vlan: 10 })
        );
    }

    #[test]
    fn test_server_policies_content_is_discarded() {
        let text = "\
Interface:  GigabitEthernet1/0/1
MAC Address:  0000.0000.0001
Status:  A
Server Policies:
    Vlan Group:  Vlan: 200
    Session timeout:  100s (server), Remaining: 5s
    Status:  bogus
Method status list:
    Method   State
    dot1x    Authc Success
";
        let mut parser = DetailParser::new(text, "GigabitEthernet1/0/1")
            .with_required_fields(RequiredFields::none());
        let sessions = parser.parse().unwrap();
        let client = &sessions.interfaces["GigabitEthernet1/0/1"].mac_address["0000.0000.0001"];

        assert_eq!(client.status.as_deref(), Some("A"));
        assert!(client.local_policies.is_none());
        assert_eq!(client.session_timeout, Some(SessionTimeout::not_applicable()));
        assert_eq!(client.method_status["dot1x"].state, "Authc Success");
    }

    #[test]
    fn test_requested_interface_is_canonicalized() {
        let mut parser = DetailParser::new(TWO_CLIENTS, "gigabitethernet 2/0/47");
        assert_eq!(parser.interface(), "GigabitEthernet2/0/47");
        assert!(parser.parse().is_ok());
    }

    #[test]
    fn test_other_interface_is_empty_result() {
        let mut parser = DetailParser::new(TWO_CLIENTS, "Gi1/0/1");
        assert!(matches!(
            parser.parse(),
            Err(ParseError::Schema(ValidationError::EmptyResult(_)))
        ));
        assert_eq!(parser.diagnostics().filtered_records, 2);
    }

    #[test]
    fn test_missing_required_key_names_the_key() {
        let text = TWO_CLIENTS.replace("               Handle:  0x91000001\n", "");
        let mut parser = DetailParser::new(&text, "GigabitEthernet2/0/47");
        assert_eq!(
            parser.parse(),
            Err(ParseError::Schema(ValidationError::MissingRequiredKey {
                path: "interfaces.GigabitEthernet2/0/47.mac_address.0005.5e7c.da05".to_string(),
                key: "handle".to_string(),
            }))
        );
    }

    #[test]
    fn test_custom_required_fields() {
        let text = TWO_CLIENTS.replace("               Handle:  0x91000001\n", "");
        let required = RequiredFields::new(["status"]).unwrap();
        let mut parser =
            DetailParser::new(&text, "GigabitEthernet2/0/47").with_required_fields(required);
        assert!(parser.parse().is_ok());
    }

    #[test]
    fn test_record_without_mac_is_dropped() {
        let text = "\
Interface:  GigabitEthernet1/0/1
   Status:  Authorized
";
        let mut parser = DetailParser::new(text, "GigabitEthernet1/0/1");
        assert!(parser.parse().unwrap_err().is_empty_result());
        assert_eq!(parser.diagnostics().dropped_records, 1);
        assert_eq!(parser.warnings().len(), 1);
    }

    #[test]
    fn test_local_policies_and_blank_separated_method_rows() {
        let text = "\
Interface:  GigabitEthernet1/12
MAC Address:  6390.c2f7.5d21
Status:  Authorized

Local Policies:
    Service Template: DEFAULT_LINKSEC_POLICY_SHOULD_SECURE (priority 150)
    Vlan Group:  Vlan: 130
    Security Status:  Link Unsecure

Server Policies:

Method status list:
    Method           State

    dot1x            Authc Success
    mab              Stopped
";
        let mut parser = DetailParser::new(text, "Gi1/12")
            .with_required_fields(RequiredFields::none());
        let sessions = parser.parse().unwrap();
        let client = &sessions.interfaces["GigabitEthernet1/12"].mac_address["6390.c2f7.5d21"];

        let policies = client.local_policies.as_ref().unwrap();
        assert_eq!(
            policies.template["DEFAULT_LINKSEC_POLICY_SHOULD_SECURE"],
            TemplatePolicy { priority: 150 }
        );
        assert_eq!(policies.vlan_group, Some(VlanGroup { vlan: 130 }));
        assert_eq!(policies.security_status.as_deref(), Some("Link Unsecure"));
        assert_eq!(client.method_status.len(), 2);
        assert_eq!(client.session_timeout, Some(SessionTimeout::not_applicable()));
        assert!(parser.diagnostics().unresolved_lines.is_empty());
    }

    #[test]
    fn test_policy_label_outside_section_is_unresolved() {
        let text = "\
Interface:  GigabitEthernet1/0/1
MAC Address:  0010.0010.0001
Security Status:  Link Unsecure
";
        let mut parser = DetailParser::new(text, "GigabitEthernet1/0/1")
            .with_required_fields(RequiredFields::none());
        let sessions = parser.parse().unwrap();
        let client = &sessions.interfaces["GigabitEthernet1/0/1"].mac_address["0010.0010.0001"];
        assert!(client.local_policies.is_none());
        assert_eq!(parser.diagnostics().unresolved_lines, vec!["Security Status:  Link Unsecure"]);
    }
}
