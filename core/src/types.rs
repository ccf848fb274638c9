//! Session model definitions.
//!
//! This module defines the data model produced by the session parsers. The
//! types serialize with [`serde`] into the nested mapping consumers query:
//! `interfaces → interface → client/MAC → attributes`. Maps are ordered
//! ([`BTreeMap`]) so repeated parses of the same text render identically.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Value reported by devices when a timer or attribute does not apply.
pub const NOT_APPLICABLE: &str = "N/A";

/// Which `show authentication sessions` layout a collection came from.
///
/// # Examples
///
/// ```
/// use auth_session_core::SessionForm;
///
/// assert_eq!(SessionForm::Details.label(), "details");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionForm {
    /// Compact one-row-per-session table.
    Summary,
    /// Verbose key/value blocks, one per client.
    Details,
}

impl SessionForm {
    /// Returns the lowercase label used in reports and file names.
    pub fn label(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Details => "details",
        }
    }
}

impl std::fmt::Display for SessionForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Root of a parsed session table: interface name → interface record.
///
/// The record type differs between the summary and detail layouts; use the
/// [`SummarySessions`] and [`DetailSessions`] aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCollection<T> {
    pub interfaces: BTreeMap<String, T>,
}

impl<T> Default for SessionCollection<T> {
    fn default() -> Self {
        Self {
            interfaces: BTreeMap::new(),
        }
    }
}

impl<T> SessionCollection<T> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when no interface has been recorded.
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Number of interfaces in the collection.
    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    /// Looks up an interface by its canonical name.
    pub fn interface(&self, name: &str) -> Option<&T> {
        self.interfaces.get(name)
    }
}

/// Summary-form collection.
pub type SummarySessions = SessionCollection<SummaryInterface>;

/// Detail-form collection.
pub type DetailSessions = SessionCollection<DetailInterface>;

impl SummarySessions {
    /// Total number of clients across all interfaces.
    pub fn client_count(&self) -> usize {
        self.interfaces.values().map(|intf| intf.client.len()).sum()
    }
}

impl DetailSessions {
    /// Total number of clients across all interfaces.
    pub fn client_count(&self) -> usize {
        self.interfaces
            .values()
            .map(|intf| intf.mac_address.len())
            .sum()
    }
}

/// One interface row group from the summary table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryInterface {
    /// Canonical interface name (repeats the map key).
    pub interface: String,
    /// Clients keyed by MAC address.
    pub client: BTreeMap<String, SummaryClient>,
}

impl SummaryInterface {
    pub fn new(interface: &str) -> Self {
        Self {
            interface: interface.to_string(),
            client: BTreeMap::new(),
        }
    }
}

/// One client from the summary table.
///
/// # Examples
///
/// ```
/// use auth_session_core::SummaryClient;
///
/// let mut client = SummaryClient::new("0015.63b0.f676");
/// client.method = "dot1x".into();
/// client.add_session("0A3462B1000000102983C05C");
/// assert!(client.session.contains_key("0A3462B1000000102983C05C"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryClient {
    /// MAC address (repeats the map key).
    pub client: String,
    /// Authentication method, e.g. `dot1x` or `mab`.
    pub method: String,
    /// Traffic domain, e.g. `DATA`, `VOICE`, `UNKNOWN`.
    pub domain: String,
    /// Free-text status phrase, e.g. `Authz Success`.
    pub status: String,
    /// Sessions keyed by session id.
    pub session: BTreeMap<String, SessionEntry>,
}

impl SummaryClient {
    pub fn new(mac: &str) -> Self {
        Self {
            client: mac.to_string(),
            ..Self::default()
        }
    }

    /// Get-or-create a session entry for `session_id`.
    pub fn add_session(&mut self, session_id: &str) -> &mut SessionEntry {
        self.session
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                session_id: session_id.to_string(),
            })
    }
}

/// A session reference from the summary table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub session_id: String,
}

/// Clients found on one interface in the detail layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailInterface {
    /// Detail records keyed by MAC address.
    pub mac_address: BTreeMap<String, DetailClient>,
}

/// Scalar attributes of a detail record.
///
/// Each variant maps to one string-valued key of [`DetailClient`]; the
/// detail parser's label table resolves device labels to these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    IifId,
    Ipv4Address,
    Ipv6Address,
    UserName,
    Status,
    Domain,
    OperHostMode,
    OperControlDir,
    CommonSessionId,
    AcctSessionId,
    Handle,
    CurrentPolicy,
    AuthorizedBy,
    VlanPolicy,
    IdleTimeout,
    TimeoutAction,
    RestartTimeout,
    PeriodicAcctTimeout,
    SessionUptime,
}

impl ScalarField {
    /// Every scalar field, in serialization order.
    pub const ALL: [ScalarField; 19] = [
        Self::IifId,
        Self::Ipv4Address,
        Self::Ipv6Address,
        Self::UserName,
        Self::Status,
        Self::Domain,
        Self::OperHostMode,
        Self::OperControlDir,
        Self::CommonSessionId,
        Self::AcctSessionId,
        Self::Handle,
        Self::CurrentPolicy,
        Self::AuthorizedBy,
        Self::VlanPolicy,
        Self::IdleTimeout,
        Self::TimeoutAction,
        Self::RestartTimeout,
        Self::PeriodicAcctTimeout,
        Self::SessionUptime,
    ];

    /// Returns the model key for this field (e.g. `"oper_host_mode"`).
    pub fn key(self) -> &'static str {
        match self {
            Self::IifId => "iif_id",
            Self::Ipv4Address => "ipv4_address",
            Self::Ipv6Address => "ipv6_address",
            Self::UserName => "user_name",
            Self::Status => "status",
            Self::Domain => "domain",
            Self::OperHostMode => "oper_host_mode",
            Self::OperControlDir => "oper_control_dir",
            Self::CommonSessionId => "common_session_id",
            Self::AcctSessionId => "acct_session_id",
            Self::Handle => "handle",
            Self::CurrentPolicy => "current_policy",
            Self::AuthorizedBy => "authorized_by",
            Self::VlanPolicy => "vlan_policy",
            Self::IdleTimeout => "idle_timeout",
            Self::TimeoutAction => "timeout_action",
            Self::RestartTimeout => "restart_timeout",
            Self::PeriodicAcctTimeout => "periodic_acct_timeout",
            Self::SessionUptime => "session_uptime",
        }
    }

    /// Resolves a model key back to its field.
    ///
    /// # Examples
    ///
    /// ```
    /// use auth_session_core::ScalarField;
    ///
    /// assert_eq!(ScalarField::from_key("handle"), Some(ScalarField::Handle));
    /// assert_eq!(ScalarField::from_key("session_timeout"), None);
    /// ```
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

/// One client block from the detail layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailClient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iif_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oper_host_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oper_control_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acct_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized_by: Option<String>,
    /// Kept as device text even when numeric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodic_acct_timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_uptime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_timeout: Option<SessionTimeout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_policies: Option<LocalPolicies>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub method_status: BTreeMap<String, MethodStatus>,
}

impl DetailClient {
    fn slot_mut(&mut self, field: ScalarField) -> &mut Option<String> {
        match field {
            ScalarField::IifId => &mut self.iif_id,
            ScalarField::Ipv4Address => &mut self.ipv4_address,
            ScalarField::Ipv6Address => &mut self.ipv6_address,
            ScalarField::UserName => &mut self.user_name,
            ScalarField::Status => &mut self.status,
            ScalarField::Domain => &mut self.domain,
            ScalarField::OperHostMode => &mut self.oper_host_mode,
            ScalarField::OperControlDir => &mut self.oper_control_dir,
            ScalarField::CommonSessionId => &mut self.common_session_id,
            ScalarField::AcctSessionId => &mut self.acct_session_id,
            ScalarField::Handle => &mut self.handle,
            ScalarField::CurrentPolicy => &mut self.current_policy,
            ScalarField::AuthorizedBy => &mut self.authorized_by,
            ScalarField::VlanPolicy => &mut self.vlan_policy,
            ScalarField::IdleTimeout => &mut self.idle_timeout,
            ScalarField::TimeoutAction => &mut self.timeout_action,
            ScalarField::RestartTimeout => &mut self.restart_timeout,
            ScalarField::PeriodicAcctTimeout => &mut self.periodic_acct_timeout,
            ScalarField::SessionUptime => &mut self.session_uptime,
        }
    }

    /// Sets a scalar attribute, replacing any previous value.
    ///
    /// # Examples
    ///
    /// ```
    /// use auth_session_core::{DetailClient, ScalarField};
    ///
    /// let mut client = DetailClient::default();
    /// client.set(ScalarField::Status, "Authorized");
    /// assert_eq!(client.get(ScalarField::Status), Some("Authorized"));
    /// ```
    pub fn set(&mut self, field: ScalarField, value: &str) {
        *self.slot_mut(field) = Some(value.to_string());
    }

    /// Returns a scalar attribute.
    pub fn get(&self, field: ScalarField) -> Option<&str> {
        let slot = match field {
            ScalarField::IifId => &self.iif_id,
            ScalarField::Ipv4Address => &self.ipv4_address,
            ScalarField::Ipv6Address => &self.ipv6_address,
            ScalarField::UserName => &self.user_name,
            ScalarField::Status => &self.status,
            ScalarField::Domain => &self.domain,
            ScalarField::OperHostMode => &self.oper_host_mode,
            ScalarField::OperControlDir => &self.oper_control_dir,
            ScalarField::CommonSessionId => &self.common_session_id,
            ScalarField::AcctSessionId => &self.acct_session_id,
            ScalarField::Handle => &self.handle,
            ScalarField::CurrentPolicy => &self.current_policy,
            ScalarField::AuthorizedBy => &self.authorized_by,
            ScalarField::VlanPolicy => &self.vlan_policy,
            ScalarField::IdleTimeout => &self.idle_timeout,
            ScalarField::TimeoutAction => &self.timeout_action,
            ScalarField::RestartTimeout => &self.restart_timeout,
            ScalarField::PeriodicAcctTimeout => &self.periodic_acct_timeout,
            ScalarField::SessionUptime => &self.session_uptime,
        };
        slot.as_deref()
    }

    /// Returns `true` if the record carries the attribute named by `key`.
    ///
    /// Accepts scalar keys plus `session_timeout`, `local_policies` and
    /// `method_status`.
    pub fn has_key(&self, key: &str) -> bool {
        match key {
            "session_timeout" => self.session_timeout.is_some(),
            "local_policies" => self.local_policies.is_some(),
            "method_status" => !self.method_status.is_empty(),
            other => ScalarField::from_key(other)
                .and_then(|field| self.get(field))
                .is_some_and(|value| !value.is_empty()),
        }
    }

    /// Get-or-create the local policy tree.
    pub fn local_policies_mut(&mut self) -> &mut LocalPolicies {
        self.local_policies.get_or_insert_with(LocalPolicies::default)
    }

    /// Records the state of one authentication method (last value wins).
    pub fn set_method_state(&mut self, method: &str, state: &str) {
        self.method_status.insert(
            method.to_string(),
            MethodStatus {
                method: method.to_string(),
                state: state.to_string(),
            },
        );
    }
}

/// Session timer as reported by the device.
///
/// Either `{type: "N/A"}` or a countdown such as
/// `{type: "local", timeout: "43200s", remaining: "31799s"}`.
///
/// # Examples
///
/// ```
/// use auth_session_core::SessionTimeout;
///
/// let timer = SessionTimeout::countdown("local", "43200s", "31799s");
/// assert!(timer.is_countdown());
/// assert!(!SessionTimeout::not_applicable().is_countdown());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTimeout {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<String>,
}

impl SessionTimeout {
    pub fn not_applicable() -> Self {
        Self {
            kind: NOT_APPLICABLE.to_string(),
            timeout: None,
            remaining: None,
        }
    }

    pub fn countdown(kind: &str, timeout: &str, remaining: &str) -> Self {
        Self {
            kind: kind.to_string(),
            timeout: Some(timeout.to_string()),
            remaining: Some(remaining.to_string()),
        }
    }

    pub fn is_countdown(&self) -> bool {
        self.timeout.is_some()
    }
}

impl Default for SessionTimeout {
    fn default() -> Self {
        Self::not_applicable()
    }
}

/// Authorization artifacts listed under `Local Policies:`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalPolicies {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub template: BTreeMap<String, TemplatePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_group: Option<VlanGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_status: Option<String>,
}

/// A service template applied to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePolicy {
    pub priority: u32,
}

/// VLAN assigned through a VLAN group policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanGroup {
    pub vlan: u32,
}

/// State of one authentication method for a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodStatus {
    pub method: String,
    pub state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_client_skips_absent_fields_when_serialized() {
        let mut client = DetailClient::default();
        client.set(ScalarField::Status, "Authorized");
        client.session_timeout = Some(SessionTimeout::not_applicable());

        let value = serde_json::to_value(&client).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "status": "Authorized",
                "session_timeout": {"type": "N/A"},
            })
        );
    }

    #[test]
    fn test_scalar_field_keys_round_trip() {
        for field in ScalarField::ALL {
            assert_eq!(ScalarField::from_key(field.key()), Some(field));
        }
    }

    #[test]
    fn test_has_key_ignores_empty_scalar() {
        let mut client = DetailClient::default();
        client.set(ScalarField::Handle, "");
        assert!(!client.has_key("handle"));
        client.set(ScalarField::Handle, "0xDB003227");
        assert!(client.has_key("handle"));
        assert!(!client.has_key("method_status"));
    }

    #[test]
    fn test_session_collection_serializes_under_interfaces_key() {
        let mut sessions = SummarySessions::new();
        sessions.interfaces.insert(
            "GigabitEthernet1/0/5".to_string(),
            SummaryInterface::new("GigabitEthernet1/0/5"),
        );
        let value = serde_json::to_value(&sessions).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "interfaces": {
                    "GigabitEthernet1/0/5": {
                        "interface": "GigabitEthernet1/0/5",
                        "client": {}
                    }
                }
            })
        );
    }
}
