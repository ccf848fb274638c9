//! Label table for the detail layout.
//!
//! Each `Label:  value` line is resolved through a fixed table of
//! normalized label → target pairs. Matching ignores case and collapses
//! runs of whitespace, so `Oper  host mode:` and `oper host mode:` resolve
//! to the same attribute.

use auth_session_core::ScalarField;

/// What a recognized label writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelTarget {
    /// Opens a new client record.
    Interface,
    /// Keys the open client record.
    MacAddress,
    Scalar(ScalarField),
    SessionTimeout,
    Template,
    VlanGroup,
    SecurityPolicy,
    SecurityStatus,
}

impl LabelTarget {
    /// Policy labels are only meaningful inside `Local Policies:`.
    pub fn is_policy(self) -> bool {
        matches!(
            self,
            Self::Template | Self::VlanGroup | Self::SecurityPolicy | Self::SecurityStatus
        )
    }

    /// Structural labels must carry a colon to be recognized.
    fn requires_colon(self) -> bool {
        matches!(self, Self::Interface | Self::MacAddress)
    }
}

/// Sub-sections of a detail record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    LocalPolicies,
    ServerPolicies,
    MethodList,
}

/// Normalized labels in priority order. Longer labels sharing a prefix with
/// a shorter one come first.
pub const LABELS: &[(&str, LabelTarget)] = &[
    ("interface", LabelTarget::Interface),
    ("mac address", LabelTarget::MacAddress),
    ("iif-id", LabelTarget::Scalar(ScalarField::IifId)),
    ("iif id", LabelTarget::Scalar(ScalarField::IifId)),
    ("ipv6 address", LabelTarget::Scalar(ScalarField::Ipv6Address)),
    ("ipv4 address", LabelTarget::Scalar(ScalarField::Ipv4Address)),
    ("ip address", LabelTarget::Scalar(ScalarField::Ipv4Address)),
    ("user-name", LabelTarget::Scalar(ScalarField::UserName)),
    ("user name", LabelTarget::Scalar(ScalarField::UserName)),
    ("status", LabelTarget::Scalar(ScalarField::Status)),
    ("domain", LabelTarget::Scalar(ScalarField::Domain)),
    ("oper host mode", LabelTarget::Scalar(ScalarField::OperHostMode)),
    ("oper control dir", LabelTarget::Scalar(ScalarField::OperControlDir)),
    ("session timeout", LabelTarget::SessionTimeout),
    ("idle timeout", LabelTarget::Scalar(ScalarField::IdleTimeout)),
    ("timeout action", LabelTarget::Scalar(ScalarField::TimeoutAction)),
    ("restart timeout", LabelTarget::Scalar(ScalarField::RestartTimeout)),
    (
        "periodic acct timeout",
        LabelTarget::Scalar(ScalarField::PeriodicAcctTimeout),
    ),
    ("session uptime", LabelTarget::Scalar(ScalarField::SessionUptime)),
    ("common session id", LabelTarget::Scalar(ScalarField::CommonSessionId)),
    ("acct session id", LabelTarget::Scalar(ScalarField::AcctSessionId)),
    ("handle", LabelTarget::Scalar(ScalarField::Handle)),
    ("current policy", LabelTarget::Scalar(ScalarField::CurrentPolicy)),
    ("authorized by", LabelTarget::Scalar(ScalarField::AuthorizedBy)),
    ("vlan policy", LabelTarget::Scalar(ScalarField::VlanPolicy)),
    ("service template", LabelTarget::Template),
    ("template", LabelTarget::Template),
    ("vlan group", LabelTarget::VlanGroup),
    ("security policy", LabelTarget::SecurityPolicy),
    ("security status", LabelTarget::SecurityStatus),
];

/// Section headers, matched against the whole line.
pub const SECTIONS: &[(&str, Section)] = &[
    ("local policies", Section::LocalPolicies),
    ("server policies", Section::ServerPolicies),
    ("method status list", Section::MethodList),
    ("runnable methods list", Section::MethodList),
];

/// Lowercases and collapses whitespace runs to single spaces.
pub fn normalize_label(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

fn lookup(label: &str) -> Option<LabelTarget> {
    LABELS
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, target)| *target)
}

/// Resolves a `Label: value` line to its target and trimmed value.
///
/// Attribute labels also match without a colon (`Handle  0x25000000`) as
/// long as a value follows.
pub fn match_label(line: &str) -> Option<(LabelTarget, String)> {
    let trimmed = line.trim();

    if let Some((left, right)) = trimmed.split_once(':') {
        if let Some(target) = lookup(&normalize_label(left)) {
            return Some((target, right.trim().to_string()));
        }
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    let lower = collapsed.to_ascii_lowercase();
    LABELS
        .iter()
        .filter(|(_, target)| !target.requires_colon())
        .find_map(|(key, target)| {
            let rest = lower.strip_prefix(key)?;
            if !rest.starts_with(' ') {
                return None;
            }
            let value = collapsed[key.len()..].trim();
            (!value.is_empty() && !value.contains(':')).then(|| (*target, value.to_string()))
        })
}

/// Resolves a section header line such as `Method status list:`.
pub fn match_section(line: &str) -> Option<Section> {
    let trimmed = line.trim();
    let head = trimmed.strip_suffix(':').unwrap_or(trimmed);
    let label = normalize_label(head);
    SECTIONS
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, section)| *section)
}
