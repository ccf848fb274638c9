//! Schema gate for parsed session collections.
//!
//! Runs after a parse pass completes. An empty collection is rejected with
//! [`ValidationError::EmptyResult`]; a detail record missing a mandatory
//! attribute is rejected with [`ValidationError::MissingRequiredKey`] naming
//! the key and the record path.
//!
//! # Examples
//!
//! ```
//! use auth_session_core::*;
//!
//! let empty = SummarySessions::new();
//! assert!(matches!(
//!     validate_summary(&empty),
//!     Err(ValidationError::EmptyResult(_))
//! ));
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DetailSessions, ScalarField, SummarySessions};

/// Gate failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No data rows or records were produced.
    #[error("parser output is empty: {0}")]
    EmptyResult(String),
    /// A committed record lacks a mandatory attribute.
    #[error("missing required key '{key}' at {path}")]
    MissingRequiredKey { path: String, key: String },
    /// A required-field list names an attribute the model does not have.
    #[error("unknown session attribute: {0}")]
    UnknownField(String),
}

/// Keys that every detail record must carry besides its scalar fields.
const NESTED_KEYS: [&str; 3] = ["session_timeout", "local_policies", "method_status"];

/// Attributes each detail record must carry to pass the gate.
///
/// # Examples
///
/// ```
/// use auth_session_core::RequiredFields;
///
/// let fields = RequiredFields::new(["status", "handle"]).unwrap();
/// assert!(fields.contains("handle"));
/// assert!(RequiredFields::new(["colour"]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct RequiredFields {
    keys: Vec<String>,
}

impl RequiredFields {
    /// Builds a required-field list, rejecting unknown attribute names.
    pub fn new<I, S>(keys: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for key in keys {
            let key = key.as_ref().trim();
            if ScalarField::from_key(key).is_none() && !NESTED_KEYS.contains(&key) {
                return Err(ValidationError::UnknownField(key.to_string()));
            }
            if seen.insert(key.to_string()) {
                out.push(key.to_string());
            }
        }
        Ok(Self { keys: out })
    }

    /// A list that requires nothing.
    pub fn none() -> Self {
        Self { keys: Vec::new() }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

impl Default for RequiredFields {
    fn default() -> Self {
        Self {
            keys: [
                "status",
                "domain",
                "oper_host_mode",
                "oper_control_dir",
                "common_session_id",
                "acct_session_id",
                "handle",
                "session_timeout",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl TryFrom<Vec<String>> for RequiredFields {
    type Error = ValidationError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RequiredFields> for Vec<String> {
    fn from(value: RequiredFields) -> Self {
        value.keys
    }
}

/// Validates a summary-form collection.
///
/// Every client must carry a method, domain, status and at least one
/// session.
pub fn validate_summary(sessions: &SummarySessions) -> Result<(), ValidationError> {
    if sessions.is_empty() {
        return Err(ValidationError::EmptyResult(
            "no session rows found".to_string(),
        ));
    }

    for (name, intf) in &sessions.interfaces {
        if intf.client.is_empty() {
            return Err(ValidationError::MissingRequiredKey {
                path: format!("interfaces.{name}"),
                key: "client".to_string(),
            });
        }
        for (mac, client) in &intf.client {
            let path = format!("interfaces.{name}.client.{mac}");
            let checks = [
                ("method", client.method.is_empty()),
                ("domain", client.domain.is_empty()),
                ("status", client.status.is_empty()),
                ("session", client.session.is_empty()),
            ];
            if let Some((key, _)) = checks.iter().find(|(_, missing)| *missing) {
                return Err(ValidationError::MissingRequiredKey {
                    path,
                    key: key.to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Validates a detail-form collection against `required`.
pub fn validate_details(
    sessions: &DetailSessions,
    required: &RequiredFields,
) -> Result<(), ValidationError> {
    if sessions.is_empty() {
        return Err(ValidationError::EmptyResult(
            "no session records found".to_string(),
        ));
    }

    for (name, intf) in &sessions.interfaces {
        if intf.mac_address.is_empty() {
            return Err(ValidationError::MissingRequiredKey {
                path: format!("interfaces.{name}"),
                key: "mac_address".to_string(),
            });
        }
        for (mac, client) in &intf.mac_address {
            if let Some(key) = required.iter().find(|key| !client.has_key(key)) {
                return Err(ValidationError::MissingRequiredKey {
                    path: format!("interfaces.{name}.mac_address.{mac}"),
                    key: key.to_string(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{DetailClient, SessionTimeout};

    use super::*;

    fn complete_client() -> DetailClient {
        let mut client = DetailClient::default();
        for key in RequiredFields::default().iter() {
            if let Some(field) = ScalarField::from_key(key) {
                client.set(field, "x");
            }
        }
        client.session_timeout = Some(SessionTimeout::not_applicable());
        client
    }

    #[test]
    fn test_validate_details_rejects_empty_collection() {
        let sessions = DetailSessions::new();
        assert!(matches!(
            validate_details(&sessions, &RequiredFields::default()),
            Err(ValidationError::EmptyResult(_))
        ));
    }

    #[test]
    fn test_validate_details_names_missing_key() {
        let mut client = complete_client();
        client.handle = None;
        let mut sessions = DetailSessions::new();
        sessions.merge_client("GigabitEthernet1/0/1", "0010.0010.0001", client);

        let err = validate_details(&sessions, &RequiredFields::default()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingRequiredKey {
                path: "interfaces.GigabitEthernet1/0/1.mac_address.0010.0010.0001".to_string(),
                key: "handle".to_string(),
            }
        );
    }

    #[test]
    fn test_validate_details_accepts_complete_record() {
        let mut sessions = DetailSessions::new();
        sessions.merge_client("GigabitEthernet1/0/1", "0010.0010.0001", complete_client());
        assert_eq!(validate_details(&sessions, &RequiredFields::default()), Ok(()));
        assert_eq!(validate_details(&sessions, &RequiredFields::none()), Ok(()));
    }

    #[test]
    fn test_validate_summary_requires_session() {
        let mut sessions = SummarySessions::new();
        sessions.record_row("Gi1", "0000.0000.0001", "mab", "DATA", "Auth", "A1");
        assert_eq!(validate_summary(&sessions), Ok(()));

        sessions
            .interfaces
            .get_mut("Gi1")
            .unwrap()
            .client
            .get_mut("0000.0000.0001")
            .unwrap()
            .session
            .clear();
        assert!(matches!(
            validate_summary(&sessions),
            Err(ValidationError::MissingRequiredKey { ref key, .. }) if key == "session"
        ));
    }

    #[test]
    fn test_required_fields_reject_unknown_and_dedupe() {
        assert_eq!(
            RequiredFields::new(["status", "bogus"]),
            Err(ValidationError::UnknownField("bogus".to_string()))
        );
        let fields = RequiredFields::new(["status", "status", "method_status"]).unwrap();
        assert_eq!(fields.iter().count(), 2);
    }

    #[test]
    fn test_required_fields_deserialize_from_list() {
        let fields: RequiredFields = serde_json::from_str(r#"["handle", "domain"]"#).unwrap();
        assert!(fields.contains("domain"));
        assert!(serde_json::from_str::<RequiredFields>(r#"["nope"]"#).is_err());
    }
}
