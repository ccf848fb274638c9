//! Core session types and shared validation primitives.
//!
//! This crate defines the data model produced when parsing
//! `show authentication sessions` output from access switches:
//!
//! - [`SummarySessions`]: the compact table form: interface → client (MAC)
//!   → session id.
//! - [`DetailSessions`]: the verbose block form: interface → MAC →
//!   [`DetailClient`] with scalar attributes, a [`SessionTimeout`],
//!   [`LocalPolicies`] and per-method [`MethodStatus`].
//!
//! Interface names are canonicalized with [`canonical_interface_name`]
//! (`Gi1/0/48` → `GigabitEthernet1/0/48`).
//!
//! Validation ([`validate_summary`], [`validate_details`]) is the schema gate
//! run after parsing; it distinguishes an empty result from a record missing a
//! required key.
//!
//! # Example
//!
//! ```
//! use auth_session_core::*;
//!
//! let mut sessions = SummarySessions::new();
//! sessions.record_row(
//!     &canonical_interface_name("Gi1/0/5"),
//!     "000f.23c4.a401",
//!     "mab",
//!     "DATA",
//!     "Authz Success",
//!     "0A3462B10000000D24F80B58",
//! );
//!
//! assert!(sessions.interface("GigabitEthernet1/0/5").is_some());
//! assert!(validate_summary(&sessions).is_ok());
//! ```

mod interface;
mod merge;
mod types;
mod validate;

pub use interface::{INTERFACE_ABBREVIATIONS, canonical_interface_name, expand_interface_type};
pub use types::*;
pub use validate::{RequiredFields, ValidationError, validate_details, validate_summary};
