//! Get-or-create merging for partially built session records.
//!
//! Parsers never overwrite a record wholesale. When a key is seen again the
//! existing record is fetched (or created) and the new values are folded in:
//! scalars from the newer record win, nested maps accumulate.
//!
//! # Example
//!
//! ```
//! use auth_session_core::*;
//!
//! let mut sessions = DetailSessions::new();
//!
//! let mut first = DetailClient::default();
//! first.set(ScalarField::Status, "Running");
//! first.set_method_state("dot1x", "Running");
//! sessions.merge_client("GigabitEthernet1/0/1", "0010.0010.0001", first);
//!
//! let mut second = DetailClient::default();
//! second.set(ScalarField::Status, "Authorized");
//! second.set_method_state("mab", "Stopped");
//! sessions.merge_client("GigabitEthernet1/0/1", "0010.0010.0001", second);
//!
//! let client = &sessions.interfaces["GigabitEthernet1/0/1"].mac_address["0010.0010.0001"];
//! assert_eq!(client.status.as_deref(), Some("Authorized"));
//! assert_eq!(client.method_status.len(), 2);
//! ```

use crate::{
    DetailClient, DetailInterface, DetailSessions, LocalPolicies, ScalarField, SummaryClient,
    SummaryInterface, SummarySessions,
};

impl SummarySessions {
    /// Get-or-create the interface record for `interface`.
    pub fn interface_entry(&mut self, interface: &str) -> &mut SummaryInterface {
        self.interfaces
            .entry(interface.to_string())
            .or_insert_with(|| SummaryInterface::new(interface))
    }

    /// Records one summary row, creating each level of the
    /// `interface → client → session` path as needed.
    ///
    /// Client scalars take the row's values; sessions accumulate.
    pub fn record_row(
        &mut self,
        interface: &str,
        mac: &str,
        method: &str,
        domain: &str,
        status: &str,
        session_id: &str,
    ) -> &mut SummaryClient {
        let client = self
            .interface_entry(interface)
            .client
            .entry(mac.to_string())
            .or_insert_with(|| SummaryClient::new(mac));
        client.method = method.to_string();
        client.domain = domain.to_string();
        client.status = status.to_string();
        client.add_session(session_id);
        client
    }
}

impl DetailSessions {
    /// Get-or-create the interface record for `interface`.
    pub fn interface_entry(&mut self, interface: &str) -> &mut DetailInterface {
        self.interfaces.entry(interface.to_string()).or_default()
    }

    /// Folds a finished client record into the collection under
    /// `interface` / `mac`.
    pub fn merge_client(&mut self, interface: &str, mac: &str, client: DetailClient) {
        let slot = self
            .interface_entry(interface)
            .mac_address
            .entry(mac.to_string())
            .or_default();
        slot.merge_from(client);
    }
}

impl DetailClient {
    /// Merges `overlay` into `self`; values present in `overlay` win.
    pub fn merge_from(&mut self, overlay: DetailClient) {
        for field in ScalarField::ALL {
            if let Some(value) = overlay.get(field) {
                self.set(field, value);
            }
        }

        if overlay.session_timeout.is_some() {
            self.session_timeout = overlay.session_timeout;
        }

        if let Some(policies) = overlay.local_policies {
            self.local_policies_mut().merge_from(policies);
        }

        self.method_status.extend(overlay.method_status);
    }
}

impl LocalPolicies {
    /// Merges `overlay` into `self`; templates accumulate, other values
    /// present in `overlay` win.
    pub fn merge_from(&mut self, overlay: LocalPolicies) {
        self.template.extend(overlay.template);
        if overlay.vlan_group.is_some() {
            self.vlan_group = overlay.vlan_group;
        }
        if overlay.security_policy.is_some() {
            self.security_policy = overlay.security_policy;
        }
        if overlay.security_status.is_some() {
            self.security_status = overlay.security_status;
        }
    }
}
