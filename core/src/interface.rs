//! Interface name canonicalization.
//!
//! Devices print interface names in several spellings: `Gi1/0/48` in the
//! summary table, `gigabitEthernet 1/12` in typed commands and
//! `GigabitEthernet1/0/48` in detail blocks. Output keys always use the
//! canonical long form.

/// Canonical interface type names and the short forms that expand to them.
///
/// Short forms are matched case-insensitively and take precedence over
/// unique-prefix matching.
pub const INTERFACE_ABBREVIATIONS: &[(&str, &[&str])] = &[
    ("GigabitEthernet", &["gi", "gig", "ge"]),
    ("TenGigabitEthernet", &["te", "ten", "tengig"]),
    ("TwoGigabitEthernet", &["tw", "twog"]),
    ("FiveGigabitEthernet", &["fi", "fiveg"]),
    ("TwentyFiveGigE", &["twe", "twentyfivegigabitethernet"]),
    ("FortyGigabitEthernet", &["fo", "fortygige"]),
    ("HundredGigE", &["hu", "hundredgigabitethernet"]),
    ("AppGigabitEthernet", &["ap"]),
    ("FastEthernet", &["fa"]),
    ("Ethernet", &["eth", "et"]),
    ("Port-channel", &["po"]),
    ("Vlan", &["vl"]),
    ("Loopback", &["lo"]),
    ("Tunnel", &["tu"]),
    ("Serial", &["se"]),
];

/// Expands an interface name to its canonical long form.
///
/// Whitespace between the type and the port number is dropped. Names whose
/// type prefix is not recognized are returned trimmed but otherwise
/// unchanged.
///
/// # Examples
///
/// ```
/// use auth_session_core::canonical_interface_name;
///
/// assert_eq!(canonical_interface_name("Gi1/0/48"), "GigabitEthernet1/0/48");
/// assert_eq!(canonical_interface_name("gigabitEthernet 1/12"), "GigabitEthernet1/12");
/// assert_eq!(canonical_interface_name("Wlan-GigE0"), "Wlan-GigE0");
/// ```
pub fn canonical_interface_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(split) = trimmed.find(|ch: char| ch.is_ascii_digit()) else {
        return trimmed.to_string();
    };
    let (prefix, port) = trimmed.split_at(split);
    let prefix = prefix.trim_end();
    if prefix.is_empty() {
        return trimmed.to_string();
    }

    match expand_interface_type(prefix) {
        Some(full) => {
            let port: String = port.chars().filter(|ch| !ch.is_whitespace()).collect();
            format!("{full}{port}")
        }
        None => trimmed.to_string(),
    }
}

/// Resolves an interface type prefix (`Gi`, `gigabitethernet`, `Ten`) to its
/// canonical spelling.
pub fn expand_interface_type(prefix: &str) -> Option<&'static str> {
    let lower = prefix.to_ascii_lowercase();

    if let Some((full, _)) = INTERFACE_ABBREVIATIONS
        .iter()
        .find(|(full, _)| full.eq_ignore_ascii_case(&lower))
    {
        return Some(*full);
    }

    if let Some((full, _)) = INTERFACE_ABBREVIATIONS
        .iter()
        .find(|(_, short)| short.contains(&lower.as_str()))
    {
        return Some(*full);
    }

    if lower.len() < 2 {
        return None;
    }
    let mut candidates = INTERFACE_ABBREVIATIONS
        .iter()
        .filter(|(full, _)| full.to_ascii_lowercase().starts_with(&lower));
    match (candidates.next(), candidates.next()) {
        (Some((full, _)), None) => Some(*full),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expands_common_short_forms() {
        assert_eq!(canonical_interface_name("Gi1/0/48"), "GigabitEthernet1/0/48");
        assert_eq!(canonical_interface_name("Gi1/7/35"), "GigabitEthernet1/7/35");
        assert_eq!(canonical_interface_name("Te1/1/1"), "TenGigabitEthernet1/1/1");
        assert_eq!(canonical_interface_name("Fa0/1"), "FastEthernet0/1");
        assert_eq!(canonical_interface_name("Po10"), "Port-channel10");
        assert_eq!(canonical_interface_name("Tw2/0/3"), "TwoGigabitEthernet2/0/3");
        assert_eq!(canonical_interface_name("Twe1/0/1"), "TwentyFiveGigE1/0/1");
    }

    #[test]
    fn test_normalizes_case_and_spacing_of_long_forms() {
        assert_eq!(
            canonical_interface_name("gigabitethernet2/0/47"),
            "GigabitEthernet2/0/47"
        );
        assert_eq!(
            canonical_interface_name("  gigabitEthernet 1/12 "),
            "GigabitEthernet1/12"
        );
        assert_eq!(
            canonical_interface_name("GigabitEthernet3/0/2"),
            "GigabitEthernet3/0/2"
        );
    }

    #[test]
    fn test_unique_prefix_expands() {
        assert_eq!(canonical_interface_name("Gigabit1/0/1"), "GigabitEthernet1/0/1");
        assert_eq!(canonical_interface_name("Hundred1/0/49"), "HundredGigE1/0/49");
    }

    #[test]
    fn test_unknown_prefix_passes_through() {
        assert_eq!(canonical_interface_name("Xy1/0/1"), "Xy1/0/1");
        assert_eq!(canonical_interface_name("Null0"), "Null0");
        assert_eq!(canonical_interface_name("mgmt"), "mgmt");
        // "T" alone is ambiguous
        assert_eq!(canonical_interface_name("T1/0/1"), "T1/0/1");
    }
}
