//! Field validators
//!
//! Pure predicates. Callers turn a `false` into a [`FleetError::Validation`]
//! naming the field and echoing the raw value.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{FleetError, FleetResult};

/// Dotted quad, each group 0-255. Leading zeros ("012") are accepted.
static IPV4_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let octet = r"(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)";
    Regex::new(&format!(r"^{o}\.{o}\.{o}\.{o}$", o = octet)).expect("invalid IPv4 pattern")
});

/// Returns true iff `s` is a syntactically valid IPv4 address
pub fn validate_ipv4(s: &str) -> bool {
    IPV4_PATTERN.is_match(s)
}

/// Returns true iff `s` is exactly `online` or `offline`
pub fn validate_status(s: &str) -> bool {
    s == "online" || s == "offline"
}

/// Check a required IPv4 field, producing the field-specific failure
pub fn check_ip_address(value: Option<&str>) -> FleetResult<()> {
    match value {
        None => Err(FleetError::validation("ip_address", "IPv4 address required")),
        Some(v) if !validate_ipv4(v) => Err(FleetError::validation(
            "ip_address",
            format!("{} is not a valid IPv4 address!", v),
        )),
        Some(_) => Ok(()),
    }
}

/// Entities that check their own fields before being persisted
pub trait Validate {
    /// Fails with the first invalid field
    fn validate(&self) -> FleetResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_accepts_dotted_quads() {
        assert!(validate_ipv4("192.168.1.1"));
        assert!(validate_ipv4("0.0.0.0"));
        assert!(validate_ipv4("255.255.255.255"));
        assert!(validate_ipv4("10.0.0.254"));
    }

    #[test]
    fn test_ipv4_accepts_leading_zeros() {
        assert!(validate_ipv4("012.001.000.099"));
        assert!(validate_ipv4("01.1.1.1"));
    }

    #[test]
    fn test_ipv4_rejects_out_of_range() {
        assert!(!validate_ipv4("999.1.1.1"));
        assert!(!validate_ipv4("256.0.0.1"));
        assert!(!validate_ipv4("1.1.1.260"));
        assert!(!validate_ipv4("300.300.300.300"));
    }

    #[test]
    fn test_ipv4_rejects_malformed() {
        assert!(!validate_ipv4(""));
        assert!(!validate_ipv4("1.1.1"));
        assert!(!validate_ipv4("1.1.1.1.1"));
        assert!(!validate_ipv4("a.b.c.d"));
        assert!(!validate_ipv4(" 1.1.1.1"));
        assert!(!validate_ipv4("1.1.1.1 "));
        assert!(!validate_ipv4("0001.1.1.1"));
    }

    #[test]
    fn test_status() {
        assert!(validate_status("online"));
        assert!(validate_status("offline"));
        assert!(!validate_status("Online"));
        assert!(!validate_status("paused"));
        assert!(!validate_status(""));
    }

    #[test]
    fn test_check_ip_address_messages() {
        let err = check_ip_address(Some("999.1.1.1")).unwrap_err();
        assert_eq!(err.field(), Some("ip_address"));
        assert!(err.to_string().contains("999.1.1.1"));

        let err = check_ip_address(None).unwrap_err();
        assert_eq!(err.to_string(), "IPv4 address required");

        assert!(check_ip_address(Some("10.0.0.1")).is_ok());
    }
}
