//! `is*` predicates. Each checks its first argument and answers `true` or
//! `false`; a missing argument is `false`, never an error.

use super::{bool_str, first, BuiltinRegistry};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use std::net::IpAddr;
use std::sync::OnceLock;

static EMAIL: OnceLock<Regex> = OnceLock::new();
static URL: OnceLock<Regex> = OnceLock::new();
static DOMAIN: OnceLock<Regex> = OnceLock::new();
static MAC: OnceLock<Regex> = OnceLock::new();
static UUID: OnceLock<Regex> = OnceLock::new();

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("static pattern"))
}

fn is_email(s: &str) -> bool {
    pattern(&EMAIL, r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").is_match(s)
}

/// `scheme://host[...]`
fn is_url(s: &str) -> bool {
    pattern(&URL, r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^\s/?#]+(?:[/?#]\S*)?$").is_match(s)
}

fn is_domain(s: &str) -> bool {
    s.len() <= 253
        && pattern(
            &DOMAIN,
            r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)*[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$",
        )
        .is_match(&s.to_ascii_lowercase())
}

fn is_mac(s: &str) -> bool {
    // One separator throughout, colons or dashes.
    pattern(
        &MAC,
        r"^(?:[0-9a-fA-F]{2}:){5}[0-9a-fA-F]{2}$|^(?:[0-9a-fA-F]{2}-){5}[0-9a-fA-F]{2}$",
    )
    .is_match(s)
}

fn is_uuid(s: &str) -> bool {
    pattern(
        &UUID,
        r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$",
    )
    .is_match(&s.to_ascii_lowercase())
}

fn is_hex_digest(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn is_cidr(s: &str) -> bool {
    let Some((addr, prefix)) = s.split_once('/') else {
        return false;
    };
    let max = match addr.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => 32,
        Ok(IpAddr::V6(_)) => 128,
        Err(_) => return false,
    };
    prefix.parse::<u8>().is_ok_and(|p| p <= max)
}

fn non_empty_all(s: &str, pred: impl Fn(char) -> bool) -> bool {
    !s.is_empty() && s.chars().all(pred)
}

fn register_check(r: &mut BuiltinRegistry, name: &str, description: &str, check: fn(&str) -> bool) {
    r.register(name, description, &format!("{name} VALUE"), move |a: &[String]| {
        Ok(bool_str(check(first(a))))
    });
}

pub(super) fn register(r: &mut BuiltinRegistry) {
    let checks: [(&str, &str, fn(&str) -> bool); 18] = [
        ("isint", "Check for an integer", |s: &str| s.parse::<i64>().is_ok()),
        ("isfloat", "Check for a number", |s: &str| s.parse::<f64>().is_ok()),
        ("isalpha", "Check for ASCII letters only", |s: &str| {
            non_empty_all(s, |c| c.is_ascii_alphabetic())
        }),
        ("isalnum", "Check for ASCII letters and digits only", |s: &str| {
            non_empty_all(s, |c| c.is_ascii_alphanumeric())
        }),
        ("isnumeric", "Check for decimal digits only", |s: &str| {
            non_empty_all(s, |c| c.is_ascii_digit())
        }),
        ("ishex", "Check for hexadecimal digits", |s: &str| {
            non_empty_all(s.strip_prefix("0x").unwrap_or(s), |c| c.is_ascii_hexdigit())
        }),
        ("isbinary", "Check for binary digits", |s: &str| {
            non_empty_all(s, |c| matches!(c, '0' | '1'))
        }),
        ("isuuid", "Check for a UUID", is_uuid),
        ("isbase64", "Check for valid base64", |s: &str| {
            !s.is_empty() && STANDARD.decode(s).is_ok()
        }),
        ("ismd5", "Check for an MD5 hex digest", |s: &str| is_hex_digest(s, 32)),
        ("issha1", "Check for a SHA-1 hex digest", |s: &str| is_hex_digest(s, 40)),
        ("issha256", "Check for a SHA-256 hex digest", |s: &str| is_hex_digest(s, 64)),
        ("isjson", "Check for valid JSON", |s: &str| {
            serde_json::from_str::<serde_json::Value>(s).is_ok()
        }),
        ("isemail", "Check for an email address", is_email),
        ("isurl", "Check for an absolute URL", is_url),
        ("isdomain", "Check for a domain name", is_domain),
        ("ismac", "Check for a MAC address", is_mac),
        ("iscidr", "Check for CIDR notation", is_cidr),
    ];
    for (name, description, check) in checks {
        register_check(r, name, description, check);
    }
    r.register("isport", "Check for a TCP/UDP port (1-65535)", "isport VALUE", |a: &[String]| {
        Ok(bool_str(first(a).parse::<u16>().is_ok_and(|p| p > 0)))
    });
}

#[cfg(test)]
mod tests {
    use crate::builtins::{args, BuiltinRegistry};

    fn check(name: &str, value: &str) -> bool {
        let out = BuiltinRegistry::with_defaults()
            .execute(name, &args(&[value]))
            .unwrap();
        out == "true"
    }

    #[test]
    fn numbers() {
        assert!(check("isint", "-42"));
        assert!(!check("isint", "4.2"));
        assert!(check("isfloat", "4.2"));
        assert!(check("isnumeric", "0042"));
        assert!(!check("isnumeric", "-1"));
        assert!(check("ishex", "0xdeadBEEF"));
        assert!(!check("ishex", "0x"));
        assert!(check("isbinary", "0101"));
    }

    #[test]
    fn ports() {
        assert!(check("isport", "443"));
        assert!(check("isport", "65535"));
        assert!(!check("isport", "0"));
        assert!(!check("isport", "65536"));
        assert!(!check("isport", "http"));
    }

    #[test]
    fn text_classes() {
        assert!(check("isalpha", "abcXYZ"));
        assert!(!check("isalpha", "abc1"));
        assert!(!check("isalpha", ""));
        assert!(check("isalnum", "abc123"));
        assert!(!check("isalnum", "a-b"));
    }

    #[test]
    fn network_shapes() {
        assert!(check("isemail", "admin@example.com"));
        assert!(!check("isemail", "admin@localhost"));
        assert!(check("isurl", "https://example.com/a?b=c"));
        assert!(check("isurl", "ftp://10.0.0.1"));
        assert!(!check("isurl", "example.com"));
        assert!(!check("isurl", "http://"));
        assert!(check("isdomain", "Sub.Example.com"));
        assert!(!check("isdomain", "-bad.com"));
        assert!(check("ismac", "00:1A:2b:3C:4d:5E"));
        assert!(check("ismac", "00-1a-2b-3c-4d-5e"));
        assert!(!check("ismac", "00:1a-2b:3c:4d:5e"));
        assert!(check("iscidr", "10.0.0.0/8"));
        assert!(check("iscidr", "fe80::/64"));
        assert!(!check("iscidr", "10.0.0.0/33"));
        assert!(!check("iscidr", "10.0.0.0"));
    }

    #[test]
    fn encodings_and_digests() {
        assert!(check("isuuid", "550E8400-e29b-41d4-a716-446655440000"));
        assert!(!check("isuuid", "550e8400e29b41d4a716446655440000"));
        assert!(check("isbase64", "aGVsbG8="));
        assert!(!check("isbase64", "not base64!"));
        assert!(check("ismd5", "900150983cd24fb0d6963f7d28e17f72"));
        assert!(!check("ismd5", "900150983CD24FB0D6963F7D28E17F72"));
        assert!(check("issha1", &"a".repeat(40)));
        assert!(check("issha256", &"0".repeat(64)));
        assert!(check("isjson", r#"{"a": [1, 2]}"#));
        assert!(!check("isjson", "{a}"));
    }

    #[test]
    fn missing_argument_is_false() {
        let out = BuiltinRegistry::with_defaults().execute("isemail", &[]).unwrap();
        assert_eq!(out, "false");
    }
}
