//! Range specifications for `for` loops.
//!
//! ```text
//! 1..10                     numeric, inclusive (10..1 counts down)
//! a..z                      single characters
//! 192.168.1.1..192.168.2.5  full IPv4 addresses, carry across octets
//! 192.168.1.1..50           last octet only
//! admin|root|guest          explicit list
//! a..z+0..9                 chain, each part exhausted in turn
//! ```

mod iter;

pub use iter::{BoxedRange, ChainIter, ListIter, RangeIter, SteppedRange};

use crate::error::{ShellError, ShellResult};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Parse a full range specification into an iterator.
pub fn parse_range_source(spec: &str) -> ShellResult<BoxedRange> {
    let spec = spec.trim();

    if spec.contains('|') {
        let items = spec
            .split('|')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string);
        return Ok(Box::new(ListIter::new(items)));
    }

    if spec.contains('+') {
        let parts = spec
            .split('+')
            .map(parse_single_range)
            .collect::<ShellResult<Vec<_>>>()?;
        return Ok(Box::new(ChainIter::new(parts)));
    }

    parse_single_range(spec)
}

/// Parse one `start..end` range.
pub fn parse_single_range(spec: &str) -> ShellResult<BoxedRange> {
    let spec = spec.trim();
    let fail = |message: &str| ShellError::Range {
        spec: spec.to_string(),
        message: message.to_string(),
    };

    let (start, end) = spec
        .split_once("..")
        .map(|(s, e)| (s.trim(), e.trim()))
        .ok_or_else(|| fail("expected START..END"))?;
    if start.is_empty() || end.is_empty() {
        return Err(fail("both ends of the range are required"));
    }

    if start.parse::<Ipv6Addr>().is_ok() || end.parse::<Ipv6Addr>().is_ok() {
        return Err(fail("IPv6 ranges are not supported"));
    }

    if let Ok(start_ip) = start.parse::<Ipv4Addr>() {
        if let Ok(end_ip) = end.parse::<Ipv4Addr>() {
            return Ok(Box::new(SteppedRange::ipv4(start_ip, end_ip)));
        }
        let end_octet: u8 = end
            .parse()
            .map_err(|_| fail("end must be an IPv4 address or a last octet (0-255)"))?;
        let (prefix, start_octet) = match start.rfind('.') {
            Some(dot) => (&start[..=dot], start_ip.octets()[3]),
            None => return Err(fail("malformed IPv4 start")),
        };
        return Ok(Box::new(SteppedRange::octets(prefix, start_octet, end_octet)));
    }

    if let (Ok(s), Ok(e)) = (start.parse::<i64>(), end.parse::<i64>()) {
        return Ok(Box::new(SteppedRange::numeric(s, e)));
    }

    let mut start_chars = start.chars();
    let mut end_chars = end.chars();
    if let (Some(s), None, Some(e), None) = (
        start_chars.next(),
        start_chars.next(),
        end_chars.next(),
        end_chars.next(),
    ) {
        return Ok(Box::new(SteppedRange::chars(s, e)));
    }

    Err(fail("unsupported range format"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(spec: &str) -> Vec<String> {
        parse_range_source(spec).unwrap().collect()
    }

    #[test]
    fn numeric_and_char_ranges() {
        assert_eq!(values("1..3"), ["1", "2", "3"]);
        assert_eq!(values("3..1"), ["3", "2", "1"]);
        assert_eq!(values("a..c"), ["a", "b", "c"]);
        assert_eq!(values("c..a"), ["c", "b", "a"]);
        assert_eq!(values(" 1 .. 2 "), ["1", "2"]);
    }

    #[test]
    fn full_and_partial_ipv4() {
        assert_eq!(
            values("192.168.1.1..192.168.1.3"),
            ["192.168.1.1", "192.168.1.2", "192.168.1.3"]
        );
        assert_eq!(values("10.0.0.8..10"), ["10.0.0.8", "10.0.0.9", "10.0.0.10"]);
        assert!(values("10.0.0.8..1").is_empty());
    }

    #[test]
    fn list_trims_and_drops_empties() {
        assert_eq!(values("x|y|z"), ["x", "y", "z"]);
        assert_eq!(values(" admin | | root|"), ["admin", "root"]);
    }

    #[test]
    fn chain_concatenates() {
        assert_eq!(values("1..2+a..b"), ["1", "2", "a", "b"]);
        let chain = parse_range_source("1..3+x..z").unwrap();
        assert_eq!(chain.estimated_len(), 6);
    }

    #[test]
    fn malformed_ranges_are_rejected() {
        for spec in ["", "abc", "1..", "..3", "ab..cd", "1..bb", "10.0.0.1..300", "1..2+"] {
            assert!(
                matches!(parse_range_source(spec), Err(ShellError::Range { .. })),
                "{spec} should fail"
            );
        }
    }

    #[test]
    fn ipv6_is_rejected_up_front() {
        let err = parse_range_source("::1..::5").err().unwrap();
        assert!(err.to_string().contains("IPv6"));
    }
}
