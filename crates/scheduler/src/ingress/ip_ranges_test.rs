use super::*;

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

#[test]
fn test_empty_list() {
    let ranges = IpRanges::parse("").unwrap();
    assert!(ranges.is_empty());
    assert!(!ranges.contains(ip("10.0.0.1")));
}

#[test]
fn test_v4_membership() {
    let ranges = IpRanges::parse("10.0.0.0/8").unwrap();

    assert!(ranges.contains(ip("10.0.0.1")));
    assert!(ranges.contains(ip("10.255.255.255")));
    assert!(!ranges.contains(ip("11.0.0.0")));
    assert!(!ranges.contains(ip("9.255.255.255")));
}

#[test]
fn test_multiple_ranges() {
    let ranges = IpRanges::parse("10.0.0.0/8, 192.168.0.0/16").unwrap();

    assert_eq!(ranges.len(), 2);
    assert!(ranges.contains(ip("10.1.2.3")));
    assert!(ranges.contains(ip("192.168.4.5")));
    assert!(!ranges.contains(ip("172.16.0.1")));
}

#[test]
fn test_single_host_range() {
    let ranges = IpRanges::parse("203.0.113.7/32").unwrap();

    assert!(ranges.contains(ip("203.0.113.7")));
    assert!(!ranges.contains(ip("203.0.113.8")));
}

#[test]
fn test_zero_prefix_matches_family() {
    let ranges = IpRanges::parse("0.0.0.0/0").unwrap();

    assert!(ranges.contains(ip("8.8.8.8")));
    // Only the v4 family, though.
    assert!(!ranges.contains(ip("::1")));
}

#[test]
fn test_v6_membership() {
    let ranges = IpRanges::parse("fd00::/8").unwrap();

    assert!(ranges.contains(ip("fd12:3456::1")));
    assert!(!ranges.contains(ip("fe80::1")));
    assert!(!ranges.contains(ip("10.0.0.1")));
}

#[test]
fn test_invalid_entries_rejected() {
    assert!(IpRanges::parse("10.0.0.0").is_err());
    assert!(IpRanges::parse("10.0.0.0/33").is_err());
    assert!(IpRanges::parse("not-an-ip/8").is_err());
    assert!(IpRanges::parse("10.0.0.0/abc").is_err());
    assert!(IpRanges::parse("fd00::/129").is_err());
}
