//! Operator blacklist ranges
//!
//! CIDR ranges drains must not point into (metadata services, internal
//! networks). Parsed once at startup from a comma-separated flag.

use std::net::IpAddr;

/// Errors from parsing the blacklist flag.
#[derive(Debug, thiserror::Error)]
#[error("invalid CIDR {entry:?}")]
pub struct CidrError {
    entry: String,
}

/// A set of CIDR ranges with membership checks for v4 and v6 addresses.
#[derive(Debug, Clone, Default)]
pub struct IpRanges {
    ranges: Vec<Cidr>,
}

impl IpRanges {
    /// Parse a comma-separated list of CIDRs, e.g.
    /// `"10.0.0.0/8,169.254.0.0/16"`. An empty string yields an empty
    /// set.
    pub fn parse(list: &str) -> Result<Self, CidrError> {
        let mut ranges = Vec::new();
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            ranges.push(parse_cidr(entry)?);
        }
        Ok(Self { ranges })
    }

    /// Whether `ip` falls inside any configured range. Ranges only match
    /// addresses of their own family.
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.ranges.iter().any(|range| range.contains(ip))
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Cidr {
    network: IpAddr,
    prefix: u8,
}

impl Cidr {
    fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(network), IpAddr::V4(ip)) => {
                let mask = if self.prefix == 0 {
                    0
                } else {
                    u32::MAX << (32 - u32::from(self.prefix))
                };
                (u32::from(ip) & mask) == (u32::from(network) & mask)
            }
            (IpAddr::V6(network), IpAddr::V6(ip)) => {
                let mask = if self.prefix == 0 {
                    0
                } else {
                    u128::MAX << (128 - u32::from(self.prefix))
                };
                (u128::from(ip) & mask) == (u128::from(network) & mask)
            }
            _ => false,
        }
    }
}

fn parse_cidr(entry: &str) -> Result<Cidr, CidrError> {
    let invalid = || CidrError {
        entry: entry.to_string(),
    };

    let (addr, prefix) = entry.split_once('/').ok_or_else(invalid)?;
    let network: IpAddr = addr.parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;

    let max = match network {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    if prefix > max {
        return Err(invalid());
    }

    Ok(Cidr { network, prefix })
}

#[cfg(test)]
#[path = "ip_ranges_test.rs"]
mod ip_ranges_test;
