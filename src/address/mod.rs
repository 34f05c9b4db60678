//! IP address range expansion.
//!
//! Turns a single IP literal or a CIDR subnet into an [`AddressRange`] and
//! enumerates it lazily, in increasing order, with [`AddressIter`].
//!
//! Addresses are handled as raw big-endian bytes (4 for IPv4, 16 for IPv6).
//! IPv4-mapped IPv6 literals, and mapped subnets of at least /96, are
//! normalized to their IPv4 form. Both ends of a range share one family.

use std::cmp::Ordering;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error_handling::ScanError;

/// A closed interval `[start, end]` of addresses of one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    start: IpAddr,
    end: IpAddr,
}

impl AddressRange {
    /// Range holding exactly one address.
    pub fn single(ip: IpAddr) -> Self {
        let ip = normalize(ip);
        Self { start: ip, end: ip }
    }

    /// First address of the range.
    pub fn start(&self) -> IpAddr {
        self.start
    }

    /// Last address of the range (inclusive).
    pub fn end(&self) -> IpAddr {
        self.end
    }

    /// Number of addresses in the range.
    pub fn len(&self) -> u128 {
        let start = to_u128(&self.start);
        let end = to_u128(&self.end);
        end.saturating_sub(start).saturating_add(1)
    }

    /// Always false: a range holds at least its start address.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns a fresh iterator over every address from start to end.
    pub fn iter(&self) -> AddressIter {
        AddressIter {
            next: Some(self.start),
            end: self.end,
        }
    }
}

impl IntoIterator for &AddressRange {
    type Item = IpAddr;
    type IntoIter = AddressIter;

    fn into_iter(self) -> AddressIter {
        self.iter()
    }
}

/// Lazy, finite iterator over an [`AddressRange`].
#[derive(Debug, Clone)]
pub struct AddressIter {
    next: Option<IpAddr>,
    end: IpAddr,
}

impl Iterator for AddressIter {
    type Item = IpAddr;

    fn next(&mut self) -> Option<IpAddr> {
        let current = self.next.take()?;
        if to_u128(&current) > to_u128(&self.end) {
            return None;
        }
        if current != self.end {
            self.next = Some(next_ip(current));
        }
        Some(current)
    }
}

/// Parses an IP literal or CIDR subnet into an address range.
///
/// # Errors
///
/// Returns [`ScanError::InvalidAddress`] for an unparseable literal and
/// [`ScanError::InvalidSubnet`] for malformed CIDR notation.
///
/// # Examples
///
/// ```
/// use tls_scrape::address::parse_ip_or_subnet;
///
/// let range = parse_ip_or_subnet("192.168.1.0/24").unwrap();
/// assert_eq!(range.start().to_string(), "192.168.1.0");
/// assert_eq!(range.end().to_string(), "192.168.1.255");
/// ```
pub fn parse_ip_or_subnet(input: &str) -> Result<AddressRange, ScanError> {
    let input = input.trim();

    let Some((network, prefix)) = input.split_once('/') else {
        let ip: IpAddr = input
            .parse()
            .map_err(|_| ScanError::InvalidAddress(input.to_string()))?;
        return Ok(AddressRange::single(ip));
    };

    let invalid = |reason: &str| ScanError::InvalidSubnet {
        subnet: input.to_string(),
        reason: reason.to_string(),
    };

    let network: IpAddr = network
        .parse()
        .map_err(|_| invalid("invalid network address"))?;
    let prefix: u32 = prefix.parse().map_err(|_| invalid("invalid prefix length"))?;

    // ::ffff:a.b.c.d/n with n >= 96 is the IPv4 subnet a.b.c.d/(n - 96)
    let (network, prefix) = match network {
        IpAddr::V6(v6) if (96..=128).contains(&prefix) => match v6.to_ipv4_mapped() {
            Some(v4) => (IpAddr::V4(v4), prefix - 96),
            None => (network, prefix),
        },
        _ => (network, prefix),
    };

    let bits = match network {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    if prefix > bits {
        return Err(invalid("prefix length out of range"));
    }

    let host_bits = bits - prefix;
    let host_mask: u128 = if host_bits == 0 {
        0
    } else {
        u128::MAX >> (128 - host_bits)
    };

    let start = to_u128(&network) & !host_mask;
    let end = start | host_mask;

    Ok(AddressRange {
        start: from_u128(start, &network),
        end: from_u128(end, &network),
    })
}

/// Returns the address after `ip`, carrying across octets.
///
/// The family of `ip` is kept; the highest address of a family wraps to
/// the lowest.
pub fn next_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V4(v4) => {
            let mut octets = v4.octets();
            increment(&mut octets);
            IpAddr::V4(Ipv4Addr::from(octets))
        }
        IpAddr::V6(v6) => {
            let mut octets = v6.octets();
            increment(&mut octets);
            IpAddr::V6(Ipv6Addr::from(octets))
        }
    }
}

/// Compares two addresses byte-wise after normalization.
///
/// Addresses of different families order by byte length, so every IPv4
/// address sorts before every (non-mapped) IPv6 address.
pub fn compare_ips(a: &IpAddr, b: &IpAddr) -> Ordering {
    let a = octets(&normalize(*a));
    let b = octets(&normalize(*b));
    a.len().cmp(&b.len()).then_with(|| a.cmp(&b))
}

fn increment(bytes: &mut [u8]) {
    for byte in bytes.iter_mut().rev() {
        let (value, overflow) = byte.overflowing_add(1);
        *byte = value;
        if !overflow {
            break;
        }
    }
}

fn normalize(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        },
        v4 => v4,
    }
}

fn octets(ip: &IpAddr) -> Vec<u8> {
    match ip {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

fn to_u128(ip: &IpAddr) -> u128 {
    match ip {
        IpAddr::V4(v4) => u128::from(u32::from(*v4)),
        IpAddr::V6(v6) => u128::from(*v6),
    }
}

fn from_u128(value: u128, family: &IpAddr) -> IpAddr {
    match family {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::from(value as u32)),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::from(value)),
    }
}
