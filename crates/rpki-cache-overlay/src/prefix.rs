//! Prefix string parsing and range validation shared by filter and
//! assertion elements.

use std::net::IpAddr;

pub fn family_max(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

/// Parse `"addr/len"`, validating that `len` is in range for the
/// address family and that no host bits below `len` are set.
pub fn parse_prefix(s: &str) -> Option<(IpAddr, u8)> {
    let (addr_part, len_part) = s.split_once('/')?;
    let addr: IpAddr = addr_part.parse().ok()?;
    let len: u32 = len_part.parse().ok()?;
    let max = family_max(&addr) as u32;
    if len > max {
        return None;
    }
    let len = len as u8;

    if !host_bits_zero(&addr, len) {
        return None;
    }

    Some((addr, len))
}

fn host_bits_zero(addr: &IpAddr, len: u8) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            let bits = u32::from(*v4);
            let mask = if len == 0 { 0 } else { !0u32 << (32 - len as u32) };
            bits & !mask == 0
        }
        IpAddr::V6(v6) => {
            let bits = u128::from(*v6);
            let mask = if len == 0 { 0 } else { !0u128 << (128 - len as u32) };
            bits & !mask == 0
        }
    }
}

/// Validate an ASN against the declared range `[1, 2^32-1]`.
pub fn validate_asn(n: i64) -> Option<u32> {
    if n >= 1 && n <= u32::MAX as i64 {
        Some(n as u32)
    } else {
        None
    }
}

/// Validate a `maxPrefixLength` value against the address family's
/// range, returning `None` for zero (treated as "absent" per spec).
pub fn validate_max_prefix_length(addr: &IpAddr, len: u32) -> Option<u8> {
    if len == 0 {
        return None;
    }
    let max = family_max(addr) as u32;
    if len > max {
        None
    } else {
        Some(len as u8)
    }
}
