//! Probe target validation.
//!
//! Targets are `host:port` strings where the host is a literal IP address
//! (IPv6 in brackets) and the port is a decimal number that fits in 16 bits.
//! DNS names are rejected.

use crate::errors::{MalformedAddressError, MalformedReason};
use std::net::{IpAddr, SocketAddr};

/// Splits `address` into host and port without interpreting either.
///
/// Bracketed hosts have their brackets stripped.
pub fn split_host_port(address: &str) -> Result<(&str, &str), MalformedReason> {
    let colon = address.rfind(':').ok_or(MalformedReason::MissingPort)?;

    let (host, host_start, port_start) = if address.starts_with('[') {
        let close = address.find(']').ok_or(MalformedReason::UnexpectedBracket)?;
        if close + 1 == address.len() {
            return Err(MalformedReason::MissingPort);
        }
        if close + 1 != colon {
            return Err(if address.as_bytes()[close + 1] == b':' {
                MalformedReason::TooManyColons
            } else {
                MalformedReason::MissingPort
            });
        }
        (&address[1..close], 1, close + 1)
    } else {
        let host = &address[..colon];
        if host.contains(':') {
            return Err(MalformedReason::TooManyColons);
        }
        (host, 0, 0)
    };

    if address[host_start..].contains('[') || address[port_start..].contains(']') {
        return Err(MalformedReason::UnexpectedBracket);
    }

    Ok((host, &address[colon + 1..]))
}

/// Parses a port made only of decimal digits.
fn parse_port(port: &str) -> Option<u16> {
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    port.parse().ok()
}

/// Validates a probe target and resolves it to a socket address.
pub fn parse_target(address: &str) -> Result<SocketAddr, MalformedAddressError> {
    let malformed = |reason| MalformedAddressError::new(address, reason);

    let (host, port) = split_host_port(address).map_err(malformed)?;
    let ip: IpAddr = host.parse().map_err(|_| malformed(MalformedReason::InvalidIp))?;
    let port = parse_port(port).ok_or_else(|| malformed(MalformedReason::InvalidPort))?;

    Ok(SocketAddr::new(ip, port))
}
