//! Decoding of the hexadecimal endpoints found in `/proc/[pid]/net/tcp*`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::Error;

const V4_LEN: usize = 13;
const V6_MIN_LEN: usize = 37;

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn parse_port(s: &str, mk_err: impl Fn() -> Error) -> Result<u16, Error> {
    // from_str_radix would also accept a leading '+'.
    if !is_hex(s) {
        return Err(mk_err());
    }
    u16::from_str_radix(s, 16).map_err(|_| mk_err())
}

/// Decode an IPv4 endpoint of the form "0100007F:1F90" (i.e. 127.0.0.1:8080).
///
/// The address word is read as a 32-bit value and its bytes are taken from
/// least to most significant, which is how a little-endian kernel lays them
/// out in the table.
pub fn decode_v4(s: &str) -> Result<(Ipv4Addr, u16), Error> {
    let mk_err = || {
        Error::parse(
            "IPv4 address",
            &format!("expected address in form '0100007F:1F90', got {}", s),
        )
    };

    if s.len() != V4_LEN {
        return Err(mk_err());
    }
    let (addr_hex, port_hex) = s.split_once(':').ok_or_else(mk_err)?;
    if addr_hex.len() != 8 || !is_hex(addr_hex) {
        return Err(mk_err());
    }

    let word = u32::from_str_radix(addr_hex, 16).map_err(|_| mk_err())?;
    let port = parse_port(port_hex, mk_err)?;
    Ok((Ipv4Addr::from(word.to_le_bytes()), port))
}

/// Decode an IPv6 endpoint of the form
/// "00000000000000000000000000000001:1F90" (i.e. [::1]:8080).
///
/// The 32 digits are one 128-bit value laid out most-significant byte first.
pub fn decode_v6(s: &str) -> Result<(Ipv6Addr, u16), Error> {
    let mk_err = || {
        Error::parse(
            "IPv6 address",
            &format!(
                "expected address in form '00000000000000000000000000000001:1F90', got {}",
                s
            ),
        )
    };

    if s.len() < V6_MIN_LEN {
        return Err(mk_err());
    }
    let (addr_hex, port_hex) = s.split_once(':').ok_or_else(mk_err)?;
    if addr_hex.len() != 32 || !is_hex(addr_hex) {
        return Err(mk_err());
    }

    let value = u128::from_str_radix(addr_hex, 16).map_err(|_| mk_err())?;
    let port = parse_port(port_hex, mk_err)?;
    Ok((Ipv6Addr::from(value.to_be_bytes()), port))
}

/// Decode an endpoint field from a TCP table, choosing the family from the
/// field length.
pub fn decode_endpoint(s: &str) -> Result<SocketAddr, Error> {
    if s.len() == V4_LEN {
        let (ip, port) = decode_v4(s)?;
        Ok(SocketAddr::new(IpAddr::V4(ip), port))
    } else {
        let (ip, port) = decode_v6(s)?;
        Ok(SocketAddr::new(IpAddr::V6(ip), port))
    }
}
