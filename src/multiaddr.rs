// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Multiaddr decoding.
//!
//! Datasets store the location of their encrypted payload as a binary
//! multiaddr (e.g. `/p2p/Qm...` for an IPFS CID). The subgraph and the
//! registry return it hex-encoded; this module turns it back into the
//! human-readable path.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Decode a hex-encoded binary multiaddr into its string form.
///
/// Returns `None` for missing, non-hex, truncated or unknown-protocol input.
pub fn get_multiaddr_as_string(multiaddr_hex: Option<&str>) -> Option<String> {
    let raw = multiaddr_hex?.trim();
    let hex = raw.strip_prefix("0x").unwrap_or(raw);
    if hex.is_empty() {
        return None;
    }
    let bytes = alloy::hex::decode(hex).ok()?;
    decode(&bytes)
}

/// Protocol value encodings we know how to render.
enum Value {
    None,
    Fixed(usize),
    LengthPrefixed,
}

struct Protocol {
    code: u64,
    name: &'static str,
    value: Value,
}

const PROTOCOLS: &[Protocol] = &[
    Protocol { code: 4, name: "ip4", value: Value::Fixed(4) },
    Protocol { code: 6, name: "tcp", value: Value::Fixed(2) },
    Protocol { code: 41, name: "ip6", value: Value::Fixed(16) },
    Protocol { code: 53, name: "dns", value: Value::LengthPrefixed },
    Protocol { code: 54, name: "dns4", value: Value::LengthPrefixed },
    Protocol { code: 55, name: "dns6", value: Value::LengthPrefixed },
    Protocol { code: 56, name: "dnsaddr", value: Value::LengthPrefixed },
    Protocol { code: 273, name: "udp", value: Value::Fixed(2) },
    Protocol { code: 290, name: "p2p-circuit", value: Value::None },
    Protocol { code: 421, name: "p2p", value: Value::LengthPrefixed },
    Protocol { code: 443, name: "https", value: Value::None },
    Protocol { code: 460, name: "quic", value: Value::None },
    Protocol { code: 461, name: "quic-v1", value: Value::None },
    Protocol { code: 477, name: "ws", value: Value::None },
    Protocol { code: 478, name: "wss", value: Value::None },
    Protocol { code: 480, name: "http", value: Value::None },
];

fn decode(mut bytes: &[u8]) -> Option<String> {
    let mut out = String::new();

    while !bytes.is_empty() {
        let (code, rest) = read_varint(bytes)?;
        let protocol = PROTOCOLS.iter().find(|p| p.code == code)?;
        bytes = rest;

        out.push('/');
        out.push_str(protocol.name);

        let value = match protocol.value {
            Value::None => continue,
            Value::Fixed(len) => {
                if bytes.len() < len {
                    return None;
                }
                let (value, rest) = bytes.split_at(len);
                bytes = rest;
                value
            }
            Value::LengthPrefixed => {
                let (len, rest) = read_varint(bytes)?;
                let len = usize::try_from(len).ok()?;
                if rest.len() < len {
                    return None;
                }
                let (value, rest) = rest.split_at(len);
                bytes = rest;
                value
            }
        };

        out.push('/');
        out.push_str(&render_value(protocol.code, value)?);
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn render_value(code: u64, value: &[u8]) -> Option<String> {
    match code {
        4 => {
            let octets: [u8; 4] = value.try_into().ok()?;
            Some(Ipv4Addr::from(octets).to_string())
        }
        41 => {
            let octets: [u8; 16] = value.try_into().ok()?;
            Some(Ipv6Addr::from(octets).to_string())
        }
        6 | 273 => {
            let port: [u8; 2] = value.try_into().ok()?;
            Some(u16::from_be_bytes(port).to_string())
        }
        421 => Some(bs58::encode(value).into_string()),
        _ => std::str::from_utf8(value).ok().map(str::to_string),
    }
}

/// Unsigned LEB128 varint, at most 9 bytes.
fn read_varint(bytes: &[u8]) -> Option<(u64, &[u8])> {
    let mut value: u64 = 0;
    for (i, byte) in bytes.iter().enumerate().take(9) {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Some((value, &bytes[i + 1..]));
        }
    }
    None
}
