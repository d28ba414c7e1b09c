//
// Copyright (c) 2017, 2020 ADLINK Technology Inc.
//
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// http://www.eclipse.org/legal/epl-2.0, or the Apache License, Version 2.0
// which is available at https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: EPL-2.0 OR Apache-2.0
//
// Contributors:
//   ADLINK zenoh team, <zenoh@adlink-labs.tech>
//
//! `scheme "/" address ("?" k=v ("," k=v)*)?` locators, and
//! `locator ("#" k=v ("," k=v)*)?` endpoints. Formatting is the exact
//! inverse of parsing: metadata/config keys are emitted in lexicographic
//! order, so two equal locators always format to the same bytes.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use zlite_core::error::{ZErrorKind, ZResult};
use zlite_core::zerror;

const RESERVED: &[char] = &['?', '#', ',', '='];

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '%' || RESERVED.contains(&c) {
            out.push_str(&format!("%{:02X}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

fn percent_decode(s: &str) -> ZResult<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len() {
                return zerror!(ZErrorKind::ParseError {
                    descr: format!("truncated percent-escape in '{}'", s)
                });
            }
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).map_err(|_| {
                zlite_core::error::ZError::new(
                    ZErrorKind::ParseError {
                        descr: format!("invalid percent-escape in '{}'", s),
                    },
                    file!(),
                    line!(),
                )
            })?;
            let byte = u8::from_str_radix(hex, 16).map_err(|_| {
                zlite_core::error::ZError::new(
                    ZErrorKind::ParseError {
                        descr: format!("invalid percent-escape in '{}'", s),
                    },
                    file!(),
                    line!(),
                )
            })?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| {
        zlite_core::error::ZError::new(
            ZErrorKind::ParseError {
                descr: format!("non-utf8 percent-decoded value in '{}'", s),
            },
            file!(),
            line!(),
        )
    })
}

fn parse_metadata(s: &str) -> ZResult<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    if s.is_empty() {
        return Ok(map);
    }
    for kv in s.split(',') {
        let mut it = kv.splitn(2, '=');
        let k = it.next().unwrap_or("");
        let v = it.next().ok_or_else(|| {
            zlite_core::error::ZError::new(
                ZErrorKind::ParseError {
                    descr: format!("malformed key=value pair '{}'", kv),
                },
                file!(),
                line!(),
            )
        })?;
        if k.is_empty() {
            return zerror!(ZErrorKind::ParseError {
                descr: format!("empty key in '{}'", kv)
            });
        }
        map.insert(k.to_string(), percent_decode(v)?);
    }
    Ok(map)
}

fn format_metadata(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(k, v)| format!("{}={}", k, percent_encode(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// A `scheme/address?metadata` triple identifying a reachable endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub scheme: String,
    pub address: String,
    pub metadata: BTreeMap<String, String>,
}

pub const SCHEME_TCP: &str = "tcp";
pub const SCHEME_UDP: &str = "udp";

impl Locator {
    pub fn new(scheme: impl Into<String>, address: impl Into<String>) -> Locator {
        Locator {
            scheme: scheme.into(),
            address: address.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn parse(s: &str) -> ZResult<Locator> {
        let (scheme, rest) = s.split_once('/').ok_or_else(|| {
            zlite_core::error::ZError::new(
                ZErrorKind::ParseError {
                    descr: format!("missing '/' separator in locator '{}'", s),
                },
                file!(),
                line!(),
            )
        })?;
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_lowercase()) {
            return zerror!(ZErrorKind::ParseError {
                descr: format!("invalid scheme '{}'", scheme)
            });
        }
        let (address, metadata_str) = match rest.split_once('?') {
            Some((a, m)) => (a, m),
            None => (rest, ""),
        };
        if address.is_empty() || address.contains(['#']) {
            return zerror!(ZErrorKind::ParseError {
                descr: format!("invalid address '{}'", address)
            });
        }
        let metadata = parse_metadata(metadata_str)?;
        Ok(Locator {
            scheme: scheme.to_string(),
            address: address.to_string(),
            metadata,
        })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.scheme, self.address)?;
        if !self.metadata.is_empty() {
            write!(f, "?{}", format_metadata(&self.metadata))?;
        }
        Ok(())
    }
}

impl FromStr for Locator {
    type Err = zlite_core::error::ZError;
    fn from_str(s: &str) -> ZResult<Locator> {
        Locator::parse(s)
    }
}

/// A [`Locator`] extended with an optional `#key=value,...` config tail that
/// tunes how the link itself is opened (never sent on the wire).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndPoint {
    pub locator: Locator,
    pub config: BTreeMap<String, String>,
}

impl EndPoint {
    pub fn parse(s: &str) -> ZResult<EndPoint> {
        let (loc_str, config_str) = match s.split_once('#') {
            Some((l, c)) => (l, c),
            None => (s, ""),
        };
        let locator = Locator::parse(loc_str)?;
        let config = parse_metadata(config_str)?;
        Ok(EndPoint { locator, config })
    }
}

impl fmt::Display for EndPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.locator)?;
        if !self.config.is_empty() {
            write!(f, "#{}", format_metadata(&self.config))?;
        }
        Ok(())
    }
}

impl FromStr for EndPoint {
    type Err = zlite_core::error::ZError;
    fn from_str(s: &str) -> ZResult<EndPoint> {
        EndPoint::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_simple() {
        let l = Locator::parse("tcp/127.0.0.1:7447").unwrap();
        assert_eq!(l.scheme, "tcp");
        assert_eq!(l.address, "127.0.0.1:7447");
        assert!(l.metadata.is_empty());
        assert_eq!(l.to_string(), "tcp/127.0.0.1:7447");
    }

    #[test]
    fn round_trip_with_metadata() {
        let s = "tcp/127.0.0.1:7447?iface=eth0";
        let l = Locator::parse(s).unwrap();
        assert_eq!(l.scheme, "tcp");
        assert_eq!(l.address, "127.0.0.1:7447");
        assert_eq!(l.metadata.get("iface").map(String::as_str), Some("eth0"));
        assert_eq!(l.to_string(), s);
    }

    #[test]
    fn metadata_keys_sorted_on_format() {
        let l = Locator::parse("udp/1.2.3.4:7?z=1,a=2").unwrap();
        assert_eq!(l.to_string(), "udp/1.2.3.4:7?a=2,z=1");
    }

    #[test]
    fn endpoint_round_trip() {
        let s = "tcp/127.0.0.1:7447?iface=eth0#retry=3";
        let e = EndPoint::parse(s).unwrap();
        assert_eq!(e.config.get("retry").map(String::as_str), Some("3"));
        assert_eq!(e.to_string(), s);
    }

    #[test]
    fn percent_encoded_value_round_trips() {
        let l = Locator::new("tcp", "host").to_string();
        assert_eq!(l, "tcp/host");
        let mut loc = Locator::new("tcp", "host");
        loc.metadata.insert("k".to_string(), "a,b=c".to_string());
        let formatted = loc.to_string();
        let reparsed = Locator::parse(&formatted).unwrap();
        assert_eq!(reparsed, loc);
    }

    #[test]
    fn invalid_locator_is_parse_error() {
        assert!(Locator::parse("tcp").is_err());
        assert!(Locator::parse("TCP/host").is_err());
        assert!(Locator::parse("tcp/").is_err());
    }
}
