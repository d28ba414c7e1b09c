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
use crate::zint::ZInt;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A numerical Id mapped to a resource name with a `RESOURCE` declaration.
pub type ResourceId = ZInt;

/// Reserved id meaning "no numerical resource", i.e. a pure-name key.
pub const NO_RESOURCE_ID: ResourceId = 0;

/// A resource key: either a pure name, a previously-declared numerical id,
/// or an id plus a textual suffix appended to the id's declared name.
///
/// Invariant: `rid() == NO_RESOURCE_ID` implies a name is present.
#[derive(PartialEq, Eq, Hash, Clone)]
pub enum ResKey<'a> {
    RName(Cow<'a, str>),
    RId(ResourceId),
    RIdWithSuffix(ResourceId, Cow<'a, str>),
}
use ResKey::*;

impl ResKey<'_> {
    #[inline(always)]
    pub fn rid(&self) -> ResourceId {
        match self {
            RName(_) => NO_RESOURCE_ID,
            RId(rid) | RIdWithSuffix(rid, _) => *rid,
        }
    }

    #[inline(always)]
    pub fn is_numerical(&self) -> bool {
        matches!(self, RId(_))
    }

    #[inline(always)]
    pub fn name(&self) -> Option<&str> {
        match self {
            RName(name) => Some(name),
            RId(_) => None,
            RIdWithSuffix(_, suffix) => Some(suffix),
        }
    }

    pub fn to_owned(&self) -> ResKey<'static> {
        match self {
            RId(id) => ResKey::RId(*id),
            RName(s) => ResKey::RName(s.to_string().into()),
            RIdWithSuffix(id, s) => ResKey::RIdWithSuffix(*id, s.to_string().into()),
        }
    }
}

impl fmt::Debug for ResKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RName(name) => write!(f, "{}", name),
            RId(rid) => write!(f, "{}", rid),
            RIdWithSuffix(rid, suffix) => write!(f, "{}, {}", rid, suffix),
        }
    }
}

impl fmt::Display for ResKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<ResourceId> for ResKey<'_> {
    #[inline]
    fn from(rid: ResourceId) -> ResKey<'static> {
        RId(rid)
    }
}

impl<'a> From<&'a str> for ResKey<'a> {
    #[inline]
    fn from(name: &'a str) -> ResKey<'a> {
        RName(name.into())
    }
}

impl From<String> for ResKey<'_> {
    #[inline]
    fn from(name: String) -> ResKey<'static> {
        RName(name.into())
    }
}

impl<'a> From<(ResourceId, &'a str)> for ResKey<'a> {
    #[inline]
    fn from(tuple: (ResourceId, &'a str)) -> ResKey<'a> {
        if tuple.1.is_empty() {
            RId(tuple.0)
        } else if tuple.0 == NO_RESOURCE_ID {
            RName(tuple.1.into())
        } else {
            RIdWithSuffix(tuple.0, tuple.1.into())
        }
    }
}

/// The global unique id of a zenoh peer, an opaque byte string up to 16 bytes.
#[derive(Clone, Eq)]
pub struct PeerId {
    size: usize,
    id: [u8; PeerId::MAX_SIZE],
}

impl PeerId {
    pub const MAX_SIZE: usize = 16;

    pub fn new(size: usize, id: [u8; PeerId::MAX_SIZE]) -> PeerId {
        assert!(size <= PeerId::MAX_SIZE);
        PeerId { size, id }
    }

    pub fn from_slice(bytes: &[u8]) -> PeerId {
        let size = bytes.len().min(PeerId::MAX_SIZE);
        let mut id = [0u8; PeerId::MAX_SIZE];
        id[..size].copy_from_slice(&bytes[..size]);
        PeerId { size, id }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.id[..self.size]
    }
}

impl PartialEq for PeerId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Hash for PeerId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for b in self.as_slice() {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// `whatami` role flags, carried in the INIT handshake.
pub mod whatami {
    use super::ZInt;

    pub type Type = ZInt;

    pub const ROUTER: Type = 1;
    pub const PEER: Type = 1 << 1;
    pub const CLIENT: Type = 1 << 2;

    pub fn to_string(w: Type) -> String {
        match w {
            ROUTER => "Router".to_string(),
            PEER => "Peer".to_string(),
            CLIENT => "Client".to_string(),
            i => i.to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Reliability {
    BestEffort,
    Reliable,
}

impl Default for Reliability {
    #[inline]
    fn default() -> Self {
        Reliability::Reliable
    }
}

/// The kind of congestion control applied to an outbound message.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CongestionControl {
    /// Retry until the link accepts the write (or the session closes).
    Block,
    /// Drop immediately on back-pressure.
    Drop,
}

impl Default for CongestionControl {
    #[inline]
    fn default() -> CongestionControl {
        CongestionControl::Drop
    }
}

/// The subscription mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubMode {
    Push,
    Pull,
}

impl Default for SubMode {
    #[inline]
    fn default() -> Self {
        SubMode::Push
    }
}

/// A time period, used by pull-mode subscriptions.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Period {
    pub origin: ZInt,
    pub period: ZInt,
    pub duration: ZInt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubInfo {
    pub reliability: Reliability,
    pub mode: SubMode,
    pub period: Option<Period>,
}

impl Default for SubInfo {
    fn default() -> SubInfo {
        SubInfo {
            reliability: Reliability::default(),
            mode: SubMode::default(),
            period: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryableInfo {
    pub complete: ZInt,
    pub distance: ZInt,
}

impl Default for QueryableInfo {
    fn default() -> QueryableInfo {
        QueryableInfo {
            complete: 1,
            distance: 0,
        }
    }
}

pub mod queryable {
    use super::ZInt;
    pub const ALL_KINDS: ZInt = 0x01;
    pub const STORAGE: ZInt = 0x02;
    pub const EVAL: ZInt = 0x04;
}

/// PUT or DELETE, carried uninterpreted in `DataInfo`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DataKind {
    Put,
    Delete,
}

pub mod data_kind {
    use super::ZInt;
    pub const PUT: ZInt = 0;
    pub const DELETE: ZInt = 1;
    pub const DEFAULT: ZInt = PUT;
}

/// An opaque, uninterpreted payload encoding tag: an integer prefix (a
/// well-known scheme id) plus a free-form suffix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Encoding {
    pub prefix: ZInt,
    pub suffix: String,
}

pub mod encoding {
    use super::Encoding;
    pub const EMPTY: ZInt = 0;
    pub const APP_OCTET_STREAM: ZInt = 1;
    pub const TEXT_PLAIN: ZInt = 3;
    pub const APP_JSON: ZInt = 5;

    pub fn of(prefix: ZInt) -> Encoding {
        Encoding {
            prefix,
            suffix: String::new(),
        }
    }
}

/// The kind of consolidation applied at one position of the reply pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsolidationMode {
    None,
    Lazy,
    Full,
}

/// The consolidation policy applied to replies of a [`query`](crate) at the
/// three positions defined by the protocol: the first routers to see the
/// query, the last router before the client, and on reception by the client.
/// Only `reception` is enforced by this core; `first_routers`/`last_router`
/// are transmitted verbatim for the router's own consolidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConsolidation {
    pub first_routers: ConsolidationMode,
    pub last_router: ConsolidationMode,
    pub reception: ConsolidationMode,
}

impl QueryConsolidation {
    pub fn none() -> Self {
        Self {
            first_routers: ConsolidationMode::None,
            last_router: ConsolidationMode::None,
            reception: ConsolidationMode::None,
        }
    }
}

impl Default for QueryConsolidation {
    fn default() -> Self {
        Self {
            first_routers: ConsolidationMode::Lazy,
            last_router: ConsolidationMode::Lazy,
            reception: ConsolidationMode::Full,
        }
    }
}

/// The queryables that should be the target of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    BestMatching,
    All,
    AllComplete,
    None,
}

impl Default for Target {
    fn default() -> Self {
        Target::BestMatching
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTarget {
    pub kind: ZInt,
    pub target: Target,
}

impl Default for QueryTarget {
    fn default() -> Self {
        QueryTarget {
            kind: queryable::ALL_KINDS,
            target: Target::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reskey_invariant() {
        let rk: ResKey = "/a/b".into();
        assert_eq!(rk.rid(), NO_RESOURCE_ID);
        assert_eq!(rk.name(), Some("/a/b"));

        let rk: ResKey = 17.into();
        assert_eq!(rk.rid(), 17);
        assert_eq!(rk.name(), None);

        let rk: ResKey = (17, "/c").into();
        assert_eq!(rk.rid(), 17);
        assert_eq!(rk.name(), Some("/c"));
    }

    #[test]
    fn peer_id_equality() {
        let a = PeerId::from_slice(&[1, 2, 3]);
        let b = PeerId::from_slice(&[1, 2, 3]);
        let c = PeerId::from_slice(&[1, 2, 4]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
