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
//! Codec for the shared core types (`ResKey`, `PeerId`, `SubInfo`, ...).
//! A `ResKey` is self-tagged with a leading variant byte rather than relying
//! on a header flag, so its shape never depends on bits owned by the
//! enclosing message.
use crate::buf::{RBuf, WBuf};
use zlite_core::core_types::*;
use zlite_core::error::{ZErrorKind, ZResult};
use zlite_core::zerror;

const RESKEY_NAME: u8 = 0;
const RESKEY_ID: u8 = 1;
const RESKEY_ID_SUFFIX: u8 = 2;

pub fn encode_reskey(w: &mut WBuf, key: &ResKey) {
    match key {
        ResKey::RName(name) => {
            w.write_byte(RESKEY_NAME);
            w.write_string(name);
        }
        ResKey::RId(rid) => {
            w.write_byte(RESKEY_ID);
            w.write_zint(*rid);
        }
        ResKey::RIdWithSuffix(rid, suffix) => {
            w.write_byte(RESKEY_ID_SUFFIX);
            w.write_zint(*rid);
            w.write_string(suffix);
        }
    }
}

pub fn decode_reskey(r: &mut RBuf) -> ZResult<ResKey<'static>> {
    match r.read_byte()? {
        RESKEY_NAME => Ok(ResKey::RName(r.read_string()?.into())),
        RESKEY_ID => Ok(ResKey::RId(r.read_zint()?)),
        RESKEY_ID_SUFFIX => {
            let rid = r.read_zint()?;
            let suffix = r.read_string()?;
            Ok(ResKey::RIdWithSuffix(rid, suffix.into()))
        }
        other => zerror!(ZErrorKind::ProtocolError {
            descr: format!("unknown reskey variant tag {}", other)
        }),
    }
}

pub fn encode_peer_id(w: &mut WBuf, pid: &PeerId) {
    w.write_bytes(pid.as_slice());
}

pub fn decode_peer_id(r: &mut RBuf) -> ZResult<PeerId> {
    Ok(PeerId::from_slice(&r.read_bytes()?))
}

pub fn encode_reliability(w: &mut WBuf, r: Reliability) {
    w.write_byte(match r {
        Reliability::BestEffort => 0,
        Reliability::Reliable => 1,
    });
}

pub fn decode_reliability(r: &mut RBuf) -> ZResult<Reliability> {
    match r.read_byte()? {
        0 => Ok(Reliability::BestEffort),
        1 => Ok(Reliability::Reliable),
        other => zerror!(ZErrorKind::ProtocolError {
            descr: format!("unknown reliability tag {}", other)
        }),
    }
}

pub fn encode_congestion_control(w: &mut WBuf, c: CongestionControl) {
    w.write_byte(match c {
        CongestionControl::Block => 0,
        CongestionControl::Drop => 1,
    });
}

pub fn decode_congestion_control(r: &mut RBuf) -> ZResult<CongestionControl> {
    match r.read_byte()? {
        0 => Ok(CongestionControl::Block),
        1 => Ok(CongestionControl::Drop),
        other => zerror!(ZErrorKind::ProtocolError {
            descr: format!("unknown congestion control tag {}", other)
        }),
    }
}

pub fn encode_sub_info(w: &mut WBuf, info: &SubInfo) {
    encode_reliability(w, info.reliability);
    w.write_byte(match info.mode {
        SubMode::Push => 0,
        SubMode::Pull => 1,
    });
    match &info.period {
        None => w.write_byte(0),
        Some(p) => {
            w.write_byte(1);
            w.write_zint(p.origin);
            w.write_zint(p.period);
            w.write_zint(p.duration);
        }
    }
}

pub fn decode_sub_info(r: &mut RBuf) -> ZResult<SubInfo> {
    let reliability = decode_reliability(r)?;
    let mode = match r.read_byte()? {
        0 => SubMode::Push,
        1 => SubMode::Pull,
        other => {
            return zerror!(ZErrorKind::ProtocolError {
                descr: format!("unknown submode tag {}", other)
            })
        }
    };
    let period = match r.read_byte()? {
        0 => None,
        1 => Some(Period {
            origin: r.read_zint()?,
            period: r.read_zint()?,
            duration: r.read_zint()?,
        }),
        other => {
            return zerror!(ZErrorKind::ProtocolError {
                descr: format!("unknown period presence tag {}", other)
            })
        }
    };
    Ok(SubInfo {
        reliability,
        mode,
        period,
    })
}

pub fn encode_queryable_info(w: &mut WBuf, info: &QueryableInfo) {
    w.write_zint(info.complete);
    w.write_zint(info.distance);
}

pub fn decode_queryable_info(r: &mut RBuf) -> ZResult<QueryableInfo> {
    Ok(QueryableInfo {
        complete: r.read_zint()?,
        distance: r.read_zint()?,
    })
}

pub fn encode_encoding(w: &mut WBuf, enc: &Encoding) {
    w.write_zint(enc.prefix);
    w.write_string(&enc.suffix);
}

pub fn decode_encoding(r: &mut RBuf) -> ZResult<Encoding> {
    Ok(Encoding {
        prefix: r.read_zint()?,
        suffix: r.read_string()?,
    })
}

fn encode_consolidation_mode(w: &mut WBuf, m: ConsolidationMode) {
    w.write_byte(match m {
        ConsolidationMode::None => 0,
        ConsolidationMode::Lazy => 1,
        ConsolidationMode::Full => 2,
    });
}

fn decode_consolidation_mode(r: &mut RBuf) -> ZResult<ConsolidationMode> {
    match r.read_byte()? {
        0 => Ok(ConsolidationMode::None),
        1 => Ok(ConsolidationMode::Lazy),
        2 => Ok(ConsolidationMode::Full),
        other => zerror!(ZErrorKind::ProtocolError {
            descr: format!("unknown consolidation mode tag {}", other)
        }),
    }
}

pub fn encode_query_consolidation(w: &mut WBuf, c: &QueryConsolidation) {
    encode_consolidation_mode(w, c.first_routers);
    encode_consolidation_mode(w, c.last_router);
    encode_consolidation_mode(w, c.reception);
}

pub fn decode_query_consolidation(r: &mut RBuf) -> ZResult<QueryConsolidation> {
    Ok(QueryConsolidation {
        first_routers: decode_consolidation_mode(r)?,
        last_router: decode_consolidation_mode(r)?,
        reception: decode_consolidation_mode(r)?,
    })
}

fn encode_target(w: &mut WBuf, t: &Target) {
    w.write_byte(match t {
        Target::BestMatching => 0,
        Target::All => 1,
        Target::AllComplete => 2,
        Target::None => 3,
    });
}

fn decode_target(r: &mut RBuf) -> ZResult<Target> {
    match r.read_byte()? {
        0 => Ok(Target::BestMatching),
        1 => Ok(Target::All),
        2 => Ok(Target::AllComplete),
        3 => Ok(Target::None),
        other => zerror!(ZErrorKind::ProtocolError {
            descr: format!("unknown target tag {}", other)
        }),
    }
}

pub fn encode_query_target(w: &mut WBuf, t: &QueryTarget) {
    w.write_zint(t.kind);
    encode_target(w, &t.target);
}

pub fn decode_query_target(r: &mut RBuf) -> ZResult<QueryTarget> {
    Ok(QueryTarget {
        kind: r.read_zint()?,
        target: decode_target(r)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip_reskey(key: ResKey) {
        let mut w = WBuf::new();
        encode_reskey(&mut w, &key);
        let bytes = w.into_vec();
        let mut r = RBuf::new(&bytes);
        assert_eq!(decode_reskey(&mut r).unwrap(), key);
    }

    #[test]
    fn reskey_variants_round_trip() {
        round_trip_reskey(ResKey::RName("/a/b".into()));
        round_trip_reskey(ResKey::RId(17));
        round_trip_reskey(ResKey::RIdWithSuffix(17, "/c".into()));
    }

    #[test]
    fn sub_info_round_trip() {
        let info = SubInfo {
            reliability: Reliability::Reliable,
            mode: SubMode::Pull,
            period: Some(Period {
                origin: 1,
                period: 2,
                duration: 3,
            }),
        };
        let mut w = WBuf::new();
        encode_sub_info(&mut w, &info);
        let bytes = w.into_vec();
        let mut r = RBuf::new(&bytes);
        assert_eq!(decode_sub_info(&mut r).unwrap(), info);
    }

    #[test]
    fn query_consolidation_round_trip() {
        let c = QueryConsolidation::default();
        let mut w = WBuf::new();
        encode_query_consolidation(&mut w, &c);
        let bytes = w.into_vec();
        let mut r = RBuf::new(&bytes);
        assert_eq!(decode_query_consolidation(&mut r).unwrap(), c);
    }
}
