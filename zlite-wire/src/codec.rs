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
//! `encode(decode(m)) == m` for every well-formed message. Byte-stream
//! links need an explicit frame boundary; `write_framed`/`read_framed` add
//! the zint byte-count prefix used over TCP. A UDP datagram already is one
//! frame, so the link layer there calls [`encode_transport_message`] and
//! [`decode_transport_message`] directly on the raw datagram.
use crate::buf::{RBuf, WBuf};
use crate::coretypes_codec::*;
use crate::id::{self, did, tid, zid};
use crate::transport::{CloseReason, FramePayload, TransportMessage};
use crate::zenoh::{DataInfo, Declaration, ReplyContext, ZenohMessage};
use zlite_core::core_types::*;
use zlite_core::error::{ZErrorKind, ZResult};
use zlite_core::zerror;
use zlite_core::zint::ZInt;

// ---------------------------------------------------------------- Declaration

fn encode_declaration(w: &mut WBuf, d: &Declaration) {
    match d {
        Declaration::Resource { rid, key } => {
            w.write_byte(did::RESOURCE);
            w.write_zint(*rid);
            encode_reskey(w, key);
        }
        Declaration::ForgetResource { rid } => {
            w.write_byte(did::FORGET_RESOURCE);
            w.write_zint(*rid);
        }
        Declaration::Publisher { key } => {
            w.write_byte(did::PUBLISHER);
            encode_reskey(w, key);
        }
        Declaration::ForgetPublisher { key } => {
            w.write_byte(did::FORGET_PUBLISHER);
            encode_reskey(w, key);
        }
        Declaration::Subscriber { key, info } => {
            w.write_byte(did::SUBSCRIBER);
            encode_reskey(w, key);
            encode_sub_info(w, info);
        }
        Declaration::ForgetSubscriber { key } => {
            w.write_byte(did::FORGET_SUBSCRIBER);
            encode_reskey(w, key);
        }
        Declaration::Queryable { key, info } => {
            w.write_byte(did::QUERYABLE);
            encode_reskey(w, key);
            encode_queryable_info(w, info);
        }
        Declaration::ForgetQueryable { key } => {
            w.write_byte(did::FORGET_QUERYABLE);
            encode_reskey(w, key);
        }
    }
}

fn decode_declaration(r: &mut RBuf) -> ZResult<Declaration> {
    match r.read_byte()? {
        did::RESOURCE => Ok(Declaration::Resource {
            rid: r.read_zint()?,
            key: decode_reskey(r)?,
        }),
        did::FORGET_RESOURCE => Ok(Declaration::ForgetResource { rid: r.read_zint()? }),
        did::PUBLISHER => Ok(Declaration::Publisher { key: decode_reskey(r)? }),
        did::FORGET_PUBLISHER => Ok(Declaration::ForgetPublisher { key: decode_reskey(r)? }),
        did::SUBSCRIBER => Ok(Declaration::Subscriber {
            key: decode_reskey(r)?,
            info: decode_sub_info(r)?,
        }),
        did::FORGET_SUBSCRIBER => Ok(Declaration::ForgetSubscriber { key: decode_reskey(r)? }),
        did::QUERYABLE => Ok(Declaration::Queryable {
            key: decode_reskey(r)?,
            info: decode_queryable_info(r)?,
        }),
        did::FORGET_QUERYABLE => Ok(Declaration::ForgetQueryable { key: decode_reskey(r)? }),
        other => zerror!(ZErrorKind::ProtocolError {
            descr: format!("unknown declaration id {}", other)
        }),
    }
}

// ---------------------------------------------------------------- DataInfo / ReplyContext

fn encode_data_info(w: &mut WBuf, info: &DataInfo) {
    match &info.source_id {
        None => w.write_byte(0),
        Some(pid) => {
            w.write_byte(1);
            encode_peer_id(w, pid);
        }
    }
    match info.source_sn {
        None => w.write_byte(0),
        Some(sn) => {
            w.write_byte(1);
            w.write_zint(sn);
        }
    }
    match info.timestamp {
        None => w.write_byte(0),
        Some(ts) => {
            w.write_byte(1);
            w.write_zint(ts);
        }
    }
    w.write_byte(match info.kind {
        DataKind::Put => 0,
        DataKind::Delete => 1,
    });
    match &info.encoding {
        None => w.write_byte(0),
        Some(enc) => {
            w.write_byte(1);
            encode_encoding(w, enc);
        }
    }
}

fn decode_data_info(r: &mut RBuf) -> ZResult<DataInfo> {
    let source_id = match r.read_byte()? {
        0 => None,
        1 => Some(decode_peer_id(r)?),
        other => {
            return zerror!(ZErrorKind::ProtocolError {
                descr: format!("unknown option tag {}", other)
            })
        }
    };
    let source_sn = match r.read_byte()? {
        0 => None,
        1 => Some(r.read_zint()?),
        other => {
            return zerror!(ZErrorKind::ProtocolError {
                descr: format!("unknown option tag {}", other)
            })
        }
    };
    let timestamp = match r.read_byte()? {
        0 => None,
        1 => Some(r.read_zint()?),
        other => {
            return zerror!(ZErrorKind::ProtocolError {
                descr: format!("unknown option tag {}", other)
            })
        }
    };
    let kind = match r.read_byte()? {
        0 => DataKind::Put,
        1 => DataKind::Delete,
        other => {
            return zerror!(ZErrorKind::ProtocolError {
                descr: format!("unknown data kind tag {}", other)
            })
        }
    };
    let encoding = match r.read_byte()? {
        0 => None,
        1 => Some(decode_encoding(r)?),
        other => {
            return zerror!(ZErrorKind::ProtocolError {
                descr: format!("unknown option tag {}", other)
            })
        }
    };
    Ok(DataInfo {
        source_id,
        source_sn,
        timestamp,
        kind,
        encoding,
    })
}

fn encode_reply_context(w: &mut WBuf, ctx: &ReplyContext) {
    w.write_byte(id::header(0, if ctx.is_final { id::FLAG_FINAL } else { 0 }));
    w.write_zint(ctx.qid);
    w.write_zint(ctx.source_kind);
    match &ctx.replier_id {
        None => w.write_byte(0),
        Some(pid) => {
            w.write_byte(1);
            encode_peer_id(w, pid);
        }
    }
}

fn decode_reply_context(r: &mut RBuf) -> ZResult<ReplyContext> {
    let (_, flags) = id::split_header(r.read_byte()?);
    let is_final = flags & id::FLAG_FINAL != 0;
    let qid = r.read_zint()?;
    let source_kind = r.read_zint()?;
    let replier_id = match r.read_byte()? {
        0 => None,
        1 => Some(decode_peer_id(r)?),
        other => {
            return zerror!(ZErrorKind::ProtocolError {
                descr: format!("unknown option tag {}", other)
            })
        }
    };
    Ok(ReplyContext {
        qid,
        source_kind,
        replier_id,
        is_final,
    })
}

// ---------------------------------------------------------------- ZenohMessage

pub fn encode_zenoh_message(w: &mut WBuf, msg: &ZenohMessage) {
    match msg {
        ZenohMessage::Declare { declarations } => {
            w.write_byte(id::header(zid::DECLARE, 0));
            w.write_zint(declarations.len() as ZInt);
            for d in declarations {
                encode_declaration(w, d);
            }
        }
        ZenohMessage::Data {
            key,
            payload,
            data_info,
            congestion_control,
            reply_context,
        } => {
            let mut flags = 0u8;
            if data_info.is_some() {
                flags |= id::FLAG_I;
            }
            if *congestion_control == CongestionControl::Drop {
                flags |= id::FLAG_D;
            }
            if reply_context.is_some() {
                flags |= id::FLAG_REPLY;
            }
            w.write_byte(id::header(zid::DATA, flags));
            encode_reskey(w, key);
            if let Some(ctx) = reply_context {
                encode_reply_context(w, ctx);
            }
            if let Some(info) = data_info {
                encode_data_info(w, info);
            }
            w.write_bytes(payload);
        }
        ZenohMessage::Unit {
            congestion_control,
            reply_context,
        } => {
            let mut flags = 0u8;
            if *congestion_control == CongestionControl::Drop {
                flags |= id::FLAG_D;
            }
            if reply_context.is_some() {
                flags |= id::FLAG_REPLY;
            }
            w.write_byte(id::header(zid::UNIT, flags));
            if let Some(ctx) = reply_context {
                encode_reply_context(w, ctx);
            }
        }
        ZenohMessage::Pull {
            key,
            pull_id,
            max_samples,
            is_final,
        } => {
            w.write_byte(id::header(zid::PULL, if *is_final { id::FLAG_FINAL } else { 0 }));
            encode_reskey(w, key);
            w.write_zint(*pull_id);
            match max_samples {
                None => w.write_byte(0),
                Some(n) => {
                    w.write_byte(1);
                    w.write_zint(*n);
                }
            }
        }
        ZenohMessage::Query {
            key,
            predicate,
            qid,
            target,
            consolidation,
        } => {
            w.write_byte(id::header(zid::QUERY, 0));
            encode_reskey(w, key);
            w.write_string(predicate);
            w.write_zint(*qid);
            encode_query_target(w, target);
            encode_query_consolidation(w, consolidation);
        }
    }
}

pub fn decode_zenoh_message(r: &mut RBuf) -> ZResult<ZenohMessage> {
    let (mid, flags) = id::split_header(r.read_byte()?);
    match mid {
        zid::DECLARE => {
            let n = r.read_zint()? as usize;
            let mut declarations = Vec::with_capacity(n);
            for _ in 0..n {
                declarations.push(decode_declaration(r)?);
            }
            Ok(ZenohMessage::Declare { declarations })
        }
        zid::DATA => {
            let key = decode_reskey(r)?;
            let reply_context = if flags & id::FLAG_REPLY != 0 {
                Some(decode_reply_context(r)?)
            } else {
                None
            };
            let data_info = if flags & id::FLAG_I != 0 {
                Some(decode_data_info(r)?)
            } else {
                None
            };
            let congestion_control = if flags & id::FLAG_D != 0 {
                CongestionControl::Drop
            } else {
                CongestionControl::Block
            };
            let payload = r.read_bytes()?;
            Ok(ZenohMessage::Data {
                key,
                payload,
                data_info,
                congestion_control,
                reply_context,
            })
        }
        zid::UNIT => {
            let reply_context = if flags & id::FLAG_REPLY != 0 {
                Some(decode_reply_context(r)?)
            } else {
                None
            };
            let congestion_control = if flags & id::FLAG_D != 0 {
                CongestionControl::Drop
            } else {
                CongestionControl::Block
            };
            Ok(ZenohMessage::Unit {
                congestion_control,
                reply_context,
            })
        }
        zid::PULL => {
            let key = decode_reskey(r)?;
            let pull_id = r.read_zint()?;
            let max_samples = match r.read_byte()? {
                0 => None,
                1 => Some(r.read_zint()?),
                other => {
                    return zerror!(ZErrorKind::ProtocolError {
                        descr: format!("unknown option tag {}", other)
                    })
                }
            };
            Ok(ZenohMessage::Pull {
                key,
                pull_id,
                max_samples,
                is_final: flags & id::FLAG_FINAL != 0,
            })
        }
        zid::QUERY => {
            let key = decode_reskey(r)?;
            let predicate = r.read_string()?;
            let qid = r.read_zint()?;
            let target = decode_query_target(r)?;
            let consolidation = decode_query_consolidation(r)?;
            Ok(ZenohMessage::Query {
                key,
                predicate,
                qid,
                target,
                consolidation,
            })
        }
        other => zerror!(ZErrorKind::ProtocolError {
            descr: format!("unknown zenoh message id {}", other)
        }),
    }
}

// ---------------------------------------------------------------- TransportMessage

fn encode_close_reason(reason: CloseReason) -> u8 {
    match reason {
        CloseReason::Generic => 0,
        CloseReason::Invalid => 1,
        CloseReason::Unsupported => 2,
        CloseReason::Expired => 3,
        CloseReason::MaxSessions => 4,
        CloseReason::MaxLinks => 5,
    }
}

fn decode_close_reason(b: u8) -> ZResult<CloseReason> {
    match b {
        0 => Ok(CloseReason::Generic),
        1 => Ok(CloseReason::Invalid),
        2 => Ok(CloseReason::Unsupported),
        3 => Ok(CloseReason::Expired),
        4 => Ok(CloseReason::MaxSessions),
        5 => Ok(CloseReason::MaxLinks),
        other => zerror!(ZErrorKind::ProtocolError {
            descr: format!("unknown close reason {}", other)
        }),
    }
}

pub fn encode_transport_message(w: &mut WBuf, msg: &TransportMessage) -> ZResult<()> {
    match msg {
        TransportMessage::InitSyn {
            version,
            whatami,
            pid,
            sn_resolution,
        } => {
            let flags = if sn_resolution.is_some() { id::FLAG_S } else { 0 };
            w.write_byte(id::header(tid::INIT, flags));
            w.write_byte(*version);
            w.write_zint(*whatami);
            encode_peer_id(w, pid);
            if let Some(sn) = sn_resolution {
                w.write_zint(*sn);
            }
        }
        TransportMessage::InitAck {
            version,
            whatami,
            pid,
            sn_resolution,
            cookie,
        } => {
            let mut flags = id::FLAG_A;
            if sn_resolution.is_some() {
                flags |= id::FLAG_S;
            }
            w.write_byte(id::header(tid::INIT, flags));
            w.write_byte(*version);
            w.write_zint(*whatami);
            encode_peer_id(w, pid);
            if let Some(sn) = sn_resolution {
                w.write_zint(*sn);
            }
            w.write_bytes(cookie);
        }
        TransportMessage::OpenSyn {
            lease,
            initial_sn,
            cookie,
        } => {
            w.write_byte(id::header(tid::OPEN, 0));
            w.write_zint(*lease);
            w.write_zint(*initial_sn);
            w.write_bytes(cookie);
        }
        TransportMessage::OpenAck { lease, initial_sn } => {
            w.write_byte(id::header(tid::OPEN, id::FLAG_A));
            w.write_zint(*lease);
            w.write_zint(*initial_sn);
        }
        TransportMessage::Close { reason, link_only } => {
            w.write_byte(id::header(tid::CLOSE, if *link_only { id::FLAG_A } else { 0 }));
            w.write_byte(encode_close_reason(*reason));
        }
        TransportMessage::KeepAlive => {
            w.write_byte(id::header(tid::KEEP_ALIVE, 0));
        }
        TransportMessage::Frame {
            reliability,
            sn,
            payload,
        } => {
            let mut flags = if *reliability == Reliability::Reliable {
                id::FLAG_R
            } else {
                0
            };
            if matches!(payload, FramePayload::Fragment { .. }) {
                flags |= id::FLAG_F;
            }
            w.write_byte(id::header(tid::FRAME, flags));
            w.write_zint(*sn);
            match payload {
                FramePayload::Messages(msgs) => {
                    w.write_zint(msgs.len() as ZInt);
                    for m in msgs {
                        encode_zenoh_message(w, m);
                    }
                }
                FramePayload::Fragment { more, data } => {
                    w.write_byte(if *more { 1 } else { 0 });
                    w.write_bytes(data);
                }
            }
        }
        TransportMessage::Scout { what, pid_request } => {
            w.write_byte(id::header(tid::SCOUT, if *pid_request { id::FLAG_W } else { 0 }));
            w.write_zint(*what);
        }
        TransportMessage::Hello {
            pid,
            whatami,
            locators,
        } => {
            let mut flags = 0;
            if pid.is_some() {
                flags |= id::FLAG_HELLO_I;
            }
            if !locators.is_empty() {
                flags |= id::FLAG_HELLO_L;
            }
            w.write_byte(id::header(tid::HELLO, flags));
            if let Some(pid) = pid {
                encode_peer_id(w, pid);
            }
            w.write_zint(*whatami);
            if !locators.is_empty() {
                w.write_zint(locators.len() as ZInt);
                for loc in locators {
                    w.write_string(loc);
                }
            }
        }
    }
    Ok(())
}

pub fn decode_transport_message(r: &mut RBuf) -> ZResult<TransportMessage> {
    let (mid, flags) = id::split_header(r.read_byte()?);
    match mid {
        tid::INIT => {
            let version = r.read_byte()?;
            let whatami = r.read_zint()?;
            let pid = decode_peer_id(r)?;
            let sn_resolution = if flags & id::FLAG_S != 0 {
                Some(r.read_zint()?)
            } else {
                None
            };
            if flags & id::FLAG_A != 0 {
                let cookie = r.read_bytes()?;
                Ok(TransportMessage::InitAck {
                    version,
                    whatami,
                    pid,
                    sn_resolution,
                    cookie,
                })
            } else {
                Ok(TransportMessage::InitSyn {
                    version,
                    whatami,
                    pid,
                    sn_resolution,
                })
            }
        }
        tid::OPEN => {
            let lease = r.read_zint()?;
            let initial_sn = r.read_zint()?;
            if flags & id::FLAG_A != 0 {
                Ok(TransportMessage::OpenAck { lease, initial_sn })
            } else {
                let cookie = r.read_bytes()?;
                Ok(TransportMessage::OpenSyn {
                    lease,
                    initial_sn,
                    cookie,
                })
            }
        }
        tid::CLOSE => {
            let reason = decode_close_reason(r.read_byte()?)?;
            Ok(TransportMessage::Close {
                reason,
                link_only: flags & id::FLAG_A != 0,
            })
        }
        tid::KEEP_ALIVE => Ok(TransportMessage::KeepAlive),
        tid::FRAME => {
            let reliability = if flags & id::FLAG_R != 0 {
                Reliability::Reliable
            } else {
                Reliability::BestEffort
            };
            let sn = r.read_zint()?;
            let payload = if flags & id::FLAG_F != 0 {
                let more = r.read_byte()? != 0;
                let data = r.read_bytes()?;
                FramePayload::Fragment { more, data }
            } else {
                let n = r.read_zint()? as usize;
                let mut msgs = Vec::with_capacity(n);
                for _ in 0..n {
                    msgs.push(decode_zenoh_message(r)?);
                }
                FramePayload::Messages(msgs)
            };
            Ok(TransportMessage::Frame {
                reliability,
                sn,
                payload,
            })
        }
        tid::SCOUT => {
            let what = r.read_zint()?;
            Ok(TransportMessage::Scout {
                what,
                pid_request: flags & id::FLAG_W != 0,
            })
        }
        tid::HELLO => {
            let pid = if flags & id::FLAG_HELLO_I != 0 {
                Some(decode_peer_id(r)?)
            } else {
                None
            };
            let whatami = r.read_zint()?;
            let locators = if flags & id::FLAG_HELLO_L != 0 {
                let n = r.read_zint()? as usize;
                let mut locs = Vec::with_capacity(n);
                for _ in 0..n {
                    locs.push(r.read_string()?);
                }
                locs
            } else {
                Vec::new()
            };
            Ok(TransportMessage::Hello {
                pid,
                whatami,
                locators,
            })
        }
        other => zerror!(ZErrorKind::ProtocolError {
            descr: format!("unknown transport message id {}", other)
        }),
    }
}

/// Encodes `msg` and prefixes it with a zint byte-count, as required for a
/// byte-stream (TCP) link.
pub fn write_framed(msg: &TransportMessage) -> ZResult<Vec<u8>> {
    let mut body = WBuf::new();
    encode_transport_message(&mut body, msg)?;
    let body = body.into_vec();
    let mut framed = WBuf::new();
    framed.write_zint(body.len() as ZInt);
    framed.write_slice_raw(&body);
    Ok(framed.into_vec())
}

/// Reads one length-prefixed frame from `buf`, returning the message and the
/// number of bytes of `buf` it consumed.
pub fn read_framed(buf: &[u8]) -> ZResult<(TransportMessage, usize)> {
    let mut r = RBuf::new(buf);
    let len = r.read_zint()? as usize;
    let header_len = buf.len() - r.remaining();
    let body = r.read_slice_raw(len)?;
    let mut br = RBuf::new(body);
    let msg = decode_transport_message(&mut br)?;
    br.expect_exhausted()?;
    Ok((msg, header_len + len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(msg: TransportMessage) {
        let mut w = WBuf::new();
        encode_transport_message(&mut w, &msg).unwrap();
        let bytes = w.into_vec();
        let mut r = RBuf::new(&bytes);
        let decoded = decode_transport_message(&mut r).unwrap();
        assert_eq!(decoded, msg);
        r.expect_exhausted().unwrap();
    }

    #[test]
    fn init_syn_and_ack_round_trip() {
        round_trip(TransportMessage::InitSyn {
            version: 1,
            whatami: whatami::CLIENT,
            pid: PeerId::from_slice(&[1, 2, 3]),
            sn_resolution: None,
        });
        round_trip(TransportMessage::InitAck {
            version: 1,
            whatami: whatami::ROUTER,
            pid: PeerId::from_slice(&[9, 9]),
            sn_resolution: Some(1 << 28),
            cookie: vec![0xAA, 0xBB],
        });
    }

    #[test]
    fn open_and_close_and_keepalive_round_trip() {
        round_trip(TransportMessage::OpenSyn {
            lease: 10_000,
            initial_sn: 42,
            cookie: vec![1, 2, 3],
        });
        round_trip(TransportMessage::OpenAck {
            lease: 10_000,
            initial_sn: 43,
        });
        round_trip(TransportMessage::Close {
            reason: CloseReason::Invalid,
            link_only: false,
        });
        round_trip(TransportMessage::KeepAlive);
    }

    #[test]
    fn scout_and_hello_round_trip() {
        round_trip(TransportMessage::Scout {
            what: whatami::ROUTER | whatami::PEER,
            pid_request: true,
        });
        round_trip(TransportMessage::Scout {
            what: whatami::ROUTER,
            pid_request: false,
        });
        round_trip(TransportMessage::Hello {
            pid: Some(PeerId::from_slice(&[7, 7])),
            whatami: whatami::ROUTER,
            locators: vec!["tcp/127.0.0.1:7447".to_string()],
        });
        round_trip(TransportMessage::Hello {
            pid: None,
            whatami: whatami::PEER,
            locators: Vec::new(),
        });
    }

    #[test]
    fn frame_with_data_message_round_trips() {
        let data = ZenohMessage::Data {
            key: ResKey::RId(7),
            payload: b"hello".to_vec(),
            data_info: Some(DataInfo {
                kind: DataKind::Put,
                ..Default::default()
            }),
            congestion_control: CongestionControl::Drop,
            reply_context: None,
        };
        round_trip(TransportMessage::Frame {
            reliability: Reliability::Reliable,
            sn: 5,
            payload: FramePayload::Messages(vec![data]),
        });
    }

    #[test]
    fn fragmented_frame_round_trips() {
        round_trip(TransportMessage::Frame {
            reliability: Reliability::BestEffort,
            sn: 1,
            payload: FramePayload::Fragment {
                more: true,
                data: vec![1, 2, 3, 4],
            },
        });
    }

    #[test]
    fn declare_message_round_trips() {
        let msg = ZenohMessage::Declare {
            declarations: vec![
                Declaration::Resource {
                    rid: 17,
                    key: ResKey::RName("/a/b".into()),
                },
                Declaration::Subscriber {
                    key: ResKey::RId(17),
                    info: SubInfo::default(),
                },
            ],
        };
        let mut w = WBuf::new();
        encode_zenoh_message(&mut w, &msg);
        let bytes = w.into_vec();
        let mut r = RBuf::new(&bytes);
        assert_eq!(decode_zenoh_message(&mut r).unwrap(), msg);
    }

    #[test]
    fn query_message_round_trips() {
        let msg = ZenohMessage::Query {
            key: ResKey::RName("/sensors/**".into()),
            predicate: "".into(),
            qid: 1,
            target: QueryTarget::default(),
            consolidation: QueryConsolidation::default(),
        };
        let mut w = WBuf::new();
        encode_zenoh_message(&mut w, &msg);
        let bytes = w.into_vec();
        let mut r = RBuf::new(&bytes);
        assert_eq!(decode_zenoh_message(&mut r).unwrap(), msg);
    }

    #[test]
    fn framed_round_trip_over_byte_stream() {
        let msg = TransportMessage::KeepAlive;
        let framed = write_framed(&msg).unwrap();
        let (decoded, consumed) = read_framed(&framed).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(consumed, framed.len());
    }

    #[test]
    fn unknown_message_id_is_protocol_error() {
        let bytes = [id::header(0x1F, 0)];
        let mut r = RBuf::new(&bytes);
        assert!(decode_transport_message(&mut r).is_err());
    }
}
