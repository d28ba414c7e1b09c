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
//! §4.8: the inbound path. One transport-message at a time is decoded off
//! the link and routed here; `FRAME`s are unwrapped to their SN-window check
//! and, fragment or whole, handed to the zenoh-message router.
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::Ordering;

use zlite_core::core_types::{DataKind, Reliability};
use zlite_core::zint::ZInt;
use zlite_link::Link;
use zlite_transport::{accept_inbound_sn, SessionLifecycle};
use zlite_wire::buf::RBuf;
use zlite_wire::codec::decode_zenoh_message;
use zlite_wire::transport::{CloseReason, FramePayload, TransportMessage};
use zlite_wire::zenoh::{Declaration, ZenohMessage};

use crate::registry::Scope;
use crate::session::Inner;
use crate::types::{Query, Reply, Sample};

/// In-flight fragment reassembly, one slot per reliability lane: §4.7's
/// `build_frames` gives every fragment of one logical message the same SN,
/// so a lane can have at most one partially-reassembled message at a time.
#[derive(Default)]
pub struct ReassemblyState {
    reliable: Option<(ZInt, Vec<u8>)>,
    best_effort: Option<(ZInt, Vec<u8>)>,
}

fn reads_transport_message(link: &dyn Link) -> zlite_core::error::ZResult<TransportMessage> {
    if link.is_streamed() {
        let mut len_bytes = Vec::new();
        loop {
            let mut b = [0u8; 1];
            link.read_exact(&mut b)?;
            let more = b[0] & 0x80 != 0;
            len_bytes.push(b[0]);
            if !more {
                break;
            }
        }
        let (len, _) = zlite_core::zint::decode_zint(&len_bytes)?;
        let mut body = vec![0u8; len as usize];
        link.read_exact(&mut body)?;
        let mut r = RBuf::new(&body);
        let msg = zlite_wire::codec::decode_transport_message(&mut r)?;
        r.expect_exhausted()?;
        Ok(msg)
    } else {
        let mut buf = vec![0u8; link.mtu()];
        let n = link.read(&mut buf)?;
        let mut r = RBuf::new(&buf[..n]);
        zlite_wire::codec::decode_transport_message(&mut r)
    }
}

/// Pumps exactly one inbound transport-message off `inner`'s link (§6
/// `read(session)`). Blocks on the socket read.
pub fn read_one(inner: &Inner) -> zlite_core::error::ZResult<()> {
    let msg = inner
        .state
        .with_link(reads_transport_message)
        .ok_or_else(|| {
            zlite_core::error::ZError::new(
                zlite_core::error::ZErrorKind::StateError {
                    descr: "no link attached to session".into(),
                },
                file!(),
                line!(),
            )
        })??;
    dispatch_transport_message(inner, msg);
    Ok(())
}

fn accept_frame(inner: &Inner, reliability: Reliability, sn: ZInt) -> bool {
    let counter = match reliability {
        Reliability::Reliable => &inner.state.sn.rx_reliable,
        Reliability::BestEffort => &inner.state.sn.rx_best_effort,
    };
    let expected = counter.load(Ordering::SeqCst);
    let accepted = accept_inbound_sn(inner.state.sn_resolution_half, inner.state.sn_resolution, expected, sn);
    if accepted {
        counter.store((sn + 1) % inner.state.sn_resolution, Ordering::SeqCst);
    }
    accepted
}

pub fn dispatch_transport_message(inner: &Inner, msg: TransportMessage) {
    match msg {
        TransportMessage::Frame { reliability, sn, payload } => handle_frame(inner, reliability, sn, payload),
        TransportMessage::KeepAlive => {
            *inner.last_seen.lock().unwrap() = inner.clock.now();
        }
        TransportMessage::Close { reason, .. } => {
            log::info!("session {} closed by peer: {:?}", inner.id, reason);
            inner.state.set_lifecycle(SessionLifecycle::Closed);
            for pending in inner.registry.drain_pending_queries() {
                pending.cancel();
            }
        }
        other => {
            log::warn!("unexpected transport message on established link: {:?}", other);
        }
    }
}

fn handle_frame(inner: &Inner, reliability: Reliability, sn: ZInt, payload: FramePayload) {
    let is_continuation = match &payload {
        FramePayload::Fragment { .. } => {
            let reassembly = inner.reassembly.lock().unwrap();
            let slot = match reliability {
                Reliability::Reliable => &reassembly.reliable,
                Reliability::BestEffort => &reassembly.best_effort,
            };
            slot.as_ref().map(|(s, _)| *s == sn).unwrap_or(false)
        }
        FramePayload::Messages(_) => false,
    };

    if !is_continuation && !accept_frame(inner, reliability, sn) {
        match reliability {
            Reliability::Reliable => {
                log::warn!("reliable sn {} out of window, closing session {}", sn, inner.id);
                inner.state.with_link(|l| {
                    let mut w = zlite_wire::buf::WBuf::new();
                    let _ = zlite_wire::codec::encode_transport_message(
                        &mut w,
                        &TransportMessage::Close {
                            reason: CloseReason::Invalid,
                            link_only: false,
                        },
                    );
                    let _ = l.write_all(&w.into_vec());
                });
                inner.state.set_lifecycle(SessionLifecycle::Closed);
            }
            Reliability::BestEffort => {
                log::debug!("best-effort frame with sn {} dropped: outside window", sn);
            }
        }
        return;
    }

    match payload {
        FramePayload::Messages(msgs) => {
            for m in msgs {
                dispatch_zenoh_message(inner, m);
            }
        }
        FramePayload::Fragment { more, data } => {
            let assembled = {
                let mut reassembly = inner.reassembly.lock().unwrap();
                let slot = match reliability {
                    Reliability::Reliable => &mut reassembly.reliable,
                    Reliability::BestEffort => &mut reassembly.best_effort,
                };
                let buf = match slot {
                    Some((s, b)) if *s == sn => b,
                    _ => {
                        *slot = Some((sn, Vec::new()));
                        &mut slot.as_mut().unwrap().1
                    }
                };
                buf.extend_from_slice(&data);
                if more {
                    None
                } else {
                    slot.take().map(|(_, b)| b)
                }
            };
            if let Some(bytes) = assembled {
                let mut r = RBuf::new(&bytes);
                match decode_zenoh_message(&mut r) {
                    Ok(m) => dispatch_zenoh_message(inner, m),
                    Err(e) => log::warn!("failed to decode reassembled message: {}", e),
                }
            }
        }
    }
}

fn invoke<F: FnOnce() + std::panic::UnwindSafe>(what: &str, f: F) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        log::error!("{} panicked; continuing the dispatch loop", what);
    }
}

fn dispatch_zenoh_message(inner: &Inner, msg: ZenohMessage) {
    match msg {
        ZenohMessage::Declare { declarations } => {
            for decl in declarations {
                apply_remote_declaration(inner, decl);
            }
        }
        ZenohMessage::Data { key, payload, data_info, reply_context, .. } => {
            let resname = match inner.registry.resolve_name(Scope::Remote, &key) {
                Ok(n) => n,
                Err(e) => {
                    log::error!("received Data for unknown reskey: {}", e);
                    return;
                }
            };
            let sample = Sample {
                res_name: resname.clone(),
                payload,
                kind: data_info.as_ref().map(|i| i.kind).unwrap_or(DataKind::Put),
                encoding: data_info.as_ref().and_then(|i| i.encoding.clone()),
                timestamp: data_info.as_ref().and_then(|i| i.timestamp),
                source_id: data_info.as_ref().and_then(|i| i.source_id.clone()),
            };
            match reply_context {
                Some(ctx) => {
                    let timestamp = sample.timestamp.unwrap_or(0);
                    let reply = Reply {
                        data: sample,
                        source_kind: ctx.source_kind,
                        replier_id: ctx.replier_id,
                    };
                    let is_final = ctx.is_final;
                    let finished = inner
                        .registry
                        .with_pending_query(ctx.qid, |pq| {
                            pq.handle_data(reply, timestamp);
                            if is_final {
                                pq.handle_final();
                            }
                            is_final
                        })
                        .unwrap_or(false);
                    if finished {
                        inner.registry.unregister_pending_query(ctx.qid);
                    }
                }
                None => {
                    for (_reskey, handler) in inner.registry.subscriptions_matching(&resname) {
                        let sample = sample.clone();
                        invoke("subscriber callback", move || handler(sample));
                    }
                }
            }
        }
        ZenohMessage::Unit { reply_context, .. } => {
            if let Some(ctx) = reply_context {
                if ctx.is_final {
                    if let Some(pending) = inner.registry.unregister_pending_query(ctx.qid) {
                        pending.handle_final();
                    }
                }
            }
        }
        ZenohMessage::Query { key, predicate, qid, target, .. } => {
            let resname = match inner.registry.resolve_name(Scope::Remote, &key) {
                Ok(n) => n,
                Err(e) => {
                    log::error!("received Query for unknown reskey: {}", e);
                    return;
                }
            };
            let matches = inner.registry.queryables_matching(&resname, target.kind);
            for (replier_kind, handler) in matches {
                let query = Query {
                    res_name: resname.clone(),
                    predicate: predicate.clone(),
                    session_id: inner.id,
                    qid,
                    replier_kind,
                };
                invoke("queryable callback", move || handler(query));
                crate::session::send_query_final(inner.id, qid, replier_kind);
            }
        }
        ZenohMessage::Pull { .. } => {
            log::debug!("ignoring inbound Pull: pull-mode routing to this client is out of scope");
        }
    }
}

fn apply_remote_declaration(inner: &Inner, decl: Declaration) {
    match decl {
        Declaration::Resource { rid, key } => {
            if let Err(e) = inner.registry.register_resource(Scope::Remote, rid, &key) {
                log::warn!("ignoring inconsistent remote Resource declaration: {}", e);
            }
        }
        Declaration::ForgetResource { rid } => inner.registry.forget_resource(Scope::Remote, rid),
        Declaration::Publisher { key } => apply_remote_name(inner, &key, |r, n| r.apply_remote_publisher(n)),
        Declaration::ForgetPublisher { key } => apply_remote_name(inner, &key, |r, n| r.forget_remote_publisher(&n)),
        Declaration::Subscriber { key, .. } => apply_remote_name(inner, &key, |r, n| r.apply_remote_subscriber(n)),
        Declaration::ForgetSubscriber { key } => apply_remote_name(inner, &key, |r, n| r.forget_remote_subscriber(&n)),
        Declaration::Queryable { key, .. } => apply_remote_name(inner, &key, |r, n| r.apply_remote_queryable(n)),
        Declaration::ForgetQueryable { key } => apply_remote_name(inner, &key, |r, n| r.forget_remote_queryable(&n)),
    }
}

fn apply_remote_name(inner: &Inner, key: &zlite_core::core_types::ResKey, f: impl FnOnce(&crate::registry::Registry, String)) {
    match inner.registry.resolve_name(Scope::Remote, key) {
        Ok(name) => f(&inner.registry, name),
        Err(e) => log::warn!("ignoring remote declaration with unresolvable key: {}", e),
    }
}
