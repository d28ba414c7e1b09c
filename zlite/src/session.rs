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
//! The public `Session` handle (§6). Mirrors the teacher's
//! `zenoh::net::Session` surface: `declare_*`/`undeclare_*`, `write`,
//! `query`/`query_collect`, `pull`, plus `read`/`run`/`send_keep_alive`
//! which the teacher's async runtime does for you but this core, having no
//! executor, exposes directly.
//!
//! Handles returned to callers ([`Publisher`], [`Subscriber`], [`Queryable`])
//! carry only a session id (Design Note, `spec.md` §9): every operation on
//! them looks the owning [`Inner`] up in [`SESSIONS`] by that id, so a stale
//! handle outlives a closed session without dangling, failing instead with
//! `StateError`.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use lazy_static::lazy_static;

use zlite_core::capability::{Clock, OsPrng, Prng, SystemClock};
use zlite_core::config::Config;
use zlite_core::core_types::{
    whatami, CongestionControl, DataKind, Encoding, PeerId, QueryTarget, QueryableInfo, Reliability, ResKey,
    ResourceId, SubInfo,
};
use zlite_core::error::{ZErrorKind, ZResult};
use zlite_core::zerror;
use zlite_core::zint::ZInt;
use zlite_transport::{self, SessionLifecycle, SessionState};
use zlite_wire::transport::CloseReason;
use zlite_wire::zenoh::{Declaration, DataInfo, ReplyContext, ZenohMessage};

use crate::dispatch::{self, ReassemblyState};
use crate::query::{CallbackSink, CollectOutcome, CollectSink, PendingQuery};
use crate::registry::{EntityId, PublisherEntry, QueryableEntry, Registry, Scope, SubscriberEntry};
use crate::types::{
    boxed_data_handler, boxed_query_handler, boxed_reply_handler, Publisher, Query, QueryArgs, QueryEvent, Queryable,
    Reply, Sample, SessionInfo, Subscriber,
};

lazy_static! {
    static ref SESSIONS: Mutex<HashMap<u64, Arc<Inner>>> = Mutex::new(HashMap::new());
}
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// State private to one open session: the transport, the registry, and the
/// capabilities (clock) it was opened with.
pub(crate) struct Inner {
    pub(crate) id: u64,
    pub(crate) state: SessionState,
    pub(crate) registry: Registry,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) created_at: Instant,
    pub(crate) last_seen: Mutex<Instant>,
    pub(crate) reassembly: Mutex<ReassemblyState>,
}

impl Inner {
    fn now_millis(&self) -> u64 {
        self.clock.now().saturating_duration_since(self.created_at).as_millis() as u64
    }
}

fn lookup(session_id: u64) -> ZResult<Arc<Inner>> {
    SESSIONS.lock().unwrap().get(&session_id).cloned().ok_or_else(|| {
        zlite_core::error::ZError::new(
            ZErrorKind::StateError {
                descr: "operation on a closed or unknown session".into(),
            },
            file!(),
            line!(),
        )
    })
}

fn ensure_established(inner: &Inner) -> ZResult<()> {
    if inner.state.is_closed() {
        return zerror!(ZErrorKind::StateError {
            descr: "operation on a closed session".into()
        });
    }
    Ok(())
}

fn send(inner: &Inner, msg: ZenohMessage, reliability: Reliability, congestion: CongestionControl) -> ZResult<()> {
    ensure_established(inner)?;
    zlite_transport::send_zenoh_message(&inner.state, &msg, reliability, congestion, &zlite_transport::NoopOnDisconnect)
}

/// A handle to an established session. Cheap to clone: every method looks
/// the shared [`Inner`] up by id before acting.
#[derive(Clone, Copy, Debug)]
pub struct Session {
    id: u64,
}

/// §6 `open(config)`: resolves a peer (scouting if none is configured),
/// completes the `INIT`/`OPEN` handshake, and registers the resulting
/// session under a fresh id.
pub fn open(config: &Config) -> ZResult<Session> {
    open_with(config, &OsPrng, &SystemClock)
}

/// As [`open`], with injectable randomness and time (Design Note, `spec.md`
/// §9: "make the random source a session-scoped capability").
pub fn open_with(config: &Config, prng: &dyn Prng, clock: &dyn Clock) -> ZResult<Session> {
    log::trace!("open({:?})", config);
    let state = zlite_transport::open(whatami::CLIENT, config, prng, clock)?;
    let id = NEXT_SESSION_ID.fetch_add(1, Ordering::SeqCst);
    let now = clock.now();
    let inner = Arc::new(Inner {
        id,
        state,
        registry: Registry::new(),
        clock: clone_clock(clock),
        created_at: now,
        last_seen: Mutex::new(now),
        reassembly: Mutex::new(ReassemblyState::default()),
    });
    SESSIONS.lock().unwrap().insert(id, inner);
    Ok(Session { id })
}

/// [`Clock`] has no object-safe clone; sessions own a boxed capability so a
/// thin wrapper forwarding to the borrowed trait object is cheaper than
/// requiring every capability implementation to be `Clone`.
fn clone_clock(clock: &dyn Clock) -> Box<dyn Clock> {
    struct Forwarding(*const (dyn Clock + 'static));
    // Capabilities are supplied once at `open` and outlive the session; the
    // session never observes the borrowed reference drop.
    unsafe impl Send for Forwarding {}
    unsafe impl Sync for Forwarding {}
    impl Clock for Forwarding {
        fn now(&self) -> Instant {
            unsafe { (*self.0).now() }
        }
    }
    Box::new(Forwarding(clock as *const dyn Clock))
}

impl Session {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// §6 `info(session)`.
    pub fn info(&self) -> ZResult<SessionInfo> {
        let inner = lookup(self.id)?;
        Ok(SessionInfo {
            local_pid: inner.state.local_pid.clone(),
            remote_pid: inner.state.remote_pid.lock().unwrap().clone(),
        })
    }

    /// §6 `close(session)`: best-effort `CLOSE`, tears the link down, and
    /// wakes every pending query's collector with `Cancelled` (§5
    /// Cancellation).
    pub fn close(&self) -> ZResult<()> {
        log::trace!("close(session={})", self.id);
        let inner = SESSIONS.lock().unwrap().remove(&self.id).ok_or_else(|| {
            zlite_core::error::ZError::new(
                ZErrorKind::StateError {
                    descr: "session already closed".into(),
                },
                file!(),
                line!(),
            )
        })?;
        zlite_transport::close(&inner.state, CloseReason::Generic);
        for pending in inner.registry.drain_pending_queries() {
            pending.cancel();
        }
        Ok(())
    }

    /// §6 `declare_resource`: auto-assigns the next local resource id and
    /// maps it to `reskey`'s resolved name.
    pub fn declare_resource(&self, reskey: &ResKey) -> ZResult<ResourceId> {
        log::trace!("declare_resource({:?})", reskey);
        let inner = lookup(self.id)?;
        ensure_established(&inner)?;
        let rid = inner.registry.next_rid();
        let name = inner.registry.resolve_name(Scope::Local, reskey)?;
        let key: ResKey<'static> = ResKey::RName(name.into());
        inner.registry.register_resource(Scope::Local, rid, &key)?;
        send(
            &inner,
            ZenohMessage::Declare {
                declarations: vec![Declaration::Resource { rid, key }],
            },
            Reliability::Reliable,
            CongestionControl::Block,
        )?;
        Ok(rid)
    }

    /// §6 `undeclare_resource`.
    pub fn undeclare_resource(&self, rid: ResourceId) -> ZResult<()> {
        log::trace!("undeclare_resource({})", rid);
        let inner = lookup(self.id)?;
        inner.registry.forget_resource(Scope::Local, rid);
        send(
            &inner,
            ZenohMessage::Declare {
                declarations: vec![Declaration::ForgetResource { rid }],
            },
            Reliability::Reliable,
            CongestionControl::Block,
        )
    }

    /// §6 `declare_publisher`.
    pub fn declare_publisher(&self, reskey: impl Into<ResKey<'static>>) -> ZResult<Publisher> {
        let reskey = reskey.into();
        log::trace!("declare_publisher({:?})", reskey);
        let inner = lookup(self.id)?;
        ensure_established(&inner)?;
        let id = inner.registry.next_entity_id();
        inner.registry.register_publisher(PublisherEntry { id, reskey: reskey.clone() });
        send(
            &inner,
            ZenohMessage::Declare {
                declarations: vec![Declaration::Publisher { key: reskey.clone() }],
            },
            Reliability::Reliable,
            CongestionControl::Block,
        )?;
        Ok(Publisher { session_id: self.id, id, reskey })
    }

    /// §6 `undeclare_publisher`: only emits `FORGET_PUBLISHER` if no other
    /// local publisher remains declared on the same key.
    pub fn undeclare_publisher(&self, publisher: Publisher) -> ZResult<()> {
        log::trace!("undeclare_publisher({:?})", publisher);
        let inner = lookup(publisher.session_id)?;
        if let Some((entry, last)) = inner.registry.unregister_publisher(publisher.id) {
            if last {
                send(
                    &inner,
                    ZenohMessage::Declare {
                        declarations: vec![Declaration::ForgetPublisher { key: entry.reskey }],
                    },
                    Reliability::Reliable,
                    CongestionControl::Block,
                )?;
            }
        }
        Ok(())
    }

    /// §6 `declare_subscriber`.
    pub fn declare_subscriber<F>(&self, reskey: impl Into<ResKey<'static>>, info: SubInfo, handler: F) -> ZResult<Subscriber>
    where
        F: Fn(Sample) + Send + Sync + 'static,
    {
        let reskey = reskey.into();
        log::trace!("declare_subscriber({:?}, {:?})", reskey, info);
        let inner = lookup(self.id)?;
        ensure_established(&inner)?;
        let id = inner.registry.next_entity_id();
        let resname = inner.registry.resolve_name(Scope::Local, &reskey)?;
        inner.registry.register_subscriber(SubscriberEntry {
            id,
            reskey: reskey.clone(),
            resname,
            info: info.clone(),
            handler: boxed_data_handler(handler),
        });
        send(
            &inner,
            ZenohMessage::Declare {
                declarations: vec![Declaration::Subscriber { key: reskey.clone(), info }],
            },
            Reliability::Reliable,
            CongestionControl::Block,
        )?;
        Ok(Subscriber { session_id: self.id, id, reskey })
    }

    /// §6 `undeclare_subscriber`.
    pub fn undeclare_subscriber(&self, subscriber: Subscriber) -> ZResult<()> {
        log::trace!("undeclare_subscriber({:?})", subscriber);
        let inner = lookup(subscriber.session_id)?;
        if inner.registry.unregister_subscriber(subscriber.id).is_some() {
            send(
                &inner,
                ZenohMessage::Declare {
                    declarations: vec![Declaration::ForgetSubscriber { key: subscriber.reskey }],
                },
                Reliability::Reliable,
                CongestionControl::Block,
            )?;
        }
        Ok(())
    }

    /// §6 `declare_queryable`.
    pub fn declare_queryable<F>(&self, reskey: impl Into<ResKey<'static>>, kind: ZInt, handler: F) -> ZResult<Queryable>
    where
        F: Fn(Query) + Send + Sync + 'static,
    {
        let reskey = reskey.into();
        log::trace!("declare_queryable({:?}, {})", reskey, kind);
        let inner = lookup(self.id)?;
        ensure_established(&inner)?;
        let id = inner.registry.next_entity_id();
        let resname = inner.registry.resolve_name(Scope::Local, &reskey)?;
        inner.registry.register_queryable(QueryableEntry {
            id,
            reskey: reskey.clone(),
            resname,
            kind,
            handler: boxed_query_handler(handler),
        });
        send(
            &inner,
            ZenohMessage::Declare {
                declarations: vec![Declaration::Queryable {
                    key: reskey.clone(),
                    info: QueryableInfo::default(),
                }],
            },
            Reliability::Reliable,
            CongestionControl::Block,
        )?;
        Ok(Queryable { session_id: self.id, id, reskey })
    }

    /// §6 `undeclare_queryable`.
    pub fn undeclare_queryable(&self, queryable: Queryable) -> ZResult<()> {
        log::trace!("undeclare_queryable({:?})", queryable);
        let inner = lookup(queryable.session_id)?;
        if inner.registry.unregister_queryable(queryable.id).is_some() {
            send(
                &inner,
                ZenohMessage::Declare {
                    declarations: vec![Declaration::ForgetQueryable { key: queryable.reskey }],
                },
                Reliability::Reliable,
                CongestionControl::Block,
            )?;
        }
        Ok(())
    }

    /// §6 `write(reskey, payload)`.
    pub fn write(&self, reskey: impl Into<ResKey<'static>>, payload: impl Into<Vec<u8>>) -> ZResult<()> {
        self.write_ext(reskey, payload, None, DataKind::Put, CongestionControl::default())
    }

    /// §6 `write(reskey, payload, encoding, kind, cong)`.
    pub fn write_ext(
        &self,
        reskey: impl Into<ResKey<'static>>,
        payload: impl Into<Vec<u8>>,
        encoding: Option<Encoding>,
        kind: DataKind,
        congestion: CongestionControl,
    ) -> ZResult<()> {
        let reskey = reskey.into();
        log::trace!("write({:?}, [...])", reskey);
        let inner = lookup(self.id)?;
        let data_info = DataInfo {
            source_id: Some(inner.state.local_pid.clone()),
            source_sn: None,
            timestamp: Some(inner.now_millis()),
            kind,
            encoding,
        };
        send(
            &inner,
            ZenohMessage::Data {
                key: reskey,
                payload: payload.into(),
                data_info: Some(data_info),
                congestion_control: congestion,
                reply_context: None,
            },
            Reliability::Reliable,
            congestion,
        )
    }

    /// §6 `pull(subscriber)`.
    pub fn pull(&self, subscriber: &Subscriber) -> ZResult<()> {
        pull_via(subscriber.session_id, &subscriber.reskey)
    }

    /// §6 `query(reskey, predicate, target, consolidation, callback, arg)`:
    /// the asynchronous, callback-driven form.
    pub fn query<F>(&self, reskey: impl Into<ResKey<'static>>, predicate: &str, args: QueryArgs, handler: F) -> ZResult<()>
    where
        F: Fn(QueryEvent) + Send + Sync + 'static,
    {
        let sink = crate::query::CallbackSink::new(boxed_reply_handler(handler));
        self.start_query(reskey, predicate, args, sink)
    }

    /// §6 `query_collect`: blocks on the query's condition variable until
    /// `FINAL`, then returns every reply in consolidation order.
    pub fn query_collect(&self, reskey: impl Into<ResKey<'static>>, predicate: &str, args: QueryArgs) -> ZResult<Vec<Reply>> {
        let sink = CollectSink::new();
        self.start_query(reskey, predicate, args, sink.clone())?;
        match sink.wait() {
            CollectOutcome::Delivered(replies) => Ok(replies),
            CollectOutcome::Cancelled => zerror!(ZErrorKind::StateError {
                descr: "session closed while query was pending".into()
            }),
        }
    }

    fn start_query(
        &self,
        reskey: impl Into<ResKey<'static>>,
        predicate: &str,
        args: QueryArgs,
        sink: Arc<dyn crate::query::ReplySink>,
    ) -> ZResult<()> {
        let reskey = reskey.into();
        log::trace!("query({:?}, {:?})", reskey, predicate);
        let inner = lookup(self.id)?;
        ensure_established(&inner)?;
        let qid = inner.registry.next_qid();
        inner
            .registry
            .register_pending_query(PendingQuery::new(qid, args.consolidation.clone(), sink));
        let result = send(
            &inner,
            ZenohMessage::Query {
                key: reskey,
                predicate: predicate.to_string(),
                qid,
                target: args.target,
                consolidation: args.consolidation,
            },
            Reliability::Reliable,
            CongestionControl::Block,
        );
        if result.is_err() {
            if let Some(pending) = inner.registry.unregister_pending_query(qid) {
                pending.cancel();
            }
        }
        result
    }

    /// §6 `read(session)`: pumps and dispatches exactly one inbound
    /// transport-message, blocking on the socket read until one arrives.
    pub fn read(&self) -> ZResult<()> {
        let inner = lookup(self.id)?;
        dispatch::read_one(&inner)
    }

    /// §6 `send_keep_alive(session)`: a bare transport-level `KEEP_ALIVE`,
    /// not a zenoh message, since that's what the peer's `dispatch_transport_message`
    /// looks for to refresh its lease timer.
    pub fn send_keep_alive(&self) -> ZResult<()> {
        let inner = lookup(self.id)?;
        zlite_transport::send_keep_alive(&inner.state)
    }

    /// Spawns the dedicated reader thread (§5: "exactly two threads touch
    /// the link directly"), pumping inbound messages and sending
    /// `KEEP_ALIVE` every [`zlite_transport::ZN_KEEP_ALIVE_INTERVAL`] while
    /// idle, until the session closes.
    pub fn run(&self) -> thread::JoinHandle<()> {
        let id = self.id;
        thread::spawn(move || {
            let interval = Duration::from_millis(*zlite_transport::ZN_KEEP_ALIVE_INTERVAL);
            loop {
                let inner = match lookup(id) {
                    Ok(inner) => inner,
                    Err(_) => return,
                };
                if inner.state.is_closed() {
                    return;
                }
                match dispatch::read_one(&inner) {
                    Ok(()) => {}
                    Err(e) => {
                        log::warn!("session {} reader thread stopping: {}", id, e);
                        return;
                    }
                }
                let elapsed = inner.clock.now().saturating_duration_since(*inner.last_seen.lock().unwrap());
                if elapsed >= interval {
                    let _ = Session { id }.send_keep_alive();
                }
            }
        })
    }
}

/// Shared by `Session::write` and `Publisher::write`: builds the `DATA`
/// message for `reskey`/`payload` and sends it on the reliable or
/// best-effort lane according to `congestion`.
pub(crate) fn write_via(session_id: u64, reskey: &ResKey, payload: Vec<u8>, encoding: Option<Encoding>, congestion: CongestionControl) -> ZResult<()> {
    let inner = lookup(session_id)?;
    let data_info = DataInfo {
        source_id: Some(inner.state.local_pid.clone()),
        source_sn: None,
        timestamp: Some(inner.now_millis()),
        kind: DataKind::Put,
        encoding,
    };
    send(
        &inner,
        ZenohMessage::Data {
            key: reskey.to_owned(),
            payload,
            data_info: Some(data_info),
            congestion_control: congestion,
            reply_context: None,
        },
        Reliability::Reliable,
        congestion,
    )
}

pub(crate) fn pull_via(session_id: u64, reskey: &ResKey) -> ZResult<()> {
    let inner = lookup(session_id)?;
    send(
        &inner,
        ZenohMessage::Pull {
            key: reskey.to_owned(),
            pull_id: 0,
            max_samples: None,
            is_final: true,
        },
        Reliability::Reliable,
        CongestionControl::Block,
    )
}

/// Called by [`Query::reply`]: wraps `sample` in a `DATA` carrying a
/// `REPLY_CONTEXT` tying it back to `qid`. Errors are logged rather than
/// returned since the teacher's own `Query` handle has no fallible `reply`.
pub(crate) fn send_query_reply(session_id: u64, qid: ZInt, replier_kind: ZInt, sample: Sample) {
    let inner = match lookup(session_id) {
        Ok(inner) => inner,
        Err(_) => return,
    };
    let data_info = DataInfo {
        source_id: sample.source_id.clone(),
        source_sn: None,
        timestamp: Some(sample.timestamp.unwrap_or_else(|| inner.now_millis())),
        kind: sample.kind,
        encoding: sample.encoding.clone(),
    };
    let reply_context = ReplyContext {
        qid,
        source_kind: replier_kind,
        replier_id: Some(inner.state.local_pid.clone()),
        is_final: false,
    };
    let msg = ZenohMessage::Data {
        key: ResKey::RName(sample.res_name.into()),
        payload: sample.payload,
        data_info: Some(data_info),
        congestion_control: CongestionControl::Block,
        reply_context: Some(reply_context),
    };
    if let Err(e) = send(&inner, msg, Reliability::Reliable, CongestionControl::Block) {
        log::warn!("failed to send query reply for qid {}: {}", qid, e);
    }
}

/// Sends the `FINAL` marker for one queryable's answers to `qid`, once its
/// handler returns (types.rs's `Query::reply` doc comment).
pub(crate) fn send_query_final(session_id: u64, qid: ZInt, replier_kind: ZInt) {
    let inner = match lookup(session_id) {
        Ok(inner) => inner,
        Err(_) => return,
    };
    let reply_context = ReplyContext {
        qid,
        source_kind: replier_kind,
        replier_id: Some(inner.state.local_pid.clone()),
        is_final: true,
    };
    let msg = ZenohMessage::Unit {
        congestion_control: CongestionControl::Block,
        reply_context: Some(reply_context),
    };
    if let Err(e) = send(&inner, msg, Reliability::Reliable, CongestionControl::Block) {
        log::warn!("failed to send query final for qid {}: {}", qid, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::sync::atomic::AtomicUsize;
    use zlite_core::capability::{DeterministicPrng, ManualClock};
    use zlite_core::config::keys;
    use zlite_link::tcp::TcpLink;
    use zlite_wire::codec::{decode_transport_message, encode_transport_message, write_framed};
    use zlite_wire::buf::RBuf;

    fn spawn_peer(listener: TcpListener) -> (thread::JoinHandle<()>, std::sync::mpsc::Receiver<ZenohMessage>) {
        let (tx, rx) = std::sync::mpsc::channel();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let link = TcpLink::from_stream(stream).unwrap();

            let syn = recv(&link);
            let pid = match syn {
                zlite_wire::transport::TransportMessage::InitSyn { pid, .. } => pid,
                other => panic!("expected INIT-Syn, got {:?}", other),
            };
            send_msg(
                &link,
                &zlite_wire::transport::TransportMessage::InitAck {
                    version: 0,
                    whatami: whatami::ROUTER,
                    pid,
                    sn_resolution: None,
                    cookie: vec![1, 2, 3],
                },
            );
            match recv(&link) {
                zlite_wire::transport::TransportMessage::OpenSyn { .. } => {}
                other => panic!("expected OPEN-Syn, got {:?}", other),
            }
            send_msg(
                &link,
                &zlite_wire::transport::TransportMessage::OpenAck { lease: 10_000, initial_sn: 0 },
            );

            // one FRAME carrying whatever the test wants to push to the client
            loop {
                match recv(&link) {
                    zlite_wire::transport::TransportMessage::Frame { payload, .. } => {
                        if let zlite_wire::transport::FramePayload::Messages(msgs) = payload {
                            for m in msgs {
                                let _ = tx.send(m);
                            }
                        }
                    }
                    zlite_wire::transport::TransportMessage::Close { .. } => break,
                    _ => {}
                }
            }
        });
        (handle, rx)
    }

    fn send_msg(link: &TcpLink, msg: &zlite_wire::transport::TransportMessage) {
        link.write_all(&write_framed(msg).unwrap()).unwrap();
    }

    fn recv(link: &TcpLink) -> zlite_wire::transport::TransportMessage {
        let mut len_bytes = Vec::new();
        loop {
            let mut b = [0u8; 1];
            link.read_exact(&mut b).unwrap();
            let more = b[0] & 0x80 != 0;
            len_bytes.push(b[0]);
            if !more {
                break;
            }
        }
        let (len, _) = zlite_core::zint::decode_zint(&len_bytes).unwrap();
        let mut body = vec![0u8; len as usize];
        link.read_exact(&mut body).unwrap();
        let mut r = RBuf::new(&body);
        decode_transport_message(&mut r).unwrap()
    }

    fn open_test_session(addr: std::net::SocketAddr) -> Session {
        let mut config = Config::new();
        config.insert(keys::PEER.to_string(), format!("tcp/{}", addr));
        let prng = DeterministicPrng::new(7);
        let clock = ManualClock::default();
        open_with(&config, &prng, &clock).unwrap()
    }

    #[test]
    fn declare_resource_then_write_emits_data_with_resolved_key() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (router, rx) = spawn_peer(listener);

        let session = open_test_session(addr);
        let rid = session.declare_resource(&"/a/b".into()).unwrap();
        session.write((rid, "/c"), b"x".to_vec()).unwrap();

        let declare = rx.recv().unwrap();
        match declare {
            ZenohMessage::Declare { declarations } => match &declarations[0] {
                Declaration::Resource { key, .. } => assert_eq!(key.name(), Some("/a/b")),
                other => panic!("unexpected declaration {:?}", other),
            },
            other => panic!("expected Declare, got {:?}", other),
        }
        let data = rx.recv().unwrap();
        match data {
            ZenohMessage::Data { key, .. } => assert_eq!(key.rid(), rid),
            other => panic!("expected Data, got {:?}", other),
        }

        session.close().unwrap();
        router.join().unwrap();
    }

    #[test]
    fn operations_on_a_closed_session_return_state_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (router, _rx) = spawn_peer(listener);
        let session = open_test_session(addr);
        session.close().unwrap();
        assert!(session.declare_resource(&"/a".into()).is_err());
        assert!(session.write("/a", b"x".to_vec()).is_err());
        assert!(session.info().is_err());
        router.join().unwrap();
    }

    #[test]
    fn query_collect_orders_full_consolidation_replies_by_timestamp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let router = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let link = TcpLink::from_stream(stream).unwrap();
            let syn = recv(&link);
            let pid = match syn {
                zlite_wire::transport::TransportMessage::InitSyn { pid, .. } => pid,
                other => panic!("unexpected {:?}", other),
            };
            send_msg(
                &link,
                &zlite_wire::transport::TransportMessage::InitAck {
                    version: 0,
                    whatami: whatami::ROUTER,
                    pid,
                    sn_resolution: None,
                    cookie: vec![],
                },
            );
            recv(&link);
            send_msg(
                &link,
                &zlite_wire::transport::TransportMessage::OpenAck { lease: 10_000, initial_sn: 0 },
            );

            let query_msg = loop {
                if let zlite_wire::transport::TransportMessage::Frame {
                    payload: zlite_wire::transport::FramePayload::Messages(msgs),
                    ..
                } = recv(&link)
                {
                    if let Some(ZenohMessage::Query { qid, .. }) = msgs.into_iter().next() {
                        break qid;
                    }
                }
            };

            let mut sn = 0u64;
            for (ts, name) in [(3u64, "/sensors/c"), (1, "/sensors/a"), (2, "/sensors/b")] {
                send_msg(
                    &link,
                    &zlite_wire::transport::TransportMessage::Frame {
                        reliability: Reliability::Reliable,
                        sn,
                        payload: zlite_wire::transport::FramePayload::Messages(vec![ZenohMessage::Data {
                            key: ResKey::RName(name.into()),
                            payload: vec![],
                            data_info: Some(DataInfo {
                                source_id: None,
                                source_sn: None,
                                timestamp: Some(ts),
                                kind: DataKind::Put,
                                encoding: None,
                            }),
                            congestion_control: CongestionControl::Drop,
                            reply_context: Some(ReplyContext {
                                qid: query_msg,
                                source_kind: 0,
                                replier_id: None,
                                is_final: false,
                            }),
                        }]),
                    },
                );
                sn += 1;
            }
            send_msg(
                &link,
                &zlite_wire::transport::TransportMessage::Frame {
                    reliability: Reliability::Reliable,
                    sn,
                    payload: zlite_wire::transport::FramePayload::Messages(vec![ZenohMessage::Unit {
                        congestion_control: CongestionControl::Drop,
                        reply_context: Some(ReplyContext {
                            qid: query_msg,
                            source_kind: 0,
                            replier_id: None,
                            is_final: true,
                        }),
                    }]),
                },
            );

            loop {
                if let zlite_wire::transport::TransportMessage::Close { .. } = recv(&link) {
                    break;
                }
            }
        });

        let session = open_test_session(addr);
        let reader = session;
        let reader_thread = thread::spawn(move || loop {
            if reader.read().is_err() {
                break;
            }
        });

        let replies = session
            .query_collect("/sensors/**", "", QueryArgs::default())
            .unwrap();
        let names: Vec<&str> = replies.iter().map(|r| r.data.res_name.as_str()).collect();
        assert_eq!(names, vec!["/sensors/a", "/sensors/b", "/sensors/c"]);

        session.close().unwrap();
        let _ = reader_thread.join();
        router.join().unwrap();
    }
}
