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
//! §4.9: the pending-query lifecycle. A query is registered with a fresh
//! `qid`, fed replies as `DATA`s wrapped in a `REPLY_CONTEXT` arrive, and
//! retired on the matching `FINAL`. Only the `reception`-position
//! consolidation mode (`QueryConsolidation::reception`) is enforced here; the
//! other two positions ride to the router verbatim (§4.9 last paragraph).
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

use zlite_core::core_types::{ConsolidationMode, PeerId, QueryConsolidation};
use zlite_core::zint::ZInt;

use crate::types::{QueryEvent, Reply, ReplyHandler};

/// A query's outcome once its sink is done: either every reply collected
/// before `FINAL`, or `Cancelled` if `session_close` tore it down first
/// (Design Note, `spec.md` §9: "a single-shot sink with two end-states").
pub enum CollectOutcome {
    Delivered(Vec<Reply>),
    Cancelled,
}

/// Where replies of a pending query end up: either forwarded to a callback
/// as they're consolidated, or accumulated for a blocking `query_collect`.
pub trait ReplySink: Send + Sync {
    fn deliver(&self, reply: Reply);
    fn finish(&self);
    fn cancel(&self);
}

pub struct CallbackSink {
    handler: Arc<ReplyHandler>,
}

impl CallbackSink {
    pub fn new(handler: Arc<ReplyHandler>) -> Arc<CallbackSink> {
        Arc::new(CallbackSink { handler })
    }
}

impl ReplySink for CallbackSink {
    fn deliver(&self, reply: Reply) {
        (self.handler)(QueryEvent::Data(reply));
    }

    fn finish(&self) {
        (self.handler)(QueryEvent::Final);
    }

    fn cancel(&self) {
        // The caller is tearing the session down; there is no further
        // traffic to answer a late callback invocation usefully with.
    }
}

#[derive(Default)]
struct CollectState {
    replies: Vec<Reply>,
    done: bool,
    cancelled: bool,
}

/// §4.9 `query_collect`: a condvar-guarded sink a caller thread blocks on.
pub struct CollectSink {
    state: Mutex<CollectState>,
    cv: Condvar,
}

impl CollectSink {
    pub fn new() -> Arc<CollectSink> {
        Arc::new(CollectSink {
            state: Mutex::new(CollectState::default()),
            cv: Condvar::new(),
        })
    }

    /// Blocks the caller until `finish`/`cancel` is called.
    pub fn wait(&self) -> CollectOutcome {
        let mut state = self.state.lock().unwrap();
        while !state.done {
            state = self.cv.wait(state).unwrap();
        }
        if state.cancelled {
            CollectOutcome::Cancelled
        } else {
            CollectOutcome::Delivered(std::mem::take(&mut state.replies))
        }
    }
}

impl ReplySink for CollectSink {
    fn deliver(&self, reply: Reply) {
        self.state.lock().unwrap().replies.push(reply);
    }

    fn finish(&self) {
        let mut state = self.state.lock().unwrap();
        state.done = true;
        self.cv.notify_all();
    }

    fn cancel(&self) {
        let mut state = self.state.lock().unwrap();
        state.done = true;
        state.cancelled = true;
        self.cv.notify_all();
    }
}

/// A reply still waiting to be emitted, carrying the timestamp it is
/// eventually ordered by (§4.9 step 4, Scenario S5).
struct Buffered {
    reply: Reply,
    timestamp: u64,
}

/// A query awaiting replies: registered by `register_pending_query`,
/// retired by `unregister_pending_query` once `FINAL` arrives (§4.6).
pub struct PendingQuery {
    pub qid: ZInt,
    consolidation: ConsolidationMode,
    sink: Arc<dyn ReplySink>,
    /// `FULL`: every reply buffered until `FINAL`, then emitted by timestamp.
    buffered: Mutex<Vec<Buffered>>,
    /// `LAZY`: latest timestamp forwarded per `(replier, resource name)`, so a
    /// stale duplicate arriving after a newer one is dropped instead of
    /// re-forwarded.
    seen: Mutex<HashMap<(Option<PeerId>, String), u64>>,
}

impl PendingQuery {
    pub fn new(qid: ZInt, consolidation: QueryConsolidation, sink: Arc<dyn ReplySink>) -> PendingQuery {
        PendingQuery {
            qid,
            consolidation: consolidation.reception,
            sink,
            buffered: Mutex::new(Vec::new()),
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// §4.9 step 3: applies the reception consolidation mode to one inbound
    /// reply.
    pub fn handle_data(&self, reply: Reply, timestamp: u64) {
        match self.consolidation {
            ConsolidationMode::None => self.sink.deliver(reply),
            ConsolidationMode::Lazy => {
                let key = (reply.replier_id.clone(), reply.data.res_name.clone());
                let mut seen = self.seen.lock().unwrap();
                let superseded = seen.get(&key).map(|&best| timestamp <= best).unwrap_or(false);
                if superseded {
                    return;
                }
                seen.insert(key, timestamp);
                drop(seen);
                self.sink.deliver(reply);
            }
            ConsolidationMode::Full => {
                self.buffered.lock().unwrap().push(Buffered { reply, timestamp });
            }
        }
    }

    /// §4.9 step 4: emits any `FULL`-buffered replies in timestamp order,
    /// then the `FINAL` marker.
    pub fn handle_final(&self) {
        let mut buffered = std::mem::take(&mut *self.buffered.lock().unwrap());
        buffered.sort_by_key(|b| b.timestamp);
        for b in buffered {
            self.sink.deliver(b.reply);
        }
        self.sink.finish();
    }

    pub fn cancel(&self) {
        self.sink.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zlite_core::core_types::DataKind;
    use crate::types::Sample;

    fn reply(name: &str) -> Reply {
        Reply {
            data: Sample {
                res_name: name.to_string(),
                payload: Vec::new(),
                kind: DataKind::Put,
                encoding: None,
                timestamp: None,
                source_id: None,
            },
            source_kind: 0,
            replier_id: None,
        }
    }

    #[test]
    fn full_consolidation_orders_by_timestamp_then_finals() {
        let sink = CollectSink::new();
        let pq = PendingQuery::new(
            0,
            QueryConsolidation {
                reception: ConsolidationMode::Full,
                ..QueryConsolidation::none()
            },
            sink.clone(),
        );
        pq.handle_data(reply("/sensors/c"), 3);
        pq.handle_data(reply("/sensors/a"), 1);
        pq.handle_data(reply("/sensors/b"), 2);
        pq.handle_final();

        match sink.wait() {
            CollectOutcome::Delivered(replies) => {
                let names: Vec<&str> = replies.iter().map(|r| r.data.res_name.as_str()).collect();
                assert_eq!(names, vec!["/sensors/a", "/sensors/b", "/sensors/c"]);
            }
            CollectOutcome::Cancelled => panic!("expected delivery"),
        }
    }

    #[test]
    fn lazy_consolidation_drops_stale_duplicate() {
        let sink = CollectSink::new();
        let pq = PendingQuery::new(
            0,
            QueryConsolidation {
                reception: ConsolidationMode::Lazy,
                ..QueryConsolidation::none()
            },
            sink.clone(),
        );
        pq.handle_data(reply("/a"), 5);
        pq.handle_data(reply("/a"), 2); // stale: dropped
        pq.handle_final();

        match sink.wait() {
            CollectOutcome::Delivered(replies) => assert_eq!(replies.len(), 1),
            CollectOutcome::Cancelled => panic!("expected delivery"),
        }
    }

    #[test]
    fn cancel_wakes_a_blocked_collector_with_no_replies() {
        let sink = CollectSink::new();
        sink.cancel();
        match sink.wait() {
            CollectOutcome::Cancelled => {}
            CollectOutcome::Delivered(_) => panic!("expected cancellation"),
        }
    }
}
