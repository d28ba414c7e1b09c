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
//! Public value types returned by the [`Session`](crate::session::Session)
//! API. `Publisher`/`Subscriber`/`Queryable` deliberately carry no pointer
//! back into the session (Design Note, `spec.md` §9: "a `Publisher` handle
//! points back to its session... re-architect as: handles are values that
//! carry only the session id and the entity id"): every lookup a handle
//! needs goes through [`crate::session::lookup`], so a handle can outlive a
//! closed session's registry entry without dangling.
use std::fmt;
use std::sync::Arc;

use zlite_core::core_types::{CongestionControl, DataKind, Encoding, PeerId, QueryTarget, ResKey};
use zlite_core::zint::ZInt;

use crate::registry::EntityId;

/// A data sample: the resource name it was published under, its payload, and
/// the optional encoding/kind/timestamp tag carried uninterpreted from the
/// wire (§3 Data model: "Encoding ... carried ... uninterpreted").
#[derive(Debug, Clone)]
pub struct Sample {
    pub res_name: String,
    pub payload: Vec<u8>,
    pub kind: DataKind,
    pub encoding: Option<Encoding>,
    pub timestamp: Option<u64>,
    pub source_id: Option<PeerId>,
}

/// The callback invoked for every `DATA` matching a subscription.
pub type DataHandler = dyn Fn(Sample) + Send + Sync;

/// One reply to a [`query`](crate::session::Session::query), already stripped
/// of its transport envelope.
#[derive(Debug, Clone)]
pub struct Reply {
    pub data: Sample,
    pub source_kind: ZInt,
    pub replier_id: Option<PeerId>,
}

/// What a query callback is invoked with: either one reply, or the final
/// marker once every router in the query's fan-in has answered (§4.9 step 4).
#[derive(Debug, Clone)]
pub enum QueryEvent {
    Data(Reply),
    Final,
}

/// The callback driving an asynchronous [`query`](crate::session::Session::query).
pub type ReplyHandler = dyn Fn(QueryEvent) + Send + Sync;

/// A query delivered to a registered queryable. `reply` may be called any
/// number of times before the handler returns; the session sends the `FINAL`
/// marker once the handler returns (mirrors the teacher's `RepliesSender`,
/// collapsed from an async channel into a direct call since this core has no
/// executor to hop through).
pub struct Query {
    pub res_name: String,
    pub predicate: String,
    pub(crate) session_id: u64,
    pub(crate) qid: ZInt,
    pub(crate) replier_kind: ZInt,
}

impl Query {
    pub fn reply(&self, sample: Sample) {
        crate::session::send_query_reply(self.session_id, self.qid, self.replier_kind, sample);
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Query{{ res_name: {}, predicate: {} }}", self.res_name, self.predicate)
    }
}

/// The callback invoked for every `QUERY` matching a declared queryable.
pub type QueryHandler = dyn Fn(Query) + Send + Sync;

/// A local publisher declaration.
#[derive(Clone)]
pub struct Publisher {
    pub(crate) session_id: u64,
    pub(crate) id: EntityId,
    pub(crate) reskey: ResKey<'static>,
}

impl Publisher {
    pub fn write(&self, payload: impl Into<Vec<u8>>) -> zlite_core::error::ZResult<()> {
        crate::session::write_via(self.session_id, &self.reskey, payload.into(), None, CongestionControl::default())
    }
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Publisher{{ id: {}, reskey: {:?} }}", self.id, self.reskey)
    }
}

/// A local, callback-driven subscriber declaration.
#[derive(Clone)]
pub struct Subscriber {
    pub(crate) session_id: u64,
    pub(crate) id: EntityId,
    pub(crate) reskey: ResKey<'static>,
}

impl Subscriber {
    /// §6 `pull(subscriber)`: fetches the next batch of a pull-mode
    /// subscription.
    pub fn pull(&self) -> zlite_core::error::ZResult<()> {
        crate::session::pull_via(self.session_id, &self.reskey)
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Subscriber{{ id: {}, reskey: {:?} }}", self.id, self.reskey)
    }
}

/// A local queryable declaration.
#[derive(Clone)]
pub struct Queryable {
    pub(crate) session_id: u64,
    pub(crate) id: EntityId,
    pub(crate) reskey: ResKey<'static>,
}

impl fmt::Debug for Queryable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Queryable{{ id: {}, reskey: {:?} }}", self.id, self.reskey)
    }
}

/// Local+remote peer identity, returned by [`info`](crate::session::Session::info).
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub local_pid: PeerId,
    pub remote_pid: Option<PeerId>,
}

/// Arguments shared by [`query`](crate::session::Session::query) and
/// [`query_collect`](crate::session::Session::query_collect).
#[derive(Clone)]
pub struct QueryArgs {
    pub target: QueryTarget,
    pub consolidation: zlite_core::core_types::QueryConsolidation,
}

impl Default for QueryArgs {
    fn default() -> Self {
        QueryArgs {
            target: QueryTarget::default(),
            consolidation: Default::default(),
        }
    }
}

pub(crate) fn boxed_data_handler<F: Fn(Sample) + Send + Sync + 'static>(f: F) -> Arc<DataHandler> {
    Arc::new(f)
}

pub(crate) fn boxed_query_handler<F: Fn(Query) + Send + Sync + 'static>(f: F) -> Arc<QueryHandler> {
    Arc::new(f)
}

pub(crate) fn boxed_reply_handler<F: Fn(QueryEvent) + Send + Sync + 'static>(f: F) -> Arc<ReplyHandler> {
    Arc::new(f)
}
