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
//! Zenoh messages: the payload carried inside a transport `FRAME`.
use zlite_core::core_types::*;
use zlite_core::zint::ZInt;

/// A single entry of a `DECLARE` message.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Resource { rid: ZInt, key: ResKey<'static> },
    ForgetResource { rid: ZInt },
    Publisher { key: ResKey<'static> },
    ForgetPublisher { key: ResKey<'static> },
    Subscriber { key: ResKey<'static>, info: SubInfo },
    ForgetSubscriber { key: ResKey<'static> },
    Queryable { key: ResKey<'static>, info: QueryableInfo },
    ForgetQueryable { key: ResKey<'static> },
}

/// The `source_id`/`source_sn`/`timestamp`/`kind`/`encoding` quintuple
/// optionally attached to a `DATA`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataInfo {
    pub source_id: Option<PeerId>,
    pub source_sn: Option<ZInt>,
    pub timestamp: Option<u64>,
    pub kind: DataKind,
    pub encoding: Option<Encoding>,
}

impl Default for DataInfo {
    fn default() -> DataInfo {
        DataInfo {
            source_id: None,
            source_sn: None,
            timestamp: None,
            kind: DataKind::Put,
            encoding: None,
        }
    }
}

/// Routes a `DATA`/`UNIT` to the query engine instead of the subscription
/// table: `qid` ties it to the pending query, `is_final` with no payload
/// marks the last reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyContext {
    pub qid: ZInt,
    pub source_kind: ZInt,
    pub replier_id: Option<PeerId>,
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ZenohMessage {
    Declare {
        declarations: Vec<Declaration>,
    },
    Data {
        key: ResKey<'static>,
        payload: Vec<u8>,
        data_info: Option<DataInfo>,
        congestion_control: CongestionControl,
        reply_context: Option<ReplyContext>,
    },
    Unit {
        congestion_control: CongestionControl,
        reply_context: Option<ReplyContext>,
    },
    Pull {
        key: ResKey<'static>,
        pull_id: ZInt,
        max_samples: Option<ZInt>,
        is_final: bool,
    },
    Query {
        key: ResKey<'static>,
        predicate: String,
        qid: ZInt,
        target: QueryTarget,
        consolidation: QueryConsolidation,
    },
}
