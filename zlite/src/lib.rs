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
//! The client-facing crate: registry, dispatch loop, query engine and the
//! public [`Session`] API (§6) built on top of `zlite-transport`'s
//! handshake/SN/outbound-framing machinery.
pub mod dispatch;
pub mod query;
pub mod registry;
pub mod session;
pub mod types;

pub use session::{open, open_with, Session};
pub use types::{
    Publisher, Query, QueryArgs, QueryEvent, Queryable, Reply, Sample, SessionInfo, Subscriber,
};

pub use zlite_core::config::Config;
pub use zlite_core::core_types::{
    whatami, CongestionControl, ConsolidationMode, DataKind, Encoding, PeerId, QueryConsolidation,
    QueryTarget, Reliability, ResKey, ResourceId, SubInfo, SubMode,
};
pub use zlite_core::error::{ZError, ZErrorKind, ZResult};
pub use zlite_transport::scout;
