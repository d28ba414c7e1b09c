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
//! Session state, the SN window, the client-side handshake and scouting,
//! and the outbound framing path. The registry and the inbound dispatch
//! loop live one layer up, in `zlite`, since they need the public API's
//! callback types.
pub mod config;
pub mod handshake;
pub mod outbound;
pub mod sn;
pub mod state;

pub use config::{
    ZN_DEFAULT_LEASE, ZN_KEEP_ALIVE_INTERVAL, ZN_LEASE_EXPIRE_FACTOR, ZN_MULTICAST_ADDRESS,
    ZN_SCOUT_PERIOD, ZN_SN_RESOLUTION,
};
pub use handshake::{close, open, scout};
pub use outbound::{build_frames, send_keep_alive, send_zenoh_message, NoopOnDisconnect, OnDisconnect};
pub use sn::sn_precedes;
pub use state::{accept_inbound_sn, SessionLifecycle, SessionState, SnCounters};
