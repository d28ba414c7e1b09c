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
//! Tunable protocol constants, each overridable by an environment variable
//! of the same name (see `zlite_core::zconfigurable!`).
use zlite_core::zconfigurable;

zconfigurable! {
    /// Proposed at `INIT-Syn`; adopted value may be lowered by the peer. The
    /// `S` flag is set on `INIT-Syn` only when this differs from
    /// [`PROTOCOL_DEFAULT_SN_RESOLUTION`].
    pub static ref ZN_SN_RESOLUTION: u64 = 1 << 28;
    /// Milliseconds between `KEEP_ALIVE`s sent while idle.
    pub static ref ZN_KEEP_ALIVE_INTERVAL: u64 = 1_000;
    /// Peer is considered gone after this many missed lease intervals.
    pub static ref ZN_LEASE_EXPIRE_FACTOR: u64 = 3;
    /// Default lease proposed at `OPEN-Syn`, in milliseconds.
    pub static ref ZN_DEFAULT_LEASE: u64 = 10_000;
    /// Milliseconds between SCOUT packets while scouting.
    pub static ref ZN_SCOUT_PERIOD: u64 = 500;
    /// Default multicast group used for SCOUT/HELLO.
    pub static ref ZN_MULTICAST_ADDRESS: String = "224.0.0.224:7447".to_string();
}

/// The wire-protocol baseline `sn_resolution`: §4.4 rule 2 sets the `S` flag
/// on `INIT-Syn` only when the proposed value (`ZN_SN_RESOLUTION`, itself
/// overridable) differs from this fixed constant.
pub const PROTOCOL_DEFAULT_SN_RESOLUTION: u64 = 1 << 28;
