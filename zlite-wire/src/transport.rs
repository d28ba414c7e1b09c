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
//! Transport messages: what actually crosses the link. Everything above
//! `FRAME` is opaque to the reader/writer threads.
use crate::zenoh::ZenohMessage;
use zlite_core::core_types::{PeerId, Reliability};
use zlite_core::zint::ZInt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Generic,
    Invalid,
    Unsupported,
    Expired,
    MaxSessions,
    MaxLinks,
}

/// The payload of a `FRAME`: either one or more whole zenoh messages, or one
/// fragment of a single zenoh message too large for the link's MTU.
#[derive(Debug, Clone, PartialEq)]
pub enum FramePayload {
    Messages(Vec<ZenohMessage>),
    Fragment { more: bool, data: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportMessage {
    InitSyn {
        version: u8,
        whatami: ZInt,
        pid: PeerId,
        sn_resolution: Option<ZInt>,
    },
    InitAck {
        version: u8,
        whatami: ZInt,
        pid: PeerId,
        sn_resolution: Option<ZInt>,
        cookie: Vec<u8>,
    },
    OpenSyn {
        lease: ZInt,
        initial_sn: ZInt,
        cookie: Vec<u8>,
    },
    OpenAck {
        lease: ZInt,
        initial_sn: ZInt,
    },
    Close {
        reason: CloseReason,
        link_only: bool,
    },
    KeepAlive,
    Frame {
        reliability: Reliability,
        sn: ZInt,
        payload: FramePayload,
    },
    /// Sent over UDP multicast before any link is established, to discover
    /// reachable peers matching the `what` role mask.
    Scout { what: ZInt, pid_request: bool },
    /// Reply to a `Scout`: the responder's identity, role and the locators
    /// it can be reached on.
    Hello {
        pid: Option<PeerId>,
        whatami: ZInt,
        locators: Vec<String>,
    },
}
