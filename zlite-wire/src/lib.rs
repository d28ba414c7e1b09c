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
//! Transport and zenoh message types, their declarations and decorators,
//! and the codec that turns them into (and back out of) bytes.
pub mod buf;
pub mod codec;
pub mod coretypes_codec;
pub mod id;
pub mod transport;
pub mod zenoh;

pub use buf::{RBuf, WBuf};
pub use codec::{
    decode_transport_message, decode_zenoh_message, encode_transport_message,
    encode_zenoh_message, read_framed, write_framed,
};
pub use transport::{CloseReason, FramePayload, TransportMessage};
pub use zenoh::{DataInfo, Declaration, ReplyContext, ZenohMessage};
