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
//! Primitive types shared by every other `zlite` crate: the zint varint
//! codec, the core protocol types (`ResKey`, `PeerId`, `Reliability`, ...),
//! resource-name wildcard matching, the error model and a couple of
//! session-scoped capabilities (randomness, time) that can be swapped for
//! deterministic test doubles.
pub mod config;
pub mod capability;
pub mod core_types;
pub mod error;
pub mod rname;
pub mod zint;

pub use capability::{Clock, Prng};
pub use config::{keys as config_keys, Config};
pub use core_types::*;
pub use error::{ZError, ZErrorKind, ZResult};
pub use zint::{decode_zint, encode_zint, AtomicZInt, ZInt, ZINT_MAX_BYTES};
