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
//! Locator/endpoint grammar plus the blocking `Link` abstraction and its
//! `tcp`/`udp` implementations.
pub mod link;
pub mod locator;
pub mod manager;
pub mod tcp;
pub mod udp;

pub use link::{Link, DEFAULT_MTU};
pub use locator::{EndPoint, Locator};
pub use manager::open_link;
