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
//! Dispatches an [`EndPoint`] to the right link implementation by scheme.
//! Only `tcp` and `udp` are recognized; every other scheme the teacher
//! supports (tls, quic, serial, ws, unixsock-stream...) is out of scope.
use crate::link::Link;
use crate::locator::{EndPoint, SCHEME_TCP, SCHEME_UDP};
use crate::tcp::TcpLink;
use crate::udp::UdpLink;
use zlite_core::error::{ZErrorKind, ZResult};
use zlite_core::zerror;

/// Opens a unicast link to `endpoint`, picking the implementation by
/// `endpoint.locator.scheme`.
pub fn open_link(endpoint: &EndPoint) -> ZResult<Box<dyn Link>> {
    match endpoint.locator.scheme.as_str() {
        SCHEME_TCP => Ok(Box::new(TcpLink::connect(&endpoint.locator.address)?)),
        SCHEME_UDP => Ok(Box::new(UdpLink::connect(&endpoint.locator.address)?)),
        other => zerror!(ZErrorKind::ProtocolError {
            descr: format!("unsupported link scheme '{}'", other)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_scheme() {
        let ep = EndPoint::parse("quic/127.0.0.1:7447").unwrap();
        assert!(open_link(&ep).is_err());
    }
}
