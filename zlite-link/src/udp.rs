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
use crate::link::{Link, DEFAULT_MTU};
use crate::locator::Locator;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;
use zlite_core::error::{ZErrorKind, ZResult};

/// UDP MTU kept conservative enough to avoid IP fragmentation on a typical
/// constrained-device link.
pub const UDP_MTU: usize = 1472;

fn io_err(e: std::io::Error) -> zlite_core::error::ZError {
    zlite_core::error::ZError::new(
        ZErrorKind::IoError {
            descr: e.to_string(),
        },
        file!(),
        line!(),
    )
}

/// A datagram link over `std::net::UdpSocket`, used both for unicast
/// transport and for SCOUT/HELLO multicast discovery.
pub struct UdpLink {
    socket: UdpSocket,
    src: Locator,
    dst: Locator,
    connected: bool,
}

impl UdpLink {
    /// Opens a unicast link `connect`ed to `addr`, so `write`/`read` need no
    /// explicit peer address.
    pub fn connect(addr: &str) -> ZResult<UdpLink> {
        let peer = super::tcp::resolve_first(addr)?;
        let local: SocketAddr = if peer.is_ipv6() {
            "[::]:0".parse().unwrap()
        } else {
            "0.0.0.0:0".parse().unwrap()
        };
        let socket = UdpSocket::bind(local).map_err(io_err)?;
        socket.connect(peer).map_err(io_err)?;
        let local = socket.local_addr().map_err(io_err)?;
        Ok(UdpLink {
            src: Locator::new("udp", local.to_string()),
            dst: Locator::new("udp", peer.to_string()),
            socket,
            connected: true,
        })
    }

    /// Opens an unconnected socket bound to `bind_addr` and joins the
    /// `group` multicast group, used to send/receive SCOUT and HELLO.
    pub fn multicast(bind_addr: &str, group: Ipv4Addr) -> ZResult<UdpLink> {
        let bind: SocketAddr = bind_addr.parse().map_err(|_| {
            zlite_core::error::ZError::new(
                ZErrorKind::ParseError {
                    descr: format!("invalid multicast bind address '{}'", bind_addr),
                },
                file!(),
                line!(),
            )
        })?;
        let socket = UdpSocket::bind(bind).map_err(io_err)?;
        socket
            .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
            .map_err(io_err)?;
        let local = socket.local_addr().map_err(io_err)?;
        Ok(UdpLink {
            src: Locator::new("udp", local.to_string()),
            dst: Locator::new("udp", SocketAddr::new(group.into(), bind.port()).to_string()),
            socket,
            connected: false,
        })
    }

    /// Sends one datagram to an explicit destination, for use on an
    /// unconnected (multicast) socket.
    pub fn send_to(&self, buf: &[u8], dst: SocketAddr) -> ZResult<usize> {
        self.socket.send_to(buf, dst).map_err(io_err)
    }

    /// Receives one datagram plus the sender's address, for use on an
    /// unconnected (multicast) socket.
    pub fn recv_from(&self, buf: &mut [u8]) -> ZResult<(usize, SocketAddr)> {
        self.socket.recv_from(buf).map_err(io_err)
    }

    /// Bounds how long `recv_from`/`read` blocks, so a scouting loop can
    /// resend its `SCOUT` periodically instead of waiting forever for a
    /// `HELLO` that may never come.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> ZResult<()> {
        self.socket.set_read_timeout(timeout).map_err(io_err)
    }
}

impl Link for UdpLink {
    fn write(&self, buf: &[u8]) -> ZResult<usize> {
        if !self.connected {
            return zlite_core::zerror!(ZErrorKind::StateError {
                descr: "write() requires a connected udp link, use send_to".into()
            });
        }
        self.socket.send(buf).map_err(io_err)
    }

    fn read(&self, buf: &mut [u8]) -> ZResult<usize> {
        if !self.connected {
            return zlite_core::zerror!(ZErrorKind::StateError {
                descr: "read() requires a connected udp link, use recv_from".into()
            });
        }
        self.socket.recv(buf).map_err(io_err)
    }

    fn close(&self) -> ZResult<()> {
        Ok(())
    }

    fn is_streamed(&self) -> bool {
        false
    }

    fn mtu(&self) -> usize {
        UDP_MTU.min(DEFAULT_MTU)
    }

    fn get_src(&self) -> &Locator {
        &self.src
    }

    fn get_dst(&self) -> &Locator {
        &self.dst
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_link_round_trip() {
        let responder = UdpSocket::bind("127.0.0.1:0").unwrap();
        let responder_addr = responder.local_addr().unwrap();

        let client = UdpLink::connect(&responder_addr.to_string()).unwrap();
        client.write(b"ping").unwrap();

        let mut buf = [0u8; 4];
        let (n, from) = responder.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");

        responder.send_to(b"pong", from).unwrap();
        let mut reply = [0u8; 4];
        let n = client.read(&mut reply).unwrap();
        assert_eq!(&reply[..n], b"pong");
        assert!(!client.is_streamed());
    }
}
