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
use crate::link::Link;
use crate::locator::Locator;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Mutex;
use zlite_core::error::{ZErrorKind, ZResult};
use zlite_core::zerror;

/// A byte-stream link over `std::net::TcpStream`.
///
/// Reads and writes each take their own mutex so that the transport's
/// single writer thread and single reader thread never contend with each
/// other, only with themselves.
pub struct TcpLink {
    stream: Mutex<TcpStream>,
    src: Locator,
    dst: Locator,
}

impl TcpLink {
    pub fn connect(addr: &str) -> ZResult<TcpLink> {
        let stream = TcpStream::connect(addr).map_err(|e| {
            zlite_core::error::ZError::new(
                ZErrorKind::IoError {
                    descr: format!("tcp connect to '{}' failed: {}", addr, e),
                },
                file!(),
                line!(),
            )
        })?;
        Self::from_stream(stream)
    }

    pub fn from_stream(stream: TcpStream) -> ZResult<TcpLink> {
        let local = stream.local_addr().map_err(io_err)?;
        let peer = stream.peer_addr().map_err(io_err)?;
        stream.set_nodelay(true).map_err(io_err)?;
        Ok(TcpLink {
            src: Locator::new("tcp", local.to_string()),
            dst: Locator::new("tcp", peer.to_string()),
            stream: Mutex::new(stream),
        })
    }

    pub fn listen(addr: &str) -> ZResult<TcpListener> {
        TcpListener::bind(addr).map_err(|e| {
            zlite_core::error::ZError::new(
                ZErrorKind::IoError {
                    descr: format!("tcp bind to '{}' failed: {}", addr, e),
                },
                file!(),
                line!(),
            )
        })
    }
}

fn io_err(e: std::io::Error) -> zlite_core::error::ZError {
    zlite_core::error::ZError::new(
        ZErrorKind::IoError {
            descr: e.to_string(),
        },
        file!(),
        line!(),
    )
}

impl Link for TcpLink {
    fn write(&self, buf: &[u8]) -> ZResult<usize> {
        let mut s = self.stream.lock().unwrap();
        s.write(buf).map_err(io_err)
    }

    fn write_all(&self, buf: &[u8]) -> ZResult<()> {
        let mut s = self.stream.lock().unwrap();
        s.write_all(buf).map_err(io_err)
    }

    fn read(&self, buf: &mut [u8]) -> ZResult<usize> {
        let mut s = self.stream.lock().unwrap();
        s.read(buf).map_err(io_err)
    }

    fn read_exact(&self, buf: &mut [u8]) -> ZResult<()> {
        let mut s = self.stream.lock().unwrap();
        s.read_exact(buf).map_err(io_err)
    }

    fn close(&self) -> ZResult<()> {
        let s = self.stream.lock().unwrap();
        s.shutdown(std::net::Shutdown::Both).map_err(io_err)
    }

    fn is_streamed(&self) -> bool {
        true
    }

    fn get_src(&self) -> &Locator {
        &self.src
    }

    fn get_dst(&self) -> &Locator {
        &self.dst
    }
}

pub fn resolve_first(addr: &str) -> ZResult<SocketAddr> {
    addr.to_socket_addrs()
        .map_err(io_err)?
        .next()
        .ok_or_else(|| {
            zlite_core::error::ZError::new(
                ZErrorKind::ParseError {
                    descr: format!("no address resolved for '{}'", addr),
                },
                file!(),
                line!(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn connect_and_exchange() {
        let listener = TcpLink::listen("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let accepted = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            TcpLink::from_stream(stream).unwrap()
        });
        let client = TcpLink::connect(&addr).unwrap();
        let server = accepted.join().unwrap();

        client.write_all(b"hello").unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        assert!(client.is_streamed());
        assert!(server.get_dst().address.starts_with("127.0.0.1"));
    }
}
