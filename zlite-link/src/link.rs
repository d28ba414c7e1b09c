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
//! The `Link` trait is a synchronous, blocking byte/datagram conduit: one
//! transport thread owns each link and calls `read`/`write` directly, rather
//! than polling a `Future` on an executor.
use crate::locator::Locator;
use zlite_core::error::ZResult;

/// Default MTU used when a link implementation has no stronger bound.
pub const DEFAULT_MTU: usize = 65_535;

/// A byte-stream (TCP) or datagram (UDP) conduit to a single peer.
///
/// Implementations must be safe to call `read` and `write` from different
/// threads concurrently (the transport layer serializes writers with a
/// mutex but the read loop runs on its own thread).
pub trait Link: Send + Sync {
    /// Writes `buf` as a single unit: for a streamed link this is a sequence
    /// of bytes with no message boundary; for a datagram link it is exactly
    /// one datagram and must not exceed `mtu()`.
    fn write(&self, buf: &[u8]) -> ZResult<usize>;

    /// Writes all of `buf`, retrying partial writes on streamed links.
    fn write_all(&self, buf: &[u8]) -> ZResult<()> {
        let mut written = 0;
        while written < buf.len() {
            written += self.write(&buf[written..])?;
        }
        Ok(())
    }

    /// Reads into `buf`, returning the number of bytes read. For a datagram
    /// link this is one whole datagram; for a streamed link it is whatever
    /// is currently available, possibly fewer bytes than `buf.len()`.
    fn read(&self, buf: &mut [u8]) -> ZResult<usize>;

    /// Reads exactly `buf.len()` bytes, as required by the length-prefixed
    /// stream framing.
    fn read_exact(&self, buf: &mut [u8]) -> ZResult<()> {
        let mut read = 0;
        while read < buf.len() {
            let n = self.read(&mut buf[read..])?;
            if n == 0 {
                return zlite_core::zerror!(zlite_core::error::ZErrorKind::IoError {
                    descr: "link closed before exact read completed".into()
                });
            }
            read += n;
        }
        Ok(())
    }

    fn close(&self) -> ZResult<()>;

    /// `true` for byte-stream links (TCP), `false` for datagram links (UDP):
    /// determines whether the wire codec must prefix each message with its
    /// length.
    fn is_streamed(&self) -> bool;

    fn mtu(&self) -> usize {
        DEFAULT_MTU
    }

    fn get_src(&self) -> &Locator;
    fn get_dst(&self) -> &Locator;
}
