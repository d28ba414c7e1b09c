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
//! `WBuf`/`RBuf`: the write and read cursors the codec builds frames with.
//! Byte strings and UTF-8 strings both carry a zint length prefix; every
//! multi-byte integer on the wire is a zint.
use zlite_core::error::{ZErrorKind, ZResult};
use zlite_core::zerror;
use zlite_core::zint::{decode_zint, encode_zint, ZInt};

/// An append-only output buffer.
#[derive(Default)]
pub struct WBuf {
    bytes: Vec<u8>,
}

impl WBuf {
    pub fn new() -> WBuf {
        WBuf::default()
    }

    pub fn write_byte(&mut self, b: u8) {
        self.bytes.push(b);
    }

    pub fn write_zint(&mut self, v: ZInt) {
        encode_zint(&mut self.bytes, v);
    }

    pub fn write_bytes(&mut self, b: &[u8]) {
        self.write_zint(b.len() as ZInt);
        self.bytes.extend_from_slice(b);
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    pub fn write_slice_raw(&mut self, b: &[u8]) {
        self.bytes.extend_from_slice(b);
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A read cursor over a borrowed byte slice.
pub struct RBuf<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> RBuf<'a> {
    pub fn new(bytes: &'a [u8]) -> RBuf<'a> {
        RBuf { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn truncated() -> zlite_core::error::ZError {
        zlite_core::error::ZError::new(
            ZErrorKind::ProtocolError {
                descr: "truncated frame".into(),
            },
            file!(),
            line!(),
        )
    }

    pub fn read_byte(&mut self) -> ZResult<u8> {
        if self.pos >= self.bytes.len() {
            return Err(Self::truncated());
        }
        let b = self.bytes[self.pos];
        self.pos += 1;
        Ok(b)
    }

    pub fn peek_byte(&self) -> ZResult<u8> {
        self.bytes.get(self.pos).copied().ok_or_else(Self::truncated)
    }

    pub fn read_zint(&mut self) -> ZResult<ZInt> {
        let (v, n) = decode_zint(&self.bytes[self.pos..])?;
        self.pos += n;
        Ok(v)
    }

    pub fn read_bytes(&mut self) -> ZResult<Vec<u8>> {
        let len = self.read_zint()? as usize;
        if self.remaining() < len {
            return Err(Self::truncated());
        }
        let out = self.bytes[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(out)
    }

    pub fn read_string(&mut self) -> ZResult<String> {
        let raw = self.read_bytes()?;
        String::from_utf8(raw).map_err(|_| {
            zlite_core::error::ZError::new(
                ZErrorKind::ProtocolError {
                    descr: "non-utf8 string field".into(),
                },
                file!(),
                line!(),
            )
        })
    }

    pub fn read_slice_raw(&mut self, len: usize) -> ZResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(Self::truncated());
        }
        let out = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn expect_exhausted(&self) -> ZResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            zerror!(ZErrorKind::ProtocolError {
                descr: format!("{} trailing bytes after decode", self.remaining())
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_string_round_trip() {
        let mut w = WBuf::new();
        w.write_zint(42);
        w.write_bytes(b"hello");
        w.write_string("world");
        let bytes = w.into_vec();
        let mut r = RBuf::new(&bytes);
        assert_eq!(r.read_zint().unwrap(), 42);
        assert_eq!(r.read_bytes().unwrap(), b"hello");
        assert_eq!(r.read_string().unwrap(), "world");
        assert!(r.is_empty());
    }

    #[test]
    fn truncated_read_is_error() {
        let bytes = vec![5u8, b'h', b'i']; // claims length 5, only 2 bytes follow
        let mut r = RBuf::new(&bytes);
        assert!(r.read_bytes().is_err());
    }
}
