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
use std::fmt;

/// The kind of a [`ZError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZErrorKind {
    /// A locator, endpoint or config string could not be parsed.
    ParseError { descr: String },
    /// A link read or write failed.
    IoError { descr: String },
    /// A malformed or inconsistent wire message.
    ProtocolError { descr: String },
    /// An operation was attempted in a state that forbids it (e.g. on a closed session).
    StateError { descr: String },
    /// An operation did not complete before its deadline.
    Timeout { descr: String },
    /// An unknown resource id or a duplicate declaration.
    Resource { descr: String },
    Other { descr: String },
}

impl fmt::Display for ZErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ZErrorKind::ParseError { descr } => write!(f, "Parse error: {}", descr),
            ZErrorKind::IoError { descr } => write!(f, "I/O error: {}", descr),
            ZErrorKind::ProtocolError { descr } => write!(f, "Protocol error: {}", descr),
            ZErrorKind::StateError { descr } => write!(f, "State error: {}", descr),
            ZErrorKind::Timeout { descr } => write!(f, "Timeout: {}", descr),
            ZErrorKind::Resource { descr } => write!(f, "Resource error: {}", descr),
            ZErrorKind::Other { descr } => write!(f, "{}", descr),
        }
    }
}

/// The error type used throughout the zlite crates.
#[derive(Debug, Clone)]
pub struct ZError {
    kind: ZErrorKind,
    file: &'static str,
    line: u32,
}

impl ZError {
    pub fn new(kind: ZErrorKind, file: &'static str, line: u32) -> ZError {
        ZError { kind, file, line }
    }

    pub fn kind(&self) -> &ZErrorKind {
        &self.kind
    }
}

impl fmt::Display for ZError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({}:{})", self.kind, self.file, self.line)
    }
}

impl std::error::Error for ZError {}

/// A `Result` specialized to [`ZError`].
pub type ZResult<T> = Result<T, ZError>;

/// Builds and returns a [`ZError`] wrapped in `Err`, stamping the call site.
#[macro_export]
macro_rules! zerror {
    ($kind:expr) => {
        Err($crate::error::ZError::new($kind, file!(), line!()))
    };
}
