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
//! The record a transport owns exclusively: peer identities, the four SN
//! counters and the link. The registry (resources/subs/pubs/queryables)
//! lives one layer up, in `zlite::session`, since it has no bearing on
//! framing or the handshake.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use zlite_core::core_types::PeerId;
use zlite_link::Link;

use crate::sn::sn_precedes;

/// `UNINIT → INIT_SENT → OPEN_SENT → ESTABLISHED → CLOSING → CLOSED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLifecycle {
    Uninit,
    InitSent,
    OpenSent,
    Established,
    Closing,
    Closed,
}

/// Per-lane sequence-number counters, each kept `mod sn_resolution`.
#[derive(Default)]
pub struct SnCounters {
    pub tx_reliable: AtomicU64,
    pub tx_best_effort: AtomicU64,
    pub rx_reliable: AtomicU64,
    pub rx_best_effort: AtomicU64,
}

impl SnCounters {
    pub fn seeded(initial_sn: u64) -> SnCounters {
        SnCounters {
            tx_reliable: AtomicU64::new(initial_sn),
            tx_best_effort: AtomicU64::new(initial_sn),
            rx_reliable: AtomicU64::new(initial_sn),
            rx_best_effort: AtomicU64::new(initial_sn),
        }
    }

    /// Returns the next reliable-lane TX sn and advances the counter.
    pub fn next_tx_reliable(&self, sn_resolution: u64) -> u64 {
        Self::advance(&self.tx_reliable, sn_resolution)
    }

    pub fn next_tx_best_effort(&self, sn_resolution: u64) -> u64 {
        Self::advance(&self.tx_best_effort, sn_resolution)
    }

    fn advance(counter: &AtomicU64, sn_resolution: u64) -> u64 {
        let mut cur = counter.load(Ordering::SeqCst);
        loop {
            let next = (cur + 1) % sn_resolution;
            match counter.compare_exchange_weak(cur, next, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(prev) => return prev,
                Err(actual) => cur = actual,
            }
        }
    }
}

/// Whether an inbound `FRAME`'s sn is acceptable on a given lane, and the
/// window check each lane applies to it (reliable: drop the session,
/// best-effort: drop the frame).
pub fn accept_inbound_sn(half: u64, sn_resolution: u64, expected: u64, received: u64) -> bool {
    received == expected || sn_precedes(half, sn_resolution, expected, received)
}

/// State owned exclusively by one session: identities, SN bookkeeping, lease
/// and the underlying link. Registry and dispatch live above this.
pub struct SessionState {
    pub local_pid: PeerId,
    pub remote_pid: Mutex<Option<PeerId>>,
    pub sn_resolution: u64,
    pub sn_resolution_half: u64,
    pub sn: SnCounters,
    pub lease_ms: u64,
    pub lifecycle: Mutex<SessionLifecycle>,
    link: Mutex<Option<Box<dyn Link>>>,
    tx_lock: Mutex<()>,
}

impl SessionState {
    pub fn new(local_pid: PeerId, sn_resolution: u64, initial_sn: u64, lease_ms: u64) -> SessionState {
        SessionState {
            local_pid,
            remote_pid: Mutex::new(None),
            sn_resolution,
            sn_resolution_half: sn_resolution / 2,
            sn: SnCounters::seeded(initial_sn),
            lease_ms,
            lifecycle: Mutex::new(SessionLifecycle::Uninit),
            link: Mutex::new(None),
            tx_lock: Mutex::new(()),
        }
    }

    pub fn set_link(&self, link: Box<dyn Link>) {
        *self.link.lock().unwrap() = Some(link);
    }

    pub fn with_link<R>(&self, f: impl FnOnce(&dyn Link) -> R) -> Option<R> {
        self.link.lock().unwrap().as_deref().map(f)
    }

    /// The exclusive TX-side lock: §4.7 requires SN assignment, framing and
    /// the write to happen as one atomic step per outbound message.
    pub fn tx_lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.tx_lock.lock().unwrap()
    }

    pub fn lifecycle(&self) -> SessionLifecycle {
        *self.lifecycle.lock().unwrap()
    }

    pub fn set_lifecycle(&self, s: SessionLifecycle) {
        *self.lifecycle.lock().unwrap() = s;
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            self.lifecycle(),
            SessionLifecycle::Closing | SessionLifecycle::Closed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sn_counters_wrap() {
        let c = SnCounters::seeded(0);
        for _ in 0..5 {
            c.next_tx_reliable(5);
        }
        assert_eq!(c.tx_reliable.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn inbound_accepts_expected_and_in_window() {
        assert!(accept_inbound_sn(8, 16, 3, 3));
        assert!(accept_inbound_sn(8, 16, 3, 4));
        assert!(!accept_inbound_sn(8, 16, 3, 2));
    }
}
