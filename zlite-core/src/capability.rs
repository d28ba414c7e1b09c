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
//! Session-scoped capabilities for randomness and time, so tests can inject
//! a deterministic stream instead of depending on a global PRNG seeded from
//! wall-clock time (see the Design Notes on the global PRNG).
use rand::RngCore;
use std::time::{Duration, Instant};

/// A source of randomness used to generate peer ids and initial SNs.
pub trait Prng: Send + Sync {
    fn next_u64(&self) -> u64;

    fn gen_range(&self, bound: u64) -> u64 {
        if bound == 0 {
            0
        } else {
            self.next_u64() % bound
        }
    }

    fn fill_bytes(&self, buf: &mut [u8]);
}

/// The real, OS-backed PRNG.
#[derive(Default)]
pub struct OsPrng;

impl Prng for OsPrng {
    fn next_u64(&self) -> u64 {
        rand::thread_rng().next_u64()
    }

    fn fill_bytes(&self, buf: &mut [u8]) {
        rand::thread_rng().fill_bytes(buf);
    }
}

/// A source of monotonic time, used for lease/keep-alive bookkeeping and
/// scouting timeouts.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real, OS-backed clock.
#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A deterministic PRNG for tests: a fixed seed plus a simple
/// xorshift-style generator so sequences are reproducible across runs.
pub struct DeterministicPrng {
    state: std::sync::atomic::AtomicU64,
}

impl DeterministicPrng {
    pub fn new(seed: u64) -> Self {
        DeterministicPrng {
            state: std::sync::atomic::AtomicU64::new(seed | 1),
        }
    }
}

impl Prng for DeterministicPrng {
    fn next_u64(&self) -> u64 {
        use std::sync::atomic::Ordering;
        let mut x = self.state.load(Ordering::Relaxed);
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state.store(x, Ordering::Relaxed);
        x
    }

    fn fill_bytes(&self, buf: &mut [u8]) {
        for chunk in buf.chunks_mut(8) {
            let v = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&v[..chunk.len()]);
        }
    }
}

/// A clock that only advances when told to, for deterministic lease tests.
pub struct ManualClock {
    epoch: Instant,
    offset: std::sync::Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock {
            epoch: Instant::now(),
            offset: std::sync::Mutex::new(Duration::ZERO),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.epoch + *self.offset.lock().unwrap()
    }
}
