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
//! `sn_precedes` is the sole ordering mechanism for sequence numbers: no
//! counter is ever compared directly, since they wrap `mod sn_resolution`.
use zlite_core::zint::ZInt;

/// `true` iff `a` comes strictly before `b` in the circular SN space of
/// half-window `half` (`half == sn_resolution / 2`).
///
/// For an odd `sn_resolution` this is a total order modulo the window: for
/// every `a != b` exactly one of `sn_precedes(a, b)`/`sn_precedes(b, a)`
/// holds. For an even `sn_resolution` the single antipodal pair at exactly
/// `diff == half` is, as in any circular sequence-number scheme (e.g.
/// TCP's), ambiguous in both directions; zlite resolves it the same way as
/// every other `diff <= half` pair, which is enough since the reorder
/// window in practice never spans half of a 2^28-sized space.
pub fn sn_precedes(half: ZInt, sn_resolution: ZInt, a: ZInt, b: ZInt) -> bool {
    let a = a % sn_resolution;
    let b = b % sn_resolution;
    let diff = (b + sn_resolution - a) % sn_resolution;
    diff > 0 && diff <= half
}

#[cfg(test)]
mod tests {
    use super::*;

    // odd resolution: no antipodal tie, so the "exactly one direction"
    // property holds for every distinct pair, not just almost every pair.
    const RES: ZInt = 15;
    const HALF: ZInt = RES / 2;

    #[test]
    fn adjacent_precedes() {
        assert!(sn_precedes(HALF, RES, 0, 1));
        assert!(!sn_precedes(HALF, RES, 1, 0));
    }

    #[test]
    fn wraps_around() {
        assert!(sn_precedes(HALF, RES, RES - 1, 0));
        assert!(!sn_precedes(HALF, RES, 0, RES - 1));
    }

    #[test]
    fn equal_is_neither() {
        assert!(!sn_precedes(HALF, RES, 5, 5));
    }

    #[test]
    fn exactly_one_direction_holds_for_every_distinct_pair() {
        for a in 0..RES {
            for b in 0..RES {
                if a == b {
                    continue;
                }
                let ab = sn_precedes(HALF, RES, a, b);
                let ba = sn_precedes(HALF, RES, b, a);
                assert!(
                    ab ^ ba,
                    "exactly one of sn_precedes(a,b)/sn_precedes(b,a) should hold for a={} b={}",
                    a,
                    b
                );
            }
        }
    }
}
