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
//! Resource-name matching: `*` matches exactly one path segment, `**`
//! matches one or more segments. Both sides of [`intersect`] may themselves
//! carry wildcards, since the registry matches a query/subscription pattern
//! against another pattern as well as against a concrete name.

/// Returns `true` if the two (possibly wildcarded) key expressions intersect,
/// i.e. there exists a concrete name matched by both.
pub fn intersect(a: &str, b: &str) -> bool {
    let sa: Vec<&str> = a.split('/').collect();
    let sb: Vec<&str> = b.split('/').collect();
    rec(&sa, &sb)
}

fn rec(a: &[&str], b: &[&str]) -> bool {
    match (a.first(), b.first()) {
        (None, None) => true,
        (None, Some(_)) | (Some(_), None) => false,
        (Some(&"**"), _) => {
            // ** consumes one or more segments of b, then the rest of a must
            // match what's left; ** can also match "one" by leaving the rest
            // of a to match the rest of b directly after the minimal split.
            for k in 1..=b.len() {
                if rec(&a[1..], &b[k..]) {
                    return true;
                }
            }
            false
        }
        (_, Some(&"**")) => {
            for k in 1..=a.len() {
                if rec(&a[k..], &b[1..]) {
                    return true;
                }
            }
            false
        }
        (Some(&sa0), Some(&sb0)) => {
            if sa0 == "*" || sb0 == "*" || sa0 == sb0 {
                rec(&a[1..], &b[1..])
            } else {
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert!(intersect("/a/b/c", "/a/b/c"));
        assert!(!intersect("/a/b/c", "/a/b/d"));
    }

    #[test]
    fn single_star() {
        assert!(intersect("/a/*/c", "/a/b/c"));
        assert!(!intersect("/a/*/c", "/a/b/c/d"));
    }

    #[test]
    fn double_star() {
        assert!(intersect("/sensors/**", "/sensors/room1/temp"));
        assert!(intersect("/sensors/**", "/sensors/room1"));
        assert!(!intersect("/sensors/**", "/lights/room1"));
    }

    #[test]
    fn double_star_requires_at_least_one_segment() {
        assert!(!intersect("/a/**", "/a"));
        assert!(intersect("/a/**", "/a/b"));
    }

    #[test]
    fn pattern_vs_pattern() {
        assert!(intersect("/a/*/c", "/a/b/*"));
        assert!(intersect("/**", "/a/b/c"));
        assert!(intersect("/**", "/**"));
    }
}
