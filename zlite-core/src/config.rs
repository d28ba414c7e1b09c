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
//! Declares lazily-initialized constants that can be overridden at process
//! start by an environment variable of the same name, without touching the
//! call sites that reference them. Mirrors the `zconfigurable!` macro used
//! throughout the teacher codebase (e.g. the API channel-size constants in
//! `zenoh/src/net/session.rs`).
use std::collections::HashMap;

/// A session configuration: a plain string-to-string map, the way the
/// teacher's own `Properties` is passed around before being parsed.
pub type Config = HashMap<String, String>;

/// Well-known configuration keys.
pub mod keys {
    pub const MODE: &str = "mode";
    pub const PEER: &str = "peer";
    pub const MULTICAST_SCOUTING: &str = "multicast_scouting";
    pub const MULTICAST_ADDRESS: &str = "multicast_address";
    pub const MULTICAST_INTERFACE: &str = "multicast_interface";
    pub const SCOUTING_TIMEOUT: &str = "scouting_timeout";
    pub const USER: &str = "user";
    pub const PASSWORD: &str = "password";
}

/// Looks up `key`, falling back to `default` when absent.
pub fn get_or<'a>(config: &'a Config, key: &str, default: &'a str) -> &'a str {
    config.get(key).map(String::as_str).unwrap_or(default)
}

/// Parses `key` as a bool, falling back to `default` on absence or a value
/// that doesn't parse.
pub fn get_bool(config: &Config, key: &str, default: bool) -> bool {
    config
        .get(key)
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(default)
}

/// Parses `key` as an `f64`, falling back to `default` on absence or a value
/// that doesn't parse. Used for `scouting_timeout`, expressed in seconds.
pub fn get_f64(config: &Config, key: &str, default: f64) -> f64 {
    config
        .get(key)
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
}

/// Declares one or more `static ref NAME: Type = default_expr;` constants
/// whose value can be overridden by setting the environment variable `NAME`
/// to a value parseable via `FromStr`.
#[macro_export]
macro_rules! zconfigurable {
    ($(#[$attr:meta])* $vis:vis static ref $N:ident : $T:ty = $e:expr; $($t:tt)*) => {
        ::lazy_static::lazy_static! {
            $(#[$attr])*
            $vis static ref $N: $T = {
                match ::std::env::var(stringify!($N)) {
                    Ok(val) => val.parse::<$T>().unwrap_or_else(|_| $e),
                    Err(_) => $e,
                }
            };
        }
        $crate::zconfigurable!($($t)*);
    };
    () => {};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_when_key_absent() {
        let config = Config::new();
        assert_eq!(get_or(&config, keys::MODE, "client"), "client");
        assert!(!get_bool(&config, keys::MULTICAST_SCOUTING, false));
        assert_eq!(get_f64(&config, keys::SCOUTING_TIMEOUT, 1.0), 1.0);
    }

    #[test]
    fn parses_present_values() {
        let mut config = Config::new();
        config.insert(keys::MULTICAST_SCOUTING.to_string(), "true".to_string());
        config.insert(keys::SCOUTING_TIMEOUT.to_string(), "2.5".to_string());
        assert!(get_bool(&config, keys::MULTICAST_SCOUTING, false));
        assert_eq!(get_f64(&config, keys::SCOUTING_TIMEOUT, 1.0), 2.5);
    }

    #[test]
    fn unparseable_value_falls_back_to_default() {
        let mut config = Config::new();
        config.insert(keys::SCOUTING_TIMEOUT.to_string(), "not-a-number".to_string());
        assert_eq!(get_f64(&config, keys::SCOUTING_TIMEOUT, 1.0), 1.0);
    }
}
