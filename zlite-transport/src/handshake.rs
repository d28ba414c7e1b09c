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
//! §4.4/§4.5: client-side discovery and the 4-way `INIT`/`OPEN` handshake,
//! plus the best-effort `CLOSE` a session sends on its way out.
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::Ordering;
use std::time::Duration;

use zlite_core::capability::{Clock, Prng};
use zlite_core::config::{self, keys, Config};
use zlite_core::core_types::{whatami, PeerId};
use zlite_core::error::{ZErrorKind, ZResult};
use zlite_core::zerror;
use zlite_core::zint::ZInt;
use zlite_link::locator::EndPoint;
use zlite_link::udp::UdpLink;
use zlite_link::Link;
use zlite_wire::buf::{RBuf, WBuf};
use zlite_wire::codec::{decode_transport_message, encode_transport_message, write_framed};
use zlite_wire::transport::{CloseReason, TransportMessage};

use crate::config::{PROTOCOL_DEFAULT_SN_RESOLUTION, ZN_DEFAULT_LEASE, ZN_MULTICAST_ADDRESS, ZN_SCOUT_PERIOD, ZN_SN_RESOLUTION};
use crate::state::{SessionLifecycle, SessionState};

/// Peer ids are 16 bytes by default (§3 Data model).
const PID_LEN: usize = 16;
/// Wire version byte carried on `INIT-Syn`/`INIT-Ack`.
const PROTOCOL_VERSION: u8 = 0;
/// Conservative receive buffer for a HELLO/transport datagram.
const SCOUT_RECV_BUF: usize = 2048;

fn generate_pid(prng: &dyn Prng) -> PeerId {
    let mut bytes = [0u8; PID_LEN];
    prng.fill_bytes(&mut bytes);
    PeerId::from_slice(&bytes)
}

fn io_err(descr: impl Into<String>) -> zlite_core::error::ZError {
    zlite_core::error::ZError::new(ZErrorKind::IoError { descr: descr.into() }, file!(), line!())
}

/// Writes one transport message to `link`, framing it with a length prefix
/// when the link is a byte stream (TCP); a datagram link is already one
/// frame per write.
pub(crate) fn send_transport_message(link: &dyn Link, msg: &TransportMessage) -> ZResult<()> {
    if link.is_streamed() {
        link.write_all(&write_framed(msg)?)
    } else {
        let mut w = WBuf::new();
        encode_transport_message(&mut w, msg)?;
        link.write_all(&w.into_vec())
    }
}

/// Reads exactly one transport message from `link`: for a byte stream this
/// reads the zint length prefix one byte at a time before reading the body,
/// since nothing is known about framing boundaries ahead of the read.
fn recv_transport_message(link: &dyn Link) -> ZResult<TransportMessage> {
    if link.is_streamed() {
        let mut len_bytes = Vec::new();
        loop {
            let mut b = [0u8; 1];
            link.read_exact(&mut b)?;
            let more = b[0] & 0x80 != 0;
            len_bytes.push(b[0]);
            if !more {
                break;
            }
        }
        let (len, _) = zlite_core::zint::decode_zint(&len_bytes)?;
        let mut body = vec![0u8; len as usize];
        link.read_exact(&mut body)?;
        let mut r = RBuf::new(&body);
        let msg = decode_transport_message(&mut r)?;
        r.expect_exhausted()?;
        Ok(msg)
    } else {
        let mut buf = vec![0u8; link.mtu()];
        let n = link.read(&mut buf)?;
        let mut r = RBuf::new(&buf[..n]);
        decode_transport_message(&mut r)
    }
}

/// Best-effort `CLOSE`, per §4.5: the caller tears down the link regardless
/// of whether this write succeeds.
pub fn send_close(link: &dyn Link, reason: CloseReason, link_only: bool) {
    let _ = send_transport_message(link, &TransportMessage::Close { reason, link_only });
}

/// §4.4 rule 1: multicast-scout for a router, returning the first locator of
/// the first `HELLO` received before `scouting_timeout` elapses.
pub fn scout(config: &Config, clock: &dyn Clock) -> ZResult<String> {
    let multicast_address = config::get_or(config, keys::MULTICAST_ADDRESS, &ZN_MULTICAST_ADDRESS);
    let timeout_secs = config::get_f64(config, keys::SCOUTING_TIMEOUT, 1.0).max(0.0);
    let period = Duration::from_millis(*ZN_SCOUT_PERIOD);
    let deadline = clock.now() + Duration::from_secs_f64(timeout_secs);

    let group_addr: SocketAddr = multicast_address
        .parse()
        .map_err(|_| io_err(format!("invalid multicast address '{}'", multicast_address)))?;
    let group = match group_addr.ip() {
        IpAddr::V4(v4) => v4,
        IpAddr::V6(_) => {
            return zerror!(ZErrorKind::ParseError {
                descr: "multicast scouting only supports IPv4 groups".into()
            })
        }
    };
    let bind_addr = format!("0.0.0.0:{}", group_addr.port());
    let link = UdpLink::multicast(&bind_addr, group)?;
    link.set_read_timeout(Some(period))?;

    let mut w = WBuf::new();
    encode_transport_message(
        &mut w,
        &TransportMessage::Scout {
            what: whatami::ROUTER,
            pid_request: false,
        },
    )?;
    let scout_payload = w.into_vec();

    loop {
        link.send_to(&scout_payload, group_addr)?;
        let mut buf = [0u8; SCOUT_RECV_BUF];
        if let Ok((n, _from)) = link.recv_from(&mut buf) {
            let mut r = RBuf::new(&buf[..n]);
            if let Ok(TransportMessage::Hello { locators, .. }) = decode_transport_message(&mut r) {
                if let Some(first) = locators.into_iter().next() {
                    return Ok(first);
                }
            }
        }
        if clock.now() >= deadline {
            return zerror!(ZErrorKind::Timeout {
                descr: "no HELLO received before scouting_timeout expired".into()
            });
        }
    }
}

/// Resolves the locator to connect to: the configured `peer`, or the result
/// of [`scout`] when `multicast_scouting` is enabled and no `peer` was
/// given.
fn resolve_endpoint(config: &Config, clock: &dyn Clock) -> ZResult<EndPoint> {
    if let Some(peer) = config.get(keys::PEER) {
        return EndPoint::parse(peer);
    }
    if config::get_bool(config, keys::MULTICAST_SCOUTING, true) {
        let locator = scout(config, clock)?;
        return EndPoint::parse(&locator);
    }
    zerror!(ZErrorKind::StateError {
        descr: "no peer locator configured and multicast scouting disabled".into()
    })
}

/// §4.4: the full client handshake, from endpoint resolution through
/// `ESTABLISHED`.
pub fn open(whatami_role: ZInt, config: &Config, prng: &dyn Prng, clock: &dyn Clock) -> ZResult<SessionState> {
    let endpoint = resolve_endpoint(config, clock)?;
    let link = zlite_link::open_link(&endpoint)?;
    let local_pid = generate_pid(prng);
    let lease_ms = *ZN_DEFAULT_LEASE;

    let proposed_resolution = *ZN_SN_RESOLUTION;
    let init_syn_resolution = if proposed_resolution != PROTOCOL_DEFAULT_SN_RESOLUTION {
        Some(proposed_resolution)
    } else {
        None
    };

    send_transport_message(
        link.as_ref(),
        &TransportMessage::InitSyn {
            version: PROTOCOL_VERSION,
            whatami: whatami_role,
            pid: local_pid.clone(),
            sn_resolution: init_syn_resolution,
        },
    )?;

    let (remote_pid, sn_resolution, cookie) = match recv_transport_message(link.as_ref())? {
        TransportMessage::InitAck {
            pid,
            sn_resolution: ack_resolution,
            cookie,
            ..
        } => {
            let sn_resolution = match ack_resolution {
                Some(peer_resolution) => {
                    if peer_resolution > proposed_resolution {
                        send_close(link.as_ref(), CloseReason::Invalid, false);
                        return zerror!(ZErrorKind::ProtocolError {
                            descr: "peer proposed a larger sn_resolution than offered".into()
                        });
                    }
                    peer_resolution
                }
                None => proposed_resolution,
            };
            (pid, sn_resolution, cookie)
        }
        TransportMessage::Close { reason, .. } => {
            return zerror!(ZErrorKind::StateError {
                descr: format!("peer closed during INIT: {:?}", reason)
            })
        }
        other => {
            send_close(link.as_ref(), CloseReason::Invalid, false);
            return zerror!(ZErrorKind::ProtocolError {
                descr: format!("expected INIT-Ack, got {:?}", other)
            });
        }
    };

    let initial_sn = prng.gen_range(sn_resolution.max(1));

    send_transport_message(
        link.as_ref(),
        &TransportMessage::OpenSyn {
            lease: lease_ms,
            initial_sn,
            cookie,
        },
    )?;

    let peer_initial_sn = match recv_transport_message(link.as_ref())? {
        TransportMessage::OpenAck { initial_sn, .. } => initial_sn,
        TransportMessage::Close { reason, .. } => {
            return zerror!(ZErrorKind::StateError {
                descr: format!("peer closed during OPEN: {:?}", reason)
            })
        }
        other => {
            send_close(link.as_ref(), CloseReason::Invalid, false);
            return zerror!(ZErrorKind::ProtocolError {
                descr: format!("expected OPEN-Ack, got {:?}", other)
            });
        }
    };

    let state = SessionState::new(local_pid, sn_resolution, initial_sn, lease_ms);
    // The peer's own initial_sn, not ours, is what its first FRAME will
    // carry: seed the RX counters from it rather than from our own.
    state.sn.rx_reliable.store(peer_initial_sn, Ordering::SeqCst);
    state.sn.rx_best_effort.store(peer_initial_sn, Ordering::SeqCst);
    *state.remote_pid.lock().unwrap() = Some(remote_pid);
    state.set_link(link);
    state.set_lifecycle(SessionLifecycle::Established);
    Ok(state)
}

/// §4.5: transitions a session into `CLOSING`, attempts a best-effort
/// `CLOSE`, then tears the link down and marks the session `CLOSED`.
pub fn close(state: &SessionState, reason: CloseReason) {
    state.set_lifecycle(SessionLifecycle::Closing);
    state.with_link(|l| send_close(l, reason, false));
    state.with_link(|l| {
        let _ = l.close();
    });
    state.set_lifecycle(SessionLifecycle::Closed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;
    use zlite_core::capability::{DeterministicPrng, ManualClock};
    use zlite_link::tcp::TcpLink;

    fn spawn_router_accepting_one(listener: TcpListener, sn_resolution: Option<u64>) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let router_link = TcpLink::from_stream(stream).unwrap();

            let syn = recv_transport_message(&router_link).unwrap();
            let requested_pid = match syn {
                TransportMessage::InitSyn { pid, .. } => pid,
                other => panic!("expected INIT-Syn, got {:?}", other),
            };

            send_transport_message(
                &router_link,
                &TransportMessage::InitAck {
                    version: PROTOCOL_VERSION,
                    whatami: whatami::ROUTER,
                    pid: requested_pid,
                    sn_resolution,
                    cookie: vec![0xC0, 0x0F, 0xEE],
                },
            )
            .unwrap();

            let open_syn = recv_transport_message(&router_link).unwrap();
            match open_syn {
                TransportMessage::OpenSyn { .. } => {}
                other => panic!("expected OPEN-Syn, got {:?}", other),
            }

            send_transport_message(
                &router_link,
                &TransportMessage::OpenAck {
                    lease: 10_000,
                    initial_sn: 7,
                },
            )
            .unwrap();
        })
    }

    #[test]
    fn full_handshake_establishes_session() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let router = spawn_router_accepting_one(listener, None);

        let mut config = Config::new();
        config.insert(keys::PEER.to_string(), format!("tcp/{}", addr));

        let prng = DeterministicPrng::new(42);
        let clock = ManualClock::default();
        let state = open(whatami::CLIENT, &config, &prng, &clock).unwrap();

        assert_eq!(state.lifecycle(), SessionLifecycle::Established);
        assert!(state.remote_pid.lock().unwrap().is_some());
        assert_eq!(state.sn.rx_reliable.load(Ordering::SeqCst), 7);

        router.join().unwrap();
    }

    #[test]
    fn no_peer_and_no_scouting_is_an_error() {
        let mut config = Config::new();
        config.insert(keys::MULTICAST_SCOUTING.to_string(), "false".to_string());
        let clock = ManualClock::default();
        assert!(resolve_endpoint(&config, &clock).is_err());
    }
}
