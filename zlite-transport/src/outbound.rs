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
//! §4.7: assign an SN, wrap in a `FRAME` (fragmenting if the encoded body
//! would overflow the link MTU), write it, and on failure invoke
//! `on_disconnect` and retry exactly once. Also the bare, unframed
//! `KEEP_ALIVE` send for §6 `send_keep_alive`.
use zlite_core::core_types::{CongestionControl, Reliability};
use zlite_core::error::{ZErrorKind, ZResult};
use zlite_core::zerror;
use zlite_wire::codec::{encode_transport_message, encode_zenoh_message};
use zlite_wire::transport::{FramePayload, TransportMessage};
use zlite_wire::{WBuf, ZenohMessage};

use crate::handshake::send_transport_message;
use crate::state::SessionState;

/// Called once when a write to the link fails, before the single retry.
pub trait OnDisconnect: Send + Sync {
    fn on_disconnect(&self);
}

/// An `OnDisconnect` that does nothing, for links that can't usefully
/// reconnect (e.g. in tests).
pub struct NoopOnDisconnect;

impl OnDisconnect for NoopOnDisconnect {
    fn on_disconnect(&self) {}
}

fn frame_bytes(reliability: Reliability, sn: u64, payload: FramePayload) -> Vec<u8> {
    let msg = TransportMessage::Frame {
        reliability,
        sn,
        payload,
    };
    let mut w = WBuf::new();
    // infallible: every variant we construct here encodes successfully.
    encode_transport_message(&mut w, &msg).expect("frame encoding is infallible");
    w.into_vec()
}

/// The non-fragmented path always carries exactly one zenoh message per
/// `FRAME` on the outbound path (batching multiple is a router-side
/// optimization this client never performs).
fn single_message_frame(msg: &ZenohMessage, reliability: Reliability, sn: u64) -> Vec<u8> {
    frame_bytes(reliability, sn, FramePayload::Messages(vec![msg.clone()]))
}

/// Encodes `msg` as one or more `FRAME`s, splitting into MTU-sized
/// fragments when the single-message encoding overflows `mtu`.
pub fn build_frames(msg: &ZenohMessage, reliability: Reliability, sn: u64, mtu: usize) -> Vec<Vec<u8>> {
    let whole = single_message_frame(msg, reliability, sn);
    if whole.len() <= mtu {
        return vec![whole];
    }
    let mut raw = WBuf::new();
    encode_zenoh_message(&mut raw, msg);
    let raw = raw.into_vec();
    // conservative per-fragment budget: leave room for the frame header,
    // sn and the fragment's own length prefix.
    let overhead = 16;
    let chunk_size = mtu.saturating_sub(overhead).max(1);
    let chunks: Vec<&[u8]> = raw.chunks(chunk_size).collect();
    let last = chunks.len() - 1;
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            frame_bytes(
                reliability,
                sn,
                FramePayload::Fragment {
                    more: i != last,
                    data: chunk.to_vec(),
                },
            )
        })
        .collect()
}

/// §4.7 `send_zenoh_message`: assigns the lane's SN, frames the message,
/// writes it to the link, retrying once through `on_disconnect` on failure.
pub fn send_zenoh_message(
    state: &SessionState,
    msg: &ZenohMessage,
    reliability: Reliability,
    congestion: CongestionControl,
    on_disconnect: &dyn OnDisconnect,
) -> ZResult<()> {
    if state.is_closed() {
        return zerror!(ZErrorKind::StateError {
            descr: "send on a closed session".into()
        });
    }
    let _tx = state.tx_lock();
    let sn = match reliability {
        Reliability::Reliable => state.sn.next_tx_reliable(state.sn_resolution),
        Reliability::BestEffort => state.sn.next_tx_best_effort(state.sn_resolution),
    };
    let mtu = state.with_link(|l| l.mtu()).unwrap_or(zlite_link::DEFAULT_MTU);
    let frames = build_frames(msg, reliability, sn, mtu);

    for frame in &frames {
        write_with_retry(state, frame, congestion, on_disconnect)?;
    }
    Ok(())
}

/// §6 `send_keep_alive`: a bare transport-level `KEEP_ALIVE`, not wrapped in
/// a `FRAME` and carrying no sn, since it is what the peer's lease timer
/// looks for directly (`dispatch_transport_message`'s `KeepAlive` arm).
pub fn send_keep_alive(state: &SessionState) -> ZResult<()> {
    if state.is_closed() {
        return zerror!(ZErrorKind::StateError {
            descr: "send on a closed session".into()
        });
    }
    let _tx = state.tx_lock();
    let result = state.with_link(|l| send_transport_message(l, &TransportMessage::KeepAlive));
    match result {
        None => zerror!(ZErrorKind::StateError {
            descr: "no link attached to session".into()
        }),
        Some(r) => r,
    }
}

fn write_with_retry(
    state: &SessionState,
    frame: &[u8],
    congestion: CongestionControl,
    on_disconnect: &dyn OnDisconnect,
) -> ZResult<()> {
    loop {
        let result = state.with_link(|l| l.write_all(frame));
        match result {
            None => {
                return zerror!(ZErrorKind::StateError {
                    descr: "no link attached to session".into()
                })
            }
            Some(Ok(())) => return Ok(()),
            Some(Err(first_err)) => {
                on_disconnect.on_disconnect();
                match state.with_link(|l| l.write_all(frame)) {
                    Some(Ok(())) => return Ok(()),
                    Some(Err(e)) => {
                        if congestion == CongestionControl::Block && !state.is_closed() {
                            log::warn!("write failed twice under BLOCK congestion control: {}", e);
                        }
                        return Err(e);
                    }
                    None => return Err(first_err),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zlite_core::core_types::*;

    #[test]
    fn small_message_fits_in_one_frame() {
        let msg = ZenohMessage::Data {
            key: ResKey::RId(1),
            payload: b"x".to_vec(),
            data_info: None,
            congestion_control: CongestionControl::Drop,
            reply_context: None,
        };
        let frames = build_frames(&msg, Reliability::Reliable, 0, zlite_link::DEFAULT_MTU);
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn oversized_message_is_fragmented() {
        let msg = ZenohMessage::Data {
            key: ResKey::RId(1),
            payload: vec![0u8; 4096],
            data_info: None,
            congestion_control: CongestionControl::Drop,
            reply_context: None,
        };
        let frames = build_frames(&msg, Reliability::Reliable, 0, 256);
        assert!(frames.len() > 1);
    }
}
