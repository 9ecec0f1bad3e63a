//! BDC sender FSM (spec §4.6): *Idle* → *Registered* → *Armed* → *Sending* →
//! *Idle*, with an explicit *Failed* exit on a send-collaborator failure.
//!
//! Grounded on the send `PROCESS_THREAD` in `mtk_bulk_data_collection.c`
//! (`pick_next_to_send`, the `period_ms`-paced loop clearing bits out of
//! `mask`). Folds the request→send coupling described in spec §4.6/§9 into
//! this FSM via [`Sender::on_request`]: the original left the decision to
//! start sending in response to an inbound *request* event up to the host.

use core::time::Duration;

use kernel::config::SUBPACKET_MAX_BYTES;
use kernel::hil::udp::NetworkAddress;

use super::{num_sub_packets, whole_mask};
use crate::net::errors::BdcError;
use crate::net::wire::RequestFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    Idle,
    Registered,
    Armed,
    Sending,
    Failed,
}

/// What the host loop must do after feeding the FSM an event or polling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderEvent<'a> {
    /// Transmit sub-packet `index` of `n_sub_packets` to `(addr, port)`.
    /// `payload` is a borrow into the registered buffer — valid only until
    /// the next call into the [`Sender`].
    Transmit {
        addr: NetworkAddress,
        port: u16,
        index: u8,
        n_sub_packets: u8,
        payload: &'a [u8],
    },
    /// The session completed: every bit in `mask` was cleared.
    Done,
    /// A transmit attempt failed; the session aborted.
    Failed,
}

/// One BDC sender subsystem instance. `sending` (spec §5 "global flag") is
/// just this struct's own state: a node is expected to run one `Sender`.
pub struct Sender<'a> {
    state: SenderState,
    packet_id: u16,
    payload: &'a [u8],
    num_sub_packets: u8,
    mask: u64,
    peer_addr: NetworkAddress,
    peer_port: u16,
    period_ms: u16,
    next_send_at: Duration,
}

impl<'a> Sender<'a> {
    pub fn new() -> Self {
        Sender {
            state: SenderState::Idle,
            packet_id: 0,
            payload: &[],
            num_sub_packets: 0,
            mask: 0,
            peer_addr: NetworkAddress::UNSPECIFIED,
            peer_port: 0,
            period_ms: 0,
            next_send_at: Duration::ZERO,
        }
    }

    pub fn state(&self) -> SenderState {
        self.state
    }

    /// Register a payload for later transmission (`mtk_bdc_register_tx`).
    /// Validates `len <= MAX_NUMBER_OF_SUBPACKETS * SUBPACKET_MAX_BYTES`.
    pub fn register_tx(&mut self, packet_id: u16, payload: &'a [u8]) -> Result<(), BdcError> {
        if self.state == SenderState::Sending {
            return Err(BdcError::Busy);
        }
        if payload.len() > kernel::config::MAX_NUMBER_OF_SUBPACKETS * SUBPACKET_MAX_BYTES {
            log::warn!("packet too large ({} bytes)", payload.len());
            return Err(BdcError::TooLarge);
        }
        self.packet_id = packet_id;
        self.payload = payload;
        self.num_sub_packets = num_sub_packets(payload.len());
        self.mask = 0;
        self.state = SenderState::Registered;
        log::debug!(
            "registered for transmission: packet {}, len {}, num_sub_packets {}",
            packet_id,
            payload.len(),
            self.num_sub_packets
        );
        Ok(())
    }

    /// Handle an inbound request targeted at `self.packet_id`. Ignored if it
    /// names a different `packet_id` (spec §9: no cross-source guard, but a
    /// mismatched id here is simply not for this session) or if nothing has
    /// ever been registered. A request arriving after a prior session
    /// completed (`Idle`) still re-arms: per §4.6, an instance that isn't
    /// actively `Sending` has its dormant session cancelled and a new one
    /// launched, so retransmission requests keep working after the sender's
    /// first pass has already finished.
    pub fn on_request(&mut self, request: &RequestFrame, peer_addr: NetworkAddress, peer_port: u16, now: Duration) {
        if request.packet_id != self.packet_id || self.num_sub_packets == 0 {
            log::debug!("large packet sending requested while not available");
            return;
        }
        let _ = self.send(request.mask, peer_addr, peer_port, request.period_ms, now);
    }

    /// Start (or restart) sending `mask`'s worth of sub-packets. Cancels any
    /// dormant (non-`Sending`) session state first; fails with `Busy` if a
    /// session is actively `Sending`. Fails with `NotRegistered` if
    /// `register_tx` was never called (`num_sub_packets == 0` is otherwise
    /// impossible once registered, since `register_tx` rejects empty
    /// payloads' worth of sub-packets only via a non-zero length).
    pub fn send(
        &mut self,
        mask: u64,
        peer_addr: NetworkAddress,
        peer_port: u16,
        period_ms: u16,
        now: Duration,
    ) -> Result<(), BdcError> {
        if self.num_sub_packets == 0 {
            return Err(BdcError::NotRegistered);
        }
        if self.state == SenderState::Sending {
            return Err(BdcError::Busy);
        }
        if period_ms == 0 {
            return Err(BdcError::InvalidArgument);
        }
        self.mask = mask & whole_mask(self.num_sub_packets);
        self.peer_addr = peer_addr;
        self.peer_port = peer_port;
        self.period_ms = period_ms;
        self.next_send_at = now;
        self.state = SenderState::Armed;
        Ok(())
    }

    /// Cancel the in-flight or dormant session, clearing the session
    /// regardless of state (spec §5: cancellation clears `sending` on
    /// cancellation as well as completion).
    pub fn cancel(&mut self) {
        self.state = SenderState::Idle;
        self.mask = 0;
    }

    fn sub_packet_len(&self, index: u8) -> usize {
        let last = self.num_sub_packets - 1;
        if index == last {
            self.payload.len() - last as usize * SUBPACKET_MAX_BYTES
        } else {
            SUBPACKET_MAX_BYTES
        }
    }

    /// Advance the sending loop. Returns `None` if it isn't yet time for the
    /// next pacing tick, or the session isn't `Armed`/`Sending`.
    pub fn poll(&mut self, now: Duration) -> Option<SenderEvent<'a>> {
        match self.state {
            SenderState::Armed | SenderState::Sending => {}
            _ => return None,
        }
        if now < self.next_send_at {
            return None;
        }
        if self.mask == 0 {
            log::debug!("large packet sent: OK");
            self.state = SenderState::Idle;
            return Some(SenderEvent::Done);
        }
        self.state = SenderState::Sending;
        let index = self.mask.trailing_zeros() as u8;
        let len = self.sub_packet_len(index);
        let offset = index as usize * SUBPACKET_MAX_BYTES;
        let payload = &self.payload[offset..offset + len];
        self.next_send_at = now + Duration::from_millis(self.period_ms as u64);
        Some(SenderEvent::Transmit {
            addr: self.peer_addr,
            port: self.peer_port,
            index,
            n_sub_packets: self.num_sub_packets,
            payload,
        })
    }

    /// Report the outcome of the transmit the last `poll()` requested:
    /// `true` clears the bit (spec §4.6 step 4), `false` aborts to *Failed*.
    pub fn ack_transmit(&mut self, index: u8, success: bool) -> Option<SenderEvent<'a>> {
        if self.state != SenderState::Sending {
            return None;
        }
        if !success {
            log::error!("large packet sent: Failed (sub-packet {})", index);
            self.state = SenderState::Failed;
            self.mask = 0;
            return Some(SenderEvent::Failed);
        }
        self.mask &= !(1u64 << index);
        None
    }
}

impl<'a> Default for Sender<'a> {
    fn default() -> Self {
        Self::new()
    }
}
