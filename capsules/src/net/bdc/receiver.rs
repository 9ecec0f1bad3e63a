//! BDC receiver FSM (spec §4.5): *Idle* → *Collecting* → *Done* | *Failed*.
//!
//! Grounded on the original source's receive `PROCESS_THREAD` in
//! `mtk_bulk_data_collection.c`: a timeout of `10 * period_ms`, a
//! retransmission budget of `LP_MAX_NUM_RETRANSMISSION_REQUESTS`, and the
//! fault-injection hook (`FAULT_RATE_PERCENT`) used only by tests.

use core::time::Duration;

use kernel::config::{Config, SUBPACKET_MAX_BYTES};
use kernel::hil::udp::NetworkAddress;

use super::whole_mask;
use crate::net::wire::SubPacketFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    Idle,
    Collecting,
    Done,
    Failed,
}

/// What the host loop must do after feeding the FSM an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverEvent {
    /// The payload is fully reassembled; `len` bytes are valid in the
    /// caller-supplied destination buffer.
    Received { len: usize },
    /// A retransmission request must be sent for the given `mask` of
    /// missing sub-packets.
    RequestNeeded { mask: u64 },
    /// The retransmission budget was exhausted without completing.
    Failed,
}

/// One in-flight reception, writing into a caller-owned destination buffer.
/// Does not guard `packet_id` against concurrent transfers from different
/// sources (spec §9 open question: accepted limitation for single-peer use).
pub struct Receiver<'a> {
    state: ReceiverState,
    expected_id: u16,
    peer_addr: NetworkAddress,
    peer_port: u16,
    period_ms: u16,
    mask: u64,
    all_done_mask: u64,
    len: usize,
    budget_remaining: u8,
    next_timeout: Duration,
    dst: &'a mut [u8],
}

/// Carries the configuration needed to start a [`Receiver`]; kept separate
/// because a `Receiver<'a>` borrows its destination buffer and so cannot
/// exist before the caller has one ready.
pub struct ReceiverShell {
    max_retransmission_requests: u8,
    fault_rate_percent: u8,
}

impl ReceiverShell {
    pub fn new(config: &Config) -> Self {
        ReceiverShell {
            max_retransmission_requests: config.max_retransmission_requests,
            fault_rate_percent: config.fault_rate_percent,
        }
    }

    /// Begin collecting `expected_id` from `(peer_addr, peer_port)` into
    /// `dst`, with a `period_ms` used both for pacing and the `10x` timeout.
    pub fn start<'a>(
        &self,
        expected_id: u16,
        peer_addr: NetworkAddress,
        peer_port: u16,
        period_ms: u16,
        dst: &'a mut [u8],
        now: Duration,
    ) -> Receiver<'a> {
        Receiver {
            state: ReceiverState::Collecting,
            expected_id,
            peer_addr,
            peer_port,
            period_ms,
            mask: 0,
            // Updated once the first sub-packet tells us n_sub_packets.
            all_done_mask: 0,
            len: 0,
            budget_remaining: self.max_retransmission_requests,
            next_timeout: now + Duration::from_millis(10 * period_ms as u64),
            dst,
        }
    }

    pub fn fault_rate_percent(&self) -> u8 {
        self.fault_rate_percent
    }
}

impl<'a> Receiver<'a> {
    pub fn state(&self) -> ReceiverState {
        self.state
    }

    pub fn peer(&self) -> (NetworkAddress, u16) {
        (self.peer_addr, self.peer_port)
    }

    /// Feed an inbound sub-packet. `drop_for_fault_injection` lets a caller
    /// apply the `FAULT_RATE_PERCENT` discard roll (spec §4.5 step 1) before
    /// this is called; passing `true` has the same effect as the frame
    /// never having arrived.
    pub fn on_subpacket(
        &mut self,
        frame: &SubPacketFrame<'_>,
        now: Duration,
        drop_for_fault_injection: bool,
    ) -> Option<ReceiverEvent> {
        if self.state != ReceiverState::Collecting || drop_for_fault_injection {
            if drop_for_fault_injection {
                log::trace!("simulated packet loss by discarding sub-packet {}", frame.index);
            }
            return None;
        }
        if frame.packet_id != self.expected_id {
            log::warn!(
                "received sub-packet with id {}, expected {}",
                frame.packet_id,
                self.expected_id
            );
            self.state = ReceiverState::Failed;
            return Some(ReceiverEvent::Failed);
        }
        if self.all_done_mask == 0 {
            self.all_done_mask = whole_mask(frame.n_sub_packets);
        }

        let bit = 1u64 << frame.index;
        if self.mask & bit != 0 {
            // Duplicate: ignore (spec invariant 4, mask idempotence).
            log::trace!("duplicate sub-packet {} received", frame.index);
            return None;
        }
        self.mask |= bit;
        let offset = frame.index as usize * SUBPACKET_MAX_BYTES;
        let end = offset + frame.payload.len();
        if end > self.dst.len() {
            log::error!("sub-packet {} overruns destination buffer", frame.index);
            self.state = ReceiverState::Failed;
            return Some(ReceiverEvent::Failed);
        }
        self.dst[offset..end].copy_from_slice(frame.payload);
        self.len += frame.payload.len();
        self.next_timeout = now + Duration::from_millis(10 * self.period_ms as u64);

        if self.mask == self.all_done_mask {
            log::debug!("large packet received: {} bytes", self.len);
            self.state = ReceiverState::Done;
            Some(ReceiverEvent::Received { len: self.len })
        } else {
            None
        }
    }

    /// Drive the timeout. Returns `Some` if the timeout has actually
    /// elapsed; callers should schedule their next wakeup at
    /// `next_timeout()` rather than polling.
    pub fn on_timeout(&mut self, now: Duration) -> Option<ReceiverEvent> {
        if self.state != ReceiverState::Collecting || now < self.next_timeout {
            return None;
        }
        if self.budget_remaining == 0 {
            log::debug!("max number of re-transmission requests reached, abort");
            self.state = ReceiverState::Failed;
            return Some(ReceiverEvent::Failed);
        }
        log::debug!("timed out while receiving sub-packets, requesting retransmission");
        self.budget_remaining -= 1;
        let missing = !self.mask & self.all_done_mask;
        self.next_timeout = now + Duration::from_millis(10 * self.period_ms as u64);
        Some(ReceiverEvent::RequestNeeded { mask: missing })
    }

    pub fn next_timeout(&self) -> Duration {
        self.next_timeout
    }
}
