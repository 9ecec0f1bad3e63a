//! BSS engine: UDP demux, version-compare receive logic, and the
//! Trickle-driven send path (spec §4.3-§4.4).
//!
//! Grounded on the original source's `mtk_broadcast.c` (`_init`,
//! `_register`, `_update`, `_pause`, `_resume`) and
//! `mtk_broadcast_worker.c` (`broadcast_udp_callback`,
//! `broadcast_trickle_callback`), reworked onto the `kernel::hil` collaborator
//! traits instead of the `mira_net_udp_*`/`mira_trickle_*` C API.

use core::time::Duration;
use kernel::config::{Config, VERSION_STEP};
use kernel::hil::rng::Rng;
use kernel::hil::udp::{NetworkAddress, Udp, UdpMetadata};
use kernel::ReturnCode;

use crate::net::bss::table::{BroadcastTable, UpdateHandler};
use crate::net::errors::BssError;
use crate::net::wire::BssFrame;

/// One BSS subsystem instance: a bound multicast UDP endpoint plus the item
/// table it serves.
pub struct Engine<'a, U: Udp> {
    udp: &'a U,
    multicast_addr: NetworkAddress,
    udp_port: u16,
    config: Config,
    table: BroadcastTable<'a>,
    initialized: bool,
}

impl<'a, U: Udp> Engine<'a, U> {
    pub fn new(udp: &'a U, config: Config) -> Self {
        Engine {
            udp,
            multicast_addr: NetworkAddress::UNSPECIFIED,
            udp_port: 0,
            config,
            table: BroadcastTable::new(),
            initialized: false,
        }
    }

    /// Bind the shared multicast endpoint (`mtk_broadcast_init`).
    pub fn init(&mut self, multicast_addr: NetworkAddress, udp_port: u16) -> Result<(), BssError> {
        let rc = self.udp.bind(udp_port);
        if !rc.is_success() {
            log::error!("could not open UDP connection: {rc}");
            return Err(BssError::Internal(rc));
        }
        let rc = self.udp.multicast_group_join(multicast_addr);
        if !rc.is_success() {
            log::error!("could not join multicast group: {rc}");
            return Err(BssError::Internal(rc));
        }
        self.multicast_addr = multicast_addr;
        self.udp_port = udp_port;
        self.initialized = true;
        Ok(())
    }

    /// Register a new item (`mtk_broadcast_register`). Starts the item's
    /// Trickle timer immediately, matching the original's `mtk_trickle_timer_set`
    /// call inside `mtk_int_broadcast_worker_register`.
    pub fn register(
        &mut self,
        data_id: u32,
        initial_value: &[u8],
        handler: &'a dyn UpdateHandler,
        now: Duration,
        rng: &dyn Rng,
    ) -> Result<(), BssError> {
        if !self.initialized {
            return Err(BssError::Internal(ReturnCode::EOFF));
        }
        self.table
            .register(data_id, initial_value, handler, &self.config, now, rng)
            .map_err(|rc| match rc {
                ReturnCode::ENOMEM => BssError::NoMemory,
                other => BssError::Internal(other),
            })
    }

    /// Locally overwrite an item's value, bump its version, and force the
    /// Trickle timer to restart now (`mtk_broadcast_update` + `reset_event`).
    pub fn update(
        &mut self,
        data_id: u32,
        bytes: &[u8],
        now: Duration,
        rng: &dyn Rng,
    ) -> Result<(), BssError> {
        let increment = VERSION_STEP.wrapping_add(rng.random_u16() as u32 % VERSION_STEP);
        self.table
            .set_value(data_id, bytes, increment)
            .map_err(|rc| match rc {
                ReturnCode::FAIL => BssError::NotRegistered,
                other => BssError::Internal(other),
            })?;
        let item = self.table.get_mut(data_id).expect("just set");
        item.trickle.stop();
        item.trickle.start(now, rng);
        Ok(())
    }

    pub fn pause(&mut self, data_id: u32) -> Result<(), BssError> {
        let item = self
            .table
            .get_mut(data_id)
            .ok_or(BssError::NotRegistered)?;
        item.trickle.stop();
        Ok(())
    }

    pub fn resume(&mut self, data_id: u32, now: Duration, rng: &dyn Rng) -> Result<(), BssError> {
        let item = self
            .table
            .get_mut(data_id)
            .ok_or(BssError::NotRegistered)?;
        item.trickle
            .resume(now, rng)
            .map_err(BssError::Internal)
    }

    /// Drive every item's Trickle timer past `now`, sending where the timer
    /// says so (`broadcast_trickle_callback`).
    pub fn on_tick(&mut self, now: Duration, rng: &dyn Rng) {
        let addr = self.multicast_addr;
        let port = self.udp_port;
        let udp = self.udp;
        for item in self.table.iter_mut() {
            let Some(suppress) = item.trickle.on_alarm(now, rng) else {
                continue;
            };
            if suppress {
                log::trace!("{:08x} @ {}: trickle tick - suppressed", item.data_id, item.version);
                continue;
            }
            // version == 0 means "uninitialised — do not propagate" (spec §3).
            if item.version == 0 {
                log::trace!("{:08x} @ {}: trickle tick - uninitialized, skip", item.data_id, item.version);
                continue;
            }
            if !udp.is_associated() {
                continue;
            }
            log::debug!("{:08x} @ {}: trickle tick - sending", item.data_id, item.version);
            let mut buf = [0u8; 8 + kernel::config::BROADCAST_VALUE_MAX_BYTES];
            let frame = BssFrame {
                data_id: item.data_id,
                version: item.version,
                value: item.value(),
            };
            if let Some(n) = frame.encode(&mut buf) {
                let _ = udp.send_to(addr, port, &buf[..n]);
            }
        }
    }

    /// Handle an inbound datagram on the BSS port (`broadcast_udp_callback`).
    /// Short frames (<8 bytes) are silently dropped, per spec §4.3.
    pub fn on_receive(&mut self, data: &[u8], _metadata: UdpMetadata, now: Duration, rng: &dyn Rng) {
        let Some(frame) = BssFrame::decode(data) else {
            log::debug!("UDP input: short packet");
            return;
        };

        let d = {
            let Some(item) = self.table.get(frame.data_id) else {
                log::debug!("{:08x} @ {}: UDP input from unknown id, discard", frame.data_id, frame.version);
                return;
            };
            if item.trickle.is_stopped() {
                // Paused items ignore inbound frames too (spec §4.4 invariant iv).
                log::debug!("{:08x} @ {}: UDP input to paused id, ignore", frame.data_id, frame.version);
                return;
            }
            (frame.version as i32).wrapping_sub(item.version as i32)
        };

        if d > 0 {
            let len = frame.value.len().min(kernel::config::BROADCAST_VALUE_MAX_BYTES);
            if self
                .table
                .set_value(frame.data_id, &frame.value[..len], 0)
                .is_err()
            {
                return;
            }
            let item = self.table.get_mut(frame.data_id).expect("just set");
            log::debug!(
                "{:08x} @ {}: UDP input of newer version (old = {})",
                item.data_id,
                frame.version,
                item.version
            );
            item.version = frame.version;
            item.trickle.inconsistency(now, rng);
            item.notify();
        } else if d < 0 {
            let item = self.table.get_mut(frame.data_id).expect("checked above");
            log::debug!(
                "{:08x} @ {}: UDP input of older version (old = {})",
                item.data_id,
                item.version,
                frame.version
            );
            item.trickle.inconsistency(now, rng);
        } else {
            let item = self.table.get_mut(frame.data_id).expect("checked above");
            log::trace!("{:08x} @ {}: UDP input of same version", item.data_id, item.version);
            item.trickle.consistency();
        }
    }
}
