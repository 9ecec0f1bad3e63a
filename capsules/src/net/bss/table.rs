//! Fixed-capacity BSS item table.
//!
//! Replaces the original's intrusive linked list (spec §9 design note) with
//! a plain array indexed by registration order and keyed by `data_id`,
//! grounded in Tock's preference for const-generic fixed-capacity
//! containers over heap collections in `no_std` capsule code (e.g.
//! `kernel::common::List` elsewhere in Tock, here replaced by
//! `kernel::common::RingBuffer`'s sibling array shape).

use core::time::Duration;
use kernel::config::{Config, BROADCAST_NUM_UNIQUE_BROADCASTS, BROADCAST_VALUE_MAX_BYTES};
use kernel::hil::rng::Rng;
use kernel::ReturnCode;

use crate::net::trickle::TrickleTimer;

/// Called whenever a remote update is adopted for `data_id` (spec §4.4,
/// "invoke user handler"). Mirrors the original's `update_handler`
/// function-pointer field, folded here into a trait object rather than a
/// `void*` + function pointer pair (spec §3, §9 "type-erased storage
/// pointer" note).
pub trait UpdateHandler {
    fn on_update(&self, data_id: u32, value: &[u8]);
}

/// One registered item: identity, current value, version, and the Trickle
/// timer driving its propagation.
pub struct BroadcastItem<'a> {
    pub data_id: u32,
    pub version: u32,
    value: [u8; BROADCAST_VALUE_MAX_BYTES],
    len: usize,
    pub trickle: TrickleTimer,
    handler: &'a dyn UpdateHandler,
}

impl<'a> BroadcastItem<'a> {
    pub fn value(&self) -> &[u8] {
        &self.value[..self.len]
    }

    pub fn notify(&self) {
        self.handler.on_update(self.data_id, self.value());
    }
}

/// Fixed-capacity table of [`BroadcastItem`]s, keyed by `data_id`. `N`
/// defaults to [`BROADCAST_NUM_UNIQUE_BROADCASTS`] via [`BroadcastTable`]
/// (the type alias below), since stable Rust has no reliable default for a
/// bare const-generic parameter in struct position (spec §9/§4.10).
pub struct Table<'a, const N: usize> {
    items: [Option<BroadcastItem<'a>>; N],
    len: usize,
}

/// The table type used everywhere except where a caller genuinely needs a
/// non-default capacity.
pub type BroadcastTable<'a> = Table<'a, BROADCAST_NUM_UNIQUE_BROADCASTS>;

impl<'a, const N: usize> Table<'a, N> {
    pub const fn new() -> Self {
        Table {
            items: [const { None }; N],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn index_of(&self, data_id: u32) -> Option<usize> {
        self.items
            .iter()
            .position(|slot| matches!(slot, Some(item) if item.data_id == data_id))
    }

    /// Register a new item. Fails with `ENOMEM` if the table is full or
    /// `data_id` is already registered. Starts the item's Trickle timer
    /// immediately (`mtk_int_broadcast_worker_register`'s `mtk_trickle_timer_set`
    /// call, made right after `mtk_trickle_timer_config`), so a registered
    /// item participates in receives from the moment it is registered rather
    /// than needing an explicit `resume`.
    pub fn register(
        &mut self,
        data_id: u32,
        initial_value: &[u8],
        handler: &'a dyn UpdateHandler,
        config: &Config,
        now: Duration,
        rng: &dyn Rng,
    ) -> Result<(), ReturnCode> {
        if self.index_of(data_id).is_some() {
            return Err(ReturnCode::ENOMEM);
        }
        if initial_value.len() > BROADCAST_VALUE_MAX_BYTES {
            return Err(ReturnCode::EINVAL);
        }
        let slot = self
            .items
            .iter_mut()
            .find(|slot| slot.is_none())
            .ok_or(ReturnCode::ENOMEM)?;

        let mut value = [0u8; BROADCAST_VALUE_MAX_BYTES];
        value[..initial_value.len()].copy_from_slice(initial_value);

        let mut trickle = TrickleTimer::new(config);
        trickle.start(now, rng);

        *slot = Some(BroadcastItem {
            data_id,
            version: 0,
            value,
            len: initial_value.len(),
            trickle,
            handler,
        });
        self.len += 1;
        Ok(())
    }

    pub fn get(&self, data_id: u32) -> Option<&BroadcastItem<'a>> {
        self.index_of(data_id)
            .and_then(|i| self.items[i].as_ref())
    }

    pub fn get_mut(&mut self, data_id: u32) -> Option<&mut BroadcastItem<'a>> {
        let i = self.index_of(data_id)?;
        self.items[i].as_mut()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BroadcastItem<'a>> {
        self.items.iter_mut().filter_map(|slot| slot.as_mut())
    }

    /// Overwrite the value of `data_id` and advance its version (spec §4.4
    /// "Local update"): bump by `VERSION_STEP` plus a random component in
    /// `[0, VERSION_STEP)`, landing on 1 instead of 0 in the unlikely event
    /// of wraparound to exactly 0.
    pub fn set_value(
        &mut self,
        data_id: u32,
        bytes: &[u8],
        version_increment: u32,
    ) -> Result<(), ReturnCode> {
        if bytes.len() > BROADCAST_VALUE_MAX_BYTES {
            return Err(ReturnCode::EINVAL);
        }
        let item = self.get_mut(data_id).ok_or(ReturnCode::FAIL)?;
        item.value[..bytes.len()].copy_from_slice(bytes);
        item.len = bytes.len();
        item.version = item.version.wrapping_add(version_increment);
        if item.version == 0 {
            item.version = 1;
        }
        Ok(())
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.items
            .iter()
            .filter_map(|slot| slot.as_ref())
            .filter_map(|item| item.trickle.next_deadline())
            .min()
    }
}

impl<'a, const N: usize> Default for Table<'a, N> {
    fn default() -> Self {
        Self::new()
    }
}
