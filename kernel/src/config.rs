//! Compile-time and runtime tunables (spec §6).
//!
//! Table capacities are const generics on the types that use them (see
//! `capsules::net::bss::table::BroadcastTable`); the values below are the
//! defaults those types alias to. Everything else that is runtime-tunable
//! lives on [`Config`].

use core::time::Duration;

/// Default capacity of the BSS item table (`MTK_BROADCAST_NUM_UNIQUE_BROADCASTS`).
pub const BROADCAST_NUM_UNIQUE_BROADCASTS: usize = 4;

/// Largest value a single BSS item may hold (spec §3: "a `size` (≤ 230 bytes)").
pub const BROADCAST_VALUE_MAX_BYTES: usize = 230;

/// Fragment size in bytes (`MTK_BULK_DATA_COLLECTION_SUBPACKET_MAX_BYTES`).
pub const SUBPACKET_MAX_BYTES: usize = 330;

/// Max number of sub-packets a large packet may be split into. Coupled to the
/// `u64` mask width used throughout BDC.
pub const MAX_NUMBER_OF_SUBPACKETS: usize = 64;

/// Default receiver retransmission-request budget.
pub const LP_MAX_NUM_RETRANSMISSION_REQUESTS: u8 = 4;

/// Fixed UDP port the BDC receiver listens on.
pub const BDC_RX_UDP_PORT: u16 = 1520;

/// `VERSION_STEP` added to a BSS item's version on every local update.
pub const VERSION_STEP: u32 = 0x10000;

/// Largest datagram the dispatcher's event queue stores inline: a BDC
/// sub-packet frame at its maximum size (`HEADER_LEN + SUBPACKET_MAX_BYTES`).
pub const MAX_DATAGRAM_BYTES: usize = 8 + SUBPACKET_MAX_BYTES;

/// Default capacity of `capsules::net::dispatcher::Dispatcher`'s event queue.
pub const DISPATCHER_QUEUE_CAPACITY: usize = 16;

/// Runtime-tunable parameters, gathered in one place so a host can override
/// any of them without touching call sites. `Default` reproduces every
/// default named in spec §6 (checked by a test in `capsules`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Trickle minimum interval (`CLOCK_SECOND / 8` in the original).
    pub trickle_i_min: Duration,
    /// Trickle doubling-count cap (max interval is `i_min * 2^i_max`).
    pub trickle_i_max_doublings: u8,
    /// Trickle redundancy constant `k`.
    pub trickle_k: u8,
    /// Receiver retransmission-request budget.
    pub max_retransmission_requests: u8,
    /// Probability (0-100) of discarding a received sub-packet, for testing.
    pub fault_rate_percent: u8,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            trickle_i_min: Duration::from_millis(125),
            trickle_i_max_doublings: 6,
            trickle_k: 3,
            max_retransmission_requests: LP_MAX_NUM_RETRANSMISSION_REQUESTS,
            fault_rate_percent: 0,
        }
    }
}
