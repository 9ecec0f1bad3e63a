//! Error taxonomy for the BSS and BDC engines (spec §7).
//!
//! `no_std`, so these implement `core::fmt::Display` by hand rather than
//! `std::error::Error`, matching how Tock's `ReturnCode` is surfaced
//! throughout `capsules/src` without relying on the standard error trait.

use core::fmt;
use kernel::ReturnCode;

/// Errors surfaced by `bss::Engine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BssError {
    /// The item table has no free slot for a new `data_id` (spec §4.3,
    /// `register` invariant).
    NoMemory,
    /// `update`/`pause`/`resume` referenced a `data_id` that was never
    /// registered.
    NotRegistered,
    /// A collaborator call failed; wraps the underlying `ReturnCode`.
    Internal(ReturnCode),
}

impl fmt::Display for BssError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BssError::NoMemory => write!(f, "no free slot in the broadcast item table"),
            BssError::NotRegistered => write!(f, "data_id is not registered"),
            BssError::Internal(rc) => write!(f, "internal error: {rc}"),
        }
    }
}

/// Errors surfaced by `bdc::Sender` and `bdc::Receiver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BdcError {
    /// `send`/`cancel` called before `register`.
    NotRegistered,
    /// A transfer is already in flight; the sender FSM is not `Idle`.
    Busy,
    /// The requested payload does not fit within
    /// `MAX_NUMBER_OF_SUBPACKETS * SUBPACKET_MAX_BYTES`.
    TooLarge,
    /// A parameter was out of range (e.g. `period_ms == 0`).
    InvalidArgument,
    /// A collaborator call failed; wraps the underlying `ReturnCode`.
    Internal(ReturnCode),
}

impl fmt::Display for BdcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BdcError::NotRegistered => write!(f, "transfer is not registered"),
            BdcError::Busy => write!(f, "a transfer is already in progress"),
            BdcError::TooLarge => write!(f, "payload exceeds the maximum transfer size"),
            BdcError::InvalidArgument => write!(f, "invalid argument"),
            BdcError::Internal(rc) => write!(f, "internal error: {rc}"),
        }
    }
}
