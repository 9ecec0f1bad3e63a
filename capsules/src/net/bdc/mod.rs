//! Bulk Data Collection: point-to-point fragmented transfer with
//! selective-repeat retransmission (spec §4.5-§4.6).

pub mod receiver;
pub mod sender;

pub use receiver::{Receiver, ReceiverEvent, ReceiverShell, ReceiverState};
pub use sender::{Sender, SenderEvent, SenderState};

/// Number of sub-packets needed to carry `len` bytes at `SUBPACKET_MAX_BYTES`
/// per fragment (`bdc_num_sub_packets` in spec §6).
pub fn num_sub_packets(len: usize) -> u8 {
    let max = kernel::config::SUBPACKET_MAX_BYTES;
    (len.div_ceil(max)) as u8
}

/// The all-bits-set mask for `n` sub-packets (`bdc_whole_mask` in spec §6).
/// `n == 64` is special-cased to `u64::MAX` since `1u64 << 64` overflows.
pub fn whole_mask(n: u8) -> u64 {
    if n >= 64 {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}
