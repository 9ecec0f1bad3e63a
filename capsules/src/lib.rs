//! Broadcast State Synchronisation (BSS) and Bulk Data Collection (BDC): two
//! mesh-networking protocol engines for a low-power IPv6/6LoWPAN wireless
//! stack, built against the collaborator traits in `kernel::hil`.
//!
//! `no_std` except for the test harness (`net::testing`), which pulls in
//! `std` to get a `HashMap`-backed in-memory UDP fabric and the `rand`
//! crate's deterministic RNGs — plain enough for `cargo test` without
//! requiring the production build to assume an allocator.

#![cfg_attr(not(test), no_std)]

pub mod net;
