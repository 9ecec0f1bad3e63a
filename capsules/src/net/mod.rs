//! Mesh networking protocol engines.
//!
//! Mirrors Tock's `capsules::net` module layout (`net::ip6`,
//! `net::lowpan`, ... in `capsules/src/net/mod.rs`), scoped to the two
//! protocol engines this crate implements: [`bss`] (Broadcast State
//! Synchronisation) and [`bdc`] (Bulk Data Collection), plus the
//! infrastructure they share ([`trickle`], [`wire`], [`dispatcher`],
//! [`errors`]).

pub mod bdc;
pub mod bss;
pub mod dispatcher;
pub mod errors;
#[cfg(test)]
pub mod testing;
pub mod trickle;
pub mod wire;
