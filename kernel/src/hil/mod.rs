//! Hardware/OS Interface Layer: the traits capsule code is written against.
//!
//! Named after and shaped like Tock's `kernel::hil` module
//! (`hil::time::Alarm`, `hil::rng::RNG` in `capsules/src/net/deluge/trickle.rs`),
//! generalised to also cover the UDP collaborator the underlying network
//! library needs.

pub mod rng;
pub mod time;
pub mod udp;
