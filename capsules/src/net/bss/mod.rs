//! Broadcast State Synchronisation: eventually-consistent key-versioned
//! replication over Trickle-style suppression (spec §4.3-§4.4).

pub mod engine;
pub mod table;

pub use engine::{Engine, UpdateHandler};
pub use table::BroadcastTable;
