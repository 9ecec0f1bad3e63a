//! Small fixed-capacity containers, in the spirit of Tock's
//! `kernel::common` module (`common::{List, Queue, RingBuffer}` in
//! `kernel/src/process.rs`). Everything here is allocation-free.

pub mod ring_buffer;

pub use ring_buffer::RingBuffer;
