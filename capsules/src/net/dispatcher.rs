//! Single-threaded cooperative event dispatcher (spec §4.7).
//!
//! Grounded on Tock's `kernel::common::RingBuffer` fixed-capacity
//! queue idiom (see `kernel::common::ring_buffer`), used here to hold
//! pending events so the host loop can drain them with
//! [`Dispatcher::poll_once`] instead of dispatching straight from a UDP or
//! timer interrupt handler.

use kernel::common::RingBuffer;
use kernel::config::{DISPATCHER_QUEUE_CAPACITY, MAX_DATAGRAM_BYTES};
use kernel::hil::udp::UdpMetadata;

/// Which periodic source fired. The dispatcher itself does not know which
/// BSS item or BDC session a timer belongs to — that association is the
/// caller's responsibility (it is the caller who armed the alarm and so
/// knows what `id` means).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerId(pub u32);

/// A datagram captured at receive time. Owns a fixed-size copy of the bytes
/// rather than a borrow, since the UDP collaborator's callback slice does
/// not outlive the call that delivered it.
#[derive(Clone, Copy)]
pub struct Datagram {
    pub port: u16,
    pub metadata: UdpMetadata,
    len: usize,
    data: [u8; MAX_DATAGRAM_BYTES],
}

impl Datagram {
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

/// One pending unit of work for the host loop.
#[derive(Clone, Copy)]
pub enum Event {
    Timer(TimerId),
    Packet(Datagram),
}

/// A fixed-capacity FIFO of pending [`Event`]s. `N` defaults to
/// [`DISPATCHER_QUEUE_CAPACITY`] via the [`Dispatcher`] alias.
pub struct Queue<const N: usize> {
    events: RingBuffer<Event, N>,
}

pub type Dispatcher = Queue<DISPATCHER_QUEUE_CAPACITY>;

impl<const N: usize> Queue<N> {
    pub const fn new() -> Self {
        Queue {
            events: RingBuffer::new(),
        }
    }

    /// Feed a timer-fired callback into the queue. Returns `false` (and
    /// bumps the drop counter) if the queue was full — the newest event is
    /// the one dropped, per spec §4.7.
    pub fn push_timer_event(&mut self, id: TimerId) -> bool {
        self.events.push(Event::Timer(id))
    }

    /// Feed an inbound-datagram callback into the queue. `data` longer than
    /// [`MAX_DATAGRAM_BYTES`] is truncated defensively (none of this crate's
    /// frames are that large; a datagram that big cannot be one we sent).
    pub fn push_packet_event(&mut self, port: u16, metadata: UdpMetadata, data: &[u8]) -> bool {
        let len = data.len().min(MAX_DATAGRAM_BYTES);
        let mut buf = [0u8; MAX_DATAGRAM_BYTES];
        buf[..len].copy_from_slice(&data[..len]);
        self.events.push(Event::Packet(Datagram {
            port,
            metadata,
            len,
            data: buf,
        }))
    }

    pub fn poll_once(&mut self) -> Option<Event> {
        self.events.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn dropped_count(&self) -> usize {
        self.events.dropped_count()
    }
}

impl<const N: usize> Default for Queue<N> {
    fn default() -> Self {
        Self::new()
    }
}
