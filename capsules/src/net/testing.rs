//! In-memory collaborator fakes used only by this crate's own tests (spec
//! §4.13). Pulls in `std` and the `rand` crate, gated entirely behind
//! `#[cfg(test)]` so production (`no_std`) builds never see it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng};

use kernel::hil::rng::Rng;
use kernel::hil::time::Clock;
use kernel::hil::udp::{NetworkAddress, Udp, UdpClient, UdpMetadata};
use kernel::ReturnCode;

/// A manually-advanced clock: no wall-clock dependency, so tests are
/// deterministic and instant.
#[derive(Default)]
pub struct FakeClock {
    now: RefCell<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        FakeClock {
            now: RefCell::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.borrow_mut() += by;
    }

    pub fn set(&self, at: Duration) {
        *self.now.borrow_mut() = at;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        *self.now.borrow()
    }
}

/// A seeded, deterministic RNG, so a flaky jitter draw never makes a test
/// flaky. Grounded in the `rand` dependency the Tock ecosystem already
/// pulls in for exactly this purpose.
pub struct FakeRng {
    inner: RefCell<StdRng>,
}

impl FakeRng {
    pub fn seeded(seed: u64) -> Self {
        FakeRng {
            inner: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Rng for FakeRng {
    fn random_u16(&self) -> u16 {
        self.inner.borrow_mut().gen()
    }
}

/// One fault to inject the next time a matching send happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Drop,
}

struct Peer {
    associated: bool,
}

/// An in-memory registry standing in for a real mesh: every [`FakeUdp`]
/// bound against the same fabric can reach every other by address/port.
/// Delivery is synchronous (`send_to` calls the destination's
/// `UdpClient::receive` inline), which keeps end-to-end scenario tests
/// free of any executor or real time.
pub struct FakeUdpFabric {
    peers: RefCell<HashMap<(NetworkAddress, u16), Rc<dyn UdpClient>>>,
    state: RefCell<HashMap<(NetworkAddress, u16), Peer>>,
    drop_next: RefCell<HashMap<(NetworkAddress, u16, NetworkAddress, u16), Fault>>,
    sent_log: RefCell<Vec<(NetworkAddress, u16, NetworkAddress, u16, Vec<u8>)>>,
}

impl FakeUdpFabric {
    pub fn new() -> Rc<Self> {
        Rc::new(FakeUdpFabric {
            peers: RefCell::new(HashMap::new()),
            state: RefCell::new(HashMap::new()),
            drop_next: RefCell::new(HashMap::new()),
            sent_log: RefCell::new(Vec::new()),
        })
    }

    /// Drop the very next datagram sent from `from` to `to`, once.
    pub fn drop_next(&self, from: (NetworkAddress, u16), to: (NetworkAddress, u16)) {
        self.drop_next
            .borrow_mut()
            .insert((from.0, from.1, to.0, to.1), Fault::Drop);
    }

    pub fn sent_count(&self) -> usize {
        self.sent_log.borrow().len()
    }
}

/// One bound endpoint on a [`FakeUdpFabric`].
pub struct FakeUdp {
    fabric: Rc<FakeUdpFabric>,
    addr: NetworkAddress,
    port: RefCell<u16>,
}

impl FakeUdp {
    pub fn new(fabric: Rc<FakeUdpFabric>, addr: NetworkAddress) -> Self {
        FakeUdp {
            fabric,
            addr,
            port: RefCell::new(0),
        }
    }

    pub fn set_client(&self, client: Rc<dyn UdpClient>) {
        let port = *self.port.borrow();
        self.fabric
            .peers
            .borrow_mut()
            .insert((self.addr, port), client);
    }

    pub fn set_associated(&self, associated: bool) {
        let port = *self.port.borrow();
        if let Some(peer) = self.fabric.state.borrow_mut().get_mut(&(self.addr, port)) {
            peer.associated = associated;
        }
    }
}

impl Udp for FakeUdp {
    fn bind(&self, local_port: u16) -> ReturnCode {
        *self.port.borrow_mut() = local_port;
        self.fabric
            .state
            .borrow_mut()
            .insert((self.addr, local_port), Peer { associated: true });
        ReturnCode::SUCCESS
    }

    fn send_to(&self, addr: NetworkAddress, port: u16, bytes: &[u8]) -> ReturnCode {
        let from_port = *self.port.borrow();
        let key = (self.addr, from_port, addr, port);
        if self.fabric.drop_next.borrow_mut().remove(&key).is_some() {
            return ReturnCode::SUCCESS;
        }
        self.fabric
            .sent_log
            .borrow_mut()
            .push((self.addr, from_port, addr, port, bytes.to_vec()));
        if let Some(client) = self.fabric.peers.borrow().get(&(addr, port)) {
            client.receive(
                bytes,
                UdpMetadata {
                    source_address: self.addr,
                    source_port: from_port,
                },
            );
        }
        ReturnCode::SUCCESS
    }

    fn multicast_group_join(&self, _addr: NetworkAddress) -> ReturnCode {
        ReturnCode::SUCCESS
    }

    fn close(&self) -> ReturnCode {
        ReturnCode::SUCCESS
    }

    fn is_associated(&self) -> bool {
        let port = *self.port.borrow();
        self.fabric
            .state
            .borrow()
            .get(&(self.addr, port))
            .map(|p| p.associated)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;

    use crate::net::bdc::{
        num_sub_packets, whole_mask, ReceiverEvent, ReceiverShell, ReceiverState, Sender,
        SenderEvent,
    };
    use crate::net::bss::{Engine, UpdateHandler};
    use crate::net::wire::{parse_bdc, BdcFrame, RequestFrame, SubPacketFrame};
    use kernel::config::Config;

    struct Recorder(StdRefCell<Vec<Vec<u8>>>);
    impl UdpClient for Recorder {
        fn receive(&self, data: &[u8], _metadata: UdpMetadata) {
            self.0.borrow_mut().push(data.to_vec());
        }
    }

    /// Collects inbound datagrams for later draining, so a test can feed them
    /// into a capsule's `on_receive`/`on_subpacket` (which need `&mut self`
    /// and so cannot be driven directly from `UdpClient::receive(&self, ..)`).
    struct Inbox(StdRefCell<Vec<(Vec<u8>, UdpMetadata)>>);
    impl Inbox {
        fn new() -> Self {
            Inbox(StdRefCell::new(Vec::new()))
        }
        fn drain(&self) -> Vec<(Vec<u8>, UdpMetadata)> {
            self.0.borrow_mut().drain(..).collect()
        }
    }
    impl UdpClient for Inbox {
        fn receive(&self, data: &[u8], metadata: UdpMetadata) {
            self.0.borrow_mut().push((data.to_vec(), metadata));
        }
    }

    #[test]
    fn fabric_delivers_only_to_the_bound_destination() {
        let fabric = FakeUdpFabric::new();
        let a = FakeUdp::new(fabric.clone(), NetworkAddress([1u8; 16]));
        let b = FakeUdp::new(fabric.clone(), NetworkAddress([2u8; 16]));
        let c = FakeUdp::new(fabric.clone(), NetworkAddress([3u8; 16]));
        a.bind(100);
        b.bind(200);
        c.bind(200);

        let recorder_b = Rc::new(Recorder(StdRefCell::new(Vec::new())));
        let recorder_c = Rc::new(Recorder(StdRefCell::new(Vec::new())));
        b.set_client(recorder_b.clone());
        c.set_client(recorder_c.clone());

        a.send_to(NetworkAddress([2u8; 16]), 200, b"hi");

        assert_eq!(recorder_b.0.borrow().len(), 1);
        assert!(recorder_c.0.borrow().is_empty());
    }

    #[test]
    fn dropped_datagram_never_arrives() {
        let fabric = FakeUdpFabric::new();
        let a = FakeUdp::new(fabric.clone(), NetworkAddress([1u8; 16]));
        let b = FakeUdp::new(fabric.clone(), NetworkAddress([2u8; 16]));
        a.bind(100);
        b.bind(200);
        let recorder = Rc::new(Recorder(StdRefCell::new(Vec::new())));
        b.set_client(recorder.clone());

        fabric.drop_next((NetworkAddress([1u8; 16]), 100), (NetworkAddress([2u8; 16]), 200));
        a.send_to(NetworkAddress([2u8; 16]), 200, b"lost");
        assert!(recorder.0.borrow().is_empty());
    }

    struct SeenUpdate(StdRefCell<Option<(u32, Vec<u8>)>>);
    impl UpdateHandler for SeenUpdate {
        fn on_update(&self, data_id: u32, value: &[u8]) {
            *self.0.borrow_mut() = Some((data_id, value.to_vec()));
        }
    }

    /// S1, end to end: two `Engine`s exchanging real encoded `BssFrame`s over
    /// a `FakeUdpFabric`, converging via Trickle timing rather than a direct
    /// `on_receive` call. The first `on_tick` after `update()` always fires
    /// the send decision (`c == 0 < k` at a fresh interval), so no wall-clock
    /// stepping is needed for this scenario to converge deterministically.
    #[test]
    fn s1_two_node_bss_convergence_over_fabric() {
        let fabric = FakeUdpFabric::new();
        let addr_a = NetworkAddress([0xAA; 16]);
        let addr_b = NetworkAddress([0xBB; 16]);
        let udp_a = FakeUdp::new(fabric.clone(), addr_a);
        let udp_b = FakeUdp::new(fabric.clone(), addr_b);
        let clock = FakeClock::new();
        let rng = FakeRng::seeded(1);
        let config = Config::default();

        let mut engine_a = Engine::new(&udp_a, config);
        let mut engine_b = Engine::new(&udp_b, config);
        engine_a.init(addr_b, 9999).unwrap();
        engine_b.init(addr_a, 9999).unwrap();

        let inbox_a = Rc::new(Inbox::new());
        let inbox_b = Rc::new(Inbox::new());
        udp_a.set_client(inbox_a.clone());
        udp_b.set_client(inbox_b.clone());

        let handler_a = SeenUpdate(StdRefCell::new(None));
        let handler_b = SeenUpdate(StdRefCell::new(None));
        engine_a
            .register(0xDEADBEEF, b"AAAA", &handler_a, clock.now(), &rng)
            .unwrap();
        engine_b
            .register(0xDEADBEEF, b"AAAA", &handler_b, clock.now(), &rng)
            .unwrap();

        engine_a
            .update(0xDEADBEEF, b"BBBB", clock.now(), &rng)
            .unwrap();

        // Drive A's Trickle tick: fires the send decision immediately and
        // puts the encoded frame straight into B's inbox via the fabric.
        engine_a.on_tick(clock.now(), &rng);
        for (data, metadata) in inbox_b.drain() {
            engine_b.on_receive(&data, metadata, clock.now(), &rng);
        }

        assert_eq!(
            handler_b.0.borrow().as_ref(),
            Some(&(0xDEADBEEFu32, b"BBBB".to_vec())),
            "B must converge on A's update"
        );
        assert!(inbox_a.drain().is_empty(), "A should not receive its own broadcast");
    }

    /// S4, end to end: a `Sender`/`Receiver` pair exchanging real encoded BDC
    /// frames over a `FakeUdpFabric`, with the middle sub-packet's first
    /// transmission dropped by the fabric. The receiver's retransmission
    /// request recovers it on the second pass.
    #[test]
    fn s4_bdc_lossy_recovery_over_fabric() {
        let fabric = FakeUdpFabric::new();
        let addr_tx = NetworkAddress([0x11; 16]);
        let addr_rx = NetworkAddress([0x22; 16]);
        let udp_tx = FakeUdp::new(fabric.clone(), addr_tx);
        let udp_rx = FakeUdp::new(fabric.clone(), addr_rx);
        udp_tx.bind(9004);
        udp_rx.bind(9003);

        let inbox_tx = Rc::new(Inbox::new());
        let inbox_rx = Rc::new(Inbox::new());
        udp_tx.set_client(inbox_tx.clone());
        udp_rx.set_client(inbox_rx.clone());

        let config = Config::default();
        let mut payload = [0u8; 700];
        for (i, b) in payload.iter_mut().enumerate() {
            *b = (i % 256) as u8;
        }
        let n = num_sub_packets(payload.len());
        let period_ms = 50u16;

        let mut sender = Sender::new();
        sender.register_tx(1, &payload).unwrap();

        let shell = ReceiverShell::new(&config);
        let mut dst = [0u8; 700];
        let mut receiver = shell.start(1, addr_tx, 9004, period_ms, &mut dst, Duration::ZERO);

        // Receiver asks for every sub-packet up front, as if it had already
        // seen a signal frame.
        let request = RequestFrame {
            packet_id: 1,
            mask: whole_mask(n),
            period_ms,
        };
        let mut buf = [0u8; 32];
        let len = request.encode(&mut buf).unwrap();
        udp_rx.send_to(addr_tx, 9004, &buf[..len]);
        for (data, _) in inbox_tx.drain() {
            if let Some(BdcFrame::Request(r)) = parse_bdc(&data) {
                sender.on_request(&r, addr_rx, 9003, Duration::ZERO);
            }
        }

        // First pass: send every sub-packet, but drop index 1 on the wire.
        let mut now = Duration::ZERO;
        loop {
            match sender.poll(now) {
                Some(SenderEvent::Transmit { addr, port, index, n_sub_packets, payload }) => {
                    let frame = SubPacketFrame { packet_id: 1, index, n_sub_packets, payload };
                    let mut out = [0u8; 512];
                    let n = frame.encode(&mut out).unwrap();
                    if index == 1 {
                        fabric.drop_next((addr_tx, 9004), (addr_rx, 9003));
                    }
                    udp_tx.send_to(addr, port, &out[..n]);
                    sender.ack_transmit(index, true);
                    now += Duration::from_millis(period_ms as u64);
                }
                Some(SenderEvent::Done) => break,
                Some(SenderEvent::Failed) => panic!("unexpected sender failure"),
                None => now += Duration::from_millis(1),
            }
        }

        for (data, _) in inbox_rx.drain() {
            if let Some(BdcFrame::SubPacket(sp)) = parse_bdc(&data) {
                receiver.on_subpacket(&sp, now, false);
            }
        }
        assert_eq!(receiver.state(), ReceiverState::Collecting);

        // The timeout fires past the missing sub-packet's deadline and asks
        // only for index 1.
        now = receiver.next_timeout();
        let event = receiver.on_timeout(now);
        assert_eq!(event, Some(ReceiverEvent::RequestNeeded { mask: 0b010 }));

        let request = RequestFrame {
            packet_id: 1,
            mask: 0b010,
            period_ms,
        };
        let mut buf = [0u8; 32];
        let len = request.encode(&mut buf).unwrap();
        udp_rx.send_to(addr_tx, 9004, &buf[..len]);
        for (data, _) in inbox_tx.drain() {
            if let Some(BdcFrame::Request(r)) = parse_bdc(&data) {
                sender.on_request(&r, addr_rx, 9003, now);
            }
        }

        loop {
            match sender.poll(now) {
                Some(SenderEvent::Transmit { addr, port, index, n_sub_packets, payload }) => {
                    let frame = SubPacketFrame { packet_id: 1, index, n_sub_packets, payload };
                    let mut out = [0u8; 512];
                    let n = frame.encode(&mut out).unwrap();
                    udp_tx.send_to(addr, port, &out[..n]);
                    sender.ack_transmit(index, true);
                    now += Duration::from_millis(period_ms as u64);
                }
                Some(SenderEvent::Done) => break,
                Some(SenderEvent::Failed) => panic!("unexpected sender failure"),
                None => now += Duration::from_millis(1),
            }
        }

        let mut final_event = None;
        for (data, _) in inbox_rx.drain() {
            if let Some(BdcFrame::SubPacket(sp)) = parse_bdc(&data) {
                if let Some(event) = receiver.on_subpacket(&sp, now, false) {
                    final_event = Some(event);
                }
            }
        }

        assert_eq!(final_event, Some(ReceiverEvent::Received { len: 700 }));
        assert_eq!(&dst[..], &payload[..]);
    }
}
