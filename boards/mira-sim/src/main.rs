//! Two-node demonstration binary wiring `capsules::net::{bss, bdc}` to real
//! `std::net::UdpSocket`s.
//!
//! Grounded on Tock's board bring-up pattern (`boards/imix/src/
//! trickle_test.rs`, `deluge_test.rs`: an `initialize_all`-style function
//! composing capsules against chip peripherals), adapted to compose them
//! against `std` sockets instead of chip HIL implementations. Runs the BSS
//! convergence scenario and then the BDC transfer scenario, both as two
//! simulated nodes inside this one OS process, logging progress via `log`.

use std::cell::RefCell;
use std::net::UdpSocket;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng as RandRng, SeedableRng};

use capsules::net::bdc::{Receiver, ReceiverEvent, ReceiverShell, Sender, SenderEvent};
use capsules::net::bss::{Engine, UpdateHandler};
use capsules::net::wire::{parse_bdc, BdcFrame, SignalFrame};
use kernel::config::Config;
use kernel::hil::rng::Rng;
use kernel::hil::time::Clock;
use kernel::hil::udp::{NetworkAddress, Udp, UdpMetadata};
use kernel::ReturnCode;

/// A UDP endpoint pinned to a single loopback peer — enough to stand in for
/// a full 6LoWPAN multicast fabric in a two-node demo, without making this
/// binary a general-purpose network simulator.
struct LoopbackUdp {
    socket: RefCell<Option<UdpSocket>>,
    peer_port: u16,
}

impl LoopbackUdp {
    fn new(peer_port: u16) -> Self {
        LoopbackUdp {
            socket: RefCell::new(None),
            peer_port,
        }
    }

    fn recv(&self, buf: &mut [u8]) -> Option<usize> {
        let socket = self.socket.borrow();
        let socket = socket.as_ref()?;
        match socket.recv_from(buf) {
            Ok((n, _)) => Some(n),
            Err(_) => None,
        }
    }
}

impl Udp for LoopbackUdp {
    fn bind(&self, local_port: u16) -> ReturnCode {
        let addr = format!("127.0.0.1:{local_port}");
        match UdpSocket::bind(addr) {
            Ok(socket) => {
                socket.set_nonblocking(true).expect("set_nonblocking");
                *self.socket.borrow_mut() = Some(socket);
                ReturnCode::SUCCESS
            }
            Err(_) => ReturnCode::FAIL,
        }
    }

    fn send_to(&self, _addr: NetworkAddress, _port: u16, bytes: &[u8]) -> ReturnCode {
        let socket = self.socket.borrow();
        match socket.as_ref() {
            Some(socket) => {
                let dest = format!("127.0.0.1:{}", self.peer_port);
                match socket.send_to(bytes, dest) {
                    Ok(_) => ReturnCode::SUCCESS,
                    Err(_) => ReturnCode::FAIL,
                }
            }
            None => ReturnCode::EOFF,
        }
    }

    fn multicast_group_join(&self, _addr: NetworkAddress) -> ReturnCode {
        ReturnCode::SUCCESS
    }

    fn close(&self) -> ReturnCode {
        *self.socket.borrow_mut() = None;
        ReturnCode::SUCCESS
    }

    fn is_associated(&self) -> bool {
        self.socket.borrow().is_some()
    }
}

struct WallClock {
    start: Instant,
}

impl WallClock {
    fn new() -> Self {
        WallClock {
            start: Instant::now(),
        }
    }
}

impl Clock for WallClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

struct OsRng {
    inner: RefCell<StdRng>,
}

impl OsRng {
    fn new() -> Self {
        OsRng {
            inner: RefCell::new(StdRng::from_entropy()),
        }
    }
}

impl Rng for OsRng {
    fn random_u16(&self) -> u16 {
        self.inner.borrow_mut().gen()
    }
}

struct LoggingHandler {
    node: &'static str,
}

impl UpdateHandler for LoggingHandler {
    fn on_update(&self, data_id: u32, value: &[u8]) {
        log::info!(
            "[{}] BSS data_id={data_id:#010x} adopted value={:?}",
            self.node,
            String::from_utf8_lossy(value)
        );
    }
}

/// Scenario S1/S2: two nodes converge on a BSS item after a local update.
fn run_bss_demo() {
    log::info!("--- BSS convergence demo ---");
    let udp_a = LoopbackUdp::new(9002);
    let udp_b = LoopbackUdp::new(9001);
    let clock = WallClock::new();
    let rng = OsRng::new();
    let config = Config::default();

    let mut engine_a = Engine::new(&udp_a, config);
    let mut engine_b = Engine::new(&udp_b, config);
    engine_a.init(NetworkAddress::UNSPECIFIED, 9001).unwrap();
    engine_b.init(NetworkAddress::UNSPECIFIED, 9002).unwrap();

    let handler_a = LoggingHandler { node: "A" };
    let handler_b = LoggingHandler { node: "B" };
    engine_a
        .register(0xDEADBEEF, b"AAAA", &handler_a, clock.now(), &rng)
        .unwrap();
    engine_b
        .register(0xDEADBEEF, b"AAAA", &handler_b, clock.now(), &rng)
        .unwrap();

    engine_a
        .update(0xDEADBEEF, b"BBBB", clock.now(), &rng)
        .unwrap();
    log::info!("[A] local update -> BBBB");

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut buf = [0u8; 512];
    while Instant::now() < deadline {
        let now = clock.now();
        engine_a.on_tick(now, &rng);
        engine_b.on_tick(now, &rng);
        if let Some(n) = udp_a.recv(&mut buf) {
            engine_a.on_receive(
                &buf[..n],
                UdpMetadata {
                    source_address: NetworkAddress::UNSPECIFIED,
                    source_port: 9002,
                },
                now,
                &rng,
            );
        }
        if let Some(n) = udp_b.recv(&mut buf) {
            engine_b.on_receive(
                &buf[..n],
                UdpMetadata {
                    source_address: NetworkAddress::UNSPECIFIED,
                    source_port: 9001,
                },
                now,
                &rng,
            );
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    log::info!("BSS demo finished (see above for convergence log line)");
}

/// Scenario S3: a 700-byte payload split into 3 sub-packets, fully
/// delivered over loopback sockets.
fn run_bdc_demo() {
    log::info!("--- BDC transfer demo ---");
    let udp_tx = LoopbackUdp::new(9004);
    let udp_rx = LoopbackUdp::new(9003);
    udp_tx.bind(9003);
    udp_rx.bind(9004);

    let config = Config::default();
    let mut payload = [0u8; 700];
    for (i, b) in payload.iter_mut().enumerate() {
        *b = (i % 256) as u8;
    }

    let mut sender = Sender::new();
    sender.register_tx(1, &payload).unwrap();
    let signal = SignalFrame {
        packet_id: 1,
        n_sub_packets: capsules::net::bdc::num_sub_packets(payload.len()),
    };
    let mut sig_buf = [0u8; 16];
    let n = signal.encode(&mut sig_buf).unwrap();
    udp_tx.send_to(NetworkAddress::UNSPECIFIED, 9004, &sig_buf[..n]);

    let shell = ReceiverShell::new(&config);
    let mut dst = [0u8; 700];
    let mut receiver: Option<Receiver> = None;
    let start = Instant::now();

    let mut buf = [0u8; 512];
    loop {
        if Instant::now().duration_since(start) > Duration::from_secs(5) {
            log::warn!("BDC demo timed out");
            break;
        }
        let now = start.elapsed();

        if let Some(n) = udp_rx.recv(&mut buf) {
            match parse_bdc(&buf[..n]) {
                Some(BdcFrame::Signal(s)) if receiver.is_none() => {
                    receiver = Some(shell.start(
                        s.packet_id,
                        NetworkAddress::UNSPECIFIED,
                        9003,
                        200,
                        &mut dst,
                        now,
                    ));
                    let request = capsules::net::wire::RequestFrame {
                        packet_id: s.packet_id,
                        mask: capsules::net::bdc::whole_mask(s.n_sub_packets),
                        period_ms: 200,
                    };
                    let mut req_buf = [0u8; 32];
                    let n = request.encode(&mut req_buf).unwrap();
                    udp_rx.send_to(NetworkAddress::UNSPECIFIED, 9003, &req_buf[..n]);
                }
                Some(BdcFrame::SubPacket(sp)) => {
                    if let Some(rx) = receiver.as_mut() {
                        if let Some(ReceiverEvent::Received { len }) =
                            rx.on_subpacket(&sp, now, false)
                        {
                            log::info!("[rx] transfer complete, {len} bytes received");
                            assert_eq!(&dst[..len], &payload[..]);
                            break;
                        }
                    }
                }
                _ => {}
            }
        }

        if let Some(n) = udp_tx.recv(&mut buf) {
            if let Some(BdcFrame::Request(r)) = parse_bdc(&buf[..n]) {
                sender.on_request(&r, NetworkAddress::UNSPECIFIED, 9004, now);
            }
        }

        if let Some(event) = sender.poll(now) {
            match event {
                SenderEvent::Transmit { port, index, n_sub_packets, payload, .. } => {
                    let frame = capsules::net::wire::SubPacketFrame {
                        packet_id: 1,
                        index,
                        n_sub_packets,
                        payload,
                    };
                    let mut out = [0u8; 512];
                    let n = frame.encode(&mut out).unwrap();
                    udp_tx.send_to(NetworkAddress::UNSPECIFIED, port, &out[..n]);
                    sender.ack_transmit(index, true);
                }
                SenderEvent::Done => log::info!("[tx] all sub-packets sent"),
                SenderEvent::Failed => log::warn!("[tx] transfer aborted"),
            }
        }

        std::thread::sleep(Duration::from_millis(5));
    }
}

fn main() {
    env_logger::init();
    run_bss_demo();
    run_bdc_demo();
}
