//! UDP collaborator, mirroring the "Underlying network library" described in
//! spec §6 (`mira_net_udp_bind_address`, `mira_net_udp_send_to`,
//! `mira_net_udp_multicast_group_join`, `mira_net_udp_close`, plus the
//! `mira_net_udp_callback_metadata_t` passed to receive callbacks).
//!
//! The crate is `no_std`, so addresses are a fixed 16-byte value (an IPv6
//! address in the real 6LoWPAN stack this is meant to sit under) rather than
//! `std::net::Ipv6Addr`.

use crate::returncode::ReturnCode;

/// A 6LoWPAN/IPv6 address. Opaque to the core: nothing here parses or
/// formats it beyond equality and a raw byte view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NetworkAddress(pub [u8; 16]);

impl NetworkAddress {
    pub const UNSPECIFIED: NetworkAddress = NetworkAddress([0u8; 16]);

    pub fn octets(&self) -> [u8; 16] {
        self.0
    }
}

impl core::fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, chunk) in self.0.chunks(2).enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}{:02x}", chunk[0], chunk[1])?;
        }
        Ok(())
    }
}

/// Metadata about an inbound datagram, mirroring
/// `mira_net_udp_callback_metadata_t` (`source_address`, `source_port`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpMetadata {
    pub source_address: NetworkAddress,
    pub source_port: u16,
}

/// A bound UDP endpoint. One `Udp` implementation per bound socket, matching
/// the one-`mira_net_udp_connection_t`-per-subsystem model in §5.
pub trait Udp {
    /// Bind to `local_port`, optionally restricting sends/receives to a
    /// single `dest_addr`/`dest_port` pair (mirrors
    /// `mira_net_udp_bind_address`; pass `None` for an unconnected socket
    /// that calls `send_to` with an explicit destination every time, as the
    /// BDC subsystem does).
    fn bind(&self, local_port: u16) -> ReturnCode;

    /// Send `bytes` to `(addr, port)`. Non-blocking: the collaborator is
    /// expected to queue the write and never block the caller.
    fn send_to(&self, addr: NetworkAddress, port: u16, bytes: &[u8]) -> ReturnCode;

    /// Join the link-local multicast group at `addr` on this socket.
    fn multicast_group_join(&self, addr: NetworkAddress) -> ReturnCode;

    /// Release the bound endpoint.
    fn close(&self) -> ReturnCode;

    /// Whether the node currently has network association. Sends performed
    /// while this is `false` are silently skipped by callers (§4.4).
    fn is_associated(&self) -> bool;
}

/// Callback invoked by the collaborator on every inbound datagram for a
/// bound [`Udp`] endpoint.
pub trait UdpClient {
    fn receive(&self, data: &[u8], metadata: UdpMetadata);
}
