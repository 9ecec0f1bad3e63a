//! Binary wire framing for BSS and BDC messages (spec §4.2).
//!
//! All fields little-endian. Grounded directly on the original source's
//! `lpsig_pack_buffer`/`lpsig_unpack_buffer`, `lpreq_pack_buffer`/
//! `lpreq_unpack_buffer`, and `lpsp_pack_buffer`/`lpsp_unpack_buffer`
//! (`mira-toolkit/mtk_bulk_data_collection/mtk_bdc_{signal,request,subpacket}.c`).

use kernel::config::SUBPACKET_MAX_BYTES;

pub const BDC_SIGNAL_HEADER: [u8; 2] = [0x54, 0xAB];
pub const BDC_REQUEST_HEADER: [u8; 2] = [0xF2, 0x2A];
pub const BDC_SUBPACKET_HEADER: [u8; 2] = [0x1F, 0xB3];

/// BSS update frame: `data_id:u32 || version:u32 || value:bytes`. There is
/// no magic header; BSS frames are distinguished by UDP port, not content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BssFrame<'a> {
    pub data_id: u32,
    pub version: u32,
    pub value: &'a [u8],
}

impl<'a> BssFrame<'a> {
    /// Encode into `out`, returning the number of bytes written, or `None`
    /// if `out` is too small.
    pub fn encode(&self, out: &mut [u8]) -> Option<usize> {
        let total = 8 + self.value.len();
        if out.len() < total {
            return None;
        }
        out[0..4].copy_from_slice(&self.data_id.to_le_bytes());
        out[4..8].copy_from_slice(&self.version.to_le_bytes());
        out[8..total].copy_from_slice(self.value);
        Some(total)
    }

    /// Decode from `bytes`. Payload length is whatever remains after the
    /// 8-byte header, per spec §4.2 ("BSS...derives payload length from the
    /// datagram size"). Frames shorter than 8 bytes are rejected.
    pub fn decode(bytes: &'a [u8]) -> Option<BssFrame<'a>> {
        if bytes.len() < 8 {
            return None;
        }
        let data_id = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        Some(BssFrame {
            data_id,
            version,
            value: &bytes[8..],
        })
    }
}

/// BDC "signal": `header || packet_id:u16 || n_sub_packets:u8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalFrame {
    pub packet_id: u16,
    pub n_sub_packets: u8,
}

impl SignalFrame {
    pub const WIRE_LEN: usize = 2 + 2 + 1;

    pub fn encode(&self, out: &mut [u8]) -> Option<usize> {
        if out.len() < Self::WIRE_LEN {
            return None;
        }
        out[0..2].copy_from_slice(&BDC_SIGNAL_HEADER);
        out[2..4].copy_from_slice(&self.packet_id.to_le_bytes());
        out[4] = self.n_sub_packets;
        Some(Self::WIRE_LEN)
    }

    fn decode_body(bytes: &[u8]) -> Option<SignalFrame> {
        if bytes.len() != Self::WIRE_LEN {
            return None;
        }
        Some(SignalFrame {
            packet_id: u16::from_le_bytes(bytes[2..4].try_into().unwrap()),
            n_sub_packets: bytes[4],
        })
    }
}

/// BDC "request": `header || packet_id:u16 || mask:u64 || period_ms:u16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFrame {
    pub packet_id: u16,
    pub mask: u64,
    pub period_ms: u16,
}

impl RequestFrame {
    pub const WIRE_LEN: usize = 2 + 2 + 8 + 2;

    pub fn encode(&self, out: &mut [u8]) -> Option<usize> {
        if out.len() < Self::WIRE_LEN {
            return None;
        }
        out[0..2].copy_from_slice(&BDC_REQUEST_HEADER);
        out[2..4].copy_from_slice(&self.packet_id.to_le_bytes());
        out[4..12].copy_from_slice(&self.mask.to_le_bytes());
        out[12..14].copy_from_slice(&self.period_ms.to_le_bytes());
        Some(Self::WIRE_LEN)
    }

    fn decode_body(bytes: &[u8]) -> Option<RequestFrame> {
        if bytes.len() != Self::WIRE_LEN {
            return None;
        }
        Some(RequestFrame {
            packet_id: u16::from_le_bytes(bytes[2..4].try_into().unwrap()),
            mask: u64::from_le_bytes(bytes[4..12].try_into().unwrap()),
            period_ms: u16::from_le_bytes(bytes[12..14].try_into().unwrap()),
        })
    }
}

/// BDC "sub-packet": `header || packet_id:u16 || index:u8 ||
/// n_sub_packets:u8 || payload_len:u16 || payload:bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubPacketFrame<'a> {
    pub packet_id: u16,
    pub index: u8,
    pub n_sub_packets: u8,
    pub payload: &'a [u8],
}

impl<'a> SubPacketFrame<'a> {
    pub const HEADER_LEN: usize = 2 + 2 + 1 + 1 + 2;

    pub fn encode(&self, out: &mut [u8]) -> Option<usize> {
        let total = Self::HEADER_LEN + self.payload.len();
        if out.len() < total || self.payload.len() > SUBPACKET_MAX_BYTES {
            return None;
        }
        out[0..2].copy_from_slice(&BDC_SUBPACKET_HEADER);
        out[2..4].copy_from_slice(&self.packet_id.to_le_bytes());
        out[4] = self.index;
        out[5] = self.n_sub_packets;
        out[6..8].copy_from_slice(&(self.payload.len() as u16).to_le_bytes());
        out[8..total].copy_from_slice(self.payload);
        Some(total)
    }

    fn decode_body(bytes: &'a [u8]) -> Option<SubPacketFrame<'a>> {
        if bytes.len() < Self::HEADER_LEN {
            return None;
        }
        let packet_id = u16::from_le_bytes(bytes[2..4].try_into().unwrap());
        let index = bytes[4];
        let n_sub_packets = bytes[5];
        let payload_len = u16::from_le_bytes(bytes[6..8].try_into().unwrap()) as usize;
        if bytes.len() != Self::HEADER_LEN + payload_len {
            return None;
        }
        Some(SubPacketFrame {
            packet_id,
            index,
            n_sub_packets,
            payload: &bytes[Self::HEADER_LEN..],
        })
    }
}

/// Any of the three headered BDC message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BdcFrame<'a> {
    Signal(SignalFrame),
    Request(RequestFrame),
    SubPacket(SubPacketFrame<'a>),
}

/// Trial-parse a datagram received on the BDC port against each known
/// header in turn (spec §4.7: "fans out inbound UDP frames by trial-parsing
/// each BDC header in turn"). `None` means either too short, an unknown
/// header (silently ignored "to allow coexistence", §4.2), or a length
/// mismatch against a recognised header.
pub fn parse_bdc(bytes: &[u8]) -> Option<BdcFrame<'_>> {
    if bytes.len() < 2 {
        return None;
    }
    match [bytes[0], bytes[1]] {
        BDC_SIGNAL_HEADER => SignalFrame::decode_body(bytes).map(BdcFrame::Signal),
        BDC_REQUEST_HEADER => RequestFrame::decode_body(bytes).map(BdcFrame::Request),
        BDC_SUBPACKET_HEADER => SubPacketFrame::decode_body(bytes).map(BdcFrame::SubPacket),
        _ => None,
    }
}
