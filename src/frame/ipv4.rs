//! Read/write wrapper for the IPv4 header.

use byteorder::{ByteOrder, NetworkEndian};
use smoltcp::wire::Ipv4Address;

/// Length of an IPv4 header without options. The datapath does not
/// process packets with IP options past the network layer.
pub const HEADER_LEN: usize = 20;

/// DSCP part of the ToS byte.
pub const DSCP_MASK: u8 = 0xfc;
/// ECN part of the ToS byte.
pub const ECN_MASK: u8 = 0x03;

/// More-fragments flag and fragment offset bits of the frag field.
const FRAGMENT_MASK: u16 = 0x3fff;

mod field {
    use crate::field::*;

    pub const VER_IHL: usize = 0;
    pub const TOS: usize = 1;
    pub const TOTAL_LEN: Field = 2..4;
    pub const IDENT: Field = 4..6;
    pub const FRAG: Field = 6..8;
    pub const TTL: usize = 8;
    pub const PROTO: usize = 9;
    pub const CSUM: Field = 10..12;
    pub const SRC: Field = 12..16;
    pub const DST: Field = 16..20;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> Packet<T> {
    pub fn new(buffer: T) -> Packet<T> {
        Packet { buffer }
    }

    pub fn version(&self) -> u8 {
        self.buffer.as_ref()[field::VER_IHL] >> 4
    }

    /// Header length in bytes.
    pub fn header_len(&self) -> usize {
        usize::from(self.buffer.as_ref()[field::VER_IHL] & 0x0f) * 4
    }

    pub fn tos(&self) -> u8 {
        self.buffer.as_ref()[field::TOS]
    }

    /// The DSCP value: the upper six bits of the ToS byte.
    pub fn dscp(&self) -> u8 {
        self.tos() >> 2
    }

    pub fn total_len(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::TOTAL_LEN])
    }

    /// Whether the packet is a fragment: offset non-zero or the
    /// more-fragments flag set.
    pub fn is_fragment(&self) -> bool {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::FRAG]) & FRAGMENT_MASK != 0
    }

    pub fn ttl(&self) -> u8 {
        self.buffer.as_ref()[field::TTL]
    }

    pub fn proto(&self) -> u8 {
        self.buffer.as_ref()[field::PROTO]
    }

    pub fn csum(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::CSUM])
    }

    pub fn src(&self) -> Ipv4Address {
        Ipv4Address::from_bytes(&self.buffer.as_ref()[field::SRC])
    }

    pub fn dst(&self) -> Ipv4Address {
        Ipv4Address::from_bytes(&self.buffer.as_ref()[field::DST])
    }

    /// The 16-bit header word holding ttl and proto, as checksum input.
    pub fn ttl_proto_word(&self) -> u16 {
        u16::from(self.ttl()) << 8 | u16::from(self.proto())
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    pub fn set_tos(&mut self, value: u8) {
        self.buffer.as_mut()[field::TOS] = value
    }

    pub fn set_ttl(&mut self, value: u8) {
        self.buffer.as_mut()[field::TTL] = value
    }

    pub fn set_csum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[field::CSUM], value)
    }

    pub fn set_src(&mut self, value: Ipv4Address) {
        self.buffer.as_mut()[field::SRC].copy_from_slice(value.as_bytes())
    }

    pub fn set_dst(&mut self, value: Ipv4Address) {
        self.buffer.as_mut()[field::DST].copy_from_slice(value.as_bytes())
    }

    /// Recompute the header checksum from scratch. Only used when
    /// synthesizing headers; the action path updates incrementally.
    pub fn fill_csum(&mut self) {
        self.set_csum(0);
        let len = self.header_len();
        let csum = crate::csum::checksum(&self.buffer.as_ref()[..len]);
        self.set_csum(csum);
    }
}
