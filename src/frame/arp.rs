//! Read wrapper for an ARP header carried over Ethernet.

use byteorder::{ByteOrder, NetworkEndian};
use smoltcp::wire::Ipv4Address;

pub const HEADER_LEN: usize = 28;

pub const HRD_ETHERNET: u16 = 1;
pub const OP_REQUEST: u16 = 1;
pub const OP_REPLY: u16 = 2;

mod field {
    use crate::field::*;

    pub const HRD: Field = 0..2;
    pub const PRO: Field = 2..4;
    pub const HLN: usize = 4;
    pub const PLN: usize = 5;
    pub const OP: Field = 6..8;
    pub const SPA: Field = 14..18;
    pub const TPA: Field = 24..28;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> Packet<T> {
    pub fn new(buffer: T) -> Packet<T> {
        Packet { buffer }
    }

    pub fn hrd(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::HRD])
    }

    pub fn pro(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::PRO])
    }

    pub fn hln(&self) -> u8 {
        self.buffer.as_ref()[field::HLN]
    }

    pub fn pln(&self) -> u8 {
        self.buffer.as_ref()[field::PLN]
    }

    pub fn op(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::OP])
    }

    /// Sender protocol address.
    pub fn spa(&self) -> Ipv4Address {
        Ipv4Address::from_bytes(&self.buffer.as_ref()[field::SPA])
    }

    /// Target protocol address.
    pub fn tpa(&self) -> Ipv4Address {
        Ipv4Address::from_bytes(&self.buffer.as_ref()[field::TPA])
    }

    /// Whether this is IPv4-over-Ethernet ARP.
    pub fn is_ethernet_ipv4(&self) -> bool {
        self.hrd() == HRD_ETHERNET
            && self.pro() == super::ethertype::IPV4
            && self.hln() == 6
            && self.pln() == 4
    }
}
