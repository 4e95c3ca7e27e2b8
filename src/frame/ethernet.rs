//! Read/write wrapper for the Ethernet header, including the 802.3
//! LLC/SNAP variant.

use byteorder::{ByteOrder, NetworkEndian};
use smoltcp::wire::EthernetAddress;

/// Length of the basic Ethernet header.
pub const HEADER_LEN: usize = 14;
/// Length of the LLC header following an 802.3 Ethernet header.
pub const LLC_LEN: usize = 3;
/// Length of the SNAP header following the LLC header.
pub const SNAP_LEN: usize = 5;
/// Length of an 802.3 header with LLC and SNAP.
pub const HEADER_8023_LEN: usize = HEADER_LEN + LLC_LEN + SNAP_LEN;

pub const LLC_DSAP_SNAP: u8 = 0xaa;
pub const LLC_SSAP_SNAP: u8 = 0xaa;
pub const LLC_CNTL_SNAP: u8 = 0x03;
/// OUI of plain Ethernet encapsulation.
pub const SNAP_ORG_ETHERNET: [u8; 3] = [0, 0, 0];

mod field {
    use crate::field::*;

    pub const DST: Field = 0..6;
    pub const SRC: Field = 6..12;
    pub const ETHERTYPE: Field = 12..14;
    // 802.3 only, relative to the frame start
    pub const LLC_DSAP: usize = 14;
    pub const LLC_SSAP: usize = 15;
    pub const LLC_CNTL: usize = 16;
    pub const SNAP_ORG: Field = 17..20;
    pub const SNAP_TYPE: Field = 20..22;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> Packet<T> {
    pub fn new(buffer: T) -> Packet<T> {
        Packet { buffer }
    }

    pub fn dst(&self) -> EthernetAddress {
        EthernetAddress::from_bytes(&self.buffer.as_ref()[field::DST])
    }

    pub fn src(&self) -> EthernetAddress {
        EthernetAddress::from_bytes(&self.buffer.as_ref()[field::SRC])
    }

    /// The ethertype of an Ethernet II frame, or the length of an 802.3
    /// frame.
    pub fn ethertype(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::ETHERTYPE])
    }

    /// Whether this is an Ethernet II frame.
    pub fn is_ethernet_ii(&self) -> bool {
        self.ethertype() >= super::ethertype::ETH_II_MIN
    }

    /// Whether an 802.3 frame carries the LLC/SNAP header with plain
    /// Ethernet encapsulation. The buffer must hold
    /// [`HEADER_8023_LEN`] bytes.
    pub fn has_snap(&self) -> bool {
        let data = self.buffer.as_ref();
        data[field::LLC_DSAP] == LLC_DSAP_SNAP
            && data[field::LLC_SSAP] == LLC_SSAP_SNAP
            && data[field::LLC_CNTL] == LLC_CNTL_SNAP
            && data[field::SNAP_ORG] == SNAP_ORG_ETHERNET
    }

    /// The encapsulated ethertype of an 802.3 LLC/SNAP frame.
    pub fn snap_type(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::SNAP_TYPE])
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    pub fn set_dst(&mut self, value: EthernetAddress) {
        self.buffer.as_mut()[field::DST].copy_from_slice(value.as_bytes())
    }

    pub fn set_src(&mut self, value: EthernetAddress) {
        self.buffer.as_mut()[field::SRC].copy_from_slice(value.as_bytes())
    }

    pub fn set_ethertype(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[field::ETHERTYPE], value)
    }

    pub fn set_snap_type(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[field::SNAP_TYPE], value)
    }
}
