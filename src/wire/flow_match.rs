//! Wire form of the OpenFlow 1.1 standard match (OFPMT_STANDARD).
//!
//! ```no_rust
//! +---------------+---------------+
//! |      type     |     length    |
//! +---------------+---------------+
//! |            in port            |
//! +-------------------------------+
//! |           wildcards           |
//! +-------------------------------+
//! |  dl_src (6)   + dl_src_mask(6)|
//! |  dl_dst (6)   + dl_dst_mask(6)|
//! +---------------+-------+-------+
//! |    dl_vlan    |  pcp  |  pad  |
//! +---------------+-------+-------+
//! |    dl_type    |  tos  | proto |
//! +---------------+-------+-------+
//! |  nw_src, nw_src_mask          |
//! |  nw_dst, nw_dst_mask          |
//! +---------------+---------------+
//! |     tp_src    |     tp_dst    |
//! +---------------+---------------+
//! |           mpls_label          |
//! +-------+-----------------------+
//! |  tc   |        pad (3)        |
//! +-------+-----------------------+
//! |          metadata (8)         |
//! |        metadata_mask (8)      |
//! +-------------------------------+
//! ```
//!
//! The structure is fixed size; the length field always reads 88.

use byteorder::{ByteOrder, NetworkEndian};
use smoltcp::wire::{EthernetAddress, Ipv4Address};

use crate::error::{BadMatchCode, OfpError};
use crate::match_std::StandardMatch;
use crate::{Error, Repr, Result};

/// Match type of the 1.1 standard match.
pub const MATCH_TYPE_STANDARD: u16 = 0;
/// Total wire size of the standard match.
pub const STANDARD_LENGTH: usize = 88;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

mod field {
    use crate::field::*;

    pub const MATCH_TYPE: Field = 0..2;
    pub const LENGTH: Field = 2..4;
    pub const IN_PORT: Field = 4..8;
    pub const WILDCARDS: Field = 8..12;
    pub const DL_SRC: Field = 12..18;
    pub const DL_SRC_MASK: Field = 18..24;
    pub const DL_DST: Field = 24..30;
    pub const DL_DST_MASK: Field = 30..36;
    pub const DL_VLAN: Field = 36..38;
    pub const DL_VLAN_PCP: usize = 38;
    pub const PAD1: usize = 39;
    pub const DL_TYPE: Field = 40..42;
    pub const NW_TOS: usize = 42;
    pub const NW_PROTO: usize = 43;
    pub const NW_SRC: Field = 44..48;
    pub const NW_SRC_MASK: Field = 48..52;
    pub const NW_DST: Field = 52..56;
    pub const NW_DST_MASK: Field = 56..60;
    pub const TP_SRC: Field = 60..62;
    pub const TP_DST: Field = 62..64;
    pub const MPLS_LABEL: Field = 64..68;
    pub const MPLS_TC: usize = 68;
    pub const PAD2: Field = 69..72;
    pub const METADATA: Field = 72..80;
    pub const METADATA_MASK: Field = 80..88;
}

impl<T: AsRef<[u8]>> Packet<T> {
    pub fn new(buffer: T) -> Packet<T> {
        Packet { buffer }
    }

    pub fn new_checked(buffer: T) -> Result<Packet<T>> {
        let packet = Self::new(buffer);
        packet.check_len()?;
        Ok(packet)
    }

    pub fn check_len(&self) -> Result<()> {
        if self.buffer.as_ref().len() < STANDARD_LENGTH {
            Err(OfpError::BadMatch(BadMatchCode::BadLen).into())
        } else {
            Ok(())
        }
    }

    #[inline]
    pub fn match_type(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::MATCH_TYPE])
    }

    #[inline]
    pub fn length(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::LENGTH])
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    #[inline]
    pub fn set_match_type(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[field::MATCH_TYPE], value)
    }

    #[inline]
    pub fn set_length(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[field::LENGTH], value)
    }
}

impl Repr for StandardMatch {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let packet = Packet::new_checked(buffer)?;
        if packet.match_type() != MATCH_TYPE_STANDARD {
            return Err(OfpError::BadMatch(BadMatchCode::BadType).into());
        }
        if packet.length() as usize != STANDARD_LENGTH {
            return Err(OfpError::BadMatch(BadMatchCode::BadLen).into());
        }
        let data = packet.buffer.as_ref();
        let mut m = StandardMatch {
            in_port: NetworkEndian::read_u32(&data[field::IN_PORT]),
            wildcards: NetworkEndian::read_u32(&data[field::WILDCARDS]),
            dl_src: EthernetAddress::from_bytes(&data[field::DL_SRC]),
            dl_src_mask: EthernetAddress::from_bytes(&data[field::DL_SRC_MASK]),
            dl_dst: EthernetAddress::from_bytes(&data[field::DL_DST]),
            dl_dst_mask: EthernetAddress::from_bytes(&data[field::DL_DST_MASK]),
            dl_vlan: NetworkEndian::read_u16(&data[field::DL_VLAN]),
            dl_vlan_pcp: data[field::DL_VLAN_PCP],
            dl_type: NetworkEndian::read_u16(&data[field::DL_TYPE]),
            nw_tos: data[field::NW_TOS],
            nw_proto: data[field::NW_PROTO],
            nw_src: Ipv4Address::from_bytes(&data[field::NW_SRC]),
            nw_src_mask: Ipv4Address::from_bytes(&data[field::NW_SRC_MASK]),
            nw_dst: Ipv4Address::from_bytes(&data[field::NW_DST]),
            nw_dst_mask: Ipv4Address::from_bytes(&data[field::NW_DST_MASK]),
            tp_src: NetworkEndian::read_u16(&data[field::TP_SRC]),
            tp_dst: NetworkEndian::read_u16(&data[field::TP_DST]),
            mpls_label: NetworkEndian::read_u32(&data[field::MPLS_LABEL]),
            mpls_tc: data[field::MPLS_TC],
            metadata: NetworkEndian::read_u64(&data[field::METADATA]),
            metadata_mask: NetworkEndian::read_u64(&data[field::METADATA_MASK]),
        };
        m.canonicalize();
        Ok(m)
    }

    fn buffer_len(&self) -> usize {
        STANDARD_LENGTH
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < STANDARD_LENGTH {
            return Err(Error::Exhausted);
        }
        let mut packet = Packet::new(buffer);
        packet.set_match_type(MATCH_TYPE_STANDARD);
        packet.set_length(STANDARD_LENGTH as u16);
        let data = packet.buffer.as_mut();
        NetworkEndian::write_u32(&mut data[field::IN_PORT], self.in_port);
        NetworkEndian::write_u32(&mut data[field::WILDCARDS], self.wildcards);
        data[field::DL_SRC].copy_from_slice(self.dl_src.as_bytes());
        data[field::DL_SRC_MASK].copy_from_slice(self.dl_src_mask.as_bytes());
        data[field::DL_DST].copy_from_slice(self.dl_dst.as_bytes());
        data[field::DL_DST_MASK].copy_from_slice(self.dl_dst_mask.as_bytes());
        NetworkEndian::write_u16(&mut data[field::DL_VLAN], self.dl_vlan);
        data[field::DL_VLAN_PCP] = self.dl_vlan_pcp;
        data[field::PAD1] = 0;
        NetworkEndian::write_u16(&mut data[field::DL_TYPE], self.dl_type);
        data[field::NW_TOS] = self.nw_tos;
        data[field::NW_PROTO] = self.nw_proto;
        data[field::NW_SRC].copy_from_slice(self.nw_src.as_bytes());
        data[field::NW_SRC_MASK].copy_from_slice(self.nw_src_mask.as_bytes());
        data[field::NW_DST].copy_from_slice(self.nw_dst.as_bytes());
        data[field::NW_DST_MASK].copy_from_slice(self.nw_dst_mask.as_bytes());
        NetworkEndian::write_u16(&mut data[field::TP_SRC], self.tp_src);
        NetworkEndian::write_u16(&mut data[field::TP_DST], self.tp_dst);
        NetworkEndian::write_u32(&mut data[field::MPLS_LABEL], self.mpls_label);
        data[field::MPLS_TC] = self.mpls_tc;
        for i in field::PAD2 {
            data[i] = 0;
        }
        NetworkEndian::write_u64(&mut data[field::METADATA], self.metadata);
        NetworkEndian::write_u64(&mut data[field::METADATA_MASK], self.metadata_mask);
        Ok(())
    }
}
