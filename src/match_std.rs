//! The OpenFlow 1.1 standard match: a flat record of L1-L4 selector
//! fields, a wildcard bitmap for the scalar fields, and bit masks for the
//! address and metadata fields.
//!
//! Three comparisons are defined over matches. The packet comparison is
//! used on the lookup path, where the right-hand side is a match extracted
//! from a packet (no wildcards, no masks). The non-strict comparison is
//! used by delete, modify and stats filtering. The strict comparison
//! requires both sides to wildcard and mask exactly the same bits.
//!
//! Handling of bitmasked fields is not specified by the protocol. Here a
//! masked field of (a) matches the field of (b) if all masked bits of (b)
//! are also masked in (a), and each unmasked bit of (b) is either masked
//! in (a) or equal in both.

use byteorder::{ByteOrder, NetworkEndian};
use smoltcp::wire::{EthernetAddress, Ipv4Address};

use core::fmt;

/// Wildcard bits of the scalar match fields. A set bit means the field is
/// ignored. Address and metadata fields use their masks instead.
pub mod wildcards {
    pub const IN_PORT: u32 = 1 << 0;
    pub const DL_VLAN: u32 = 1 << 1;
    pub const DL_VLAN_PCP: u32 = 1 << 2;
    pub const DL_TYPE: u32 = 1 << 3;
    pub const NW_TOS: u32 = 1 << 4;
    pub const NW_PROTO: u32 = 1 << 5;
    pub const TP_SRC: u32 = 1 << 6;
    pub const TP_DST: u32 = 1 << 7;
    pub const MPLS_LABEL: u32 = 1 << 8;
    pub const MPLS_TC: u32 = 1 << 9;
    pub const ALL: u32 = 0x3ff;
}

/// Value of `dl_vlan` matching packets without a VLAN tag.
pub const VID_NONE: u16 = 0xffff;
/// Value of `dl_vlan` matching packets with any VLAN tag.
pub const VID_ANY: u16 = 0xfffe;

/// The OpenFlow 1.1 standard match record.
///
/// Masks select the bits which are *ignored*: an all-ones mask wildcards
/// the field entirely, an all-zeroes mask requires an exact match.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct StandardMatch {
    pub in_port: u32,
    pub wildcards: u32,
    pub dl_src: EthernetAddress,
    pub dl_src_mask: EthernetAddress,
    pub dl_dst: EthernetAddress,
    pub dl_dst_mask: EthernetAddress,
    pub dl_vlan: u16,
    pub dl_vlan_pcp: u8,
    pub dl_type: u16,
    pub nw_tos: u8,
    pub nw_proto: u8,
    pub nw_src: Ipv4Address,
    pub nw_src_mask: Ipv4Address,
    pub nw_dst: Ipv4Address,
    pub nw_dst_mask: Ipv4Address,
    pub tp_src: u16,
    pub tp_dst: u16,
    pub mpls_label: u32,
    pub mpls_tc: u8,
    pub metadata: u64,
    pub metadata_mask: u64,
}

const ETH_MASK_ALL: EthernetAddress = EthernetAddress([0xff; 6]);
const IP_MASK_ALL: Ipv4Address = Ipv4Address([0xff; 4]);

impl Default for StandardMatch {
    fn default() -> StandardMatch {
        StandardMatch::any()
    }
}

impl StandardMatch {
    /// Return the match that matches every packet: all scalar fields
    /// wildcarded, all masks all-ones.
    pub fn any() -> StandardMatch {
        StandardMatch {
            in_port: 0,
            wildcards: wildcards::ALL,
            dl_src: EthernetAddress([0; 6]),
            dl_src_mask: ETH_MASK_ALL,
            dl_dst: EthernetAddress([0; 6]),
            dl_dst_mask: ETH_MASK_ALL,
            dl_vlan: 0,
            dl_vlan_pcp: 0,
            dl_type: 0,
            nw_tos: 0,
            nw_proto: 0,
            nw_src: Ipv4Address([0; 4]),
            nw_src_mask: IP_MASK_ALL,
            nw_dst: Ipv4Address([0; 4]),
            nw_dst_mask: IP_MASK_ALL,
            tp_src: 0,
            tp_dst: 0,
            mpls_label: 0,
            mpls_tc: 0,
            metadata: 0,
            metadata_mask: !0,
        }
    }

    /// Return the match extracted from a packet, before the parser fills
    /// it in: nothing wildcarded, nothing masked, every field zero.
    pub fn exact() -> StandardMatch {
        StandardMatch {
            wildcards: 0,
            dl_src_mask: EthernetAddress([0; 6]),
            dl_dst_mask: EthernetAddress([0; 6]),
            nw_src_mask: Ipv4Address([0; 4]),
            nw_dst_mask: Ipv4Address([0; 4]),
            metadata_mask: 0,
            ..StandardMatch::any()
        }
    }

    /// Zero every value bit that its mask ignores, so that equal selectors
    /// have equal representations.
    pub fn canonicalize(&mut self) {
        self.dl_src = eth_clear(self.dl_src, self.dl_src_mask);
        self.dl_dst = eth_clear(self.dl_dst, self.dl_dst_mask);
        self.nw_src = ip_clear(self.nw_src, self.nw_src_mask);
        self.nw_dst = ip_clear(self.nw_dst, self.nw_dst_mask);
        self.metadata &= !self.metadata_mask;
    }

    /// Strict comparison: wildcards and masks must be identical, and every
    /// non-wildcarded field must match bit for bit.
    pub fn matches_strict(&self, other: &StandardMatch) -> bool {
        let (a, b) = (self, other);
        strict_wild32(a.in_port, b.in_port, a.wildcards, b.wildcards, wildcards::IN_PORT)
            && strict_mask48(u48(a.dl_src), u48(b.dl_src), u48(a.dl_src_mask), u48(b.dl_src_mask))
            && strict_mask48(u48(a.dl_dst), u48(b.dl_dst), u48(a.dl_dst_mask), u48(b.dl_dst_mask))
            && strict_wild16(a.dl_vlan, b.dl_vlan, a.wildcards, b.wildcards, wildcards::DL_VLAN)
            && strict_wild8(a.dl_vlan_pcp, b.dl_vlan_pcp, a.wildcards, b.wildcards, wildcards::DL_VLAN_PCP)
            && strict_wild16(a.dl_type, b.dl_type, a.wildcards, b.wildcards, wildcards::DL_TYPE)
            && strict_wild8(a.nw_tos, b.nw_tos, a.wildcards, b.wildcards, wildcards::NW_TOS)
            && strict_wild8(a.nw_proto, b.nw_proto, a.wildcards, b.wildcards, wildcards::NW_PROTO)
            && strict_mask32(u32v(a.nw_src), u32v(b.nw_src), u32v(a.nw_src_mask), u32v(b.nw_src_mask))
            && strict_mask32(u32v(a.nw_dst), u32v(b.nw_dst), u32v(a.nw_dst_mask), u32v(b.nw_dst_mask))
            && strict_wild16(a.tp_src, b.tp_src, a.wildcards, b.wildcards, wildcards::TP_SRC)
            && strict_wild16(a.tp_dst, b.tp_dst, a.wildcards, b.wildcards, wildcards::TP_DST)
            && strict_wild32(a.mpls_label, b.mpls_label, a.wildcards, b.wildcards, wildcards::MPLS_LABEL)
            && strict_wild8(a.mpls_tc, b.mpls_tc, a.wildcards, b.wildcards, wildcards::MPLS_TC)
            && strict_mask64(a.metadata, b.metadata, a.metadata_mask, b.metadata_mask)
    }

    /// Non-strict comparison: `self` is the selector; a field of `other`
    /// matches if `self` wildcards it, or both wildcard it, or neither
    /// does and the values agree.
    pub fn matches_nonstrict(&self, other: &StandardMatch) -> bool {
        let (a, b) = (self, other);
        nonstrict_wild32(a.in_port, b.in_port, a.wildcards, b.wildcards, wildcards::IN_PORT)
            && nonstrict_mask48(u48(a.dl_src), u48(b.dl_src), u48(a.dl_src_mask), u48(b.dl_src_mask))
            && nonstrict_mask48(u48(a.dl_dst), u48(b.dl_dst), u48(a.dl_dst_mask), u48(b.dl_dst_mask))
            && nonstrict_dlvlan(a.dl_vlan, b.dl_vlan, a.wildcards, b.wildcards)
            && nonstrict_dlvpcp(a.dl_vlan, a.dl_vlan_pcp, b.dl_vlan, b.dl_vlan_pcp, a.wildcards, b.wildcards)
            && nonstrict_wild16(a.dl_type, b.dl_type, a.wildcards, b.wildcards, wildcards::DL_TYPE)
            && nonstrict_wild8(a.nw_tos, b.nw_tos, a.wildcards, b.wildcards, wildcards::NW_TOS)
            && nonstrict_wild8(a.nw_proto, b.nw_proto, a.wildcards, b.wildcards, wildcards::NW_PROTO)
            && nonstrict_mask32(u32v(a.nw_src), u32v(b.nw_src), u32v(a.nw_src_mask), u32v(b.nw_src_mask))
            && nonstrict_mask32(u32v(a.nw_dst), u32v(b.nw_dst), u32v(a.nw_dst_mask), u32v(b.nw_dst_mask))
            && nonstrict_wild16(a.tp_src, b.tp_src, a.wildcards, b.wildcards, wildcards::TP_SRC)
            && nonstrict_wild16(a.tp_dst, b.tp_dst, a.wildcards, b.wildcards, wildcards::TP_DST)
            && nonstrict_wild32(a.mpls_label, b.mpls_label, a.wildcards, b.wildcards, wildcards::MPLS_LABEL)
            && nonstrict_wild8(a.mpls_tc, b.mpls_tc, a.wildcards, b.wildcards, wildcards::MPLS_TC)
            && nonstrict_mask64(a.metadata, b.metadata, a.metadata_mask, b.metadata_mask)
    }

    /// Two matches overlap if there exists a packet which both match.
    pub fn overlaps(&self, other: &StandardMatch) -> bool {
        self.matches_nonstrict(other) || other.matches_nonstrict(self)
    }

    /// Packet comparison: `other` is the match extracted from a packet,
    /// whose wildcards and masks are all zero and therefore ignored.
    pub fn matches_packet(&self, other: &StandardMatch) -> bool {
        let (a, b) = (self, other);
        pkt_wild32(a.in_port, b.in_port, a.wildcards, wildcards::IN_PORT)
            && pkt_mask48(u48(a.dl_src), u48(b.dl_src), u48(a.dl_src_mask))
            && pkt_mask48(u48(a.dl_dst), u48(b.dl_dst), u48(a.dl_dst_mask))
            && pkt_dlvlan(a.dl_vlan, b.dl_vlan, a.wildcards)
            && pkt_dlvpcp(a.dl_vlan, a.dl_vlan_pcp, b.dl_vlan, b.dl_vlan_pcp, a.wildcards)
            && pkt_wild16(a.dl_type, b.dl_type, a.wildcards, wildcards::DL_TYPE)
            && pkt_wild8(a.nw_tos, b.nw_tos, a.wildcards, wildcards::NW_TOS)
            && pkt_wild8(a.nw_proto, b.nw_proto, a.wildcards, wildcards::NW_PROTO)
            && pkt_mask32(u32v(a.nw_src), u32v(b.nw_src), u32v(a.nw_src_mask))
            && pkt_mask32(u32v(a.nw_dst), u32v(b.nw_dst), u32v(a.nw_dst_mask))
            && pkt_wild16(a.tp_src, b.tp_src, a.wildcards, wildcards::TP_SRC)
            && pkt_wild16(a.tp_dst, b.tp_dst, a.wildcards, wildcards::TP_DST)
            && pkt_wild32(a.mpls_label, b.mpls_label, a.wildcards, wildcards::MPLS_LABEL)
            && pkt_wild8(a.mpls_tc, b.mpls_tc, a.wildcards, wildcards::MPLS_TC)
            && pkt_mask64(a.metadata, b.metadata, a.metadata_mask)
    }
}

fn u48(addr: EthernetAddress) -> u64 {
    let b = addr.as_bytes();
    (u64::from(NetworkEndian::read_u32(&b[0..4])) << 16) | u64::from(NetworkEndian::read_u16(&b[4..6]))
}

fn u32v(addr: Ipv4Address) -> u32 {
    NetworkEndian::read_u32(addr.as_bytes())
}

fn eth_clear(value: EthernetAddress, mask: EthernetAddress) -> EthernetAddress {
    let mut out = [0; 6];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = value.as_bytes()[i] & !mask.as_bytes()[i];
    }
    EthernetAddress(out)
}

fn ip_clear(value: Ipv4Address, mask: Ipv4Address) -> Ipv4Address {
    let mut out = [0; 4];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = value.as_bytes()[i] & !mask.as_bytes()[i];
    }
    Ipv4Address(out)
}

fn wc(wildcards: u32, field: u32) -> bool {
    wildcards & field != 0
}

fn strict_wild8(a: u8, b: u8, aw: u32, bw: u32, f: u32) -> bool {
    (wc(aw, f) && wc(bw, f)) || (!wc(aw, f) && !wc(bw, f) && a == b)
}

fn strict_wild16(a: u16, b: u16, aw: u32, bw: u32, f: u32) -> bool {
    (wc(aw, f) && wc(bw, f)) || (!wc(aw, f) && !wc(bw, f) && a == b)
}

fn strict_wild32(a: u32, b: u32, aw: u32, bw: u32, f: u32) -> bool {
    (wc(aw, f) && wc(bw, f)) || (!wc(aw, f) && !wc(bw, f) && a == b)
}

fn strict_mask32(a: u32, b: u32, am: u32, bm: u32) -> bool {
    am == bm && (a ^ b) & !am == 0
}

fn strict_mask48(a: u64, b: u64, am: u64, bm: u64) -> bool {
    am == bm && (a ^ b) & !am == 0
}

fn strict_mask64(a: u64, b: u64, am: u64, bm: u64) -> bool {
    am == bm && (a ^ b) & !am == 0
}

fn nonstrict_wild8(a: u8, b: u8, aw: u32, bw: u32, f: u32) -> bool {
    (wc(bw, f) && wc(aw, f)) || (!wc(bw, f) && (wc(aw, f) || a == b))
}

fn nonstrict_wild16(a: u16, b: u16, aw: u32, bw: u32, f: u32) -> bool {
    (wc(bw, f) && wc(aw, f)) || (!wc(bw, f) && (wc(aw, f) || a == b))
}

fn nonstrict_wild32(a: u32, b: u32, aw: u32, bw: u32, f: u32) -> bool {
    (wc(bw, f) && wc(aw, f)) || (!wc(bw, f) && (wc(aw, f) || a == b))
}

fn nonstrict_mask32(a: u32, b: u32, am: u32, bm: u32) -> bool {
    !am & (!a | !b | bm) & (a | b | bm) == 0
}

fn nonstrict_mask48(a: u64, b: u64, am: u64, bm: u64) -> bool {
    !am & (!a | !b | bm) & (a | b | bm) & 0xffff_ffff_ffff == 0
}

fn nonstrict_mask64(a: u64, b: u64, am: u64, bm: u64) -> bool {
    !am & (!a | !b | bm) & (a | b | bm) == 0
}

fn nonstrict_dlvlan(a: u16, b: u16, aw: u32, bw: u32) -> bool {
    let f = wildcards::DL_VLAN;
    (wc(bw, f) && wc(aw, f))
        || (!wc(bw, f) && (wc(aw, f) || (a == VID_ANY && b != VID_NONE) || a == b))
}

fn nonstrict_dlvpcp(avlan: u16, apcp: u8, bvlan: u16, bpcp: u8, aw: u32, bw: u32) -> bool {
    let f = wildcards::DL_VLAN_PCP;
    (wc(bw, f) && wc(aw, f))
        || (!wc(bw, f) && (wc(aw, f) || (avlan == VID_NONE && bvlan == VID_NONE) || apcp == bpcp))
}

fn pkt_wild8(a: u8, b: u8, aw: u32, f: u32) -> bool {
    wc(aw, f) || a == b
}

fn pkt_wild16(a: u16, b: u16, aw: u32, f: u32) -> bool {
    wc(aw, f) || a == b
}

fn pkt_wild32(a: u32, b: u32, aw: u32, f: u32) -> bool {
    wc(aw, f) || a == b
}

fn pkt_mask32(a: u32, b: u32, am: u32) -> bool {
    !am & (a ^ b) == 0
}

fn pkt_mask48(a: u64, b: u64, am: u64) -> bool {
    !am & (a ^ b) & 0xffff_ffff_ffff == 0
}

fn pkt_mask64(a: u64, b: u64, am: u64) -> bool {
    !am & (a ^ b) == 0
}

fn pkt_dlvlan(a: u16, b: u16, aw: u32) -> bool {
    wc(aw, wildcards::DL_VLAN) || (a == VID_ANY && b != VID_NONE) || a == b
}

fn pkt_dlvpcp(avlan: u16, apcp: u8, bvlan: u16, bpcp: u8, aw: u32) -> bool {
    wc(aw, wildcards::DL_VLAN_PCP) || (avlan == VID_NONE && bvlan == VID_NONE) || apcp == bpcp
}

impl fmt::Display for StandardMatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "match{{")?;
        if !wc(self.wildcards, wildcards::IN_PORT) {
            write!(f, "in_port={} ", self.in_port)?;
        }
        if u48(self.dl_src_mask) & 0xffff_ffff_ffff != 0xffff_ffff_ffff {
            write!(f, "dl_src={} ", self.dl_src)?;
        }
        if u48(self.dl_dst_mask) & 0xffff_ffff_ffff != 0xffff_ffff_ffff {
            write!(f, "dl_dst={} ", self.dl_dst)?;
        }
        if !wc(self.wildcards, wildcards::DL_VLAN) {
            write!(f, "dl_vlan={:#x} ", self.dl_vlan)?;
        }
        if !wc(self.wildcards, wildcards::DL_TYPE) {
            write!(f, "dl_type={:#06x} ", self.dl_type)?;
        }
        if u32v(self.nw_src_mask) != !0 {
            write!(f, "nw_src={} ", self.nw_src)?;
        }
        if u32v(self.nw_dst_mask) != !0 {
            write!(f, "nw_dst={} ", self.nw_dst)?;
        }
        if !wc(self.wildcards, wildcards::NW_PROTO) {
            write!(f, "nw_proto={} ", self.nw_proto)?;
        }
        if !wc(self.wildcards, wildcards::TP_SRC) {
            write!(f, "tp_src={} ", self.tp_src)?;
        }
        if !wc(self.wildcards, wildcards::TP_DST) {
            write!(f, "tp_dst={} ", self.tp_dst)?;
        }
        write!(f, "wildcards={:#05x}}}", self.wildcards)
    }
}
