//! The protocol view: where each known header sits in the frame, plus
//! the match record extracted from it.

use crate::frame::{arp, ethernet, ethertype, ip_proto, ipv4, mpls, transport, vlan};
use crate::match_std::{StandardMatch, VID_NONE};

/// Byte offsets of the parsed headers, relative to the start of the
/// frame. `None` means "not present or not parsed".
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct ProtoView {
    pub eth: Option<usize>,
    /// Offset of the SNAP header of an 802.3 LLC/SNAP frame.
    pub snap: Option<usize>,
    /// Outermost VLAN tag.
    pub vlan: Option<usize>,
    /// Innermost VLAN tag.
    pub vlan_last: Option<usize>,
    /// Outermost MPLS shim.
    pub mpls: Option<usize>,
    pub ipv4: Option<usize>,
    pub arp: Option<usize>,
    pub tcp: Option<usize>,
    pub udp: Option<usize>,
    pub sctp: Option<usize>,
    pub icmp: Option<usize>,
}

/// The parsed state of a packet: a protocol view and the extracted
/// match, guarded by a validity flag. Any action that moves headers
/// clears `valid`; the next user re-parses.
#[derive(Debug, Clone)]
pub struct Handle {
    pub valid: bool,
    pub view: ProtoView,
    pub fields: StandardMatch,
}

impl Handle {
    /// A handle that will be parsed on first use.
    pub fn invalid() -> Handle {
        Handle {
            valid: false,
            view: ProtoView::default(),
            fields: StandardMatch::exact(),
        }
    }

    /// Parse the frame and fill the view and match. The pipeline
    /// in-port and metadata are not derivable from the frame and are
    /// seeded by the caller.
    pub fn parse(buffer: &[u8], in_port: u32, metadata: u64) -> Handle {
        let mut handle = Handle::invalid();
        handle.valid = true;
        handle.fields.in_port = in_port;
        handle.fields.metadata = metadata;
        fill(buffer, &mut handle.view, &mut handle.fields);
        handle
    }
}

/// Single pass over the frame. Every header access is preceded by a
/// bounds check; on a truncated frame parsing just stops, leaving the
/// remaining offsets unset.
fn fill(buffer: &[u8], view: &mut ProtoView, fields: &mut StandardMatch) {
    let mut offset = 0;

    // Ethernet
    if buffer.len() < ethernet::HEADER_LEN {
        return;
    }
    view.eth = Some(0);
    offset += ethernet::HEADER_LEN;

    let eth = ethernet::Packet::new(buffer);
    if eth.is_ethernet_ii() {
        fields.dl_src = eth.src();
        fields.dl_dst = eth.dst();
        fields.dl_type = eth.ethertype();
    } else {
        // Ethernet 802.3 with LLC/SNAP
        if buffer.len() < ethernet::HEADER_8023_LEN {
            return;
        }
        if !eth.has_snap() {
            return;
        }
        view.snap = Some(ethernet::HEADER_LEN + ethernet::LLC_LEN);
        offset = ethernet::HEADER_8023_LEN;
        fields.dl_src = eth.src();
        fields.dl_dst = eth.dst();
        fields.dl_type = eth.snap_type();
    }

    // VLAN: the outermost tag is matched, further tags only advance
    // the effective dl_type
    if fields.dl_type == ethertype::VLAN || fields.dl_type == ethertype::VLAN_QINQ {
        if buffer.len() < offset + vlan::HEADER_LEN {
            return;
        }
        let tag = vlan::Packet::new(&buffer[offset..]);
        view.vlan = Some(offset);
        view.vlan_last = Some(offset);
        fields.dl_vlan = tag.vid();
        fields.dl_vlan_pcp = tag.pcp();
        fields.dl_type = tag.next_type();
        offset += vlan::HEADER_LEN;

        while fields.dl_type == ethertype::VLAN || fields.dl_type == ethertype::VLAN_QINQ {
            if buffer.len() < offset + vlan::HEADER_LEN {
                return;
            }
            let tag = vlan::Packet::new(&buffer[offset..]);
            view.vlan_last = Some(offset);
            fields.dl_type = tag.next_type();
            offset += vlan::HEADER_LEN;
        }
    } else {
        fields.dl_vlan = VID_NONE;
    }

    // MPLS: no processing past the outermost shim
    if fields.dl_type == ethertype::MPLS || fields.dl_type == ethertype::MPLS_MCAST {
        if buffer.len() < offset + mpls::HEADER_LEN {
            return;
        }
        let shim = mpls::Packet::new(&buffer[offset..]);
        view.mpls = Some(offset);
        fields.mpls_label = shim.label();
        fields.mpls_tc = shim.tc();
        return;
    }

    // ARP
    if fields.dl_type == ethertype::ARP {
        if buffer.len() < offset + arp::HEADER_LEN {
            return;
        }
        let header = arp::Packet::new(&buffer[offset..]);
        view.arp = Some(offset);
        if header.is_ethernet_ipv4() {
            if header.op() <= 0xff {
                fields.nw_proto = header.op() as u8;
            }
            if header.op() == arp::OP_REQUEST || header.op() == arp::OP_REPLY {
                fields.nw_src = header.spa();
                fields.nw_dst = header.tpa();
            }
        }
        return;
    }

    // IPv4
    if fields.dl_type != ethertype::IPV4 {
        return;
    }
    if buffer.len() < offset + ipv4::HEADER_LEN {
        return;
    }
    let header = ipv4::Packet::new(&buffer[offset..]);
    view.ipv4 = Some(offset);
    fields.nw_src = header.src();
    fields.nw_dst = header.dst();
    fields.nw_tos = header.dscp();
    fields.nw_proto = header.proto();

    // no transport layer for fragments, and no support for IP options
    if header.is_fragment() || header.header_len() != ipv4::HEADER_LEN {
        return;
    }
    offset += ipv4::HEADER_LEN;

    match fields.nw_proto {
        ip_proto::TCP => {
            if buffer.len() < offset + transport::TCP_HEADER_LEN {
                return;
            }
            let tcp = transport::Tcp::new(&buffer[offset..]);
            view.tcp = Some(offset);
            fields.tp_src = tcp.src();
            fields.tp_dst = tcp.dst();
        }
        ip_proto::UDP => {
            if buffer.len() < offset + transport::UDP_HEADER_LEN {
                return;
            }
            let udp = transport::Udp::new(&buffer[offset..]);
            view.udp = Some(offset);
            fields.tp_src = udp.src();
            fields.tp_dst = udp.dst();
        }
        ip_proto::ICMP => {
            if buffer.len() < offset + transport::ICMP_HEADER_LEN {
                return;
            }
            let icmp = transport::Icmp::new(&buffer[offset..]);
            view.icmp = Some(offset);
            fields.tp_src = u16::from(icmp.kind());
            fields.tp_dst = u16::from(icmp.code());
        }
        ip_proto::SCTP => {
            if buffer.len() < offset + transport::SCTP_HEADER_LEN {
                return;
            }
            let sctp = transport::Sctp::new(&buffer[offset..]);
            view.sctp = Some(offset);
            fields.tp_src = sctp.src();
            fields.tp_dst = sctp.dst();
        }
        _ => {}
    }
}

/// Whether the packet may continue through the pipeline: an outer MPLS
/// or IPv4 TTL of 1 or 0 makes it invalid.
pub fn is_ttl_valid(buffer: &[u8], view: &ProtoView) -> bool {
    if let Some(offset) = view.mpls {
        if mpls::Packet::new(&buffer[offset..]).ttl() <= 1 {
            return false;
        }
    }
    if let Some(offset) = view.ipv4 {
        if ipv4::Packet::new(&buffer[offset..]).ttl() <= 1 {
            return false;
        }
    }
    true
}

/// Whether the packet is an IPv4 fragment.
pub fn is_fragment(buffer: &[u8], view: &ProtoView) -> bool {
    match view.ipv4 {
        Some(offset) => ipv4::Packet::new(&buffer[offset..]).is_fragment(),
        None => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frame::testing;
    use smoltcp::wire::Ipv4Address;

    #[test]
    fn test_parse_plain_ipv4_tcp() {
        let frame = testing::tcp_frame(64, 10, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
        let handle = Handle::parse(&frame, 1, 0);
        assert!(handle.valid);
        assert_eq!(handle.view.eth, Some(0));
        assert_eq!(handle.view.ipv4, Some(14));
        assert_eq!(handle.view.tcp, Some(34));
        assert_eq!(handle.view.vlan, None);
        assert_eq!(handle.fields.in_port, 1);
        assert_eq!(handle.fields.dl_type, ethertype::IPV4);
        assert_eq!(handle.fields.dl_vlan, VID_NONE);
        assert_eq!(handle.fields.nw_src, Ipv4Address([10, 0, 0, 1]));
        assert_eq!(handle.fields.nw_dst, Ipv4Address([10, 0, 0, 2]));
        assert_eq!(handle.fields.nw_proto, ip_proto::TCP);
        assert_eq!(handle.fields.tp_src, 1234);
        assert_eq!(handle.fields.tp_dst, 80);
    }

    #[test]
    fn test_parse_vlan_tag() {
        let frame = testing::tcp_frame(64, 10, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
        let frame = testing::push_vlan_raw(&frame, 42, 5);
        let handle = Handle::parse(&frame, 1, 0);
        assert_eq!(handle.view.vlan, Some(14));
        assert_eq!(handle.view.vlan_last, Some(14));
        assert_eq!(handle.view.ipv4, Some(18));
        assert_eq!(handle.fields.dl_vlan, 42);
        assert_eq!(handle.fields.dl_vlan_pcp, 5);
        assert_eq!(handle.fields.dl_type, ethertype::IPV4);
    }

    #[test]
    fn test_parse_truncated_frame() {
        let frame = testing::tcp_frame(64, 10, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
        let handle = Handle::parse(&frame[..20], 1, 0);
        assert_eq!(handle.view.eth, Some(0));
        assert_eq!(handle.view.ipv4, None);
        assert_eq!(handle.fields.dl_type, ethertype::IPV4);
        assert_eq!(handle.fields.tp_src, 0);
    }

    #[test]
    fn test_ttl_validity() {
        let frame = testing::tcp_frame(64, 1, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
        let handle = Handle::parse(&frame, 1, 0);
        assert!(!is_ttl_valid(&frame, &handle.view));

        let frame = testing::tcp_frame(64, 64, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
        let handle = Handle::parse(&frame, 1, 0);
        assert!(is_ttl_valid(&frame, &handle.view));
    }

    #[test]
    fn test_parse_ethernet_defaults_metadata() {
        let frame = testing::tcp_frame(64, 10, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
        let handle = Handle::parse(&frame, 3, 0xabcd);
        assert_eq!(handle.fields.metadata, 0xabcd);
    }
}
