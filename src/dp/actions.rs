//! Application of a single action to a packet.
//!
//! Header rewrites keep the IPv4 and TCP/UDP checksums consistent with
//! incremental updates; tag pushes and pops slide the L2 headers through
//! the buffer headroom when possible and invalidate the protocol view.
//! Output, group and set-queue only record their argument on the packet;
//! the pipeline performs the actual dispatch.
//!
//! An action whose required layer is missing is logged and skipped; the
//! packet continues unchanged.

use log::warn;

use crate::csum::{recalc_csum16, recalc_csum32};
use crate::dp::packet::Packet;
use crate::frame::{ethernet, ipv4, mpls, transport, vlan};
use crate::wire::action::Action;
use crate::PortNumber;

/// Execute one action on the packet.
pub fn execute(pkt: &mut Packet, action: &Action) {
    match *action {
        Action::Output { port, max_len } => {
            pkt.out_port = port;
            if PortNumber::from(port) == PortNumber::Controller {
                pkt.out_port_max_len = max_len;
            }
        }
        Action::SetQueue(queue_id) => pkt.out_queue = queue_id,
        Action::Group(group_id) => pkt.out_group = group_id,
        Action::SetVlanVid(vid) => set_vlan_vid(pkt, vid),
        Action::SetVlanPcp(pcp) => set_vlan_pcp(pkt, pcp),
        Action::SetDlSrc(addr) => set_dl_addr(pkt, addr, false),
        Action::SetDlDst(addr) => set_dl_addr(pkt, addr, true),
        Action::SetNwSrc(addr) => set_nw_addr(pkt, addr, false),
        Action::SetNwDst(addr) => set_nw_addr(pkt, addr, true),
        Action::SetNwTos(dscp) => set_nw_tos(pkt, dscp),
        Action::SetNwEcn(ecn) => set_nw_ecn(pkt, ecn),
        Action::SetTpSrc(port) => set_tp_port(pkt, port, false),
        Action::SetTpDst(port) => set_tp_port(pkt, port, true),
        Action::CopyTtlOut => copy_ttl_out(pkt),
        Action::CopyTtlIn => copy_ttl_in(pkt),
        Action::SetMplsLabel(label) => set_mpls_label(pkt, label),
        Action::SetMplsTc(tc) => set_mpls_tc(pkt, tc),
        Action::SetMplsTtl(ttl) => set_mpls_ttl(pkt, ttl),
        Action::DecMplsTtl => dec_mpls_ttl(pkt),
        Action::PushVlan(ethertype) => push_vlan(pkt, ethertype),
        Action::PopVlan => pop_vlan(pkt),
        Action::PushMpls(ethertype) => push_mpls(pkt, ethertype),
        Action::PopMpls(ethertype) => pop_mpls(pkt, ethertype),
        Action::SetNwTtl(ttl) => set_nw_ttl(pkt, ttl),
        Action::DecNwTtl => dec_nw_ttl(pkt),
        Action::Experimenter { experimenter, .. } => {
            warn!("no handler for experimenter action {:#x}", experimenter);
        }
    }
}

fn set_vlan_vid(pkt: &mut Packet, vid: u16) {
    let (buf, handle) = pkt.validated_parts();
    match handle.view.vlan {
        Some(offset) => {
            let mut tag = vlan::Packet::new(&mut buf.bytes_mut()[offset..]);
            tag.set_vid(vid);
            handle.fields.dl_vlan = vid & vlan::VID_MASK;
        }
        None => warn!("SET_VLAN_VID on a packet with no vlan"),
    }
}

fn set_vlan_pcp(pkt: &mut Packet, pcp: u8) {
    let (buf, handle) = pkt.validated_parts();
    match handle.view.vlan {
        Some(offset) => {
            let mut tag = vlan::Packet::new(&mut buf.bytes_mut()[offset..]);
            tag.set_pcp(pcp);
            handle.fields.dl_vlan_pcp = pcp;
        }
        None => warn!("SET_VLAN_PCP on a packet with no vlan"),
    }
}

fn set_dl_addr(pkt: &mut Packet, addr: smoltcp::wire::EthernetAddress, dst: bool) {
    let (buf, handle) = pkt.validated_parts();
    if handle.view.eth.is_none() {
        warn!("SET_DL_{} on a packet with no ethernet", if dst { "DST" } else { "SRC" });
        return;
    }
    let mut eth = ethernet::Packet::new(buf.bytes_mut());
    if dst {
        eth.set_dst(addr);
        handle.fields.dl_dst = addr;
    } else {
        eth.set_src(addr);
        handle.fields.dl_src = addr;
    }
}

fn set_nw_addr(pkt: &mut Packet, addr: smoltcp::wire::Ipv4Address, dst: bool) {
    let (buf, handle) = pkt.validated_parts();
    let ip_offset = match handle.view.ipv4 {
        Some(offset) => offset,
        None => {
            warn!("SET_NW_{} on a packet with no ipv4", if dst { "DST" } else { "SRC" });
            return;
        }
    };
    let old = {
        let ip = ipv4::Packet::new(&buf.bytes()[ip_offset..]);
        if dst { ip.dst() } else { ip.src() }
    };
    let old_word = u32::from_be_bytes([old.as_bytes()[0], old.as_bytes()[1], old.as_bytes()[2], old.as_bytes()[3]]);
    let new_word = u32::from_be_bytes([addr.as_bytes()[0], addr.as_bytes()[1], addr.as_bytes()[2], addr.as_bytes()[3]]);

    // the address is part of the TCP/UDP pseudo header
    if let Some(offset) = handle.view.tcp {
        let mut tcp = transport::Tcp::new(&mut buf.bytes_mut()[offset..]);
        let csum = tcp.csum();
        tcp.set_csum(recalc_csum32(csum, old_word, new_word));
    } else if let Some(offset) = handle.view.udp {
        let mut udp = transport::Udp::new(&mut buf.bytes_mut()[offset..]);
        let csum = udp.csum();
        // a zero UDP checksum means "not computed"
        if csum != 0 {
            udp.set_csum(recalc_csum32(csum, old_word, new_word));
        }
    }

    let mut ip = ipv4::Packet::new(&mut buf.bytes_mut()[ip_offset..]);
    let csum = ip.csum();
    ip.set_csum(recalc_csum32(csum, old_word, new_word));
    if dst {
        ip.set_dst(addr);
        handle.fields.nw_dst = addr;
    } else {
        ip.set_src(addr);
        handle.fields.nw_src = addr;
    }
}

fn set_nw_tos(pkt: &mut Packet, dscp: u8) {
    let (buf, handle) = pkt.validated_parts();
    match handle.view.ipv4 {
        Some(offset) => {
            let mut ip = ipv4::Packet::new(&mut buf.bytes_mut()[offset..]);
            let old = ip.tos();
            let new = (old & ipv4::ECN_MASK) | (dscp << 2);
            // the ToS byte is not part of the TCP pseudo header, only the
            // IPv4 checksum changes
            let csum = ip.csum();
            ip.set_csum(recalc_csum16(csum, u16::from(old), u16::from(new)));
            ip.set_tos(new);
            handle.fields.nw_tos = dscp;
        }
        None => warn!("SET_NW_TOS on a packet with no ipv4"),
    }
}

fn set_nw_ecn(pkt: &mut Packet, ecn: u8) {
    let (buf, handle) = pkt.validated_parts();
    match handle.view.ipv4 {
        Some(offset) => {
            let mut ip = ipv4::Packet::new(&mut buf.bytes_mut()[offset..]);
            let old = ip.tos();
            let new = (old & ipv4::DSCP_MASK) | (ecn & ipv4::ECN_MASK);
            let csum = ip.csum();
            ip.set_csum(recalc_csum16(csum, u16::from(old), u16::from(new)));
            ip.set_tos(new);
        }
        None => warn!("SET_NW_ECN on a packet with no ipv4"),
    }
}

fn set_tp_port(pkt: &mut Packet, port: u16, dst: bool) {
    let (buf, handle) = pkt.validated_parts();
    if let Some(offset) = handle.view.tcp {
        let mut tcp = transport::Tcp::new(&mut buf.bytes_mut()[offset..]);
        let old = if dst { tcp.dst() } else { tcp.src() };
        let csum = tcp.csum();
        tcp.set_csum(recalc_csum16(csum, old, port));
        if dst {
            tcp.set_dst(port);
            handle.fields.tp_dst = port;
        } else {
            tcp.set_src(port);
            handle.fields.tp_src = port;
        }
    } else if let Some(offset) = handle.view.udp {
        let mut udp = transport::Udp::new(&mut buf.bytes_mut()[offset..]);
        let old = if dst { udp.dst() } else { udp.src() };
        let csum = udp.csum();
        if csum != 0 {
            udp.set_csum(recalc_csum16(csum, old, port));
        }
        if dst {
            udp.set_dst(port);
            handle.fields.tp_dst = port;
        } else {
            udp.set_src(port);
            handle.fields.tp_src = port;
        }
    } else {
        warn!("SET_TP_{} on a packet with no tcp/udp", if dst { "DST" } else { "SRC" });
    }
}

fn copy_ttl_out(pkt: &mut Packet) {
    let (buf, handle) = pkt.validated_parts();
    let offset = match handle.view.mpls {
        Some(offset) => offset,
        None => {
            warn!("COPY_TTL_OUT on a packet with no mpls");
            return;
        }
    };
    let outer = mpls::Packet::new(&buf.bytes()[offset..]).fields();
    let inner_ttl = if outer & mpls::S_MASK == 0 {
        // an inner MPLS shim follows
        mpls::Packet::new(&buf.bytes()[offset + mpls::HEADER_LEN..]).ttl()
    } else if buf.len() >= offset + mpls::HEADER_LEN + ipv4::HEADER_LEN {
        // assume an IPv4 header follows, if there is room for one
        ipv4::Packet::new(&buf.bytes()[offset + mpls::HEADER_LEN..]).ttl()
    } else {
        warn!("COPY_TTL_OUT with nothing under the mpls stack");
        return;
    };
    mpls::Packet::new(&mut buf.bytes_mut()[offset..]).set_ttl(inner_ttl);
}

fn copy_ttl_in(pkt: &mut Packet) {
    let (buf, handle) = pkt.validated_parts();
    let offset = match handle.view.mpls {
        Some(offset) => offset,
        None => {
            warn!("COPY_TTL_IN on a packet with no mpls");
            return;
        }
    };
    let outer = mpls::Packet::new(&buf.bytes()[offset..]).fields();
    let outer_ttl = (outer & mpls::TTL_MASK) as u8;
    if outer & mpls::S_MASK == 0 {
        let mut inner = mpls::Packet::new(&mut buf.bytes_mut()[offset + mpls::HEADER_LEN..]);
        inner.set_ttl(outer_ttl);
    } else if buf.len() >= offset + mpls::HEADER_LEN + ipv4::HEADER_LEN {
        let mut ip = ipv4::Packet::new(&mut buf.bytes_mut()[offset + mpls::HEADER_LEN..]);
        let old_word = ip.ttl_proto_word();
        let new_word = u16::from(outer_ttl) << 8 | u16::from(ip.proto());
        let csum = ip.csum();
        ip.set_csum(recalc_csum16(csum, old_word, new_word));
        ip.set_ttl(outer_ttl);
    } else {
        warn!("COPY_TTL_IN with nothing under the mpls stack");
    }
}

fn set_mpls_label(pkt: &mut Packet, label: u32) {
    let (buf, handle) = pkt.validated_parts();
    match handle.view.mpls {
        Some(offset) => {
            mpls::Packet::new(&mut buf.bytes_mut()[offset..]).set_label(label);
            handle.fields.mpls_label = label;
        }
        None => warn!("SET_MPLS_LABEL on a packet with no mpls"),
    }
}

fn set_mpls_tc(pkt: &mut Packet, tc: u8) {
    let (buf, handle) = pkt.validated_parts();
    match handle.view.mpls {
        Some(offset) => {
            mpls::Packet::new(&mut buf.bytes_mut()[offset..]).set_tc(tc);
            handle.fields.mpls_tc = tc;
        }
        None => warn!("SET_MPLS_TC on a packet with no mpls"),
    }
}

fn set_mpls_ttl(pkt: &mut Packet, ttl: u8) {
    let (buf, handle) = pkt.validated_parts();
    match handle.view.mpls {
        Some(offset) => mpls::Packet::new(&mut buf.bytes_mut()[offset..]).set_ttl(ttl),
        None => warn!("SET_MPLS_TTL on a packet with no mpls"),
    }
}

fn dec_mpls_ttl(pkt: &mut Packet) {
    let (buf, handle) = pkt.validated_parts();
    match handle.view.mpls {
        Some(offset) => {
            let mut shim = mpls::Packet::new(&mut buf.bytes_mut()[offset..]);
            let ttl = shim.ttl();
            if ttl > 0 {
                shim.set_ttl(ttl - 1);
            }
        }
        None => warn!("DEC_MPLS_TTL on a packet with no mpls"),
    }
}

fn set_nw_ttl(pkt: &mut Packet, ttl: u8) {
    let (buf, handle) = pkt.validated_parts();
    match handle.view.ipv4 {
        Some(offset) => {
            let mut ip = ipv4::Packet::new(&mut buf.bytes_mut()[offset..]);
            let old_word = ip.ttl_proto_word();
            let new_word = u16::from(ttl) << 8 | u16::from(ip.proto());
            let csum = ip.csum();
            ip.set_csum(recalc_csum16(csum, old_word, new_word));
            ip.set_ttl(ttl);
        }
        None => warn!("SET_NW_TTL on a packet with no ipv4"),
    }
}

fn dec_nw_ttl(pkt: &mut Packet) {
    let (buf, handle) = pkt.validated_parts();
    match handle.view.ipv4 {
        Some(offset) => {
            let mut ip = ipv4::Packet::new(&mut buf.bytes_mut()[offset..]);
            let ttl = ip.ttl();
            if ttl > 0 {
                let old_word = ip.ttl_proto_word();
                let new_word = u16::from(ttl - 1) << 8 | u16::from(ip.proto());
                let csum = ip.csum();
                ip.set_csum(recalc_csum16(csum, old_word, new_word));
                ip.set_ttl(ttl - 1);
            }
        }
        None => warn!("DEC_NW_TTL on a packet with no ipv4"),
    }
}

fn push_vlan(pkt: &mut Packet, ethertype: u16) {
    let (buf, handle) = pkt.validated_parts();
    if handle.view.eth.is_none() {
        warn!("PUSH_VLAN on a packet with no ethernet");
        return;
    }
    let snap = handle.view.snap.is_some();
    let eth_size = if snap {
        ethernet::HEADER_8023_LEN
    } else {
        ethernet::HEADER_LEN
    };

    // values that the move below would make awkward to reach
    let inherited_tci = match handle.view.vlan {
        Some(offset) => vlan::Packet::new(&buf.bytes()[offset..]).tci(),
        None => 0,
    };
    let eth = ethernet::Packet::new(buf.bytes());
    let next_type = if snap { eth.snap_type() } else { eth.ethertype() };

    if buf.headroom() >= vlan::HEADER_LEN {
        // move the L2 header backwards into the headroom
        buf.grow_head(vlan::HEADER_LEN);
        let bytes = buf.bytes_mut();
        bytes.copy_within(vlan::HEADER_LEN..vlan::HEADER_LEN + eth_size, 0);
    } else {
        // no headroom: extend the tail and shift the payload forward
        let old_len = buf.len();
        buf.grow_tail(vlan::HEADER_LEN);
        let bytes = buf.bytes_mut();
        bytes.copy_within(eth_size..old_len, eth_size + vlan::HEADER_LEN);
    }

    let bytes = buf.bytes_mut();
    {
        let mut tag = vlan::Packet::new(&mut bytes[eth_size..]);
        tag.set_tci(inherited_tci);
        tag.set_next_type(next_type);
    }
    let mut eth = ethernet::Packet::new(bytes);
    if snap {
        eth.set_snap_type(ethertype);
        let length = eth.ethertype();
        eth.set_ethertype(length + vlan::HEADER_LEN as u16);
    } else {
        eth.set_ethertype(ethertype);
    }
    handle.valid = false;
}

fn pop_vlan(pkt: &mut Packet) {
    let (buf, handle) = pkt.validated_parts();
    let vlan_offset = match (handle.view.eth, handle.view.vlan) {
        (Some(_), Some(offset)) => offset,
        _ => {
            warn!("POP_VLAN on a packet with no ethernet/vlan");
            return;
        }
    };
    let snap = handle.view.snap.is_some();
    let next_type = vlan::Packet::new(&buf.bytes()[vlan_offset..]).next_type();
    {
        let bytes = buf.bytes_mut();
        let mut eth = ethernet::Packet::new(&mut bytes[..]);
        if snap {
            eth.set_snap_type(next_type);
            let length = eth.ethertype();
            eth.set_ethertype(length - vlan::HEADER_LEN as u16);
        } else {
            eth.set_ethertype(next_type);
        }
        // slide the L2 header forward onto the tag
        bytes.copy_within(0..vlan_offset, vlan::HEADER_LEN);
    }
    buf.shrink_head(vlan::HEADER_LEN);
    handle.valid = false;
}

fn push_mpls(pkt: &mut Packet, ethertype: u16) {
    let (buf, handle) = pkt.validated_parts();
    if handle.view.eth.is_none() {
        warn!("PUSH_MPLS on a packet with no ethernet");
        return;
    }
    let snap = handle.view.snap.is_some();
    let eth_size = if snap {
        ethernet::HEADER_8023_LEN
    } else {
        ethernet::HEADER_LEN
    };
    // the shim goes below every VLAN tag
    let head_size = match handle.view.vlan_last {
        Some(offset) => offset + vlan::HEADER_LEN,
        None => eth_size,
    };

    let old_top = handle
        .view
        .mpls
        .map(|offset| mpls::Packet::new(&buf.bytes()[offset..]).fields());
    let old_ip_ttl = handle
        .view
        .ipv4
        .map(|offset| ipv4::Packet::new(&buf.bytes()[offset..]).ttl());

    if buf.headroom() >= mpls::HEADER_LEN {
        buf.grow_head(mpls::HEADER_LEN);
        let bytes = buf.bytes_mut();
        bytes.copy_within(mpls::HEADER_LEN..mpls::HEADER_LEN + head_size, 0);
    } else {
        let old_len = buf.len();
        buf.grow_tail(mpls::HEADER_LEN);
        let bytes = buf.bytes_mut();
        bytes.copy_within(head_size..old_len, head_size + mpls::HEADER_LEN);
    }

    let bytes = buf.bytes_mut();
    let shim_fields = match (old_top, old_ip_ttl) {
        // copy label/tc/ttl of the previous top; the new shim is not the
        // bottom of the stack
        (Some(fields), _) => fields & !mpls::S_MASK,
        // first shim over IPv4: inherit the IP TTL, set the bottom bit
        (None, Some(ttl)) => u32::from(ttl) | mpls::S_MASK,
        (None, None) => mpls::S_MASK,
    };
    mpls::Packet::new(&mut bytes[head_size..]).set_fields(shim_fields);

    if let Some(offset) = handle.view.vlan_last {
        vlan::Packet::new(&mut bytes[offset..]).set_next_type(ethertype);
    } else if snap {
        let mut eth = ethernet::Packet::new(&mut bytes[..]);
        eth.set_snap_type(ethertype);
    } else {
        let mut eth = ethernet::Packet::new(&mut bytes[..]);
        eth.set_ethertype(ethertype);
    }
    if snap {
        let mut eth = ethernet::Packet::new(&mut bytes[..]);
        let length = eth.ethertype();
        eth.set_ethertype(length + mpls::HEADER_LEN as u16);
    }
    handle.valid = false;
}

fn pop_mpls(pkt: &mut Packet, ethertype: u16) {
    let (buf, handle) = pkt.validated_parts();
    let mpls_offset = match (handle.view.eth, handle.view.mpls) {
        (Some(_), Some(offset)) => offset,
        _ => {
            warn!("POP_MPLS on a packet with no ethernet/mpls");
            return;
        }
    };
    let snap = handle.view.snap.is_some();
    {
        let bytes = buf.bytes_mut();
        if let Some(offset) = handle.view.vlan_last {
            vlan::Packet::new(&mut bytes[offset..]).set_next_type(ethertype);
        } else if snap {
            let mut eth = ethernet::Packet::new(&mut bytes[..]);
            eth.set_snap_type(ethertype);
        } else {
            let mut eth = ethernet::Packet::new(&mut bytes[..]);
            eth.set_ethertype(ethertype);
        }
        if snap {
            let mut eth = ethernet::Packet::new(&mut bytes[..]);
            let length = eth.ethertype();
            eth.set_ethertype(length - mpls::HEADER_LEN as u16);
        }
        bytes.copy_within(0..mpls_offset, mpls::HEADER_LEN);
    }
    buf.shrink_head(mpls::HEADER_LEN);
    handle.valid = false;
}

/// Whether an action list outputs to the given port.
pub fn list_has_out_port(actions: &[Action], port: u32) -> bool {
    actions
        .iter()
        .any(|action| matches!(*action, Action::Output { port: p, .. } if p == port))
}

/// Whether an action list forwards to the given group.
pub fn list_has_out_group(actions: &[Action], group: u32) -> bool {
    actions
        .iter()
        .any(|action| matches!(*action, Action::Group(g) if g == group))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::csum;
    use crate::frame::{ethertype, testing, FrameBuf};
    use crate::match_std::VID_NONE;
    use smoltcp::wire::Ipv4Address;

    fn tcp_packet() -> Packet {
        let frame = testing::tcp_frame(64, 64, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
        Packet::new(FrameBuf::new(&frame), 1)
    }

    fn check_ip_csum(pkt: &mut Packet) {
        let offset = pkt.handle().view.ipv4.unwrap();
        let header = &pkt.buffer.bytes()[offset..offset + 20];
        assert_eq!(csum::checksum(header), 0, "ipv4 checksum inconsistent");
    }

    fn check_tcp_csum(pkt: &mut Packet) {
        let ip_offset = pkt.handle().view.ipv4.unwrap();
        let tcp_offset = pkt.handle().view.tcp.unwrap();
        let bytes = pkt.buffer.bytes();
        let mut src = [0; 4];
        let mut dst = [0; 4];
        src.copy_from_slice(&bytes[ip_offset + 12..ip_offset + 16]);
        dst.copy_from_slice(&bytes[ip_offset + 16..ip_offset + 20]);
        assert_eq!(
            testing::tcp_checksum(&src, &dst, &bytes[tcp_offset..]),
            0,
            "tcp checksum inconsistent"
        );
    }

    #[test]
    fn test_set_nw_dst_updates_checksums() {
        let mut pkt = tcp_packet();
        execute(&mut pkt, &Action::SetNwDst(Ipv4Address([10, 0, 0, 5])));
        assert_eq!(pkt.fields().nw_dst, Ipv4Address([10, 0, 0, 5]));
        check_ip_csum(&mut pkt);
        check_tcp_csum(&mut pkt);
    }

    #[test]
    fn test_set_tp_dst_updates_checksum() {
        let mut pkt = tcp_packet();
        execute(&mut pkt, &Action::SetTpDst(8080));
        assert_eq!(pkt.fields().tp_dst, 8080);
        check_tcp_csum(&mut pkt);
    }

    #[test]
    fn test_dec_nw_ttl() {
        let mut pkt = tcp_packet();
        execute(&mut pkt, &Action::DecNwTtl);
        let offset = pkt.handle().view.ipv4.unwrap();
        assert_eq!(pkt.buffer.bytes()[offset + 8], 63);
        check_ip_csum(&mut pkt);
    }

    #[test]
    fn test_set_nw_tos() {
        let mut pkt = tcp_packet();
        execute(&mut pkt, &Action::SetNwTos(0x2e)); // expedited forwarding
        assert_eq!(pkt.fields().nw_tos, 0x2e);
        let offset = pkt.handle().view.ipv4.unwrap();
        assert_eq!(pkt.buffer.bytes()[offset + 1], 0x2e << 2);
        check_ip_csum(&mut pkt);
    }

    #[test]
    fn test_push_then_pop_vlan() {
        let mut pkt = tcp_packet();
        let original = pkt.buffer.bytes().to_vec();

        execute(&mut pkt, &Action::PushVlan(0x8100));
        execute(&mut pkt, &Action::SetVlanVid(42));
        assert_eq!(pkt.buffer.len(), original.len() + 4);
        assert_eq!(pkt.fields().dl_vlan, 42);
        assert_eq!(pkt.fields().dl_type, ethertype::IPV4);
        let vlan_offset = pkt.handle().view.vlan.unwrap();
        assert_eq!(vlan_offset, 14);
        check_ip_csum(&mut pkt);

        execute(&mut pkt, &Action::PopVlan);
        assert_eq!(pkt.buffer.len(), original.len());
        assert_eq!(pkt.buffer.bytes(), &original[..]);
        assert_eq!(pkt.fields().dl_vlan, VID_NONE);
    }

    #[test]
    fn test_push_vlan_without_headroom() {
        let frame = testing::tcp_frame(64, 64, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
        let mut pkt = Packet::new(FrameBuf::with_headroom(&frame, 0), 1);
        let original = pkt.buffer.bytes().to_vec();
        execute(&mut pkt, &Action::PushVlan(0x8100));
        assert_eq!(pkt.buffer.len(), original.len() + 4);
        assert_eq!(pkt.fields().dl_vlan, 0);
        assert_eq!(pkt.fields().dl_type, ethertype::IPV4);
        execute(&mut pkt, &Action::PopVlan);
        assert_eq!(pkt.buffer.bytes(), &original[..]);
    }

    #[test]
    fn test_push_second_vlan_inherits_tci() {
        let mut pkt = tcp_packet();
        execute(&mut pkt, &Action::PushVlan(0x8100));
        execute(&mut pkt, &Action::SetVlanVid(7));
        execute(&mut pkt, &Action::PushVlan(0x88a8));
        // the new outer tag inherited the vid of the old outer tag
        assert_eq!(pkt.fields().dl_vlan, 7);
        let view = pkt.handle().view.clone();
        assert_eq!(view.vlan, Some(14));
        assert_eq!(view.vlan_last, Some(18));
    }

    #[test]
    fn test_push_mpls_over_ipv4() {
        let mut pkt = tcp_packet();
        execute(&mut pkt, &Action::PushMpls(0x8847));
        assert_eq!(pkt.fields().dl_type, ethertype::MPLS);
        let offset = pkt.handle().view.mpls.unwrap();
        let shim = crate::frame::mpls::Packet::new(&pkt.buffer.bytes()[offset..]);
        assert_eq!(shim.ttl(), 64); // inherited from the IP header
        assert!(shim.s());

        execute(&mut pkt, &Action::SetMplsLabel(0x12345));
        execute(&mut pkt, &Action::DecMplsTtl);
        assert_eq!(pkt.fields().mpls_label, 0x12345);

        execute(&mut pkt, &Action::PopMpls(ethertype::IPV4));
        assert_eq!(pkt.fields().dl_type, ethertype::IPV4);
        assert_eq!(pkt.fields().nw_dst, Ipv4Address([10, 0, 0, 2]));
        check_ip_csum(&mut pkt);
    }

    #[test]
    fn test_push_second_mpls_clears_bottom_bit() {
        let mut pkt = tcp_packet();
        execute(&mut pkt, &Action::PushMpls(0x8847));
        execute(&mut pkt, &Action::PushMpls(0x8847));
        let offset = pkt.handle().view.mpls.unwrap();
        let bytes = pkt.buffer.bytes();
        let outer = crate::frame::mpls::Packet::new(&bytes[offset..]);
        let inner = crate::frame::mpls::Packet::new(&bytes[offset + 4..]);
        assert!(!outer.s());
        assert!(inner.s());
        assert_eq!(outer.ttl(), inner.ttl());
    }

    #[test]
    fn test_copy_ttl_in_mpls_to_ipv4() {
        let mut pkt = tcp_packet();
        execute(&mut pkt, &Action::PushMpls(0x8847));
        execute(&mut pkt, &Action::SetMplsTtl(9));
        execute(&mut pkt, &Action::CopyTtlIn);
        execute(&mut pkt, &Action::PopMpls(ethertype::IPV4));
        let offset = pkt.handle().view.ipv4.unwrap();
        assert_eq!(pkt.buffer.bytes()[offset + 8], 9);
        check_ip_csum(&mut pkt);
    }

    #[test]
    fn test_missing_layer_is_skipped() {
        let mut pkt = tcp_packet();
        let before = pkt.buffer.bytes().to_vec();
        execute(&mut pkt, &Action::SetMplsLabel(1));
        execute(&mut pkt, &Action::SetVlanVid(1));
        execute(&mut pkt, &Action::PopMpls(ethertype::IPV4));
        assert_eq!(pkt.buffer.bytes(), &before[..]);
    }

    #[test]
    fn test_output_records_port() {
        let mut pkt = tcp_packet();
        execute(&mut pkt, &Action::Output { port: 7, max_len: 0 });
        assert_eq!(pkt.out_port, 7);
        execute(
            &mut pkt,
            &Action::Output { port: PortNumber::Controller.into(), max_len: 96 },
        );
        assert_eq!(u32::from(PortNumber::Controller), pkt.out_port);
        assert_eq!(pkt.out_port_max_len, 96);
    }
}
