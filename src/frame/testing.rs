//! Frame construction helpers, used by the test suites to synthesize
//! well-formed input packets.

use byteorder::{ByteOrder, NetworkEndian};

use crate::csum;
use crate::frame::{ethernet, ethertype, ip_proto, vlan};

/// Build an Ethernet II / IPv4 / TCP frame of `total_len` bytes with the
/// given TTL, addresses and ports. Checksums are valid.
pub fn tcp_frame(
    total_len: usize,
    ttl: u8,
    src: [u8; 4],
    dst: [u8; 4],
    tp_src: u16,
    tp_dst: u16,
) -> Vec<u8> {
    assert!(total_len >= 54, "too short for eth + ipv4 + tcp");
    let mut frame = vec![0u8; total_len];

    frame[0..6].copy_from_slice(&[0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    frame[6..12].copy_from_slice(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05]);
    NetworkEndian::write_u16(&mut frame[12..14], ethertype::IPV4);

    let ip_len = total_len - ethernet::HEADER_LEN;
    {
        let ip = &mut frame[14..];
        ip[0] = 0x45;
        NetworkEndian::write_u16(&mut ip[2..4], ip_len as u16);
        ip[8] = ttl;
        ip[9] = ip_proto::TCP;
        ip[12..16].copy_from_slice(&src);
        ip[16..20].copy_from_slice(&dst);
        let ip_csum = csum::checksum(&ip[..20]);
        NetworkEndian::write_u16(&mut ip[10..12], ip_csum);
    }

    {
        let tcp_len = ip_len - 20;
        let tcp = &mut frame[34..];
        NetworkEndian::write_u16(&mut tcp[0..2], tp_src);
        NetworkEndian::write_u16(&mut tcp[2..4], tp_dst);
        tcp[12] = 5 << 4; // data offset
        tcp[13] = 0x02; // SYN
        let tcp_csum = tcp_checksum(&src, &dst, &tcp[..tcp_len]);
        NetworkEndian::write_u16(&mut tcp[16..18], tcp_csum);
    }

    frame
}

/// Build an Ethernet II / IPv4 / UDP frame with valid checksums.
pub fn udp_frame(total_len: usize, src: [u8; 4], dst: [u8; 4], tp_src: u16, tp_dst: u16) -> Vec<u8> {
    assert!(total_len >= 42, "too short for eth + ipv4 + udp");
    let mut frame = vec![0u8; total_len];

    frame[0..6].copy_from_slice(&[0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    frame[6..12].copy_from_slice(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05]);
    NetworkEndian::write_u16(&mut frame[12..14], ethertype::IPV4);

    let ip_len = total_len - ethernet::HEADER_LEN;
    {
        let ip = &mut frame[14..];
        ip[0] = 0x45;
        NetworkEndian::write_u16(&mut ip[2..4], ip_len as u16);
        ip[8] = 64;
        ip[9] = ip_proto::UDP;
        ip[12..16].copy_from_slice(&src);
        ip[16..20].copy_from_slice(&dst);
        let ip_csum = csum::checksum(&ip[..20]);
        NetworkEndian::write_u16(&mut ip[10..12], ip_csum);
    }

    {
        let udp_len = ip_len - 20;
        let udp = &mut frame[34..];
        NetworkEndian::write_u16(&mut udp[0..2], tp_src);
        NetworkEndian::write_u16(&mut udp[2..4], tp_dst);
        NetworkEndian::write_u16(&mut udp[4..6], udp_len as u16);
        let udp_csum = udp_checksum(&src, &dst, &udp[..udp_len]);
        NetworkEndian::write_u16(&mut udp[6..8], udp_csum);
    }

    frame
}

/// Insert a VLAN tag after the Ethernet header of a frame built by the
/// helpers above. This edits the raw bytes, independent of the datapath
/// push action under test.
pub fn push_vlan_raw(frame: &[u8], vid: u16, pcp: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.len() + vlan::HEADER_LEN);
    out.extend_from_slice(&frame[..12]);
    out.extend_from_slice(&ethertype::VLAN.to_be_bytes());
    out.extend_from_slice(&((u16::from(pcp) << vlan::PCP_SHIFT) | vid).to_be_bytes());
    out.extend_from_slice(&frame[12..14]);
    out.extend_from_slice(&frame[14..]);
    out
}

/// Compute a TCP checksum over the IPv4 pseudo header and segment.
pub fn tcp_checksum(src: &[u8; 4], dst: &[u8; 4], segment: &[u8]) -> u16 {
    pseudo_checksum(src, dst, ip_proto::TCP, segment)
}

/// Compute a UDP checksum over the IPv4 pseudo header and datagram.
pub fn udp_checksum(src: &[u8; 4], dst: &[u8; 4], datagram: &[u8]) -> u16 {
    pseudo_checksum(src, dst, ip_proto::UDP, datagram)
}

fn pseudo_checksum(src: &[u8; 4], dst: &[u8; 4], proto: u8, payload: &[u8]) -> u16 {
    let mut data = Vec::with_capacity(12 + payload.len());
    data.extend_from_slice(src);
    data.extend_from_slice(dst);
    data.push(0);
    data.push(proto);
    data.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    data.extend_from_slice(payload);
    csum::checksum(&data)
}
