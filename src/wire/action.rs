//! Types to parse and emit OpenFlow 1.1 action records.
//!
//! Every action starts with the same 4-byte prefix and is padded to a
//! multiple of 8 bytes:
//!
//! ```no_rust
//! +--------+--------+--------+--------+
//! |      type       |     length      |
//! +--------+--------+--------+--------+
//! |     type-specific body, padded    |
//! +--------+--------+--------+--------+
//! ```
//!
//! The `length` field covers the whole record including the prefix.

use byteorder::{ByteOrder, NetworkEndian};
use smoltcp::wire::{EthernetAddress, Ipv4Address};

use crate::error::{BadActionCode, OfpError};
use crate::{Error, GroupNumber, PortNumber, Repr, Result};

use core::fmt;

enum_with_unknown! {
    /// OpenFlow 1.1 action types
    pub doc enum Kind(u16) {
        /// Output to switch port.
        Output = 0,
        /// Set the 802.1q VLAN id.
        SetVlanVid = 1,
        /// Set the 802.1q priority.
        SetVlanPcp = 2,
        /// Set ethernet source address.
        SetDlSrc = 3,
        /// Set ethernet destination address.
        SetDlDst = 4,
        /// Set IP source address.
        SetNwSrc = 5,
        /// Set IP destination address.
        SetNwDst = 6,
        /// Set IP ToS (DSCP field, 6 bits).
        SetNwTos = 7,
        /// Set IP ECN (2 bits).
        SetNwEcn = 8,
        /// Set TCP/UDP/SCTP source port.
        SetTpSrc = 9,
        /// Set TCP/UDP/SCTP destination port.
        SetTpDst = 10,
        /// Copy TTL outwards.
        CopyTtlOut = 11,
        /// Copy TTL inwards.
        CopyTtlIn = 12,
        /// Set MPLS label.
        SetMplsLabel = 13,
        /// Set MPLS traffic class.
        SetMplsTc = 14,
        /// Set MPLS TTL.
        SetMplsTtl = 15,
        /// Decrement MPLS TTL.
        DecMplsTtl = 16,
        /// Push a new VLAN tag.
        PushVlan = 17,
        /// Pop the outer VLAN tag.
        PopVlan = 18,
        /// Push a new MPLS shim.
        PushMpls = 19,
        /// Pop the outer MPLS shim.
        PopMpls = 20,
        /// Set queue id when outputting to a port.
        SetQueue = 21,
        /// Apply group.
        Group = 22,
        /// Set IP TTL.
        SetNwTtl = 23,
        /// Decrement IP TTL.
        DecNwTtl = 24,
        /// Experimenter action.
        Experimenter = 0xffff
    }
}

/// A wrapper around the common prefix of an action record.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

mod field {
    use crate::field::*;

    pub const KIND: Field = 0..2;
    pub const LENGTH: Field = 2..4;
    pub const BODY: Rest = 4..;
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

    /// Validate the length field: at least a prefix, 8-byte aligned, and
    /// no longer than the buffer.
    pub fn check_len(&self) -> Result<()> {
        let len = self.buffer.as_ref().len();
        if len < field::LENGTH.end {
            return Err(bad_len());
        }
        let declared = self.length() as usize;
        if declared < 8 || declared % 8 != 0 || declared > len {
            return Err(bad_len());
        }
        Ok(())
    }

    /// Return the type field.
    #[inline]
    pub fn kind(&self) -> Kind {
        let data = self.buffer.as_ref();
        Kind::from(NetworkEndian::read_u16(&data[field::KIND]))
    }

    /// Return the length field.
    #[inline]
    pub fn length(&self) -> u16 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u16(&data[field::LENGTH])
    }

    /// Return the type-specific body, up to the declared length.
    pub fn body(&self) -> &[u8] {
        let data = self.buffer.as_ref();
        &data[field::BODY.start..self.length() as usize]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    #[inline]
    pub fn set_kind(&mut self, value: Kind) {
        let data = self.buffer.as_mut();
        NetworkEndian::write_u16(&mut data[field::KIND], value.into())
    }

    #[inline]
    pub fn set_length(&mut self, value: u16) {
        let data = self.buffer.as_mut();
        NetworkEndian::write_u16(&mut data[field::LENGTH], value)
    }

    pub fn body_mut(&mut self) -> &mut [u8] {
        let len = self.length() as usize;
        let data = self.buffer.as_mut();
        &mut data[field::BODY.start..len]
    }
}

fn bad_len() -> Error {
    OfpError::BadAction(BadActionCode::BadLen).into()
}

fn bad_argument() -> Error {
    OfpError::BadAction(BadActionCode::BadArgument).into()
}

/// An OpenFlow 1.1 action.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Action {
    /// Send the packet out a port. `max_len` limits the bytes sent to the
    /// controller when the port is [`PortNumber::Controller`].
    Output { port: u32, max_len: u16 },
    SetVlanVid(u16),
    SetVlanPcp(u8),
    SetDlSrc(EthernetAddress),
    SetDlDst(EthernetAddress),
    SetNwSrc(Ipv4Address),
    SetNwDst(Ipv4Address),
    /// The 6-bit DSCP value.
    SetNwTos(u8),
    SetNwEcn(u8),
    SetTpSrc(u16),
    SetTpDst(u16),
    CopyTtlOut,
    CopyTtlIn,
    SetMplsLabel(u32),
    SetMplsTc(u8),
    SetMplsTtl(u8),
    DecMplsTtl,
    /// Push a VLAN tag with the given ethertype (0x8100 or 0x88a8).
    PushVlan(u16),
    PopVlan,
    /// Push an MPLS shim with the given ethertype (0x8847 or 0x8848).
    PushMpls(u16),
    /// Pop the outer MPLS shim; the ethertype of what is underneath.
    PopMpls(u16),
    SetQueue(u32),
    Group(u32),
    SetNwTtl(u8),
    DecNwTtl,
    Experimenter { experimenter: u32, data: Vec<u8> },
}

impl Action {
    pub fn kind(&self) -> Kind {
        match *self {
            Action::Output { .. } => Kind::Output,
            Action::SetVlanVid(_) => Kind::SetVlanVid,
            Action::SetVlanPcp(_) => Kind::SetVlanPcp,
            Action::SetDlSrc(_) => Kind::SetDlSrc,
            Action::SetDlDst(_) => Kind::SetDlDst,
            Action::SetNwSrc(_) => Kind::SetNwSrc,
            Action::SetNwDst(_) => Kind::SetNwDst,
            Action::SetNwTos(_) => Kind::SetNwTos,
            Action::SetNwEcn(_) => Kind::SetNwEcn,
            Action::SetTpSrc(_) => Kind::SetTpSrc,
            Action::SetTpDst(_) => Kind::SetTpDst,
            Action::CopyTtlOut => Kind::CopyTtlOut,
            Action::CopyTtlIn => Kind::CopyTtlIn,
            Action::SetMplsLabel(_) => Kind::SetMplsLabel,
            Action::SetMplsTc(_) => Kind::SetMplsTc,
            Action::SetMplsTtl(_) => Kind::SetMplsTtl,
            Action::DecMplsTtl => Kind::DecMplsTtl,
            Action::PushVlan(_) => Kind::PushVlan,
            Action::PopVlan => Kind::PopVlan,
            Action::PushMpls(_) => Kind::PushMpls,
            Action::PopMpls(_) => Kind::PopMpls,
            Action::SetQueue(_) => Kind::SetQueue,
            Action::Group(_) => Kind::Group,
            Action::SetNwTtl(_) => Kind::SetNwTtl,
            Action::DecNwTtl => Kind::DecNwTtl,
            Action::Experimenter { .. } => Kind::Experimenter,
        }
    }
}

impl Repr for Action {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let packet = Packet::new_checked(buffer)?;
        let len = packet.length() as usize;
        let body = packet.body();

        let expect = |wire_len: usize| if len == wire_len { Ok(()) } else { Err(bad_len()) };

        let action = match packet.kind() {
            Kind::Output => {
                expect(16)?;
                let port = NetworkEndian::read_u32(&body[0..4]);
                if !PortNumber::from(port).is_valid_output() {
                    return Err(OfpError::BadAction(BadActionCode::BadOutPort).into());
                }
                Action::Output {
                    port,
                    max_len: NetworkEndian::read_u16(&body[4..6]),
                }
            }
            Kind::SetVlanVid => {
                expect(8)?;
                let vid = NetworkEndian::read_u16(&body[0..2]);
                if vid > 0xfff {
                    return Err(bad_argument());
                }
                Action::SetVlanVid(vid)
            }
            Kind::SetVlanPcp => {
                expect(8)?;
                if body[0] > 7 {
                    return Err(bad_argument());
                }
                Action::SetVlanPcp(body[0])
            }
            Kind::SetDlSrc => {
                expect(16)?;
                Action::SetDlSrc(EthernetAddress::from_bytes(&body[0..6]))
            }
            Kind::SetDlDst => {
                expect(16)?;
                Action::SetDlDst(EthernetAddress::from_bytes(&body[0..6]))
            }
            Kind::SetNwSrc => {
                expect(8)?;
                Action::SetNwSrc(Ipv4Address::from_bytes(&body[0..4]))
            }
            Kind::SetNwDst => {
                expect(8)?;
                Action::SetNwDst(Ipv4Address::from_bytes(&body[0..4]))
            }
            Kind::SetNwTos => {
                expect(8)?;
                if body[0] > 0x3f {
                    return Err(bad_argument());
                }
                Action::SetNwTos(body[0])
            }
            Kind::SetNwEcn => {
                expect(8)?;
                if body[0] > 3 {
                    return Err(bad_argument());
                }
                Action::SetNwEcn(body[0])
            }
            Kind::SetTpSrc => {
                expect(8)?;
                Action::SetTpSrc(NetworkEndian::read_u16(&body[0..2]))
            }
            Kind::SetTpDst => {
                expect(8)?;
                Action::SetTpDst(NetworkEndian::read_u16(&body[0..2]))
            }
            Kind::CopyTtlOut => {
                expect(8)?;
                Action::CopyTtlOut
            }
            Kind::CopyTtlIn => {
                expect(8)?;
                Action::CopyTtlIn
            }
            Kind::SetMplsLabel => {
                expect(8)?;
                let label = NetworkEndian::read_u32(&body[0..4]);
                if label > 0xf_ffff {
                    return Err(bad_argument());
                }
                Action::SetMplsLabel(label)
            }
            Kind::SetMplsTc => {
                expect(8)?;
                if body[0] > 7 {
                    return Err(bad_argument());
                }
                Action::SetMplsTc(body[0])
            }
            Kind::SetMplsTtl => {
                expect(8)?;
                Action::SetMplsTtl(body[0])
            }
            Kind::DecMplsTtl => {
                expect(8)?;
                Action::DecMplsTtl
            }
            Kind::PushVlan => {
                expect(8)?;
                let ethertype = NetworkEndian::read_u16(&body[0..2]);
                if ethertype != 0x8100 && ethertype != 0x88a8 {
                    return Err(bad_argument());
                }
                Action::PushVlan(ethertype)
            }
            Kind::PopVlan => {
                expect(8)?;
                Action::PopVlan
            }
            Kind::PushMpls => {
                expect(8)?;
                let ethertype = NetworkEndian::read_u16(&body[0..2]);
                if ethertype != 0x8847 && ethertype != 0x8848 {
                    return Err(bad_argument());
                }
                Action::PushMpls(ethertype)
            }
            Kind::PopMpls => {
                expect(8)?;
                Action::PopMpls(NetworkEndian::read_u16(&body[0..2]))
            }
            Kind::SetQueue => {
                expect(8)?;
                Action::SetQueue(NetworkEndian::read_u32(&body[0..4]))
            }
            Kind::Group => {
                expect(8)?;
                let group_id = NetworkEndian::read_u32(&body[0..4]);
                if group_id > GroupNumber::MAX {
                    return Err(bad_argument());
                }
                Action::Group(group_id)
            }
            Kind::SetNwTtl => {
                expect(8)?;
                Action::SetNwTtl(body[0])
            }
            Kind::DecNwTtl => {
                expect(8)?;
                Action::DecNwTtl
            }
            Kind::Experimenter => Action::Experimenter {
                experimenter: NetworkEndian::read_u32(&body[0..4]),
                data: body[4..].to_vec(),
            },
            Kind::_Unknown(_) => {
                return Err(OfpError::BadAction(BadActionCode::BadType).into());
            }
        };
        Ok(action)
    }

    fn buffer_len(&self) -> usize {
        match *self {
            Action::Output { .. } | Action::SetDlSrc(_) | Action::SetDlDst(_) => 16,
            Action::Experimenter { ref data, .. } => (8 + data.len() + 7) / 8 * 8,
            _ => 8,
        }
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        let len = self.buffer_len();
        let mut packet = Packet::new(buffer);
        packet.set_kind(self.kind());
        packet.set_length(len as u16);
        let body = packet.body_mut();
        for byte in body.iter_mut() {
            *byte = 0;
        }
        match *self {
            Action::Output { port, max_len } => {
                NetworkEndian::write_u32(&mut body[0..4], port);
                NetworkEndian::write_u16(&mut body[4..6], max_len);
            }
            Action::SetVlanVid(vid) => NetworkEndian::write_u16(&mut body[0..2], vid),
            Action::SetVlanPcp(pcp) => body[0] = pcp,
            Action::SetDlSrc(addr) | Action::SetDlDst(addr) => {
                body[0..6].copy_from_slice(addr.as_bytes())
            }
            Action::SetNwSrc(addr) | Action::SetNwDst(addr) => {
                body[0..4].copy_from_slice(addr.as_bytes())
            }
            Action::SetNwTos(tos) => body[0] = tos,
            Action::SetNwEcn(ecn) => body[0] = ecn,
            Action::SetTpSrc(port) | Action::SetTpDst(port) => {
                NetworkEndian::write_u16(&mut body[0..2], port)
            }
            Action::CopyTtlOut | Action::CopyTtlIn => {}
            Action::SetMplsLabel(label) => NetworkEndian::write_u32(&mut body[0..4], label),
            Action::SetMplsTc(tc) => body[0] = tc,
            Action::SetMplsTtl(ttl) => body[0] = ttl,
            Action::DecMplsTtl => {}
            Action::PushVlan(ethertype) | Action::PushMpls(ethertype) | Action::PopMpls(ethertype) => {
                NetworkEndian::write_u16(&mut body[0..2], ethertype)
            }
            Action::PopVlan => {}
            Action::SetQueue(queue_id) => NetworkEndian::write_u32(&mut body[0..4], queue_id),
            Action::Group(group_id) => NetworkEndian::write_u32(&mut body[0..4], group_id),
            Action::SetNwTtl(ttl) => body[0] = ttl,
            Action::DecNwTtl => {}
            Action::Experimenter { experimenter, ref data } => {
                NetworkEndian::write_u32(&mut body[0..4], experimenter);
                body[4..4 + data.len()].copy_from_slice(data);
            }
        }
        Ok(())
    }
}

/// Parse a whole buffer of consecutive action records.
pub fn parse_list(buffer: &[u8]) -> Result<Vec<Action>> {
    let mut actions = Vec::new();
    let mut offset = 0;
    while offset < buffer.len() {
        let action = Action::parse(&buffer[offset..])?;
        offset += action.buffer_len();
        actions.push(action);
    }
    Ok(actions)
}

/// Return the emitted length of a list of actions.
pub fn list_len(actions: &[Action]) -> usize {
    actions.iter().map(Repr::buffer_len).sum()
}

/// Emit consecutive action records into a buffer.
pub fn emit_list(actions: &[Action], buffer: &mut [u8]) -> Result<()> {
    let mut offset = 0;
    for action in actions {
        action.emit(&mut buffer[offset..])?;
        offset += action.buffer_len();
    }
    Ok(())
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Action::Output { port, .. } => write!(f, "output:{}", PortNumber::from(port)),
            Action::SetVlanVid(vid) => write!(f, "set_vlan_vid:{}", vid),
            Action::SetVlanPcp(pcp) => write!(f, "set_vlan_pcp:{}", pcp),
            Action::SetDlSrc(addr) => write!(f, "set_dl_src:{}", addr),
            Action::SetDlDst(addr) => write!(f, "set_dl_dst:{}", addr),
            Action::SetNwSrc(addr) => write!(f, "set_nw_src:{}", addr),
            Action::SetNwDst(addr) => write!(f, "set_nw_dst:{}", addr),
            Action::SetNwTos(tos) => write!(f, "set_nw_tos:{}", tos),
            Action::SetNwEcn(ecn) => write!(f, "set_nw_ecn:{}", ecn),
            Action::SetTpSrc(port) => write!(f, "set_tp_src:{}", port),
            Action::SetTpDst(port) => write!(f, "set_tp_dst:{}", port),
            Action::CopyTtlOut => write!(f, "copy_ttl_out"),
            Action::CopyTtlIn => write!(f, "copy_ttl_in"),
            Action::SetMplsLabel(label) => write!(f, "set_mpls_label:{}", label),
            Action::SetMplsTc(tc) => write!(f, "set_mpls_tc:{}", tc),
            Action::SetMplsTtl(ttl) => write!(f, "set_mpls_ttl:{}", ttl),
            Action::DecMplsTtl => write!(f, "dec_mpls_ttl"),
            Action::PushVlan(ethertype) => write!(f, "push_vlan:{:#06x}", ethertype),
            Action::PopVlan => write!(f, "pop_vlan"),
            Action::PushMpls(ethertype) => write!(f, "push_mpls:{:#06x}", ethertype),
            Action::PopMpls(ethertype) => write!(f, "pop_mpls:{:#06x}", ethertype),
            Action::SetQueue(queue_id) => write!(f, "set_queue:{}", queue_id),
            Action::Group(group_id) => write!(f, "group:{}", group_id),
            Action::SetNwTtl(ttl) => write!(f, "set_nw_ttl:{}", ttl),
            Action::DecNwTtl => write!(f, "dec_nw_ttl"),
            Action::Experimenter { experimenter, .. } => write!(f, "experimenter:{:#x}", experimenter),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::BadActionCode;

    #[rustfmt::skip]
    static OUTPUT_BYTES: [u8; 16] = [
        0x00, 0x00,             // type = output
        0x00, 0x10,             // length = 16
        0x00, 0x00, 0x00, 0x02, // port = 2
        0x00, 0x40,             // max_len = 64
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    #[test]
    fn test_parse_output() {
        let action = Action::parse(&OUTPUT_BYTES).unwrap();
        assert_eq!(action, Action::Output { port: 2, max_len: 64 });
    }

    #[test]
    fn test_emit_output() {
        let action = Action::Output { port: 2, max_len: 64 };
        assert_eq!(action.buffer_len(), 16);
        let mut bytes = [0xff; 16];
        action.emit(&mut bytes).unwrap();
        assert_eq!(&bytes[..], &OUTPUT_BYTES[..]);
    }

    #[test]
    fn test_output_to_any_is_rejected() {
        let mut bytes = OUTPUT_BYTES;
        bytes[4..8].copy_from_slice(&[0xff; 4]);
        assert_eq!(
            Action::parse(&bytes),
            Err(OfpError::BadAction(BadActionCode::BadOutPort).into())
        );
        bytes[4..8].copy_from_slice(&[0x00; 4]);
        assert_eq!(
            Action::parse(&bytes),
            Err(OfpError::BadAction(BadActionCode::BadOutPort).into())
        );
    }

    #[test]
    fn test_bad_lengths() {
        let mut bytes = OUTPUT_BYTES;
        // not a multiple of 8
        bytes[2..4].copy_from_slice(&[0x00, 0x0c]);
        assert_eq!(Action::parse(&bytes), Err(bad_len()));
        // longer than the buffer
        bytes[2..4].copy_from_slice(&[0x00, 0x18]);
        assert_eq!(Action::parse(&bytes), Err(bad_len()));
        // wrong canonical size for the type
        bytes[2..4].copy_from_slice(&[0x00, 0x08]);
        assert_eq!(Action::parse(&bytes[..8]), Err(bad_len()));
    }

    #[test]
    fn test_argument_ranges() {
        let cases: &[(Action, bool)] = &[
            (Action::SetVlanVid(0xfff), true),
            (Action::SetVlanPcp(7), true),
            (Action::SetNwTos(0x3f), true),
            (Action::SetNwEcn(3), true),
            (Action::SetMplsLabel(0xf_ffff), true),
            (Action::SetMplsTc(7), true),
            (Action::PushVlan(0x88a8), true),
            (Action::PushMpls(0x8848), true),
            (Action::Group(GroupNumber::MAX), true),
        ];
        for (action, ok) in cases {
            let mut bytes = vec![0; action.buffer_len()];
            action.emit(&mut bytes).unwrap();
            assert_eq!(Action::parse(&bytes).is_ok(), *ok, "{}", action);
        }

        // out-of-range values are caught on parse
        let bad: &[Action] = &[
            Action::SetVlanVid(0x1000),
            Action::SetVlanPcp(8),
            Action::SetNwTos(0x40),
            Action::SetNwEcn(4),
            Action::SetMplsLabel(0x10_0000),
            Action::SetMplsTc(8),
            Action::PushVlan(0x0800),
            Action::PushMpls(0x8100),
            Action::Group(GroupNumber::MAX + 1),
        ];
        for action in bad {
            let mut bytes = vec![0; action.buffer_len()];
            action.emit(&mut bytes).unwrap();
            assert_eq!(Action::parse(&bytes), Err(bad_argument()), "{}", action);
        }
    }

    #[test]
    fn test_list_round_trip() {
        let actions = vec![
            Action::SetNwDst(Ipv4Address([10, 0, 0, 5])),
            Action::PushVlan(0x8100),
            Action::SetVlanVid(42),
            Action::Output { port: 4, max_len: 0 },
        ];
        let mut bytes = vec![0; list_len(&actions)];
        emit_list(&actions, &mut bytes).unwrap();
        assert_eq!(parse_list(&bytes).unwrap(), actions);
    }

    #[test]
    fn test_experimenter_round_trip() {
        let action = Action::Experimenter {
            experimenter: 0x00ff_00ff,
            data: vec![1, 2, 3, 4, 5, 6, 7, 8],
        };
        assert_eq!(action.buffer_len(), 16);
        let mut bytes = vec![0; 16];
        action.emit(&mut bytes).unwrap();
        assert_eq!(Action::parse(&bytes).unwrap(), action);
    }
}
