//! The OpenFlow 1.1 wire codec.
//!
//! Every message starts with the same 8-byte header:
//!
//! ```no_rust
//! +--------+--------+--------+--------+
//! |version |  type  |     length      |
//! +--------+--------+--------+--------+
//! |                xid                |
//! +--------+--------+--------+--------+
//! ```
//!
//! - The version field is always 0x02 for this protocol revision.
//! - The length field gives the total message length, header included.
//! - The xid, or transaction identifier, matches requests to replies.
//!
//! [`Message::from_bytes`] and [`Message::to_bytes`] are the entry
//! points; the per-message modules hold the body codecs.

use byteorder::{ByteOrder, NetworkEndian};
use log::warn;

pub mod action;
pub mod error_msg;
pub mod features;
pub mod flow_match;
pub mod flow_mod;
pub mod flow_removed;
pub mod group_mod;
pub mod instruction;
pub mod packet_in;
pub mod packet_out;
pub mod port_desc;
pub mod port_mod;
pub mod port_status;
pub mod queue;
pub mod stats;
pub mod switch_config;
pub mod table_mod;

pub use self::action::Action;
pub use self::error_msg::ErrorMsg;
pub use self::features::FeaturesReply;
pub use self::flow_mod::FlowMod;
pub use self::flow_removed::FlowRemoved;
pub use self::group_mod::{Bucket, GroupMod};
pub use self::instruction::Instruction;
pub use self::packet_in::PacketIn;
pub use self::packet_out::PacketOut;
pub use self::port_desc::PortDesc;
pub use self::port_mod::PortMod;
pub use self::port_status::PortStatus;
pub use self::queue::{QueueGetConfigReply, QueueGetConfigRequest};
pub use self::stats::{StatsReply, StatsRequest};
pub use self::switch_config::SwitchConfig;
pub use self::table_mod::TableMod;

use crate::error::{BadRequestCode, HelloFailedCode, OfpError};
use crate::{Error, Repr, Result};

/// The protocol version implemented by this crate.
pub const VERSION: u8 = 0x02;

/// Length of the common message header.
pub const HEADER_LEN: usize = 8;

/// The buffer-id meaning "packet not buffered".
pub const NO_BUFFER: u32 = 0xffff_ffff;

pub(crate) fn bad_len() -> Error {
    OfpError::BadRequest(BadRequestCode::BadLen).into()
}

enum_with_unknown! {
    /// OpenFlow 1.1 message types
    pub doc enum Kind(u8) {
        ///
        Hello = 0,
        ///
        Error = 1,
        ///
        EchoRequest = 2,
        ///
        EchoReply = 3,
        ///
        Experimenter = 4,

        ///
        FeaturesRequest = 5,
        ///
        FeaturesReply = 6,
        ///
        GetConfigRequest = 7,
        ///
        GetConfigReply = 8,
        ///
        SetConfig = 9,

        ///
        PacketIn = 10,
        ///
        FlowRemoved = 11,
        ///
        PortStatus = 12,

        ///
        PacketOut = 13,
        ///
        FlowMod = 14,
        ///
        GroupMod = 15,
        ///
        PortMod = 16,
        ///
        TableMod = 17,

        ///
        StatsRequest = 18,
        ///
        StatsReply = 19,

        ///
        BarrierRequest = 20,
        ///
        BarrierReply = 21,

        ///
        QueueGetConfigRequest = 22,
        ///
        QueueGetConfigReply = 23
    }
}

/// A wrapper around a buffer holding an OpenFlow message. `Packet`
/// provides getters and setters for the header fields.
#[derive(Debug)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

mod field {
    use crate::field::*;

    pub const VERSION: usize = 0;
    pub const KIND: usize = 1;
    pub const LENGTH: Field = 2..4;
    pub const XID: Field = 4..8;
}

impl<T: AsRef<[u8]>> Packet<T> {
    /// Imbue a raw octet buffer with OpenFlow message structure.
    pub fn new(buffer: T) -> Packet<T> {
        Packet { buffer }
    }

    /// Shorthand for a combination of [new] and [check_len].
    ///
    /// [new]: #method.new
    /// [check_len]: #method.check_len
    pub fn new_checked(buffer: T) -> Result<Packet<T>> {
        let packet = Self::new(buffer);
        packet.check_len()?;
        Ok(packet)
    }

    /// Ensure that no accessor method will panic if called.
    pub fn check_len(&self) -> Result<()> {
        if self.buffer.as_ref().len() < HEADER_LEN {
            Err(bad_len())
        } else {
            Ok(())
        }
    }

    /// Consume the packet, returning the underlying buffer.
    pub fn into_inner(self) -> T {
        self.buffer
    }

    /// Return the version field.
    #[inline]
    pub fn version(&self) -> u8 {
        self.buffer.as_ref()[field::VERSION]
    }

    /// Return the type field.
    #[inline]
    pub fn kind(&self) -> Kind {
        Kind::from(self.buffer.as_ref()[field::KIND])
    }

    /// Return the length field, covering the whole message.
    #[inline]
    pub fn length(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::LENGTH])
    }

    /// Return the xid field.
    #[inline]
    pub fn xid(&self) -> u32 {
        NetworkEndian::read_u32(&self.buffer.as_ref()[field::XID])
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> Packet<&'a T> {
    /// Return a pointer to the payload, bounded by the length field.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        let data = self.buffer.as_ref();
        &data[HEADER_LEN..self.length() as usize]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    /// Set the version field.
    #[inline]
    pub fn set_version(&mut self, value: u8) {
        self.buffer.as_mut()[field::VERSION] = value
    }

    /// Set the type field.
    #[inline]
    pub fn set_kind(&mut self, value: Kind) {
        self.buffer.as_mut()[field::KIND] = value.into()
    }

    /// Set the length field.
    #[inline]
    pub fn set_length(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[field::LENGTH], value)
    }

    /// Set the xid field.
    #[inline]
    pub fn set_xid(&mut self, value: u32) {
        NetworkEndian::write_u32(&mut self.buffer.as_mut()[field::XID], value)
    }

    /// Return a mutable pointer to the payload.
    #[inline]
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let range = HEADER_LEN..self.length() as usize;
        &mut self.buffer.as_mut()[range]
    }
}

/// An experimenter message payload, opaque to the codec.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ExperimenterMsg {
    pub experimenter: u32,
    pub data: Vec<u8>,
}

impl Repr for ExperimenterMsg {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < 4 {
            return Err(bad_len());
        }
        Ok(ExperimenterMsg {
            experimenter: NetworkEndian::read_u32(&buffer[0..4]),
            data: buffer[4..].to_vec(),
        })
    }

    fn buffer_len(&self) -> usize {
        4 + self.data.len()
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u32(&mut buffer[0..4], self.experimenter);
        buffer[4..4 + self.data.len()].copy_from_slice(&self.data);
        Ok(())
    }
}

/// The body of an OpenFlow 1.1 message.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Body {
    Hello,
    Error(ErrorMsg),
    EchoRequest(Vec<u8>),
    EchoReply(Vec<u8>),
    Experimenter(ExperimenterMsg),
    FeaturesRequest,
    FeaturesReply(FeaturesReply),
    GetConfigRequest,
    GetConfigReply(SwitchConfig),
    SetConfig(SwitchConfig),
    PacketIn(PacketIn),
    FlowRemoved(FlowRemoved),
    PortStatus(PortStatus),
    PacketOut(PacketOut),
    FlowMod(FlowMod),
    GroupMod(GroupMod),
    PortMod(PortMod),
    TableMod(TableMod),
    StatsRequest(StatsRequest),
    StatsReply(StatsReply),
    BarrierRequest,
    BarrierReply,
    QueueGetConfigRequest(QueueGetConfigRequest),
    QueueGetConfigReply(QueueGetConfigReply),
}

impl Body {
    pub fn kind(&self) -> Kind {
        match *self {
            Body::Hello => Kind::Hello,
            Body::Error(_) => Kind::Error,
            Body::EchoRequest(_) => Kind::EchoRequest,
            Body::EchoReply(_) => Kind::EchoReply,
            Body::Experimenter(_) => Kind::Experimenter,
            Body::FeaturesRequest => Kind::FeaturesRequest,
            Body::FeaturesReply(_) => Kind::FeaturesReply,
            Body::GetConfigRequest => Kind::GetConfigRequest,
            Body::GetConfigReply(_) => Kind::GetConfigReply,
            Body::SetConfig(_) => Kind::SetConfig,
            Body::PacketIn(_) => Kind::PacketIn,
            Body::FlowRemoved(_) => Kind::FlowRemoved,
            Body::PortStatus(_) => Kind::PortStatus,
            Body::PacketOut(_) => Kind::PacketOut,
            Body::FlowMod(_) => Kind::FlowMod,
            Body::GroupMod(_) => Kind::GroupMod,
            Body::PortMod(_) => Kind::PortMod,
            Body::TableMod(_) => Kind::TableMod,
            Body::StatsRequest(_) => Kind::StatsRequest,
            Body::StatsReply(_) => Kind::StatsReply,
            Body::BarrierRequest => Kind::BarrierRequest,
            Body::BarrierReply => Kind::BarrierReply,
            Body::QueueGetConfigRequest(_) => Kind::QueueGetConfigRequest,
            Body::QueueGetConfigReply(_) => Kind::QueueGetConfigReply,
        }
    }

    fn parse(kind: Kind, buffer: &[u8]) -> Result<Self> {
        use self::Body::*;
        Ok(match kind {
            // a 1.1 hello has no body; trailing bytes are tolerated
            Kind::Hello => Hello,
            Kind::Error => Error(ErrorMsg::parse(buffer)?),
            Kind::EchoRequest => EchoRequest(buffer.to_vec()),
            Kind::EchoReply => EchoReply(buffer.to_vec()),
            Kind::Experimenter => Experimenter(ExperimenterMsg::parse(buffer)?),
            Kind::FeaturesRequest => FeaturesRequest,
            Kind::FeaturesReply => FeaturesReply(features::FeaturesReply::parse(buffer)?),
            Kind::GetConfigRequest => GetConfigRequest,
            Kind::GetConfigReply => GetConfigReply(SwitchConfig::parse(buffer)?),
            Kind::SetConfig => SetConfig(SwitchConfig::parse(buffer)?),
            Kind::PacketIn => PacketIn(packet_in::PacketIn::parse(buffer)?),
            Kind::FlowRemoved => FlowRemoved(flow_removed::FlowRemoved::parse(buffer)?),
            Kind::PortStatus => PortStatus(port_status::PortStatus::parse(buffer)?),
            Kind::PacketOut => PacketOut(packet_out::PacketOut::parse(buffer)?),
            Kind::FlowMod => FlowMod(flow_mod::FlowMod::parse(buffer)?),
            Kind::GroupMod => GroupMod(group_mod::GroupMod::parse(buffer)?),
            Kind::PortMod => PortMod(port_mod::PortMod::parse(buffer)?),
            Kind::TableMod => TableMod(table_mod::TableMod::parse(buffer)?),
            Kind::StatsRequest => StatsRequest(stats::StatsRequest::parse(buffer)?),
            Kind::StatsReply => StatsReply(stats::StatsReply::parse(buffer)?),
            Kind::BarrierRequest => BarrierRequest,
            Kind::BarrierReply => BarrierReply,
            Kind::QueueGetConfigRequest => {
                QueueGetConfigRequest(queue::QueueGetConfigRequest::parse(buffer)?)
            }
            Kind::QueueGetConfigReply => {
                QueueGetConfigReply(queue::QueueGetConfigReply::parse(buffer)?)
            }
            Kind::_Unknown(_) => {
                return Err(OfpError::BadRequest(BadRequestCode::BadType).into());
            }
        })
    }

    fn buffer_len(&self) -> usize {
        use self::Body::*;
        match *self {
            Hello | FeaturesRequest | GetConfigRequest | BarrierRequest | BarrierReply => 0,
            Error(ref repr) => repr.buffer_len(),
            EchoRequest(ref data) | EchoReply(ref data) => data.len(),
            Experimenter(ref repr) => repr.buffer_len(),
            FeaturesReply(ref repr) => repr.buffer_len(),
            GetConfigReply(ref repr) | SetConfig(ref repr) => repr.buffer_len(),
            PacketIn(ref repr) => repr.buffer_len(),
            FlowRemoved(ref repr) => repr.buffer_len(),
            PortStatus(ref repr) => repr.buffer_len(),
            PacketOut(ref repr) => repr.buffer_len(),
            FlowMod(ref repr) => repr.buffer_len(),
            GroupMod(ref repr) => repr.buffer_len(),
            PortMod(ref repr) => repr.buffer_len(),
            TableMod(ref repr) => repr.buffer_len(),
            StatsRequest(ref repr) => repr.buffer_len(),
            StatsReply(ref repr) => repr.buffer_len(),
            QueueGetConfigRequest(ref repr) => repr.buffer_len(),
            QueueGetConfigReply(ref repr) => repr.buffer_len(),
        }
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        use self::Body::*;
        match *self {
            Hello | FeaturesRequest | GetConfigRequest | BarrierRequest | BarrierReply => Ok(()),
            Error(ref repr) => repr.emit(buffer),
            EchoRequest(ref data) | EchoReply(ref data) => {
                if buffer.len() < data.len() {
                    Err(crate::Error::Exhausted)
                } else {
                    buffer[..data.len()].copy_from_slice(data);
                    Ok(())
                }
            }
            Experimenter(ref repr) => repr.emit(buffer),
            FeaturesReply(ref repr) => repr.emit(buffer),
            GetConfigReply(ref repr) | SetConfig(ref repr) => repr.emit(buffer),
            PacketIn(ref repr) => repr.emit(buffer),
            FlowRemoved(ref repr) => repr.emit(buffer),
            PortStatus(ref repr) => repr.emit(buffer),
            PacketOut(ref repr) => repr.emit(buffer),
            FlowMod(ref repr) => repr.emit(buffer),
            GroupMod(ref repr) => repr.emit(buffer),
            PortMod(ref repr) => repr.emit(buffer),
            TableMod(ref repr) => repr.emit(buffer),
            StatsRequest(ref repr) => repr.emit(buffer),
            StatsReply(ref repr) => repr.emit(buffer),
            QueueGetConfigRequest(ref repr) => repr.emit(buffer),
            QueueGetConfigReply(ref repr) => repr.emit(buffer),
        }
    }
}

/// A complete OpenFlow 1.1 message.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Message {
    pub xid: u32,
    pub body: Body,
}

impl Message {
    pub fn new(xid: u32, body: Body) -> Message {
        Message { xid, body }
    }

    pub fn kind(&self) -> Kind {
        self.body.kind()
    }

    /// Decode one message from a buffer holding exactly one message.
    ///
    /// Validates the framing rules: the buffer holds at least a header,
    /// the version is 0x02, and the declared length equals the buffer
    /// length.
    pub fn from_bytes(buffer: &[u8]) -> Result<Message> {
        let packet = Packet::new_checked(buffer)?;
        if packet.version() != VERSION {
            return Err(OfpError::HelloFailed(HelloFailedCode::Incompatible).into());
        }
        if packet.length() as usize != buffer.len() {
            return Err(bad_len());
        }
        let body = Body::parse(packet.kind(), packet.payload())?;
        let message = Message {
            xid: packet.xid(),
            body,
        };
        let consumed = message.buffer_len();
        if consumed < buffer.len() {
            warn!(
                "message of kind {:?} left {} residual bytes",
                message.kind(),
                buffer.len() - consumed
            );
        }
        Ok(message)
    }

    /// Encode the message into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = vec![0; self.buffer_len()];
        self.emit(&mut buffer)?;
        Ok(buffer)
    }
}

impl Repr for Message {
    fn parse(buffer: &[u8]) -> Result<Self> {
        Message::from_bytes(buffer)
    }

    fn buffer_len(&self) -> usize {
        HEADER_LEN + self.body.buffer_len()
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        let mut packet = Packet::new(buffer);
        packet.set_version(VERSION);
        packet.set_kind(self.kind());
        packet.set_length(self.buffer_len() as u16);
        packet.set_xid(self.xid);
        self.body.emit(packet.payload_mut())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::HelloFailedCode;

    #[rustfmt::skip]
    static HELLO_BYTES: [u8; 8] = [
        0x02,                   // version = 1.1
        0x00,                   // type = hello
        0x00, 0x08,             // length = 8
        0x00, 0x00, 0x00, 0x2a, // xid = 42
    ];

    #[test]
    fn test_hello_round_trip() {
        let message = Message::from_bytes(&HELLO_BYTES).unwrap();
        assert_eq!(message.xid, 42);
        assert_eq!(message.body, Body::Hello);
        assert_eq!(message.to_bytes().unwrap(), &HELLO_BYTES[..]);
    }

    #[test]
    fn test_empty_and_short_buffers() {
        assert_eq!(Message::from_bytes(&[]), Err(bad_len()));
        assert_eq!(Message::from_bytes(&HELLO_BYTES[..7]), Err(bad_len()));
    }

    #[test]
    fn test_bad_version() {
        let mut bytes = HELLO_BYTES;
        bytes[0] = 0x04;
        assert_eq!(
            Message::from_bytes(&bytes),
            Err(OfpError::HelloFailed(HelloFailedCode::Incompatible).into())
        );
    }

    #[test]
    fn test_length_must_match_buffer() {
        let mut bytes = [0u8; 12];
        bytes[..8].copy_from_slice(&HELLO_BYTES);
        // length field still claims 8, buffer is 12
        assert_eq!(Message::from_bytes(&bytes), Err(bad_len()));
    }

    #[test]
    fn test_echo_round_trip() {
        let message = Message::new(7, Body::EchoRequest(vec![1, 2, 3]));
        let bytes = message.to_bytes().unwrap();
        assert_eq!(bytes.len(), 11);
        assert_eq!(Message::from_bytes(&bytes).unwrap(), message);
    }

    #[test]
    fn test_unknown_kind() {
        let mut bytes = HELLO_BYTES;
        bytes[1] = 0x7f;
        assert_eq!(
            Message::from_bytes(&bytes),
            Err(OfpError::BadRequest(crate::error::BadRequestCode::BadType).into())
        );
    }
}
