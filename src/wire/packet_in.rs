//! Types to parse and emit packet-in messages.
//!
//! ```no_rust
//!  0      7        15       23       31
//! +--------+--------+--------+--------+
//! |             buffer_id             |
//! +--------+--------+--------+--------+
//! |              in_port              |
//! +--------+--------+--------+--------+
//! |            in_phy_port            |
//! +--------+--------+--------+--------+
//! |    total_len    | reason |table_id|
//! +--------+--------+--------+--------+
//! |               frame               |
//! +--------+--------+--------+--------+
//! ```

use byteorder::{ByteOrder, NetworkEndian};

use crate::error::{BadActionCode, OfpError};
use crate::{Error, PortNumber, Repr, Result};

enum_with_unknown! {
    /// Why the packet was sent to the controller
    pub doc enum Reason(u8) {
        /// No matching flow.
        NoMatch = 0,
        /// Action explicitly output to controller.
        Action = 1
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

mod field {
    use crate::field::*;

    pub const BUFFER_ID: Field = 0..4;
    pub const IN_PORT: Field = 4..8;
    pub const IN_PHY_PORT: Field = 8..12;
    pub const TOTAL_LEN: Field = 12..14;
    pub const REASON: usize = 14;
    pub const TABLE_ID: usize = 15;
    pub const DATA: Rest = 16..;
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
        if self.buffer.as_ref().len() < field::DATA.start {
            Err(crate::wire::bad_len())
        } else {
            Ok(())
        }
    }

    pub fn buffer_id(&self) -> u32 {
        NetworkEndian::read_u32(&self.buffer.as_ref()[field::BUFFER_ID])
    }

    pub fn in_port(&self) -> u32 {
        NetworkEndian::read_u32(&self.buffer.as_ref()[field::IN_PORT])
    }

    pub fn in_phy_port(&self) -> u32 {
        NetworkEndian::read_u32(&self.buffer.as_ref()[field::IN_PHY_PORT])
    }

    pub fn total_len(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::TOTAL_LEN])
    }

    pub fn reason(&self) -> Reason {
        Reason::from(self.buffer.as_ref()[field::REASON])
    }

    pub fn table_id(&self) -> u8 {
        self.buffer.as_ref()[field::TABLE_ID]
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> Packet<&'a T> {
    pub fn data(&self) -> &'a [u8] {
        &self.buffer.as_ref()[field::DATA]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    pub fn set_buffer_id(&mut self, value: u32) {
        NetworkEndian::write_u32(&mut self.buffer.as_mut()[field::BUFFER_ID], value)
    }

    pub fn set_in_port(&mut self, value: u32) {
        NetworkEndian::write_u32(&mut self.buffer.as_mut()[field::IN_PORT], value)
    }

    pub fn set_in_phy_port(&mut self, value: u32) {
        NetworkEndian::write_u32(&mut self.buffer.as_mut()[field::IN_PHY_PORT], value)
    }

    pub fn set_total_len(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[field::TOTAL_LEN], value)
    }

    pub fn set_reason(&mut self, value: Reason) {
        self.buffer.as_mut()[field::REASON] = value.into()
    }

    pub fn set_table_id(&mut self, value: u8) {
        self.buffer.as_mut()[field::TABLE_ID] = value
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.as_mut()[field::DATA]
    }
}

/// A packet forwarded to the controller.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacketIn {
    /// Buffer id assigned by the datapath, or [`crate::wire::NO_BUFFER`].
    pub buffer_id: u32,
    pub in_port: u32,
    pub in_phy_port: u32,
    /// Full length of the frame; `data` may be shorter when truncated.
    pub total_len: u16,
    pub reason: Reason,
    pub table_id: u8,
    pub data: Vec<u8>,
}

impl Repr for PacketIn {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let packet = Packet::new_checked(buffer)?;
        let in_port = packet.in_port();
        match PortNumber::from(in_port) {
            PortNumber::Local => {}
            PortNumber::Regular(p) if p != 0 && p <= PortNumber::MAX => {}
            PortNumber::Max => {}
            _ => return Err(OfpError::BadAction(BadActionCode::BadArgument).into()),
        }
        if packet.table_id() == 0xff {
            return Err(OfpError::BadAction(BadActionCode::BadArgument).into());
        }
        Ok(PacketIn {
            buffer_id: packet.buffer_id(),
            in_port,
            in_phy_port: packet.in_phy_port(),
            total_len: packet.total_len(),
            reason: packet.reason(),
            table_id: packet.table_id(),
            data: packet.data().to_vec(),
        })
    }

    fn buffer_len(&self) -> usize {
        field::DATA.start + self.data.len()
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        let mut packet = Packet::new(buffer);
        packet.set_buffer_id(self.buffer_id);
        packet.set_in_port(self.in_port);
        packet.set_in_phy_port(self.in_phy_port);
        packet.set_total_len(self.total_len);
        packet.set_reason(self.reason);
        packet.set_table_id(self.table_id);
        packet.data_mut()[..self.data.len()].copy_from_slice(&self.data);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::NO_BUFFER;

    #[test]
    fn test_round_trip() {
        let packet_in = PacketIn {
            buffer_id: NO_BUFFER,
            in_port: 1,
            in_phy_port: 1,
            total_len: 60,
            reason: Reason::NoMatch,
            table_id: 0,
            data: vec![0xaa; 60],
        };
        let mut bytes = vec![0; packet_in.buffer_len()];
        packet_in.emit(&mut bytes).unwrap();
        assert_eq!(PacketIn::parse(&bytes).unwrap(), packet_in);
    }

    #[test]
    fn test_invalid_in_port() {
        let packet_in = PacketIn {
            buffer_id: NO_BUFFER,
            in_port: u32::from(PortNumber::Flood),
            in_phy_port: 1,
            total_len: 0,
            reason: Reason::NoMatch,
            table_id: 0,
            data: vec![],
        };
        let mut bytes = vec![0; packet_in.buffer_len()];
        packet_in.emit(&mut bytes).unwrap();
        assert_eq!(
            PacketIn::parse(&bytes),
            Err(OfpError::BadAction(BadActionCode::BadArgument).into())
        );
    }
}
