//! Types to parse and emit packet-out messages.
//!
//! ```no_rust
//! +--------+--------+--------+--------+
//! |             buffer_id             |
//! +--------+--------+--------+--------+
//! |              in_port              |
//! +--------+--------+--------+--------+
//! |   actions_len   |     pad (6)     |
//! +--------+--------+--------+--------+
//! |          actions, frame           |
//! +--------+--------+--------+--------+
//! ```
//!
//! The frame is only present when `buffer_id` is
//! [`crate::wire::NO_BUFFER`].

use byteorder::{ByteOrder, NetworkEndian};

use crate::error::{BadActionCode, OfpError};
use crate::wire::action::{self, Action};
use crate::{Error, PortNumber, Repr, Result};

mod field {
    use crate::field::*;

    pub const BUFFER_ID: Field = 0..4;
    pub const IN_PORT: Field = 4..8;
    pub const ACTIONS_LEN: Field = 8..10;
    pub const PAD: Field = 10..16;

    pub fn actions(actions_len: usize) -> Field {
        PAD.end..PAD.end + actions_len
    }

    pub fn data(actions_len: usize) -> Rest {
        actions(actions_len).end..
    }
}

/// A packet the controller injects into the datapath.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacketOut {
    pub buffer_id: u32,
    /// The port the packet should be treated as having arrived on;
    /// either a regular port or [`PortNumber::Controller`].
    pub in_port: u32,
    pub actions: Vec<Action>,
    pub data: Vec<u8>,
}

impl Repr for PacketOut {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < field::PAD.end {
            return Err(crate::wire::bad_len());
        }
        let in_port = NetworkEndian::read_u32(&buffer[field::IN_PORT]);
        match PortNumber::from(in_port) {
            PortNumber::Controller => {}
            PortNumber::Regular(p) if p != 0 && p <= PortNumber::MAX => {}
            PortNumber::Max => {}
            _ => return Err(OfpError::BadAction(BadActionCode::BadArgument).into()),
        }
        let actions_len = NetworkEndian::read_u16(&buffer[field::ACTIONS_LEN]) as usize;
        if field::PAD.end + actions_len > buffer.len() {
            return Err(crate::wire::bad_len());
        }
        Ok(PacketOut {
            buffer_id: NetworkEndian::read_u32(&buffer[field::BUFFER_ID]),
            in_port,
            actions: action::parse_list(&buffer[field::actions(actions_len)])?,
            data: buffer[field::data(actions_len)].to_vec(),
        })
    }

    fn buffer_len(&self) -> usize {
        field::PAD.end + action::list_len(&self.actions) + self.data.len()
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        let actions_len = action::list_len(&self.actions);
        NetworkEndian::write_u32(&mut buffer[field::BUFFER_ID], self.buffer_id);
        NetworkEndian::write_u32(&mut buffer[field::IN_PORT], self.in_port);
        NetworkEndian::write_u16(&mut buffer[field::ACTIONS_LEN], actions_len as u16);
        for i in field::PAD {
            buffer[i] = 0;
        }
        action::emit_list(&self.actions, &mut buffer[field::actions(actions_len)])?;
        buffer[field::data(actions_len)][..self.data.len()].copy_from_slice(&self.data);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::NO_BUFFER;

    #[test]
    fn test_round_trip() {
        let packet_out = PacketOut {
            buffer_id: NO_BUFFER,
            in_port: u32::from(PortNumber::Controller),
            actions: vec![
                Action::PushVlan(0x8100),
                Action::SetVlanVid(42),
                Action::Output { port: 4, max_len: 0 },
            ],
            data: vec![0x55; 64],
        };
        let mut bytes = vec![0; packet_out.buffer_len()];
        packet_out.emit(&mut bytes).unwrap();
        assert_eq!(PacketOut::parse(&bytes).unwrap(), packet_out);
    }

    #[test]
    fn test_actions_len_out_of_bounds() {
        let packet_out = PacketOut {
            buffer_id: NO_BUFFER,
            in_port: 1,
            actions: vec![],
            data: vec![],
        };
        let mut bytes = vec![0; packet_out.buffer_len()];
        packet_out.emit(&mut bytes).unwrap();
        bytes[9] = 8; // claims actions beyond the end of the message
        assert_eq!(PacketOut::parse(&bytes), Err(crate::wire::bad_len()));
    }
}
