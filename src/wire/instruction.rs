//! Types to parse and emit OpenFlow 1.1 instruction records.
//!
//! Instructions share the action record framing: a type, a length covering
//! the whole record, and an 8-byte aligned body.

use byteorder::{ByteOrder, NetworkEndian};

use crate::error::{BadInstructionCode, OfpError};
use crate::wire::action::{self, Action};
use crate::{Error, Repr, Result};

use core::fmt;

enum_with_unknown! {
    /// OpenFlow 1.1 instruction types
    pub doc enum Kind(u16) {
        /// Setup the next table in the lookup pipeline.
        GotoTable = 1,
        /// Setup the metadata field for use later in pipeline.
        WriteMetadata = 2,
        /// Write the actions onto the datapath action set.
        WriteActions = 3,
        /// Apply the actions immediately.
        ApplyActions = 4,
        /// Clear the datapath action set.
        ClearActions = 5,
        /// Experimenter instruction.
        Experimenter = 0xffff
    }
}

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

    #[inline]
    pub fn kind(&self) -> Kind {
        let data = self.buffer.as_ref();
        Kind::from(NetworkEndian::read_u16(&data[field::KIND]))
    }

    #[inline]
    pub fn length(&self) -> u16 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u16(&data[field::LENGTH])
    }

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
    // instruction framing problems have no dedicated code in 1.1
    OfpError::BadInstruction(BadInstructionCode::UnknownInst).into()
}

/// An OpenFlow 1.1 instruction.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Instruction {
    GotoTable(u8),
    WriteMetadata { metadata: u64, mask: u64 },
    WriteActions(Vec<Action>),
    ApplyActions(Vec<Action>),
    ClearActions,
    Experimenter { experimenter: u32, data: Vec<u8> },
}

impl Instruction {
    pub fn kind(&self) -> Kind {
        match *self {
            Instruction::GotoTable(_) => Kind::GotoTable,
            Instruction::WriteMetadata { .. } => Kind::WriteMetadata,
            Instruction::WriteActions(_) => Kind::WriteActions,
            Instruction::ApplyActions(_) => Kind::ApplyActions,
            Instruction::ClearActions => Kind::ClearActions,
            Instruction::Experimenter { .. } => Kind::Experimenter,
        }
    }

    /// The actions carried by a write-actions or apply-actions
    /// instruction, if any.
    pub fn actions(&self) -> Option<&[Action]> {
        match *self {
            Instruction::WriteActions(ref actions) | Instruction::ApplyActions(ref actions) => {
                Some(actions)
            }
            _ => None,
        }
    }
}

impl Repr for Instruction {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let packet = Packet::new_checked(buffer)?;
        let len = packet.length() as usize;
        let body = packet.body();

        let instruction = match packet.kind() {
            Kind::GotoTable => {
                if len != 8 {
                    return Err(bad_len());
                }
                Instruction::GotoTable(body[0])
            }
            Kind::WriteMetadata => {
                if len != 24 {
                    return Err(bad_len());
                }
                Instruction::WriteMetadata {
                    metadata: NetworkEndian::read_u64(&body[4..12]),
                    mask: NetworkEndian::read_u64(&body[12..20]),
                }
            }
            Kind::WriteActions => Instruction::WriteActions(action::parse_list(&body[4..])?),
            Kind::ApplyActions => Instruction::ApplyActions(action::parse_list(&body[4..])?),
            Kind::ClearActions => {
                if len != 8 {
                    return Err(bad_len());
                }
                Instruction::ClearActions
            }
            Kind::Experimenter => Instruction::Experimenter {
                experimenter: NetworkEndian::read_u32(&body[0..4]),
                data: body[4..].to_vec(),
            },
            Kind::_Unknown(_) => {
                return Err(OfpError::BadInstruction(BadInstructionCode::UnknownInst).into());
            }
        };
        Ok(instruction)
    }

    fn buffer_len(&self) -> usize {
        match *self {
            Instruction::GotoTable(_) | Instruction::ClearActions => 8,
            Instruction::WriteMetadata { .. } => 24,
            Instruction::WriteActions(ref actions) | Instruction::ApplyActions(ref actions) => {
                8 + action::list_len(actions)
            }
            Instruction::Experimenter { ref data, .. } => (8 + data.len() + 7) / 8 * 8,
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
            Instruction::GotoTable(table_id) => body[0] = table_id,
            Instruction::WriteMetadata { metadata, mask } => {
                NetworkEndian::write_u64(&mut body[4..12], metadata);
                NetworkEndian::write_u64(&mut body[12..20], mask);
            }
            Instruction::WriteActions(ref actions) | Instruction::ApplyActions(ref actions) => {
                action::emit_list(actions, &mut body[4..])?;
            }
            Instruction::ClearActions => {}
            Instruction::Experimenter { experimenter, ref data } => {
                NetworkEndian::write_u32(&mut body[0..4], experimenter);
                body[4..4 + data.len()].copy_from_slice(data);
            }
        }
        Ok(())
    }
}

/// Parse a whole buffer of consecutive instruction records.
pub fn parse_list(buffer: &[u8]) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();
    let mut offset = 0;
    while offset < buffer.len() {
        let instruction = Instruction::parse(&buffer[offset..])?;
        offset += instruction.buffer_len();
        instructions.push(instruction);
    }
    Ok(instructions)
}

/// Return the emitted length of a list of instructions.
pub fn list_len(instructions: &[Instruction]) -> usize {
    instructions.iter().map(Repr::buffer_len).sum()
}

/// Emit consecutive instruction records into a buffer.
pub fn emit_list(instructions: &[Instruction], buffer: &mut [u8]) -> Result<()> {
    let mut offset = 0;
    for instruction in instructions {
        instruction.emit(&mut buffer[offset..])?;
        offset += instruction.buffer_len();
    }
    Ok(())
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Instruction::GotoTable(table_id) => write!(f, "goto_table:{}", table_id),
            Instruction::WriteMetadata { metadata, mask } => {
                write!(f, "write_metadata:{:#x}/{:#x}", metadata, mask)
            }
            Instruction::WriteActions(ref actions) => {
                write!(f, "write_actions(")?;
                for action in actions {
                    write!(f, "{},", action)?;
                }
                write!(f, ")")
            }
            Instruction::ApplyActions(ref actions) => {
                write!(f, "apply_actions(")?;
                for action in actions {
                    write!(f, "{},", action)?;
                }
                write!(f, ")")
            }
            Instruction::ClearActions => write!(f, "clear_actions"),
            Instruction::Experimenter { experimenter, .. } => {
                write!(f, "experimenter:{:#x}", experimenter)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[rustfmt::skip]
    static GOTO_BYTES: [u8; 8] = [
        0x00, 0x01,             // type = goto table
        0x00, 0x08,             // length = 8
        0x02,                   // table_id = 2
        0x00, 0x00, 0x00,
    ];

    #[test]
    fn test_goto_round_trip() {
        let parsed = Instruction::parse(&GOTO_BYTES).unwrap();
        assert_eq!(parsed, Instruction::GotoTable(2));
        let mut bytes = [0xff; 8];
        parsed.emit(&mut bytes).unwrap();
        assert_eq!(&bytes[..], &GOTO_BYTES[..]);
    }

    #[test]
    fn test_write_metadata_round_trip() {
        let instruction = Instruction::WriteMetadata {
            metadata: 0x1122_3344_5566_7788,
            mask: 0xffff_0000_ffff_0000,
        };
        assert_eq!(instruction.buffer_len(), 24);
        let mut bytes = [0; 24];
        instruction.emit(&mut bytes).unwrap();
        assert_eq!(Instruction::parse(&bytes).unwrap(), instruction);
    }

    #[test]
    fn test_apply_actions_round_trip() {
        let instruction = Instruction::ApplyActions(vec![
            Action::SetTpDst(8080),
            Action::Output { port: 1, max_len: 0 },
        ]);
        assert_eq!(instruction.buffer_len(), 8 + 8 + 16);
        let mut bytes = vec![0; instruction.buffer_len()];
        instruction.emit(&mut bytes).unwrap();
        assert_eq!(Instruction::parse(&bytes).unwrap(), instruction);
    }

    #[test]
    fn test_unknown_kind() {
        let mut bytes = GOTO_BYTES;
        bytes[1] = 0x77;
        assert_eq!(
            Instruction::parse(&bytes),
            Err(OfpError::BadInstruction(BadInstructionCode::UnknownInst).into())
        );
    }
}
