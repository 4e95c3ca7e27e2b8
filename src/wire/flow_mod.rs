//! Types to parse and emit flow table modification messages.
//!
//! ```no_rust
//! +--------+--------+--------+--------+
//! |             cookie (8)            |
//! |           cookie_mask (8)         |
//! +--------+--------+--------+--------+
//! |table_id|command |  idle_timeout   |
//! +--------+--------+--------+--------+
//! |  hard_timeout   |    priority     |
//! +--------+--------+--------+--------+
//! |             buffer_id             |
//! +--------+--------+--------+--------+
//! |             out_port              |
//! +--------+--------+--------+--------+
//! |             out_group             |
//! +--------+--------+--------+--------+
//! |     flags       |     pad (2)     |
//! +--------+--------+--------+--------+
//! |          match (88 bytes)         |
//! +--------+--------+--------+--------+
//! |           instructions            |
//! +--------+--------+--------+--------+
//! ```

use byteorder::{ByteOrder, NetworkEndian};

use crate::error::{FlowModFailedCode, OfpError};
use crate::match_std::StandardMatch;
use crate::wire::instruction::{self, Instruction};
use crate::{Error, Repr, Result};

enum_with_unknown! {
    /// Flow mod commands
    pub doc enum Command(u8) {
        /// New flow.
        Add = 0,
        /// Modify all matching flows.
        Modify = 1,
        /// Modify entry strictly matching wildcards and priority.
        ModifyStrict = 2,
        /// Delete all matching flows.
        Delete = 3,
        /// Delete entry strictly matching wildcards and priority.
        DeleteStrict = 4
    }
}

/// Send a flow-removed message when the entry expires or is deleted.
pub const FLAG_SEND_FLOW_REM: u16 = 1 << 0;
/// Check for overlapping entries before adding.
pub const FLAG_CHECK_OVERLAP: u16 = 1 << 1;

/// Table id meaning "all tables" in delete commands.
pub const TABLE_ALL: u8 = 0xff;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

mod field {
    use crate::field::*;

    pub const COOKIE: Field = 0..8;
    pub const COOKIE_MASK: Field = 8..16;
    pub const TABLE_ID: usize = 16;
    pub const COMMAND: usize = 17;
    pub const IDLE_TIMEOUT: Field = 18..20;
    pub const HARD_TIMEOUT: Field = 20..22;
    pub const PRIORITY: Field = 22..24;
    pub const BUFFER_ID: Field = 24..28;
    pub const OUT_PORT: Field = 28..32;
    pub const OUT_GROUP: Field = 32..36;
    pub const FLAGS: Field = 36..38;
    pub const PAD: Field = 38..40;
    pub const FLOW_MATCH: Field = 40..128;
    pub const INSTRUCTIONS: Rest = 128..;
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
        if self.buffer.as_ref().len() < field::INSTRUCTIONS.start {
            Err(crate::wire::bad_len())
        } else {
            Ok(())
        }
    }

    pub fn cookie(&self) -> u64 {
        NetworkEndian::read_u64(&self.buffer.as_ref()[field::COOKIE])
    }

    pub fn cookie_mask(&self) -> u64 {
        NetworkEndian::read_u64(&self.buffer.as_ref()[field::COOKIE_MASK])
    }

    pub fn table_id(&self) -> u8 {
        self.buffer.as_ref()[field::TABLE_ID]
    }

    pub fn command(&self) -> Command {
        Command::from(self.buffer.as_ref()[field::COMMAND])
    }

    pub fn idle_timeout(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::IDLE_TIMEOUT])
    }

    pub fn hard_timeout(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::HARD_TIMEOUT])
    }

    pub fn priority(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::PRIORITY])
    }

    pub fn buffer_id(&self) -> u32 {
        NetworkEndian::read_u32(&self.buffer.as_ref()[field::BUFFER_ID])
    }

    pub fn out_port(&self) -> u32 {
        NetworkEndian::read_u32(&self.buffer.as_ref()[field::OUT_PORT])
    }

    pub fn out_group(&self) -> u32 {
        NetworkEndian::read_u32(&self.buffer.as_ref()[field::OUT_GROUP])
    }

    pub fn flags(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::FLAGS])
    }

    pub fn flow_match(&self) -> &[u8] {
        &self.buffer.as_ref()[field::FLOW_MATCH]
    }

    pub fn instructions(&self) -> &[u8] {
        &self.buffer.as_ref()[field::INSTRUCTIONS]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    pub fn set_cookie(&mut self, value: u64) {
        NetworkEndian::write_u64(&mut self.buffer.as_mut()[field::COOKIE], value)
    }

    pub fn set_cookie_mask(&mut self, value: u64) {
        NetworkEndian::write_u64(&mut self.buffer.as_mut()[field::COOKIE_MASK], value)
    }

    pub fn set_table_id(&mut self, value: u8) {
        self.buffer.as_mut()[field::TABLE_ID] = value
    }

    pub fn set_command(&mut self, value: Command) {
        self.buffer.as_mut()[field::COMMAND] = value.into()
    }

    pub fn set_idle_timeout(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[field::IDLE_TIMEOUT], value)
    }

    pub fn set_hard_timeout(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[field::HARD_TIMEOUT], value)
    }

    pub fn set_priority(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[field::PRIORITY], value)
    }

    pub fn set_buffer_id(&mut self, value: u32) {
        NetworkEndian::write_u32(&mut self.buffer.as_mut()[field::BUFFER_ID], value)
    }

    pub fn set_out_port(&mut self, value: u32) {
        NetworkEndian::write_u32(&mut self.buffer.as_mut()[field::OUT_PORT], value)
    }

    pub fn set_out_group(&mut self, value: u32) {
        NetworkEndian::write_u32(&mut self.buffer.as_mut()[field::OUT_GROUP], value)
    }

    pub fn set_flags(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[field::FLAGS], value)
    }

    pub fn set_pad(&mut self) {
        for i in field::PAD {
            self.buffer.as_mut()[i] = 0;
        }
    }

    pub fn flow_match_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.as_mut()[field::FLOW_MATCH]
    }

    pub fn instructions_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.as_mut()[field::INSTRUCTIONS]
    }
}

/// A flow table modification.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FlowMod {
    pub cookie: u64,
    pub cookie_mask: u64,
    pub table_id: u8,
    pub command: Command,
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    pub priority: u16,
    pub buffer_id: u32,
    pub out_port: u32,
    pub out_group: u32,
    pub flags: u16,
    pub flow_match: StandardMatch,
    pub instructions: Vec<Instruction>,
}

impl Repr for FlowMod {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let packet = Packet::new_checked(buffer)?;
        let command = packet.command();
        if let Command::_Unknown(_) = command {
            return Err(OfpError::FlowModFailed(FlowModFailedCode::BadCommand).into());
        }
        let table_id = packet.table_id();
        let deleting = command == Command::Delete || command == Command::DeleteStrict;
        if table_id == TABLE_ALL && !deleting {
            return Err(OfpError::FlowModFailed(FlowModFailedCode::BadTableId).into());
        }
        Ok(FlowMod {
            cookie: packet.cookie(),
            cookie_mask: packet.cookie_mask(),
            table_id,
            command,
            idle_timeout: packet.idle_timeout(),
            hard_timeout: packet.hard_timeout(),
            priority: packet.priority(),
            buffer_id: packet.buffer_id(),
            out_port: packet.out_port(),
            out_group: packet.out_group(),
            flags: packet.flags(),
            flow_match: StandardMatch::parse(packet.flow_match())?,
            instructions: instruction::parse_list(packet.instructions())?,
        })
    }

    fn buffer_len(&self) -> usize {
        field::FLOW_MATCH.end + instruction::list_len(&self.instructions)
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        let mut packet = Packet::new(buffer);
        packet.set_cookie(self.cookie);
        packet.set_cookie_mask(self.cookie_mask);
        packet.set_table_id(self.table_id);
        packet.set_command(self.command);
        packet.set_idle_timeout(self.idle_timeout);
        packet.set_hard_timeout(self.hard_timeout);
        packet.set_priority(self.priority);
        packet.set_buffer_id(self.buffer_id);
        packet.set_out_port(self.out_port);
        packet.set_out_group(self.out_group);
        packet.set_flags(self.flags);
        packet.set_pad();
        self.flow_match.emit(packet.flow_match_mut())?;
        instruction::emit_list(&self.instructions, packet.instructions_mut())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::match_std::wildcards;
    use crate::wire::action::Action;
    use crate::wire::NO_BUFFER;
    use smoltcp::wire::Ipv4Address;

    fn sample() -> FlowMod {
        let mut flow_match = StandardMatch::any();
        flow_match.wildcards &= !wildcards::IN_PORT;
        flow_match.in_port = 1;
        flow_match.nw_dst = Ipv4Address([10, 0, 0, 2]);
        flow_match.nw_dst_mask = Ipv4Address([0, 0, 0, 0]);
        FlowMod {
            cookie: 0xdead_beef,
            cookie_mask: 0,
            table_id: 0,
            command: Command::Add,
            idle_timeout: 0,
            hard_timeout: 0,
            priority: 100,
            buffer_id: NO_BUFFER,
            out_port: u32::from(crate::PortNumber::Any),
            out_group: crate::GroupNumber::ANY,
            flags: 0,
            flow_match,
            instructions: vec![Instruction::ApplyActions(vec![
                Action::SetNwDst(Ipv4Address([10, 0, 0, 5])),
                Action::Output { port: 2, max_len: 0 },
            ])],
        }
    }

    #[test]
    fn test_round_trip() {
        let flow_mod = sample();
        let mut bytes = vec![0; flow_mod.buffer_len()];
        flow_mod.emit(&mut bytes).unwrap();
        assert_eq!(FlowMod::parse(&bytes).unwrap(), flow_mod);
    }

    #[test]
    fn test_delete_all_tables_only() {
        let mut flow_mod = sample();
        flow_mod.table_id = TABLE_ALL;
        let mut bytes = vec![0; flow_mod.buffer_len()];
        flow_mod.emit(&mut bytes).unwrap();
        assert_eq!(
            FlowMod::parse(&bytes),
            Err(OfpError::FlowModFailed(FlowModFailedCode::BadTableId).into())
        );

        flow_mod.command = Command::Delete;
        let mut bytes = vec![0; flow_mod.buffer_len()];
        flow_mod.emit(&mut bytes).unwrap();
        assert!(FlowMod::parse(&bytes).is_ok());
    }
}
