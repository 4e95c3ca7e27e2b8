//! Types to parse and emit flow-removed messages.
//!
//! ```no_rust
//! +--------+--------+--------+--------+
//! |             cookie (8)            |
//! +--------+--------+--------+--------+
//! |    priority     | reason |table_id|
//! +--------+--------+--------+--------+
//! |            duration_sec           |
//! +--------+--------+--------+--------+
//! |           duration_nsec           |
//! +--------+--------+--------+--------+
//! |  idle_timeout   |     pad (2)     |
//! +--------+--------+--------+--------+
//! |          packet_count (8)         |
//! |           byte_count (8)          |
//! +--------+--------+--------+--------+
//! |          match (88 bytes)         |
//! +--------+--------+--------+--------+
//! ```
//!
//! The 1.1 wire format carries the idle timeout of the expired entry but
//! not its hard timeout.

use byteorder::{ByteOrder, NetworkEndian};

use crate::error::{BadActionCode, OfpError};
use crate::match_std::StandardMatch;
use crate::{Error, Repr, Result};

enum_with_unknown! {
    /// Why the flow was removed
    pub doc enum Reason(u8) {
        /// Flow idle time exceeded idle_timeout.
        IdleTimeout = 0,
        /// Time exceeded hard_timeout.
        HardTimeout = 1,
        /// Evicted by a delete flow mod.
        Delete = 2,
        /// Group was removed.
        GroupDelete = 3
    }
}

mod field {
    use crate::field::*;

    pub const COOKIE: Field = 0..8;
    pub const PRIORITY: Field = 8..10;
    pub const REASON: usize = 10;
    pub const TABLE_ID: usize = 11;
    pub const DURATION_SEC: Field = 12..16;
    pub const DURATION_NSEC: Field = 16..20;
    pub const IDLE_TIMEOUT: Field = 20..22;
    pub const PAD: Field = 22..24;
    pub const PACKET_COUNT: Field = 24..32;
    pub const BYTE_COUNT: Field = 32..40;
    pub const FLOW_MATCH: Field = 40..128;
}

/// Notification that a flow entry was removed from a table.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FlowRemoved {
    pub cookie: u64,
    pub priority: u16,
    pub reason: Reason,
    pub table_id: u8,
    pub duration_sec: u32,
    pub duration_nsec: u32,
    pub idle_timeout: u16,
    pub packet_count: u64,
    pub byte_count: u64,
    pub flow_match: StandardMatch,
}

impl Repr for FlowRemoved {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < field::FLOW_MATCH.end {
            return Err(crate::wire::bad_len());
        }
        if buffer[field::TABLE_ID] == 0xff {
            return Err(OfpError::BadAction(BadActionCode::BadArgument).into());
        }
        Ok(FlowRemoved {
            cookie: NetworkEndian::read_u64(&buffer[field::COOKIE]),
            priority: NetworkEndian::read_u16(&buffer[field::PRIORITY]),
            reason: Reason::from(buffer[field::REASON]),
            table_id: buffer[field::TABLE_ID],
            duration_sec: NetworkEndian::read_u32(&buffer[field::DURATION_SEC]),
            duration_nsec: NetworkEndian::read_u32(&buffer[field::DURATION_NSEC]),
            idle_timeout: NetworkEndian::read_u16(&buffer[field::IDLE_TIMEOUT]),
            packet_count: NetworkEndian::read_u64(&buffer[field::PACKET_COUNT]),
            byte_count: NetworkEndian::read_u64(&buffer[field::BYTE_COUNT]),
            flow_match: StandardMatch::parse(&buffer[field::FLOW_MATCH])?,
        })
    }

    fn buffer_len(&self) -> usize {
        field::FLOW_MATCH.end
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u64(&mut buffer[field::COOKIE], self.cookie);
        NetworkEndian::write_u16(&mut buffer[field::PRIORITY], self.priority);
        buffer[field::REASON] = self.reason.into();
        buffer[field::TABLE_ID] = self.table_id;
        NetworkEndian::write_u32(&mut buffer[field::DURATION_SEC], self.duration_sec);
        NetworkEndian::write_u32(&mut buffer[field::DURATION_NSEC], self.duration_nsec);
        NetworkEndian::write_u16(&mut buffer[field::IDLE_TIMEOUT], self.idle_timeout);
        for i in field::PAD {
            buffer[i] = 0;
        }
        NetworkEndian::write_u64(&mut buffer[field::PACKET_COUNT], self.packet_count);
        NetworkEndian::write_u64(&mut buffer[field::BYTE_COUNT], self.byte_count);
        self.flow_match.emit(&mut buffer[field::FLOW_MATCH])?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_round_trip() {
        let removed = FlowRemoved {
            cookie: 7,
            priority: 100,
            reason: Reason::IdleTimeout,
            table_id: 3,
            duration_sec: 12,
            duration_nsec: 500,
            idle_timeout: 10,
            packet_count: 42,
            byte_count: 4200,
            flow_match: StandardMatch::any(),
        };
        let mut bytes = vec![0; removed.buffer_len()];
        removed.emit(&mut bytes).unwrap();
        assert_eq!(FlowRemoved::parse(&bytes).unwrap(), removed);
    }
}
