//! Types to parse and emit table configuration messages.

use byteorder::{ByteOrder, NetworkEndian};

use crate::{Error, Repr, Result};

/// Table miss-policy config bits. With neither bit set a miss sends the
/// packet to the controller.
pub mod config {
    /// Continue to the next table in the pipeline.
    pub const MISS_CONTINUE: u32 = 1 << 0;
    /// Drop the packet.
    pub const MISS_DROP: u32 = 1 << 1;
    pub const MISS_MASK: u32 = 3;
}

mod field {
    use crate::field::*;

    pub const TABLE_ID: usize = 0;
    pub const PAD: Field = 1..4;
    pub const CONFIG: Field = 4..8;
}

/// A request to change the configuration of one table, or of all tables
/// when `table_id` is 0xff.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct TableMod {
    pub table_id: u8,
    pub config: u32,
}

impl Repr for TableMod {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < field::CONFIG.end {
            return Err(crate::wire::bad_len());
        }
        Ok(TableMod {
            table_id: buffer[field::TABLE_ID],
            config: NetworkEndian::read_u32(&buffer[field::CONFIG]),
        })
    }

    fn buffer_len(&self) -> usize {
        field::CONFIG.end
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        buffer[field::TABLE_ID] = self.table_id;
        for i in field::PAD {
            buffer[i] = 0;
        }
        NetworkEndian::write_u32(&mut buffer[field::CONFIG], self.config);
        Ok(())
    }
}
