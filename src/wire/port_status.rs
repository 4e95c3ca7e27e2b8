//! Types to parse and emit port status messages.

use crate::wire::port_desc::{PortDesc, PORT_DESC_LENGTH};
use crate::{Error, Repr, Result};

enum_with_unknown! {
    /// What changed about the port
    pub doc enum Reason(u8) {
        /// The port was added.
        Add = 0,
        /// The port was removed.
        Delete = 1,
        /// Some attribute of the port has changed.
        Modify = 2
    }
}

mod field {
    use crate::field::*;

    pub const REASON: usize = 0;
    pub const PAD: Field = 1..8;
    pub const DESC: Field = 8..8 + super::PORT_DESC_LENGTH;
}

/// Notification about a port addition, removal or change.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PortStatus {
    pub reason: Reason,
    pub desc: PortDesc,
}

impl Repr for PortStatus {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < field::DESC.end {
            return Err(crate::wire::bad_len());
        }
        Ok(PortStatus {
            reason: Reason::from(buffer[field::REASON]),
            desc: PortDesc::parse(&buffer[field::DESC])?,
        })
    }

    fn buffer_len(&self) -> usize {
        field::DESC.end
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        buffer[field::REASON] = self.reason.into();
        for i in field::PAD {
            buffer[i] = 0;
        }
        self.desc.emit(&mut buffer[field::DESC])?;
        Ok(())
    }
}
