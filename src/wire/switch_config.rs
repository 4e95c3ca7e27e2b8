//! The switch configuration body shared by GET_CONFIG_REPLY and
//! SET_CONFIG.
//!
//! ```no_rust
//! +--------+--------+--------+--------+
//! |     flags       |  miss_send_len  |
//! +--------+--------+--------+--------+
//! ```

use byteorder::{ByteOrder, NetworkEndian};

use crate::{Error, Repr, Result};

/// Switch config flags.
pub mod flags {
    /// No special handling for IP fragments (default).
    pub const FRAG_NORMAL: u16 = 0;
    /// Drop IP fragments.
    pub const FRAG_DROP: u16 = 1 << 0;
    /// Reassemble IP fragments.
    pub const FRAG_REASM: u16 = 1 << 1;
    pub const FRAG_MASK: u16 = 3;
    /// Send packets with TTL 0 or 1 to the controller.
    pub const INVALID_TTL_TO_CONTROLLER: u16 = 1 << 2;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

mod field {
    use crate::field::*;

    pub const FLAGS: Field = 0..2;
    pub const MISS_SEND_LEN: Field = 2..4;
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
        if self.buffer.as_ref().len() < field::MISS_SEND_LEN.end {
            Err(crate::wire::bad_len())
        } else {
            Ok(())
        }
    }

    /// Return the `flags` field.
    #[inline]
    pub fn flags(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::FLAGS])
    }

    /// Return the `miss_send_len` field.
    #[inline]
    pub fn miss_send_len(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::MISS_SEND_LEN])
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    /// Set the `flags` field.
    #[inline]
    pub fn set_flags(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[field::FLAGS], value)
    }

    /// Set the `miss_send_len` field.
    #[inline]
    pub fn set_miss_send_len(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[field::MISS_SEND_LEN], value)
    }
}

/// The switch configuration.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SwitchConfig {
    pub flags: u16,
    /// The amount of bytes of a packet to send to the controller in a
    /// packet-in triggered by a table miss.
    pub miss_send_len: u16,
}

impl Default for SwitchConfig {
    fn default() -> SwitchConfig {
        SwitchConfig {
            flags: flags::FRAG_NORMAL,
            miss_send_len: 128,
        }
    }
}

impl Repr for SwitchConfig {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let packet = Packet::new_checked(buffer)?;
        Ok(SwitchConfig {
            flags: packet.flags(),
            miss_send_len: packet.miss_send_len(),
        })
    }

    fn buffer_len(&self) -> usize {
        field::MISS_SEND_LEN.end
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        let mut packet = Packet::new(buffer);
        packet.set_flags(self.flags);
        packet.set_miss_send_len(self.miss_send_len);
        Ok(())
    }
}
