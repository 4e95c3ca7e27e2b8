//! The 64-byte port description shared by features replies, port status
//! messages and the ports interface.
//!
//! ```no_rust
//! +--------+--------+--------+--------+
//! |              port_no              |
//! +--------+--------+--------+--------+
//! |              pad (4)              |
//! +--------+--------+--------+--------+
//! |      hw_addr (6)         | pad (2)|
//! +--------+--------+--------+--------+
//! |             name (16)             |
//! +--------+--------+--------+--------+
//! |  config | state | curr | advert   |
//! |  supported | peer | curr_speed    |
//! |  max_speed                        |
//! +--------+--------+--------+--------+
//! ```

use byteorder::{ByteOrder, NetworkEndian};
use smoltcp::wire::EthernetAddress;

use crate::{Error, Repr, Result};

/// Port config bits.
pub mod config {
    /// Port is administratively down.
    pub const PORT_DOWN: u32 = 1 << 0;
    /// Drop all packets received by port.
    pub const NO_RECV: u32 = 1 << 2;
    /// Drop packets forwarded to port.
    pub const NO_FWD: u32 = 1 << 5;
    /// Do not send packet-in msgs for port.
    pub const NO_PACKET_IN: u32 = 1 << 6;
}

/// Port state bits.
pub mod state {
    /// No physical link present.
    pub const LINK_DOWN: u32 = 1 << 0;
    /// Port is blocked.
    pub const BLOCKED: u32 = 1 << 1;
    /// Live for Fast Failover Group.
    pub const LIVE: u32 = 1 << 2;
}

/// Wire size of a port description.
pub const PORT_DESC_LENGTH: usize = 64;

mod field {
    use crate::field::*;

    pub const PORT_NO: Field = 0..4;
    pub const PAD1: Field = 4..8;
    pub const HW_ADDR: Field = 8..14;
    pub const PAD2: Field = 14..16;
    pub const NAME: Field = 16..32;
    pub const CONFIG: Field = 32..36;
    pub const STATE: Field = 36..40;
    pub const CURR: Field = 40..44;
    pub const ADVERTISED: Field = 44..48;
    pub const SUPPORTED: Field = 48..52;
    pub const PEER: Field = 52..56;
    pub const CURR_SPEED: Field = 56..60;
    pub const MAX_SPEED: Field = 60..64;
}

/// Description of a switch port.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PortDesc {
    pub port_no: u32,
    pub hw_addr: EthernetAddress,
    /// Human readable name, at most 15 bytes.
    pub name: String,
    pub config: u32,
    pub state: u32,
    pub curr: u32,
    pub advertised: u32,
    pub supported: u32,
    pub peer: u32,
    /// Current port bitrate in kbps.
    pub curr_speed: u32,
    /// Max port bitrate in kbps.
    pub max_speed: u32,
}

impl PortDesc {
    /// Whether the port can carry traffic: neither administratively nor
    /// physically down.
    pub fn is_live(&self) -> bool {
        self.config & config::PORT_DOWN == 0 && self.state & state::LINK_DOWN == 0
    }
}

impl Repr for PortDesc {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < PORT_DESC_LENGTH {
            return Err(crate::wire::bad_len());
        }
        let name_bytes = &buffer[field::NAME];
        let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
        Ok(PortDesc {
            port_no: NetworkEndian::read_u32(&buffer[field::PORT_NO]),
            hw_addr: EthernetAddress::from_bytes(&buffer[field::HW_ADDR]),
            name: String::from_utf8_lossy(&name_bytes[..name_end]).into_owned(),
            config: NetworkEndian::read_u32(&buffer[field::CONFIG]),
            state: NetworkEndian::read_u32(&buffer[field::STATE]),
            curr: NetworkEndian::read_u32(&buffer[field::CURR]),
            advertised: NetworkEndian::read_u32(&buffer[field::ADVERTISED]),
            supported: NetworkEndian::read_u32(&buffer[field::SUPPORTED]),
            peer: NetworkEndian::read_u32(&buffer[field::PEER]),
            curr_speed: NetworkEndian::read_u32(&buffer[field::CURR_SPEED]),
            max_speed: NetworkEndian::read_u32(&buffer[field::MAX_SPEED]),
        })
    }

    fn buffer_len(&self) -> usize {
        PORT_DESC_LENGTH
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < PORT_DESC_LENGTH {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u32(&mut buffer[field::PORT_NO], self.port_no);
        for i in field::PAD1 {
            buffer[i] = 0;
        }
        buffer[field::HW_ADDR].copy_from_slice(self.hw_addr.as_bytes());
        for i in field::PAD2 {
            buffer[i] = 0;
        }
        let name = self.name.as_bytes();
        let name_len = name.len().min(15);
        buffer[field::NAME.start..field::NAME.start + name_len].copy_from_slice(&name[..name_len]);
        for i in field::NAME.start + name_len..field::NAME.end {
            buffer[i] = 0;
        }
        NetworkEndian::write_u32(&mut buffer[field::CONFIG], self.config);
        NetworkEndian::write_u32(&mut buffer[field::STATE], self.state);
        NetworkEndian::write_u32(&mut buffer[field::CURR], self.curr);
        NetworkEndian::write_u32(&mut buffer[field::ADVERTISED], self.advertised);
        NetworkEndian::write_u32(&mut buffer[field::SUPPORTED], self.supported);
        NetworkEndian::write_u32(&mut buffer[field::PEER], self.peer);
        NetworkEndian::write_u32(&mut buffer[field::CURR_SPEED], self.curr_speed);
        NetworkEndian::write_u32(&mut buffer[field::MAX_SPEED], self.max_speed);
        Ok(())
    }
}
