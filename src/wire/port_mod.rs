//! Types to parse and emit port modification messages.

use byteorder::{ByteOrder, NetworkEndian};
use smoltcp::wire::EthernetAddress;

use crate::error::{BadActionCode, OfpError};
use crate::{Error, PortNumber, Repr, Result};

mod field {
    use crate::field::*;

    pub const PORT_NO: Field = 0..4;
    pub const PAD1: Field = 4..8;
    pub const HW_ADDR: Field = 8..14;
    pub const PAD2: Field = 14..16;
    pub const CONFIG: Field = 16..20;
    pub const MASK: Field = 20..24;
    pub const ADVERTISE: Field = 24..28;
    pub const PAD3: Field = 28..32;
}

/// A request to change the administrative state of a port.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PortMod {
    pub port_no: u32,
    /// Must match the hardware address of the port, as a sanity check.
    pub hw_addr: EthernetAddress,
    pub config: u32,
    /// Bits of `config` to change.
    pub mask: u32,
    /// Features to advertise; zero leaves them unchanged.
    pub advertise: u32,
}

impl Repr for PortMod {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < field::PAD3.end {
            return Err(crate::wire::bad_len());
        }
        let port_no = NetworkEndian::read_u32(&buffer[field::PORT_NO]);
        match PortNumber::from(port_no) {
            PortNumber::Regular(p) if p != 0 && p <= PortNumber::MAX => {}
            PortNumber::Max => {}
            _ => return Err(OfpError::BadAction(BadActionCode::BadArgument).into()),
        }
        Ok(PortMod {
            port_no,
            hw_addr: EthernetAddress::from_bytes(&buffer[field::HW_ADDR]),
            config: NetworkEndian::read_u32(&buffer[field::CONFIG]),
            mask: NetworkEndian::read_u32(&buffer[field::MASK]),
            advertise: NetworkEndian::read_u32(&buffer[field::ADVERTISE]),
        })
    }

    fn buffer_len(&self) -> usize {
        field::PAD3.end
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u32(&mut buffer[field::PORT_NO], self.port_no);
        buffer[field::HW_ADDR].copy_from_slice(self.hw_addr.as_bytes());
        NetworkEndian::write_u32(&mut buffer[field::CONFIG], self.config);
        NetworkEndian::write_u32(&mut buffer[field::MASK], self.mask);
        NetworkEndian::write_u32(&mut buffer[field::ADVERTISE], self.advertise);
        for i in field::PAD1.chain(field::PAD2).chain(field::PAD3) {
            buffer[i] = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::port_desc::config;

    #[test]
    fn test_round_trip() {
        let port_mod = PortMod {
            port_no: 2,
            hw_addr: EthernetAddress([2, 0, 0, 0, 0, 2]),
            config: config::NO_FWD,
            mask: config::NO_FWD,
            advertise: 0,
        };
        let mut bytes = [0xff; 32];
        port_mod.emit(&mut bytes).unwrap();
        assert_eq!(PortMod::parse(&bytes).unwrap(), port_mod);
    }

    #[test]
    fn test_reserved_port_rejected() {
        let port_mod = PortMod {
            port_no: u32::from(PortNumber::Flood),
            hw_addr: EthernetAddress([0; 6]),
            config: 0,
            mask: 0,
            advertise: 0,
        };
        let mut bytes = [0; 32];
        port_mod.emit(&mut bytes).unwrap();
        assert_eq!(
            PortMod::parse(&bytes),
            Err(OfpError::BadAction(BadActionCode::BadArgument).into())
        );
    }
}
