//! Types to parse and emit features replies.
//!
//! ```no_rust
//! +--------+--------+--------+--------+
//! |          datapath_id (8)          |
//! +--------+--------+--------+--------+
//! |             n_buffers             |
//! +--------+--------+--------+--------+
//! |n_tables|         pad (3)          |
//! +--------+--------+--------+--------+
//! |           capabilities            |
//! +--------+--------+--------+--------+
//! |             reserved              |
//! +--------+--------+--------+--------+
//! |       ports (64 bytes each)       |
//! +--------+--------+--------+--------+
//! ```

use byteorder::{ByteOrder, NetworkEndian};

use crate::wire::port_desc::{PortDesc, PORT_DESC_LENGTH};
use crate::{Error, Repr, Result};

/// Datapath capability bits.
pub mod capabilities {
    pub const FLOW_STATS: u32 = 1 << 0;
    pub const TABLE_STATS: u32 = 1 << 1;
    pub const PORT_STATS: u32 = 1 << 2;
    pub const GROUP_STATS: u32 = 1 << 3;
    pub const IP_REASM: u32 = 1 << 5;
    pub const QUEUE_STATS: u32 = 1 << 6;
    pub const ARP_MATCH_IP: u32 = 1 << 7;
}

mod field {
    use crate::field::*;

    pub const DATAPATH_ID: Field = 0..8;
    pub const N_BUFFERS: Field = 8..12;
    pub const N_TABLES: usize = 12;
    pub const PAD: Field = 13..16;
    pub const CAPABILITIES: Field = 16..20;
    pub const RESERVED: Field = 20..24;
    pub const PORTS: Rest = 24..;
}

/// The switch side of the feature handshake.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FeaturesReply {
    pub datapath_id: u64,
    pub n_buffers: u32,
    pub n_tables: u8,
    pub capabilities: u32,
    pub reserved: u32,
    pub ports: Vec<PortDesc>,
}

impl Repr for FeaturesReply {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < field::PORTS.start
            || (buffer.len() - field::PORTS.start) % PORT_DESC_LENGTH != 0
        {
            return Err(crate::wire::bad_len());
        }
        let mut ports = Vec::new();
        for chunk in buffer[field::PORTS.start..].chunks(PORT_DESC_LENGTH) {
            ports.push(PortDesc::parse(chunk)?);
        }
        Ok(FeaturesReply {
            datapath_id: NetworkEndian::read_u64(&buffer[field::DATAPATH_ID]),
            n_buffers: NetworkEndian::read_u32(&buffer[field::N_BUFFERS]),
            n_tables: buffer[field::N_TABLES],
            capabilities: NetworkEndian::read_u32(&buffer[field::CAPABILITIES]),
            reserved: NetworkEndian::read_u32(&buffer[field::RESERVED]),
            ports,
        })
    }

    fn buffer_len(&self) -> usize {
        field::PORTS.start + self.ports.len() * PORT_DESC_LENGTH
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u64(&mut buffer[field::DATAPATH_ID], self.datapath_id);
        NetworkEndian::write_u32(&mut buffer[field::N_BUFFERS], self.n_buffers);
        buffer[field::N_TABLES] = self.n_tables;
        for i in field::PAD {
            buffer[i] = 0;
        }
        NetworkEndian::write_u32(&mut buffer[field::CAPABILITIES], self.capabilities);
        NetworkEndian::write_u32(&mut buffer[field::RESERVED], self.reserved);
        let mut offset = field::PORTS.start;
        for port in &self.ports {
            port.emit(&mut buffer[offset..offset + PORT_DESC_LENGTH])?;
            offset += PORT_DESC_LENGTH;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use smoltcp::wire::EthernetAddress;

    #[test]
    fn test_round_trip() {
        let reply = FeaturesReply {
            datapath_id: 0x0000_0000_cafe_f00d,
            n_buffers: 256,
            n_tables: 16,
            capabilities: capabilities::FLOW_STATS | capabilities::TABLE_STATS,
            reserved: 0,
            ports: vec![PortDesc {
                port_no: 1,
                hw_addr: EthernetAddress([2, 0, 0, 0, 0, 1]),
                name: "eth1".to_owned(),
                config: 0,
                state: 0,
                curr: 0,
                advertised: 0,
                supported: 0,
                peer: 0,
                curr_speed: 0,
                max_speed: 0,
            }],
        };
        let mut bytes = vec![0; reply.buffer_len()];
        reply.emit(&mut bytes).unwrap();
        assert_eq!(FeaturesReply::parse(&bytes).unwrap(), reply);
    }
}
