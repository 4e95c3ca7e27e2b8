//! Types to parse and emit queue descriptions and the queue configuration
//! request/reply pair.
//!
//! A packet queue is length-prefixed and carries a list of properties,
//! each itself length-prefixed and 8-byte aligned. 1.1 defines a single
//! property, the minimum rate.

use byteorder::{ByteOrder, NetworkEndian};

use crate::error::{BadRequestCode, OfpError};
use crate::{Error, Repr, Result};

const PROPERTY_MIN_RATE: u16 = 1;

/// A property of a packet queue.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum QueueProperty {
    /// Minimum guaranteed rate, in 1/10 of a percent. Values above 1000
    /// mean the rate is not configured.
    MinRate(u16),
}

impl Repr for QueueProperty {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < 8 {
            return Err(crate::wire::bad_len());
        }
        let property = NetworkEndian::read_u16(&buffer[0..2]);
        let length = NetworkEndian::read_u16(&buffer[2..4]) as usize;
        if length < 8 || length % 8 != 0 || length > buffer.len() {
            return Err(crate::wire::bad_len());
        }
        match property {
            PROPERTY_MIN_RATE => {
                if length != 16 {
                    return Err(crate::wire::bad_len());
                }
                Ok(QueueProperty::MinRate(NetworkEndian::read_u16(&buffer[8..10])))
            }
            _ => Err(OfpError::BadRequest(BadRequestCode::BadSubtype).into()),
        }
    }

    fn buffer_len(&self) -> usize {
        match *self {
            QueueProperty::MinRate(_) => 16,
        }
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        for byte in buffer[..self.buffer_len()].iter_mut() {
            *byte = 0;
        }
        match *self {
            QueueProperty::MinRate(rate) => {
                NetworkEndian::write_u16(&mut buffer[0..2], PROPERTY_MIN_RATE);
                NetworkEndian::write_u16(&mut buffer[2..4], 16);
                NetworkEndian::write_u16(&mut buffer[8..10], rate);
            }
        }
        Ok(())
    }
}

/// A queue attached to a port.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacketQueue {
    pub queue_id: u32,
    pub properties: Vec<QueueProperty>,
}

mod queue_field {
    use crate::field::*;

    pub const QUEUE_ID: Field = 0..4;
    pub const LENGTH: Field = 4..6;
    pub const PAD: Field = 6..8;
    pub const PROPERTIES: Rest = 8..;
}

impl Repr for PacketQueue {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < queue_field::PROPERTIES.start {
            return Err(crate::wire::bad_len());
        }
        let length = NetworkEndian::read_u16(&buffer[queue_field::LENGTH]) as usize;
        if length < queue_field::PROPERTIES.start || length % 8 != 0 || length > buffer.len() {
            return Err(crate::wire::bad_len());
        }
        let mut properties = Vec::new();
        let mut offset = queue_field::PROPERTIES.start;
        while offset < length {
            let property = QueueProperty::parse(&buffer[offset..length])?;
            offset += property.buffer_len();
            properties.push(property);
        }
        Ok(PacketQueue {
            queue_id: NetworkEndian::read_u32(&buffer[queue_field::QUEUE_ID]),
            properties,
        })
    }

    fn buffer_len(&self) -> usize {
        queue_field::PROPERTIES.start
            + self.properties.iter().map(Repr::buffer_len).sum::<usize>()
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u32(&mut buffer[queue_field::QUEUE_ID], self.queue_id);
        NetworkEndian::write_u16(&mut buffer[queue_field::LENGTH], self.buffer_len() as u16);
        for i in queue_field::PAD {
            buffer[i] = 0;
        }
        let mut offset = queue_field::PROPERTIES.start;
        for property in &self.properties {
            property.emit(&mut buffer[offset..])?;
            offset += property.buffer_len();
        }
        Ok(())
    }
}

/// Parse a whole buffer of consecutive packet queues.
pub fn parse_queues(buffer: &[u8]) -> Result<Vec<PacketQueue>> {
    let mut queues = Vec::new();
    let mut offset = 0;
    while offset < buffer.len() {
        let queue = PacketQueue::parse(&buffer[offset..])?;
        offset += queue.buffer_len();
        queues.push(queue);
    }
    Ok(queues)
}

mod field {
    use crate::field::*;

    pub const PORT: Field = 0..4;
    pub const PAD: Field = 4..8;
    pub const QUEUES: Rest = 8..;
}

/// A request for the queues configured on a port.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct QueueGetConfigRequest {
    pub port: u32,
}

impl Repr for QueueGetConfigRequest {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < field::PAD.end {
            return Err(crate::wire::bad_len());
        }
        Ok(QueueGetConfigRequest {
            port: NetworkEndian::read_u32(&buffer[field::PORT]),
        })
    }

    fn buffer_len(&self) -> usize {
        field::PAD.end
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u32(&mut buffer[field::PORT], self.port);
        for i in field::PAD {
            buffer[i] = 0;
        }
        Ok(())
    }
}

/// The queues configured on a port.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct QueueGetConfigReply {
    pub port: u32,
    pub queues: Vec<PacketQueue>,
}

impl Repr for QueueGetConfigReply {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < field::QUEUES.start {
            return Err(crate::wire::bad_len());
        }
        Ok(QueueGetConfigReply {
            port: NetworkEndian::read_u32(&buffer[field::PORT]),
            queues: parse_queues(&buffer[field::QUEUES.start..])?,
        })
    }

    fn buffer_len(&self) -> usize {
        field::QUEUES.start + self.queues.iter().map(Repr::buffer_len).sum::<usize>()
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u32(&mut buffer[field::PORT], self.port);
        for i in field::PAD {
            buffer[i] = 0;
        }
        let mut offset = field::QUEUES.start;
        for queue in &self.queues {
            queue.emit(&mut buffer[offset..])?;
            offset += queue.buffer_len();
        }
        Ok(())
    }
}
