//! Types to parse and emit group table modification messages.
//!
//! ```no_rust
//! +--------+--------+--------+--------+
//! |    command      |  type  |  pad   |
//! +--------+--------+--------+--------+
//! |             group_id              |
//! +--------+--------+--------+--------+
//! |              buckets              |
//! +--------+--------+--------+--------+
//! ```
//!
//! Each bucket is length-prefixed and 8-byte aligned:
//!
//! ```no_rust
//! +--------+--------+--------+--------+
//! |    length       |     weight      |
//! +--------+--------+--------+--------+
//! |             watch_port            |
//! +--------+--------+--------+--------+
//! |            watch_group            |
//! +--------+--------+--------+--------+
//! |              pad (4)              |
//! +--------+--------+--------+--------+
//! |              actions              |
//! +--------+--------+--------+--------+
//! ```

use byteorder::{ByteOrder, NetworkEndian};

use crate::error::{BadRequestCode, GroupModFailedCode, OfpError};
use crate::wire::action::{self, Action};
use crate::{Error, GroupNumber, Repr, Result};

enum_with_unknown! {
    /// Group mod commands
    pub doc enum Command(u16) {
        /// New group.
        Add = 0,
        /// Modify all matching groups.
        Modify = 1,
        /// Delete all matching groups.
        Delete = 2
    }
}

enum_with_unknown! {
    /// Group types
    pub doc enum GroupType(u8) {
        /// All (multicast/broadcast) group: every bucket is executed on a
        /// clone of the packet.
        All = 0,
        /// Select group: one bucket is chosen per packet.
        Select = 1,
        /// Indirect group: a single bucket.
        Indirect = 2,
        /// Fast failover group: the first live bucket is executed.
        FastFailover = 3
    }
}

/// First group type value reserved for experimenters.
const GROUP_TYPE_EXPERIMENTER: u8 = 128;

/// A bucket: a weighted, optionally watched action list within a group.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Bucket {
    /// Relative share of the traffic, for select groups. Zero excludes
    /// the bucket from selection.
    pub weight: u16,
    /// Port whose liveness gates this bucket, for fast failover groups.
    pub watch_port: u32,
    /// Group whose liveness gates this bucket, for fast failover groups.
    pub watch_group: u32,
    pub actions: Vec<Action>,
}

mod bucket_field {
    use crate::field::*;

    pub const LENGTH: Field = 0..2;
    pub const WEIGHT: Field = 2..4;
    pub const WATCH_PORT: Field = 4..8;
    pub const WATCH_GROUP: Field = 8..12;
    pub const PAD: Field = 12..16;
    pub const ACTIONS: Rest = 16..;
}

impl Repr for Bucket {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < bucket_field::ACTIONS.start {
            return Err(crate::wire::bad_len());
        }
        let length = NetworkEndian::read_u16(&buffer[bucket_field::LENGTH]) as usize;
        if length < bucket_field::ACTIONS.start || length % 8 != 0 || length > buffer.len() {
            return Err(crate::wire::bad_len());
        }
        Ok(Bucket {
            weight: NetworkEndian::read_u16(&buffer[bucket_field::WEIGHT]),
            watch_port: NetworkEndian::read_u32(&buffer[bucket_field::WATCH_PORT]),
            watch_group: NetworkEndian::read_u32(&buffer[bucket_field::WATCH_GROUP]),
            actions: action::parse_list(&buffer[bucket_field::ACTIONS.start..length])?,
        })
    }

    fn buffer_len(&self) -> usize {
        bucket_field::ACTIONS.start + action::list_len(&self.actions)
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u16(&mut buffer[bucket_field::LENGTH], self.buffer_len() as u16);
        NetworkEndian::write_u16(&mut buffer[bucket_field::WEIGHT], self.weight);
        NetworkEndian::write_u32(&mut buffer[bucket_field::WATCH_PORT], self.watch_port);
        NetworkEndian::write_u32(&mut buffer[bucket_field::WATCH_GROUP], self.watch_group);
        for i in bucket_field::PAD {
            buffer[i] = 0;
        }
        action::emit_list(&self.actions, &mut buffer[bucket_field::ACTIONS.start..])?;
        Ok(())
    }
}

/// Parse a whole buffer of consecutive buckets.
pub fn parse_buckets(buffer: &[u8]) -> Result<Vec<Bucket>> {
    let mut buckets = Vec::new();
    let mut offset = 0;
    while offset < buffer.len() {
        let bucket = Bucket::parse(&buffer[offset..])?;
        offset += bucket.buffer_len();
        buckets.push(bucket);
    }
    Ok(buckets)
}

/// Return the emitted length of a list of buckets.
pub fn buckets_len(buckets: &[Bucket]) -> usize {
    buckets.iter().map(Repr::buffer_len).sum()
}

/// Emit consecutive buckets into a buffer.
pub fn emit_buckets(buckets: &[Bucket], buffer: &mut [u8]) -> Result<()> {
    let mut offset = 0;
    for bucket in buckets {
        bucket.emit(&mut buffer[offset..])?;
        offset += bucket.buffer_len();
    }
    Ok(())
}

mod field {
    use crate::field::*;

    pub const COMMAND: Field = 0..2;
    pub const GROUP_TYPE: usize = 2;
    pub const PAD: usize = 3;
    pub const GROUP_ID: Field = 4..8;
    pub const BUCKETS: Rest = 8..;
}

/// A group table modification.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct GroupMod {
    pub command: Command,
    pub group_type: GroupType,
    pub group_id: u32,
    pub buckets: Vec<Bucket>,
}

impl Repr for GroupMod {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < field::BUCKETS.start {
            return Err(crate::wire::bad_len());
        }
        let command = Command::from(NetworkEndian::read_u16(&buffer[field::COMMAND]));
        if let Command::_Unknown(_) = command {
            return Err(OfpError::BadRequest(BadRequestCode::BadSubtype).into());
        }
        let raw_type = buffer[field::GROUP_TYPE];
        let group_type = GroupType::from(raw_type);
        if let GroupType::_Unknown(t) = group_type {
            if t < GROUP_TYPE_EXPERIMENTER {
                return Err(OfpError::BadRequest(BadRequestCode::BadSubtype).into());
            }
        }
        let group_id = NetworkEndian::read_u32(&buffer[field::GROUP_ID]);
        let delete_all = command == Command::Delete && group_id == GroupNumber::ALL;
        if group_id > GroupNumber::MAX && !delete_all {
            return Err(OfpError::GroupModFailed(GroupModFailedCode::InvalidGroup).into());
        }
        Ok(GroupMod {
            command,
            group_type,
            group_id,
            buckets: parse_buckets(&buffer[field::BUCKETS.start..])?,
        })
    }

    fn buffer_len(&self) -> usize {
        field::BUCKETS.start + buckets_len(&self.buckets)
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u16(&mut buffer[field::COMMAND], self.command.into());
        buffer[field::GROUP_TYPE] = self.group_type.into();
        buffer[field::PAD] = 0;
        NetworkEndian::write_u32(&mut buffer[field::GROUP_ID], self.group_id);
        emit_buckets(&self.buckets, &mut buffer[field::BUCKETS.start..])?;
        Ok(())
    }
}
