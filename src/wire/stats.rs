//! Types to parse and emit statistics requests and replies.
//!
//! Both directions share an 8-byte stats header after the OpenFlow
//! header:
//!
//! ```no_rust
//! +--------+--------+--------+--------+
//! |      type       |      flags      |
//! +--------+--------+--------+--------+
//! |              pad (4)              |
//! +--------+--------+--------+--------+
//! |        type-specific body         |
//! +--------+--------+--------+--------+
//! ```

use byteorder::{ByteOrder, NetworkEndian};

use crate::error::{BadRequestCode, OfpError};
use crate::match_std::StandardMatch;
use crate::wire::flow_match::STANDARD_LENGTH;
use crate::wire::group_mod::{self, Bucket};
use crate::wire::instruction::{self, Instruction};
use crate::{Error, Repr, Result};

enum_with_unknown! {
    /// Statistics kinds
    pub doc enum Kind(u16) {
        /// Description of this OpenFlow switch.
        Desc = 0,
        /// Individual flow statistics.
        Flow = 1,
        /// Aggregate flow statistics.
        Aggregate = 2,
        /// Flow table statistics.
        Table = 3,
        /// Port statistics.
        Port = 4,
        /// Queue statistics for a port.
        Queue = 5,
        /// Group counter statistics.
        Group = 6,
        /// Group description statistics.
        GroupDesc = 7,
        /// Experimenter extension.
        Experimenter = 0xffff
    }
}

mod field {
    use crate::field::*;

    pub const KIND: Field = 0..2;
    pub const FLAGS: Field = 2..4;
    pub const PAD: Field = 4..8;
    pub const BODY: Rest = 8..;
}

fn bad_stat() -> Error {
    OfpError::BadRequest(BadRequestCode::BadStat).into()
}

/// Selector shared by flow and aggregate stats requests.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FlowStatsRequest {
    /// Table to read, or 0xff for all tables.
    pub table_id: u8,
    /// Restrict to flows that output to this port, unless OFPP_ANY.
    pub out_port: u32,
    /// Restrict to flows that forward to this group, unless OFPG_ANY.
    pub out_group: u32,
    pub cookie: u64,
    pub cookie_mask: u64,
    pub flow_match: StandardMatch,
}

mod flow_req_field {
    use crate::field::*;

    pub const TABLE_ID: usize = 0;
    pub const PAD1: Field = 1..4;
    pub const OUT_PORT: Field = 4..8;
    pub const OUT_GROUP: Field = 8..12;
    pub const PAD2: Field = 12..16;
    pub const COOKIE: Field = 16..24;
    pub const COOKIE_MASK: Field = 24..32;
    pub const FLOW_MATCH: Field = 32..32 + super::STANDARD_LENGTH;
}

impl Repr for FlowStatsRequest {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < flow_req_field::FLOW_MATCH.end {
            return Err(crate::wire::bad_len());
        }
        Ok(FlowStatsRequest {
            table_id: buffer[flow_req_field::TABLE_ID],
            out_port: NetworkEndian::read_u32(&buffer[flow_req_field::OUT_PORT]),
            out_group: NetworkEndian::read_u32(&buffer[flow_req_field::OUT_GROUP]),
            cookie: NetworkEndian::read_u64(&buffer[flow_req_field::COOKIE]),
            cookie_mask: NetworkEndian::read_u64(&buffer[flow_req_field::COOKIE_MASK]),
            flow_match: StandardMatch::parse(&buffer[flow_req_field::FLOW_MATCH])?,
        })
    }

    fn buffer_len(&self) -> usize {
        flow_req_field::FLOW_MATCH.end
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        buffer[flow_req_field::TABLE_ID] = self.table_id;
        for i in flow_req_field::PAD1.chain(flow_req_field::PAD2) {
            buffer[i] = 0;
        }
        NetworkEndian::write_u32(&mut buffer[flow_req_field::OUT_PORT], self.out_port);
        NetworkEndian::write_u32(&mut buffer[flow_req_field::OUT_GROUP], self.out_group);
        NetworkEndian::write_u64(&mut buffer[flow_req_field::COOKIE], self.cookie);
        NetworkEndian::write_u64(&mut buffer[flow_req_field::COOKIE_MASK], self.cookie_mask);
        self.flow_match.emit(&mut buffer[flow_req_field::FLOW_MATCH])?;
        Ok(())
    }
}

/// A statistics request.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum StatsRequest {
    Desc,
    Flow(FlowStatsRequest),
    Aggregate(FlowStatsRequest),
    Table,
    /// Port to read, or OFPP_ANY for all ports.
    Port(u32),
    /// Port and queue to read, either possibly ANY/ALL.
    Queue { port: u32, queue_id: u32 },
    /// Group to read, or OFPG_ALL for all groups.
    Group(u32),
    GroupDesc,
    Experimenter { experimenter: u32, data: Vec<u8> },
}

impl StatsRequest {
    pub fn kind(&self) -> Kind {
        match *self {
            StatsRequest::Desc => Kind::Desc,
            StatsRequest::Flow(_) => Kind::Flow,
            StatsRequest::Aggregate(_) => Kind::Aggregate,
            StatsRequest::Table => Kind::Table,
            StatsRequest::Port(_) => Kind::Port,
            StatsRequest::Queue { .. } => Kind::Queue,
            StatsRequest::Group(_) => Kind::Group,
            StatsRequest::GroupDesc => Kind::GroupDesc,
            StatsRequest::Experimenter { .. } => Kind::Experimenter,
        }
    }
}

impl Repr for StatsRequest {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < field::BODY.start {
            return Err(crate::wire::bad_len());
        }
        let kind = Kind::from(NetworkEndian::read_u16(&buffer[field::KIND]));
        let body = &buffer[field::BODY.start..];
        let request = match kind {
            Kind::Desc => StatsRequest::Desc,
            Kind::Flow => StatsRequest::Flow(FlowStatsRequest::parse(body)?),
            Kind::Aggregate => StatsRequest::Aggregate(FlowStatsRequest::parse(body)?),
            Kind::Table => StatsRequest::Table,
            Kind::Port => {
                if body.len() < 8 {
                    return Err(crate::wire::bad_len());
                }
                StatsRequest::Port(NetworkEndian::read_u32(&body[0..4]))
            }
            Kind::Queue => {
                if body.len() < 8 {
                    return Err(crate::wire::bad_len());
                }
                StatsRequest::Queue {
                    port: NetworkEndian::read_u32(&body[0..4]),
                    queue_id: NetworkEndian::read_u32(&body[4..8]),
                }
            }
            Kind::Group => {
                if body.len() < 8 {
                    return Err(crate::wire::bad_len());
                }
                StatsRequest::Group(NetworkEndian::read_u32(&body[0..4]))
            }
            Kind::GroupDesc => StatsRequest::GroupDesc,
            Kind::Experimenter => {
                if body.len() < 4 {
                    return Err(crate::wire::bad_len());
                }
                StatsRequest::Experimenter {
                    experimenter: NetworkEndian::read_u32(&body[0..4]),
                    data: body[4..].to_vec(),
                }
            }
            Kind::_Unknown(_) => return Err(bad_stat()),
        };
        Ok(request)
    }

    fn buffer_len(&self) -> usize {
        field::BODY.start
            + match *self {
                StatsRequest::Desc | StatsRequest::Table | StatsRequest::GroupDesc => 0,
                StatsRequest::Flow(ref req) | StatsRequest::Aggregate(ref req) => req.buffer_len(),
                StatsRequest::Port(_) | StatsRequest::Queue { .. } | StatsRequest::Group(_) => 8,
                StatsRequest::Experimenter { ref data, .. } => 4 + data.len(),
            }
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u16(&mut buffer[field::KIND], self.kind().into());
        NetworkEndian::write_u16(&mut buffer[field::FLAGS], 0);
        for i in field::PAD {
            buffer[i] = 0;
        }
        let body = &mut buffer[field::BODY.start..];
        match *self {
            StatsRequest::Desc | StatsRequest::Table | StatsRequest::GroupDesc => {}
            StatsRequest::Flow(ref req) | StatsRequest::Aggregate(ref req) => req.emit(body)?,
            StatsRequest::Port(port) => {
                NetworkEndian::write_u32(&mut body[0..4], port);
                NetworkEndian::write_u32(&mut body[4..8], 0);
            }
            StatsRequest::Queue { port, queue_id } => {
                NetworkEndian::write_u32(&mut body[0..4], port);
                NetworkEndian::write_u32(&mut body[4..8], queue_id);
            }
            StatsRequest::Group(group_id) => {
                NetworkEndian::write_u32(&mut body[0..4], group_id);
                NetworkEndian::write_u32(&mut body[4..8], 0);
            }
            StatsRequest::Experimenter { experimenter, ref data } => {
                NetworkEndian::write_u32(&mut body[0..4], experimenter);
                body[4..4 + data.len()].copy_from_slice(data);
            }
        }
        Ok(())
    }
}

fn emit_fixed_string(buffer: &mut [u8], value: &str) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(buffer.len() - 1);
    buffer[..len].copy_from_slice(&bytes[..len]);
    for byte in buffer[len..].iter_mut() {
        *byte = 0;
    }
}

fn parse_fixed_string(buffer: &[u8]) -> String {
    let end = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..end]).into_owned()
}

/// Description of the switch.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct DescStats {
    pub mfr_desc: String,
    pub hw_desc: String,
    pub sw_desc: String,
    pub serial_num: String,
    pub dp_desc: String,
}

const DESC_STATS_LENGTH: usize = 256 + 256 + 256 + 32 + 256;

impl Repr for DescStats {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < DESC_STATS_LENGTH {
            return Err(crate::wire::bad_len());
        }
        Ok(DescStats {
            mfr_desc: parse_fixed_string(&buffer[0..256]),
            hw_desc: parse_fixed_string(&buffer[256..512]),
            sw_desc: parse_fixed_string(&buffer[512..768]),
            serial_num: parse_fixed_string(&buffer[768..800]),
            dp_desc: parse_fixed_string(&buffer[800..1056]),
        })
    }

    fn buffer_len(&self) -> usize {
        DESC_STATS_LENGTH
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < DESC_STATS_LENGTH {
            return Err(Error::Exhausted);
        }
        emit_fixed_string(&mut buffer[0..256], &self.mfr_desc);
        emit_fixed_string(&mut buffer[256..512], &self.hw_desc);
        emit_fixed_string(&mut buffer[512..768], &self.sw_desc);
        emit_fixed_string(&mut buffer[768..800], &self.serial_num);
        emit_fixed_string(&mut buffer[800..1056], &self.dp_desc);
        Ok(())
    }
}

/// Statistics of one flow entry.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FlowStats {
    pub table_id: u8,
    pub duration_sec: u32,
    pub duration_nsec: u32,
    pub priority: u16,
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    pub cookie: u64,
    pub packet_count: u64,
    pub byte_count: u64,
    pub flow_match: StandardMatch,
    pub instructions: Vec<Instruction>,
}

mod flow_stats_field {
    use crate::field::*;

    pub const LENGTH: Field = 0..2;
    pub const TABLE_ID: usize = 2;
    pub const PAD1: usize = 3;
    pub const DURATION_SEC: Field = 4..8;
    pub const DURATION_NSEC: Field = 8..12;
    pub const PRIORITY: Field = 12..14;
    pub const IDLE_TIMEOUT: Field = 14..16;
    pub const HARD_TIMEOUT: Field = 16..18;
    pub const PAD2: Field = 18..24;
    pub const COOKIE: Field = 24..32;
    pub const PACKET_COUNT: Field = 32..40;
    pub const BYTE_COUNT: Field = 40..48;
    pub const FLOW_MATCH: Field = 48..48 + super::STANDARD_LENGTH;
    pub const INSTRUCTIONS: Rest = 136..;
}

impl Repr for FlowStats {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < flow_stats_field::INSTRUCTIONS.start {
            return Err(crate::wire::bad_len());
        }
        let length = NetworkEndian::read_u16(&buffer[flow_stats_field::LENGTH]) as usize;
        if length < flow_stats_field::INSTRUCTIONS.start || length % 8 != 0 || length > buffer.len()
        {
            return Err(crate::wire::bad_len());
        }
        Ok(FlowStats {
            table_id: buffer[flow_stats_field::TABLE_ID],
            duration_sec: NetworkEndian::read_u32(&buffer[flow_stats_field::DURATION_SEC]),
            duration_nsec: NetworkEndian::read_u32(&buffer[flow_stats_field::DURATION_NSEC]),
            priority: NetworkEndian::read_u16(&buffer[flow_stats_field::PRIORITY]),
            idle_timeout: NetworkEndian::read_u16(&buffer[flow_stats_field::IDLE_TIMEOUT]),
            hard_timeout: NetworkEndian::read_u16(&buffer[flow_stats_field::HARD_TIMEOUT]),
            cookie: NetworkEndian::read_u64(&buffer[flow_stats_field::COOKIE]),
            packet_count: NetworkEndian::read_u64(&buffer[flow_stats_field::PACKET_COUNT]),
            byte_count: NetworkEndian::read_u64(&buffer[flow_stats_field::BYTE_COUNT]),
            flow_match: StandardMatch::parse(&buffer[flow_stats_field::FLOW_MATCH])?,
            instructions: instruction::parse_list(&buffer[flow_stats_field::INSTRUCTIONS.start..length])?,
        })
    }

    fn buffer_len(&self) -> usize {
        flow_stats_field::INSTRUCTIONS.start + instruction::list_len(&self.instructions)
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u16(&mut buffer[flow_stats_field::LENGTH], self.buffer_len() as u16);
        buffer[flow_stats_field::TABLE_ID] = self.table_id;
        buffer[flow_stats_field::PAD1] = 0;
        NetworkEndian::write_u32(&mut buffer[flow_stats_field::DURATION_SEC], self.duration_sec);
        NetworkEndian::write_u32(&mut buffer[flow_stats_field::DURATION_NSEC], self.duration_nsec);
        NetworkEndian::write_u16(&mut buffer[flow_stats_field::PRIORITY], self.priority);
        NetworkEndian::write_u16(&mut buffer[flow_stats_field::IDLE_TIMEOUT], self.idle_timeout);
        NetworkEndian::write_u16(&mut buffer[flow_stats_field::HARD_TIMEOUT], self.hard_timeout);
        for i in flow_stats_field::PAD2 {
            buffer[i] = 0;
        }
        NetworkEndian::write_u64(&mut buffer[flow_stats_field::COOKIE], self.cookie);
        NetworkEndian::write_u64(&mut buffer[flow_stats_field::PACKET_COUNT], self.packet_count);
        NetworkEndian::write_u64(&mut buffer[flow_stats_field::BYTE_COUNT], self.byte_count);
        self.flow_match.emit(&mut buffer[flow_stats_field::FLOW_MATCH])?;
        instruction::emit_list(
            &self.instructions,
            &mut buffer[flow_stats_field::INSTRUCTIONS.start..],
        )?;
        Ok(())
    }
}

/// Aggregated statistics over a set of flows.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct AggregateStats {
    pub packet_count: u64,
    pub byte_count: u64,
    pub flow_count: u32,
}

impl Repr for AggregateStats {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < 24 {
            return Err(crate::wire::bad_len());
        }
        Ok(AggregateStats {
            packet_count: NetworkEndian::read_u64(&buffer[0..8]),
            byte_count: NetworkEndian::read_u64(&buffer[8..16]),
            flow_count: NetworkEndian::read_u32(&buffer[16..20]),
        })
    }

    fn buffer_len(&self) -> usize {
        24
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < 24 {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u64(&mut buffer[0..8], self.packet_count);
        NetworkEndian::write_u64(&mut buffer[8..16], self.byte_count);
        NetworkEndian::write_u32(&mut buffer[16..20], self.flow_count);
        for byte in buffer[20..24].iter_mut() {
            *byte = 0;
        }
        Ok(())
    }
}

/// Statistics of one flow table.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TableStats {
    pub table_id: u8,
    pub name: String,
    pub wildcards: u32,
    pub match_fields: u32,
    pub instructions: u32,
    pub write_actions: u32,
    pub apply_actions: u32,
    pub config: u32,
    pub max_entries: u32,
    pub active_count: u32,
    pub lookup_count: u64,
    pub matched_count: u64,
}

const TABLE_STATS_LENGTH: usize = 88;

impl Repr for TableStats {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < TABLE_STATS_LENGTH {
            return Err(crate::wire::bad_len());
        }
        Ok(TableStats {
            table_id: buffer[0],
            name: parse_fixed_string(&buffer[8..40]),
            wildcards: NetworkEndian::read_u32(&buffer[40..44]),
            match_fields: NetworkEndian::read_u32(&buffer[44..48]),
            instructions: NetworkEndian::read_u32(&buffer[48..52]),
            write_actions: NetworkEndian::read_u32(&buffer[52..56]),
            apply_actions: NetworkEndian::read_u32(&buffer[56..60]),
            config: NetworkEndian::read_u32(&buffer[60..64]),
            max_entries: NetworkEndian::read_u32(&buffer[64..68]),
            active_count: NetworkEndian::read_u32(&buffer[68..72]),
            lookup_count: NetworkEndian::read_u64(&buffer[72..80]),
            matched_count: NetworkEndian::read_u64(&buffer[80..88]),
        })
    }

    fn buffer_len(&self) -> usize {
        TABLE_STATS_LENGTH
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < TABLE_STATS_LENGTH {
            return Err(Error::Exhausted);
        }
        buffer[0] = self.table_id;
        for byte in buffer[1..8].iter_mut() {
            *byte = 0;
        }
        emit_fixed_string(&mut buffer[8..40], &self.name);
        NetworkEndian::write_u32(&mut buffer[40..44], self.wildcards);
        NetworkEndian::write_u32(&mut buffer[44..48], self.match_fields);
        NetworkEndian::write_u32(&mut buffer[48..52], self.instructions);
        NetworkEndian::write_u32(&mut buffer[52..56], self.write_actions);
        NetworkEndian::write_u32(&mut buffer[56..60], self.apply_actions);
        NetworkEndian::write_u32(&mut buffer[60..64], self.config);
        NetworkEndian::write_u32(&mut buffer[64..68], self.max_entries);
        NetworkEndian::write_u32(&mut buffer[68..72], self.active_count);
        NetworkEndian::write_u64(&mut buffer[72..80], self.lookup_count);
        NetworkEndian::write_u64(&mut buffer[80..88], self.matched_count);
        Ok(())
    }
}

/// Statistics of one port.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct PortStats {
    pub port_no: u32,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_dropped: u64,
    pub tx_dropped: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
    pub rx_frame_err: u64,
    pub rx_over_err: u64,
    pub rx_crc_err: u64,
    pub collisions: u64,
}

const PORT_STATS_LENGTH: usize = 104;

impl Repr for PortStats {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < PORT_STATS_LENGTH {
            return Err(crate::wire::bad_len());
        }
        let word = |i: usize| NetworkEndian::read_u64(&buffer[8 + i * 8..16 + i * 8]);
        Ok(PortStats {
            port_no: NetworkEndian::read_u32(&buffer[0..4]),
            rx_packets: word(0),
            tx_packets: word(1),
            rx_bytes: word(2),
            tx_bytes: word(3),
            rx_dropped: word(4),
            tx_dropped: word(5),
            rx_errors: word(6),
            tx_errors: word(7),
            rx_frame_err: word(8),
            rx_over_err: word(9),
            rx_crc_err: word(10),
            collisions: word(11),
        })
    }

    fn buffer_len(&self) -> usize {
        PORT_STATS_LENGTH
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < PORT_STATS_LENGTH {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u32(&mut buffer[0..4], self.port_no);
        for byte in buffer[4..8].iter_mut() {
            *byte = 0;
        }
        let words = [
            self.rx_packets,
            self.tx_packets,
            self.rx_bytes,
            self.tx_bytes,
            self.rx_dropped,
            self.tx_dropped,
            self.rx_errors,
            self.tx_errors,
            self.rx_frame_err,
            self.rx_over_err,
            self.rx_crc_err,
            self.collisions,
        ];
        for (i, word) in words.iter().enumerate() {
            NetworkEndian::write_u64(&mut buffer[8 + i * 8..16 + i * 8], *word);
        }
        Ok(())
    }
}

/// Statistics of one queue.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct QueueStats {
    pub port_no: u32,
    pub queue_id: u32,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
}

impl Repr for QueueStats {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < 32 {
            return Err(crate::wire::bad_len());
        }
        Ok(QueueStats {
            port_no: NetworkEndian::read_u32(&buffer[0..4]),
            queue_id: NetworkEndian::read_u32(&buffer[4..8]),
            tx_bytes: NetworkEndian::read_u64(&buffer[8..16]),
            tx_packets: NetworkEndian::read_u64(&buffer[16..24]),
            tx_errors: NetworkEndian::read_u64(&buffer[24..32]),
        })
    }

    fn buffer_len(&self) -> usize {
        32
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < 32 {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u32(&mut buffer[0..4], self.port_no);
        NetworkEndian::write_u32(&mut buffer[4..8], self.queue_id);
        NetworkEndian::write_u64(&mut buffer[8..16], self.tx_bytes);
        NetworkEndian::write_u64(&mut buffer[16..24], self.tx_packets);
        NetworkEndian::write_u64(&mut buffer[24..32], self.tx_errors);
        Ok(())
    }
}

/// Per-bucket counters within group statistics.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct BucketCounter {
    pub packet_count: u64,
    pub byte_count: u64,
}

/// Counter statistics of one group.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct GroupStats {
    pub group_id: u32,
    /// Number of flow entries that forward to this group.
    pub ref_count: u32,
    pub packet_count: u64,
    pub byte_count: u64,
    pub bucket_stats: Vec<BucketCounter>,
}

impl Repr for GroupStats {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < 32 {
            return Err(crate::wire::bad_len());
        }
        let length = NetworkEndian::read_u16(&buffer[0..2]) as usize;
        if length < 32 || length % 8 != 0 || length > buffer.len() || (length - 32) % 16 != 0 {
            return Err(crate::wire::bad_len());
        }
        let mut bucket_stats = Vec::new();
        let mut offset = 32;
        while offset < length {
            bucket_stats.push(BucketCounter {
                packet_count: NetworkEndian::read_u64(&buffer[offset..offset + 8]),
                byte_count: NetworkEndian::read_u64(&buffer[offset + 8..offset + 16]),
            });
            offset += 16;
        }
        Ok(GroupStats {
            group_id: NetworkEndian::read_u32(&buffer[4..8]),
            ref_count: NetworkEndian::read_u32(&buffer[8..12]),
            packet_count: NetworkEndian::read_u64(&buffer[16..24]),
            byte_count: NetworkEndian::read_u64(&buffer[24..32]),
            bucket_stats,
        })
    }

    fn buffer_len(&self) -> usize {
        32 + self.bucket_stats.len() * 16
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u16(&mut buffer[0..2], self.buffer_len() as u16);
        for byte in buffer[2..4].iter_mut() {
            *byte = 0;
        }
        NetworkEndian::write_u32(&mut buffer[4..8], self.group_id);
        NetworkEndian::write_u32(&mut buffer[8..12], self.ref_count);
        for byte in buffer[12..16].iter_mut() {
            *byte = 0;
        }
        NetworkEndian::write_u64(&mut buffer[16..24], self.packet_count);
        NetworkEndian::write_u64(&mut buffer[24..32], self.byte_count);
        let mut offset = 32;
        for bucket in &self.bucket_stats {
            NetworkEndian::write_u64(&mut buffer[offset..offset + 8], bucket.packet_count);
            NetworkEndian::write_u64(&mut buffer[offset + 8..offset + 16], bucket.byte_count);
            offset += 16;
        }
        Ok(())
    }
}

/// Description of one group.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct GroupDescStats {
    pub group_type: group_mod::GroupType,
    pub group_id: u32,
    pub buckets: Vec<Bucket>,
}

impl Repr for GroupDescStats {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < 8 {
            return Err(crate::wire::bad_len());
        }
        let length = NetworkEndian::read_u16(&buffer[0..2]) as usize;
        if length < 8 || length % 8 != 0 || length > buffer.len() {
            return Err(crate::wire::bad_len());
        }
        Ok(GroupDescStats {
            group_type: group_mod::GroupType::from(buffer[2]),
            group_id: NetworkEndian::read_u32(&buffer[4..8]),
            buckets: group_mod::parse_buckets(&buffer[8..length])?,
        })
    }

    fn buffer_len(&self) -> usize {
        8 + group_mod::buckets_len(&self.buckets)
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u16(&mut buffer[0..2], self.buffer_len() as u16);
        buffer[2] = self.group_type.into();
        buffer[3] = 0;
        NetworkEndian::write_u32(&mut buffer[4..8], self.group_id);
        group_mod::emit_buckets(&self.buckets, &mut buffer[8..])?;
        Ok(())
    }
}

fn parse_array<T: Repr>(buffer: &[u8]) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut offset = 0;
    while offset < buffer.len() {
        let item = T::parse(&buffer[offset..])?;
        offset += item.buffer_len();
        items.push(item);
    }
    Ok(items)
}

fn emit_array<T: Repr>(items: &[T], buffer: &mut [u8]) -> Result<()> {
    let mut offset = 0;
    for item in items {
        item.emit(&mut buffer[offset..])?;
        offset += item.buffer_len();
    }
    Ok(())
}

/// A statistics reply.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum StatsReply {
    Desc(DescStats),
    Flow(Vec<FlowStats>),
    Aggregate(AggregateStats),
    Table(Vec<TableStats>),
    Port(Vec<PortStats>),
    Queue(Vec<QueueStats>),
    Group(Vec<GroupStats>),
    GroupDesc(Vec<GroupDescStats>),
    Experimenter { experimenter: u32, data: Vec<u8> },
}

impl StatsReply {
    pub fn kind(&self) -> Kind {
        match *self {
            StatsReply::Desc(_) => Kind::Desc,
            StatsReply::Flow(_) => Kind::Flow,
            StatsReply::Aggregate(_) => Kind::Aggregate,
            StatsReply::Table(_) => Kind::Table,
            StatsReply::Port(_) => Kind::Port,
            StatsReply::Queue(_) => Kind::Queue,
            StatsReply::Group(_) => Kind::Group,
            StatsReply::GroupDesc(_) => Kind::GroupDesc,
            StatsReply::Experimenter { .. } => Kind::Experimenter,
        }
    }
}

impl Repr for StatsReply {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < field::BODY.start {
            return Err(crate::wire::bad_len());
        }
        let kind = Kind::from(NetworkEndian::read_u16(&buffer[field::KIND]));
        let body = &buffer[field::BODY.start..];
        let reply = match kind {
            Kind::Desc => StatsReply::Desc(DescStats::parse(body)?),
            Kind::Flow => StatsReply::Flow(parse_array(body)?),
            Kind::Aggregate => StatsReply::Aggregate(AggregateStats::parse(body)?),
            Kind::Table => StatsReply::Table(parse_array(body)?),
            Kind::Port => StatsReply::Port(parse_array(body)?),
            Kind::Queue => StatsReply::Queue(parse_array(body)?),
            Kind::Group => StatsReply::Group(parse_array(body)?),
            Kind::GroupDesc => StatsReply::GroupDesc(parse_array(body)?),
            Kind::Experimenter => {
                if body.len() < 4 {
                    return Err(crate::wire::bad_len());
                }
                StatsReply::Experimenter {
                    experimenter: NetworkEndian::read_u32(&body[0..4]),
                    data: body[4..].to_vec(),
                }
            }
            Kind::_Unknown(_) => return Err(bad_stat()),
        };
        Ok(reply)
    }

    fn buffer_len(&self) -> usize {
        field::BODY.start
            + match *self {
                StatsReply::Desc(ref stats) => stats.buffer_len(),
                StatsReply::Flow(ref stats) => stats.iter().map(Repr::buffer_len).sum(),
                StatsReply::Aggregate(ref stats) => stats.buffer_len(),
                StatsReply::Table(ref stats) => stats.iter().map(Repr::buffer_len).sum(),
                StatsReply::Port(ref stats) => stats.iter().map(Repr::buffer_len).sum(),
                StatsReply::Queue(ref stats) => stats.iter().map(Repr::buffer_len).sum(),
                StatsReply::Group(ref stats) => stats.iter().map(Repr::buffer_len).sum(),
                StatsReply::GroupDesc(ref stats) => stats.iter().map(Repr::buffer_len).sum(),
                StatsReply::Experimenter { ref data, .. } => 4 + data.len(),
            }
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        NetworkEndian::write_u16(&mut buffer[field::KIND], self.kind().into());
        NetworkEndian::write_u16(&mut buffer[field::FLAGS], 0);
        for i in field::PAD {
            buffer[i] = 0;
        }
        let body = &mut buffer[field::BODY.start..];
        match *self {
            StatsReply::Desc(ref stats) => stats.emit(body)?,
            StatsReply::Flow(ref stats) => emit_array(stats, body)?,
            StatsReply::Aggregate(ref stats) => stats.emit(body)?,
            StatsReply::Table(ref stats) => emit_array(stats, body)?,
            StatsReply::Port(ref stats) => emit_array(stats, body)?,
            StatsReply::Queue(ref stats) => emit_array(stats, body)?,
            StatsReply::Group(ref stats) => emit_array(stats, body)?,
            StatsReply::GroupDesc(ref stats) => emit_array(stats, body)?,
            StatsReply::Experimenter { experimenter, ref data } => {
                NetworkEndian::write_u32(&mut body[0..4], experimenter);
                body[4..4 + data.len()].copy_from_slice(data);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::action::Action;

    #[test]
    fn test_flow_request_round_trip() {
        let request = StatsRequest::Flow(FlowStatsRequest {
            table_id: 0xff,
            out_port: u32::from(crate::PortNumber::Any),
            out_group: crate::GroupNumber::ANY,
            cookie: 0,
            cookie_mask: 0,
            flow_match: StandardMatch::any(),
        });
        let mut bytes = vec![0; request.buffer_len()];
        request.emit(&mut bytes).unwrap();
        assert_eq!(StatsRequest::parse(&bytes).unwrap(), request);
    }

    #[test]
    fn test_flow_stats_round_trip() {
        let reply = StatsReply::Flow(vec![FlowStats {
            table_id: 0,
            duration_sec: 10,
            duration_nsec: 0,
            priority: 100,
            idle_timeout: 0,
            hard_timeout: 0,
            cookie: 1,
            packet_count: 5,
            byte_count: 300,
            flow_match: StandardMatch::any(),
            instructions: vec![Instruction::ApplyActions(vec![Action::Output {
                port: 2,
                max_len: 0,
            }])],
        }]);
        let mut bytes = vec![0; reply.buffer_len()];
        reply.emit(&mut bytes).unwrap();
        assert_eq!(StatsReply::parse(&bytes).unwrap(), reply);
    }

    #[test]
    fn test_group_stats_round_trip() {
        let reply = StatsReply::Group(vec![GroupStats {
            group_id: 7,
            ref_count: 1,
            packet_count: 2,
            byte_count: 120,
            bucket_stats: vec![BucketCounter { packet_count: 2, byte_count: 120 }],
        }]);
        let mut bytes = vec![0; reply.buffer_len()];
        reply.emit(&mut bytes).unwrap();
        assert_eq!(StatsReply::parse(&bytes).unwrap(), reply);
    }

    #[test]
    fn test_desc_round_trip() {
        let reply = StatsReply::Desc(DescStats {
            mfr_desc: "ofdp".to_owned(),
            hw_desc: "none".to_owned(),
            sw_desc: "0.1.0".to_owned(),
            serial_num: "1".to_owned(),
            dp_desc: "test datapath".to_owned(),
        });
        let mut bytes = vec![0; reply.buffer_len()];
        reply.emit(&mut bytes).unwrap();
        assert_eq!(StatsReply::parse(&bytes).unwrap(), reply);
    }

    #[test]
    fn test_unknown_stats_kind() {
        let mut bytes = vec![0; 8];
        bytes[1] = 0x55;
        assert_eq!(StatsRequest::parse(&bytes), Err(bad_stat()));
    }
}
