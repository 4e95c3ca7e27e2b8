//! The datapath: flow tables, group table, switch configuration, and
//! the handlers that tie the wire codec to the forwarding plane.
//!
//! The datapath is single threaded and run-to-completion: every control
//! message and every packet is processed synchronously, so a flow-mod is
//! fully applied before the next packet looks at the tables. The
//! machinery it does not own (port I/O, packet buffering, the control
//! channel transport, experimenter extensions) is reached through the
//! [`Ports`], [`Buffers`], [`ControlChannel`] and
//! [`exp::ExperimenterHooks`] traits.

use std::time::Instant;

use log::{debug, warn};

pub mod action_set;
pub mod actions;
pub mod buffers;
pub mod exp;
pub mod flow_entry;
pub mod flow_table;
pub mod group_table;
pub mod packet;
pub mod pipeline;
pub mod ports;

pub use self::buffers::{Buffers, NoBuffers};
pub use self::group_table::GroupTable;
pub use self::packet::Packet;
pub use self::pipeline::{Pipeline, PIPELINE_TABLES};
pub use self::ports::Ports;

use self::flow_entry::FlowEntry;
use self::group_table::{GroupEntry, SelectPolicy};
use crate::error::{BadRequestCode, GroupModFailedCode, OfpError, PortModFailedCode, TableModFailedCode};
use crate::frame::FrameBuf;
use crate::wire::action::Action;
use crate::wire::features::{capabilities, FeaturesReply};
use crate::wire::flow_mod::{Command, FlowMod, TABLE_ALL};
use crate::wire::flow_removed;
use crate::wire::group_mod::{self, GroupMod, GroupType};
use crate::wire::instruction::Instruction;
use crate::wire::packet_in::{PacketIn, Reason};
use crate::wire::packet_out::PacketOut;
use crate::wire::port_desc::config as port_config;
use crate::wire::port_mod::PortMod;
use crate::wire::queue::{QueueGetConfigReply, QueueGetConfigRequest};
use crate::wire::stats::{AggregateStats, DescStats, StatsReply, StatsRequest};
use crate::wire::switch_config::{flags, SwitchConfig};
use crate::wire::table_mod::TableMod;
use crate::wire::{Body, ErrorMsg, ExperimenterMsg, Message, NO_BUFFER};
use crate::{Error, GroupNumber, PortNumber, Result};

/// Capabilities advertised in the features reply.
pub const CAPABILITIES: u32 = capabilities::FLOW_STATS
    | capabilities::TABLE_STATS
    | capabilities::PORT_STATS
    | capabilities::GROUP_STATS
    | capabilities::QUEUE_STATS
    | capabilities::ARP_MATCH_IP;

/// Opaque handle identifying the control-channel peer a request came
/// from, echoed back with the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sender(pub u64);

/// The outbound side of the control channel. Replies carry the sender
/// of the request; unsolicited messages (packet-in, flow-removed) carry
/// none.
pub trait ControlChannel {
    fn send(&mut self, sender: Option<Sender>, msg: &Message);
}

/// The switch datapath.
pub struct Datapath<P: Ports, B: Buffers, C: ControlChannel> {
    pub id: u64,
    pub config: SwitchConfig,
    pub pipeline: Pipeline,
    pub groups: GroupTable,
    pub ports: P,
    pub buffers: B,
    pub channel: C,
    pub hooks: Option<Box<dyn exp::ExperimenterHooks>>,
    desc: DescStats,
}

impl<P: Ports, B: Buffers, C: ControlChannel> Datapath<P, B, C> {
    pub fn new(id: u64, ports: P, buffers: B, channel: C) -> Datapath<P, B, C> {
        Datapath {
            id,
            config: SwitchConfig::default(),
            pipeline: Pipeline::new(),
            groups: GroupTable::new(),
            ports,
            buffers,
            channel,
            hooks: None,
            desc: DescStats {
                mfr_desc: "ofdp".to_owned(),
                hw_desc: "software datapath".to_owned(),
                sw_desc: env!("CARGO_PKG_VERSION").to_owned(),
                serial_num: String::new(),
                dp_desc: String::new(),
            },
        }
    }

    // ------------------------------------------------------------------
    // control channel
    // ------------------------------------------------------------------

    /// Decode and handle one control message; any failure is reported
    /// back to the sender as an OFPT_ERROR carrying the request bytes.
    pub fn handle_message(&mut self, bytes: &[u8], sender: Sender) {
        let xid = crate::wire::Packet::new_checked(bytes)
            .map(|packet| packet.xid())
            .unwrap_or(0);
        let outcome = Message::from_bytes(bytes).and_then(|msg| self.dispatch(msg, sender));
        if let Err(err) = outcome {
            match err {
                Error::Ofp(error) => {
                    debug!("request failed: {}", error);
                    self.send(sender, xid, Body::Error(ErrorMsg::new(error, bytes)));
                }
                Error::Exhausted => warn!("internal emit failure while handling a request"),
            }
        }
    }

    fn send(&mut self, sender: Sender, xid: u32, body: Body) {
        self.channel.send(Some(sender), &Message::new(xid, body));
    }

    fn dispatch(&mut self, msg: Message, sender: Sender) -> Result<()> {
        let xid = msg.xid;
        match msg.body {
            Body::Hello => Ok(()),
            Body::Error(err) => {
                warn!("received error from controller: {}", err.error);
                Ok(())
            }
            Body::EchoRequest(data) => {
                self.send(sender, xid, Body::EchoReply(data));
                Ok(())
            }
            Body::EchoReply(_) => Ok(()),
            Body::Experimenter(exp_msg) => self.handle_experimenter(exp_msg, sender, xid),
            Body::FeaturesRequest => {
                let reply = FeaturesReply {
                    datapath_id: self.id,
                    n_buffers: self.buffers.capacity(),
                    n_tables: PIPELINE_TABLES as u8,
                    capabilities: CAPABILITIES,
                    reserved: 0,
                    ports: self.ports.list(),
                };
                self.send(sender, xid, Body::FeaturesReply(reply));
                Ok(())
            }
            Body::GetConfigRequest => {
                let config = self.config;
                self.send(sender, xid, Body::GetConfigReply(config));
                Ok(())
            }
            Body::SetConfig(config) => {
                self.config = config;
                Ok(())
            }
            Body::PacketOut(msg) => self.handle_packet_out(msg),
            Body::FlowMod(msg) => self.handle_flow_mod(msg),
            Body::GroupMod(msg) => self.handle_group_mod(msg),
            Body::PortMod(msg) => self.handle_port_mod(msg),
            Body::TableMod(msg) => self.handle_table_mod(msg),
            Body::StatsRequest(req) => self.handle_stats_request(req, sender, xid),
            Body::BarrierRequest => {
                // handlers are synchronous, nothing to wait for
                self.send(sender, xid, Body::BarrierReply);
                Ok(())
            }
            Body::QueueGetConfigRequest(req) => self.handle_queue_get_config(req, sender, xid),
            // replies are not expected on the switch side
            Body::FeaturesReply(_)
            | Body::GetConfigReply(_)
            | Body::PacketIn(_)
            | Body::FlowRemoved(_)
            | Body::PortStatus(_)
            | Body::StatsReply(_)
            | Body::BarrierReply
            | Body::QueueGetConfigReply(_) => {
                Err(OfpError::BadRequest(BadRequestCode::BadType).into())
            }
        }
    }

    fn handle_experimenter(
        &mut self,
        msg: ExperimenterMsg,
        sender: Sender,
        xid: u32,
    ) -> Result<()> {
        let mut hooks = match self.hooks.take() {
            Some(hooks) => hooks,
            None => return Err(OfpError::BadRequest(BadRequestCode::BadExperimenter).into()),
        };
        let outcome = hooks.message(&msg, sender);
        self.hooks = Some(hooks);
        if let Some(mut reply) = outcome? {
            reply.xid = xid;
            self.channel.send(Some(sender), &reply);
        }
        Ok(())
    }

    fn handle_flow_mod(&mut self, msg: FlowMod) -> Result<()> {
        for instruction in &msg.instructions {
            if let Some(list) = instruction.actions() {
                self.validate_actions(list, None)?;
            }
        }
        let now = Instant::now();
        let removed = self.pipeline.flow_mod(&msg, now)?;
        self.notify_removed(removed, now);

        let applies = matches!(
            msg.command,
            Command::Add | Command::Modify | Command::ModifyStrict
        );
        if applies && msg.buffer_id != NO_BUFFER {
            // run the buffered packet through the updated pipeline
            match self.buffers.retrieve(msg.buffer_id) {
                Some(pkt) => self.process_packet(pkt),
                None => warn!("the buffer flow_mod referred to was empty ({})", msg.buffer_id),
            }
        }
        Ok(())
    }

    fn handle_group_mod(&mut self, msg: GroupMod) -> Result<()> {
        let candidate = if msg.command == group_mod::Command::Delete {
            None
        } else {
            Some(msg.group_id)
        };
        for bucket in &msg.buckets {
            self.validate_actions(&bucket.actions, candidate)?;
        }
        self.groups.group_mod(&msg)
    }

    fn handle_port_mod(&mut self, msg: PortMod) -> Result<()> {
        {
            let desc = self
                .ports
                .lookup(msg.port_no)
                .ok_or(Error::Ofp(OfpError::PortModFailed(PortModFailedCode::BadPort)))?;
            if desc.hw_addr != msg.hw_addr {
                return Err(OfpError::PortModFailed(PortModFailedCode::BadHwAddr).into());
            }
        }
        self.ports.apply_mod(&msg)
    }

    fn handle_table_mod(&mut self, msg: TableMod) -> Result<()> {
        if msg.table_id == TABLE_ALL {
            for table in self.pipeline.tables.iter_mut() {
                table.config = msg.config;
            }
            return Ok(());
        }
        match self.pipeline.table_mut(msg.table_id) {
            Some(table) => {
                table.config = msg.config;
                Ok(())
            }
            None => Err(OfpError::TableModFailed(TableModFailedCode::BadTable).into()),
        }
    }

    fn handle_stats_request(
        &mut self,
        req: StatsRequest,
        sender: Sender,
        xid: u32,
    ) -> Result<()> {
        let now = Instant::now();
        let reply = match req {
            StatsRequest::Desc => StatsReply::Desc(self.desc.clone()),
            StatsRequest::Flow(req) => {
                let mut out = Vec::new();
                for table in self.selected_tables(req.table_id)? {
                    table.stats(&req, now, &mut out);
                }
                StatsReply::Flow(out)
            }
            StatsRequest::Aggregate(req) => {
                let mut agg = AggregateStats::default();
                for table in self.selected_tables(req.table_id)? {
                    table.aggregate(&req, &mut agg);
                }
                StatsReply::Aggregate(agg)
            }
            StatsRequest::Table => StatsReply::Table(
                self.pipeline
                    .tables
                    .iter()
                    .map(|table| table.table_stats())
                    .collect(),
            ),
            StatsRequest::Port(port_no) => StatsReply::Port(self.ports.port_stats(port_no)),
            StatsRequest::Queue { port, queue_id } => {
                StatsReply::Queue(self.ports.queue_stats(port, queue_id))
            }
            StatsRequest::Group(group_id) => {
                let mut out = Vec::new();
                if group_id == GroupNumber::ALL {
                    for entry in self.groups.iter() {
                        out.push(entry.stats(self.pipeline.count_group_refs(entry.group_id)));
                    }
                } else {
                    match self.groups.get(group_id) {
                        Some(entry) => {
                            out.push(entry.stats(self.pipeline.count_group_refs(group_id)))
                        }
                        None => {
                            return Err(OfpError::GroupModFailed(
                                GroupModFailedCode::UnknownGroup,
                            )
                            .into());
                        }
                    }
                }
                StatsReply::Group(out)
            }
            StatsRequest::GroupDesc => {
                StatsReply::GroupDesc(self.groups.iter().map(GroupEntry::desc).collect())
            }
            StatsRequest::Experimenter { .. } => {
                return Err(OfpError::BadRequest(BadRequestCode::BadExperimenter).into());
            }
        };
        self.send(sender, xid, Body::StatsReply(reply));
        Ok(())
    }

    fn selected_tables(&self, table_id: u8) -> Result<Vec<&flow_table::FlowTable>> {
        if table_id == TABLE_ALL {
            Ok(self.pipeline.tables.iter().collect())
        } else {
            match self.pipeline.table(table_id) {
                Some(table) => Ok(vec![table]),
                None => Err(OfpError::BadRequest(BadRequestCode::BadTableId).into()),
            }
        }
    }

    fn handle_queue_get_config(
        &mut self,
        req: QueueGetConfigRequest,
        sender: Sender,
        xid: u32,
    ) -> Result<()> {
        match PortNumber::from(req.port) {
            PortNumber::Regular(_) | PortNumber::Max => {
                if self.ports.lookup(req.port).is_none() {
                    return Err(OfpError::QueueOpFailed(
                        crate::error::QueueOpFailedCode::BadPort,
                    )
                    .into());
                }
            }
            _ => {
                return Err(
                    OfpError::QueueOpFailed(crate::error::QueueOpFailedCode::BadPort).into(),
                );
            }
        }
        let reply = QueueGetConfigReply {
            port: req.port,
            queues: self.ports.queue_config(req.port),
        };
        self.send(sender, xid, Body::QueueGetConfigReply(reply));
        Ok(())
    }

    fn handle_packet_out(&mut self, msg: PacketOut) -> Result<()> {
        self.validate_actions(&msg.actions, None)?;
        let mut pkt = if msg.buffer_id != NO_BUFFER {
            match self.buffers.retrieve(msg.buffer_id) {
                Some(mut pkt) => {
                    pkt.in_port = msg.in_port;
                    pkt.packet_out = true;
                    pkt
                }
                None => {
                    return Err(OfpError::BadRequest(BadRequestCode::BufferUnknown).into());
                }
            }
        } else {
            Packet::new_packet_out(FrameBuf::new(&msg.data), msg.in_port)
        };
        self.execute_action_list(&mut pkt, &msg.actions);
        Ok(())
    }

    /// Reject actions naming ports or groups that do not exist.
    /// `candidate_group` allows a group-mod to reference the group it is
    /// itself creating; the loop check rules on self-references.
    fn validate_actions(&self, list: &[Action], candidate_group: Option<u32>) -> Result<()> {
        for action in list {
            match *action {
                Action::Output { port, .. } => {
                    if port <= PortNumber::MAX && self.ports.lookup(port).is_none() {
                        warn!("output action for invalid port ({})", port);
                        return Err(OfpError::BadAction(
                            crate::error::BadActionCode::BadOutPort,
                        )
                        .into());
                    }
                }
                Action::Group(group) => {
                    if group <= GroupNumber::MAX
                        && candidate_group != Some(group)
                        && !self.groups.contains(group)
                    {
                        warn!("group action for invalid group ({})", group);
                        return Err(OfpError::BadAction(
                            crate::error::BadActionCode::BadOutGroup,
                        )
                        .into());
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn notify_removed(&mut self, removed: Vec<(u8, FlowEntry, flow_removed::Reason)>, now: Instant) {
        for (table_id, entry, reason) in removed {
            if entry.send_flow_rem {
                let body = Body::FlowRemoved(entry.to_flow_removed(table_id, reason, now));
                self.channel.send(None, &Message::new(0, body));
            }
        }
    }

    /// Expire flow entries; called periodically by the event loop.
    pub fn timeout(&mut self, now: Instant) {
        let expired = self.pipeline.expire(now);
        self.notify_removed(expired, now);
    }

    /// Announce a port change to the controller. Called by the machinery
    /// that owns the ports.
    pub fn notify_port_status(&mut self, status: crate::wire::PortStatus) {
        self.channel.send(None, &Message::new(0, Body::PortStatus(status)));
    }

    // ------------------------------------------------------------------
    // packet path
    // ------------------------------------------------------------------

    /// Entry point for a frame received on a port.
    pub fn process_frame(&mut self, frame: &[u8], in_port: u32) {
        let pkt = Packet::new(FrameBuf::new(frame), in_port);
        self.process_packet(pkt);
    }

    /// Drive a packet through the pipeline, starting at table 0.
    pub fn process_packet(&mut self, mut pkt: Packet) {
        debug!("processing packet: {}", pkt.summary());

        if !pkt.is_ttl_valid() {
            if self.config.flags & flags::INVALID_TTL_TO_CONTROLLER != 0 {
                debug!("packet has invalid TTL, sending to controller");
                // the protocol has no dedicated reason for invalid TTL
                let miss_len = self.config.miss_send_len;
                self.send_to_controller(&mut pkt, 0, Reason::NoMatch, miss_len);
            } else {
                debug!("packet has invalid TTL, dropping");
            }
            return;
        }

        let now = Instant::now();
        let mut next_table = Some(0u8);
        while let Some(table_id) = next_table.take() {
            debug!("trying table {}", table_id);
            pkt.table_id = table_id;

            let table = match self.pipeline.table_mut(table_id) {
                Some(table) => table,
                None => {
                    warn!("goto led outside the pipeline (table {})", table_id);
                    return;
                }
            };
            let instructions = table.lookup(&mut pkt, now).map(|entry| entry.instructions.clone());

            match instructions {
                Some(instructions) => {
                    self.execute_instructions(&mut pkt, &instructions, &mut next_table);
                    if next_table.is_none() {
                        self.execute_action_set(&mut pkt);
                        return;
                    }
                }
                None => {
                    debug!("no matching entry found, executing table configuration");
                    self.execute_table_miss(&mut pkt, table_id, &mut next_table);
                    if next_table.is_none() {
                        return;
                    }
                }
            }
        }
    }

    fn execute_table_miss(&mut self, pkt: &mut Packet, table_id: u8, next_table: &mut Option<u8>) {
        let table = &self.pipeline.tables[usize::from(table_id)];
        if table.miss_continue() {
            if usize::from(table_id) < PIPELINE_TABLES - 1 {
                *next_table = Some(table_id + 1);
            } else {
                warn!("last flow table is set to miss continue");
            }
        } else if table.miss_drop() {
            debug!("table set to drop missed packet");
        } else {
            match self.ports.lookup(pkt.in_port) {
                None => {
                    warn!("packet received on non-existing port ({})", pkt.in_port);
                }
                Some(port) if port.config & port_config::NO_PACKET_IN != 0 => {
                    debug!("packet-in disabled on port ({})", pkt.in_port);
                }
                Some(_) => {
                    let miss_len = self.config.miss_send_len;
                    self.send_to_controller(pkt, table_id, Reason::NoMatch, miss_len);
                }
            }
        }
    }

    /// Evaluate the instructions of a matched entry. The evaluation
    /// order is fixed regardless of wire order: apply-actions first,
    /// then clear, write-actions, write-metadata, and goto last.
    fn execute_instructions(
        &mut self,
        pkt: &mut Packet,
        instructions: &[Instruction],
        next_table: &mut Option<u8>,
    ) {
        for instruction in instructions {
            match *instruction {
                Instruction::ApplyActions(ref list) => self.execute_action_list(pkt, list),
                Instruction::Experimenter { experimenter, ref data } => {
                    let mut hooks = match self.hooks.take() {
                        Some(hooks) => hooks,
                        None => {
                            warn!("no handler for experimenter instruction {:#x}", experimenter);
                            continue;
                        }
                    };
                    hooks.instruction(pkt, experimenter, data);
                    self.hooks = Some(hooks);
                }
                _ => {}
            }
        }
        if instructions
            .iter()
            .any(|instruction| matches!(instruction, Instruction::ClearActions))
        {
            pkt.action_set.clear();
        }
        for instruction in instructions {
            if let Instruction::WriteActions(ref list) = *instruction {
                pkt.action_set.write_all(list);
            }
        }
        for instruction in instructions {
            if let Instruction::WriteMetadata { metadata, mask } = *instruction {
                pkt.write_metadata(metadata, mask);
            }
        }
        for instruction in instructions {
            if let Instruction::GotoTable(table_id) = *instruction {
                *next_table = Some(table_id);
            }
        }
    }

    /// Execute an action list in order, dispatching to groups and ports
    /// as soon as an action asks for it.
    pub fn execute_action_list(&mut self, pkt: &mut Packet, list: &[Action]) {
        for action in list {
            debug!("executing action {}", action);
            self.execute_action(pkt, action);

            if pkt.out_group != GroupNumber::ANY {
                let group = pkt.out_group;
                pkt.out_group = GroupNumber::ANY;
                debug!("group action; executing group ({})", group);
                self.execute_group(pkt, group);
            } else if pkt.out_port != u32::from(PortNumber::Any) {
                let port = pkt.out_port;
                let queue = pkt.out_queue;
                let max_len = pkt.out_port_max_len;
                pkt.out_port = PortNumber::Any.into();
                pkt.out_queue = 0;
                pkt.out_port_max_len = 0;
                debug!("port action; sending to port ({})", PortNumber::from(port));
                self.output_port(pkt, port, queue, max_len);
            }
        }
    }

    fn execute_action(&mut self, pkt: &mut Packet, action: &Action) {
        if let Action::Experimenter { experimenter, ref data } = *action {
            if let Some(mut hooks) = self.hooks.take() {
                hooks.action(pkt, experimenter, data);
                self.hooks = Some(hooks);
                return;
            }
        }
        actions::execute(pkt, action);
    }

    /// Flush the action set on pipeline exit, then dispatch the egress.
    fn execute_action_set(&mut self, pkt: &mut Packet) {
        let list = pkt.action_set.drain();
        for action in &list {
            debug!("executing action set entry {}", action);
            self.execute_action(pkt, action);
        }

        if pkt.out_group != GroupNumber::ANY {
            let group = pkt.out_group;
            pkt.out_group = GroupNumber::ANY;
            self.execute_group(pkt, group);
        } else if pkt.out_port != u32::from(PortNumber::Any) {
            let port = pkt.out_port;
            let queue = pkt.out_queue;
            let max_len = pkt.out_port_max_len;
            pkt.out_port = PortNumber::Any.into();
            pkt.out_queue = 0;
            pkt.out_port_max_len = 0;
            self.output_port(pkt, port, queue, max_len);
        }
    }

    /// Pick the buckets a group executes for this packet, per group
    /// type.
    fn select_buckets(&mut self, group_id: u32) -> Option<(GroupType, Vec<(usize, Vec<Action>)>)> {
        {
            let entry = self.groups.get(group_id)?;
            match entry.group_type {
                GroupType::All => {
                    let buckets = entry
                        .buckets
                        .iter()
                        .enumerate()
                        .map(|(index, bucket)| (index, bucket.actions.clone()))
                        .collect();
                    return Some((entry.group_type, buckets));
                }
                GroupType::Indirect => {
                    let buckets = entry
                        .buckets
                        .first()
                        .map(|bucket| (0, bucket.actions.clone()))
                        .into_iter()
                        .collect();
                    return Some((entry.group_type, buckets));
                }
                GroupType::FastFailover => {
                    let live = entry
                        .buckets
                        .iter()
                        .position(|bucket| self.bucket_live(bucket, 0));
                    let buckets = live
                        .map(|index| (index, entry.buckets[index].actions.clone()))
                        .into_iter()
                        .collect();
                    return Some((entry.group_type, buckets));
                }
                GroupType::Select | GroupType::_Unknown(_) => {}
            }
        }
        // select groups mutate their round-robin state
        let entry = self.groups.get_mut(group_id)?;
        if let GroupType::_Unknown(t) = entry.group_type {
            warn!("cannot execute group {} of unknown type {}", group_id, t);
            return Some((entry.group_type, Vec::new()));
        }
        let GroupEntry {
            ref buckets,
            ref mut select,
            group_type,
            ..
        } = *entry;
        let buckets = select
            .select(buckets)
            .map(|index| (index, buckets[index].actions.clone()))
            .into_iter()
            .collect();
        Some((group_type, buckets))
    }

    fn execute_group(&mut self, pkt: &mut Packet, group_id: u32) {
        let (group_type, selected) = match self.select_buckets(group_id) {
            Some(plan) => plan,
            None => {
                warn!("trying to execute non-existing group ({})", group_id);
                return;
            }
        };
        if selected.is_empty() {
            debug!("group {} has no eligible bucket, dropping packet", group_id);
            return;
        }

        let frame_len = pkt.buffer.len() as u64;
        if let Some(entry) = self.groups.get_mut(group_id) {
            entry.packet_count += 1;
            entry.byte_count += frame_len;
            for (index, _) in &selected {
                if let Some(counter) = entry.bucket_counters.get_mut(*index) {
                    counter.packet_count += 1;
                    counter.byte_count += frame_len;
                }
            }
        }

        match group_type {
            GroupType::All => {
                for (_, list) in &selected {
                    let mut clone = pkt.clone_packet();
                    self.execute_action_list(&mut clone, list);
                }
            }
            _ => {
                let (_, list) = &selected[0];
                self.execute_action_list(pkt, list);
            }
        }
    }

    fn bucket_live(&self, bucket: &group_mod::Bucket, depth: usize) -> bool {
        if depth > group_table::MAX_ENTRIES {
            return false;
        }
        let port_live = match PortNumber::from(bucket.watch_port) {
            PortNumber::Any => true,
            _ => self
                .ports
                .lookup(bucket.watch_port)
                .map(|port| port.is_live())
                .unwrap_or(false),
        };
        if !port_live {
            return false;
        }
        match GroupNumber::from(bucket.watch_group) {
            GroupNumber::Any => true,
            _ => self.group_live(bucket.watch_group, depth + 1),
        }
    }

    /// A group is live when any of its buckets is live. The group graph
    /// is acyclic, so the recursion terminates.
    fn group_live(&self, group_id: u32, depth: usize) -> bool {
        match self.groups.get(group_id) {
            Some(entry) => entry
                .buckets
                .iter()
                .any(|bucket| self.bucket_live(bucket, depth)),
            None => false,
        }
    }

    /// Reserved and regular port dispatch for an output action.
    fn output_port(&mut self, pkt: &mut Packet, out_port: u32, queue_id: u32, max_len: u16) {
        match PortNumber::from(out_port) {
            PortNumber::Table => {
                if pkt.packet_out {
                    // the resubmitted packet loses the flag, so it cannot
                    // loop through OFPP_TABLE again
                    let mut resubmit = pkt.clone_packet();
                    resubmit.packet_out = false;
                    self.process_packet(resubmit);
                } else {
                    warn!("trying to resubmit packet to the pipeline");
                }
            }
            PortNumber::InPort => {
                self.ports.output(pkt.buffer.bytes(), pkt.in_port, 0, 0);
            }
            PortNumber::Controller => {
                let table_id = pkt.table_id;
                self.send_to_controller(pkt, table_id, Reason::Action, max_len);
            }
            PortNumber::Flood | PortNumber::All => {
                let flood = PortNumber::from(out_port) == PortNumber::Flood;
                self.ports.output_all(pkt.buffer.bytes(), pkt.in_port, flood);
            }
            _ => {
                if out_port == pkt.in_port {
                    warn!("can't directly forward to the input port");
                } else {
                    self.ports.output(pkt.buffer.bytes(), out_port, queue_id, max_len);
                }
            }
        }
    }

    fn send_to_controller(&mut self, pkt: &mut Packet, table_id: u8, reason: Reason, max_len: u16) {
        pkt.buffer_id = self.buffers.save(pkt);
        let total_len = pkt.buffer.len();
        let data_len = total_len.min(usize::from(max_len));
        let body = Body::PacketIn(PacketIn {
            buffer_id: pkt.buffer_id,
            in_port: pkt.in_port,
            in_phy_port: pkt.in_port,
            total_len: total_len as u16,
            reason,
            table_id,
            data: pkt.buffer.bytes()[..data_len].to_vec(),
        });
        self.channel.send(None, &Message::new(0, body));
    }
}
