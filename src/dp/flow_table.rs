//! One flow table: prioritized entries, flow-mod handling, expiry and
//! statistics.

use std::time::Instant;

use log::debug;

use crate::dp::flow_entry::FlowEntry;
use crate::dp::packet::Packet;
use crate::error::{FlowModFailedCode, OfpError};
use crate::match_std::wildcards;
use crate::wire::flow_mod::{Command, FlowMod, FLAG_CHECK_OVERLAP};
use crate::wire::flow_removed::Reason;
use crate::wire::stats::{AggregateStats, FlowStats, FlowStatsRequest, TableStats};
use crate::wire::table_mod;
use crate::{GroupNumber, PortNumber, Result};

/// Entries per table.
pub const MAX_ENTRIES: usize = 8192;

/// Wildcards supported by the lookup, reported in table stats.
pub const SUPPORTED_WILDCARDS: u32 = wildcards::ALL;
/// Match fields supported by the lookup (OFPFMF_* bits).
pub const SUPPORTED_MATCH_FIELDS: u32 = 0xffff;
/// Instructions supported by the pipeline (bitmap over instruction
/// types).
pub const SUPPORTED_INSTRUCTIONS: u32 = 0x3e;
/// Actions supported by the executor (bitmap over action types).
pub const SUPPORTED_ACTIONS: u32 = 0x01ff_ffff;

/// A single flow table.
///
/// Entries are kept sorted by priority descending; among equal
/// priorities the earlier installed entry comes first. Lookup scans in
/// order and takes the first match.
#[derive(Debug)]
pub struct FlowTable {
    pub table_id: u8,
    pub name: String,
    /// Miss policy, [`table_mod::config`] bits.
    pub config: u32,
    pub lookup_count: u64,
    pub matched_count: u64,
    entries: Vec<FlowEntry>,
}

impl FlowTable {
    pub fn new(table_id: u8) -> FlowTable {
        FlowTable {
            table_id,
            name: format!("table_{}", table_id),
            config: 0, // miss sends to the controller
            lookup_count: 0,
            matched_count: 0,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[FlowEntry] {
        &self.entries
    }

    /// Find the highest-priority entry matching the packet, counting the
    /// lookup and, on a hit, the match.
    pub fn lookup(&mut self, pkt: &mut Packet, now: Instant) -> Option<&FlowEntry> {
        self.lookup_count += 1;
        let frame_len = pkt.buffer.len() as u64;
        pkt.validate();
        let fields = pkt.fields().clone();
        for entry in self.entries.iter_mut() {
            if entry.flow_match.matches_packet(&fields) {
                self.matched_count += 1;
                entry.hit(frame_len, now);
                return Some(entry);
            }
        }
        None
    }

    /// Apply a flow-mod to this table. Returns the entries removed by a
    /// delete command, for flow-removed notification.
    pub fn flow_mod(&mut self, msg: &FlowMod, now: Instant) -> Result<Vec<(FlowEntry, Reason)>> {
        match msg.command {
            Command::Add => {
                self.add(msg, now)?;
                Ok(Vec::new())
            }
            Command::Modify => {
                self.modify(msg, now, false)?;
                Ok(Vec::new())
            }
            Command::ModifyStrict => {
                self.modify(msg, now, true)?;
                Ok(Vec::new())
            }
            Command::Delete => Ok(self.delete(msg, false)),
            Command::DeleteStrict => Ok(self.delete(msg, true)),
            Command::_Unknown(_) => {
                Err(OfpError::FlowModFailed(FlowModFailedCode::BadCommand).into())
            }
        }
    }

    fn add(&mut self, msg: &FlowMod, now: Instant) -> Result<()> {
        if msg.flags & FLAG_CHECK_OVERLAP != 0 {
            let overlap = self
                .entries
                .iter()
                .any(|entry| entry.priority == msg.priority && entry.flow_match.overlaps(&msg.flow_match));
            if overlap {
                return Err(OfpError::FlowModFailed(FlowModFailedCode::Overlap).into());
            }
        }

        // an identical entry is replaced, counters cleared
        self.entries.retain(|entry| {
            !(entry.priority == msg.priority && entry.flow_match.matches_strict(&msg.flow_match))
        });

        if self.entries.len() >= MAX_ENTRIES {
            return Err(OfpError::FlowModFailed(FlowModFailedCode::TableFull).into());
        }

        let entry = FlowEntry::from_mod(msg, now);
        // keep priority order, newest entry last among its priority
        let position = self
            .entries
            .iter()
            .position(|other| other.priority < entry.priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, entry);
        debug!("table {}: added flow, {} entries", self.table_id, self.entries.len());
        Ok(())
    }

    fn modify(&mut self, msg: &FlowMod, now: Instant, strict: bool) -> Result<()> {
        let mut modified = false;
        for entry in self.entries.iter_mut() {
            if !cookie_selects(msg, entry) {
                continue;
            }
            let selected = if strict {
                entry.priority == msg.priority && entry.flow_match.matches_strict(&msg.flow_match)
            } else {
                msg.flow_match.matches_nonstrict(&entry.flow_match)
            };
            if selected {
                entry.instructions = msg.instructions.clone();
                modified = true;
            }
        }
        if !modified {
            // nothing matched: a modify behaves as an add
            self.add(msg, now)?;
        }
        Ok(())
    }

    fn delete(&mut self, msg: &FlowMod, strict: bool) -> Vec<(FlowEntry, Reason)> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            let mut selected = cookie_selects(msg, &entry);
            if selected {
                selected = if strict {
                    entry.priority == msg.priority
                        && entry.flow_match.matches_strict(&msg.flow_match)
                } else {
                    msg.flow_match.matches_nonstrict(&entry.flow_match)
                };
            }
            if selected && msg.out_port != u32::from(PortNumber::Any) {
                selected = entry.references_port(msg.out_port);
            }
            if selected && msg.out_group != GroupNumber::ANY {
                selected = entry.references_group(msg.out_group);
            }
            if selected {
                removed.push((entry, Reason::Delete));
            } else {
                kept.push(entry);
            }
        }
        self.entries = kept;
        removed
    }

    /// Remove every entry whose timeout has passed.
    pub fn expire(&mut self, now: Instant) -> Vec<(FlowEntry, Reason)> {
        let mut expired = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            match entry.expiry(now) {
                Some(reason) => expired.push((entry, reason)),
                None => kept.push(entry),
            }
        }
        self.entries = kept;
        expired
    }

    /// Append the stats of every entry selected by the request.
    pub fn stats(&self, req: &FlowStatsRequest, now: Instant, out: &mut Vec<FlowStats>) {
        for entry in self.selected(req) {
            out.push(entry.stats(self.table_id, now));
        }
    }

    /// Fold the counters of every entry selected by the request.
    pub fn aggregate(&self, req: &FlowStatsRequest, out: &mut AggregateStats) {
        for entry in self.selected(req) {
            out.packet_count += entry.packet_count;
            out.byte_count += entry.byte_count;
            out.flow_count += 1;
        }
    }

    fn selected<'a>(
        &'a self,
        req: &'a FlowStatsRequest,
    ) -> impl Iterator<Item = &'a FlowEntry> + 'a {
        self.entries.iter().filter(move |entry| {
            if req.cookie_mask != 0 && entry.cookie & req.cookie_mask != req.cookie & req.cookie_mask
            {
                return false;
            }
            if !req.flow_match.matches_nonstrict(&entry.flow_match) {
                return false;
            }
            if req.out_port != u32::from(PortNumber::Any) && !entry.references_port(req.out_port) {
                return false;
            }
            if req.out_group != GroupNumber::ANY && !entry.references_group(req.out_group) {
                return false;
            }
            true
        })
    }

    pub fn table_stats(&self) -> TableStats {
        TableStats {
            table_id: self.table_id,
            name: self.name.clone(),
            wildcards: SUPPORTED_WILDCARDS,
            match_fields: SUPPORTED_MATCH_FIELDS,
            instructions: SUPPORTED_INSTRUCTIONS,
            write_actions: SUPPORTED_ACTIONS,
            apply_actions: SUPPORTED_ACTIONS,
            config: self.config,
            max_entries: MAX_ENTRIES as u32,
            active_count: self.entries.len() as u32,
            lookup_count: self.lookup_count,
            matched_count: self.matched_count,
        }
    }

    /// How many entries forward to the given group.
    pub fn count_group_refs(&self, group: u32) -> u32 {
        self.entries
            .iter()
            .filter(|entry| entry.references_group(group))
            .count() as u32
    }

    /// Whether the miss policy forwards missed packets to the next
    /// table.
    pub fn miss_continue(&self) -> bool {
        self.config & table_mod::config::MISS_CONTINUE != 0
    }

    /// Whether the miss policy drops missed packets.
    pub fn miss_drop(&self) -> bool {
        self.config & table_mod::config::MISS_DROP != 0
    }
}

fn cookie_selects(msg: &FlowMod, entry: &FlowEntry) -> bool {
    msg.cookie_mask == 0 || entry.cookie & msg.cookie_mask == msg.cookie & msg.cookie_mask
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dp::packet::Packet;
    use crate::frame::{testing, FrameBuf};
    use crate::match_std::StandardMatch;
    use crate::wire::action::Action;
    use crate::wire::instruction::Instruction;
    use crate::wire::NO_BUFFER;
    use smoltcp::wire::Ipv4Address;
    use std::time::Duration;

    fn flow_mod(priority: u16, command: Command) -> FlowMod {
        FlowMod {
            cookie: 0,
            cookie_mask: 0,
            table_id: 0,
            command,
            idle_timeout: 0,
            hard_timeout: 0,
            priority,
            buffer_id: NO_BUFFER,
            out_port: PortNumber::Any.into(),
            out_group: GroupNumber::ANY,
            flags: 0,
            flow_match: StandardMatch::any(),
            instructions: vec![],
        }
    }

    fn pkt() -> Packet {
        let frame = testing::tcp_frame(64, 64, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
        Packet::new(FrameBuf::new(&frame), 1)
    }

    #[test]
    fn test_priority_order_with_stable_ties() {
        let mut table = FlowTable::new(0);
        let now = Instant::now();
        let mut add = |priority: u16, cookie: u64| {
            let mut msg = flow_mod(priority, Command::Add);
            msg.cookie = cookie;
            // distinct matches so the adds do not replace each other
            msg.flow_match.wildcards &= !wildcards::TP_DST;
            msg.flow_match.tp_dst = cookie as u16;
            table.flow_mod(&msg, now).unwrap();
        };
        add(10, 1);
        add(100, 2);
        add(10, 3);
        add(50, 4);

        let priorities: Vec<(u16, u64)> = table
            .entries()
            .iter()
            .map(|e| (e.priority, e.cookie))
            .collect();
        assert_eq!(priorities, vec![(100, 2), (50, 4), (10, 1), (10, 3)]);
    }

    #[test]
    fn test_lookup_picks_highest_priority() {
        let mut table = FlowTable::new(0);
        let now = Instant::now();

        let mut low = flow_mod(1, Command::Add);
        low.cookie = 1;
        table.flow_mod(&low, now).unwrap();

        let mut high = flow_mod(100, Command::Add);
        high.cookie = 2;
        high.flow_match.wildcards &= !wildcards::IN_PORT;
        high.flow_match.in_port = 1;
        table.flow_mod(&high, now).unwrap();

        let entry = table.lookup(&mut pkt(), now).unwrap();
        assert_eq!(entry.cookie, 2);
        assert_eq!(table.lookup_count, 1);
        assert_eq!(table.matched_count, 1);
    }

    #[test]
    fn test_lookup_miss_counts() {
        let mut table = FlowTable::new(0);
        let now = Instant::now();
        let mut msg = flow_mod(1, Command::Add);
        msg.flow_match.wildcards &= !wildcards::IN_PORT;
        msg.flow_match.in_port = 99;
        table.flow_mod(&msg, now).unwrap();

        assert!(table.lookup(&mut pkt(), now).is_none());
        assert_eq!(table.lookup_count, 1);
        assert_eq!(table.matched_count, 0);
    }

    #[test]
    fn test_add_replaces_identical_match() {
        let mut table = FlowTable::new(0);
        let now = Instant::now();
        let mut msg = flow_mod(5, Command::Add);
        msg.instructions = vec![Instruction::ClearActions];
        table.flow_mod(&msg, now).unwrap();

        table.entries[0].packet_count = 42;
        msg.instructions = vec![Instruction::ApplyActions(vec![Action::DecNwTtl])];
        table.flow_mod(&msg, now).unwrap();

        assert_eq!(table.entries().len(), 1);
        assert_eq!(table.entries()[0].packet_count, 0);
        assert_eq!(
            table.entries()[0].instructions,
            vec![Instruction::ApplyActions(vec![Action::DecNwTtl])]
        );
    }

    #[test]
    fn test_check_overlap() {
        let mut table = FlowTable::new(0);
        let now = Instant::now();

        let mut narrow = flow_mod(5, Command::Add);
        narrow.flow_match.wildcards &= !wildcards::IN_PORT;
        narrow.flow_match.in_port = 1;
        table.flow_mod(&narrow, now).unwrap();

        // a wider match at the same priority overlaps
        let mut wide = flow_mod(5, Command::Add);
        wide.flags = FLAG_CHECK_OVERLAP;
        wide.flow_match.wildcards &= !wildcards::DL_TYPE;
        wide.flow_match.dl_type = 0x0800;
        assert_eq!(
            table.flow_mod(&wide, now),
            Err(OfpError::FlowModFailed(FlowModFailedCode::Overlap).into())
        );

        // different priority does not
        wide.priority = 6;
        assert!(table.flow_mod(&wide, now).is_ok());
    }

    #[test]
    fn test_modify_rewrites_instructions() {
        let mut table = FlowTable::new(0);
        let now = Instant::now();
        let mut msg = flow_mod(5, Command::Add);
        msg.flow_match.wildcards &= !wildcards::IN_PORT;
        msg.flow_match.in_port = 1;
        table.flow_mod(&msg, now).unwrap();
        table.entries[0].packet_count = 7;

        let mut modify = flow_mod(0, Command::Modify);
        modify.instructions = vec![Instruction::ClearActions];
        table.flow_mod(&modify, now).unwrap();

        // counters survive a modify
        assert_eq!(table.entries().len(), 1);
        assert_eq!(table.entries()[0].packet_count, 7);
        assert_eq!(table.entries()[0].instructions, vec![Instruction::ClearActions]);
    }

    #[test]
    fn test_modify_without_match_adds() {
        let mut table = FlowTable::new(0);
        let now = Instant::now();
        let mut modify = flow_mod(5, Command::ModifyStrict);
        modify.instructions = vec![Instruction::ClearActions];
        table.flow_mod(&modify, now).unwrap();
        assert_eq!(table.entries().len(), 1);
    }

    #[test]
    fn test_delete_with_out_port_filter() {
        let mut table = FlowTable::new(0);
        let now = Instant::now();

        let mut to_two = flow_mod(5, Command::Add);
        to_two.flow_match.wildcards &= !wildcards::IN_PORT;
        to_two.flow_match.in_port = 1;
        to_two.instructions = vec![Instruction::ApplyActions(vec![Action::Output {
            port: 2,
            max_len: 0,
        }])];
        table.flow_mod(&to_two, now).unwrap();

        let mut to_three = flow_mod(5, Command::Add);
        to_three.flow_match.wildcards &= !wildcards::IN_PORT;
        to_three.flow_match.in_port = 2;
        to_three.instructions = vec![Instruction::ApplyActions(vec![Action::Output {
            port: 3,
            max_len: 0,
        }])];
        table.flow_mod(&to_three, now).unwrap();

        let mut delete = flow_mod(0, Command::Delete);
        delete.out_port = 2;
        let removed = table.flow_mod(&delete, now).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(table.entries().len(), 1);
        assert!(table.entries()[0].references_port(3));
    }

    #[test]
    fn test_expiry() {
        let mut table = FlowTable::new(0);
        let now = Instant::now();

        let mut hard = flow_mod(5, Command::Add);
        hard.hard_timeout = 10;
        hard.flow_match.wildcards &= !wildcards::IN_PORT;
        hard.flow_match.in_port = 1;
        table.flow_mod(&hard, now).unwrap();

        let mut idle = flow_mod(5, Command::Add);
        idle.idle_timeout = 5;
        idle.flow_match.wildcards &= !wildcards::IN_PORT;
        idle.flow_match.in_port = 2;
        table.flow_mod(&idle, now).unwrap();

        assert!(table.expire(now).is_empty());

        let expired = table.expire(now + Duration::from_secs(6));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].1, Reason::IdleTimeout);

        let expired = table.expire(now + Duration::from_secs(11));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].1, Reason::HardTimeout);
        assert!(table.entries().is_empty());
    }

    #[test]
    fn test_stats_filters() {
        let mut table = FlowTable::new(0);
        let now = Instant::now();
        let mut msg = flow_mod(5, Command::Add);
        msg.cookie = 0xaa;
        msg.flow_match.wildcards &= !wildcards::IN_PORT;
        msg.flow_match.in_port = 1;
        table.flow_mod(&msg, now).unwrap();

        let mut req = FlowStatsRequest {
            table_id: 0,
            out_port: PortNumber::Any.into(),
            out_group: GroupNumber::ANY,
            cookie: 0,
            cookie_mask: 0,
            flow_match: StandardMatch::any(),
        };
        let mut out = Vec::new();
        table.stats(&req, now, &mut out);
        assert_eq!(out.len(), 1);

        req.cookie = 0xbb;
        req.cookie_mask = 0xff;
        out.clear();
        table.stats(&req, now, &mut out);
        assert!(out.is_empty());

        let mut agg = AggregateStats::default();
        req.cookie_mask = 0;
        table.aggregate(&req, &mut agg);
        assert_eq!(agg.flow_count, 1);
    }

    #[test]
    fn test_masked_nw_lookup() {
        let mut table = FlowTable::new(0);
        let now = Instant::now();
        let mut msg = flow_mod(100, Command::Add);
        msg.flow_match.wildcards &= !wildcards::DL_TYPE;
        msg.flow_match.dl_type = 0x0800;
        msg.flow_match.nw_dst = Ipv4Address([10, 0, 0, 0]);
        msg.flow_match.nw_dst_mask = Ipv4Address([0, 0, 0, 255]);
        table.flow_mod(&msg, now).unwrap();

        assert!(table.lookup(&mut pkt(), now).is_some());
    }
}
