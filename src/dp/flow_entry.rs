//! A single flow table entry.

use std::time::Instant;

use crate::dp::actions;
use crate::match_std::StandardMatch;
use crate::wire::flow_mod::{FlowMod, FLAG_SEND_FLOW_REM};
use crate::wire::flow_removed::{FlowRemoved, Reason};
use crate::wire::instruction::Instruction;
use crate::wire::stats::FlowStats;

#[derive(Debug, Clone, PartialEq)]
pub struct FlowEntry {
    pub priority: u16,
    pub cookie: u64,
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    pub send_flow_rem: bool,
    pub installed: Instant,
    pub last_used: Instant,
    pub packet_count: u64,
    pub byte_count: u64,
    pub flow_match: StandardMatch,
    pub instructions: Vec<Instruction>,
}

impl FlowEntry {
    pub fn from_mod(msg: &FlowMod, now: Instant) -> FlowEntry {
        FlowEntry {
            priority: msg.priority,
            cookie: msg.cookie,
            idle_timeout: msg.idle_timeout,
            hard_timeout: msg.hard_timeout,
            send_flow_rem: msg.flags & FLAG_SEND_FLOW_REM != 0,
            installed: now,
            last_used: now,
            packet_count: 0,
            byte_count: 0,
            flow_match: msg.flow_match.clone(),
            instructions: msg.instructions.clone(),
        }
    }

    /// Account a matched packet.
    pub fn hit(&mut self, frame_len: u64, now: Instant) {
        self.packet_count += 1;
        self.byte_count += frame_len;
        self.last_used = now;
    }

    /// Whether any action of this entry outputs to the given port.
    pub fn references_port(&self, port: u32) -> bool {
        self.instructions
            .iter()
            .filter_map(Instruction::actions)
            .any(|list| actions::list_has_out_port(list, port))
    }

    /// Whether any action of this entry forwards to the given group.
    pub fn references_group(&self, group: u32) -> bool {
        self.instructions
            .iter()
            .filter_map(Instruction::actions)
            .any(|list| actions::list_has_out_group(list, group))
    }

    /// Why the entry has expired at `now`, if it has. The hard timeout
    /// takes precedence.
    pub fn expiry(&self, now: Instant) -> Option<Reason> {
        if self.hard_timeout > 0
            && now.duration_since(self.installed).as_secs() >= u64::from(self.hard_timeout)
        {
            return Some(Reason::HardTimeout);
        }
        if self.idle_timeout > 0
            && now.duration_since(self.last_used).as_secs() >= u64::from(self.idle_timeout)
        {
            return Some(Reason::IdleTimeout);
        }
        None
    }

    pub fn stats(&self, table_id: u8, now: Instant) -> FlowStats {
        let age = now.duration_since(self.installed);
        FlowStats {
            table_id,
            duration_sec: age.as_secs() as u32,
            duration_nsec: age.subsec_nanos(),
            priority: self.priority,
            idle_timeout: self.idle_timeout,
            hard_timeout: self.hard_timeout,
            cookie: self.cookie,
            packet_count: self.packet_count,
            byte_count: self.byte_count,
            flow_match: self.flow_match.clone(),
            instructions: self.instructions.clone(),
        }
    }

    pub fn to_flow_removed(&self, table_id: u8, reason: Reason, now: Instant) -> FlowRemoved {
        let age = now.duration_since(self.installed);
        FlowRemoved {
            cookie: self.cookie,
            priority: self.priority,
            reason,
            table_id,
            duration_sec: age.as_secs() as u32,
            duration_nsec: age.subsec_nanos(),
            idle_timeout: self.idle_timeout,
            packet_count: self.packet_count,
            byte_count: self.byte_count,
            flow_match: self.flow_match.clone(),
        }
    }
}
