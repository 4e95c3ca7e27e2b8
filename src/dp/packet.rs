//! The in-flight packet: the frame buffer plus the pipeline state that
//! travels with it.

use core::fmt::Write as _;

use crate::dp::action_set::ActionSet;
use crate::frame::view::{self, Handle};
use crate::frame::FrameBuf;
use crate::match_std::StandardMatch;
use crate::wire::NO_BUFFER;
use crate::{GroupNumber, PortNumber};

/// A packet traversing the pipeline.
#[derive(Debug, Clone)]
pub struct Packet {
    pub buffer: FrameBuf,
    pub in_port: u32,
    /// Table currently evaluating the packet.
    pub table_id: u8,
    /// Buffer id assigned when the packet was saved for the controller.
    pub buffer_id: u32,
    /// Whether this packet came from a packet-out message; gates
    /// resubmission through OFPP_TABLE.
    pub packet_out: bool,
    /// Pipeline metadata, carried between tables.
    pub metadata: u64,
    pub action_set: ActionSet,
    // scratch registers for the egress dispatch
    pub out_port: u32,
    pub out_queue: u32,
    pub out_port_max_len: u16,
    pub out_group: u32,
    handle: Handle,
}

impl Packet {
    /// A packet received on a port.
    pub fn new(buffer: FrameBuf, in_port: u32) -> Packet {
        Packet {
            buffer,
            in_port,
            table_id: 0,
            buffer_id: NO_BUFFER,
            packet_out: false,
            metadata: 0,
            action_set: ActionSet::new(),
            out_port: PortNumber::Any.into(),
            out_queue: 0,
            out_port_max_len: 0,
            out_group: GroupNumber::ANY,
            handle: Handle::invalid(),
        }
    }

    /// A packet injected by the controller.
    pub fn new_packet_out(buffer: FrameBuf, in_port: u32) -> Packet {
        let mut packet = Packet::new(buffer, in_port);
        packet.packet_out = true;
        packet
    }

    /// Re-parse the frame if an action invalidated the protocol view.
    pub fn validate(&mut self) {
        if !self.handle.valid {
            self.handle = Handle::parse(self.buffer.bytes(), self.in_port, self.metadata);
        }
    }

    /// The parsed state, re-validated if necessary.
    pub fn handle(&mut self) -> &Handle {
        self.validate();
        &self.handle
    }

    /// The extracted match fields, re-validated if necessary.
    pub fn fields(&mut self) -> &StandardMatch {
        self.validate();
        &self.handle.fields
    }

    /// Split borrow for the action executor: the frame buffer and the
    /// parsed state, re-validated if necessary.
    pub(crate) fn validated_parts(&mut self) -> (&mut FrameBuf, &mut Handle) {
        self.validate();
        (&mut self.buffer, &mut self.handle)
    }

    /// Apply a write-metadata instruction.
    pub fn write_metadata(&mut self, metadata: u64, mask: u64) {
        self.metadata = (self.metadata & !mask) | (metadata & mask);
        if self.handle.valid {
            self.handle.fields.metadata = self.metadata;
        }
    }

    /// Whether the given match selects this packet.
    pub fn matches(&mut self, m: &StandardMatch) -> bool {
        self.validate();
        m.matches_packet(&self.handle.fields)
    }

    /// Whether the packet may enter the pipeline: false when the outer
    /// MPLS or IPv4 TTL is 1 or 0.
    pub fn is_ttl_valid(&mut self) -> bool {
        self.validate();
        view::is_ttl_valid(self.buffer.bytes(), &self.handle.view)
    }

    /// Whether the packet is an IPv4 fragment.
    pub fn is_fragment(&mut self) -> bool {
        self.validate();
        view::is_fragment(self.buffer.bytes(), &self.handle.view)
    }

    /// Clone the packet for a group bucket. The clone re-parses its own
    /// frame on first use.
    pub fn clone_packet(&self) -> Packet {
        let mut clone = self.clone();
        clone.handle = Handle::invalid();
        clone
    }

    /// One-line description of the parsed protocol stack, for debug
    /// logging.
    pub fn summary(&mut self) -> String {
        self.validate();
        let view = &self.handle.view;
        let mut out = String::from("{");
        let mut sep = "";
        for (present, name) in [
            (view.eth.is_some(), "eth"),
            (view.vlan.is_some(), "vlan"),
            (view.mpls.is_some(), "mpls"),
            (view.ipv4.is_some(), "ipv4"),
            (view.arp.is_some(), "arp"),
            (view.tcp.is_some(), "tcp"),
            (view.udp.is_some(), "udp"),
            (view.sctp.is_some(), "sctp"),
            (view.icmp.is_some(), "icmp"),
        ] {
            if present {
                let _ = write!(out, "{}{}", sep, name);
                sep = ",";
            }
        }
        let _ = write!(out, "}} in_port={} len={}", self.in_port, self.buffer.len());
        out
    }
}
