//! The interface to the port drivers.

use crate::wire::port_mod::PortMod;
use crate::wire::port_desc::PortDesc;
use crate::wire::queue::PacketQueue;
use crate::wire::stats::{PortStats, QueueStats};
use crate::Result;

/// What the datapath needs from the machinery that owns the physical
/// and virtual ports. Transmission is fire-and-forget; errors are the
/// driver's to count and report through the statistics.
pub trait Ports {
    /// Transmit a frame on a port, optionally through a queue. `max_len`
    /// is only meaningful for the controller pseudo-port and is handled
    /// by the datapath before this call.
    fn output(&mut self, frame: &[u8], port_no: u32, queue_id: u32, max_len: u16);

    /// Transmit a frame on every standard port except `in_port`; with
    /// `flood` set, also skip ports with flooding disabled.
    fn output_all(&mut self, frame: &[u8], in_port: u32, flood: bool);

    /// Look up a port by number.
    fn lookup(&self, port_no: u32) -> Option<&PortDesc>;

    /// Every port, for the features reply.
    fn list(&self) -> Vec<PortDesc>;

    /// Apply a validated port-mod. The datapath has already checked that
    /// the port exists and the hardware address matches.
    fn apply_mod(&mut self, port_mod: &PortMod) -> Result<()> {
        let _ = port_mod;
        Ok(())
    }

    /// Statistics for one port, or all ports for OFPP_ANY.
    fn port_stats(&self, port_no: u32) -> Vec<PortStats> {
        let _ = port_no;
        Vec::new()
    }

    /// Statistics for the queues of a port.
    fn queue_stats(&self, port_no: u32, queue_id: u32) -> Vec<QueueStats> {
        let _ = (port_no, queue_id);
        Vec::new()
    }

    /// The queues configured on a port.
    fn queue_config(&self, port_no: u32) -> Vec<PacketQueue> {
        let _ = port_no;
        Vec::new()
    }
}
