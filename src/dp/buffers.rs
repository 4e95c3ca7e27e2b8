//! The interface to the packet buffer pool.

use crate::dp::packet::Packet;
use crate::wire::NO_BUFFER;

/// What the datapath needs from the buffer pool that parks packets
/// awaiting a controller decision. Eviction policy belongs to the
/// implementation.
pub trait Buffers {
    /// Park a packet, returning its buffer id, or [`NO_BUFFER`] when no
    /// buffer is available.
    fn save(&mut self, pkt: &Packet) -> u32;

    /// Take a parked packet back out.
    fn retrieve(&mut self, buffer_id: u32) -> Option<Packet>;

    /// Number of packets the pool can hold at once, for the features
    /// reply.
    fn capacity(&self) -> u32 {
        0
    }
}

/// A pool that never buffers: every save reports [`NO_BUFFER`], so
/// packet-ins always carry their full payload.
#[derive(Debug, Default)]
pub struct NoBuffers;

impl Buffers for NoBuffers {
    fn save(&mut self, _pkt: &Packet) -> u32 {
        NO_BUFFER
    }

    fn retrieve(&mut self, _buffer_id: u32) -> Option<Packet> {
        None
    }
}
