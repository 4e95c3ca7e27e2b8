//! An OpenFlow 1.1 switch datapath.
//!
//! The crate has two halves. The [`wire`] module is a bidirectional codec
//! for the OpenFlow 1.1 message family: every message, action, instruction,
//! match and stats record can be parsed from and emitted to its
//! network-byte-order wire form. The [`dp`] module is the forwarding plane:
//! a multi-table flow pipeline with a group table, driven packet by packet,
//! which consumes the decoded messages to mutate its state and produces
//! replies, packet-ins and flow-removed notifications.
//!
//! Port I/O, packet buffering for the controller and the control channel
//! transport are not implemented here; the datapath talks to them through
//! the small traits in [`dp`].

use core::fmt;

mod field {
    use core::ops;
    pub type Field = ops::Range<usize>;
    pub type Rest = ops::RangeFrom<usize>;
}

/// The error type for this crate.
///
/// Anything that can go wrong while decoding a message, validating it, or
/// applying it to the datapath is either a buffer-space problem on the
/// emitting side, or a protocol error that is reported back to the
/// controller as an OFPT_ERROR message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An operation cannot proceed because the output buffer is too small.
    Exhausted,
    /// An OpenFlow error: a `(type, code)` pair as defined by the protocol.
    Ofp(error::OfpError),
}

/// The result type for this crate.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Exhausted => write!(f, "buffer space exhausted"),
            Error::Ofp(ref err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<error::OfpError> for Error {
    fn from(err: error::OfpError) -> Error {
        Error::Ofp(err)
    }
}

/// High-level representation of a wire structure.
pub trait Repr
where
    Self: Sized,
{
    /// Parse a wire structure and return a high-level representation.
    fn parse(buffer: &[u8]) -> Result<Self>;

    /// Return the length of the wire form emitted from this representation.
    fn buffer_len(&self) -> usize;

    /// Emit a high-level representation into a buffer.
    fn emit(&self, buffer: &mut [u8]) -> Result<()>;
}

#[macro_use]
mod macros;
pub mod csum;
mod group;
mod port;

pub mod error;
pub mod match_std;
pub mod wire;

pub mod dp;
pub mod frame;

pub use crate::error::OfpError;
pub use crate::group::GroupNumber;
pub use crate::match_std::StandardMatch;
pub use crate::port::PortNumber;
pub use crate::wire::{Body, Message};
