//! Wire form of OFPT_ERROR messages.
//!
//! ```no_rust
//! +--------+--------+--------+--------+
//! |       type      |      code       |
//! +--------+--------+--------+--------+
//! |               data                |
//! +--------+--------+--------+--------+
//! ```
//!
//! The data is interpreted based on the type of error; for most errors it
//! carries at least the first 64 bytes of the failed request.

use byteorder::{ByteOrder, NetworkEndian};

use crate::{Error, OfpError, Repr, Result};

mod field {
    use crate::field::*;

    pub const KIND: Field = 0..2;
    pub const CODE: Field = 2..4;
    pub const DATA: Rest = 4..;
}

/// An error report, either received from a peer or built from an
/// [`OfpError`] to be sent back.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ErrorMsg {
    pub error: OfpError,
    pub data: Vec<u8>,
}

impl ErrorMsg {
    /// Wrap an error with the message bytes that provoked it.
    pub fn new(error: OfpError, data: &[u8]) -> ErrorMsg {
        ErrorMsg {
            error,
            data: data.to_vec(),
        }
    }
}

impl Repr for ErrorMsg {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < field::DATA.start {
            return Err(crate::wire::bad_len());
        }
        let kind = NetworkEndian::read_u16(&buffer[field::KIND]);
        let code = NetworkEndian::read_u16(&buffer[field::CODE]);
        Ok(ErrorMsg {
            error: OfpError::from_pair(kind, code),
            data: buffer[field::DATA].to_vec(),
        })
    }

    fn buffer_len(&self) -> usize {
        field::DATA.start + self.data.len()
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }
        let (kind, code) = self.error.pair();
        NetworkEndian::write_u16(&mut buffer[field::KIND], kind);
        NetworkEndian::write_u16(&mut buffer[field::CODE], code);
        buffer[field::DATA.start..field::DATA.start + self.data.len()].copy_from_slice(&self.data);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::FlowModFailedCode;

    #[test]
    fn test_round_trip() {
        let msg = ErrorMsg::new(
            OfpError::FlowModFailed(FlowModFailedCode::Overlap),
            &[1, 2, 3, 4],
        );
        let mut bytes = vec![0; msg.buffer_len()];
        msg.emit(&mut bytes).unwrap();
        assert_eq!(&bytes[..4], &[0x00, 0x05, 0x00, 0x03]);
        assert_eq!(ErrorMsg::parse(&bytes).unwrap(), msg);
    }
}
