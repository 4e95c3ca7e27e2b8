//! Read/write wrappers for the transport headers the pipeline can edit:
//! TCP, UDP, SCTP and ICMP. Only the fields the datapath touches are
//! exposed.

use byteorder::{ByteOrder, NetworkEndian};

pub const TCP_HEADER_LEN: usize = 20;
pub const UDP_HEADER_LEN: usize = 8;
pub const SCTP_HEADER_LEN: usize = 12;
pub const ICMP_HEADER_LEN: usize = 4;

mod tcp_field {
    use crate::field::*;

    pub const SRC: Field = 0..2;
    pub const DST: Field = 2..4;
    pub const CSUM: Field = 16..18;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Tcp<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> Tcp<T> {
    pub fn new(buffer: T) -> Tcp<T> {
        Tcp { buffer }
    }

    pub fn src(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[tcp_field::SRC])
    }

    pub fn dst(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[tcp_field::DST])
    }

    pub fn csum(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[tcp_field::CSUM])
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Tcp<T> {
    pub fn set_src(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[tcp_field::SRC], value)
    }

    pub fn set_dst(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[tcp_field::DST], value)
    }

    pub fn set_csum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[tcp_field::CSUM], value)
    }
}

mod udp_field {
    use crate::field::*;

    pub const SRC: Field = 0..2;
    pub const DST: Field = 2..4;
    pub const CSUM: Field = 6..8;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Udp<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> Udp<T> {
    pub fn new(buffer: T) -> Udp<T> {
        Udp { buffer }
    }

    pub fn src(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[udp_field::SRC])
    }

    pub fn dst(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[udp_field::DST])
    }

    pub fn csum(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[udp_field::CSUM])
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Udp<T> {
    pub fn set_src(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[udp_field::SRC], value)
    }

    pub fn set_dst(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[udp_field::DST], value)
    }

    pub fn set_csum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[udp_field::CSUM], value)
    }
}

mod sctp_field {
    use crate::field::*;

    pub const SRC: Field = 0..2;
    pub const DST: Field = 2..4;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Sctp<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> Sctp<T> {
    pub fn new(buffer: T) -> Sctp<T> {
        Sctp { buffer }
    }

    pub fn src(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[sctp_field::SRC])
    }

    pub fn dst(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[sctp_field::DST])
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Sctp<T> {
    pub fn set_src(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[sctp_field::SRC], value)
    }

    pub fn set_dst(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[sctp_field::DST], value)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Icmp<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> Icmp<T> {
    pub fn new(buffer: T) -> Icmp<T> {
        Icmp { buffer }
    }

    pub fn kind(&self) -> u8 {
        self.buffer.as_ref()[0]
    }

    pub fn code(&self) -> u8 {
        self.buffer.as_ref()[1]
    }
}
