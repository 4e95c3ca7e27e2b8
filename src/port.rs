use core::fmt;

/// OpenFlow 1.1 port numbers
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PortNumber {
    /// Maximum number of physical and logical switch ports.
    Max,
    /// Send the packet out the input port.
    InPort,
    /// Submit the packet to the first flow table. This destination port can
    /// only be used in packet-out messages.
    Table,
    /// Forward using non OpenFlow pipeline.
    Normal,
    /// Flood through all standard ports except the input port and ports
    /// with flooding disabled.
    Flood,
    /// Forward through all standard ports except the input port.
    All,
    /// Send to controller.
    Controller,
    /// Local OpenFlow "port".
    Local,
    /// Special value used in some requests when no port is specified
    /// (i.e. wildcarded).
    Any,
    /// A regular port number.
    Regular(u32),
}

impl ::core::convert::From<u32> for PortNumber {
    fn from(value: u32) -> Self {
        match value {
            0xffff_ff00 => PortNumber::Max,
            0xffff_fff8 => PortNumber::InPort,
            0xffff_fff9 => PortNumber::Table,
            0xffff_fffa => PortNumber::Normal,
            0xffff_fffb => PortNumber::Flood,
            0xffff_fffc => PortNumber::All,
            0xffff_fffd => PortNumber::Controller,
            0xffff_fffe => PortNumber::Local,
            0xffff_ffff => PortNumber::Any,
            other => PortNumber::Regular(other),
        }
    }
}

impl ::core::convert::From<PortNumber> for u32 {
    fn from(value: PortNumber) -> Self {
        match value {
            PortNumber::Max => 0xffff_ff00,
            PortNumber::InPort => 0xffff_fff8,
            PortNumber::Table => 0xffff_fff9,
            PortNumber::Normal => 0xffff_fffa,
            PortNumber::Flood => 0xffff_fffb,
            PortNumber::All => 0xffff_fffc,
            PortNumber::Controller => 0xffff_fffd,
            PortNumber::Local => 0xffff_fffe,
            PortNumber::Any => 0xffff_ffff,
            PortNumber::Regular(other) => other,
        }
    }
}

impl PortNumber {
    /// The highest regular port number.
    pub const MAX: u32 = 0xffff_ff00;

    /// Whether this is a valid target for an OUTPUT action: a non-zero
    /// port number no greater than [`PortNumber::MAX`], or a reserved port
    /// other than ANY.
    pub fn is_valid_output(self) -> bool {
        match self {
            PortNumber::Any => false,
            PortNumber::Regular(p) => p != 0 && p <= PortNumber::MAX,
            _ => true,
        }
    }
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PortNumber::Max => write!(f, "max"),
            PortNumber::InPort => write!(f, "in_port"),
            PortNumber::Table => write!(f, "table"),
            PortNumber::Normal => write!(f, "normal"),
            PortNumber::Flood => write!(f, "flood"),
            PortNumber::All => write!(f, "all"),
            PortNumber::Controller => write!(f, "controller"),
            PortNumber::Local => write!(f, "local"),
            PortNumber::Any => write!(f, "any"),
            PortNumber::Regular(port) => write!(f, "{}", port),
        }
    }
}
