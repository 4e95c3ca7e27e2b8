use core::fmt;

/// OpenFlow 1.1 group numbers
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum GroupNumber {
    /// Last usable group number.
    Max,
    /// All groups, for group delete commands.
    All,
    /// Special value used in some requests when no group is specified
    /// (i.e. wildcarded).
    Any,
    /// A regular group number.
    Regular(u32),
}

impl ::core::convert::From<u32> for GroupNumber {
    fn from(value: u32) -> Self {
        match value {
            0xffff_ff00 => GroupNumber::Max,
            0xffff_fffc => GroupNumber::All,
            0xffff_ffff => GroupNumber::Any,
            other => GroupNumber::Regular(other),
        }
    }
}

impl ::core::convert::From<GroupNumber> for u32 {
    fn from(value: GroupNumber) -> Self {
        match value {
            GroupNumber::Max => 0xffff_ff00,
            GroupNumber::All => 0xffff_fffc,
            GroupNumber::Any => 0xffff_ffff,
            GroupNumber::Regular(other) => other,
        }
    }
}

impl GroupNumber {
    /// The highest regular group number.
    pub const MAX: u32 = 0xffff_ff00;
    /// Wire value of [`GroupNumber::All`].
    pub const ALL: u32 = 0xffff_fffc;
    /// Wire value of [`GroupNumber::Any`].
    pub const ANY: u32 = 0xffff_ffff;
}

impl fmt::Display for GroupNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GroupNumber::Max => write!(f, "max"),
            GroupNumber::All => write!(f, "all"),
            GroupNumber::Any => write!(f, "any"),
            GroupNumber::Regular(group) => write!(f, "{}", group),
        }
    }
}
