//! The OpenFlow 1.1 error space: a coarse error type paired with a fine
//! error code. Every decoder, validator and datapath mutator in this crate
//! that can fail on controller input fails with one of these pairs, which
//! is then carried back to the sender in an OFPT_ERROR message.

use core::fmt;

enum_with_unknown! {
    /// Represent the type of the error
    pub doc enum Kind(u16) {
        /// Hello protocol failed.
        HelloFailed = 0,
        /// Request was not understood.
        BadRequest = 1,
        /// Error in action description.
        BadAction = 2,
        /// Error in instruction list.
        BadInstruction = 3,
        /// Error in match.
        BadMatch = 4,
        /// Problem modifying flow entry.
        FlowModFailed = 5,
        /// Problem modifying group entry.
        GroupModFailed = 6,
        /// Port mod request failed.
        PortModFailed = 7,
        /// Table mod request failed.
        TableModFailed = 8,
        /// Queue operation failed.
        QueueOpFailed = 9
    }
}

enum_with_unknown! {
    /// The code associated to a `HelloFailed` error
    pub doc enum HelloFailedCode(u16) {
        /// No compatible version.
        Incompatible = 0,
        /// Permissions error.
        Eperm = 1
    }
}

enum_with_unknown! {
    /// The code associated to a `BadRequest` error
    pub doc enum BadRequestCode(u16) {
        /// ofp_header.version not supported.
        BadVersion = 0,
        /// ofp_header.type not supported.
        BadType = 1,
        /// ofp_stats_request.type not supported.
        BadStat = 2,
        /// Experimenter id not supported.
        BadExperimenter = 3,
        /// Experimenter subtype not supported.
        BadSubtype = 4,
        /// Permissions error.
        Eperm = 5,
        /// Wrong request length for type.
        BadLen = 6,
        /// Specified buffer has already been used.
        BufferEmpty = 7,
        /// Specified buffer does not exist.
        BufferUnknown = 8,
        /// Specified table-id invalid or does not exist.
        BadTableId = 9
    }
}

enum_with_unknown! {
    /// The code associated to a `BadAction` error
    pub doc enum BadActionCode(u16) {
        /// Unknown action type.
        BadType = 0,
        /// Length problem in actions.
        BadLen = 1,
        /// Unknown experimenter id specified.
        BadExperimenter = 2,
        /// Unknown action type for experimenter id.
        BadExperimenterType = 3,
        /// Problem validating output port.
        BadOutPort = 4,
        /// Bad action argument.
        BadArgument = 5,
        /// Permissions error.
        Eperm = 6,
        /// Can't handle this many actions.
        TooMany = 7,
        /// Problem validating output queue.
        BadQueue = 8,
        /// Invalid group id in forward action.
        BadOutGroup = 9,
        /// Action can't apply for this match.
        MatchInconsistent = 10,
        /// Action order is unsupported for the action list in an
        /// Apply-Actions instruction.
        UnsupportedOrder = 11,
        /// Actions uses an unsupported tag/encap.
        BadTag = 12
    }
}

enum_with_unknown! {
    /// The code associated to a `BadInstruction` error
    pub doc enum BadInstructionCode(u16) {
        /// Unknown instruction.
        UnknownInst = 0,
        /// Switch or table does not support the instruction.
        UnsupInst = 1,
        /// Invalid Table-ID specified.
        BadTableId = 2,
        /// Metadata value unsupported by datapath.
        UnsupMetadata = 3,
        /// Metadata mask value unsupported by datapath.
        UnsupMetadataMask = 4,
        /// Specific experimenter instruction unsupported.
        UnsupExpInst = 5
    }
}

enum_with_unknown! {
    /// The code associated to a `BadMatch` error
    pub doc enum BadMatchCode(u16) {
        /// Unsupported match type specified by the match.
        BadType = 0,
        /// Length problem in match.
        BadLen = 1,
        /// Match uses an unsupported tag/encap.
        BadTag = 2,
        /// Unsupported datalink addr mask.
        BadDlAddrMask = 3,
        /// Unsupported network addr mask.
        BadNwAddrMask = 4,
        /// Unsupported wildcard specified in the match.
        BadWildcards = 5,
        /// Unsupported field in the match.
        BadField = 6,
        /// Unsupported value in a match field.
        BadValue = 7
    }
}

enum_with_unknown! {
    /// The code associated to a `FlowModFailed` error
    pub doc enum FlowModFailedCode(u16) {
        /// Unspecified error.
        Unknown = 0,
        /// Flow not added because table was full.
        TableFull = 1,
        /// Table does not exist.
        BadTableId = 2,
        /// Attempted to add overlapping flow with CHECK_OVERLAP flag set.
        Overlap = 3,
        /// Permissions error.
        Eperm = 4,
        /// Flow not added because of unsupported idle/hard timeout.
        BadTimeout = 5,
        /// Unsupported or unknown command.
        BadCommand = 6
    }
}

enum_with_unknown! {
    /// The code associated to a `GroupModFailed` error
    pub doc enum GroupModFailedCode(u16) {
        /// Group not added because a group ADD attempted to replace an
        /// already-present group.
        GroupExists = 0,
        /// Group not added because the group specified is invalid.
        InvalidGroup = 1,
        /// Switch does not support unequal load sharing with select groups.
        WeightUnsupported = 2,
        /// The group table is full.
        OutOfGroups = 3,
        /// The maximum number of action buckets for a group has been
        /// exceeded.
        OutOfBuckets = 4,
        /// Switch does not support groups that forward to groups.
        ChainingUnsupported = 5,
        /// This group cannot watch the watch_port or watch_group specified.
        WatchUnsupported = 6,
        /// Group entry would cause a loop.
        Loop = 7,
        /// Group not modified because a group MODIFY attempted to modify a
        /// non-existent group.
        UnknownGroup = 8
    }
}

enum_with_unknown! {
    /// The code associated to a `PortModFailed` error
    pub doc enum PortModFailedCode(u16) {
        /// Specified port number does not exist.
        BadPort = 0,
        /// Specified hardware address does not match the port number.
        BadHwAddr = 1,
        /// Specified config is invalid.
        BadConfig = 2,
        /// Specified advertise is invalid.
        BadAdvertise = 3
    }
}

enum_with_unknown! {
    /// The code associated to a `TableModFailed` error
    pub doc enum TableModFailedCode(u16) {
        /// Specified table does not exist.
        BadTable = 0,
        /// Specified config is invalid.
        BadConfig = 1
    }
}

enum_with_unknown! {
    /// The code associated to a `QueueOpFailed` error
    pub doc enum QueueOpFailedCode(u16) {
        /// Invalid port (or port does not exist).
        BadPort = 0,
        /// Queue does not exist.
        BadQueue = 1,
        /// Permissions error.
        Eperm = 2
    }
}

/// An OpenFlow error: the error type together with its type-specific code.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OfpError {
    /// Hello protocol failed.
    HelloFailed(HelloFailedCode),
    /// Request was not understood.
    BadRequest(BadRequestCode),
    /// Error in action description.
    BadAction(BadActionCode),
    /// Error in instruction list.
    BadInstruction(BadInstructionCode),
    /// Error in match.
    BadMatch(BadMatchCode),
    /// Problem modifying flow entry.
    FlowModFailed(FlowModFailedCode),
    /// Problem modifying group entry.
    GroupModFailed(GroupModFailedCode),
    /// Port mod request failed.
    PortModFailed(PortModFailedCode),
    /// Table mod request failed.
    TableModFailed(TableModFailedCode),
    /// Queue operation failed.
    QueueOpFailed(QueueOpFailedCode),
    /// An error type this crate does not know.
    Unknown(u16, u16),
}

impl OfpError {
    /// Build an error from its wire `(type, code)` pair.
    #[rustfmt::skip]
    pub fn from_pair(kind: u16, code: u16) -> OfpError {
        use self::Kind::*;

        match Kind::from(kind) {
            HelloFailed    => OfpError::HelloFailed(HelloFailedCode::from(code)),
            BadRequest     => OfpError::BadRequest(BadRequestCode::from(code)),
            BadAction      => OfpError::BadAction(BadActionCode::from(code)),
            BadInstruction => OfpError::BadInstruction(BadInstructionCode::from(code)),
            BadMatch       => OfpError::BadMatch(BadMatchCode::from(code)),
            FlowModFailed  => OfpError::FlowModFailed(FlowModFailedCode::from(code)),
            GroupModFailed => OfpError::GroupModFailed(GroupModFailedCode::from(code)),
            PortModFailed  => OfpError::PortModFailed(PortModFailedCode::from(code)),
            TableModFailed => OfpError::TableModFailed(TableModFailedCode::from(code)),
            QueueOpFailed  => OfpError::QueueOpFailed(QueueOpFailedCode::from(code)),
            _Unknown(t)    => OfpError::Unknown(t, code),
        }
    }

    /// Return the wire `(type, code)` pair of this error.
    #[rustfmt::skip]
    pub fn pair(&self) -> (u16, u16) {
        match *self {
            OfpError::HelloFailed(code)    => (Kind::HelloFailed.into(),    code.into()),
            OfpError::BadRequest(code)     => (Kind::BadRequest.into(),     code.into()),
            OfpError::BadAction(code)      => (Kind::BadAction.into(),      code.into()),
            OfpError::BadInstruction(code) => (Kind::BadInstruction.into(), code.into()),
            OfpError::BadMatch(code)       => (Kind::BadMatch.into(),       code.into()),
            OfpError::FlowModFailed(code)  => (Kind::FlowModFailed.into(),  code.into()),
            OfpError::GroupModFailed(code) => (Kind::GroupModFailed.into(), code.into()),
            OfpError::PortModFailed(code)  => (Kind::PortModFailed.into(),  code.into()),
            OfpError::TableModFailed(code) => (Kind::TableModFailed.into(), code.into()),
            OfpError::QueueOpFailed(code)  => (Kind::QueueOpFailed.into(),  code.into()),
            OfpError::Unknown(kind, code)  => (kind, code),
        }
    }
}

impl fmt::Display for OfpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (kind, code) = self.pair();
        match *self {
            OfpError::Unknown(..) => write!(f, "unknown error type={} code={}", kind, code),
            _ => write!(f, "{:?}", self),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pair_round_trip() {
        let err = OfpError::GroupModFailed(GroupModFailedCode::Loop);
        assert_eq!(err.pair(), (6, 7));
        assert_eq!(OfpError::from_pair(6, 7), err);

        let err = OfpError::from_pair(0xcafe, 3);
        assert_eq!(err, OfpError::Unknown(0xcafe, 3));
        assert_eq!(err.pair(), (0xcafe, 3));
    }

    #[test]
    fn test_unknown_codes_survive() {
        let err = OfpError::from_pair(1, 0x7777);
        assert_eq!(err, OfpError::BadRequest(BadRequestCode::_Unknown(0x7777)));
        assert_eq!(err.pair(), (1, 0x7777));
    }
}
