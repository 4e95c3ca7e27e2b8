//! Wire-level codec checks against literal byte strings, and re-emission
//! of everything the datapath side round-trips.

use smoltcp::wire::{EthernetAddress, Ipv4Address};

use ofdp::match_std::{wildcards, StandardMatch};
use ofdp::wire::action::Action;
use ofdp::wire::error_msg::ErrorMsg;
use ofdp::wire::flow_mod::{Command, FlowMod};
use ofdp::wire::group_mod::{self, Bucket, GroupMod, GroupType};
use ofdp::wire::instruction::Instruction;
use ofdp::wire::packet_in::{PacketIn, Reason};
use ofdp::wire::{Body, Message, NO_BUFFER};
use ofdp::{GroupNumber, OfpError, PortNumber};

fn round_trip(msg: Message) {
    let bytes = msg.to_bytes().unwrap();
    let parsed = Message::from_bytes(&bytes).expect("canonical bytes parse");
    assert_eq!(parsed, msg);
    // byte-exact re-emission
    assert_eq!(parsed.to_bytes().unwrap(), bytes);
}

#[test]
fn hello_from_literal_bytes() {
    let bytes = hex::decode("020000080000002a").unwrap();
    let msg = Message::from_bytes(&bytes).unwrap();
    assert_eq!(msg.xid, 42);
    assert_eq!(msg.body, Body::Hello);
    assert_eq!(msg.to_bytes().unwrap(), bytes);
}

#[test]
fn echo_reply_from_literal_bytes() {
    // type 3, length 12, xid 7, payload deadbeef
    let bytes = hex::decode("0203000c00000007deadbeef").unwrap();
    let msg = Message::from_bytes(&bytes).unwrap();
    assert_eq!(msg.body, Body::EchoReply(vec![0xde, 0xad, 0xbe, 0xef]));
    assert_eq!(msg.to_bytes().unwrap(), bytes);
}

#[test]
fn output_action_from_literal_bytes() {
    use ofdp::Repr;
    let bytes = hex::decode("00000010fffffffd00400000000000000000").unwrap();
    // 18 bytes in the buffer, record length is 16
    let action = Action::parse(&bytes).unwrap();
    assert_eq!(
        action,
        Action::Output { port: PortNumber::Controller.into(), max_len: 64 }
    );
    assert_eq!(action.buffer_len(), 16);
}

#[test]
fn wrong_version_is_rejected() {
    let bytes = hex::decode("010000080000002a").unwrap();
    match Message::from_bytes(&bytes) {
        Err(ofdp::Error::Ofp(OfpError::HelloFailed(_))) => {}
        other => panic!("expected a hello failure, got {:?}", other),
    }
}

#[test]
fn truncated_header_is_rejected() {
    let bytes = hex::decode("02000008000000").unwrap();
    assert!(Message::from_bytes(&bytes).is_err());
    assert!(Message::from_bytes(&[]).is_err());
}

#[test]
fn flow_mod_round_trip() {
    let mut flow_match = StandardMatch::any();
    flow_match.wildcards &= !(wildcards::IN_PORT | wildcards::DL_TYPE | wildcards::TP_DST);
    flow_match.in_port = 1;
    flow_match.dl_type = 0x0800;
    flow_match.tp_dst = 443;
    flow_match.dl_src = EthernetAddress([0, 1, 2, 3, 4, 5]);
    flow_match.dl_src_mask = EthernetAddress([0; 6]);

    let msg = Message::new(
        0x0102_0304,
        Body::FlowMod(FlowMod {
            cookie: 0xfeed_f00d,
            cookie_mask: !0,
            table_id: 2,
            command: Command::Add,
            idle_timeout: 30,
            hard_timeout: 300,
            priority: 0x8000,
            buffer_id: NO_BUFFER,
            out_port: PortNumber::Any.into(),
            out_group: GroupNumber::ANY,
            flags: 1,
            flow_match,
            instructions: vec![
                Instruction::ApplyActions(vec![
                    Action::SetDlDst(EthernetAddress([6, 5, 4, 3, 2, 1])),
                    Action::SetNwSrc(Ipv4Address([192, 168, 0, 1])),
                    Action::DecNwTtl,
                ]),
                Instruction::WriteMetadata { metadata: 9, mask: 0xff },
                Instruction::GotoTable(4),
            ],
        }),
    );
    round_trip(msg);
}

#[test]
fn group_mod_round_trip() {
    let msg = Message::new(
        5,
        Body::GroupMod(GroupMod {
            command: group_mod::Command::Modify,
            group_type: GroupType::FastFailover,
            group_id: 11,
            buckets: vec![
                Bucket {
                    weight: 0,
                    watch_port: 2,
                    watch_group: GroupNumber::ANY,
                    actions: vec![Action::Output { port: 2, max_len: 0 }],
                },
                Bucket {
                    weight: 0,
                    watch_port: 3,
                    watch_group: GroupNumber::ANY,
                    actions: vec![Action::Output { port: 3, max_len: 0 }],
                },
            ],
        }),
    );
    round_trip(msg);
}

#[test]
fn packet_in_round_trip() {
    let msg = Message::new(
        0,
        Body::PacketIn(PacketIn {
            buffer_id: 3,
            in_port: 1,
            in_phy_port: 1,
            total_len: 60,
            reason: Reason::Action,
            table_id: 2,
            data: vec![0xab; 32],
        }),
    );
    round_trip(msg);
}

#[test]
fn error_message_round_trip() {
    let msg = Message::new(
        77,
        Body::Error(ErrorMsg::new(
            OfpError::BadRequest(ofdp::error::BadRequestCode::BadLen),
            &[2, 0, 0, 8],
        )),
    );
    let bytes = msg.to_bytes().unwrap();
    // type 1 = error, error type 1 code 6
    assert_eq!(&bytes[8..12], &[0x00, 0x01, 0x00, 0x06]);
    round_trip(msg);
}

#[test]
fn match_wire_size_is_88() {
    use ofdp::Repr;
    assert_eq!(StandardMatch::any().buffer_len(), 88);
}
