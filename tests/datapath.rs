//! End-to-end exercises: control messages in, forwarding behavior out.

mod common;

use common::{control, datapath};

use smoltcp::wire::Ipv4Address;

use ofdp::csum;
use ofdp::frame::testing;
use ofdp::match_std::{wildcards, StandardMatch};
use ofdp::wire::action::Action;
use ofdp::wire::flow_mod::{Command, FlowMod, TABLE_ALL};
use ofdp::wire::group_mod::{self, Bucket, GroupMod, GroupType};
use ofdp::wire::instruction::Instruction;
use ofdp::wire::packet_in;
use ofdp::wire::packet_out::PacketOut;
use ofdp::wire::stats::{FlowStatsRequest, StatsReply, StatsRequest};
use ofdp::wire::switch_config::{flags, SwitchConfig};
use ofdp::wire::{Body, Message, NO_BUFFER};
use ofdp::{GroupNumber, OfpError, PortNumber};

fn flow_mod_add(table_id: u8, priority: u16) -> FlowMod {
    FlowMod {
        cookie: 0,
        cookie_mask: 0,
        table_id,
        command: Command::Add,
        idle_timeout: 0,
        hard_timeout: 0,
        priority,
        buffer_id: NO_BUFFER,
        out_port: PortNumber::Any.into(),
        out_group: GroupNumber::ANY,
        flags: 0,
        flow_match: StandardMatch::any(),
        instructions: vec![],
    }
}

fn bucket(actions: Vec<Action>) -> Bucket {
    Bucket {
        weight: 1,
        watch_port: PortNumber::Any.into(),
        watch_group: GroupNumber::ANY,
        actions,
    }
}

#[test]
fn rewrite_and_forward() {
    let (mut dp, frames, messages) = datapath();

    // table=0, priority=100, match in_port=1 dl_type=0x0800
    // nw_dst=10.0.0.2/32, apply [set_nw_dst=10.0.0.5, output:2]
    let mut msg = flow_mod_add(0, 100);
    msg.flow_match.wildcards &= !(wildcards::IN_PORT | wildcards::DL_TYPE);
    msg.flow_match.in_port = 1;
    msg.flow_match.dl_type = 0x0800;
    msg.flow_match.nw_dst = Ipv4Address([10, 0, 0, 2]);
    msg.flow_match.nw_dst_mask = Ipv4Address([0, 0, 0, 0]);
    msg.instructions = vec![Instruction::ApplyActions(vec![
        Action::SetNwDst(Ipv4Address([10, 0, 0, 5])),
        Action::Output { port: 2, max_len: 0 },
    ])];
    control(&mut dp, &Message::new(1, Body::FlowMod(msg)));
    assert!(messages.borrow().is_empty(), "flow mod must not fail");

    let frame = testing::tcp_frame(60, 64, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
    dp.process_frame(&frame, 1);

    let sent = frames.borrow();
    assert_eq!(sent.len(), 1);
    let (port, out) = &sent[0];
    assert_eq!(*port, 2);
    assert_eq!(out.len(), frame.len());
    // destination rewritten
    assert_eq!(&out[30..34], &[10, 0, 0, 5]);
    // the IPv4 checksum was maintained
    assert_eq!(csum::checksum(&out[14..34]), 0);

    // a packet for another destination misses and goes to the controller
    drop(sent);
    let other = testing::tcp_frame(60, 64, [10, 0, 0, 1], [10, 0, 0, 9], 1234, 80);
    dp.process_frame(&other, 1);
    assert_eq!(frames.borrow().len(), 1);
    let sent_messages = messages.borrow();
    let (_, last) = sent_messages.last().unwrap();
    match &last.body {
        Body::PacketIn(pi) => {
            assert_eq!(pi.reason, packet_in::Reason::NoMatch);
            assert_eq!(pi.in_port, 1);
        }
        other => panic!("expected a packet-in, got {:?}", other),
    }
}

#[test]
fn all_group_duplicates_packet() {
    let (mut dp, frames, messages) = datapath();

    let group = GroupMod {
        command: group_mod::Command::Add,
        group_type: GroupType::All,
        group_id: 7,
        buckets: vec![
            bucket(vec![Action::Output { port: 2, max_len: 0 }]),
            bucket(vec![Action::Output { port: 3, max_len: 0 }]),
        ],
    };
    control(&mut dp, &Message::new(1, Body::GroupMod(group)));

    let mut msg = flow_mod_add(0, 1);
    msg.instructions = vec![Instruction::ApplyActions(vec![Action::Group(7)])];
    control(&mut dp, &Message::new(2, Body::FlowMod(msg)));
    assert!(messages.borrow().is_empty());

    let frame = testing::tcp_frame(60, 64, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
    dp.process_frame(&frame, 1);

    let sent = frames.borrow();
    let ports: Vec<u32> = sent.iter().map(|(port, _)| *port).collect();
    assert_eq!(ports, vec![2, 3]);
    assert_eq!(sent[0].1, frame);
    assert_eq!(sent[1].1, frame);

    // group stats count one packet and both buckets
    drop(sent);
    control(&mut dp, &Message::new(3, Body::StatsRequest(StatsRequest::Group(7))));
    let sent_messages = messages.borrow();
    let (_, reply) = sent_messages.last().unwrap();
    match &reply.body {
        Body::StatsReply(StatsReply::Group(stats)) => {
            assert_eq!(stats.len(), 1);
            assert_eq!(stats[0].packet_count, 1);
            assert_eq!(stats[0].ref_count, 1);
            assert_eq!(stats[0].bucket_stats.len(), 2);
            assert_eq!(stats[0].bucket_stats[0].packet_count, 1);
        }
        other => panic!("expected group stats, got {:?}", other),
    }
}

#[test]
fn self_referencing_group_is_rejected() {
    let (mut dp, _frames, messages) = datapath();

    let group = GroupMod {
        command: group_mod::Command::Add,
        group_type: GroupType::Indirect,
        group_id: 8,
        buckets: vec![bucket(vec![Action::Group(8)])],
    };
    control(&mut dp, &Message::new(9, Body::GroupMod(group)));

    let sent = messages.borrow();
    assert_eq!(sent.len(), 1);
    let (_, reply) = &sent[0];
    assert_eq!(reply.xid, 9);
    match &reply.body {
        Body::Error(err) => {
            assert_eq!(
                err.error,
                OfpError::GroupModFailed(ofdp::error::GroupModFailedCode::Loop)
            );
        }
        other => panic!("expected an error, got {:?}", other),
    }
}

#[test]
fn delete_all_tables_empties_the_pipeline() {
    let (mut dp, _frames, messages) = datapath();

    for table_id in [0u8, 1, 5] {
        let mut msg = flow_mod_add(table_id, 10);
        msg.flow_match.wildcards &= !wildcards::IN_PORT;
        msg.flow_match.in_port = u32::from(table_id) + 1;
        msg.instructions = vec![Instruction::ApplyActions(vec![Action::Output {
            port: 2,
            max_len: 0,
        }])];
        control(&mut dp, &Message::new(1, Body::FlowMod(msg)));
    }
    assert!(messages.borrow().is_empty());

    let mut delete = flow_mod_add(TABLE_ALL, 0);
    delete.command = Command::Delete;
    control(&mut dp, &Message::new(2, Body::FlowMod(delete)));

    let request = StatsRequest::Flow(FlowStatsRequest {
        table_id: TABLE_ALL,
        out_port: PortNumber::Any.into(),
        out_group: GroupNumber::ANY,
        cookie: 0,
        cookie_mask: 0,
        flow_match: StandardMatch::any(),
    });
    control(&mut dp, &Message::new(3, Body::StatsRequest(request)));

    let sent = messages.borrow();
    let (_, reply) = sent.last().unwrap();
    assert_eq!(reply.xid, 3);
    match &reply.body {
        Body::StatsReply(StatsReply::Flow(stats)) => assert!(stats.is_empty()),
        other => panic!("expected flow stats, got {:?}", other),
    }
}

#[test]
fn packet_out_pushes_vlan() {
    let (mut dp, frames, messages) = datapath();

    let frame = testing::tcp_frame(60, 64, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
    let msg = PacketOut {
        buffer_id: NO_BUFFER,
        in_port: PortNumber::Controller.into(),
        actions: vec![
            Action::PushVlan(0x8100),
            Action::SetVlanVid(42),
            Action::Output { port: 4, max_len: 0 },
        ],
        data: frame.clone(),
    };
    control(&mut dp, &Message::new(5, Body::PacketOut(msg)));
    assert!(messages.borrow().is_empty());

    let sent = frames.borrow();
    assert_eq!(sent.len(), 1);
    let (port, out) = &sent[0];
    assert_eq!(*port, 4);
    assert_eq!(out.len(), frame.len() + 4);
    // tag sits behind the ethernet header
    assert_eq!(&out[12..14], &[0x81, 0x00]);
    assert_eq!(u16::from_be_bytes([out[14], out[15]]) & 0xfff, 42);
    assert_eq!(&out[16..18], &[0x08, 0x00]);
    // the payload is untouched
    assert_eq!(&out[18..], &frame[14..]);
}

#[test]
fn invalid_ttl_goes_to_controller_when_configured() {
    let (mut dp, frames, messages) = datapath();

    let mut msg = flow_mod_add(0, 1);
    msg.instructions = vec![Instruction::ApplyActions(vec![Action::Output {
        port: 2,
        max_len: 0,
    }])];
    control(&mut dp, &Message::new(1, Body::FlowMod(msg)));

    // without the flag the packet is dropped silently
    let syn = testing::tcp_frame(60, 1, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
    dp.process_frame(&syn, 1);
    assert!(frames.borrow().is_empty());
    assert!(messages.borrow().is_empty());

    let config = SwitchConfig {
        flags: flags::INVALID_TTL_TO_CONTROLLER,
        miss_send_len: 128,
    };
    control(&mut dp, &Message::new(2, Body::SetConfig(config)));

    dp.process_frame(&syn, 1);
    assert!(frames.borrow().is_empty(), "the frame must not be forwarded");
    let sent = messages.borrow();
    let (_, notification) = sent.last().unwrap();
    match &notification.body {
        Body::PacketIn(pi) => {
            assert_eq!(pi.reason, packet_in::Reason::NoMatch);
            assert_eq!(pi.total_len, 60);
        }
        other => panic!("expected a packet-in, got {:?}", other),
    }
}

#[test]
fn pipeline_goto_and_metadata() {
    let (mut dp, frames, messages) = datapath();

    // table 0 writes metadata and continues to table 1
    let mut first = flow_mod_add(0, 10);
    first.instructions = vec![
        Instruction::WriteMetadata { metadata: 0x55, mask: 0xff },
        Instruction::GotoTable(1),
    ];
    control(&mut dp, &Message::new(1, Body::FlowMod(first)));

    // table 1 matches on the metadata written upstream
    let mut second = flow_mod_add(1, 10);
    second.flow_match.metadata = 0x55;
    second.flow_match.metadata_mask = !0xffu64;
    second.instructions = vec![Instruction::WriteActions(vec![Action::Output {
        port: 3,
        max_len: 0,
    }])];
    control(&mut dp, &Message::new(2, Body::FlowMod(second)));
    assert!(messages.borrow().is_empty());

    let frame = testing::tcp_frame(60, 64, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
    dp.process_frame(&frame, 1);

    let sent = frames.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, 3);
}

#[test]
fn goto_backwards_is_rejected() {
    let (mut dp, _frames, messages) = datapath();

    let mut msg = flow_mod_add(2, 10);
    msg.instructions = vec![Instruction::GotoTable(1)];
    control(&mut dp, &Message::new(4, Body::FlowMod(msg)));

    let sent = messages.borrow();
    let (_, reply) = sent.last().unwrap();
    match &reply.body {
        Body::Error(err) => assert_eq!(
            err.error,
            OfpError::BadInstruction(ofdp::error::BadInstructionCode::BadTableId)
        ),
        other => panic!("expected an error, got {:?}", other),
    }
}

#[test]
fn echo_features_and_barrier() {
    let (mut dp, _frames, messages) = datapath();

    control(&mut dp, &Message::new(1, Body::EchoRequest(vec![1, 2, 3])));
    control(&mut dp, &Message::new(2, Body::FeaturesRequest));
    control(&mut dp, &Message::new(3, Body::BarrierRequest));

    let sent = messages.borrow();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].1.body, Body::EchoReply(vec![1, 2, 3]));
    match &sent[1].1.body {
        Body::FeaturesReply(reply) => {
            assert_eq!(reply.datapath_id, 0x00cafe);
            assert_eq!(reply.n_tables, 16);
            assert_eq!(reply.ports.len(), 4);
        }
        other => panic!("expected a features reply, got {:?}", other),
    }
    assert_eq!(sent[2].1.body, Body::BarrierReply);
    assert_eq!(sent[2].1.xid, 3);
}

#[test]
fn flood_skips_ingress_port() {
    let (mut dp, frames, _messages) = datapath();

    let mut msg = flow_mod_add(0, 1);
    msg.instructions = vec![Instruction::ApplyActions(vec![Action::Output {
        port: PortNumber::Flood.into(),
        max_len: 0,
    }])];
    control(&mut dp, &Message::new(1, Body::FlowMod(msg)));

    let frame = testing::tcp_frame(60, 64, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
    dp.process_frame(&frame, 2);

    let ports: Vec<u32> = frames.borrow().iter().map(|(port, _)| *port).collect();
    assert_eq!(ports, vec![1, 3, 4]);
}

#[test]
fn output_to_ingress_port_is_refused() {
    let (mut dp, frames, _messages) = datapath();

    let mut msg = flow_mod_add(0, 1);
    msg.instructions = vec![Instruction::ApplyActions(vec![Action::Output {
        port: 1,
        max_len: 0,
    }])];
    control(&mut dp, &Message::new(1, Body::FlowMod(msg)));

    let frame = testing::tcp_frame(60, 64, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
    dp.process_frame(&frame, 1);
    assert!(frames.borrow().is_empty());

    dp.process_frame(&frame, 2);
    assert_eq!(frames.borrow().len(), 1);
}

#[test]
fn select_group_spreads_traffic() {
    let (mut dp, frames, _messages) = datapath();

    let group = GroupMod {
        command: group_mod::Command::Add,
        group_type: GroupType::Select,
        group_id: 5,
        buckets: vec![
            Bucket { weight: 1, ..bucket(vec![Action::Output { port: 2, max_len: 0 }]) },
            Bucket { weight: 1, ..bucket(vec![Action::Output { port: 3, max_len: 0 }]) },
        ],
    };
    control(&mut dp, &Message::new(1, Body::GroupMod(group)));

    let mut msg = flow_mod_add(0, 1);
    msg.instructions = vec![Instruction::ApplyActions(vec![Action::Group(5)])];
    control(&mut dp, &Message::new(2, Body::FlowMod(msg)));

    let frame = testing::tcp_frame(60, 64, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
    for _ in 0..4 {
        dp.process_frame(&frame, 1);
    }

    let sent = frames.borrow();
    let to_two = sent.iter().filter(|(port, _)| *port == 2).count();
    let to_three = sent.iter().filter(|(port, _)| *port == 3).count();
    assert_eq!(to_two, 2);
    assert_eq!(to_three, 2);
}

#[test]
fn chained_group_delete_fails() {
    let (mut dp, _frames, messages) = datapath();

    let leaf = GroupMod {
        command: group_mod::Command::Add,
        group_type: GroupType::Indirect,
        group_id: 1,
        buckets: vec![bucket(vec![Action::Output { port: 2, max_len: 0 }])],
    };
    control(&mut dp, &Message::new(1, Body::GroupMod(leaf)));

    let chain = GroupMod {
        command: group_mod::Command::Add,
        group_type: GroupType::Indirect,
        group_id: 2,
        buckets: vec![bucket(vec![Action::Group(1)])],
    };
    control(&mut dp, &Message::new(2, Body::GroupMod(chain)));
    assert!(messages.borrow().is_empty());

    let delete = GroupMod {
        command: group_mod::Command::Delete,
        group_type: GroupType::Indirect,
        group_id: 1,
        buckets: vec![],
    };
    control(&mut dp, &Message::new(3, Body::GroupMod(delete)));

    let sent = messages.borrow();
    let (_, reply) = sent.last().unwrap();
    match &reply.body {
        Body::Error(err) => assert_eq!(
            err.error,
            OfpError::GroupModFailed(ofdp::error::GroupModFailedCode::ChainingUnsupported)
        ),
        other => panic!("expected an error, got {:?}", other),
    }
}

#[test]
fn dangling_group_reference_drops_silently() {
    let (mut dp, frames, messages) = datapath();

    let group = GroupMod {
        command: group_mod::Command::Add,
        group_type: GroupType::Indirect,
        group_id: 3,
        buckets: vec![bucket(vec![Action::Output { port: 2, max_len: 0 }])],
    };
    control(&mut dp, &Message::new(1, Body::GroupMod(group)));

    let mut msg = flow_mod_add(0, 1);
    msg.instructions = vec![Instruction::ApplyActions(vec![Action::Group(3)])];
    control(&mut dp, &Message::new(2, Body::FlowMod(msg)));

    let delete = GroupMod {
        command: group_mod::Command::Delete,
        group_type: GroupType::Indirect,
        group_id: 3,
        buckets: vec![],
    };
    control(&mut dp, &Message::new(3, Body::GroupMod(delete)));
    assert!(messages.borrow().is_empty());

    // the flow entry survived; executing it now drops the packet
    let frame = testing::tcp_frame(60, 64, [10, 0, 0, 1], [10, 0, 0, 2], 1234, 80);
    dp.process_frame(&frame, 1);
    assert!(frames.borrow().is_empty());
}
