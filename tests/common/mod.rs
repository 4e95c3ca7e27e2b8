//! Test doubles for the datapath's external collaborators.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use smoltcp::wire::EthernetAddress;

use ofdp::dp::{Buffers, ControlChannel, Datapath, Packet, Ports, Sender};
use ofdp::wire::port_desc::PortDesc;
use ofdp::wire::{Message, NO_BUFFER};

/// Frames transmitted on regular ports, as `(port_no, frame)` pairs.
pub type SentFrames = Rc<RefCell<Vec<(u32, Vec<u8>)>>>;
/// Messages sent up the control channel.
pub type SentMessages = Rc<RefCell<Vec<(Option<Sender>, Message)>>>;

pub fn port_desc(port_no: u32) -> PortDesc {
    PortDesc {
        port_no,
        hw_addr: EthernetAddress([2, 0, 0, 0, 0, port_no as u8]),
        name: format!("eth{}", port_no),
        config: 0,
        state: 0,
        curr: 0,
        advertised: 0,
        supported: 0,
        peer: 0,
        curr_speed: 0,
        max_speed: 0,
    }
}

pub struct TestPorts {
    pub descs: Vec<PortDesc>,
    pub sent: SentFrames,
}

impl TestPorts {
    pub fn new(port_count: u32) -> TestPorts {
        TestPorts {
            descs: (1..=port_count).map(port_desc).collect(),
            sent: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl Ports for TestPorts {
    fn output(&mut self, frame: &[u8], port_no: u32, _queue_id: u32, _max_len: u16) {
        self.sent.borrow_mut().push((port_no, frame.to_vec()));
    }

    fn output_all(&mut self, frame: &[u8], in_port: u32, _flood: bool) {
        for desc in &self.descs {
            if desc.port_no != in_port {
                self.sent.borrow_mut().push((desc.port_no, frame.to_vec()));
            }
        }
    }

    fn lookup(&self, port_no: u32) -> Option<&PortDesc> {
        self.descs.iter().find(|desc| desc.port_no == port_no)
    }

    fn list(&self) -> Vec<PortDesc> {
        self.descs.clone()
    }
}

#[derive(Default)]
pub struct TestBuffers {
    parked: HashMap<u32, Packet>,
    next_id: u32,
}

impl Buffers for TestBuffers {
    fn save(&mut self, pkt: &Packet) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.parked.insert(id, pkt.clone());
        id
    }

    fn retrieve(&mut self, buffer_id: u32) -> Option<Packet> {
        if buffer_id == NO_BUFFER {
            return None;
        }
        self.parked.remove(&buffer_id)
    }

    fn capacity(&self) -> u32 {
        256
    }
}

pub struct TestChannel {
    pub sent: SentMessages,
}

impl ControlChannel for TestChannel {
    fn send(&mut self, sender: Option<Sender>, msg: &Message) {
        self.sent.borrow_mut().push((sender, msg.clone()));
    }
}

pub type TestDatapath = Datapath<TestPorts, TestBuffers, TestChannel>;

/// A datapath with four ports and recording collaborators.
pub fn datapath() -> (TestDatapath, SentFrames, SentMessages) {
    let ports = TestPorts::new(4);
    let frames = ports.sent.clone();
    let messages: SentMessages = Rc::new(RefCell::new(Vec::new()));
    let channel = TestChannel {
        sent: messages.clone(),
    };
    let dp = Datapath::new(0x00cafe, ports, TestBuffers::default(), channel);
    (dp, frames, messages)
}

/// Feed one message to the datapath, as bytes over the control channel.
pub fn control(dp: &mut TestDatapath, msg: &Message) {
    dp.handle_message(&msg.to_bytes().unwrap(), Sender(1));
}
