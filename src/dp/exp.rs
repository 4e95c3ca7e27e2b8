//! Experimenter extension hooks.
//!
//! The codec parses experimenter messages, actions and instructions
//! into raw `{experimenter, data}` payloads; these callbacks give them
//! meaning. Without a registered bundle, experimenter messages fail
//! with BAD_REQUEST/BAD_EXPERIMENTER and experimenter actions and
//! instructions are skipped with a warning.

use crate::dp::packet::Packet;
use crate::dp::Sender;
use crate::wire::{ExperimenterMsg, Message};
use crate::Result;

pub trait ExperimenterHooks {
    /// Handle an experimenter message; an optional reply is sent back to
    /// the originating sender.
    fn message(&mut self, msg: &ExperimenterMsg, sender: Sender) -> Result<Option<Message>>;

    /// Execute an experimenter action on a packet.
    fn action(&mut self, pkt: &mut Packet, experimenter: u32, data: &[u8]);

    /// Execute an experimenter instruction on a packet.
    fn instruction(&mut self, pkt: &mut Packet, experimenter: u32, data: &[u8]);
}
