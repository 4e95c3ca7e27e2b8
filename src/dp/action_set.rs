//! The action set carried by a packet through the pipeline.
//!
//! The set holds at most one action of each kind; writing replaces the
//! previous action of that kind. Execution drains the set in the fixed
//! order required by the protocol, independent of write order.

use log::warn;

use crate::wire::action::{Action, Kind};

/// Execution order of the action set. TTL-copy-in first, tag pops, tag
/// pushes, TTL-copy-out, TTL decrements, field rewrites, queue, group,
/// output last.
#[rustfmt::skip]
const SET_ORDER: [Kind; 25] = [
    Kind::CopyTtlIn,
    Kind::PopVlan,
    Kind::PopMpls,
    Kind::PushMpls,
    Kind::PushVlan,
    Kind::CopyTtlOut,
    Kind::DecMplsTtl,
    Kind::DecNwTtl,
    Kind::SetVlanVid,
    Kind::SetVlanPcp,
    Kind::SetDlSrc,
    Kind::SetDlDst,
    Kind::SetNwSrc,
    Kind::SetNwDst,
    Kind::SetNwTos,
    Kind::SetNwEcn,
    Kind::SetTpSrc,
    Kind::SetTpDst,
    Kind::SetMplsLabel,
    Kind::SetMplsTc,
    Kind::SetMplsTtl,
    Kind::SetNwTtl,
    Kind::SetQueue,
    Kind::Group,
    Kind::Output,
];

/// One optional slot per action kind, in execution order.
#[derive(Debug, Clone)]
pub struct ActionSet {
    slots: [Option<Action>; SET_ORDER.len()],
}

impl Default for ActionSet {
    fn default() -> ActionSet {
        ActionSet::new()
    }
}

impl ActionSet {
    pub fn new() -> ActionSet {
        ActionSet {
            slots: core::array::from_fn(|_| None),
        }
    }

    /// Write one action into the set, replacing any previous action of
    /// the same kind.
    pub fn write(&mut self, action: &Action) {
        match SET_ORDER.iter().position(|&kind| kind == action.kind()) {
            Some(slot) => self.slots[slot] = Some(action.clone()),
            // experimenter actions have no slot in the 1.1 action set
            None => warn!("action {} cannot be written to an action set", action),
        }
    }

    /// Write a whole action list into the set.
    pub fn write_all(&mut self, actions: &[Action]) {
        for action in actions {
            self.write(action);
        }
    }

    /// Remove every action.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Take every action out of the set, in execution order.
    pub fn drain(&mut self) -> Vec<Action> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_replaces_same_kind() {
        let mut set = ActionSet::new();
        set.write(&Action::Output { port: 1, max_len: 0 });
        set.write(&Action::Output { port: 2, max_len: 0 });
        assert_eq!(set.drain(), vec![Action::Output { port: 2, max_len: 0 }]);
    }

    #[test]
    fn test_drains_in_canonical_order() {
        let mut set = ActionSet::new();
        set.write_all(&[
            Action::Output { port: 1, max_len: 0 },
            Action::SetNwTtl(4),
            Action::PopVlan,
            Action::Group(9),
            Action::CopyTtlIn,
        ]);
        assert_eq!(
            set.drain(),
            vec![
                Action::CopyTtlIn,
                Action::PopVlan,
                Action::SetNwTtl(4),
                Action::Group(9),
                Action::Output { port: 1, max_len: 0 },
            ]
        );
        // drained once, the set is empty
        assert!(set.is_empty());
        assert_eq!(set.drain(), vec![]);
    }

    #[test]
    fn test_clear() {
        let mut set = ActionSet::new();
        set.write(&Action::DecNwTtl);
        set.clear();
        assert!(set.is_empty());
    }
}
