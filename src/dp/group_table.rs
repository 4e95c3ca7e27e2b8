//! The group table: storage, group-mod handling with loop prevention,
//! and bucket selection.

use std::collections::{BTreeMap, HashSet};

use crate::dp::actions;
use crate::error::{GroupModFailedCode, OfpError};
use crate::wire::group_mod::{Bucket, Command, GroupMod, GroupType};
use crate::wire::stats::{BucketCounter, GroupDescStats, GroupStats};
use crate::{GroupNumber, Result};

/// Groups per table.
pub const MAX_ENTRIES: usize = 4096;
/// Buckets across all groups.
pub const MAX_BUCKETS: usize = 8192;

/// Chooses the bucket a select group executes for one packet.
///
/// The table ships with weighted round-robin; any other distribution can
/// be plugged in by implementing this trait for the per-group state.
pub trait SelectPolicy {
    /// Pick a bucket index, or `None` when no bucket is eligible.
    fn select(&mut self, buckets: &[Bucket]) -> Option<usize>;
}

/// Weighted round-robin: each cycle grants every bucket `weight` slots,
/// consumed one per packet. Zero-weight buckets never receive traffic.
#[derive(Debug, Clone, Default)]
pub struct WeightedRoundRobin {
    credits: Vec<u16>,
    cursor: usize,
}

impl SelectPolicy for WeightedRoundRobin {
    fn select(&mut self, buckets: &[Bucket]) -> Option<usize> {
        if buckets.iter().all(|bucket| bucket.weight == 0) {
            return None;
        }
        if self.credits.len() != buckets.len() || self.credits.iter().all(|&c| c == 0) {
            self.credits = buckets.iter().map(|bucket| bucket.weight).collect();
        }
        for step in 0..buckets.len() {
            let index = (self.cursor + step) % buckets.len();
            if self.credits[index] > 0 {
                self.credits[index] -= 1;
                self.cursor = (index + 1) % buckets.len();
                return Some(index);
            }
        }
        None
    }
}

/// One group entry.
#[derive(Debug, Clone)]
pub struct GroupEntry {
    pub group_id: u32,
    pub group_type: GroupType,
    pub buckets: Vec<Bucket>,
    pub packet_count: u64,
    pub byte_count: u64,
    pub bucket_counters: Vec<BucketCounter>,
    pub select: WeightedRoundRobin,
}

impl GroupEntry {
    fn new(msg: &GroupMod) -> GroupEntry {
        GroupEntry {
            group_id: msg.group_id,
            group_type: msg.group_type,
            buckets: msg.buckets.clone(),
            packet_count: 0,
            byte_count: 0,
            bucket_counters: vec![BucketCounter::default(); msg.buckets.len()],
            select: WeightedRoundRobin::default(),
        }
    }

    /// Groups this entry forwards to.
    fn out_groups(&self) -> Vec<u32> {
        let mut out = Vec::new();
        for bucket in &self.buckets {
            for action in &bucket.actions {
                if let crate::wire::action::Action::Group(group) = *action {
                    out.push(group);
                }
            }
        }
        out
    }

    /// Whether any bucket forwards to the given group.
    pub fn has_out_group(&self, group: u32) -> bool {
        self.buckets
            .iter()
            .any(|bucket| actions::list_has_out_group(&bucket.actions, group))
    }

    pub fn stats(&self, ref_count: u32) -> GroupStats {
        GroupStats {
            group_id: self.group_id,
            ref_count,
            packet_count: self.packet_count,
            byte_count: self.byte_count,
            bucket_stats: self.bucket_counters.clone(),
        }
    }

    pub fn desc(&self) -> GroupDescStats {
        GroupDescStats {
            group_type: self.group_type,
            group_id: self.group_id,
            buckets: self.buckets.clone(),
        }
    }
}

/// The group table.
#[derive(Debug, Default)]
pub struct GroupTable {
    entries: BTreeMap<u32, GroupEntry>,
    buckets_total: usize,
}

impl GroupTable {
    pub fn new() -> GroupTable {
        GroupTable::default()
    }

    pub fn contains(&self, group_id: u32) -> bool {
        self.entries.contains_key(&group_id)
    }

    pub fn get(&self, group_id: u32) -> Option<&GroupEntry> {
        self.entries.get(&group_id)
    }

    pub fn get_mut(&mut self, group_id: u32) -> Option<&mut GroupEntry> {
        self.entries.get_mut(&group_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply a group-mod. Bucket actions are assumed validated by the
    /// caller against the ports and this table.
    pub fn group_mod(&mut self, msg: &GroupMod) -> Result<()> {
        match msg.command {
            Command::Add => self.add(msg),
            Command::Modify => self.modify(msg),
            Command::Delete => self.delete(msg),
            // rejected by the codec
            Command::_Unknown(_) => {
                Err(OfpError::GroupModFailed(GroupModFailedCode::InvalidGroup).into())
            }
        }
    }

    fn add(&mut self, msg: &GroupMod) -> Result<()> {
        if self.entries.contains_key(&msg.group_id) {
            return Err(OfpError::GroupModFailed(GroupModFailedCode::GroupExists).into());
        }
        if self.entries.len() >= MAX_ENTRIES {
            return Err(OfpError::GroupModFailed(GroupModFailedCode::OutOfGroups).into());
        }
        if self.buckets_total + msg.buckets.len() > MAX_BUCKETS {
            return Err(OfpError::GroupModFailed(GroupModFailedCode::OutOfBuckets).into());
        }
        if msg.group_type == GroupType::Indirect && msg.buckets.len() != 1 {
            return Err(OfpError::GroupModFailed(GroupModFailedCode::InvalidGroup).into());
        }
        let entry = GroupEntry::new(msg);
        if !self.is_loop_free(&entry) {
            return Err(OfpError::GroupModFailed(GroupModFailedCode::Loop).into());
        }
        self.buckets_total += entry.buckets.len();
        self.entries.insert(entry.group_id, entry);
        Ok(())
    }

    fn modify(&mut self, msg: &GroupMod) -> Result<()> {
        let old_buckets = match self.entries.get(&msg.group_id) {
            Some(entry) => entry.buckets.len(),
            None => {
                return Err(OfpError::GroupModFailed(GroupModFailedCode::UnknownGroup).into());
            }
        };
        if self.buckets_total - old_buckets + msg.buckets.len() > MAX_BUCKETS {
            return Err(OfpError::GroupModFailed(GroupModFailedCode::OutOfBuckets).into());
        }
        if msg.group_type == GroupType::Indirect && msg.buckets.len() != 1 {
            return Err(OfpError::GroupModFailed(GroupModFailedCode::InvalidGroup).into());
        }
        let entry = GroupEntry::new(msg);
        if !self.is_loop_free(&entry) {
            return Err(OfpError::GroupModFailed(GroupModFailedCode::Loop).into());
        }
        self.buckets_total = self.buckets_total - old_buckets + entry.buckets.len();
        self.entries.insert(msg.group_id, entry);
        Ok(())
    }

    fn delete(&mut self, msg: &GroupMod) -> Result<()> {
        if msg.group_id == GroupNumber::ALL {
            self.entries.clear();
            self.buckets_total = 0;
            return Ok(());
        }
        if let Some(entry) = self.entries.get(&msg.group_id) {
            // groups chained to this one keep it alive
            let chained = self
                .entries
                .values()
                .any(|other| other.group_id != msg.group_id && other.has_out_group(msg.group_id));
            if chained {
                return Err(
                    OfpError::GroupModFailed(GroupModFailedCode::ChainingUnsupported).into(),
                );
            }
            self.buckets_total -= entry.buckets.len();
            self.entries.remove(&msg.group_id);
        }
        // deleting a non-existing group is not an error
        Ok(())
    }

    /// Whether the table stays acyclic with `candidate` in place of (or
    /// in addition to) the entry with its id.
    ///
    /// Iterated leaf removal: remove every group whose forward edges
    /// lead only to removed or non-existing groups; the table is loop
    /// free exactly when this reaches the empty set.
    fn is_loop_free(&self, candidate: &GroupEntry) -> bool {
        let mut edges: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for entry in self.entries.values() {
            if entry.group_id != candidate.group_id {
                edges.insert(entry.group_id, entry.out_groups());
            }
        }
        edges.insert(candidate.group_id, candidate.out_groups());

        let mut removed: HashSet<u32> = HashSet::new();
        loop {
            let mut progress = false;
            let mut remaining = false;
            for (group_id, targets) in &edges {
                if removed.contains(group_id) {
                    continue;
                }
                remaining = true;
                let is_leaf = targets
                    .iter()
                    .all(|target| removed.contains(target) || !edges.contains_key(target));
                if is_leaf {
                    removed.insert(*group_id);
                    progress = true;
                }
            }
            if !remaining {
                return true;
            }
            if !progress {
                return false;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::action::Action;
    use crate::PortNumber;

    fn bucket(actions: Vec<Action>) -> Bucket {
        Bucket {
            weight: 1,
            watch_port: PortNumber::Any.into(),
            watch_group: GroupNumber::ANY,
            actions,
        }
    }

    fn add(group_id: u32, group_type: GroupType, buckets: Vec<Bucket>) -> GroupMod {
        GroupMod {
            command: Command::Add,
            group_type,
            group_id,
            buckets,
        }
    }

    #[test]
    fn test_add_and_delete() {
        let mut table = GroupTable::new();
        let msg = add(
            7,
            GroupType::All,
            vec![
                bucket(vec![Action::Output { port: 2, max_len: 0 }]),
                bucket(vec![Action::Output { port: 3, max_len: 0 }]),
            ],
        );
        table.group_mod(&msg).unwrap();
        assert!(table.contains(7));
        assert_eq!(table.buckets_total, 2);

        assert_eq!(
            table.group_mod(&msg),
            Err(OfpError::GroupModFailed(GroupModFailedCode::GroupExists).into())
        );

        let delete = GroupMod {
            command: Command::Delete,
            group_type: GroupType::All,
            group_id: 7,
            buckets: vec![],
        };
        table.group_mod(&delete).unwrap();
        assert!(!table.contains(7));
        assert_eq!(table.buckets_total, 0);

        // deleting again is fine
        table.group_mod(&delete).unwrap();
    }

    #[test]
    fn test_self_reference_is_a_loop() {
        let mut table = GroupTable::new();
        let msg = add(8, GroupType::Indirect, vec![bucket(vec![Action::Group(8)])]);
        assert_eq!(
            table.group_mod(&msg),
            Err(OfpError::GroupModFailed(GroupModFailedCode::Loop).into())
        );
        assert!(!table.contains(8));
    }

    #[test]
    fn test_chain_is_allowed_cycle_is_not() {
        let mut table = GroupTable::new();
        table
            .group_mod(&add(
                1,
                GroupType::Indirect,
                vec![bucket(vec![Action::Output { port: 1, max_len: 0 }])],
            ))
            .unwrap();
        table
            .group_mod(&add(2, GroupType::Indirect, vec![bucket(vec![Action::Group(1)])]))
            .unwrap();
        table
            .group_mod(&add(3, GroupType::Indirect, vec![bucket(vec![Action::Group(2)])]))
            .unwrap();

        // pointing 1 at 3 closes the cycle 1 -> 3 -> 2 -> 1
        let close = GroupMod {
            command: Command::Modify,
            group_type: GroupType::Indirect,
            group_id: 1,
            buckets: vec![bucket(vec![Action::Group(3)])],
        };
        assert_eq!(
            table.group_mod(&close),
            Err(OfpError::GroupModFailed(GroupModFailedCode::Loop).into())
        );
        // the failed modify left the old entry in place
        assert!(!table.get(1).unwrap().has_out_group(3));
    }

    #[test]
    fn test_chained_group_cannot_be_deleted() {
        let mut table = GroupTable::new();
        table
            .group_mod(&add(
                1,
                GroupType::Indirect,
                vec![bucket(vec![Action::Output { port: 1, max_len: 0 }])],
            ))
            .unwrap();
        table
            .group_mod(&add(2, GroupType::Indirect, vec![bucket(vec![Action::Group(1)])]))
            .unwrap();

        let delete = GroupMod {
            command: Command::Delete,
            group_type: GroupType::Indirect,
            group_id: 1,
            buckets: vec![],
        };
        assert_eq!(
            table.group_mod(&delete),
            Err(OfpError::GroupModFailed(GroupModFailedCode::ChainingUnsupported).into())
        );

        // delete the referer first, then the chain target
        let delete2 = GroupMod { group_id: 2, ..delete.clone() };
        table.group_mod(&delete2).unwrap();
        table.group_mod(&delete).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_delete_all() {
        let mut table = GroupTable::new();
        table
            .group_mod(&add(
                1,
                GroupType::Indirect,
                vec![bucket(vec![Action::Output { port: 1, max_len: 0 }])],
            ))
            .unwrap();
        table
            .group_mod(&add(2, GroupType::Indirect, vec![bucket(vec![Action::Group(1)])]))
            .unwrap();

        let delete_all = GroupMod {
            command: Command::Delete,
            group_type: GroupType::All,
            group_id: GroupNumber::ALL,
            buckets: vec![],
        };
        table.group_mod(&delete_all).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.buckets_total, 0);
    }

    #[test]
    fn test_indirect_requires_one_bucket() {
        let mut table = GroupTable::new();
        let msg = add(5, GroupType::Indirect, vec![]);
        assert_eq!(
            table.group_mod(&msg),
            Err(OfpError::GroupModFailed(GroupModFailedCode::InvalidGroup).into())
        );
    }

    #[test]
    fn test_weighted_round_robin() {
        let buckets = vec![
            Bucket { weight: 2, ..bucket(vec![]) },
            Bucket { weight: 0, ..bucket(vec![]) },
            Bucket { weight: 1, ..bucket(vec![]) },
        ];
        let mut wrr = WeightedRoundRobin::default();
        let picks: Vec<usize> = (0..6).map(|_| wrr.select(&buckets).unwrap()).collect();
        // two cycles: bucket 0 twice and bucket 2 once per cycle,
        // bucket 1 never
        assert_eq!(picks.iter().filter(|&&i| i == 0).count(), 4);
        assert_eq!(picks.iter().filter(|&&i| i == 2).count(), 2);
        assert!(!picks.contains(&1));
    }

    #[test]
    fn test_select_with_all_zero_weights() {
        let buckets = vec![Bucket { weight: 0, ..bucket(vec![]) }];
        let mut wrr = WeightedRoundRobin::default();
        assert_eq!(wrr.select(&buckets), None);
    }
}
