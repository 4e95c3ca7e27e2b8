//! The flow table pipeline: table storage and flow-mod routing. The
//! packet drive loop lives on the datapath, which owns the collaborators
//! the loop dispatches to.

use std::time::Instant;

use crate::dp::flow_entry::FlowEntry;
use crate::dp::flow_table::FlowTable;
use crate::error::{BadInstructionCode, FlowModFailedCode, OfpError};
use crate::wire::flow_mod::{Command, FlowMod, TABLE_ALL};
use crate::wire::flow_removed::Reason;
use crate::wire::instruction::Instruction;
use crate::Result;

/// Number of flow tables in the pipeline.
pub const PIPELINE_TABLES: usize = 16;

#[derive(Debug)]
pub struct Pipeline {
    pub tables: Vec<FlowTable>,
}

impl Default for Pipeline {
    fn default() -> Pipeline {
        Pipeline::new()
    }
}

impl Pipeline {
    pub fn new() -> Pipeline {
        Pipeline {
            tables: (0..PIPELINE_TABLES as u8).map(FlowTable::new).collect(),
        }
    }

    pub fn table(&self, table_id: u8) -> Option<&FlowTable> {
        self.tables.get(usize::from(table_id))
    }

    pub fn table_mut(&mut self, table_id: u8) -> Option<&mut FlowTable> {
        self.tables.get_mut(usize::from(table_id))
    }

    /// Route a flow-mod to its table, or to every table for a delete
    /// with table id 0xff. Returns the removed entries with their table
    /// id, for flow-removed notification.
    pub fn flow_mod(
        &mut self,
        msg: &FlowMod,
        now: Instant,
    ) -> Result<Vec<(u8, FlowEntry, Reason)>> {
        validate_gotos(msg)?;

        if msg.table_id == TABLE_ALL {
            // the codec only lets 0xff through on deletes
            let mut removed = Vec::new();
            for table in self.tables.iter_mut() {
                let table_id = table.table_id;
                for (entry, reason) in table.flow_mod(msg, now)? {
                    removed.push((table_id, entry, reason));
                }
            }
            return Ok(removed);
        }

        let table = match self.table_mut(msg.table_id) {
            Some(table) => table,
            None => {
                return Err(OfpError::FlowModFailed(FlowModFailedCode::BadTableId).into());
            }
        };
        let table_id = table.table_id;
        let removed = table.flow_mod(msg, now)?;
        Ok(removed
            .into_iter()
            .map(|(entry, reason)| (table_id, entry, reason))
            .collect())
    }

    /// Remove every expired entry from every table.
    pub fn expire(&mut self, now: Instant) -> Vec<(u8, FlowEntry, Reason)> {
        let mut expired = Vec::new();
        for table in self.tables.iter_mut() {
            let table_id = table.table_id;
            for (entry, reason) in table.expire(now) {
                expired.push((table_id, entry, reason));
            }
        }
        expired
    }

    /// How many flow entries across all tables forward to the group.
    pub fn count_group_refs(&self, group: u32) -> u32 {
        self.tables
            .iter()
            .map(|table| table.count_group_refs(group))
            .sum()
    }
}

/// A goto-table must lead forward, to an existing table.
fn validate_gotos(msg: &FlowMod) -> Result<()> {
    if msg.command != Command::Add
        && msg.command != Command::Modify
        && msg.command != Command::ModifyStrict
    {
        return Ok(());
    }
    for instruction in &msg.instructions {
        if let Instruction::GotoTable(target) = *instruction {
            if target <= msg.table_id || usize::from(target) >= PIPELINE_TABLES {
                return Err(OfpError::BadInstruction(BadInstructionCode::BadTableId).into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::match_std::StandardMatch;
    use crate::wire::NO_BUFFER;
    use crate::{GroupNumber, PortNumber};

    fn flow_mod(table_id: u8, command: Command) -> FlowMod {
        FlowMod {
            cookie: 0,
            cookie_mask: 0,
            table_id,
            command,
            idle_timeout: 0,
            hard_timeout: 0,
            priority: 1,
            buffer_id: NO_BUFFER,
            out_port: PortNumber::Any.into(),
            out_group: GroupNumber::ANY,
            flags: 0,
            flow_match: StandardMatch::any(),
            instructions: vec![],
        }
    }

    #[test]
    fn test_goto_must_lead_forward() {
        let mut pipeline = Pipeline::new();
        let now = Instant::now();

        let mut msg = flow_mod(2, Command::Add);
        msg.instructions = vec![Instruction::GotoTable(2)];
        assert_eq!(
            pipeline.flow_mod(&msg, now),
            Err(OfpError::BadInstruction(BadInstructionCode::BadTableId).into())
        );

        msg.instructions = vec![Instruction::GotoTable(1)];
        assert!(pipeline.flow_mod(&msg, now).is_err());

        msg.instructions = vec![Instruction::GotoTable(3)];
        assert!(pipeline.flow_mod(&msg, now).is_ok());

        msg.instructions = vec![Instruction::GotoTable(PIPELINE_TABLES as u8)];
        assert!(pipeline.flow_mod(&msg, now).is_err());
    }

    #[test]
    fn test_bad_table_id() {
        let mut pipeline = Pipeline::new();
        let msg = flow_mod(PIPELINE_TABLES as u8, Command::Add);
        assert_eq!(
            pipeline.flow_mod(&msg, Instant::now()),
            Err(OfpError::FlowModFailed(FlowModFailedCode::BadTableId).into())
        );
    }

    #[test]
    fn test_delete_all_tables() {
        let mut pipeline = Pipeline::new();
        let now = Instant::now();
        for table_id in [0, 3, 7] {
            pipeline.flow_mod(&flow_mod(table_id, Command::Add), now).unwrap();
        }
        assert_eq!(pipeline.table(3).unwrap().entries().len(), 1);

        let delete = flow_mod(TABLE_ALL, Command::Delete);
        let removed = pipeline.flow_mod(&delete, now).unwrap();
        assert_eq!(removed.len(), 3);
        for table in &pipeline.tables {
            assert!(table.entries().is_empty());
        }
    }
}
