//! Group membership projection and positional sequence numbering.

use crate::domain::{Counterparty, GroupId, TableId};
use std::collections::HashMap;

/// Label returned for a table that belongs to no group.
pub const UNGROUPED_SEQUENCE: &str = "undefined";

/// Derived `table -> group` back-reference for one counterparty.
///
/// Built once per snapshot and never written back. When a table is listed
/// by several groups, an active group wins over an inactive one and the
/// first listed wins among equals.
#[derive(Debug, Clone, Default)]
pub struct MembershipIndex {
    by_table: HashMap<TableId, GroupId>,
}

impl MembershipIndex {
    pub fn build(counterparty: &Counterparty) -> Self {
        let mut by_table: HashMap<TableId, (GroupId, bool)> = HashMap::new();
        for group in &counterparty.groups {
            for table_id in group.member_table_ids() {
                match by_table.get(table_id) {
                    Some((existing, true)) if group.active => {
                        tracing::warn!(
                            counterparty = %counterparty.id,
                            table = %table_id,
                            kept = %existing,
                            ignored = %group.id,
                            "table listed by more than one active group"
                        );
                    }
                    Some((_, true)) => {}
                    Some((_, false)) if !group.active => {}
                    _ => {
                        by_table.insert(table_id.clone(), (group.id.clone(), group.active));
                    }
                }
            }
        }

        Self {
            by_table: by_table
                .into_iter()
                .map(|(table, (group, _))| (table, group))
                .collect(),
        }
    }

    pub fn group_id(&self, table_id: &TableId) -> Option<&GroupId> {
        self.by_table.get(table_id)
    }

    pub fn len(&self) -> usize {
        self.by_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_table.is_empty()
    }
}

/// Position ("KLM") of `table_id` among its group's non-supplemental
/// members, 1-based and zero-padded to two digits.
///
/// Purely positional: recomputed on every call, never stored.
pub fn sequence_label(
    counterparty: &Counterparty,
    index: &MembershipIndex,
    table_id: &TableId,
) -> String {
    let Some(group) = index
        .group_id(table_id)
        .and_then(|group_id| counterparty.group(group_id))
    else {
        return UNGROUPED_SEQUENCE.to_string();
    };

    counterparty
        .member_tables(group)
        .filter(|t| !t.is_supplemental_income)
        .position(|t| &t.id == table_id)
        .map(|pos| format!("{:02}", pos + 1))
        .unwrap_or_else(|| UNGROUPED_SEQUENCE.to_string())
}
