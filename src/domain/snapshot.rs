//! Read-only input snapshot and its advisory consistency checks.

use crate::domain::{
    Counterparty, CounterpartyId, Decimal, GroupId, RecordId, SettlementRecord, TableId,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Everything the engine reads for one calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub counterparties: Vec<Counterparty>,
    #[serde(default)]
    pub settlements: Vec<SettlementRecord>,
}

/// A data-model invariant the snapshot does not hold. None of these are
/// enforced structurally; they are reported, not repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotIssue {
    SplitSumMismatch {
        counterparty: CounterpartyId,
        table: TableId,
        sum: Decimal,
    },
    MultipleActiveGroups {
        counterparty: CounterpartyId,
        table: TableId,
        groups: Vec<GroupId>,
    },
    UnknownMemberTable {
        counterparty: CounterpartyId,
        group: GroupId,
        table: TableId,
    },
    DanglingSettlement {
        record: RecordId,
        counterparty: CounterpartyId,
        group: GroupId,
    },
}

impl fmt::Display for SnapshotIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotIssue::SplitSumMismatch { counterparty, table, sum } => write!(
                f,
                "{}/{}: split percentages sum to {} instead of 100",
                counterparty, table, sum
            ),
            SnapshotIssue::MultipleActiveGroups { counterparty, table, groups } => {
                let names: Vec<&str> = groups.iter().map(|g| g.as_str()).collect();
                write!(
                    f,
                    "{}/{}: member of several active groups ({})",
                    counterparty,
                    table,
                    names.join(", ")
                )
            }
            SnapshotIssue::UnknownMemberTable { counterparty, group, table } => write!(
                f,
                "{}/{}: member table {} does not exist",
                counterparty, group, table
            ),
            SnapshotIssue::DanglingSettlement { record, counterparty, group } => write!(
                f,
                "settlement {} references missing group {}/{}",
                record, counterparty, group
            ),
        }
    }
}

impl Snapshot {
    pub fn new(counterparties: Vec<Counterparty>, settlements: Vec<SettlementRecord>) -> Self {
        Self {
            counterparties,
            settlements,
        }
    }

    pub fn counterparty(&self, id: &CounterpartyId) -> Option<&Counterparty> {
        self.counterparties.iter().find(|c| &c.id == id)
    }

    pub fn settlement(&self, id: &RecordId) -> Option<&SettlementRecord> {
        self.settlements.iter().find(|s| &s.id == id)
    }

    /// Checks the unenforced invariants. Split sums are compared against
    /// 100 within `split_tolerance`; supplemental and treasury tables are
    /// exempt because their split lives elsewhere.
    pub fn validate(&self, split_tolerance: Decimal) -> Vec<SnapshotIssue> {
        let mut issues = Vec::new();

        for cp in &self.counterparties {
            for table in &cp.tables {
                if table.is_supplemental_income || table.treasury_detail().is_some() {
                    continue;
                }
                let sum = table.counterparty_split_percent + table.platform_split_percent;
                if (sum - Decimal::hundred()).abs() > split_tolerance {
                    issues.push(SnapshotIssue::SplitSumMismatch {
                        counterparty: cp.id.clone(),
                        table: table.id.clone(),
                        sum,
                    });
                }
            }

            let known: HashSet<&TableId> = cp.tables.iter().map(|t| &t.id).collect();
            let mut active_groups: HashMap<&TableId, Vec<GroupId>> = HashMap::new();
            for group in &cp.groups {
                for member in group.member_table_ids() {
                    if !known.contains(member) {
                        issues.push(SnapshotIssue::UnknownMemberTable {
                            counterparty: cp.id.clone(),
                            group: group.id.clone(),
                            table: member.clone(),
                        });
                    }
                    if group.active {
                        active_groups.entry(member).or_default().push(group.id.clone());
                    }
                }
            }

            // Table order keeps the report deterministic.
            for table in &cp.tables {
                if let Some(groups) = active_groups.remove(&table.id) {
                    if groups.len() > 1 {
                        issues.push(SnapshotIssue::MultipleActiveGroups {
                            counterparty: cp.id.clone(),
                            table: table.id.clone(),
                            groups,
                        });
                    }
                }
            }
        }

        for record in &self.settlements {
            let resolved = self
                .counterparty(&record.counterparty_id)
                .and_then(|cp| cp.group(&record.group_id));
            if resolved.is_none() {
                issues.push(SnapshotIssue::DanglingSettlement {
                    record: record.id.clone(),
                    counterparty: record.counterparty_id.clone(),
                    group: record.group_id.clone(),
                });
            }
        }

        issues
    }
}
