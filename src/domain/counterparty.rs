//! Counterparty: owner of tables, groups and settlement records.

use crate::domain::{
    CommissionTable, CommissionTableGroup, CounterpartyId, GroupId, MembershipIndex, Period,
    TableId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counterparty {
    pub id: CounterpartyId,
    pub name: String,
    #[serde(default)]
    pub tables: Vec<CommissionTable>,
    #[serde(default)]
    pub groups: Vec<CommissionTableGroup>,
}

impl Counterparty {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: CounterpartyId::new(id),
            name: name.into(),
            tables: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: CommissionTable) -> Self {
        self.tables.push(table);
        self
    }

    pub fn with_group(mut self, group: CommissionTableGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn table(&self, id: &TableId) -> Option<&CommissionTable> {
        self.tables.iter().find(|t| &t.id == id)
    }

    pub fn group(&self, id: &GroupId) -> Option<&CommissionTableGroup> {
        self.groups.iter().find(|g| &g.id == id)
    }

    /// The group `table_id` belongs to, resolved by [`MembershipIndex`].
    /// Builds the index on every call; hold one to look up many tables.
    pub fn group_of(&self, table_id: &TableId) -> Option<&CommissionTableGroup> {
        MembershipIndex::build(self)
            .group_id(table_id)
            .and_then(|id| self.group(id))
    }

    /// The agreement version that applies to `period`: an active group
    /// whose validity window covers it. When windows overlap the group
    /// with the latest `valid_from` wins.
    pub fn resolve_group_for_period(&self, period: Period) -> Option<&CommissionTableGroup> {
        self.groups
            .iter()
            .filter(|g| g.applies_to(period))
            .fold(None, |best: Option<&CommissionTableGroup>, g| match best {
                Some(b) if b.valid_from >= g.valid_from => Some(b),
                _ => Some(g),
            })
    }

    /// The tables of `group` that exist on this counterparty, in member order.
    pub fn member_tables<'a>(
        &'a self,
        group: &'a CommissionTableGroup,
    ) -> impl Iterator<Item = &'a CommissionTable> + 'a {
        group
            .member_table_ids()
            .iter()
            .filter_map(move |id| self.table(id))
    }
}
