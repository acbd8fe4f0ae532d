//! Commission table groups: named, time-bounded agreement versions.

use crate::domain::{GroupId, Period, TableId};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionTableGroup {
    pub id: GroupId,
    pub name: String,
    pub valid_from: NaiveDate,
    /// Open-ended when absent.
    #[serde(default)]
    pub valid_to: Option<NaiveDate>,
    pub active: bool,
    #[serde(default, deserialize_with = "dedup_members")]
    member_table_ids: Vec<TableId>,
}

impl CommissionTableGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>, valid_from: NaiveDate) -> Self {
        Self {
            id: GroupId::new(id),
            name: name.into(),
            valid_from,
            valid_to: None,
            active: true,
            member_table_ids: Vec::new(),
        }
    }

    pub fn until(mut self, valid_to: NaiveDate) -> Self {
        self.valid_to = Some(valid_to);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn with_member(mut self, table_id: impl Into<String>) -> Self {
        self.add_member(TableId::new(table_id));
        self
    }

    /// Appends `table_id` unless already a member. Returns whether it was added.
    pub fn add_member(&mut self, table_id: TableId) -> bool {
        if self.contains(&table_id) {
            return false;
        }
        self.member_table_ids.push(table_id);
        true
    }

    pub fn remove_member(&mut self, table_id: &TableId) -> bool {
        let before = self.member_table_ids.len();
        self.member_table_ids.retain(|id| id != table_id);
        before != self.member_table_ids.len()
    }

    pub fn member_table_ids(&self) -> &[TableId] {
        &self.member_table_ids
    }

    pub fn contains(&self, table_id: &TableId) -> bool {
        self.member_table_ids.iter().any(|id| id == table_id)
    }

    /// Whether any day of `period` lies inside the validity window.
    pub fn covers(&self, period: Period) -> bool {
        if self.valid_from > period.last_day() {
            return false;
        }
        match self.valid_to {
            Some(to) => to >= period.first_day(),
            None => true,
        }
    }

    /// Active and valid for `period`: eligible for new settlements.
    pub fn applies_to(&self, period: Period) -> bool {
        self.active && self.covers(period)
    }
}

fn dedup_members<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<TableId>, D::Error> {
    let raw = Vec::<TableId>::deserialize(deserializer)?;
    let mut members: Vec<TableId> = Vec::with_capacity(raw.len());
    for id in raw {
        if !members.contains(&id) {
            members.push(id);
        }
    }
    Ok(members)
}
