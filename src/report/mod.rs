//! Settlement reporting over a snapshot: filtered per-record rows plus
//! counterparty, period and global aggregates.

pub mod filter;
pub mod summary;

pub use filter::{Bounds, ReportFilter, ReportFilterInput};
pub use summary::{
    by_counterparty, by_period, summarize, CounterpartySummary, PeriodSummary, ReportSummary,
};

use crate::domain::{
    CounterpartyId, GroupId, Period, RecordId, SettlementStatus, SettlementTotals, Snapshot,
};
use crate::engine::{SettlementCalculator, TotalsSource};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One settlement record with its resolved totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub record_id: RecordId,
    pub counterparty_id: CounterpartyId,
    pub counterparty_name: String,
    pub group_id: GroupId,
    /// Live group name when the group still exists, the record's cached name otherwise.
    pub group_name: String,
    pub period: Period,
    pub status: SettlementStatus,
    pub created_at: DateTime<Utc>,
    pub totals: SettlementTotals,
    pub source: TotalsSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReport {
    pub rows: Vec<ReportRow>,
    pub by_counterparty: Vec<CounterpartySummary>,
    pub by_period: Vec<PeriodSummary>,
    pub summary: ReportSummary,
}

impl SettlementReport {
    /// Resolves every record's totals (cache first), applies `filter`, and
    /// aggregates what remains. Row totals stay exact; aggregates are
    /// rounded to `money_scale` places.
    pub fn build(snapshot: &Snapshot, filter: &ReportFilter, money_scale: u32) -> Self {
        let calculator = SettlementCalculator::new(snapshot);

        let rows: Vec<ReportRow> = snapshot
            .settlements
            .iter()
            .filter_map(|record| {
                let resolved = calculator.totals_for(record);
                let counterparty = calculator.counterparty(&record.counterparty_id);
                let live_group_name = counterparty
                    .and_then(|cp| cp.group(&record.group_id))
                    .map(|g| g.name.as_str());

                let mut names = vec![record.group_name.as_str()];
                if let Some(live) = live_group_name {
                    names.insert(0, live);
                }
                if !filter.matches(record, &resolved.totals, &names) {
                    return None;
                }

                Some(ReportRow {
                    record_id: record.id.clone(),
                    counterparty_id: record.counterparty_id.clone(),
                    counterparty_name: counterparty
                        .map(|cp| cp.name.clone())
                        .unwrap_or_else(|| record.counterparty_id.to_string()),
                    group_id: record.group_id.clone(),
                    group_name: live_group_name
                        .unwrap_or(record.group_name.as_str())
                        .to_string(),
                    period: record.period,
                    status: record.status,
                    created_at: record.created_at,
                    totals: resolved.totals,
                    source: resolved.source,
                })
            })
            .collect();

        let report = SettlementReport {
            by_counterparty: by_counterparty(&rows, money_scale),
            by_period: by_period(&rows, money_scale),
            summary: summarize(&rows, money_scale),
            rows,
        };

        tracing::info!(
            records = snapshot.settlements.len(),
            matched = report.rows.len(),
            counterparties = report.by_counterparty.len(),
            "settlement report built"
        );
        report
    }
}
