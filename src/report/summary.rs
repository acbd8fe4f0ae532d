//! Cross-record aggregation: by counterparty, by period, and global figures.

use super::ReportRow;
use crate::domain::{CounterpartyId, Decimal, Period, SettlementStatus, SettlementTotals};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterpartySummary {
    pub counterparty_id: CounterpartyId,
    pub counterparty_name: String,
    pub record_count: usize,
    pub totals: SettlementTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub period: Period,
    pub record_count: usize,
    pub totals: SettlementTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub record_count: usize,
    pub count_by_status: BTreeMap<SettlementStatus, usize>,
    pub totals: SettlementTotals,
    /// Mean gross per record; 0 without records.
    pub average_gross: Decimal,
}

/// Per-counterparty sums, highest gross first. Counterparties with equal
/// gross keep the order in which they first appear in `rows`.
pub fn by_counterparty(rows: &[ReportRow], money_scale: u32) -> Vec<CounterpartySummary> {
    let mut order: Vec<CounterpartySummary> = Vec::new();
    let mut position: HashMap<&CounterpartyId, usize> = HashMap::new();

    for row in rows {
        let idx = *position.entry(&row.counterparty_id).or_insert_with(|| {
            order.push(CounterpartySummary {
                counterparty_id: row.counterparty_id.clone(),
                counterparty_name: row.counterparty_name.clone(),
                record_count: 0,
                totals: SettlementTotals::zero(),
            });
            order.len() - 1
        });
        let summary = &mut order[idx];
        summary.record_count += 1;
        summary.totals += row.totals;
    }

    order.sort_by(|a, b| b.totals.gross.cmp(&a.totals.gross));
    for summary in &mut order {
        summary.totals = summary.totals.rounded(money_scale);
    }
    order
}

/// Per-period sums in chronological order.
pub fn by_period(rows: &[ReportRow], money_scale: u32) -> Vec<PeriodSummary> {
    let mut periods: BTreeMap<Period, (usize, SettlementTotals)> = BTreeMap::new();
    for row in rows {
        let entry = periods.entry(row.period).or_default();
        entry.0 += 1;
        entry.1 += row.totals;
    }
    periods
        .into_iter()
        .map(|(period, (record_count, totals))| PeriodSummary {
            period,
            record_count,
            totals: totals.rounded(money_scale),
        })
        .collect()
}

pub fn summarize(rows: &[ReportRow], money_scale: u32) -> ReportSummary {
    let mut count_by_status = BTreeMap::from([
        (SettlementStatus::Draft, 0),
        (SettlementStatus::Finalized, 0),
    ]);
    let mut totals = SettlementTotals::zero();
    for row in rows {
        *count_by_status.entry(row.status).or_default() += 1;
        totals += row.totals;
    }

    let average_gross = if rows.is_empty() {
        Decimal::zero()
    } else {
        totals.gross / Decimal::from(rows.len() as i64)
    };

    ReportSummary {
        record_count: rows.len(),
        count_by_status,
        totals: totals.rounded(money_scale),
        average_gross: average_gross.round_money(money_scale),
    }
}
