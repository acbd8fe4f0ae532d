//! Per-record settlement totals: cache first, live recomputation otherwise.

use super::formula::{compute_earning, split, Earning};
use crate::domain::{
    sequence_label, CommissionTable, Counterparty, CounterpartyId, Decimal, MembershipIndex,
    PricingModel, RecordId, SettlementRecord, SettlementTotals, Snapshot, TableId, Term, VolumeKey,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Where a record's totals came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TotalsSource {
    Cached,
    Recomputed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LineKind {
    /// A (table, term) line of a FixedCommission or RevenueShare table.
    Term,
    /// A TreasuryIncome table keyed by table id.
    Treasury,
    /// A supplemental income table keyed by table id.
    Supplemental,
}

/// One contributing volume line of a recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementLine {
    pub table_id: TableId,
    pub term: Option<Term>,
    pub sequence: String,
    pub kind: LineKind,
    pub volume: Decimal,
    pub gross: Decimal,
    pub counterparty_share: Decimal,
    pub platform_share: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementBreakdown {
    pub totals: SettlementTotals,
    pub lines: Vec<SettlementLine>,
}

impl SettlementBreakdown {
    fn push(
        &mut self,
        table: &TableId,
        term: Option<&Term>,
        sequence: String,
        kind: LineKind,
        volume: Decimal,
        earning: Earning,
    ) {
        self.totals.volume += volume;
        self.totals.gross += earning.gross;
        self.totals.counterparty_share += earning.counterparty_share;
        self.totals.platform_share += earning.platform_share;
        self.lines.push(SettlementLine {
            table_id: table.clone(),
            term: term.cloned(),
            sequence,
            kind,
            volume,
            gross: earning.gross,
            counterparty_share: earning.counterparty_share,
            platform_share: earning.platform_share,
        });
    }
}

/// Totals of one record as the reports see them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTotals {
    pub record_id: RecordId,
    pub counterparty_id: CounterpartyId,
    pub totals: SettlementTotals,
    pub source: TotalsSource,
}

struct CounterpartyView<'a> {
    counterparty: &'a Counterparty,
    index: MembershipIndex,
}

/// Computes settlement totals over one snapshot.
///
/// Lookups are built once in [`SettlementCalculator::new`]; every method is
/// a pure function of the snapshot and its arguments.
pub struct SettlementCalculator<'a> {
    counterparties: HashMap<&'a CounterpartyId, CounterpartyView<'a>>,
}

impl<'a> SettlementCalculator<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        let counterparties = snapshot
            .counterparties
            .iter()
            .map(|cp| {
                (
                    &cp.id,
                    CounterpartyView {
                        counterparty: cp,
                        index: MembershipIndex::build(cp),
                    },
                )
            })
            .collect();
        Self { counterparties }
    }

    pub fn counterparty(&self, id: &CounterpartyId) -> Option<&'a Counterparty> {
        self.counterparties.get(id).map(|view| view.counterparty)
    }

    /// Cached totals when the record has them, live recomputation otherwise.
    pub fn totals_for(&self, record: &SettlementRecord) -> RecordTotals {
        let (totals, source) = match record.cached_totals() {
            Some(cached) => (cached, TotalsSource::Cached),
            None => (self.recompute(record).totals, TotalsSource::Recomputed),
        };
        RecordTotals {
            record_id: record.id.clone(),
            counterparty_id: record.counterparty_id.clone(),
            totals,
            source,
        }
    }

    /// Recomputes `record` from the live rate tables, ignoring any cache.
    ///
    /// Missing counterparties, groups and tables contribute nothing.
    pub fn recompute(&self, record: &SettlementRecord) -> SettlementBreakdown {
        let mut breakdown = SettlementBreakdown::default();

        let Some(view) = self.counterparties.get(&record.counterparty_id) else {
            warn!(
                record = %record.id,
                counterparty = %record.counterparty_id,
                "settlement references unknown counterparty"
            );
            return breakdown;
        };
        let cp = view.counterparty;
        let Some(group) = cp.group(&record.group_id) else {
            warn!(
                record = %record.id,
                group = %record.group_id,
                cached_name = %record.group_name,
                "settlement references unknown group"
            );
            return breakdown;
        };

        for table_id in group.member_table_ids() {
            let Some(table) = cp.table(table_id) else {
                warn!(
                    record = %record.id,
                    group = %group.id,
                    table = %table_id,
                    "group member table not found"
                );
                continue;
            };
            if !table.is_live_for(record.period) {
                debug!(
                    record = %record.id,
                    table = %table.id,
                    "table closed before period, skipped"
                );
                continue;
            }

            let sequence = sequence_label(cp, &view.index, &table.id);
            if table.is_supplemental_income {
                add_supplemental(&mut breakdown, record, table, sequence);
            } else {
                add_priced(&mut breakdown, record, table, sequence);
            }
        }

        breakdown
    }

    /// Recomputes and stores the totals as the record's cache. The host
    /// application persists the record afterwards (last writer wins).
    pub fn refresh_cache(&self, record: &mut SettlementRecord) -> SettlementTotals {
        let totals = self.recompute(record).totals;
        record.store_totals(totals);
        totals
    }
}

fn positive_volume(record: &SettlementRecord, key: &VolumeKey) -> Option<Decimal> {
    record
        .volume(key)
        .map(|entry| entry.amount)
        .filter(|amount| amount.is_positive())
}

fn add_priced(
    breakdown: &mut SettlementBreakdown,
    record: &SettlementRecord,
    table: &CommissionTable,
    sequence: String,
) {
    if let PricingModel::TreasuryIncome { .. } = table.pricing {
        let Some(volume) = positive_volume(record, &VolumeKey::table(&table.id)) else {
            return;
        };
        if let Some(earning) = compute_earning(table, None, volume) {
            breakdown.push(&table.id, None, sequence, LineKind::Treasury, volume, earning);
        }
        return;
    }

    for term in table.active_terms() {
        let Some(volume) = positive_volume(record, &VolumeKey::normal(&table.id, term)) else {
            continue;
        };
        if let Some(earning) = compute_earning(table, Some(term), volume) {
            breakdown.push(
                &table.id,
                Some(term),
                sequence.clone(),
                LineKind::Term,
                volume,
                earning,
            );
        }
    }
}

/// Supplemental income: the entered amount is the gross, split by the
/// percentages on the volume entry, or the table's split when the entry
/// carries none.
fn add_supplemental(
    breakdown: &mut SettlementBreakdown,
    record: &SettlementRecord,
    table: &CommissionTable,
    sequence: String,
) {
    let key = VolumeKey::table(&table.id);
    let Some(entry) = record.volume(&key) else {
        return;
    };
    if !entry.amount.is_positive() {
        return;
    }
    let counterparty_percent = entry
        .counterparty_percent
        .unwrap_or(table.counterparty_split_percent);
    let platform_percent = entry.platform_percent.unwrap_or(table.platform_split_percent);
    let earning = split(entry.amount, counterparty_percent, platform_percent);
    breakdown.push(&table.id, None, sequence, LineKind::Supplemental, entry.amount, earning);
}
