//! Profitability simulation: implied earnings of every counterparty for
//! one hypothetical transaction amount, ranked by total earning.

use super::formula::{
    fixed_commission_gross, revenue_share_gross, scale_treasury, treasury_split,
};
use crate::domain::{
    BuySellRate, CommissionTable, Counterparty, CounterpartyId, Decimal, MaturityRate,
    MembershipIndex, PercentRate, PricingModel, Snapshot, TableId, Term, TreasuryDetail,
};
use crate::error::EngineError;
use serde::Serialize;
use tracing::debug;

/// Largest accepted simulation amount (10^15).
pub const MAX_SIMULATION_AMOUNT: i64 = 1_000_000_000_000_000;

/// A validated, strictly positive simulation amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SimulationAmount(Decimal);

impl SimulationAmount {
    pub fn new(amount: Decimal) -> Result<Self, EngineError> {
        if !amount.is_positive() {
            return Err(EngineError::Validation(format!(
                "simulation amount must be greater than zero, got {}",
                amount
            )));
        }
        if amount > Decimal::from(MAX_SIMULATION_AMOUNT) {
            return Err(EngineError::Validation(format!(
                "simulation amount must not exceed {}, got {}",
                MAX_SIMULATION_AMOUNT, amount
            )));
        }
        Ok(SimulationAmount(amount))
    }

    /// Parses user input. Blank, non-numeric and non-positive input is rejected.
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        if raw.trim().is_empty() {
            return Err(EngineError::Validation("simulation amount is required".to_string()));
        }
        let amount = Decimal::from_str_canonical(raw).map_err(|_| {
            EngineError::Validation(format!("invalid simulation amount '{}'", raw.trim()))
        })?;
        Self::new(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

/// Model-specific values of a contributing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RowDetail {
    #[serde(rename_all = "camelCase")]
    BuySell {
        term: Term,
        buy_rate: Decimal,
        sell_rate: Decimal,
        buy_amount: Decimal,
        sell_amount: Decimal,
    },
    #[serde(rename_all = "camelCase")]
    Commission {
        term: Term,
        percent_rate: Decimal,
        commission_amount: Decimal,
        platform_split_percent: Decimal,
    },
    #[serde(rename_all = "camelCase")]
    Treasury {
        reference_amount: Decimal,
        stored_earning: Decimal,
        scaled_gross: Decimal,
        platform_percent: Decimal,
    },
}

/// One contributing rate row, kept so a breakdown can be rendered
/// without recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRow {
    pub counterparty_name: String,
    pub table_id: TableId,
    pub classification: String,
    pub model: &'static str,
    pub detail: RowDetail,
    pub earning: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterpartyProjection {
    pub counterparty_id: CounterpartyId,
    pub counterparty_name: String,
    pub row_count: usize,
    /// Averages over RevenueShare rows only; 0 without any.
    pub average_buy_rate: Decimal,
    pub average_sell_rate: Decimal,
    pub total_earning: Decimal,
    pub total_sell_volume: Decimal,
    /// `total_earning / total_sell_volume * 100`; 0 without sell volume.
    pub margin_percent: Decimal,
    pub rows: Vec<ProjectionRow>,
}

impl CounterpartyProjection {
    /// Rounds the money totals for presentation; rows keep exact values.
    pub fn rounded(mut self, money_scale: u32) -> Self {
        self.total_earning = self.total_earning.round_money(money_scale);
        self.total_sell_volume = self.total_sell_volume.round_money(money_scale);
        self.margin_percent = self.margin_percent.round_money(money_scale);
        self
    }
}

/// Result of one simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "ranking", rename_all = "camelCase")]
pub enum SimulationOutcome {
    /// Contributing counterparties, highest total earning first.
    Ranked(Vec<CounterpartyProjection>),
    /// No counterparty had a single usable rate.
    NoComputableData,
}

impl SimulationOutcome {
    pub fn ranking(&self) -> &[CounterpartyProjection] {
        match self {
            SimulationOutcome::Ranked(ranking) => ranking,
            SimulationOutcome::NoComputableData => &[],
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, SimulationOutcome::NoComputableData)
    }
}

#[derive(Default)]
struct Accumulator {
    rows: Vec<ProjectionRow>,
    buy_rate_sum: Decimal,
    sell_rate_sum: Decimal,
    buy_sell_rows: i64,
    total_earning: Decimal,
    total_sell_volume: Decimal,
}

/// Stateless: each run is a fresh computation over the snapshot.
pub struct Simulator;

impl Simulator {
    pub fn run(snapshot: &Snapshot, amount: SimulationAmount) -> SimulationOutcome {
        let mut ranking: Vec<CounterpartyProjection> = snapshot
            .counterparties
            .iter()
            .filter_map(|cp| Self::project_counterparty(cp, amount.value()))
            .collect();

        if ranking.is_empty() {
            debug!(amount = %amount.value(), "simulation found no computable rates");
            return SimulationOutcome::NoComputableData;
        }

        // Stable sort keeps enumeration order among equal totals.
        ranking.sort_by(|a, b| b.total_earning.cmp(&a.total_earning));
        SimulationOutcome::Ranked(ranking)
    }

    /// Projection for one counterparty, or `None` when nothing contributes.
    pub fn project_counterparty(
        cp: &Counterparty,
        amount: Decimal,
    ) -> Option<CounterpartyProjection> {
        let index = MembershipIndex::build(cp);
        let mut acc = Accumulator::default();

        for table in cp.tables.iter().filter(|t| Self::is_simulated(cp, &index, t)) {
            match &table.pricing {
                PricingModel::RevenueShare { maturity_rates } => {
                    Self::add_revenue_share(&mut acc, cp, table, maturity_rates, amount)
                }
                PricingModel::FixedCommission { maturity_rates } => {
                    Self::add_fixed_commission(&mut acc, cp, table, maturity_rates, amount)
                }
                PricingModel::TreasuryIncome { treasury_detail } => {
                    Self::add_treasury(&mut acc, cp, table, treasury_detail, amount)
                }
            }
        }

        if acc.rows.is_empty() {
            return None;
        }

        let rows_as_decimal = Decimal::from(acc.buy_sell_rows);
        Some(CounterpartyProjection {
            counterparty_id: cp.id.clone(),
            counterparty_name: cp.name.clone(),
            row_count: acc.rows.len(),
            average_buy_rate: acc.buy_rate_sum.checked_ratio(rows_as_decimal),
            average_sell_rate: acc.sell_rate_sum.checked_ratio(rows_as_decimal),
            total_earning: acc.total_earning,
            total_sell_volume: acc.total_sell_volume,
            margin_percent: acc.total_earning.checked_ratio(acc.total_sell_volume)
                * Decimal::hundred(),
            rows: acc.rows,
        })
    }

    /// Open, non-supplemental, and not held by an inactive group.
    fn is_simulated(cp: &Counterparty, index: &MembershipIndex, table: &CommissionTable) -> bool {
        if table.is_closed() || table.is_supplemental_income {
            return false;
        }
        match index.group_id(&table.id).and_then(|id| cp.group(id)) {
            Some(group) => group.active,
            None => true,
        }
    }

    fn row(
        cp: &Counterparty,
        table: &CommissionTable,
        detail: RowDetail,
        earning: Decimal,
    ) -> ProjectionRow {
        ProjectionRow {
            counterparty_name: cp.name.clone(),
            table_id: table.id.clone(),
            classification: table.classification_label(),
            model: table.model_label(),
            detail,
            earning,
        }
    }

    fn add_revenue_share(
        acc: &mut Accumulator,
        cp: &Counterparty,
        table: &CommissionTable,
        rates: &[MaturityRate<BuySellRate>],
        amount: Decimal,
    ) {
        for rate in rates.iter().filter(|r| r.enabled) {
            let BuySellRate { buy_rate, sell_rate } = rate.rate;
            if !buy_rate.is_positive() || !sell_rate.is_positive() {
                continue;
            }
            // The amount is taken as the sell-side volume of the term.
            let gross = revenue_share_gross(amount, buy_rate, sell_rate);
            acc.buy_rate_sum += buy_rate;
            acc.sell_rate_sum += sell_rate;
            acc.buy_sell_rows += 1;
            acc.total_sell_volume += amount;
            acc.total_earning += gross;
            acc.rows.push(Self::row(
                cp,
                table,
                RowDetail::BuySell {
                    term: rate.term.clone(),
                    buy_rate,
                    sell_rate,
                    buy_amount: amount.percent_of(buy_rate),
                    sell_amount: amount.percent_of(sell_rate),
                },
                gross,
            ));
        }
    }

    /// Only the platform side is reported.
    fn add_fixed_commission(
        acc: &mut Accumulator,
        cp: &Counterparty,
        table: &CommissionTable,
        rates: &[MaturityRate<PercentRate>],
        amount: Decimal,
    ) {
        for rate in rates.iter().filter(|r| r.enabled) {
            let percent_rate = rate.rate.percent_rate;
            if !percent_rate.is_positive() {
                continue;
            }
            let commission_amount = fixed_commission_gross(amount, percent_rate);
            let earning = commission_amount.percent_of(table.platform_split_percent);
            acc.total_earning += earning;
            acc.rows.push(Self::row(
                cp,
                table,
                RowDetail::Commission {
                    term: rate.term.clone(),
                    percent_rate,
                    commission_amount,
                    platform_split_percent: table.platform_split_percent,
                },
                earning,
            ));
        }
    }

    fn add_treasury(
        acc: &mut Accumulator,
        cp: &Counterparty,
        table: &CommissionTable,
        detail: &TreasuryDetail,
        amount: Decimal,
    ) {
        if !detail.earning.is_positive() {
            return;
        }
        let scaled_gross = scale_treasury(detail, amount);
        let earning = treasury_split(scaled_gross, detail).platform_share;
        acc.total_earning += earning;
        acc.rows.push(Self::row(
            cp,
            table,
            RowDetail::Treasury {
                reference_amount: detail.reference_amount,
                stored_earning: detail.earning,
                scaled_gross,
                platform_percent: detail.platform_percent,
            },
            earning,
        ));
    }
}
