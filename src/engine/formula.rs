//! Commission formulas for the three pricing models.
//!
//! Every function here is pure. Missing or disabled terms yield [`None`]
//! from [`compute_earning`] so callers can skip them instead of emitting a
//! zero row.

use crate::domain::{CommissionTable, Decimal, PricingModel, Term, TreasuryDetail};

/// Gross earning and its split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Earning {
    pub gross: Decimal,
    pub counterparty_share: Decimal,
    pub platform_share: Decimal,
}

impl Earning {
    pub fn zero() -> Self {
        Self::default()
    }
}

impl std::ops::AddAssign for Earning {
    fn add_assign(&mut self, rhs: Earning) {
        self.gross += rhs.gross;
        self.counterparty_share += rhs.counterparty_share;
        self.platform_share += rhs.platform_share;
    }
}

/// Divides `gross` by the two split percentages. The percentages are not
/// required to sum to 100.
pub fn split(gross: Decimal, counterparty_percent: Decimal, platform_percent: Decimal) -> Earning {
    Earning {
        gross,
        counterparty_share: gross.percent_of(counterparty_percent),
        platform_share: gross.percent_of(platform_percent),
    }
}

/// FixedCommission gross: `volume * percentRate / 100`.
pub fn fixed_commission_gross(volume: Decimal, percent_rate: Decimal) -> Decimal {
    volume.percent_of(percent_rate)
}

/// RevenueShare gross: sell amount minus buy amount. Negative margins are
/// kept as they are.
pub fn revenue_share_gross(volume: Decimal, buy_rate: Decimal, sell_rate: Decimal) -> Decimal {
    volume.percent_of(sell_rate) - volume.percent_of(buy_rate)
}

/// TreasuryIncome earning scaled to a hypothetical volume. A zero
/// reference amount is treated as 1.
pub fn scale_treasury(detail: &TreasuryDetail, hypothetical_volume: Decimal) -> Decimal {
    let reference = if detail.reference_amount.is_zero() {
        Decimal::one()
    } else {
        detail.reference_amount
    };
    detail.earning * (hypothetical_volume / reference)
}

/// TreasuryIncome split: only the platform side is computed; the
/// counterparty keeps the unreported remainder, so its share reads 0.
pub fn treasury_split(gross: Decimal, detail: &TreasuryDetail) -> Earning {
    Earning {
        gross,
        counterparty_share: Decimal::zero(),
        platform_share: gross.percent_of(detail.platform_percent),
    }
}

/// Applies `table`'s pricing model to `volume`.
///
/// FixedCommission and RevenueShare need an enabled `term`; without one
/// the result is `None`. TreasuryIncome ignores both `term` and `volume`
/// and returns the stored agreement earning.
pub fn compute_earning(
    table: &CommissionTable,
    term: Option<&Term>,
    volume: Decimal,
) -> Option<Earning> {
    match &table.pricing {
        PricingModel::FixedCommission { .. } => {
            let rate = table.percent_rate(term?)?;
            Some(split(
                fixed_commission_gross(volume, rate),
                table.counterparty_split_percent,
                table.platform_split_percent,
            ))
        }
        PricingModel::RevenueShare { .. } => {
            let rate = table.buy_sell_rate(term?)?;
            Some(split(
                revenue_share_gross(volume, rate.buy_rate, rate.sell_rate),
                table.counterparty_split_percent,
                table.platform_split_percent,
            ))
        }
        PricingModel::TreasuryIncome { treasury_detail } => {
            Some(treasury_split(treasury_detail.earning, treasury_detail))
        }
    }
}
