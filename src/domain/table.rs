//! Commission tables: one priced agreement line per counterparty.

use crate::domain::{decimal, Decimal, Geography, Period, TableId, Term};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Percentage rate of a FixedCommission term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentRate {
    #[serde(with = "decimal::lenient", default)]
    pub percent_rate: Decimal,
}

/// Buy/sell rates of a RevenueShare term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuySellRate {
    #[serde(with = "decimal::lenient", default)]
    pub buy_rate: Decimal,
    #[serde(with = "decimal::lenient", default)]
    pub sell_rate: Decimal,
}

impl BuySellRate {
    /// `sell - buy`. Advisory only, never stored.
    pub fn margin_rate(&self) -> Decimal {
        self.sell_rate - self.buy_rate
    }
}

/// Pricing for one settlement term ("vade").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaturityRate<R> {
    pub term: Term,
    /// Disabled terms stay visible but never take part in a calculation.
    pub enabled: bool,
    #[serde(flatten)]
    pub rate: R,
}

impl<R> MaturityRate<R> {
    pub fn new(term: impl Into<String>, rate: R) -> Self {
        Self {
            term: Term::new(term),
            enabled: true,
            rate,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Contractual detail of a TreasuryIncome table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreasuryDetail {
    #[serde(with = "decimal::lenient", default)]
    pub reference_amount: Decimal,
    #[serde(with = "decimal::lenient", default)]
    pub platform_percent: Decimal,
    /// Pre-computed by the agreement, not derived from a rate.
    #[serde(with = "decimal::lenient", default)]
    pub earning: Decimal,
}

/// The three pricing models, each carrying only the inputs it uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "pricingModel", rename_all = "camelCase")]
pub enum PricingModel {
    #[serde(rename_all = "camelCase")]
    FixedCommission {
        maturity_rates: Vec<MaturityRate<PercentRate>>,
    },
    #[serde(rename_all = "camelCase")]
    RevenueShare {
        maturity_rates: Vec<MaturityRate<BuySellRate>>,
    },
    #[serde(rename_all = "camelCase")]
    TreasuryIncome { treasury_detail: TreasuryDetail },
}

impl PricingModel {
    pub fn label(&self) -> &'static str {
        match self {
            PricingModel::FixedCommission { .. } => "Fixed Commission",
            PricingModel::RevenueShare { .. } => "Revenue Share",
            PricingModel::TreasuryIncome { .. } => "Treasury Income",
        }
    }

    /// Terms of the model in table order; empty for TreasuryIncome.
    pub fn terms(&self) -> Vec<(&Term, bool)> {
        match self {
            PricingModel::FixedCommission { maturity_rates } => maturity_rates
                .iter()
                .map(|r| (&r.term, r.enabled))
                .collect(),
            PricingModel::RevenueShare { maturity_rates } => maturity_rates
                .iter()
                .map(|r| (&r.term, r.enabled))
                .collect(),
            PricingModel::TreasuryIncome { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionTable {
    pub id: TableId,
    pub product: String,
    pub card_type: String,
    pub geography: Geography,
    #[serde(flatten)]
    pub pricing: PricingModel,
    #[serde(with = "decimal::lenient", default)]
    pub counterparty_split_percent: Decimal,
    #[serde(with = "decimal::lenient", default)]
    pub platform_split_percent: Decimal,
    #[serde(default)]
    pub closed_at: Option<NaiveDate>,
    #[serde(default)]
    pub is_supplemental_income: bool,
}

impl CommissionTable {
    pub fn new(
        id: impl Into<String>,
        product: impl Into<String>,
        card_type: impl Into<String>,
        geography: Geography,
        pricing: PricingModel,
    ) -> Self {
        Self {
            id: TableId::new(id),
            product: product.into(),
            card_type: card_type.into(),
            geography,
            pricing,
            counterparty_split_percent: Decimal::zero(),
            platform_split_percent: Decimal::zero(),
            closed_at: None,
            is_supplemental_income: false,
        }
    }

    pub fn with_split(mut self, counterparty_percent: Decimal, platform_percent: Decimal) -> Self {
        self.counterparty_split_percent = counterparty_percent;
        self.platform_split_percent = platform_percent;
        self
    }

    pub fn closed_on(mut self, date: NaiveDate) -> Self {
        self.closed_at = Some(date);
        self
    }

    pub fn supplemental(mut self) -> Self {
        self.is_supplemental_income = true;
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }

    /// Whether the table still counts for settlements of `period`.
    ///
    /// A table closed on or after the first day of the period keeps
    /// contributing to it; one closed before the period began does not.
    pub fn is_live_for(&self, period: Period) -> bool {
        match self.closed_at {
            None => true,
            Some(closed) => closed >= period.first_day(),
        }
    }

    /// "Product / Card type / Geography".
    pub fn classification_label(&self) -> String {
        format!("{} / {} / {}", self.product, self.card_type, self.geography)
    }

    pub fn model_label(&self) -> &'static str {
        self.pricing.label()
    }

    /// Enabled terms only, in table order.
    pub fn active_terms(&self) -> Vec<&Term> {
        self.pricing
            .terms()
            .into_iter()
            .filter_map(|(term, enabled)| enabled.then_some(term))
            .collect()
    }

    /// Enabled FixedCommission rate for `term`, if any.
    pub fn percent_rate(&self, term: &Term) -> Option<Decimal> {
        match &self.pricing {
            PricingModel::FixedCommission { maturity_rates } => maturity_rates
                .iter()
                .find(|r| r.enabled && &r.term == term)
                .map(|r| r.rate.percent_rate),
            _ => None,
        }
    }

    /// Enabled RevenueShare rates for `term`, if any.
    pub fn buy_sell_rate(&self, term: &Term) -> Option<BuySellRate> {
        match &self.pricing {
            PricingModel::RevenueShare { maturity_rates } => maturity_rates
                .iter()
                .find(|r| r.enabled && &r.term == term)
                .map(|r| r.rate),
            _ => None,
        }
    }

    pub fn treasury_detail(&self) -> Option<&TreasuryDetail> {
        match &self.pricing {
            PricingModel::TreasuryIncome { treasury_detail } => Some(treasury_detail),
            _ => None,
        }
    }
}
