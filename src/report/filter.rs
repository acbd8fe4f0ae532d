//! Report filters: raw UI input parsed into independent predicates.
//!
//! A predicate whose input is blank or unparseable is dropped, never
//! treated as "match nothing".

use crate::domain::{
    CounterpartyId, Decimal, Period, SettlementRecord, SettlementStatus, SettlementTotals,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::str::FromStr;

/// Filter fields exactly as a form or query string submits them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilterInput {
    pub counterparty: Option<String>,
    pub period: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub min_volume: Option<String>,
    pub max_volume: Option<String>,
    pub min_counterparty_share: Option<String>,
    pub max_counterparty_share: Option<String>,
    pub min_platform_share: Option<String>,
    pub max_platform_share: Option<String>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
}

/// Inclusive bounds; a missing side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd> Bounds<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.min.as_ref().map_or(true, |min| value >= min)
            && self.max.as_ref().map_or(true, |max| value <= max)
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub counterparty: Option<CounterpartyId>,
    pub period: Option<Period>,
    pub status: Option<SettlementStatus>,
    /// Lower-cased group name fragment.
    pub search: Option<String>,
    pub volume: Bounds<Decimal>,
    pub counterparty_share: Bounds<Decimal>,
    pub platform_share: Bounds<Decimal>,
    pub created: Bounds<NaiveDate>,
}

fn parse_field<T>(field: &str, raw: Option<&str>, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let parsed = parse(raw);
    if parsed.is_none() {
        tracing::debug!(field, raw, "unparseable filter value ignored");
    }
    parsed
}

fn decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str_canonical(raw).ok()
}

fn date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

impl ReportFilter {
    /// A filter that keeps every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn parse(input: &ReportFilterInput) -> Self {
        Self {
            counterparty: parse_field("counterparty", input.counterparty.as_deref(), |s| {
                Some(CounterpartyId::new(s))
            }),
            period: parse_field("period", input.period.as_deref(), |s| Period::from_str(s).ok()),
            status: parse_field("status", input.status.as_deref(), |s| {
                SettlementStatus::from_str(s).ok()
            }),
            search: parse_field("search", input.search.as_deref(), |s| Some(s.to_lowercase())),
            volume: Bounds {
                min: parse_field("minVolume", input.min_volume.as_deref(), decimal),
                max: parse_field("maxVolume", input.max_volume.as_deref(), decimal),
            },
            counterparty_share: Bounds {
                min: parse_field(
                    "minCounterpartyShare",
                    input.min_counterparty_share.as_deref(),
                    decimal,
                ),
                max: parse_field(
                    "maxCounterpartyShare",
                    input.max_counterparty_share.as_deref(),
                    decimal,
                ),
            },
            platform_share: Bounds {
                min: parse_field("minPlatformShare", input.min_platform_share.as_deref(), decimal),
                max: parse_field("maxPlatformShare", input.max_platform_share.as_deref(), decimal),
            },
            created: Bounds {
                min: parse_field("createdFrom", input.created_from.as_deref(), date),
                max: parse_field("createdTo", input.created_to.as_deref(), date),
            },
        }
    }

    /// Conjunction of every present predicate. `group_names` are matched
    /// against the search text (live name and the record's cached name).
    pub fn matches(
        &self,
        record: &SettlementRecord,
        totals: &SettlementTotals,
        group_names: &[&str],
    ) -> bool {
        if let Some(cp) = &self.counterparty {
            if &record.counterparty_id != cp {
                return false;
            }
        }
        if let Some(period) = self.period {
            if record.period != period {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let hit = group_names
                .iter()
                .any(|name| name.to_lowercase().contains(search.as_str()));
            if !hit {
                return false;
            }
        }

        self.volume.contains(&totals.volume)
            && self.counterparty_share.contains(&totals.counterparty_share)
            && self.platform_share.contains(&totals.platform_share)
            && self.created.contains(&record.created_at.date_naive())
    }
}
