//! Settlement records ("hakediş"): one period's volumes for one group.

use crate::domain::{
    decimal, CounterpartyId, Decimal, GroupId, Period, RecordId, TableId, Term,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Composite volume key: `"{tableId}-{term}"` for normal tables,
/// `"{tableId}"` for supplemental and treasury lines.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeKey(String);

impl VolumeKey {
    pub fn normal(table_id: &TableId, term: &Term) -> Self {
        VolumeKey(format!("{}-{}", table_id, term))
    }

    pub fn table(table_id: &TableId) -> Self {
        VolumeKey(table_id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VolumeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Volume entered for one key. Supplemental lines carry their own
/// percentages; normal lines leave them empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeEntry {
    #[serde(with = "decimal::lenient", default)]
    pub amount: Decimal,
    /// Blank or non-numeric overrides read as absent.
    #[serde(
        default,
        with = "decimal::lenient_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub counterparty_percent: Option<Decimal>,
    #[serde(
        default,
        with = "decimal::lenient_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub platform_percent: Option<Decimal>,
}

impl VolumeEntry {
    pub fn new(amount: Decimal) -> Self {
        Self {
            amount,
            counterparty_percent: None,
            platform_percent: None,
        }
    }

    pub fn with_split(
        amount: Decimal,
        counterparty_percent: Decimal,
        platform_percent: Decimal,
    ) -> Self {
        Self {
            amount,
            counterparty_percent: Some(counterparty_percent),
            platform_percent: Some(platform_percent),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SettlementStatus {
    Draft,
    Finalized,
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementStatus::Draft => write!(f, "Draft"),
            SettlementStatus::Finalized => write!(f, "Finalized"),
        }
    }
}

impl std::str::FromStr for SettlementStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(SettlementStatus::Draft),
            "finalized" => Ok(SettlementStatus::Finalized),
            _ => Err(()),
        }
    }
}

/// Per-record money totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementTotals {
    pub volume: Decimal,
    pub gross: Decimal,
    pub counterparty_share: Decimal,
    pub platform_share: Decimal,
}

impl SettlementTotals {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn rounded(&self, scale: u32) -> Self {
        Self {
            volume: self.volume.round_money(scale),
            gross: self.gross.round_money(scale),
            counterparty_share: self.counterparty_share.round_money(scale),
            platform_share: self.platform_share.round_money(scale),
        }
    }
}

impl std::ops::AddAssign for SettlementTotals {
    fn add_assign(&mut self, rhs: SettlementTotals) {
        self.volume += rhs.volume;
        self.gross += rhs.gross;
        self.counterparty_share += rhs.counterparty_share;
        self.platform_share += rhs.platform_share;
    }
}

/// Cached totals as stored on the record.
///
/// Older records predate the gross field; it is then read as the sum of
/// both shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTotals {
    #[serde(with = "decimal::lenient", default)]
    pub volume: Decimal,
    #[serde(with = "decimal::lenient", default)]
    pub counterparty_share: Decimal,
    #[serde(with = "decimal::lenient", default)]
    pub platform_share: Decimal,
    #[serde(
        default,
        with = "decimal::lenient_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub gross: Option<Decimal>,
}

impl From<SettlementTotals> for StoredTotals {
    fn from(t: SettlementTotals) -> Self {
        Self {
            volume: t.volume,
            counterparty_share: t.counterparty_share,
            platform_share: t.platform_share,
            gross: Some(t.gross),
        }
    }
}

impl From<StoredTotals> for SettlementTotals {
    fn from(s: StoredTotals) -> Self {
        Self {
            volume: s.volume,
            gross: s
                .gross
                .unwrap_or(s.counterparty_share + s.platform_share),
            counterparty_share: s.counterparty_share,
            platform_share: s.platform_share,
        }
    }
}

/// Two-state cache contract. `Cached` is authoritative and is never
/// reconciled against live rate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "totals", rename_all = "camelCase")]
pub enum CachedTotals {
    Cached(StoredTotals),
    #[default]
    Uncached,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRecord {
    pub id: RecordId,
    pub counterparty_id: CounterpartyId,
    pub group_id: GroupId,
    /// Display-only copy of the group name at creation time.
    #[serde(default)]
    pub group_name: String,
    pub period: Period,
    #[serde(default)]
    pub volumes: BTreeMap<VolumeKey, VolumeEntry>,
    pub status: SettlementStatus,
    #[serde(default)]
    pub totals: CachedTotals,
    pub created_at: DateTime<Utc>,
}

impl SettlementRecord {
    /// Opens a draft record for `group_id` and `period`.
    pub fn open(
        id: impl Into<String>,
        counterparty_id: CounterpartyId,
        group_id: GroupId,
        group_name: impl Into<String>,
        period: Period,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::new(id),
            counterparty_id,
            group_id,
            group_name: group_name.into(),
            period,
            volumes: BTreeMap::new(),
            status: SettlementStatus::Draft,
            totals: CachedTotals::Uncached,
            created_at,
        }
    }

    /// Sets a volume line and drops the cache; the caller is expected to
    /// refresh and persist it.
    pub fn set_volume(&mut self, key: VolumeKey, entry: VolumeEntry) {
        self.volumes.insert(key, entry);
        self.totals = CachedTotals::Uncached;
    }

    pub fn remove_volume(&mut self, key: &VolumeKey) -> Option<VolumeEntry> {
        let removed = self.volumes.remove(key);
        if removed.is_some() {
            self.totals = CachedTotals::Uncached;
        }
        removed
    }

    pub fn volume(&self, key: &VolumeKey) -> Option<&VolumeEntry> {
        self.volumes.get(key)
    }

    pub fn store_totals(&mut self, totals: SettlementTotals) {
        self.totals = CachedTotals::Cached(totals.into());
    }

    pub fn cached_totals(&self) -> Option<SettlementTotals> {
        match self.totals {
            CachedTotals::Cached(stored) => Some(stored.into()),
            CachedTotals::Uncached => None,
        }
    }

    pub fn finalize(&mut self) {
        self.status = SettlementStatus::Finalized;
    }

    pub fn is_finalized(&self) -> bool {
        self.status == SettlementStatus::Finalized
    }
}
