//! Rate table data model for the commission engine.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Identifier primitives, maturity terms and settlement periods
//! - Commission tables with a tagged pricing model per table
//! - Groups (agreement versions), counterparties and settlement records
//! - The derived table-to-group index and positional sequence numbering

pub mod counterparty;
pub mod decimal;
pub mod group;
pub mod ordering;
pub mod primitives;
pub mod settlement;
pub mod snapshot;
pub mod table;

pub use counterparty::Counterparty;
pub use decimal::Decimal;
pub use group::CommissionTableGroup;
pub use ordering::{sequence_label, MembershipIndex, UNGROUPED_SEQUENCE};
pub use primitives::{
    CounterpartyId, Geography, GroupId, Period, PeriodParseError, RecordId, TableId, Term,
};
pub use settlement::{
    CachedTotals, SettlementRecord, SettlementStatus, SettlementTotals, StoredTotals, VolumeEntry,
    VolumeKey,
};
pub use snapshot::{Snapshot, SnapshotIssue};
pub use table::{
    BuySellRate, CommissionTable, MaturityRate, PercentRate, PricingModel, TreasuryDetail,
};
