pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod report;
pub mod telemetry;

pub use config::{Config, ConfigError};
pub use datasource::{MockSnapshotSource, SnapshotSource, SourceError};
pub use domain::{
    CommissionTable, CommissionTableGroup, Counterparty, CounterpartyId, Decimal, GroupId, Period,
    PricingModel, RecordId, SettlementRecord, SettlementStatus, SettlementTotals, Snapshot, TableId,
    Term,
};
pub use engine::{SettlementCalculator, SimulationAmount, SimulationOutcome, Simulator};
pub use error::EngineError;
pub use orchestration::CommissionService;
pub use report::{ReportFilter, ReportFilterInput, SettlementReport};
pub use telemetry::init_tracing;
