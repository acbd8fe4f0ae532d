//! Pure computation engine(s) for commission and settlement logic.

pub mod formula;
pub mod settlement;
pub mod simulator;

pub use formula::{compute_earning, scale_treasury, split, Earning};
pub use settlement::{
    LineKind, RecordTotals, SettlementBreakdown, SettlementCalculator, SettlementLine, TotalsSource,
};
pub use simulator::{
    CounterpartyProjection, ProjectionRow, RowDetail, SimulationAmount, SimulationOutcome,
    Simulator, MAX_SIMULATION_AMOUNT,
};
