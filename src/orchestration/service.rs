use crate::config::Config;
use crate::datasource::SnapshotSource;
use crate::domain::{RecordId, SettlementRecord, Snapshot};
use crate::engine::{
    SettlementBreakdown, SettlementCalculator, SimulationAmount, SimulationOutcome, Simulator,
};
use crate::error::EngineError;
use crate::report::{ReportFilter, ReportFilterInput, SettlementReport};
use std::sync::Arc;

/// Wires a [`SnapshotSource`] to the engine.
///
/// Every call loads a fresh snapshot and computes over it without shared
/// state, so one service can be used from any number of threads.
#[derive(Clone, Debug)]
pub struct CommissionService {
    source: Arc<dyn SnapshotSource>,
    config: Config,
}

impl CommissionService {
    pub fn new(source: Arc<dyn SnapshotSource>, config: Config) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Loads a snapshot and checks its advisory invariants. Issues are
    /// logged; in strict mode they reject the snapshot.
    pub fn load_snapshot(&self) -> Result<Snapshot, EngineError> {
        let snapshot = self.source.load_snapshot()?;
        let issues = snapshot.validate(self.config.split_tolerance);
        if issues.is_empty() {
            return Ok(snapshot);
        }

        for issue in &issues {
            tracing::warn!(issue = %issue, "snapshot invariant not held");
        }
        if self.config.strict_validation {
            let messages: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
            return Err(EngineError::InvalidSnapshot(messages.join("; ")));
        }
        Ok(snapshot)
    }

    pub fn settlement_report(
        &self,
        input: &ReportFilterInput,
    ) -> Result<SettlementReport, EngineError> {
        let snapshot = self.load_snapshot()?;
        let filter = ReportFilter::parse(input);
        Ok(SettlementReport::build(&snapshot, &filter, self.config.money_scale))
    }

    /// Validates `raw_amount` before touching the snapshot; an invalid
    /// amount performs no computation at all.
    pub fn simulate(&self, raw_amount: &str) -> Result<SimulationOutcome, EngineError> {
        let amount = SimulationAmount::parse(raw_amount)?;
        let snapshot = self.load_snapshot()?;

        let outcome = match Simulator::run(&snapshot, amount) {
            SimulationOutcome::Ranked(ranking) => SimulationOutcome::Ranked(
                ranking
                    .into_iter()
                    .map(|p| p.rounded(self.config.money_scale))
                    .collect(),
            ),
            SimulationOutcome::NoComputableData => SimulationOutcome::NoComputableData,
        };

        match &outcome {
            SimulationOutcome::Ranked(ranking) => tracing::info!(
                amount = %amount.value(),
                counterparties = ranking.len(),
                leader = ranking.first().map(|p| p.counterparty_name.as_str()).unwrap_or_default(),
                "simulation ranked"
            ),
            SimulationOutcome::NoComputableData => {
                tracing::info!(amount = %amount.value(), "simulation produced no computable data")
            }
        }
        Ok(outcome)
    }

    /// Live per-line recomputation of one record, ignoring its cache.
    pub fn settlement_breakdown(
        &self,
        record_id: &RecordId,
    ) -> Result<SettlementBreakdown, EngineError> {
        let snapshot = self.load_snapshot()?;
        let record = find_record(&snapshot, record_id)?;
        Ok(SettlementCalculator::new(&snapshot).recompute(record))
    }

    /// Recomputes a record's totals and returns it with a fresh cache, for
    /// the host application to persist.
    pub fn refresh_record(&self, record_id: &RecordId) -> Result<SettlementRecord, EngineError> {
        let snapshot = self.load_snapshot()?;
        let mut record = find_record(&snapshot, record_id)?.clone();
        let totals = SettlementCalculator::new(&snapshot).refresh_cache(&mut record);
        tracing::info!(
            record = %record.id,
            volume = %totals.volume,
            gross = %totals.gross,
            "settlement totals refreshed"
        );
        Ok(record)
    }
}

fn find_record<'a>(
    snapshot: &'a Snapshot,
    record_id: &RecordId,
) -> Result<&'a SettlementRecord, EngineError> {
    snapshot
        .settlement(record_id)
        .ok_or_else(|| EngineError::NotFound(format!("settlement record {}", record_id)))
}
