//! In-memory snapshot source for tests and embedding.

use super::{SnapshotSource, SourceError};
use crate::domain::{Counterparty, SettlementRecord, Snapshot};

/// Snapshot source that returns predefined data.
#[derive(Debug, Clone, Default)]
pub struct MockSnapshotSource {
    snapshot: Snapshot,
    failure: Option<SourceError>,
}

impl MockSnapshotSource {
    /// Create a new mock source with an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mock source from the JSON form of a [`Snapshot`].
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Ok(Self {
            snapshot,
            failure: None,
        })
    }

    /// Add a counterparty to the mock snapshot.
    pub fn with_counterparty(mut self, counterparty: Counterparty) -> Self {
        self.snapshot.counterparties.push(counterparty);
        self
    }

    /// Add a settlement record to the mock snapshot.
    pub fn with_settlement(mut self, record: SettlementRecord) -> Self {
        self.snapshot.settlements.push(record);
        self
    }

    /// Add multiple settlement records to the mock snapshot.
    pub fn with_settlements(mut self, records: Vec<SettlementRecord>) -> Self {
        self.snapshot.settlements.extend(records);
        self
    }

    /// Make every load fail with `error`.
    pub fn failing(mut self, error: SourceError) -> Self {
        self.failure = Some(error);
        self
    }
}

impl SnapshotSource for MockSnapshotSource {
    fn load_snapshot(&self) -> Result<Snapshot, SourceError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.snapshot.clone()),
        }
    }
}
