//! Snapshot source abstraction: where the engine's read-only input comes from.

use crate::domain::Snapshot;
use std::fmt;

pub mod mock;

pub use mock::MockSnapshotSource;

/// Supplies the counterparty/table/settlement snapshot a calculation runs on.
///
/// Implementations belong to the host application (database, remote
/// store, files). The engine treats the returned snapshot as read-only for
/// the duration of a calculation and never writes back through this trait.
pub trait SnapshotSource: Send + Sync + fmt::Debug {
    /// Load a consistent snapshot of all counterparties and settlement records.
    fn load_snapshot(&self) -> Result<Snapshot, SourceError>;
}

/// Error type for snapshot source operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The backing store could not be reached.
    Unavailable(String),
    /// The stored data could not be decoded into the data model.
    Malformed(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Unavailable(msg) => write!(f, "Snapshot source unavailable: {}", msg),
            SourceError::Malformed(msg) => write!(f, "Malformed snapshot: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Malformed(err.to_string())
    }
}
