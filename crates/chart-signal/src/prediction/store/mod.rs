mod memory;
mod sqlite;

pub use memory::InMemoryHistoryStore;
pub use sqlite::SqliteHistoryStore;

use super::domain::{NewPrediction, Outcome, PredictionId, PredictionRecord};

/// Persistence boundary for prediction history.
///
/// Implementations assign identifiers and creation timestamps on insert and return
/// `list_recent` newest first. `update_outcome` overwrites any earlier outcome, while
/// `record_outcome_once` checks and writes atomically and fails with
/// `StoreError::AlreadyResolved` when an outcome is already set.
pub trait HistoryStore: Send + Sync {
    fn insert(&self, prediction: NewPrediction) -> Result<PredictionRecord, StoreError>;
    fn list_recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, StoreError>;
    fn fetch(&self, id: &PredictionId) -> Result<Option<PredictionRecord>, StoreError>;
    fn update_outcome(
        &self,
        id: &PredictionId,
        outcome: Outcome,
    ) -> Result<PredictionRecord, StoreError>;
    fn record_outcome_once(
        &self,
        id: &PredictionId,
        outcome: Outcome,
    ) -> Result<PredictionRecord, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("prediction not found")]
    NotFound,
    #[error("prediction already has an outcome")]
    AlreadyResolved,
    #[error("history store unavailable: {0}")]
    Unavailable(String),
    #[error("stored prediction is malformed: {0}")]
    Malformed(String),
}
