use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::{HistoryStore, StoreError};
use crate::prediction::domain::{NewPrediction, Outcome, PredictionId, PredictionRecord};

/// Process-local store; clones share the same records.
#[derive(Debug, Default, Clone)]
pub struct InMemoryHistoryStore {
    records: Arc<Mutex<Vec<PredictionRecord>>>,
}

impl InMemoryHistoryStore {
    /// Records are kept in the given order, oldest first.
    pub fn from_records(records: Vec<PredictionRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("history mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn insert(&self, prediction: NewPrediction) -> Result<PredictionRecord, StoreError> {
        let record = PredictionRecord::from_new(PredictionId::generate(), prediction, Utc::now());
        let mut guard = self.records.lock().expect("history mutex poisoned");
        guard.push(record.clone());
        Ok(record)
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, StoreError> {
        let guard = self.records.lock().expect("history mutex poisoned");
        let mut records: Vec<PredictionRecord> = guard.iter().rev().cloned().collect();
        // Stable sort keeps later inserts ahead on equal timestamps.
        records.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        records.truncate(limit);
        Ok(records)
    }

    fn fetch(&self, id: &PredictionId) -> Result<Option<PredictionRecord>, StoreError> {
        let guard = self.records.lock().expect("history mutex poisoned");
        Ok(guard.iter().find(|record| &record.id == id).cloned())
    }

    fn update_outcome(
        &self,
        id: &PredictionId,
        outcome: Outcome,
    ) -> Result<PredictionRecord, StoreError> {
        let mut guard = self.records.lock().expect("history mutex poisoned");
        let record = guard
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or(StoreError::NotFound)?;
        record.outcome = Some(outcome);
        record.outcome_updated_at = Some(Utc::now());
        Ok(record.clone())
    }

    fn record_outcome_once(
        &self,
        id: &PredictionId,
        outcome: Outcome,
    ) -> Result<PredictionRecord, StoreError> {
        let mut guard = self.records.lock().expect("history mutex poisoned");
        let record = guard
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or(StoreError::NotFound)?;
        if record.outcome.is_some() {
            return Err(StoreError::AlreadyResolved);
        }
        record.outcome = Some(outcome);
        record.outcome_updated_at = Some(Utc::now());
        Ok(record.clone())
    }
}
