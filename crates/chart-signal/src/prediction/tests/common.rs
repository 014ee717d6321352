use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::prediction::domain::{
    ChartFeatures, ChartImage, Confidence, Direction, Momentum, NewPrediction, Outcome, Pattern,
    PredictionId, PredictionRecord, RiskLevel, Trend, Zone,
};
use crate::prediction::extractor::FixedFeatureExtractor;
use crate::prediction::service::{PredictionService, PredictionSettings};
use crate::prediction::store::{HistoryStore, InMemoryHistoryStore, StoreError};
use crate::prediction::{prediction_router, ScoringEngine};

pub(super) fn features() -> ChartFeatures {
    ChartFeatures {
        pattern: Pattern::Engulfing,
        trend: Trend::Uptrend,
        zone: Zone::Support,
        momentum: Momentum::Strong,
    }
}

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn engine() -> ScoringEngine {
    ScoringEngine::default()
}

pub(super) fn record(
    features: ChartFeatures,
    direction: Direction,
    outcome: Option<Outcome>,
) -> PredictionRecord {
    PredictionRecord {
        id: PredictionId::generate(),
        chart_features: features,
        direction,
        confidence: Confidence::Medium,
        risk_level: RiskLevel::Medium,
        reason: "historical fixture".to_string(),
        created_at: base_time(),
        outcome,
        outcome_updated_at: outcome.map(|_| base_time() + Duration::hours(1)),
    }
}

/// `wins` winners, then `losses` losers, then `pending` unresolved records.
pub(super) fn records(
    features: ChartFeatures,
    direction: Direction,
    wins: usize,
    losses: usize,
    pending: usize,
) -> Vec<PredictionRecord> {
    let mut history = Vec::new();
    history.extend((0..wins).map(|_| record(features, direction, Some(Outcome::Win))));
    history.extend((0..losses).map(|_| record(features, direction, Some(Outcome::Loss))));
    history.extend((0..pending).map(|_| record(features, direction, None)));
    history
}

pub(super) fn new_prediction(direction: Direction) -> NewPrediction {
    NewPrediction {
        chart_features: features(),
        direction,
        confidence: Confidence::Medium,
        risk_level: RiskLevel::Medium,
        reason: "stored fixture".to_string(),
        scored_at: base_time(),
    }
}

pub(super) fn png() -> ChartImage {
    ChartImage::new(Some("image/png"), vec![0x89, 0x50, 0x4e, 0x47]).expect("png accepted")
}

pub(super) fn settings() -> PredictionSettings {
    PredictionSettings::default()
}

pub(super) type MemoryService = PredictionService<InMemoryHistoryStore, FixedFeatureExtractor>;

pub(super) fn build_service() -> (MemoryService, Arc<InMemoryHistoryStore>) {
    let store = Arc::new(InMemoryHistoryStore::default());
    let service = PredictionService::new(
        store.clone(),
        Arc::new(FixedFeatureExtractor(features())),
        settings(),
    );
    (service, store)
}

pub(super) fn service_with<S: HistoryStore + 'static>(
    store: S,
) -> PredictionService<S, FixedFeatureExtractor> {
    PredictionService::new(
        Arc::new(store),
        Arc::new(FixedFeatureExtractor(features())),
        settings(),
    )
}

pub(super) struct UnavailableStore;

impl HistoryStore for UnavailableStore {
    fn insert(&self, _prediction: NewPrediction) -> Result<PredictionRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list_recent(&self, _limit: usize) -> Result<Vec<PredictionRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &PredictionId) -> Result<Option<PredictionRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update_outcome(
        &self,
        _id: &PredictionId,
        _outcome: Outcome,
    ) -> Result<PredictionRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn record_outcome_once(
        &self,
        _id: &PredictionId,
        _outcome: Outcome,
    ) -> Result<PredictionRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Serves a fixed history but rejects writes.
pub(super) struct ReadOnlyStore {
    pub(super) history: Vec<PredictionRecord>,
}

impl HistoryStore for ReadOnlyStore {
    fn insert(&self, _prediction: NewPrediction) -> Result<PredictionRecord, StoreError> {
        Err(StoreError::Unavailable("read-only replica".to_string()))
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, StoreError> {
        Ok(self.history.iter().take(limit).cloned().collect())
    }

    fn fetch(&self, id: &PredictionId) -> Result<Option<PredictionRecord>, StoreError> {
        Ok(self.history.iter().find(|record| &record.id == id).cloned())
    }

    fn update_outcome(
        &self,
        _id: &PredictionId,
        _outcome: Outcome,
    ) -> Result<PredictionRecord, StoreError> {
        Err(StoreError::Unavailable("read-only replica".to_string()))
    }

    fn record_outcome_once(
        &self,
        _id: &PredictionId,
        _outcome: Outcome,
    ) -> Result<PredictionRecord, StoreError> {
        Err(StoreError::Unavailable("read-only replica".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn prediction_router_with_service(service: MemoryService) -> axum::Router {
    prediction_router(Arc::new(service))
}
