use chart_signal::config::{AppConfig, ConfigError, StorageConfig, TelemetryConfig};
use chart_signal::prediction::{
    HistoryStore, InMemoryHistoryStore, NewPrediction, Outcome, PredictionId, PredictionRecord,
    PredictionService, RandomFeatureExtractor, SqliteHistoryStore, StoreError,
};
use chart_signal::telemetry::{self, TelemetryError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ApiPredictionService = PredictionService<ConfiguredStore, RandomFeatureExtractor>;

/// History backend chosen at startup from configuration.
pub(crate) enum ConfiguredStore {
    Memory(InMemoryHistoryStore),
    Sqlite(SqliteHistoryStore),
}

impl ConfiguredStore {
    pub(crate) fn open(storage: &StorageConfig) -> Result<Self, StoreError> {
        match &storage.database_path {
            Some(path) => Ok(Self::Sqlite(SqliteHistoryStore::open(path)?)),
            None => {
                info!("no database path configured, prediction history is kept in memory");
                Ok(Self::Memory(InMemoryHistoryStore::default()))
            }
        }
    }

    pub(crate) fn backend_label(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Sqlite(_) => "sqlite",
        }
    }
}

impl HistoryStore for ConfiguredStore {
    fn insert(&self, prediction: NewPrediction) -> Result<PredictionRecord, StoreError> {
        match self {
            Self::Memory(store) => store.insert(prediction),
            Self::Sqlite(store) => store.insert(prediction),
        }
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, StoreError> {
        match self {
            Self::Memory(store) => store.list_recent(limit),
            Self::Sqlite(store) => store.list_recent(limit),
        }
    }

    fn fetch(&self, id: &PredictionId) -> Result<Option<PredictionRecord>, StoreError> {
        match self {
            Self::Memory(store) => store.fetch(id),
            Self::Sqlite(store) => store.fetch(id),
        }
    }

    fn update_outcome(
        &self,
        id: &PredictionId,
        outcome: Outcome,
    ) -> Result<PredictionRecord, StoreError> {
        match self {
            Self::Memory(store) => store.update_outcome(id, outcome),
            Self::Sqlite(store) => store.update_outcome(id, outcome),
        }
    }

    fn record_outcome_once(
        &self,
        id: &PredictionId,
        outcome: Outcome,
    ) -> Result<PredictionRecord, StoreError> {
        match self {
            Self::Memory(store) => store.record_outcome_once(id, outcome),
            Self::Sqlite(store) => store.record_outcome_once(id, outcome),
        }
    }
}

pub(crate) fn feature_extractor(storage: &StorageConfig) -> RandomFeatureExtractor {
    match storage.feature_seed {
        Some(seed) => RandomFeatureExtractor::seeded(seed),
        None => RandomFeatureExtractor::from_entropy(),
    }
}

pub(crate) fn build_prediction_service(
    config: &AppConfig,
) -> Result<ApiPredictionService, StoreError> {
    let store = ConfiguredStore::open(&config.storage)?;
    info!(backend = store.backend_label(), "prediction history store ready");
    Ok(PredictionService::new(
        Arc::new(store),
        Arc::new(feature_extractor(&config.storage)),
        config.prediction.clone(),
    ))
}

/// Loads configuration and applies a `--database` override when given.
pub(crate) fn load_config(database: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::load()?;
    if database.is_some() {
        config.storage.database_path = database;
    }
    Ok(config)
}

/// Logging for one-shot commands, so store failures during `predict` and friends are
/// reported. A subscriber that is already installed is kept.
pub(crate) fn init_command_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }
    telemetry::init(config)
}

pub(crate) fn parse_outcome(raw: &str) -> Result<Outcome, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "win" | "w" => Ok(Outcome::Win),
        "loss" | "lose" | "l" => Ok(Outcome::Loss),
        _ => Err(format!("'{raw}' is not an outcome (expected win or loss)")),
    }
}
