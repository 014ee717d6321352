use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    ChartFeatures, ChartImage, Confidence, Direction, NewPrediction, Outcome, PredictionId,
    PredictionRecord, RiskLevel,
};
use super::extractor::FeatureExtractor;
use super::scoring::{CandidateScore, ScoringConfig, ScoringEngine};
use super::store::{HistoryStore, StoreError};

/// Runtime knobs for the prediction flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionSettings {
    /// Number of recent records fed to the scoring engine.
    pub history_window: usize,
    /// Default number of records returned by history listings.
    pub history_page_size: usize,
    /// When false an outcome can be recorded only once per prediction.
    pub allow_outcome_revision: bool,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            history_window: 200,
            history_page_size: 10,
            allow_outcome_revision: false,
        }
    }
}

/// Service composing feature extraction, historical scoring, and persistence.
pub struct PredictionService<S, E> {
    store: Arc<S>,
    extractor: Arc<E>,
    engine: ScoringEngine,
    settings: PredictionSettings,
}

impl<S, E> PredictionService<S, E>
where
    S: HistoryStore + 'static,
    E: FeatureExtractor + 'static,
{
    pub fn new(store: Arc<S>, extractor: Arc<E>, settings: PredictionSettings) -> Self {
        Self::with_scoring(store, extractor, settings, ScoringConfig::default())
    }

    pub fn with_scoring(
        store: Arc<S>,
        extractor: Arc<E>,
        settings: PredictionSettings,
        scoring: ScoringConfig,
    ) -> Self {
        Self {
            store,
            extractor,
            engine: ScoringEngine::new(scoring),
            settings,
        }
    }

    pub fn settings(&self) -> &PredictionSettings {
        &self.settings
    }

    /// Analyze an uploaded chart. Store failures degrade instead of failing the request:
    /// unreadable history scores against neutral priors and an unsaved prediction comes
    /// back without an id.
    pub fn analyze(&self, image: &ChartImage) -> AnalysisOutcome {
        let features = self.extractor.extract(image);

        let history = match self.store.list_recent(self.settings.history_window) {
            Ok(history) => history,
            Err(error) => {
                warn!(%error, "history unavailable, scoring with neutral priors");
                Vec::new()
            }
        };

        let scored = self
            .engine
            .score(features, &history, self.settings.history_window);

        let id = match self.store.insert(scored.prediction.clone()) {
            Ok(record) => Some(record.id),
            Err(error) => {
                warn!(%error, "prediction could not be persisted");
                None
            }
        };

        info!(
            id = id.as_ref().map(PredictionId::as_str).unwrap_or("unsaved"),
            direction = %scored.prediction.direction,
            confidence = %scored.prediction.confidence,
            history = history.len(),
            "chart analyzed"
        );

        AnalysisOutcome {
            id,
            prediction: scored.prediction,
            final_score: scored.final_score,
            candidates: scored.candidates,
        }
    }

    /// Most recent predictions plus the win-rate summary over them.
    pub fn history(&self, limit: Option<usize>) -> Result<HistoryView, PredictionServiceError> {
        let limit = limit
            .filter(|limit| *limit > 0)
            .unwrap_or(self.settings.history_page_size);
        let predictions = self.store.list_recent(limit)?;
        let summary = HistorySummary::from_records(&predictions);
        Ok(HistoryView {
            predictions,
            summary,
        })
    }

    pub fn get(&self, id: &PredictionId) -> Result<PredictionRecord, PredictionServiceError> {
        let record = self.store.fetch(id)?.ok_or(StoreError::NotFound)?;
        Ok(record)
    }

    /// Mark a prediction as won or lost so later scoring can learn from it.
    pub fn record_outcome(
        &self,
        id: &PredictionId,
        outcome: Outcome,
    ) -> Result<PredictionRecord, PredictionServiceError> {
        let written = if self.settings.allow_outcome_revision {
            self.store.update_outcome(id, outcome)
        } else {
            self.store.record_outcome_once(id, outcome)
        };

        let record = match written {
            Ok(record) => record,
            Err(StoreError::AlreadyResolved) => {
                return Err(PredictionServiceError::OutcomeAlreadyRecorded(id.clone()));
            }
            Err(other) => return Err(other.into()),
        };
        info!(id = %record.id, %outcome, "prediction outcome recorded");
        Ok(record)
    }
}

/// Result of a single chart analysis as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub id: Option<PredictionId>,
    pub prediction: NewPrediction,
    pub final_score: f64,
    pub candidates: Vec<CandidateScore>,
}

impl AnalysisOutcome {
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn view(&self) -> AnalysisView {
        AnalysisView {
            id: self.id.clone(),
            persisted: self.is_persisted(),
            chart_features: self.prediction.chart_features,
            direction: self.prediction.direction,
            confidence: self.prediction.confidence,
            risk_level: self.prediction.risk_level,
            reason: self.prediction.reason.clone(),
            scored_at: self.prediction.scored_at,
            final_score: self.final_score,
            candidates: self.candidates.clone(),
        }
    }
}

/// Flattened analysis payload for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<PredictionId>,
    pub persisted: bool,
    pub chart_features: ChartFeatures,
    pub direction: Direction,
    pub confidence: Confidence,
    pub risk_level: RiskLevel,
    pub reason: String,
    pub scored_at: DateTime<Utc>,
    pub final_score: f64,
    pub candidates: Vec<CandidateScore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub predictions: Vec<PredictionRecord>,
    pub summary: HistorySummary,
}

/// Win-rate badge over a page of history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub total: usize,
    pub resolved: usize,
    pub pending: usize,
    pub wins: usize,
    pub losses: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_rate_pct: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<WinRateBand>,
}

impl HistorySummary {
    pub fn from_records(records: &[PredictionRecord]) -> Self {
        let wins = records
            .iter()
            .filter(|record| record.outcome == Some(Outcome::Win))
            .count();
        let losses = records
            .iter()
            .filter(|record| record.outcome == Some(Outcome::Loss))
            .count();
        let resolved = wins + losses;

        let win_rate_pct = if resolved == 0 {
            None
        } else {
            Some((wins as f64 / resolved as f64 * 100.0).round() as u8)
        };

        Self {
            total: records.len(),
            resolved,
            pending: records.len() - resolved,
            wins,
            losses,
            win_rate_pct,
            band: win_rate_pct.map(WinRateBand::from_pct),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WinRateBand {
    Strong,
    Moderate,
    Weak,
}

impl WinRateBand {
    pub fn from_pct(pct: u8) -> Self {
        match pct {
            70.. => Self::Strong,
            50..=69 => Self::Moderate,
            _ => Self::Weak,
        }
    }
}

/// Error raised by the prediction service.
#[derive(Debug, thiserror::Error)]
pub enum PredictionServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("outcome already recorded for prediction {0}")]
    OutcomeAlreadyRecorded(PredictionId),
}
