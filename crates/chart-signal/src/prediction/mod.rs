//! Chart upload analysis with outcome-driven historical scoring.
//!
//! An uploaded screenshot is reduced to categorical [`ChartFeatures`], scored against the
//! recent prediction history, stored, and later marked as a win or loss by the user. Those
//! outcomes feed back into the next round of scoring.

pub mod domain;
pub mod extractor;
pub mod router;
pub mod scoring;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    ChartFeatures, ChartImage, Confidence, Direction, Momentum, NewPrediction, Outcome, Pattern,
    PredictionId, PredictionRecord, RiskLevel, Trend, UnknownLabel, UploadError, Zone,
};
pub use extractor::{FeatureExtractor, FixedFeatureExtractor, RandomFeatureExtractor};
pub use router::prediction_router;
pub use scoring::{CandidateScore, ScoringConfig, ScoringEngine, ScoringOutcome};
pub use service::{
    AnalysisOutcome, AnalysisView, HistorySummary, HistoryView, PredictionService,
    PredictionServiceError, PredictionSettings, WinRateBand,
};
pub use store::{HistoryStore, InMemoryHistoryStore, SqliteHistoryStore, StoreError};
