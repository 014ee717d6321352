mod config;
mod policy;
mod rules;

pub use config::ScoringConfig;
pub use policy::grade;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{ChartFeatures, Confidence, Direction, NewPrediction, PredictionRecord, RiskLevel};
use policy::{compose_reason, FALLBACK_REASON};

/// Pure scorer turning chart features plus recent outcomes into a single recommendation.
///
/// Each of Buy, Sell and Wait is scored from the win and loss rates of past predictions
/// sharing the same pattern and trend. A trade direction that keeps losing is swapped for
/// its opposite before it competes. Wait always scores zero.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// `history` is expected newest first; only the first `max_history` records count.
    pub fn score(
        &self,
        features: ChartFeatures,
        history: &[PredictionRecord],
        max_history: usize,
    ) -> ScoringOutcome {
        self.score_at(features, history, max_history, Utc::now())
    }

    pub fn score_at(
        &self,
        features: ChartFeatures,
        history: &[PredictionRecord],
        max_history: usize,
        now: DateTime<Utc>,
    ) -> ScoringOutcome {
        let window = &history[..history.len().min(max_history)];

        let candidates: Vec<CandidateScore> = Direction::CANDIDATES
            .iter()
            .map(|candidate| rules::score_candidate(&features, window, *candidate, &self.config))
            .collect();

        let mut best: Option<&CandidateScore> = None;
        for candidate in &candidates {
            if best.map_or(true, |current| candidate.score > current.score) {
                best = Some(candidate);
            }
        }

        let (prediction, final_score) = match best {
            Some(best) => {
                let (confidence, risk_level) = grade(best.score, &self.config);
                let prediction = NewPrediction {
                    chart_features: features,
                    direction: best.recommended,
                    confidence,
                    risk_level,
                    reason: compose_reason(&features, best.candidate, best.recommended),
                    scored_at: now,
                };
                (prediction, best.score)
            }
            None => (fallback_prediction(features, now), 0.0),
        };

        debug!(
            history = window.len(),
            direction = %prediction.direction,
            final_score,
            "scored chart setup"
        );

        ScoringOutcome {
            prediction,
            final_score,
            candidates,
        }
    }
}

fn fallback_prediction(features: ChartFeatures, now: DateTime<Utc>) -> NewPrediction {
    NewPrediction {
        chart_features: features,
        direction: Direction::Wait,
        confidence: Confidence::Low,
        risk_level: RiskLevel::High,
        reason: FALLBACK_REASON.to_string(),
        scored_at: now,
    }
}

/// Audit entry for one evaluated candidate direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub candidate: Direction,
    pub recommended: Direction,
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub loss_rate: f64,
    pub score: f64,
    pub reversed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringOutcome {
    pub prediction: NewPrediction,
    pub final_score: f64,
    pub candidates: Vec<CandidateScore>,
}

impl ScoringOutcome {
    pub fn candidate(&self, direction: Direction) -> Option<&CandidateScore> {
        self.candidates
            .iter()
            .find(|candidate| candidate.candidate == direction)
    }
}
