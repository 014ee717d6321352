use serde::{Deserialize, Serialize};

/// Thresholds for the historical feedback heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Win and loss rate assumed for a direction with no matching history.
    pub neutral_prior: f64,
    /// Reversal needs strictly more matching records than this.
    pub reversal_min_samples: usize,
    /// Reversal needs a loss rate strictly above this.
    pub reversal_loss_rate: f64,
    /// Scores beyond +/- this value leave the medium band.
    pub confidence_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            neutral_prior: 0.5,
            reversal_min_samples: 5,
            reversal_loss_rate: 0.6,
            confidence_threshold: 0.4,
        }
    }
}
