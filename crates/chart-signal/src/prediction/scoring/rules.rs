use super::super::domain::{ChartFeatures, Direction, Outcome, PredictionRecord};
use super::config::ScoringConfig;
use super::CandidateScore;

/// Outcome tally for one direction within a pattern + trend setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct DirectionStats {
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
}

impl DirectionStats {
    pub(crate) fn collect(
        features: &ChartFeatures,
        history: &[PredictionRecord],
        direction: Direction,
    ) -> Self {
        history
            .iter()
            .filter(|record| {
                record.direction == direction && record.chart_features.matches_setup(features)
            })
            .fold(Self::default(), |mut stats, record| {
                stats.total += 1;
                match record.outcome {
                    Some(Outcome::Win) => stats.wins += 1,
                    Some(Outcome::Loss) => stats.losses += 1,
                    None => {}
                }
                stats
            })
    }

    pub(crate) fn win_rate(&self, config: &ScoringConfig) -> f64 {
        self.rate(self.wins, config)
    }

    pub(crate) fn loss_rate(&self, config: &ScoringConfig) -> f64 {
        self.rate(self.losses, config)
    }

    pub(crate) fn score(&self, config: &ScoringConfig) -> f64 {
        self.win_rate(config) - self.loss_rate(config)
    }

    fn rate(&self, count: usize, config: &ScoringConfig) -> f64 {
        if self.total == 0 {
            config.neutral_prior
        } else {
            count as f64 / self.total as f64
        }
    }

    fn is_losing(&self, config: &ScoringConfig) -> bool {
        self.total > config.reversal_min_samples
            && self.loss_rate(config) > config.reversal_loss_rate
    }
}

pub(crate) fn score_candidate(
    features: &ChartFeatures,
    history: &[PredictionRecord],
    candidate: Direction,
    config: &ScoringConfig,
) -> CandidateScore {
    let stats = DirectionStats::collect(features, history, candidate);
    let win_rate = stats.win_rate(config);
    let loss_rate = stats.loss_rate(config);

    let (recommended, raw_score) = if candidate.is_trade() && stats.is_losing(config) {
        let opposite = candidate.opposite();
        let opposite_stats = DirectionStats::collect(features, history, opposite);
        (opposite, opposite_stats.score(config))
    } else {
        (candidate, stats.score(config))
    };

    let score = if candidate.is_trade() { raw_score } else { 0.0 };

    CandidateScore {
        candidate,
        recommended,
        total: stats.total,
        wins: stats.wins,
        losses: stats.losses,
        win_rate,
        loss_rate,
        score,
        reversed: recommended != candidate,
    }
}
