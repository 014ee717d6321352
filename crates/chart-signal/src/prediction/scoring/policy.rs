use super::super::domain::{ChartFeatures, Confidence, Direction, RiskLevel};
use super::config::ScoringConfig;

pub(crate) const CONSOLIDATION_REASON: &str =
    "Market in consolidation – no valid pattern or clean zone interaction.";
pub(crate) const FALLBACK_REASON: &str = "No reliable prediction found for this setup.";

/// Maps a final score onto confidence and risk labels. Both thresholds are strict.
pub fn grade(score: f64, config: &ScoringConfig) -> (Confidence, RiskLevel) {
    if score > config.confidence_threshold {
        (Confidence::High, RiskLevel::Low)
    } else if score < -config.confidence_threshold {
        (Confidence::Low, RiskLevel::High)
    } else {
        (Confidence::Medium, RiskLevel::Medium)
    }
}

pub(crate) fn compose_reason(
    features: &ChartFeatures,
    candidate: Direction,
    recommended: Direction,
) -> String {
    if recommended == Direction::Wait {
        return CONSOLIDATION_REASON.to_string();
    }

    if recommended != candidate {
        return format!(
            "Historical feedback shows {candidate} is losing for this setup. Trying {recommended} instead."
        );
    }

    format!(
        "{} {} at {} with {} momentum in {}.",
        recommended.bias_label(),
        features.pattern,
        features.zone,
        features.momentum,
        features.trend
    )
}
