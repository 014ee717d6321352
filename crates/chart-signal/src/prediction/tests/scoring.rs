use super::common::*;
use crate::prediction::domain::{
    Confidence, Direction, Momentum, Outcome, Pattern, RiskLevel, Trend, Zone,
};
use crate::prediction::scoring::{grade, ScoringConfig};

#[test]
fn empty_history_prefers_buy_on_neutral_tie() {
    let outcome = engine().score(features(), &[], 200);

    assert_eq!(outcome.prediction.direction, Direction::Buy);
    assert_eq!(outcome.prediction.confidence, Confidence::Medium);
    assert_eq!(outcome.prediction.risk_level, RiskLevel::Medium);
    assert_eq!(
        outcome.prediction.reason,
        "Bullish engulfing at support with strong momentum in uptrend."
    );
    assert_eq!(outcome.final_score, 0.0);
    assert_eq!(outcome.prediction.chart_features, features());

    let scores: Vec<f64> = outcome.candidates.iter().map(|c| c.score).collect();
    assert_eq!(scores, vec![0.0, 0.0, 0.0]);
}

#[test]
fn directions_without_matches_use_neutral_priors() {
    let history = records(features(), Direction::Sell, 3, 0, 0);

    let outcome = engine().score(features(), &history, 200);
    let buy = outcome.candidate(Direction::Buy).expect("buy scored");

    assert_eq!(buy.total, 0);
    assert_eq!(buy.win_rate, 0.5);
    assert_eq!(buy.loss_rate, 0.5);
    assert_eq!(buy.score, 0.0);
}

#[test]
fn six_records_with_four_losses_reverse_the_trade() {
    let history = records(features(), Direction::Buy, 2, 4, 0);

    let outcome = engine().score(features(), &history, 200);
    let buy = outcome.candidate(Direction::Buy).expect("buy scored");

    assert!(buy.reversed);
    assert_eq!(buy.recommended, Direction::Sell);
    assert_eq!(buy.total, 6);
    assert!(buy.loss_rate > 0.6);
    assert_eq!(outcome.prediction.direction, Direction::Sell);
    assert_eq!(
        outcome.prediction.reason,
        "Historical feedback shows Buy is losing for this setup. Trying Sell instead."
    );
    assert_eq!(outcome.prediction.confidence, Confidence::Medium);
}

#[test]
fn five_records_with_three_losses_do_not_reverse() {
    let history = records(features(), Direction::Buy, 2, 3, 0);

    let outcome = engine().score(features(), &history, 200);
    let buy = outcome.candidate(Direction::Buy).expect("buy scored");

    assert!(!buy.reversed);
    assert_eq!(buy.recommended, Direction::Buy);
    assert!((buy.score - (-0.2)).abs() < 1e-9);
    assert_eq!(outcome.prediction.direction, Direction::Sell);
    assert_eq!(
        outcome.prediction.reason,
        "Bearish engulfing at support with strong momentum in uptrend."
    );
}

#[test]
fn exactly_sixty_percent_losses_do_not_reverse() {
    // 10 matches, 6 losses: loss rate equals the threshold.
    let history = records(features(), Direction::Buy, 4, 6, 0);

    let outcome = engine().score(features(), &history, 200);
    let buy = outcome.candidate(Direction::Buy).expect("buy scored");

    assert!(!buy.reversed);
}

#[test]
fn pending_records_count_toward_the_sample_size() {
    let history = records(features(), Direction::Buy, 0, 4, 2);

    let outcome = engine().score(features(), &history, 200);
    let buy = outcome.candidate(Direction::Buy).expect("buy scored");

    assert_eq!(buy.total, 6);
    assert_eq!(buy.wins, 0);
    assert_eq!(buy.losses, 4);
    assert!(buy.reversed);
}

#[test]
fn reversal_scores_against_the_opposite_history() {
    let mut history = records(features(), Direction::Buy, 1, 5, 0);
    history.extend(records(features(), Direction::Sell, 2, 0, 0));

    let outcome = engine().score(features(), &history, 200);

    assert_eq!(outcome.prediction.direction, Direction::Sell);
    assert_eq!(outcome.final_score, 1.0);
    assert_eq!(outcome.prediction.confidence, Confidence::High);
    assert_eq!(outcome.prediction.risk_level, RiskLevel::Low);
    // Buy is evaluated first and reaches the same score through reversal.
    assert!(outcome.prediction.reason.starts_with("Historical feedback shows Buy"));
}

#[test]
fn wait_scores_zero_regardless_of_history() {
    let mut history = records(features(), Direction::Wait, 5, 0, 0);
    history.extend(records(features(), Direction::Buy, 0, 3, 0));
    history.extend(records(features(), Direction::Sell, 0, 3, 0));

    let outcome = engine().score(features(), &history, 200);
    let wait = outcome.candidate(Direction::Wait).expect("wait scored");

    assert_eq!(wait.win_rate, 1.0);
    assert_eq!(wait.score, 0.0);
    assert_eq!(outcome.prediction.direction, Direction::Wait);
    assert_eq!(outcome.prediction.confidence, Confidence::Medium);
    assert_eq!(outcome.prediction.risk_level, RiskLevel::Medium);
    assert_eq!(
        outcome.prediction.reason,
        "Market in consolidation – no valid pattern or clean zone interaction."
    );
}

#[test]
fn winning_history_yields_high_confidence() {
    let history = records(features(), Direction::Buy, 5, 0, 0);

    let outcome = engine().score(features(), &history, 200);

    assert_eq!(outcome.prediction.direction, Direction::Buy);
    assert_eq!(outcome.prediction.confidence, Confidence::High);
    assert_eq!(outcome.prediction.risk_level, RiskLevel::Low);
}

#[test]
fn match_key_is_pattern_and_trend_only() {
    let other_zone = crate::prediction::ChartFeatures {
        zone: Zone::Resistance,
        momentum: Momentum::Weak,
        ..features()
    };
    let other_pattern = crate::prediction::ChartFeatures {
        pattern: Pattern::PinBar,
        ..features()
    };
    let other_trend = crate::prediction::ChartFeatures {
        trend: Trend::Sideways,
        ..features()
    };

    let mut history = records(other_zone, Direction::Buy, 2, 0, 0);
    history.extend(records(other_pattern, Direction::Buy, 0, 7, 0));
    history.extend(records(other_trend, Direction::Buy, 0, 7, 0));

    let outcome = engine().score(features(), &history, 200);
    let buy = outcome.candidate(Direction::Buy).expect("buy scored");

    assert_eq!(buy.total, 2);
    assert_eq!(buy.wins, 2);
    assert!(!buy.reversed);
}

#[test]
fn only_the_newest_records_inside_the_window_count() {
    let mut history = records(features(), Direction::Sell, 2, 0, 0);
    history.extend(records(features(), Direction::Buy, 3, 0, 0));

    let windowed = engine().score(features(), &history, 2);
    assert_eq!(windowed.candidate(Direction::Buy).expect("buy").total, 0);
    assert_eq!(windowed.prediction.direction, Direction::Sell);

    let full = engine().score(features(), &history, 200);
    assert_eq!(full.candidate(Direction::Buy).expect("buy").total, 3);
    assert_eq!(full.prediction.direction, Direction::Buy);
}

#[test]
fn identical_inputs_produce_identical_predictions() {
    let mut history = records(features(), Direction::Buy, 2, 4, 1);
    history.extend(records(features(), Direction::Sell, 1, 1, 0));

    let first = engine().score_at(features(), &history, 200, base_time());
    let second = engine().score_at(features(), &history, 200, base_time());

    assert_eq!(first, second);
}

#[test]
fn grade_boundaries_are_strict() {
    let config = ScoringConfig::default();

    assert_eq!(grade(0.41, &config), (Confidence::High, RiskLevel::Low));
    assert_eq!(grade(0.4, &config), (Confidence::Medium, RiskLevel::Medium));
    assert_eq!(grade(-0.41, &config), (Confidence::Low, RiskLevel::High));
    assert_eq!(grade(-0.4, &config), (Confidence::Medium, RiskLevel::Medium));
}

#[test]
fn custom_thresholds_change_reversal_behavior() {
    let engine = crate::prediction::ScoringEngine::new(ScoringConfig {
        reversal_min_samples: 2,
        ..ScoringConfig::default()
    });
    let history = records(features(), Direction::Buy, 0, 3, 0);

    let outcome = engine.score(features(), &history, 200);

    assert!(outcome.candidate(Direction::Buy).expect("buy").reversed);
    assert_eq!(outcome.prediction.direction, Direction::Sell);
    assert!(history.iter().all(|record| record.outcome == Some(Outcome::Loss)));
}
