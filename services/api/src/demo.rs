use crate::infra::{build_prediction_service, load_config};
use chart_signal::error::AppError;
use chart_signal::prediction::{
    AnalysisOutcome, ChartImage, Direction, HistoryView, InMemoryHistoryStore, Outcome,
    PredictionId, PredictionRecord, PredictionService, PredictionSettings, RandomFeatureExtractor,
};
use chrono::Local;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

const DEMO_CHART: &[u8] = b"\x89PNG\r\n\x1a\n";

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Chart screenshot to analyze
    pub(crate) image: PathBuf,
    /// Content type of the upload. Guessed from the file extension when omitted.
    #[arg(long)]
    pub(crate) content_type: Option<String>,
    /// SQLite database holding prediction history (overrides APP_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct HistoryArgs {
    /// Number of predictions to list (defaults to APP_HISTORY_PAGE_SIZE)
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// SQLite database holding prediction history (overrides APP_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct OutcomeArgs {
    /// Identifier printed by the predict command
    pub(crate) id: String,
    /// Result of the trade: win or loss
    #[arg(value_parser = crate::infra::parse_outcome)]
    pub(crate) outcome: Outcome,
    /// SQLite database holding prediction history (overrides APP_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Seed for the feature extractor so runs are reproducible
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Number of simulated chart uploads
    #[arg(long, default_value_t = 12)]
    pub(crate) uploads: usize,
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let PredictArgs {
        image,
        content_type,
        database,
    } = args;

    let config = load_config(database)?;
    if config.storage.database_path.is_none() {
        eprintln!("warning: no database configured, this prediction will not be kept");
    }
    let service = build_prediction_service(&config)?;

    let content_type = content_type.unwrap_or_else(|| {
        mime_guess::from_path(&image)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    });
    let bytes = std::fs::read(&image)?;
    let chart = ChartImage::new(Some(&content_type), bytes)?;

    let outcome = service.analyze(&chart);
    render_analysis(&outcome);
    Ok(())
}

pub(crate) fn run_history(args: HistoryArgs) -> Result<(), AppError> {
    let config = load_config(args.database)?;
    let service = build_prediction_service(&config)?;

    let view = service.history(args.limit)?;
    render_history(&view);
    Ok(())
}

pub(crate) fn run_outcome(args: OutcomeArgs) -> Result<(), AppError> {
    let config = load_config(args.database)?;
    let service = build_prediction_service(&config)?;

    let record = service.record_outcome(&PredictionId(args.id), args.outcome)?;
    println!(
        "Recorded {} for prediction {} ({})",
        args.outcome, record.id, record.direction
    );
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let extractor = match args.seed {
        Some(seed) => RandomFeatureExtractor::seeded(seed),
        None => RandomFeatureExtractor::from_entropy(),
    };
    let service = PredictionService::new(
        Arc::new(InMemoryHistoryStore::default()),
        Arc::new(extractor),
        PredictionSettings::default(),
    );
    let chart = ChartImage::new(Some("image/png"), DEMO_CHART.to_vec())?;

    println!("Chart signal feedback demo");
    println!("Simulating {} uploads against an in-memory history\n", args.uploads);

    for index in 0..args.uploads {
        let outcome = service.analyze(&chart);
        println!(
            "#{:<3} {:<28} -> {:<4} (score {:+.2}, {} confidence)",
            index + 1,
            describe_setup(&outcome),
            outcome.prediction.direction,
            outcome.final_score,
            outcome.prediction.confidence
        );

        let Some(id) = outcome.id else {
            continue;
        };
        if let Some(result) = simulated_result(index, outcome.prediction.direction) {
            service.record_outcome(&id, result)?;
            println!("     marked {}", result);
        }
    }

    println!();
    let view = service.history(Some(args.uploads))?;
    render_history(&view);
    Ok(())
}

// Every third trade loses; Wait calls are left unresolved.
fn simulated_result(index: usize, direction: Direction) -> Option<Outcome> {
    if !direction.is_trade() {
        return None;
    }
    if index % 3 == 2 {
        Some(Outcome::Loss)
    } else {
        Some(Outcome::Win)
    }
}

fn describe_setup(outcome: &AnalysisOutcome) -> String {
    let features = outcome.prediction.chart_features;
    format!("{} / {}", features.pattern, features.trend)
}

fn render_analysis(outcome: &AnalysisOutcome) {
    let prediction = &outcome.prediction;
    println!("Prediction: {}", prediction.direction);
    println!(
        "  Confidence: {}  Risk: {}",
        prediction.confidence, prediction.risk_level
    );
    println!("  Reason: {}", prediction.reason);
    println!(
        "  Features: {} pattern, {} trend, {} zone, {} momentum",
        prediction.chart_features.pattern,
        prediction.chart_features.trend,
        prediction.chart_features.zone,
        prediction.chart_features.momentum
    );
    println!("  Final score: {:+.2}", outcome.final_score);
    for candidate in &outcome.candidates {
        println!(
            "    {:<4} {}/{} resolved over {} similar -> {:+.2}{}",
            candidate.candidate,
            candidate.wins,
            candidate.wins + candidate.losses,
            candidate.total,
            candidate.score,
            if candidate.reversed {
                format!(" (reversed to {})", candidate.recommended)
            } else {
                String::new()
            }
        );
    }
    match &outcome.id {
        Some(id) => println!("  Prediction id: {}", id),
        None => println!("  Prediction was not saved"),
    }
}

fn render_history(view: &HistoryView) {
    let summary = &view.summary;
    match (summary.win_rate_pct, summary.band) {
        (Some(pct), Some(band)) => println!(
            "Win rate: {}% ({:?}) over {} resolved, {} pending",
            pct, band, summary.resolved, summary.pending
        ),
        _ => println!("Win rate: n/a ({} pending)", summary.pending),
    }

    if view.predictions.is_empty() {
        println!("No predictions yet");
        return;
    }

    println!("\nRecent predictions");
    for record in &view.predictions {
        println!("- {}", history_line(record));
    }
}

fn history_line(record: &PredictionRecord) -> String {
    let status = record
        .outcome
        .map(|outcome| outcome.to_string())
        .unwrap_or_else(|| "Pending".to_string());
    format!(
        "{} {} {} {}/{} [{}] {}",
        record.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        record.id,
        record.direction,
        record.chart_features.pattern,
        record.chart_features.trend,
        status,
        record.confidence
    )
}
