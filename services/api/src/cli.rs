use crate::demo::{
    run_demo, run_history, run_outcome, run_predict, DemoArgs, HistoryArgs, OutcomeArgs,
    PredictArgs,
};
use crate::infra::{init_command_telemetry, load_config};
use crate::server;
use clap::{Args, Parser, Subcommand};
use chart_signal::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Chart Signal",
    about = "Score trading chart screenshots against recorded prediction outcomes",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Analyze a chart screenshot and store the prediction
    Predict(PredictArgs),
    /// List recent predictions with the running win rate
    History(HistoryArgs),
    /// Mark a stored prediction as a win or a loss
    Outcome(OutcomeArgs),
    /// Run a self-contained feedback loop against an in-memory store
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// SQLite database holding prediction history (overrides APP_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    // `serve` sets up logging itself once host and port overrides are applied.
    if !matches!(command, Command::Serve(_)) {
        let config = load_config(None)?;
        init_command_telemetry(&config.telemetry)?;
    }

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Predict(args) => run_predict(args),
        Command::History(args) => run_history(args),
        Command::Outcome(args) => run_outcome(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_signal::prediction::Outcome;

    #[test]
    fn serve_is_optional() {
        let cli = Cli::try_parse_from(["chart-signal"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn outcome_command_parses_id_and_result() {
        let cli = Cli::try_parse_from(["chart-signal", "outcome", "abc-123", "loss"])
            .expect("parses");
        match cli.command {
            Some(Command::Outcome(args)) => {
                assert_eq!(args.id, "abc-123");
                assert_eq!(args.outcome, Outcome::Loss);
            }
            other => panic!("expected outcome command, got {other:?}"),
        }
    }

    #[test]
    fn outcome_command_rejects_unknown_results() {
        assert!(Cli::try_parse_from(["chart-signal", "outcome", "abc-123", "draw"]).is_err());
    }
}
