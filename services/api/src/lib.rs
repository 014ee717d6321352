mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use chart_signal::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
