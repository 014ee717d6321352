use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ChartImage, Outcome, PredictionId};
use super::extractor::FeatureExtractor;
use super::service::{PredictionService, PredictionServiceError};
use super::store::{HistoryStore, StoreError};

/// Router builder exposing chart upload, history, and outcome endpoints.
pub fn prediction_router<S, E>(service: Arc<PredictionService<S, E>>) -> Router
where
    S: HistoryStore + 'static,
    E: FeatureExtractor + 'static,
{
    Router::new()
        .route(
            "/api/v1/predictions",
            post(analyze_handler::<S, E>).get(history_handler::<S, E>),
        )
        .route(
            "/api/v1/predictions/:prediction_id",
            get(prediction_handler::<S, E>),
        )
        .route(
            "/api/v1/predictions/:prediction_id/outcome",
            post(outcome_handler::<S, E>),
        )
        // Chart screenshots are accepted at any size.
        .layer(DefaultBodyLimit::disable())
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HistoryQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutcomeRequest {
    pub(crate) outcome: Outcome,
}

pub(crate) async fn analyze_handler<S, E>(
    State(service): State<Arc<PredictionService<S, E>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: HistoryStore + 'static,
    E: FeatureExtractor + 'static,
{
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let image = match ChartImage::new(content_type, body.to_vec()) {
        Ok(image) => image,
        Err(error) => {
            return error_response(StatusCode::UNSUPPORTED_MEDIA_TYPE, error.to_string());
        }
    };

    match run_blocking(service, move |service| service.analyze(&image)).await {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome.view())).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn history_handler<S, E>(
    State(service): State<Arc<PredictionService<S, E>>>,
    Query(query): Query<HistoryQuery>,
) -> Response
where
    S: HistoryStore + 'static,
    E: FeatureExtractor + 'static,
{
    let limit = query.limit;
    match run_blocking(service, move |service| service.history(limit)).await {
        Ok(Ok(view)) => (StatusCode::OK, Json(view)).into_response(),
        Ok(Err(other)) => service_error_response(other),
        Err(response) => response,
    }
}

pub(crate) async fn prediction_handler<S, E>(
    State(service): State<Arc<PredictionService<S, E>>>,
    Path(prediction_id): Path<String>,
) -> Response
where
    S: HistoryStore + 'static,
    E: FeatureExtractor + 'static,
{
    let id = PredictionId(prediction_id);
    match run_blocking(service, move |service| service.get(&id)).await {
        Ok(Ok(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(Err(other)) => service_error_response(other),
        Err(response) => response,
    }
}

pub(crate) async fn outcome_handler<S, E>(
    State(service): State<Arc<PredictionService<S, E>>>,
    Path(prediction_id): Path<String>,
    request: Result<Json<OutcomeRequest>, JsonRejection>,
) -> Response
where
    S: HistoryStore + 'static,
    E: FeatureExtractor + 'static,
{
    let outcome = match request {
        Ok(Json(request)) => request.outcome,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };

    let id = PredictionId(prediction_id);
    match run_blocking(service, move |service| service.record_outcome(&id, outcome)).await {
        Ok(Ok(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(Err(other)) => service_error_response(other),
        Err(response) => response,
    }
}

/// Store calls block, so they run on the blocking pool instead of a runtime worker.
async fn run_blocking<S, E, T, F>(
    service: Arc<PredictionService<S, E>>,
    task: F,
) -> Result<T, Response>
where
    S: HistoryStore + 'static,
    E: FeatureExtractor + 'static,
    T: Send + 'static,
    F: FnOnce(&PredictionService<S, E>) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || task(&service))
        .await
        .map_err(|err| {
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("prediction task failed: {err}"),
            )
        })
}

fn service_error_response(error: PredictionServiceError) -> Response {
    let status = match &error {
        PredictionServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        PredictionServiceError::OutcomeAlreadyRecorded(_)
        | PredictionServiceError::Store(StoreError::AlreadyResolved) => StatusCode::CONFLICT,
        PredictionServiceError::Store(StoreError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        PredictionServiceError::Store(StoreError::Malformed(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, error.to_string())
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
