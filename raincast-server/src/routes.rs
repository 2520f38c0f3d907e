use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use raincast_core::{Forecaster, PredictError, PrecipResponse, RainResponse};
use serde::Deserialize;
use serde_json::{Value, json};

pub fn router(forecaster: Arc<Forecaster>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health/", get(health))
        .route("/predict/rain/", get(predict_rain))
        .route("/predict/precipitation/fall/", get(predict_precipitation))
        .with_state(forecaster)
}

/// Error response carrying the status the client should see.
#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::NoFeatures(_) => ApiError::NotFound(err.to_string()),
            PredictError::WidthMismatch { .. } => {
                // A schema bug on our side, not bad input; keep the detail
                // in the log and out of the client response.
                tracing::error!("inference failure: {err}");
                ApiError::Internal("Model inference failed.".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: Option<String>,
}

fn parse_date(query: &DateQuery) -> Result<NaiveDate, ApiError> {
    let raw = query
        .date
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("Missing required query parameter 'date'.".into()))?;

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest(format!("Invalid date '{raw}': expected YYYY-MM-DD."))
    })
}

async fn home() -> Json<Value> {
    Json(json!({
        "message": "raincast prediction API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/health/": "GET health check",
            "/predict/rain/?date=YYYY-MM-DD": "Rain in exactly +7 days (binary)",
            "/predict/precipitation/fall/?date=YYYY-MM-DD": "3-day precipitation sum (mm)",
        },
        "examples": {
            "rain": "/predict/rain/?date=2023-01-01",
            "precipitation": "/predict/precipitation/fall/?date=2023-01-01",
        },
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn predict_rain(
    State(forecaster): State<Arc<Forecaster>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<RainResponse>, ApiError> {
    let date = parse_date(&query)?;
    let response = forecaster.rain_at(date)?;
    Ok(Json(response))
}

async fn predict_precipitation(
    State(forecaster): State<Arc<Forecaster>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<PrecipResponse>, ApiError> {
    let date = parse_date(&query)?;
    let response = forecaster.precipitation_at(date)?;
    Ok(Json(response))
}
