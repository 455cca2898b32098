//! HTTP front door (thin, spec §6): accept a job, hand it to a background
//! worker, report health. Grounded in `billing/src/api/rest.rs`'s
//! `AppState` + `create_router` shape.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::auth::check_api_key;
use crate::config::SabanasConfig;
use crate::engine;
use crate::error::SabanasError;
use crate::repository::SabanasRepository;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<SabanasRepository>,
    pub config: Arc<SabanasConfig>,
}

pub fn create_router(repo: Arc<SabanasRepository>, config: Arc<SabanasConfig>) -> Router {
    let state = AppState { repo, config };

    Router::new()
        .route("/health", get(health))
        .route("/jobs/sabanas", post(create_job))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

#[derive(Deserialize)]
struct CreateJobRequest {
    #[serde(rename = "fileId")]
    file_id: i64,
}

#[derive(Serialize)]
struct CreateJobResponse {
    #[serde(rename = "jobId")]
    job_id: Uuid,
    #[serde(rename = "fileId")]
    file_id: i64,
    state: &'static str,
    #[serde(rename = "correlationId")]
    correlation_id: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl axum::response::IntoResponse for SabanasError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody { error: self.error_code(), message: self.to_string() };
        (status, Json(body)).into_response()
    }
}

async fn create_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<CreateJobResponse>), SabanasError> {
    let x_api_key = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    let authorization = headers.get("authorization").and_then(|v| v.to_str().ok());
    if !check_api_key(&state.config.service_api_key, x_api_key, authorization) {
        return Err(SabanasError::Auth("missing or invalid credentials".to_string()));
    }

    if req.file_id < 1 {
        return Err(SabanasError::Validation("fileId must be >= 1".to_string()));
    }

    let correlation_id = headers
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // An Idempotency-Key header is accepted but not deduplicated against —
    // the original service has no idempotency store, so a repeat request
    // with the same key simply queues a second job.
    let accepted = engine::accept_job(&state.repo, req.file_id).await?;

    let repo = state.repo.clone();
    let config = state.config.clone();
    let file_id = req.file_id;
    let spawn_correlation_id = correlation_id.clone();
    tokio::spawn(async move {
        engine::process_job(repo, config, file_id, spawn_correlation_id).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateJobResponse {
            job_id: accepted.job_id,
            file_id: accepted.file.id,
            state: "queued",
            correlation_id,
        }),
    ))
}
