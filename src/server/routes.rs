//! HTTP routes for the boundary service.
//!
//! - `POST /predictions` → 201 with the prediction
//! - `GET /predictions/{id}` → 200 with the prediction
//! - `POST /predictions/{id}/cancel` → `{"success": true}`
//! - `GET /models` → the model catalog
//! - `GET /health` → `{"status": "ok", "version": ...}`
//!
//! Failures are `{"error": message, "statusCode": code}` with the mapped status.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use super::service::{ProxyService, boundary_status};
use crate::ReelgateError;
use crate::catalog::ModelCatalog;
use crate::types::{Prediction, VideoModel};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProxyService>,
    pub catalog: Arc<ModelCatalog>,
}

/// Build the boundary router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predictions", post(create_prediction))
        .route("/predictions/{id}", get(get_prediction))
        .route("/predictions/{id}/cancel", post(cancel_prediction))
        .route("/models", get(list_models))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Error response wrapper: maps [`ReelgateError`] to status + JSON body.
pub struct ApiError(pub ReelgateError);

impl From<ReelgateError> for ApiError {
    fn from(error: ReelgateError) -> Self {
        Self(error)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    status_code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, message) = boundary_status(&self.0);
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: message,
            status_code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

async fn create_prediction(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Prediction>), ApiError> {
    let body: Value = serde_json::from_slice(&body)
        .map_err(|_| ReelgateError::InvalidRequest("Request body must be JSON".to_string()))?;
    let prediction = state.service.create_from_json(&body).await?;
    Ok((StatusCode::CREATED, Json(prediction)))
}

async fn get_prediction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Prediction>, ApiError> {
    Ok(Json(state.service.get(&id).await?))
}

async fn cancel_prediction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.service.cancel(&id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn list_models(State(state): State<AppState>) -> Json<Vec<VideoModel>> {
    Json(state.catalog.list().to_vec())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::version::PKG_VERSION,
    })
}
