use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::admission::AdmissionError;
use crate::deployment::DeploymentRequest;
use crate::server::state::AppState;

/// Body of `POST /v1/admission/validate`
#[derive(Debug, Deserialize, Serialize)]
pub struct AdmissionRequest {
    pub requests: Vec<DeploymentRequest>,
}

/// Verdict for one batch
#[derive(Debug, Serialize, Deserialize)]
pub struct AdmissionResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AdmissionResponse {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            code: None,
            identity: None,
            message: None,
        }
    }

    pub fn denied(error: &AdmissionError) -> Self {
        Self {
            allowed: false,
            code: Some(error.code().to_string()),
            identity: error.identity().map(String::from),
            message: Some(error.to_string()),
        }
    }
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Admission totals since startup
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.counts())
}

/// Validate a batch of deployments
pub async fn validate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AdmissionRequest>,
) -> impl IntoResponse {
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let result = state.validator.validate_batch(&body.requests).await;
    state.record(result.is_ok());

    let (status, response) = match result {
        Ok(()) => (StatusCode::OK, AdmissionResponse::allowed()),
        Err(e) if e.is_cluster_unavailable() => {
            (StatusCode::SERVICE_UNAVAILABLE, AdmissionResponse::denied(&e))
        }
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, AdmissionResponse::denied(&e)),
    };
    info!(
        request_id = %request_id,
        requests = body.requests.len(),
        allowed = response.allowed,
        "admission decision"
    );

    let mut response_headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response_headers.insert("x-request-id", value);
    }

    (status, response_headers, Json(response))
}

/// Create the Axum router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/v1/admission/validate", post(validate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
