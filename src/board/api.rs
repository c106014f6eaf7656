use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use super::models::{ListQuery, Phase};
use super::source::{DataSource, InMemorySource};
use crate::errors::SourceError;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub store: Arc<InMemorySource>,
}

pub type SharedState = Arc<AppState>;

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"message": message}))).into_response()
    }
}

impl From<SourceError> for ApiError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            SourceError::InvalidPhase { .. } | SourceError::BadRequest(_) => {
                ApiError::BadRequest(err.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

const NO_STORE: [(header::HeaderName, &str); 1] = [(header::CACHE_CONTROL, "no-store")];

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/inquiries", get(list_inquiries))
        .route(
            "/api/inquiries/{id}",
            get(get_inquiry).patch(update_inquiry_phase),
        )
        .route("/health", get(health_check))
}

// ── Helpers ───────────────────────────────────────────────────────────

/// Extract and validate the `phase` field of a PATCH body.
fn parse_phase_body(body: &[u8]) -> Result<Phase, SourceError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|_| SourceError::BadRequest("Invalid JSON body".to_string()))?;
    let raw = value.get("phase").and_then(|p| p.as_str()).unwrap_or_default();
    Phase::from_str(raw).map_err(|_| SourceError::InvalidPhase {
        phase: raw.to_string(),
    })
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn list_inquiries(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filters = query.into_filters();
    let items = state.store.list(&filters).await?;
    tracing::debug!(query = %filters.to_query_string(), count = items.len(), "listed inquiries");
    Ok((NO_STORE, Json(items)))
}

async fn get_inquiry(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.store.get(&id) {
        Some(inquiry) => Ok((NO_STORE, Json(inquiry))),
        None => Err(ApiError::NotFound("Inquiry not found".to_string())),
    }
}

async fn update_inquiry_phase(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let phase = parse_phase_body(&body)?;
    let inquiry = state.store.update_phase(&id, phase).await?;
    tracing::info!(id = %inquiry.id, phase = %inquiry.phase, "phase updated via API");
    Ok((NO_STORE, Json(inquiry)))
}

// ── Tests ─────────────────────────────────────────────────────────────
