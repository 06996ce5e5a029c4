// Result collector
//
// The worker reports each run's outcome here with a shared bearer token.
// Reports are idempotent by request id: a later report overwrites.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use promptrun_core::request::OutcomeStatus;

use super::common::{MessageResponse, ValidationErrorResponse};
use super::validation::trimmed;
use crate::storage::RequestStore;

/// Outcome reported by the worker
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ResultReport {
    #[serde(default)]
    pub request_id: Option<String>,
    /// `completed` or `failed`, case-insensitive
    #[serde(default)]
    #[schema(example = "completed")]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

/// App state for collector routes
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RequestStore>,
    pub token: String,
}

impl AppState {
    pub fn new(store: Arc<dyn RequestStore>, token: impl Into<String>) -> Self {
        Self {
            store,
            token: token.into(),
        }
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| token == self.token)
    }
}

/// Create collector routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/internal/agent-result", post(report_result))
        .with_state(state)
}

/// POST /internal/agent-result - Record a run outcome
#[utoipa::path(
    post,
    path = "/internal/agent-result",
    request_body = ResultReport,
    responses(
        (status = 204, description = "Outcome recorded"),
        (status = 400, description = "Missing fields or unsupported status"),
        (status = 401, description = "Missing or wrong bearer token", body = MessageResponse),
        (status = 404, description = "Request not found", body = MessageResponse)
    ),
    tag = "internal"
)]
pub async fn report_result(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ResultReport>, JsonRejection>,
) -> Response {
    if !state.authorized(&headers) {
        tracing::warn!("Rejected result report with bad credentials");
        return MessageResponse::respond(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let Json(report) = match payload {
        Ok(report) => report,
        Err(rejection) => {
            return ValidationErrorResponse::new(vec![rejection.body_text()]).into_response()
        }
    };

    let request_id = trimmed(report.request_id.as_deref());
    let status = trimmed(report.status.as_deref());
    let (Some(request_id), Some(status)) = (request_id, status) else {
        let mut errors = Vec::new();
        if trimmed(report.request_id.as_deref()).is_none() {
            errors.push("request_id must not be empty".to_string());
        }
        if trimmed(report.status.as_deref()).is_none() {
            errors.push("status must not be empty".to_string());
        }
        return ValidationErrorResponse::new(errors).into_response();
    };

    let Some(status) = OutcomeStatus::parse(&status) else {
        return MessageResponse::respond(StatusCode::BAD_REQUEST, "Unsupported status");
    };

    match state
        .store
        .update_status(&request_id, status.into(), report.result)
        .await
    {
        Ok(true) => {
            tracing::info!(request_id = %request_id, status = %status, "Result recorded");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => MessageResponse::respond(StatusCode::NOT_FOUND, "Request not found"),
        Err(e) => {
            tracing::error!("Failed to record result: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
