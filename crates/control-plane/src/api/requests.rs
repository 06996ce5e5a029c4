// Agent request intake and status routes

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use promptrun_core::request::{AgentRequest, AgentRequestEvent};

use super::common::{MessageResponse, ValidationErrorResponse};
use super::validation::validate_intake;
use crate::dispatch::EventQueue;
use crate::storage::{RequestRecord, RequestStatus, RequestStore};

/// Submit a prompt for the agent
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRequest {
    /// Question or instruction for the agent. Trimmed; must not be empty.
    #[schema(example = "What's the weather like in Paris today?")]
    #[serde(default)]
    pub prompt: Option<String>,
    /// Extra information appended to the prompt. Blank is treated as absent.
    #[serde(default)]
    pub context: Option<String>,
}

/// Accepted request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateRequestResponse {
    pub request_id: String,
    #[schema(example = "queued")]
    pub status: RequestStatus,
}

/// Request stored but could not be queued
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueueFailureResponse {
    #[schema(example = "Failed to queue agent request")]
    pub message: String,
    pub request_id: String,
}

/// App state for request routes
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RequestStore>,
    pub queue: EventQueue,
    /// Forwarded to the worker as the request's completion backend
    pub backend_url: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RequestStore>,
        queue: EventQueue,
        backend_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            queue,
            backend_url: backend_url.into(),
        }
    }
}

/// Create request routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/agent", post(create_request))
        .route("/api/agent/:request_id", get(get_request))
        .with_state(state)
}

/// POST /api/agent - Queue a prompt for the agent
#[utoipa::path(
    post,
    path = "/api/agent",
    request_body = CreateRequest,
    responses(
        (status = 202, description = "Request queued", body = CreateRequestResponse),
        (status = 400, description = "Invalid request payload", body = ValidationErrorResponse),
        (status = 500, description = "Request could not be queued", body = QueueFailureResponse)
    ),
    tag = "agent"
)]
pub async fn create_request(
    State(state): State<AppState>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => {
            return ValidationErrorResponse::new(vec![rejection.body_text()]).into_response()
        }
    };
    let (prompt, context) = match validate_intake(req.prompt.as_deref(), req.context.as_deref()) {
        Ok(fields) => fields,
        Err(errors) => return ValidationErrorResponse::new(errors).into_response(),
    };

    let request_id = Uuid::now_v7().to_string();
    let record = RequestRecord::queued(&request_id, &prompt, context.clone());
    if let Err(e) = state.store.insert(record).await {
        tracing::error!("Failed to store agent request: {}", e);
        return MessageResponse::respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to store agent request",
        );
    }

    let mut request = AgentRequest::new(&request_id, prompt).with_backend(&state.backend_url);
    request.context = context;
    let event = AgentRequestEvent::new(request).with_id(&request_id);

    if let Err(e) = state.queue.enqueue(event) {
        tracing::error!(request_id = %request_id, "Failed to queue agent request: {}", e);
        if let Err(store_err) = state
            .store
            .update_status(&request_id, RequestStatus::Error, Some(e.to_string()))
            .await
        {
            tracing::error!("Failed to record queue failure: {}", store_err);
        }
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(QueueFailureResponse {
                message: "Failed to queue agent request".to_string(),
                request_id,
            }),
        )
            .into_response();
    }

    tracing::info!(request_id = %request_id, "Agent request queued");
    (
        StatusCode::ACCEPTED,
        Json(CreateRequestResponse {
            request_id,
            status: RequestStatus::Queued,
        }),
    )
        .into_response()
}

/// GET /api/agent/{request_id} - Get a request and its result
#[utoipa::path(
    get,
    path = "/api/agent/{request_id}",
    params(
        ("request_id" = String, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request found", body = RequestRecord),
        (status = 404, description = "Request not found", body = MessageResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "agent"
)]
pub async fn get_request(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Response {
    match state.store.get(&request_id).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => MessageResponse::respond(StatusCode::NOT_FOUND, "Request not found"),
        Err(e) => {
            tracing::error!("Failed to get agent request: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
