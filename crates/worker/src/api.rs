// Worker HTTP routes
//
// POST /api/events  - run the workflow for one (possibly redelivered) event
// GET  /healthz     - liveness
//
// The trigger runs the workflow to completion before answering. A non-2xx
// answer tells the orchestrator the run failed and may be redelivered.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use promptrun_core::request::{AgentRequestEvent, OutcomeStatus};

use crate::signature::{EventSigner, SIGNATURE_HEADER};
use crate::workflow::AgentRequestWorkflow;

/// App state for worker routes
#[derive(Clone)]
pub struct WorkerState {
    pub workflow: Arc<AgentRequestWorkflow>,
    /// `None` accepts unsigned events
    pub signer: Option<EventSigner>,
}

impl WorkerState {
    pub fn new(workflow: AgentRequestWorkflow) -> Self {
        Self {
            workflow: Arc::new(workflow),
            signer: None,
        }
    }

    pub fn with_signer(mut self, signer: EventSigner) -> Self {
        self.signer = Some(signer);
        self
    }
}

/// Successful run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TriggerResponse {
    pub request_id: String,
    pub status: OutcomeStatus,
}

/// Failed run; the orchestrator may redeliver
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TriggerFailure {
    pub request_id: String,
    pub error: String,
}

/// Rejected before any run started
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    fn respond(status: StatusCode, error: impl Into<String>) -> Response {
        (
            status,
            Json(Self {
                error: error.into(),
            }),
        )
            .into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Worker router, traced
pub fn router(state: WorkerState) -> Router {
    Router::new()
        .route("/api/events", post(handle_event))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /api/events - Run the agent request workflow
async fn handle_event(State(state): State<WorkerState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(signer) = &state.signer {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok());
        if let Err(err) = signer.verify(&body, header) {
            warn!(error = %err, "rejecting unsigned or mis-signed event");
            return ErrorResponse::respond(StatusCode::UNAUTHORIZED, err.to_string());
        }
    }

    let event: AgentRequestEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => {
            warn!(error = %err, "malformed event");
            return ErrorResponse::respond(StatusCode::BAD_REQUEST, format!("malformed event: {err}"));
        }
    };
    if let Err(err) = event.validate() {
        warn!(error = %err, "invalid event");
        return ErrorResponse::respond(StatusCode::BAD_REQUEST, err.to_string());
    }

    let run_id = event.run_id().to_string();
    info!(request_id = %event.data.request_id, run_id = %run_id, "event received");

    match state.workflow.run(&run_id, &event.data).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(TriggerResponse {
                request_id: summary.request_id,
                status: summary.status,
            }),
        )
            .into_response(),
        Err(err) => {
            error!(request_id = %event.data.request_id, error = %err, "run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(TriggerFailure {
                    request_id: event.data.request_id.clone(),
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}
