// HTTP API routes
//
// Each submodule handles one concern with its own AppState; `router`
// assembles them with the service banner, health and OpenAPI routes.

pub mod collector;
pub mod common;
pub mod requests;
pub mod validation;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub use common::{MessageResponse, ValidationErrorResponse};

use crate::dispatch::EventQueue;
use crate::openapi::ApiDoc;
use crate::storage::RequestStore;

/// Everything the public router needs
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn RequestStore>,
    pub queue: EventQueue,
    pub backend_url: String,
    pub result_token: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Build the full control plane router, traced
pub fn router(ctx: ApiContext) -> Router {
    let requests_state = requests::AppState::new(ctx.store.clone(), ctx.queue, ctx.backend_url);
    let collector_state = collector::AppState::new(ctx.store, ctx.result_token);

    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/api-doc/openapi.json", get(openapi_json))
        .merge(requests::routes(requests_state))
        .merge(collector::routes(collector_state))
        .layer(TraceLayer::new_for_http())
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("LLM Agent service is running"))
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
