// Common DTOs for the public API

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Plain message body used for errors and service banners.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Request not found")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Convert to axum response with the given status
    pub fn respond(status: StatusCode, message: impl Into<String>) -> Response {
        (status, Json(Self::new(message))).into_response()
    }
}

/// Rejected request payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorResponse {
    #[schema(example = "Invalid request payload")]
    pub message: String,
    /// One entry per problem found.
    #[schema(example = json!(["prompt must not be empty"]))]
    pub errors: Vec<String>,
}

impl ValidationErrorResponse {
    pub fn new(errors: Vec<String>) -> Self {
        Self {
            message: "Invalid request payload".to_string(),
            errors,
        }
    }
}

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}
