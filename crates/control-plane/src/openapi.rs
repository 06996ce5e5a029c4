// OpenAPI specification generation
//
// Served at /api-doc/openapi.json and exported by the export-openapi binary.

use crate::api;
use crate::storage::{RequestRecord, RequestStatus};
use utoipa::OpenApi;

/// OpenAPI documentation for the Promptrun API
#[derive(OpenApi)]
#[openapi(
    paths(
        api::requests::create_request,
        api::requests::get_request,
        api::collector::report_result,
    ),
    components(
        schemas(
            RequestRecord, RequestStatus,
            api::requests::CreateRequest,
            api::requests::CreateRequestResponse,
            api::requests::QueueFailureResponse,
            api::collector::ResultReport,
            api::common::MessageResponse,
            api::common::ValidationErrorResponse,
        )
    ),
    tags(
        (name = "agent", description = "Agent request intake and status"),
        (name = "internal", description = "Endpoints called by the worker")
    ),
    info(
        title = "Promptrun API",
        version = "0.1.0",
        description = "Queue prompts for the reasoning agent and collect their results",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI spec as a pretty-printed JSON string
    pub fn to_json() -> Result<String, serde_json::Error> {
        Self::openapi().to_pretty_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_routes() {
        let json: serde_json::Value = serde_json::from_str(&ApiDoc::to_json().unwrap()).unwrap();
        let paths = json["paths"].as_object().unwrap();

        assert!(paths.contains_key("/api/agent"));
        assert!(paths.contains_key("/api/agent/{request_id}"));
        assert!(paths.contains_key("/internal/agent-result"));
    }
}
