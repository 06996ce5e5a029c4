//! Request and outcome types shared by the worker and the control plane

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Name of the event that triggers a run
pub const AGENT_REQUEST_EVENT: &str = "app/agent.request";

/// One inbound unit of work.
///
/// Immutable once received; identifies exactly one workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentRequest {
    pub request_id: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Per-request completion backend, in OpenAI-compatible `.../v1` form
    #[serde(
        default,
        rename = "ollama_base_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub backend_override: Option<String>,
}

impl AgentRequest {
    pub fn new(request_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            prompt: prompt.into(),
            context: None,
            backend_override: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_backend(mut self, backend_url: impl Into<String>) -> Self {
        self.backend_override = Some(backend_url.into());
        self
    }

    /// Reject requests that cannot start a run
    pub fn validate(&self) -> Result<()> {
        if self.request_id.trim().is_empty() {
            return Err(AgentError::invalid_request("request_id must not be empty"));
        }
        if self.prompt.trim().is_empty() {
            return Err(AgentError::invalid_request("prompt must not be empty"));
        }
        Ok(())
    }

    /// Backend to use for this request, falling back to the configured default
    pub fn backend_url<'a>(&'a self, default: &'a str) -> &'a str {
        self.backend_override
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(default)
    }
}

/// Terminal status of a run as seen by the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Completed,
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse a collector status, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What gets delivered to the collector, exactly once per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentOutcome {
    pub request_id: String,
    pub status: OutcomeStatus,
    pub result: String,
}

impl AgentOutcome {
    pub fn completed(request_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            status: OutcomeStatus::Completed,
            result: result.into(),
        }
    }

    pub fn failed(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            status: OutcomeStatus::Failed,
            result: message.into(),
        }
    }
}

/// Envelope carrying an AgentRequest to the worker.
///
/// The run id is `id` when the sender supplied one, otherwise the request id.
/// Redeliveries reuse the same run id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRequestEvent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub data: AgentRequest,
}

impl AgentRequestEvent {
    pub fn new(request: AgentRequest) -> Self {
        Self {
            name: AGENT_REQUEST_EVENT.to_string(),
            id: None,
            data: request,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn run_id(&self) -> &str {
        self.id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(&self.data.request_id)
    }

    /// Reject events this worker does not handle
    pub fn validate(&self) -> Result<()> {
        if self.name != AGENT_REQUEST_EVENT {
            return Err(AgentError::invalid_request(format!(
                "unsupported event: {}",
                self.name
            )));
        }
        self.data.validate()
    }
}
