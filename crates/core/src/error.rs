// Error types for request processing

use thiserror::Error;

/// Result type alias for request-processing operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that can terminate a run.
///
/// Capability failures never show up here: tools fold their own failures
/// into the text they return.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Completion backend answered with a non-success status
    #[error("completion backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    /// Network failure reaching an outbound dependency
    #[error("transport error: {0}")]
    Transport(String),

    /// Result collector did not acknowledge the outcome
    #[error("failed to post result: {status} {body}")]
    Delivery { status: u16, body: String },

    /// Backend answered 2xx but the payload could not be decoded
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Request failed validation before any work started
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AgentError {
    /// Create a backend error from an HTTP status and response body
    pub fn backend(status: u16, body: impl Into<String>) -> Self {
        AgentError::Backend {
            status,
            body: body.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        AgentError::Transport(msg.into())
    }

    /// Create a delivery error from an HTTP status and response body
    pub fn delivery(status: u16, body: impl Into<String>) -> Self {
        AgentError::Delivery {
            status,
            body: body.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        AgentError::Protocol(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        AgentError::InvalidRequest(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AgentError::Configuration(msg.into())
    }

    /// Short machine-readable kind, used in logs and trigger responses
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Backend { .. } => "backend",
            AgentError::Transport(_) => "transport",
            AgentError::Delivery { .. } => "delivery",
            AgentError::Protocol(_) => "protocol",
            AgentError::InvalidRequest(_) => "invalid_request",
            AgentError::Configuration(_) => "configuration",
        }
    }

    /// Whether this error came from the result collector
    pub fn is_delivery(&self) -> bool {
        matches!(self, AgentError::Delivery { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_message_carries_status_and_body() {
        let err = AgentError::backend(503, "model loading");
        assert_eq!(
            err.to_string(),
            "completion backend returned 503: model loading"
        );
        assert_eq!(err.kind(), "backend");
    }

    #[test]
    fn test_delivery_error() {
        let err = AgentError::delivery(401, "Unauthorized");
        assert!(err.is_delivery());
        assert_eq!(err.to_string(), "failed to post result: 401 Unauthorized");
        assert!(!AgentError::transport("refused").is_delivery());
    }
}
