// Request record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use promptrun_core::request::OutcomeStatus;

/// Lifecycle of a request as seen by the control plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Accepted and waiting for the worker to report
    Queued,
    Completed,
    Failed,
    /// The event could not be delivered to the worker
    Error,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "queued" => Some(Self::Queued),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Reported by the worker; dispatch failures never overwrite these
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl From<OutcomeStatus> for RequestStatus {
    fn from(status: OutcomeStatus) -> Self {
        match status {
            OutcomeStatus::Completed => Self::Completed,
            OutcomeStatus::Failed => Self::Failed,
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked agent request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RequestRecord {
    #[schema(example = "01936f8a-7c3e-7b2a-9f4d-2e8c5a1b3d6f")]
    pub request_id: String,
    pub prompt: String,
    pub context: Option<String>,
    pub status: RequestStatus,
    /// Final answer, failure message or dispatch error
    pub result: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RequestRecord {
    /// New record in `queued` state
    pub fn queued(
        request_id: impl Into<String>,
        prompt: impl Into<String>,
        context: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            request_id: request_id.into(),
            prompt: prompt.into(),
            context,
            status: RequestStatus::Queued,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(RequestStatus::Queued).unwrap(),
            serde_json::json!("queued")
        );
        for status in [
            RequestStatus::Queued,
            RequestStatus::Completed,
            RequestStatus::Failed,
            RequestStatus::Error,
        ] {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RequestStatus::parse("done"), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(RequestStatus::Completed.is_terminal());
        assert!(RequestStatus::Failed.is_terminal());
        assert!(!RequestStatus::Queued.is_terminal());
        assert!(!RequestStatus::Error.is_terminal());
    }
}
