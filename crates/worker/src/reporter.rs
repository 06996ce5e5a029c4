// Result Reporter
//
// Delivers a run's terminal outcome to the result collector. Delivery is not
// buffered or retried here: a rejected report fails the run, and the
// orchestrator's redelivery is the recovery path.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use promptrun_core::error::{AgentError, Result};
use promptrun_core::request::AgentOutcome;

/// Sink for terminal outcomes
#[async_trait]
pub trait ResultReporter: Send + Sync {
    async fn report(&self, outcome: &AgentOutcome) -> Result<()>;
}

// ============================================================================
// WebhookReporter - POSTs outcomes with a bearer token
// ============================================================================

pub struct WebhookReporter {
    http: reqwest::Client,
    webhook_url: String,
    token: String,
}

impl WebhookReporter {
    pub fn new(http: reqwest::Client, webhook_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            webhook_url: webhook_url.into(),
            token: token.into(),
        }
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }
}

#[async_trait]
impl ResultReporter for WebhookReporter {
    #[instrument(skip(self, outcome), fields(request_id = %outcome.request_id, status = %outcome.status))]
    async fn report(&self, outcome: &AgentOutcome) -> Result<()> {
        let response = self
            .http
            .post(&self.webhook_url)
            .bearer_auth(&self.token)
            .json(outcome)
            .send()
            .await
            .map_err(|e| AgentError::transport(format!("failed to post result: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "collector rejected outcome");
            return Err(AgentError::delivery(status.as_u16(), body));
        }

        info!("outcome delivered");
        Ok(())
    }
}

impl std::fmt::Debug for WebhookReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookReporter")
            .field("webhook_url", &self.webhook_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// RecordingReporter - In-memory reporter for tests
// ============================================================================

/// Records every outcome it is given. Can be told to reject deliveries.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    outcomes: Arc<Mutex<Vec<AgentOutcome>>>,
    reject_with: Arc<Mutex<Option<u16>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject all further deliveries with the given status
    pub fn reject_with(&self, status: u16) {
        *self.reject_with.lock() = Some(status);
    }

    pub fn accept_all(&self) {
        *self.reject_with.lock() = None;
    }

    /// Every outcome offered, accepted or not
    pub fn outcomes(&self) -> Vec<AgentOutcome> {
        self.outcomes.lock().clone()
    }
}

#[async_trait]
impl ResultReporter for RecordingReporter {
    async fn report(&self, outcome: &AgentOutcome) -> Result<()> {
        self.outcomes.lock().push(outcome.clone());
        match *self.reject_with.lock() {
            Some(status) => Err(AgentError::delivery(status, "rejected by recording reporter")),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reporter_for(server: &MockServer) -> WebhookReporter {
        WebhookReporter::new(
            reqwest::Client::new(),
            format!("{}/internal/agent-result", server.uri()),
            "dev-token",
        )
    }

    #[tokio::test]
    async fn test_posts_outcome_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/internal/agent-result"))
            .and(header("authorization", "Bearer dev-token"))
            .and(body_json(json!({
                "request_id": "req-1",
                "status": "completed",
                "result": "Paris"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        reporter_for(&server)
            .report(&AgentOutcome::completed("req-1", "Paris"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejection_is_delivery_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let err = reporter_for(&server)
            .report(&AgentOutcome::failed("req-1", "boom"))
            .await
            .unwrap_err();

        assert!(err.is_delivery());
        assert_eq!(err.to_string(), "failed to post result: 401 Unauthorized");
    }

    #[tokio::test]
    async fn test_unreachable_collector_is_transport_error() {
        let reporter = WebhookReporter::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/internal/agent-result",
            "dev-token",
        );

        let err = reporter
            .report(&AgentOutcome::completed("req-1", "x"))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Transport(_)));
    }

    #[tokio::test]
    async fn test_recording_reporter() {
        let reporter = RecordingReporter::new();
        reporter
            .report(&AgentOutcome::completed("req-1", "ok"))
            .await
            .unwrap();

        reporter.reject_with(500);
        assert!(reporter
            .report(&AgentOutcome::completed("req-2", "ok"))
            .await
            .is_err());

        assert_eq!(reporter.outcomes().len(), 2);
    }
}
