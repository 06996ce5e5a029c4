// Agent Request Workflow
//
// One run per inbound event:
//
//   received → reasoning → reasoning-succeeded → delivering → delivered
//                        ↘ reasoning-failed   ↗             ↘ delivery-failed
//
// - Reasoning is the memoized step (run_id, "agent-reasoning"); a redelivered
//   run replays its value instead of calling the model again
// - Delivery is not memoized and is attempted on every delivery of the run
// - A reasoning failure still reports a `failed` outcome, then re-raises the
//   reasoning error; a delivery failure re-raises without another report

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use promptrun_core::error::AgentError;
use promptrun_core::reasoning::ReasoningLoop;
use promptrun_core::request::{AgentOutcome, AgentRequest, OutcomeStatus};
use promptrun_durable::{StepExecutor, StoreError};

use crate::reporter::ResultReporter;

/// Step name of the memoized reasoning unit
pub const REASONING_STEP: &str = "agent-reasoning";

// ============================================================================
// Run phases
// ============================================================================

/// Where a run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunPhase {
    Received,
    Reasoning,
    ReasoningSucceeded,
    ReasoningFailed,
    Delivering,
    Delivered,
    DeliveryFailed,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::DeliveryFailed)
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Reasoning => "reasoning",
            Self::ReasoningSucceeded => "reasoning-succeeded",
            Self::ReasoningFailed => "reasoning-failed",
            Self::Delivering => "delivering",
            Self::Delivered => "delivered",
            Self::DeliveryFailed => "delivery-failed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Why a run failed
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("step store error: {0}")]
    Store(#[from] StoreError),
}

impl WorkflowError {
    /// The outcome could not be handed to the collector
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Agent(err) if err.is_delivery())
    }

    /// The event itself was unusable; redelivery will not help
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::Agent(AgentError::InvalidRequest(_)))
    }
}

// ============================================================================
// Workflow
// ============================================================================

/// Summary of a run that reached `delivered`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub request_id: String,
    pub run_id: String,
    pub status: OutcomeStatus,
}

/// Processes agent requests: memoized reasoning, then result delivery
#[derive(Clone)]
pub struct AgentRequestWorkflow {
    reasoning: ReasoningLoop,
    steps: StepExecutor,
    reporter: Arc<dyn ResultReporter>,
}

impl AgentRequestWorkflow {
    pub fn new(reasoning: ReasoningLoop, steps: StepExecutor, reporter: Arc<dyn ResultReporter>) -> Self {
        Self {
            reasoning,
            steps,
            reporter,
        }
    }

    /// Execute (or resume) run `run_id` for `request`
    #[instrument(skip(self, request), fields(request_id = %request.request_id, run_id = %run_id))]
    pub async fn run(&self, run_id: &str, request: &AgentRequest) -> Result<RunSummary, WorkflowError> {
        let mut phase = RunPhase::Received;
        debug!(%phase, "run received");
        request.validate()?;

        phase = self.advance(phase, RunPhase::Reasoning);
        let reasoned = self
            .steps
            .run(run_id, REASONING_STEP, || async {
                self.reasoning.run(request).await.map_err(WorkflowError::from)
            })
            .await;

        let answer = match reasoned {
            Ok(answer) => {
                phase = self.advance(phase, RunPhase::ReasoningSucceeded);
                answer
            }
            Err(err) => {
                phase = self.advance(phase, RunPhase::ReasoningFailed);
                error!(error = %err, "reasoning failed");
                self.report_failure(phase, request, &err).await;
                return Err(err);
            }
        };

        phase = self.advance(phase, RunPhase::Delivering);
        let outcome = AgentOutcome::completed(&request.request_id, answer);
        if let Err(err) = self.reporter.report(&outcome).await {
            self.advance(phase, RunPhase::DeliveryFailed);
            error!(error = %err, "outcome delivery failed");
            return Err(err.into());
        }
        self.advance(phase, RunPhase::Delivered);

        Ok(RunSummary {
            request_id: request.request_id.clone(),
            run_id: run_id.to_string(),
            status: OutcomeStatus::Completed,
        })
    }

    /// Best-effort `failed` report; its own failure is logged, not raised
    async fn report_failure(&self, phase: RunPhase, request: &AgentRequest, cause: &WorkflowError) {
        let phase = self.advance(phase, RunPhase::Delivering);
        let outcome = AgentOutcome::failed(&request.request_id, cause.to_string());
        match self.reporter.report(&outcome).await {
            Ok(()) => {
                self.advance(phase, RunPhase::Delivered);
            }
            Err(err) => {
                self.advance(phase, RunPhase::DeliveryFailed);
                warn!(error = %err, "could not report failed outcome");
            }
        }
    }

    fn advance(&self, from: RunPhase, to: RunPhase) -> RunPhase {
        if to.is_terminal() {
            info!(%from, %to, "run finished");
        } else {
            debug!(%from, %to, "run phase");
        }
        to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::RecordingReporter;
    use promptrun_core::memory::{MockCompletion, MockCompletionClient, StaticCapability};
    use promptrun_core::tools::{ToolName, ToolRegistry};
    use promptrun_durable::InMemoryStepStore;

    struct Harness {
        workflow: AgentRequestWorkflow,
        client: Arc<MockCompletionClient>,
        reporter: RecordingReporter,
        store: Arc<InMemoryStepStore>,
    }

    fn harness(responses: Vec<MockCompletion>) -> Harness {
        let client = Arc::new(MockCompletionClient::with_responses(responses));
        let tools = ToolRegistry::builder()
            .tool(ToolName::GetCurrentDate, StaticCapability::new("2025-06-01"))
            .build();
        let store = Arc::new(InMemoryStepStore::new());
        let reporter = RecordingReporter::new();
        let workflow = AgentRequestWorkflow::new(
            ReasoningLoop::new(client.clone(), tools, "http://ollama:11434/v1"),
            StepExecutor::new(store.clone()),
            Arc::new(reporter.clone()),
        );
        Harness {
            workflow,
            client,
            reporter,
            store,
        }
    }

    #[tokio::test]
    async fn test_completed_run_reports_answer() {
        let h = harness(vec![MockCompletion::text("Hello there")]);

        let summary = h
            .workflow
            .run("req-1", &AgentRequest::new("req-1", "Hi"))
            .await
            .unwrap();

        assert_eq!(summary.status, OutcomeStatus::Completed);
        assert_eq!(
            h.reporter.outcomes(),
            vec![AgentOutcome::completed("req-1", "Hello there")]
        );
    }

    #[tokio::test]
    async fn test_replay_reuses_memo_and_reports_again() {
        let h = harness(vec![MockCompletion::text("Memoized answer")]);
        let request = AgentRequest::new("req-1", "Hi");

        h.workflow.run("req-1", &request).await.unwrap();
        h.workflow.run("req-1", &request).await.unwrap();

        assert_eq!(h.client.call_count(), 1);
        let outcomes = h.reporter.outcomes();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes
            .iter()
            .all(|o| o.result == "Memoized answer" && o.status == OutcomeStatus::Completed));
    }

    #[tokio::test]
    async fn test_reasoning_failure_reports_failed_and_reraises() {
        let h = harness(vec![MockCompletion::failure(AgentError::backend(500, "down"))]);

        let err = h
            .workflow
            .run("req-1", &AgentRequest::new("req-1", "Hi"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Agent(AgentError::Backend { status: 500, .. })
        ));
        let outcomes = h.reporter.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, OutcomeStatus::Failed);
        assert_eq!(outcomes[0].result, "completion backend returned 500: down");
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_failed_run_retries_reasoning_on_redelivery() {
        let h = harness(vec![
            MockCompletion::failure(AgentError::transport("reset")),
            MockCompletion::text("Recovered"),
        ]);
        let request = AgentRequest::new("req-1", "Hi");

        assert!(h.workflow.run("req-1", &request).await.is_err());
        h.workflow.run("req-1", &request).await.unwrap();

        assert_eq!(h.client.call_count(), 2);
        assert_eq!(h.reporter.outcomes().last().unwrap().result, "Recovered");
    }

    #[tokio::test]
    async fn test_delivery_failure_propagates_without_second_report() {
        let h = harness(vec![MockCompletion::text("Answer")]);
        h.reporter.reject_with(503);

        let err = h
            .workflow
            .run("req-1", &AgentRequest::new("req-1", "Hi"))
            .await
            .unwrap_err();

        assert!(err.is_delivery());
        let outcomes = h.reporter.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, OutcomeStatus::Completed);
    }

    #[tokio::test]
    async fn test_failure_report_rejection_keeps_reasoning_error() {
        let h = harness(vec![MockCompletion::failure(AgentError::backend(502, "bad gateway"))]);
        h.reporter.reject_with(500);

        let err = h
            .workflow
            .run("req-1", &AgentRequest::new("req-1", "Hi"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Agent(AgentError::Backend { status: 502, .. })
        ));
        assert_eq!(h.reporter.outcomes().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_request_does_nothing() {
        let h = harness(vec![]);

        let err = h
            .workflow
            .run("req-1", &AgentRequest::new("req-1", "  "))
            .await
            .unwrap_err();

        assert!(err.is_invalid_request());
        assert_eq!(h.client.call_count(), 0);
        assert!(h.reporter.outcomes().is_empty());
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(RunPhase::ReasoningFailed.to_string(), "reasoning-failed");
        assert_eq!(
            serde_json::to_value(RunPhase::DeliveryFailed).unwrap(),
            serde_json::json!("delivery-failed")
        );
        assert!(RunPhase::Delivered.is_terminal());
        assert!(!RunPhase::Delivering.is_terminal());
    }
}
