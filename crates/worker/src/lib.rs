// Request-processing worker
//
// Receives agent request events, runs the memoized reasoning step and
// delivers the outcome to the result collector.

pub mod api;
pub mod config;
pub mod reporter;
pub mod signature;
pub mod workflow;

// Re-export main types
pub use api::{router, WorkerState};
pub use config::WorkerConfig;
pub use reporter::{RecordingReporter, ResultReporter, WebhookReporter};
pub use signature::{EventSigner, SignatureError, SIGNATURE_HEADER};
pub use workflow::{AgentRequestWorkflow, RunPhase, RunSummary, WorkflowError, REASONING_STEP};
