// In-memory implementations for testing
//
// Scripted stand-ins for the two outbound seams of the reasoning loop:
// - MockCompletionClient replays queued completions and records every call
// - StaticCapability answers every invocation with fixed text

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::completion::{CompletionClient, CompletionOptions};
use crate::error::{AgentError, Result};
use crate::tools::Capability;

// ============================================================================
// MockCompletionClient - Returns predefined completions
// ============================================================================

/// One scripted completion outcome
#[derive(Debug)]
pub struct MockCompletion(Result<Option<String>>);

impl MockCompletion {
    /// Backend produced a choice with this text
    pub fn text(text: impl Into<String>) -> Self {
        Self(Ok(Some(text.into())))
    }

    /// Backend answered but produced no choices
    pub fn empty() -> Self {
        Self(Ok(None))
    }

    /// Backend call failed
    pub fn failure(error: AgentError) -> Self {
        Self(Err(error))
    }
}

/// A completion call as the client saw it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCompletion {
    pub backend_url: String,
    pub prompt: String,
    pub options: CompletionOptions,
}

/// Mock completion client for testing
///
/// Returns queued completions in order. Once the queue is drained every call
/// gets a fixed placeholder text.
#[derive(Debug, Default, Clone)]
pub struct MockCompletionClient {
    responses: Arc<Mutex<VecDeque<MockCompletion>>>,
    call_log: Arc<Mutex<Vec<RecordedCompletion>>>,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<MockCompletion>) -> Self {
        let client = Self::new();
        client.responses.lock().extend(responses);
        client
    }

    /// Add a completion to the queue
    pub fn push(&self, response: MockCompletion) {
        self.responses.lock().push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedCompletion> {
        self.call_log.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.call_log.lock().len()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(
        &self,
        backend_url: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Option<String>> {
        self.call_log.lock().push(RecordedCompletion {
            backend_url: backend_url.to_string(),
            prompt: prompt.to_string(),
            options: *options,
        });

        match self.responses.lock().pop_front() {
            Some(MockCompletion(outcome)) => outcome,
            None => Ok(Some(
                "Mock response (no more responses configured)".to_string(),
            )),
        }
    }
}

// ============================================================================
// StaticCapability - Fixed-text tool
// ============================================================================

/// Capability that always returns the same text and records its arguments
#[derive(Debug, Clone)]
pub struct StaticCapability {
    output: String,
    description: String,
    arguments: Arc<Mutex<Vec<String>>>,
}

impl StaticCapability {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            description: "Static test capability".to_string(),
            arguments: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Arguments received so far, oldest first
    pub fn arguments(&self) -> Vec<String> {
        self.arguments.lock().clone()
    }
}

#[async_trait]
impl Capability for StaticCapability {
    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, argument: &str) -> String {
        self.arguments.lock().push(argument.to_string());
        self.output.clone()
    }
}
