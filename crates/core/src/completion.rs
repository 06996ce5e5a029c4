// Completion client abstraction
//
// The reasoning loop talks to the language model only through this trait.
// Implementations live in provider crates (promptrun-openai); tests use
// MockCompletionClient from the memory module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sampling options for one completion call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionOptions {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

/// Issues prompt completions against a language-model backend.
///
/// Returns `Ok(None)` when the backend answered successfully but produced no
/// choices; the caller decides what that means. Non-success statuses are
/// `AgentError::Backend`, connection failures `AgentError::Transport`.
/// Implementations must not retry.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        backend_url: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Option<String>>;
}

#[async_trait]
impl<T: CompletionClient + ?Sized> CompletionClient for std::sync::Arc<T> {
    async fn complete(
        &self,
        backend_url: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Option<String>> {
        (**self).complete(backend_url, prompt, options).await
    }
}
