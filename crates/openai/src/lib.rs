// OpenAI-Compatible Completion Client
//
// This crate provides the production CompletionClient for promptrun.
// It speaks the text completions protocol (`/v1/completions`) that Ollama
// and hosted OpenAI-compatible servers expose.

mod client;
mod types;

#[cfg(test)]
mod tests;

pub use client::{OpenAiCompletionClient, DEFAULT_MODEL};
pub use types::{completions_url, CompletionChoice, CompletionRequest, CompletionResponse};

// Re-export core types for convenience
pub use promptrun_core::completion::{CompletionClient, CompletionOptions};
