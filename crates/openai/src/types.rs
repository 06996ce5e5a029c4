// OpenAI Protocol Types
//
// Wire format of the legacy text completions endpoint (`/v1/completions`),
// which Ollama and most OpenAI-compatible servers expose.

use serde::{Deserialize, Serialize};

/// Request body for `POST /v1/completions`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Response body; only the generated text is read
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub text: Option<String>,
}

impl CompletionResponse {
    /// Text of the first choice, if the backend produced one
    pub fn into_text(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|choice| choice.text)
    }
}

/// Endpoint for a backend URL in OpenAI `.../v1` form.
///
/// Trailing slashes and one trailing `/v1` segment are removed before
/// `/v1/completions` is appended, so both `http://host:11434/v1` and
/// `http://host:11434` resolve to `http://host:11434/v1/completions`.
pub fn completions_url(backend_url: &str) -> String {
    let trimmed = backend_url.trim().trim_end_matches('/');
    let root = trimmed.strip_suffix("/v1").unwrap_or(trimmed);
    format!("{root}/v1/completions")
}
