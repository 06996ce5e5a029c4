// OpenAI-compatible completion client
//
// Implements promptrun-core's CompletionClient over `POST {root}/v1/completions`.

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use promptrun_core::completion::{CompletionClient, CompletionOptions};
use promptrun_core::error::{AgentError, Result};

use crate::types::{completions_url, CompletionRequest, CompletionResponse};

/// Default model when none is configured
pub const DEFAULT_MODEL: &str = "llama3.2:latest";

/// Completion client for Ollama and other OpenAI-compatible servers
///
/// # Example
///
/// ```ignore
/// use promptrun_openai::OpenAiCompletionClient;
///
/// let client = OpenAiCompletionClient::new("llama3.2:latest");
/// // or against a hosted endpoint
/// let client = OpenAiCompletionClient::new("gpt-3.5-turbo-instruct").with_api_key("sk-...");
/// ```
#[derive(Clone)]
pub struct OpenAiCompletionClient {
    http: reqwest::Client,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompletionClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), model)
    }

    /// Share a connection pool with other outbound callers
    pub fn with_http_client(http: reqwest::Client, model: impl Into<String>) -> Self {
        Self {
            http,
            model: model.into(),
            api_key: None,
        }
    }

    /// Send `Authorization: Bearer <key>`; blank keys are ignored
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.trim().is_empty()).then_some(api_key);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    #[instrument(skip(self, prompt), fields(model = %self.model, max_tokens = options.max_tokens))]
    async fn complete(
        &self,
        backend_url: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Option<String>> {
        let url = completions_url(backend_url);
        let body = CompletionRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let mut request = self.http.post(&url).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::transport(format!("completion request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "completion backend rejected request");
            return Err(AgentError::backend(status.as_u16(), error_text));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AgentError::protocol(format!("invalid completion response: {e}")))?;

        let text = parsed.into_text();
        debug!(has_text = text.is_some(), "completion received");
        Ok(text)
    }
}

impl std::fmt::Debug for OpenAiCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompletionClient")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
