// Worker configuration
//
// Resolved from environment variables. `from_lookup` takes any lookup
// function so tests can supply values without touching the process env.

use promptrun_core::capabilities::{ProviderEndpoints, DEFAULT_SEARCH_API_URL, DEFAULT_TIME_API_URL};
use promptrun_core::error::{AgentError, Result};
use promptrun_openai::DEFAULT_MODEL;

pub const DEFAULT_APP_ID: &str = "promptrun-worker";
pub const DEFAULT_WORKER_PORT: u16 = 3000;
pub const DEFAULT_BACKEND_URL: &str = "http://ollama.ollama.svc.cluster.local:11434/v1";
pub const DEFAULT_RESULT_TOKEN: &str = "dev-token";
const DEFAULT_API_PORT: &str = "5000";

/// Configuration for the worker process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Application identifier used in logs
    pub app_id: String,
    pub port: u16,
    /// Completion backend when a request carries no override
    pub backend_url: String,
    pub model: String,
    pub backend_api_key: Option<String>,
    /// Result collector endpoint
    pub result_webhook: String,
    pub result_token: String,
    /// HMAC key for inbound events; `None` disables the check
    pub event_signing_key: Option<String>,
    /// Step store database; `None` keeps memos in memory
    pub database_url: Option<String>,
    pub providers: ProviderEndpoints,
}

impl WorkerConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match get("WORKER_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                AgentError::config(format!("WORKER_PORT must be a port number, got {raw:?}"))
            })?,
            None => DEFAULT_WORKER_PORT,
        };

        let result_webhook = get("AGENT_RESULT_WEBHOOK").unwrap_or_else(|| {
            let api_port = get("API_PORT").unwrap_or_else(|| DEFAULT_API_PORT.to_string());
            format!("http://127.0.0.1:{api_port}/internal/agent-result")
        });

        Ok(Self {
            app_id: get("APP_ID").unwrap_or_else(|| DEFAULT_APP_ID.to_string()),
            port,
            backend_url: get("OLLAMA_BASE_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            model: get("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            backend_api_key: get("OLLAMA_API_KEY"),
            result_webhook,
            result_token: get("AGENT_RESULT_TOKEN")
                .unwrap_or_else(|| DEFAULT_RESULT_TOKEN.to_string()),
            event_signing_key: get("EVENT_SIGNING_KEY"),
            database_url: get("DATABASE_URL"),
            providers: ProviderEndpoints {
                search_api_url: get("SEARCH_API_URL")
                    .unwrap_or_else(|| DEFAULT_SEARCH_API_URL.to_string()),
                time_api_url: get("TIME_API_URL")
                    .unwrap_or_else(|| DEFAULT_TIME_API_URL.to_string()),
            },
        })
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
