// Control plane configuration
//
// Resolved from environment variables, blank values counting as unset.

use std::time::Duration;

use anyhow::{anyhow, Result};

pub const DEFAULT_API_PORT: u16 = 5000;
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_RESULT_TOKEN: &str = "dev-token";
pub const DEFAULT_WORKER_EVENTS_URL: &str = "http://127.0.0.1:3000/api/events";
pub const DEFAULT_DISPATCH_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_DISPATCH_CONCURRENCY: usize = 32;
pub const DEFAULT_DISPATCH_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPlaneConfig {
    pub port: u16,
    /// Forwarded to the worker in every event as `ollama_base_url`
    pub backend_url: String,
    /// Bearer token the worker presents when reporting results
    pub result_token: String,
    pub worker_events_url: String,
    /// HMAC key for outbound events; `None` sends them unsigned
    pub event_signing_key: Option<String>,
    pub database_url: Option<String>,
    pub dispatch_max_attempts: u32,
    /// Deliveries in flight at once
    pub dispatch_concurrency: usize,
    /// Per-attempt limit on a worker call, which spans the whole run
    pub dispatch_timeout: Duration,
}

impl ControlPlaneConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match get("API_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| anyhow!("API_PORT must be a port number, got {raw:?}"))?,
            None => DEFAULT_API_PORT,
        };

        let positive = |key: &str, default: u64| -> Result<u64> {
            match get(key) {
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(n) if n > 0 => Ok(n),
                    _ => Err(anyhow!("{key} must be a positive integer, got {raw:?}")),
                },
                None => Ok(default),
            }
        };

        let dispatch_max_attempts =
            u32::try_from(positive("DISPATCH_MAX_ATTEMPTS", DEFAULT_DISPATCH_MAX_ATTEMPTS.into())?)
                .map_err(|_| anyhow!("DISPATCH_MAX_ATTEMPTS is too large"))?;
        let dispatch_concurrency = usize::try_from(positive(
            "DISPATCH_CONCURRENCY",
            DEFAULT_DISPATCH_CONCURRENCY as u64,
        )?)
        .map_err(|_| anyhow!("DISPATCH_CONCURRENCY is too large"))?;
        let dispatch_timeout = Duration::from_secs(positive(
            "DISPATCH_TIMEOUT_SECS",
            DEFAULT_DISPATCH_TIMEOUT_SECS,
        )?);

        Ok(Self {
            port,
            backend_url: get("OLLAMA_BASE_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            result_token: get("AGENT_RESULT_TOKEN")
                .unwrap_or_else(|| DEFAULT_RESULT_TOKEN.to_string()),
            worker_events_url: get("WORKER_EVENTS_URL")
                .unwrap_or_else(|| DEFAULT_WORKER_EVENTS_URL.to_string()),
            event_signing_key: get("EVENT_SIGNING_KEY"),
            database_url: get("DATABASE_URL"),
            dispatch_max_attempts,
            dispatch_concurrency,
            dispatch_timeout,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
