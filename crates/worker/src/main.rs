use std::sync::Arc;

use anyhow::{Context, Result};
use promptrun_core::capabilities::builtin_registry;
use promptrun_core::reasoning::ReasoningLoop;
use promptrun_durable::{InMemoryStepStore, PostgresStepStore, StepExecutor, StepStore};
use promptrun_openai::OpenAiCompletionClient;
use promptrun_worker::{
    router, AgentRequestWorkflow, EventSigner, WebhookReporter, WorkerConfig, WorkerState,
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // RUST_LOG overrides the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promptrun_worker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env().context("Invalid worker configuration")?;
    tracing::info!(app_id = %config.app_id, "promptrun-worker starting...");

    let store: Arc<dyn StepStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("Failed to connect to database")?;
            let store = PostgresStepStore::new(pool);
            store
                .migrate()
                .await
                .context("Failed to run step store migrations")?;
            tracing::info!("Using PostgreSQL step store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, step memos are kept in memory");
            Arc::new(InMemoryStepStore::new())
        }
    };

    let http = reqwest::Client::new();

    let mut completion = OpenAiCompletionClient::with_http_client(http.clone(), &config.model);
    if let Some(api_key) = &config.backend_api_key {
        completion = completion.with_api_key(api_key);
    }

    let reasoning = ReasoningLoop::new(
        Arc::new(completion),
        builtin_registry(http.clone(), &config.providers),
        &config.backend_url,
    );
    let reporter = WebhookReporter::new(http, &config.result_webhook, &config.result_token);

    tracing::info!(
        backend = %config.backend_url,
        model = %config.model,
        webhook = %config.result_webhook,
        "Workflow configured"
    );

    let workflow = AgentRequestWorkflow::new(reasoning, StepExecutor::new(store), Arc::new(reporter));
    let mut state = WorkerState::new(workflow);
    match &config.event_signing_key {
        Some(key) => {
            let signer = EventSigner::new(key).context("Invalid EVENT_SIGNING_KEY")?;
            state = state.with_signer(signer);
        }
        None => tracing::warn!("EVENT_SIGNING_KEY not set, accepting unsigned events"),
    }

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Received shutdown signal");
        })
        .await
        .context("Server error")?;

    Ok(())
}
