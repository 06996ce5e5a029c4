use std::sync::Arc;

use anyhow::{Context, Result};
use promptrun_control_plane::dispatch::DEFAULT_QUEUE_CAPACITY;
use promptrun_control_plane::{
    router, ApiContext, ControlPlaneConfig, Dispatcher, InMemoryRequestStore,
    PostgresRequestStore, RequestStore,
};
use promptrun_durable::RetryPolicy;
use promptrun_worker::EventSigner;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promptrun_control_plane=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ControlPlaneConfig::from_env().context("Invalid control plane configuration")?;
    tracing::info!("promptrun-control-plane starting...");

    let store: Arc<dyn RequestStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("Failed to connect to database")?;
            let store = PostgresRequestStore::new(pool);
            store
                .migrate()
                .await
                .context("Failed to run request store migrations")?;
            tracing::info!("Using PostgreSQL request store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, requests are kept in memory");
            Arc::new(InMemoryRequestStore::new())
        }
    };

    // The worker answers only after the whole run, so the timeout bounds a run
    let http = reqwest::Client::builder()
        .timeout(config.dispatch_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let mut dispatcher = Dispatcher::new(http, &config.worker_events_url, store.clone())
        .with_retry_policy(
            RetryPolicy::exponential().with_max_attempts(config.dispatch_max_attempts),
        )
        .with_max_concurrency(config.dispatch_concurrency);
    match &config.event_signing_key {
        Some(key) => {
            let signer = EventSigner::new(key).context("Invalid EVENT_SIGNING_KEY")?;
            dispatcher = dispatcher.with_signer(signer);
        }
        None => tracing::warn!("EVENT_SIGNING_KEY not set, events are sent unsigned"),
    }
    let (queue, dispatch_task) = dispatcher.spawn(DEFAULT_QUEUE_CAPACITY);

    tracing::info!(
        worker = %config.worker_events_url,
        backend = %config.backend_url,
        max_attempts = config.dispatch_max_attempts,
        concurrency = config.dispatch_concurrency,
        "Dispatcher started"
    );

    let app = router(ApiContext {
        store,
        queue,
        backend_url: config.backend_url.clone(),
        result_token: config.result_token.clone(),
    });

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Received shutdown signal");
        })
        .await
        .context("Server error")?;

    // The router held the last queue handle; let in-flight events finish
    dispatch_task.await.context("Dispatcher task failed")?;

    Ok(())
}
