//! PostgreSQL implementation of StepStore
//!
//! Memos live in `durable_step_memos` with primary key `(run_id, step_name)`.
//! Inserts use `ON CONFLICT DO NOTHING`, so racing redeliveries of the same
//! run converge on whichever value landed first.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};
use tracing::{debug, error, instrument};

use super::store::*;

/// PostgreSQL implementation of StepStore
///
/// # Example
///
/// ```ignore
/// use promptrun_durable::PostgresStepStore;
/// use sqlx::PgPool;
///
/// let pool = PgPool::connect("postgres://localhost/promptrun").await?;
/// let store = PostgresStepStore::new(pool);
/// store.migrate().await?;
/// ```
#[derive(Clone)]
pub struct PostgresStepStore {
    pool: PgPool,
}

impl PostgresStepStore {
    /// Create a new PostgreSQL store with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply this crate's migrations.
    ///
    /// Other services may share the database with their own migration sets,
    /// so versions applied elsewhere are ignored.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let mut migrator = sqlx::migrate!("./migrations");
        migrator.set_ignore_missing(true);
        migrator.run(&self.pool).await.map_err(|e| {
            error!("Failed to run step store migrations: {}", e);
            StoreError::Database(e.to_string())
        })
    }
}

#[async_trait]
impl StepStore for PostgresStepStore {
    #[instrument(skip(self), fields(run_id = %key.run_id, step = %key.step_name))]
    async fn load(&self, key: &StepKey) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT value FROM durable_step_memos WHERE run_id = $1 AND step_name = $2
            "#,
        )
        .bind(&key.run_id)
        .bind(&key.step_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to load step memo: {}", e);
            StoreError::Database(e.to_string())
        })?;

        Ok(row.map(|row| row.get::<Value, _>("value")))
    }

    #[instrument(skip(self, value), fields(run_id = %key.run_id, step = %key.step_name))]
    async fn save_if_absent(&self, key: &StepKey, value: Value) -> Result<Value, StoreError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO durable_step_memos (run_id, step_name, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (run_id, step_name) DO NOTHING
            "#,
        )
        .bind(&key.run_id)
        .bind(&key.step_name)
        .bind(&value)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to save step memo: {}", e);
            StoreError::Database(e.to_string())
        })?
        .rows_affected();

        if inserted == 1 {
            debug!("stored step memo");
            return Ok(value);
        }

        debug!("step memo already present, keeping stored value");
        self.load(key).await?.ok_or_else(|| {
            StoreError::Database(format!("step memo {key} vanished after conflicting insert"))
        })
    }
}
