// PostgreSQL request store
//
// Records live in `agent_requests`, keyed by request id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{error, instrument};

use super::models::{RequestRecord, RequestStatus};
use super::{RequestStore, RequestStoreError};

#[derive(Clone)]
pub struct PostgresRequestStore {
    pool: PgPool,
}

impl PostgresRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply this crate's migrations, ignoring versions owned by the worker
    pub async fn migrate(&self) -> Result<(), RequestStoreError> {
        let mut migrator = sqlx::migrate!("./migrations");
        migrator.set_ignore_missing(true);
        migrator.run(&self.pool).await.map_err(|e| {
            error!("Failed to run request store migrations: {}", e);
            RequestStoreError::Database(e.to_string())
        })
    }
}

fn database_error(context: &str, e: sqlx::Error) -> RequestStoreError {
    error!("{}: {}", context, e);
    RequestStoreError::Database(e.to_string())
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> Result<RequestRecord, RequestStoreError> {
    let status: String = row.get("status");
    let status = RequestStatus::parse(&status)
        .ok_or_else(|| RequestStoreError::Database(format!("unknown request status {status:?}")))?;

    Ok(RequestRecord {
        request_id: row.get("request_id"),
        prompt: row.get("prompt"),
        context: row.get("context"),
        status,
        result: row.get("result"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    })
}

#[async_trait]
impl RequestStore for PostgresRequestStore {
    #[instrument(skip(self, record), fields(request_id = %record.request_id))]
    async fn insert(&self, record: RequestRecord) -> Result<(), RequestStoreError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO agent_requests (request_id, prompt, context, status, result, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (request_id) DO NOTHING
            "#,
        )
        .bind(&record.request_id)
        .bind(&record.prompt)
        .bind(&record.context)
        .bind(record.status.as_str())
        .bind(&record.result)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to insert request", e))?;

        if inserted.rows_affected() == 0 {
            return Err(RequestStoreError::Duplicate(record.request_id));
        }
        Ok(())
    }

    #[instrument(skip(self, result))]
    async fn update_status(
        &self,
        request_id: &str,
        status: RequestStatus,
        result: Option<String>,
    ) -> Result<bool, RequestStoreError> {
        let updated = sqlx::query(
            r#"
            UPDATE agent_requests
            SET status = $2, result = $3, updated_at = now()
            WHERE request_id = $1
            "#,
        )
        .bind(request_id)
        .bind(status.as_str())
        .bind(result)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to update request status", e))?;

        Ok(updated.rows_affected() > 0)
    }

    #[instrument(skip(self, message))]
    async fn mark_error(&self, request_id: &str, message: &str) -> Result<bool, RequestStoreError> {
        let updated = sqlx::query(
            r#"
            UPDATE agent_requests
            SET status = 'error', result = $2, updated_at = now()
            WHERE request_id = $1 AND status NOT IN ('completed', 'failed')
            "#,
        )
        .bind(request_id)
        .bind(message)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to mark request as error", e))?;

        Ok(updated.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn get(&self, request_id: &str) -> Result<Option<RequestRecord>, RequestStoreError> {
        let row = sqlx::query(
            r#"
            SELECT request_id, prompt, context, status, result, created_at, updated_at
            FROM agent_requests
            WHERE request_id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to load request", e))?;

        row.as_ref().map(row_to_record).transpose()
    }
}
