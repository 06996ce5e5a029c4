// Storage layer for the control plane
// Decision: Support both PostgreSQL (production) and in-memory (dev mode)
//
// - InMemoryRequestStore: parking_lot-guarded map, lost on restart
// - PostgresRequestStore: `agent_requests` table

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

pub use memory::InMemoryRequestStore;
pub use models::{RequestRecord, RequestStatus};
pub use postgres::PostgresRequestStore;

#[derive(Debug, thiserror::Error)]
pub enum RequestStoreError {
    #[error("request already exists: {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Persistence for request records
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn insert(&self, record: RequestRecord) -> Result<(), RequestStoreError>;

    /// Set status and result; `false` when the request is unknown.
    /// Later reports for the same request overwrite earlier ones.
    async fn update_status(
        &self,
        request_id: &str,
        status: RequestStatus,
        result: Option<String>,
    ) -> Result<bool, RequestStoreError>;

    /// Mark the request `error` unless the worker already reported a
    /// terminal status. Returns whether the record changed.
    async fn mark_error(&self, request_id: &str, message: &str) -> Result<bool, RequestStoreError>;

    async fn get(&self, request_id: &str) -> Result<Option<RequestRecord>, RequestStoreError>;
}
