//! StepStore trait definition

use async_trait::async_trait;
use serde_json::Value;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Identity of one memoized unit of work
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepKey {
    pub run_id: String,
    pub step_name: String,
}

impl StepKey {
    pub fn new(run_id: impl Into<String>, step_name: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            step_name: step_name.into(),
        }
    }
}

impl std::fmt::Display for StepKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.run_id, self.step_name)
    }
}

/// Persistence for step memos.
///
/// Writes are insert-if-absent: once a key holds a value it never changes,
/// and concurrent writers for the same key all observe the first value.
#[async_trait]
pub trait StepStore: Send + Sync {
    /// Memoized value for `key`, if the step already completed
    async fn load(&self, key: &StepKey) -> Result<Option<Value>, StoreError>;

    /// Store `value` unless `key` already has one. Returns the value that is
    /// stored afterwards (the existing one when the insert lost).
    async fn save_if_absent(&self, key: &StepKey, value: Value) -> Result<Value, StoreError>;
}

#[async_trait]
impl<T: StepStore + ?Sized> StepStore for std::sync::Arc<T> {
    async fn load(&self, key: &StepKey) -> Result<Option<Value>, StoreError> {
        (**self).load(key).await
    }

    async fn save_if_absent(&self, key: &StepKey, value: Value) -> Result<Value, StoreError> {
        (**self).save_if_absent(key, value).await
    }
}
