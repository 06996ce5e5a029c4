//! In-memory implementation of StepStore for testing

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::store::*;

/// In-memory implementation of StepStore
///
/// Provides the same first-writer-wins semantics as the PostgreSQL store,
/// but memos vanish with the process.
///
/// # Example
///
/// ```
/// use promptrun_durable::InMemoryStepStore;
///
/// let store = InMemoryStepStore::new();
/// assert!(store.is_empty());
/// ```
#[derive(Default)]
pub struct InMemoryStepStore {
    memos: RwLock<HashMap<StepKey, Value>>,
}

impl InMemoryStepStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.memos.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.memos.read().is_empty()
    }

    /// Snapshot of one memo, bypassing the async trait
    pub fn get(&self, key: &StepKey) -> Option<Value> {
        self.memos.read().get(key).cloned()
    }
}

#[async_trait]
impl StepStore for InMemoryStepStore {
    async fn load(&self, key: &StepKey) -> Result<Option<Value>, StoreError> {
        Ok(self.memos.read().get(key).cloned())
    }

    async fn save_if_absent(&self, key: &StepKey, value: Value) -> Result<Value, StoreError> {
        let mut memos = self.memos.write();
        Ok(memos.entry(key.clone()).or_insert(value).clone())
    }
}
