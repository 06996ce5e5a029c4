// In-memory request store for dev mode
// Decision: Use parking_lot for thread-safe access
//
// All records are lost on restart.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::models::{RequestRecord, RequestStatus};
use super::{RequestStore, RequestStoreError};

#[derive(Default)]
pub struct InMemoryRequestStore {
    records: RwLock<HashMap<String, RequestRecord>>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn insert(&self, record: RequestRecord) -> Result<(), RequestStoreError> {
        let mut records = self.records.write();
        if records.contains_key(&record.request_id) {
            return Err(RequestStoreError::Duplicate(record.request_id));
        }
        records.insert(record.request_id.clone(), record);
        Ok(())
    }

    async fn update_status(
        &self,
        request_id: &str,
        status: RequestStatus,
        result: Option<String>,
    ) -> Result<bool, RequestStoreError> {
        let mut records = self.records.write();
        let Some(record) = records.get_mut(request_id) else {
            return Ok(false);
        };
        record.status = status;
        record.result = result;
        record.updated_at = Utc::now();
        Ok(true)
    }

    async fn mark_error(&self, request_id: &str, message: &str) -> Result<bool, RequestStoreError> {
        let mut records = self.records.write();
        match records.get_mut(request_id) {
            Some(record) if !record.status.is_terminal() => {
                record.status = RequestStatus::Error;
                record.result = Some(message.to_string());
                record.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get(&self, request_id: &str) -> Result<Option<RequestRecord>, RequestStoreError> {
        Ok(self.records.read().get(request_id).cloned())
    }
}
