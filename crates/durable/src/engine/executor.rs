//! Step executor with replay support
//!
//! The `StepExecutor` wraps a unit of work so that, when the same run is
//! delivered again, a step that already completed is not re-executed:
//! - First execution runs the work and memoizes its value
//! - Re-execution for the same `(run_id, step_name)` returns the memo
//! - Failed work memoizes nothing, so the next delivery runs it again

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::persistence::{StepKey, StepStore, StoreError};

/// Runs named steps of a run exactly once per successful completion
#[derive(Clone)]
pub struct StepExecutor {
    store: Arc<dyn StepStore>,
}

impl StepExecutor {
    pub fn new(store: Arc<dyn StepStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn StepStore> {
        &self.store
    }

    /// Run `work` as step `step_name` of run `run_id`, or return its memo.
    ///
    /// When two deliveries race, both may execute `work`, but both return the
    /// value that was stored first.
    #[instrument(skip(self, work), fields(run_id = %run_id, step = %step_name))]
    pub async fn run<T, E, F, Fut>(&self, run_id: &str, step_name: &str, work: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<StoreError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = StepKey::new(run_id, step_name);

        if let Some(memo) = self.store.load(&key).await? {
            info!("replaying memoized step");
            return decode(memo);
        }

        debug!("executing step");
        let value = work().await?;

        let encoded = serde_json::to_value(&value).map_err(StoreError::from)?;
        let stored = self.store.save_if_absent(&key, encoded.clone()).await?;
        if stored == encoded {
            debug!("step memoized");
            Ok(value)
        } else {
            info!("concurrent delivery memoized first, using its value");
            decode(stored)
        }
    }
}

fn decode<T, E>(memo: serde_json::Value) -> Result<T, E>
where
    T: DeserializeOwned,
    E: From<StoreError>,
{
    serde_json::from_value(memo).map_err(|e| E::from(StoreError::from(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryStepStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("work failed")]
        Work,
        #[error(transparent)]
        Store(#[from] StoreError),
    }

    fn executor() -> (StepExecutor, Arc<InMemoryStepStore>) {
        let store = Arc::new(InMemoryStepStore::new());
        (StepExecutor::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_first_run_executes_and_memoizes() {
        let (executor, store) = executor();

        let value: String = executor
            .run("run-1", "agent-reasoning", || async {
                Ok::<_, TestError>("answer".to_string())
            })
            .await
            .unwrap();

        assert_eq!(value, "answer");
        assert_eq!(
            store.get(&StepKey::new("run-1", "agent-reasoning")),
            Some(json!("answer"))
        );
    }

    #[tokio::test]
    async fn test_replay_skips_work() {
        let (executor, _store) = executor();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: String = executor
                .run("run-1", "agent-reasoning", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TestError>("answer".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "answer");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_persists_nothing() {
        let (executor, store) = executor();

        let err = executor
            .run::<String, _, _, _>("run-1", "agent-reasoning", || async {
                Err(TestError::Work)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TestError::Work));
        assert!(store.is_empty());

        let value: String = executor
            .run("run-1", "agent-reasoning", || async {
                Ok::<_, TestError>("second try".to_string())
            })
            .await
            .unwrap();
        assert_eq!(value, "second try");
    }

    #[tokio::test]
    async fn test_lost_race_returns_stored_value() {
        let (executor, store) = executor();
        let key = StepKey::new("run-1", "agent-reasoning");

        // Another delivery finishes while this one is still working
        let value: String = executor
            .run("run-1", "agent-reasoning", || {
                let store = store.clone();
                let key = key.clone();
                async move {
                    store.save_if_absent(&key, json!("winner")).await?;
                    Ok::<_, TestError>("loser".to_string())
                }
            })
            .await
            .unwrap();

        assert_eq!(value, "winner");
    }

    #[tokio::test]
    async fn test_undecodable_memo_is_store_error() {
        let (executor, store) = executor();
        store
            .save_if_absent(&StepKey::new("run-1", "agent-reasoning"), json!({"not": "a string"}))
            .await
            .unwrap();

        let err = executor
            .run::<String, TestError, _, _>("run-1", "agent-reasoning", || async {
                Ok("unused".to_string())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, TestError::Store(StoreError::Serialization(_))));
    }
}
