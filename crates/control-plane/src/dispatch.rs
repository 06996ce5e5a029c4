// Event dispatch to the worker
//
// Intake pushes events onto a bounded in-process queue; a drain task hands
// each event to its own delivery task, at most `max_concurrency` at a time,
// which POSTs it to the worker trigger URL. Failed deliveries are
// retried with the same body, so every attempt carries the same run id and
// the worker replays its memoized step instead of recomputing it.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};

use promptrun_core::request::AgentRequestEvent;
use promptrun_durable::RetryPolicy;
use promptrun_worker::{EventSigner, SIGNATURE_HEADER};

use crate::storage::RequestStore;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_MAX_CONCURRENCY: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("event queue is full")]
    QueueFull,

    #[error("event queue is closed")]
    QueueClosed,

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("worker unreachable: {0}")]
    Transport(String),

    #[error("worker rejected event: {status} {body}")]
    Rejected { status: u16, body: String },
}

/// Sending half of the dispatch queue
#[derive(Clone)]
pub struct EventQueue {
    tx: mpsc::Sender<AgentRequestEvent>,
}

impl EventQueue {
    /// Enqueue without waiting; a full queue is an error for the caller
    pub fn enqueue(&self, event: AgentRequestEvent) -> Result<(), DispatchError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DispatchError::QueueClosed,
        })
    }
}

/// Delivers events to the worker trigger endpoint
pub struct Dispatcher {
    http: reqwest::Client,
    events_url: String,
    signer: Option<EventSigner>,
    retry: RetryPolicy,
    store: Arc<dyn RequestStore>,
    max_concurrency: usize,
}

impl Dispatcher {
    pub fn new(
        http: reqwest::Client,
        events_url: impl Into<String>,
        store: Arc<dyn RequestStore>,
    ) -> Self {
        Self {
            http,
            events_url: events_url.into(),
            signer: None,
            retry: RetryPolicy::exponential(),
            store,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_signer(mut self, signer: EventSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Deliveries in flight at once (at least one)
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Start the dispatch task.
    ///
    /// Each event is delivered on its own task so a slow run never holds up
    /// the others. Once every queue handle is dropped the task waits for
    /// in-flight deliveries, then stops.
    pub fn spawn(self, capacity: usize) -> (EventQueue, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(capacity);
        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let dispatcher = Arc::new(self);

        let handle = tokio::spawn(async move {
            let mut in_flight = JoinSet::new();
            while let Some(event) = rx.recv().await {
                // The semaphore is never closed
                let Ok(permit) = permits.clone().acquire_owned().await else {
                    break;
                };
                let dispatcher = dispatcher.clone();
                in_flight.spawn(async move {
                    dispatcher.dispatch(event).await;
                    drop(permit);
                });
                while let Some(joined) = in_flight.try_join_next() {
                    log_join_error(joined);
                }
            }
            while let Some(joined) = in_flight.join_next().await {
                log_join_error(joined);
            }
            info!("event queue closed, dispatcher stopping");
        });
        (EventQueue { tx }, handle)
    }

    /// Deliver one event, recording an `error` status when every attempt fails
    pub async fn dispatch(&self, event: AgentRequestEvent) {
        let request_id = event.data.request_id.clone();
        let Err(err) = self.deliver(&event).await else {
            info!(request_id = %request_id, "event delivered");
            return;
        };

        error!(request_id = %request_id, error = %err, "giving up on event");
        match self.store.mark_error(&request_id, &err.to_string()).await {
            Ok(true) => {}
            Ok(false) => warn!(
                request_id = %request_id,
                "request already finished or unknown, status left unchanged"
            ),
            Err(store_err) => error!(
                request_id = %request_id,
                error = %store_err,
                "failed to record dispatch error"
            ),
        }
    }

    /// POST the event, retrying per the policy
    pub async fn deliver(&self, event: &AgentRequestEvent) -> Result<(), DispatchError> {
        let body = serde_json::to_vec(event)?;
        let signature = self.signer.as_ref().map(|signer| signer.sign(&body));
        let (body, signature) = (&body, signature.as_deref());

        self.retry
            .retry(|_attempt| self.send_once(body, signature))
            .await
    }

    async fn send_once(&self, body: &[u8], signature: Option<&str>) -> Result<(), DispatchError> {
        let mut request = self
            .http
            .post(&self.events_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_vec());
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(DispatchError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

fn log_join_error(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "delivery task failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryRequestStore, RequestRecord, RequestStatus};
    use promptrun_core::request::AgentRequest;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::fixed(Duration::from_millis(1), max_attempts)
    }

    async fn queued(store: &InMemoryRequestStore, request_id: &str) -> AgentRequestEvent {
        store
            .insert(RequestRecord::queued(request_id, "Hello", None))
            .await
            .unwrap();
        AgentRequestEvent::new(AgentRequest::new(request_id, "Hello")).with_id(request_id)
    }

    #[tokio::test]
    async fn test_delivers_signed_event() {
        let worker = MockServer::start().await;
        let signer = EventSigner::new("secret").unwrap();
        let store = Arc::new(InMemoryRequestStore::new());
        let event = queued(&store, "req-1").await;
        let expected = signer.sign(&serde_json::to_vec(&event).unwrap());

        Mock::given(method("POST"))
            .and(path("/api/events"))
            .and(header(SIGNATURE_HEADER, expected.as_str()))
            .and(body_partial_json(serde_json::json!({
                "name": "app/agent.request",
                "id": "req-1",
                "data": {"request_id": "req-1", "prompt": "Hello"}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&worker)
            .await;

        let dispatcher = Dispatcher::new(
            reqwest::Client::new(),
            format!("{}/api/events", worker.uri()),
            store.clone(),
        )
        .with_signer(signer);

        assert!(dispatcher.deliver(&event).await.is_ok());
    }

    #[tokio::test]
    async fn test_unsigned_without_key() {
        let worker = MockServer::start().await;
        let store = Arc::new(InMemoryRequestStore::new());
        let event = queued(&store, "req-1").await;

        Mock::given(header_exists(SIGNATURE_HEADER))
            .respond_with(ResponseTemplate::new(401))
            .mount(&worker)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&worker)
            .await;

        let dispatcher = Dispatcher::new(reqwest::Client::new(), worker.uri(), store);
        assert!(dispatcher.deliver(&event).await.is_ok());
    }

    #[tokio::test]
    async fn test_redelivers_until_accepted() {
        let worker = MockServer::start().await;
        let store = Arc::new(InMemoryRequestStore::new());
        let event = queued(&store, "req-1").await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .expect(2)
            .mount(&worker)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&worker)
            .await;

        let dispatcher = Dispatcher::new(reqwest::Client::new(), worker.uri(), store.clone())
            .with_retry_policy(fast_retry(3));
        dispatcher.dispatch(event).await;

        // Every attempt carries the same run id
        let requests = worker.received_requests().await.unwrap();
        let ids: Vec<serde_json::Value> = requests
            .iter()
            .map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).unwrap()["id"].clone())
            .collect();
        assert_eq!(ids, vec![serde_json::json!("req-1"); 3]);

        let record = store.get("req-1").await.unwrap().unwrap();
        assert_eq!(record.status, RequestStatus::Queued);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_mark_error() {
        let worker = MockServer::start().await;
        let store = Arc::new(InMemoryRequestStore::new());
        let event = queued(&store, "req-1").await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(2)
            .mount(&worker)
            .await;

        let dispatcher = Dispatcher::new(reqwest::Client::new(), worker.uri(), store.clone())
            .with_retry_policy(fast_retry(2));
        dispatcher.dispatch(event).await;

        let record = store.get("req-1").await.unwrap().unwrap();
        assert_eq!(record.status, RequestStatus::Error);
        assert_eq!(
            record.result.as_deref(),
            Some("worker rejected event: 503 busy")
        );
    }

    #[tokio::test]
    async fn test_exhausted_attempts_keep_reported_outcome() {
        let worker = MockServer::start().await;
        let store = Arc::new(InMemoryRequestStore::new());
        let event = queued(&store, "req-1").await;
        // The worker reported before its trigger response was lost
        store
            .update_status("req-1", RequestStatus::Completed, Some("Hi".into()))
            .await
            .unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&worker)
            .await;

        let dispatcher = Dispatcher::new(reqwest::Client::new(), worker.uri(), store.clone())
            .with_retry_policy(RetryPolicy::no_retry());
        dispatcher.dispatch(event).await;

        let record = store.get("req-1").await.unwrap().unwrap();
        assert_eq!(record.status, RequestStatus::Completed);
        assert_eq!(record.result.as_deref(), Some("Hi"));
    }

    #[tokio::test]
    async fn test_unreachable_worker_is_transport_error() {
        let store = Arc::new(InMemoryRequestStore::new());
        let event = queued(&store, "req-1").await;

        let dispatcher = Dispatcher::new(reqwest::Client::new(), "http://127.0.0.1:1/api/events", store)
            .with_retry_policy(RetryPolicy::no_retry());

        let err = dispatcher.deliver(&event).await.unwrap_err();
        assert!(matches!(err, DispatchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_spawned_queue_drains_events() {
        let worker = MockServer::start().await;
        let store = Arc::new(InMemoryRequestStore::new());
        let first = queued(&store, "req-1").await;
        let second = queued(&store, "req-2").await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&worker)
            .await;

        let dispatcher = Dispatcher::new(reqwest::Client::new(), worker.uri(), store);
        let (queue, handle) = dispatcher.spawn(4);
        queue.enqueue(first).unwrap();
        queue.enqueue(second).unwrap();
        drop(queue);

        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_slow_run_does_not_delay_others() {
        let worker = MockServer::start().await;
        let store = Arc::new(InMemoryRequestStore::new());
        let slow = queued(&store, "slow").await;
        let fast = queued(&store, "fast").await;

        Mock::given(body_partial_json(serde_json::json!({"id": "slow"})))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&worker)
            .await;
        Mock::given(body_partial_json(serde_json::json!({"id": "fast"})))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&worker)
            .await;

        let dispatcher = Dispatcher::new(reqwest::Client::new(), worker.uri(), store.clone())
            .with_retry_policy(RetryPolicy::no_retry());
        let (queue, handle) = dispatcher.spawn(4);
        queue.enqueue(slow).unwrap();
        queue.enqueue(fast).unwrap();

        // The fast run settles while the slow one is still with the worker
        let settled = tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                let record = store.get("fast").await.unwrap().unwrap();
                if record.status == RequestStatus::Error {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(settled.is_ok(), "fast run waited behind slow run");
        assert_eq!(
            store.get("slow").await.unwrap().unwrap().status,
            RequestStatus::Queued
        );

        drop(queue);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrency_limit_of_one_serializes() {
        let worker = MockServer::start().await;
        let store = Arc::new(InMemoryRequestStore::new());
        let first = queued(&store, "req-1").await;
        let second = queued(&store, "req-2").await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
            .expect(2)
            .mount(&worker)
            .await;

        let dispatcher = Dispatcher::new(reqwest::Client::new(), worker.uri(), store)
            .with_max_concurrency(1);
        let (queue, handle) = dispatcher.spawn(4);
        let started = std::time::Instant::now();
        queue.enqueue(first).unwrap();
        queue.enqueue(second).unwrap();
        drop(queue);
        handle.await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_full_queue_rejects() {
        let (tx, _rx) = mpsc::channel(1);
        let queue = EventQueue { tx };
        let event = AgentRequestEvent::new(AgentRequest::new("req-1", "Hello"));

        queue.enqueue(event.clone()).unwrap();
        assert!(matches!(
            queue.enqueue(event),
            Err(DispatchError::QueueFull)
        ));
    }
}
