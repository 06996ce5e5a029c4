// Promptrun Control Plane Library
// Decision: Shared library for binaries (API server, OpenAPI export)

// API routes and types (shared for OpenAPI generation)
pub mod api;

pub mod config;

// Event delivery to the worker
pub mod dispatch;

// Storage layer
pub mod storage;

// OpenAPI spec generation
pub mod openapi;

pub use api::{router, ApiContext};
pub use config::ControlPlaneConfig;
pub use dispatch::{DispatchError, Dispatcher, EventQueue};
pub use storage::{
    InMemoryRequestStore, PostgresRequestStore, RequestRecord, RequestStatus, RequestStore,
    RequestStoreError,
};
