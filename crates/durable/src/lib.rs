//! # Durable Step Execution
//!
//! Memoized units of work for runs that may be delivered more than once.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       StepExecutor                           │
//! │  (runs a named step once, replays its memo on redelivery)    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        StepStore                             │
//! │  (in-memory, or PostgreSQL: durable_step_memos)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use promptrun_durable::prelude::*;
//!
//! let executor = StepExecutor::new(Arc::new(InMemoryStepStore::new()));
//! let answer: String = executor
//!     .run("run-1", "agent-reasoning", || async { Ok::<_, StoreError>(compute().await) })
//!     .await?;
//! ```

pub mod engine;
pub mod persistence;
pub mod reliability;

/// Prelude for common imports
pub mod prelude {
    pub use crate::engine::StepExecutor;
    pub use crate::persistence::{
        InMemoryStepStore, PostgresStepStore, StepKey, StepStore, StoreError,
    };
    pub use crate::reliability::RetryPolicy;
}

pub use engine::StepExecutor;
pub use persistence::{InMemoryStepStore, PostgresStepStore, StepKey, StepStore, StoreError};
pub use reliability::RetryPolicy;
