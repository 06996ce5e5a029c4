//! Persistence layer for durable steps
//!
//! This module provides:
//! - [`StepStore`] trait for step memo persistence
//! - [`InMemoryStepStore`] for testing
//! - [`PostgresStepStore`] for production

mod memory;
mod postgres;
mod store;

pub use memory::InMemoryStepStore;
pub use postgres::PostgresStepStore;
pub use store::{StepKey, StepStore, StoreError};
