//! Step execution engine
//!
//! The engine module provides the `StepExecutor`, which memoizes named units
//! of work so redelivered runs replay completed steps instead of re-running them.

mod executor;

pub use executor::StepExecutor;
