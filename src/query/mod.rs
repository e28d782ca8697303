//! Query execution for ride-insights.
//!
//! This module runs catalog definitions against a connection provider and
//! encodes every outcome, including faults, as an `ExecutionResult` value.

pub mod executor;
pub mod result;

pub use executor::QueryExecutor;
pub use result::{ExecutionResult, ExecutionStatus, FailureKind, Record};
