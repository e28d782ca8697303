//! Integration tests for ride-insights.

pub mod catalog_test;
pub mod common;
pub mod executor_test;
pub mod export_test;
pub mod postgres_test;
