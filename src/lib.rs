//! Ride Insights - predefined analytical SQL queries over ride bookings.
//!
//! This library exposes the core modules for use in integration tests.

pub mod app;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod logging;
pub mod query;
pub mod render;
pub mod safety;
