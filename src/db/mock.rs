//! In-process connection providers for testing.
//!
//! `MockProvider` serves canned row sets and counts how many of its
//! connections are alive, so tests can check that every run releases its
//! connection. `FailingProvider` stands in for an unreachable store.

use super::{Connection, ConnectionProvider, RowSet};
use crate::error::{InsightsError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// What a mock connection does when a statement is submitted.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this row set.
    Rows(RowSet),
    /// Reject the statement with this message.
    StatementError(String),
    /// Drop the connection mid-statement with this message.
    ConnectionLost(String),
}

/// A provider that returns predefined results keyed by statement text.
pub struct MockProvider {
    responses: HashMap<String, MockResponse>,
    fallback: MockResponse,
    live: Arc<AtomicUsize>,
    acquired: AtomicUsize,
}

impl MockProvider {
    /// Creates a provider that answers every statement with an empty row set.
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            fallback: MockResponse::Rows(RowSet::default()),
            live: Arc::new(AtomicUsize::new(0)),
            acquired: AtomicUsize::new(0),
        }
    }

    /// Registers a response for a statement (matched after trimming).
    pub fn with_response(mut self, statement: &str, response: MockResponse) -> Self {
        self.responses
            .insert(statement.trim().to_string(), response);
        self
    }

    /// Sets the response for statements without a registered one.
    pub fn with_fallback(mut self, response: MockResponse) -> Self {
        self.fallback = response;
        self
    }

    /// Number of connections currently checked out.
    pub fn live_connections(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Total number of successful acquisitions.
    pub fn total_acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionProvider for MockProvider {
    async fn acquire(&self) -> Result<Box<dyn Connection>> {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            responses: self.responses.clone(),
            fallback: self.fallback.clone(),
            live: Arc::clone(&self.live),
        }))
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }

    async fn close(&self) {}
}

struct MockConnection {
    responses: HashMap<String, MockResponse>,
    fallback: MockResponse,
    live: Arc<AtomicUsize>,
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn submit(&mut self, statement: &str) -> Result<RowSet> {
        let response = self
            .responses
            .get(statement.trim())
            .unwrap_or(&self.fallback);

        match response {
            MockResponse::Rows(set) => Ok(set.clone()),
            MockResponse::StatementError(msg) => Err(InsightsError::statement(msg.clone())),
            MockResponse::ConnectionLost(msg) => Err(InsightsError::connection(msg.clone())),
        }
    }

    async fn execute_script(&mut self, _script: &str) -> Result<()> {
        Ok(())
    }
}

/// A provider whose every acquisition fails, like an unreachable server.
pub struct FailingProvider {
    message: String,
}

impl FailingProvider {
    /// Creates a failing provider with the given connection error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingProvider {
    fn default() -> Self {
        Self::new("Cannot connect to localhost:5432. Check that the server is running.")
    }
}

#[async_trait]
impl ConnectionProvider for FailingProvider {
    async fn acquire(&self) -> Result<Box<dyn Connection>> {
        Err(InsightsError::connection(self.message.clone()))
    }

    fn describe(&self) -> String {
        "unreachable".to_string()
    }

    async fn close(&self) {}
}
