//! Backing store access for ride-insights.
//!
//! Provides a trait-based connection provider, allowing the query executor
//! to run against SQLite, PostgreSQL, or an in-process test double.

pub mod mock;
mod postgres;
mod sqlite;
mod types;

pub use mock::{FailingProvider, MockProvider, MockResponse};
pub use postgres::PostgresProvider;
pub use sqlite::SqliteProvider;
pub use types::{ColumnInfo, Row, RowSet, Value};

use crate::config::DatabaseConfig;
use crate::error::{InsightsError, Result};
use async_trait::async_trait;
use tracing::debug;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

impl DatabaseBackend {
    /// Returns the backend as a string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }

    /// Parses a backend from a connection-string scheme.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "postgres" | "postgresql" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Creates the connection provider for the given configuration.
///
/// Pools are built lazily, so this never touches the network or the
/// filesystem; an unreachable store only shows up when a connection is
/// acquired.
pub fn connect(config: &DatabaseConfig) -> Result<Box<dyn ConnectionProvider>> {
    let backend = config.backend()?;
    debug!("Creating {} connection provider", backend.as_str());
    match backend {
        DatabaseBackend::Sqlite => Ok(Box::new(SqliteProvider::new(config)?)),
        DatabaseBackend::Postgres => Ok(Box::new(PostgresProvider::new(config)?)),
    }
}

/// Runs a multi-statement SQL script on a single acquired connection.
///
/// Used to load fixture or demo data into a store before querying it.
pub async fn seed(provider: &dyn ConnectionProvider, script: &str) -> Result<()> {
    let mut conn = provider.acquire().await?;
    conn.execute_script(script).await
}

/// Supplies live connections to the backing store.
///
/// Created once per process and shared read-only by every query run.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Acquires a connection. Dropping the returned handle releases it.
    async fn acquire(&self) -> Result<Box<dyn Connection>>;

    /// Returns a display-safe description of the store (no credentials).
    fn describe(&self) -> String;

    /// Closes the underlying connection source.
    async fn close(&self);
}

/// A scoped connection to the backing store.
#[async_trait]
pub trait Connection: Send {
    /// Submits a statement verbatim and fetches the full result set.
    async fn submit(&mut self, statement: &str) -> Result<RowSet>;

    /// Executes a script of one or more statements, discarding any rows.
    async fn execute_script(&mut self, script: &str) -> Result<()>;
}

/// Returns true if a sqlx error means the store could not be reached or the
/// connection was lost, as opposed to the store rejecting the statement.
pub(crate) fn is_connection_error(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Configuration(_)
    )
}

/// Maps a sqlx error raised while running a statement to our error type.
pub(crate) fn map_submit_error(error: sqlx::Error) -> InsightsError {
    if is_connection_error(&error) {
        InsightsError::connection(error.to_string())
    } else if let Some(db_error) = error.as_database_error() {
        InsightsError::statement(db_error.message().to_string())
    } else {
        InsightsError::statement(error.to_string())
    }
}
