//! Error types for ride-insights.
//!
//! Defines the main error enum used throughout the library. The query
//! executor never returns these to its caller; it folds connection and
//! statement faults into a `Failure` result instead.

use thiserror::Error;

/// Main error type for ride-insights operations.
#[derive(Error, Debug)]
pub enum InsightsError {
    /// Catalog lookup for an id that is not in the catalog.
    #[error("Query {0} not found in catalog")]
    NotFound(u32),

    /// The backing store could not be reached or the connection dropped.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backing store rejected the statement (syntax, missing table, types).
    #[error("Statement error: {0}")]
    Statement(String),

    /// Configuration errors (invalid config file, bad connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed catalog definition file.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Result export failures (wrong result status, I/O).
    #[error("Export error: {0}")]
    Export(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InsightsError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a statement error with the given message.
    pub fn statement(msg: impl Into<String>) -> Self {
        Self::Statement(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a catalog error with the given message.
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Creates an export error with the given message.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Not Found",
            Self::Connection(_) => "Connection Error",
            Self::Statement(_) => "Statement Error",
            Self::Config(_) => "Configuration Error",
            Self::Catalog(_) => "Catalog Error",
            Self::Export(_) => "Export Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the bare description without the category prefix.
    ///
    /// This is what gets shown to the user on a failed run.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(id) => format!("Query {id} not found in catalog"),
            Self::Connection(msg)
            | Self::Statement(msg)
            | Self::Config(msg)
            | Self::Catalog(msg)
            | Self::Export(msg)
            | Self::Internal(msg) => msg.clone(),
        }
    }
}

/// Result type alias using InsightsError.
pub type Result<T> = std::result::Result<T, InsightsError>;
