//! Query execution against a connection provider.
//!
//! The executor is the error boundary: every fault at or below it comes back
//! as an `ExecutionResult::Failure`, never as an `Err`.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::catalog::QueryDefinition;
use crate::db::{ConnectionProvider, RowSet};
use crate::error::Result;

use super::ExecutionResult;

/// Runs catalog definitions, one scoped connection per run.
///
/// Each call is a single attempt with no retry, no timeout and no
/// cancellation; a hung backing store hangs the call.
pub struct QueryExecutor<'a> {
    provider: &'a dyn ConnectionProvider,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor over the given provider.
    pub fn new(provider: &'a dyn ConnectionProvider) -> Self {
        Self { provider }
    }

    /// Runs one definition and reports its outcome.
    pub async fn run(&self, definition: &QueryDefinition) -> ExecutionResult {
        debug!("Running query {} ({})", definition.id, definition.title);

        match self.attempt(&definition.statement).await {
            Ok((set, elapsed)) => {
                let result = ExecutionResult::completed(set.columns, set.rows, elapsed);
                info!(
                    query_id = definition.id,
                    status = %result.status(),
                    rows = result.row_count(),
                    elapsed_ms = result.elapsed_ms(),
                    "Query executed"
                );
                result
            }
            Err(e) => {
                warn!(query_id = definition.id, "Query failed: {e}");
                ExecutionResult::failure(&e)
            }
        }
    }

    /// Acquires a connection, submits the statement verbatim and fetches
    /// every row. The connection is released when this returns, on every
    /// path.
    async fn attempt(&self, statement: &str) -> Result<(RowSet, Duration)> {
        let start = Instant::now();
        let mut conn = self.provider.acquire().await?;
        let set = conn.submit(statement).await?;
        Ok((set, start.elapsed()))
    }
}
