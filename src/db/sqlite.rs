//! SQLite connection provider.
//!
//! Provides `SqliteProvider`, a lazily-connecting sqlx pool that hands out
//! scoped connections for the query executor.

use crate::config::DatabaseConfig;
use crate::db::{map_submit_error, ColumnInfo, Connection, ConnectionProvider, Row, RowSet, Value};
use crate::error::{InsightsError, Result};
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteColumn, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, Sqlite, Statement, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// SQLite connection provider.
#[derive(Debug)]
pub struct SqliteProvider {
    pool: SqlitePool,
    display: String,
}

impl SqliteProvider {
    /// Builds a lazy pool for the configured SQLite URL.
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        let url = config.require_url()?;
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| InsightsError::config(format!("Invalid SQLite connection string: {e}")))?;

        let pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs));

        // Each in-memory connection is a separate database, so pin exactly one.
        let pool_options = if config.is_in_memory() {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(config.max_connections.max(1))
        };

        Ok(Self {
            pool: pool_options.connect_lazy_with(options),
            display: config.display_string(),
        })
    }
}

#[async_trait]
impl ConnectionProvider for SqliteProvider {
    async fn acquire(&self) -> Result<Box<dyn Connection>> {
        debug!("Acquiring SQLite connection for {}", self.display);
        let conn = self.pool.acquire().await.map_err(|e| {
            InsightsError::connection(format!("Cannot open {}: {e}", self.display))
        })?;
        Ok(Box::new(PooledSqliteConnection { conn }))
    }

    fn describe(&self) -> String {
        self.display.clone()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// A pooled connection; dropping it returns the connection to the pool.
struct PooledSqliteConnection {
    conn: PoolConnection<Sqlite>,
}

#[async_trait]
impl Connection for PooledSqliteConnection {
    async fn submit(&mut self, statement: &str) -> Result<RowSet> {
        let rows: Vec<SqliteRow> = sqlx::query(statement)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(map_submit_error)?;

        let columns = match rows.first() {
            Some(first) => column_info(first.columns()),
            None => self.describe_columns(statement).await,
        };

        let rows = rows.iter().map(convert_row).collect::<Result<Vec<_>>>()?;
        Ok(RowSet::new(columns, rows))
    }

    async fn execute_script(&mut self, script: &str) -> Result<()> {
        (&mut *self.conn)
            .execute(script)
            .await
            .map_err(map_submit_error)?;
        Ok(())
    }
}

impl PooledSqliteConnection {
    /// Reads the projection of a statement that produced no rows.
    ///
    /// Best effort: an empty list is returned if the statement cannot be
    /// prepared a second time.
    async fn describe_columns(&mut self, statement: &str) -> Vec<ColumnInfo> {
        match (&mut *self.conn).prepare(statement).await {
            Ok(prepared) => column_info(prepared.columns()),
            Err(e) => {
                debug!("Could not describe empty result set: {e}");
                Vec::new()
            }
        }
    }
}

fn column_info(columns: &[SqliteColumn]) -> Vec<ColumnInfo> {
    columns
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect()
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Result<Row> {
    (0..row.len()).map(|i| convert_value(row, i)).collect()
}

/// Converts a single value using its runtime storage class.
///
/// SQLite columns are dynamically typed, and computed columns such as
/// `COUNT(*)` have no declared type, so the value itself decides. Only a
/// stored NULL becomes `Value::Null`; anything undecodable fails the run.
fn convert_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let storage_class = {
        let raw = row.try_get_raw(index).map_err(map_submit_error)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        raw.type_info().name().to_uppercase()
    };

    let value = match storage_class.as_str() {
        "INTEGER" => Value::Int(decode(row, index, &storage_class)?),
        "REAL" => Value::Float(decode(row, index, &storage_class)?),
        "BLOB" => Value::Bytes(decode(row, index, &storage_class)?),
        // TEXT is not guaranteed to be valid UTF-8
        _ => match row.try_get::<String, _>(index) {
            Ok(text) => Value::String(text),
            Err(_) => {
                let bytes = row
                    .try_get_unchecked::<Vec<u8>, _>(index)
                    .map_err(|e| decode_error(row, index, &storage_class, e))?;
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            }
        },
    };
    Ok(value)
}

fn decode<'r, T>(row: &'r SqliteRow, index: usize, storage_class: &str) -> Result<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get::<T, _>(index)
        .map_err(|e| decode_error(row, index, storage_class, e))
}

fn decode_error(
    row: &SqliteRow,
    index: usize,
    storage_class: &str,
    error: sqlx::Error,
) -> InsightsError {
    let name = row.columns().get(index).map_or("?", |c| c.name());
    InsightsError::statement(format!(
        "cannot decode column {name} of type {storage_class}: {error}"
    ))
}
