//! PostgreSQL connection provider.
//!
//! Provides `PostgresProvider`, which implements `ConnectionProvider` for
//! PostgreSQL databases using sqlx.

use crate::config::DatabaseConfig;
use crate::db::{map_submit_error, ColumnInfo, Connection, ConnectionProvider, Row, RowSet, Value};
use crate::error::{InsightsError, Result};
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgColumn, PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{
    Column as SqlxColumn, Executor, Postgres, Row as SqlxRow, Statement, TypeInfo, ValueRef,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// PostgreSQL connection provider.
#[derive(Debug)]
pub struct PostgresProvider {
    pool: PgPool,
    display: String,
}

impl PostgresProvider {
    /// Builds a lazy pool for the configured PostgreSQL URL.
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        let url = config.require_url()?;
        let options = PgConnectOptions::from_str(url).map_err(|e| {
            InsightsError::config(format!("Invalid PostgreSQL connection string: {e}"))
        })?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);

        Ok(Self {
            pool,
            display: config.display_string(),
        })
    }
}

#[async_trait]
impl ConnectionProvider for PostgresProvider {
    async fn acquire(&self) -> Result<Box<dyn Connection>> {
        debug!("Acquiring PostgreSQL connection for {}", self.display);
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_connection_error(e, &self.display))?;
        Ok(Box::new(PooledPgConnection { conn }))
    }

    fn describe(&self) -> String {
        self.display.clone()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// A pooled connection; dropping it returns the connection to the pool.
struct PooledPgConnection {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl Connection for PooledPgConnection {
    async fn submit(&mut self, statement: &str) -> Result<RowSet> {
        let rows: Vec<PgRow> = sqlx::query(statement)
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

impl PooledPgConnection {
    /// Reads the projection of a statement that produced no rows by
    /// preparing it again; the server reports the row description without
    /// executing anything.
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

fn column_info(columns: &[PgColumn]) -> Vec<ColumnInfo> {
    columns
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect()
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Result<Row> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
///
/// Only a stored NULL becomes `Value::Null`. A type with no arm here that
/// does not decode as text fails the run instead of being dropped.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Result<Value> {
    if row.try_get_raw(index).map_err(map_submit_error)?.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => Value::Bool(decode(row, index, type_name)?),
        "INT2" | "SMALLINT" => Value::Int(decode::<i16>(row, index, type_name)?.into()),
        "INT4" | "INT" | "INTEGER" => Value::Int(decode::<i32>(row, index, type_name)?.into()),
        "INT8" | "BIGINT" => Value::Int(decode(row, index, type_name)?),
        "FLOAT4" | "REAL" => Value::Float(widen_f32(decode(row, index, type_name)?)),
        "FLOAT8" | "DOUBLE PRECISION" => Value::Float(decode(row, index, type_name)?),

        // ROUND(AVG(..), 2) and SUM over numerics land here.
        "NUMERIC" => decimal_to_value(decode(row, index, type_name)?),

        "DATE" => Value::String(decode::<chrono::NaiveDate>(row, index, type_name)?.to_string()),
        "TIME" => Value::String(decode::<chrono::NaiveTime>(row, index, type_name)?.to_string()),
        "TIMESTAMP" => Value::String(
            decode::<chrono::NaiveDateTime>(row, index, type_name)?.to_string(),
        ),
        "TIMESTAMPTZ" => Value::String(
            decode::<chrono::DateTime<chrono::Utc>>(row, index, type_name)?.to_rfc3339(),
        ),

        "UUID" => Value::String(decode::<sqlx::types::Uuid>(row, index, type_name)?.to_string()),
        "JSON" | "JSONB" => {
            Value::String(decode::<serde_json::Value>(row, index, type_name)?.to_string())
        }

        "BYTEA" => Value::Bytes(decode(row, index, type_name)?),

        // Text-like types; anything else without an arm is reported
        _ => Value::String(decode(row, index, type_name)?),
    };
    Ok(value)
}

fn decode<'r, T>(row: &'r PgRow, index: usize, type_name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<T, _>(index).map_err(|e| {
        let name = row.columns().get(index).map_or("?", |c| c.name());
        InsightsError::statement(format!(
            "cannot decode column {name} of type {type_name}: {e}"
        ))
    })
}

/// Widens through the shortest decimal text, so a REAL 4.7 stays 4.7
/// instead of 4.699999809265137.
fn widen_f32(v: f32) -> f64 {
    v.to_string().parse().unwrap_or(f64::from(v))
}

/// Whole decimals become integers, the rest floats; anything out of range
/// keeps its exact text.
fn decimal_to_value(d: Decimal) -> Value {
    if d.fract().is_zero() {
        if let Some(i) = d.to_i64() {
            return Value::Int(i);
        }
    }
    d.to_f64()
        .map(Value::Float)
        .unwrap_or_else(|| Value::String(d.to_string()))
}

/// Maps pool acquisition errors to user-friendly connection messages.
fn map_connection_error(error: sqlx::Error, display: &str) -> InsightsError {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        InsightsError::connection(format!(
            "Cannot connect to {display}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        InsightsError::connection(format!(
            "Authentication failed for {display}. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        InsightsError::connection(format!("Database for {display} does not exist."))
    } else if matches!(error, sqlx::Error::PoolTimedOut) {
        InsightsError::connection(format!(
            "Connection to {display} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        InsightsError::connection(error.to_string())
    }
}
