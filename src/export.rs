//! CSV export of query results.
//!
//! Writes RFC 4180 delimited text with a header row matching the result's
//! columns, and reads the same format back.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::db::{ColumnInfo, Row, Value};
use crate::error::{InsightsError, Result};
use crate::query::ExecutionResult;

/// Renders columns and rows as CSV text.
///
/// NULL becomes an empty field; every line ends with `\n`.
pub fn to_csv(columns: &[ColumnInfo], rows: &[Row]) -> String {
    let mut out = String::new();
    write_record(&mut out, columns.iter().map(|c| c.name.as_str()));
    for row in rows {
        let cells: Vec<String> = row.iter().map(csv_cell).collect();
        write_record(&mut out, cells.iter().map(String::as_str));
    }
    out
}

/// Renders a `Success` result as CSV. Other outcomes have nothing to export.
pub fn result_to_csv(result: &ExecutionResult) -> Result<String> {
    match result {
        ExecutionResult::Success { columns, rows, .. } => Ok(to_csv(columns, rows)),
        other => Err(InsightsError::export(format!(
            "Only successful results can be exported (status: {})",
            other.status()
        ))),
    }
}

/// Builds `<prefix>_<id>_<YYYYmmdd_HHMMSS>.csv`.
pub fn export_file_name(prefix: &str, query_id: u32, timestamp: DateTime<Local>) -> String {
    format!(
        "{prefix}_{query_id}_{}.csv",
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

/// Writes a `Success` result to a timestamped file in `directory`.
pub fn write_export(
    directory: &Path,
    prefix: &str,
    query_id: u32,
    result: &ExecutionResult,
) -> Result<PathBuf> {
    let csv = result_to_csv(result)?;

    std::fs::create_dir_all(directory).map_err(|e| {
        InsightsError::export(format!("Cannot create {}: {e}", directory.display()))
    })?;

    let path = directory.join(export_file_name(prefix, query_id, Local::now()));
    std::fs::write(&path, csv)
        .map_err(|e| InsightsError::export(format!("Cannot write {}: {e}", path.display())))?;

    info!("Exported query {} to {}", query_id, path.display());
    Ok(path)
}

/// Parses CSV text into a header and records of raw strings.
pub fn parse_csv(text: &str) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_started = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                field_started = true;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                field_started = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
                field_started = false;
            }
            _ => {
                field.push(c);
                field_started = true;
            }
        }
    }

    if in_quotes {
        return Err(InsightsError::export("Unterminated quoted field"));
    }
    if field_started || !field.is_empty() {
        record.push(field);
        records.push(record);
    }

    let mut records = records.into_iter();
    let header = records
        .next()
        .ok_or_else(|| InsightsError::export("CSV has no header row"))?;
    Ok((header, records.collect()))
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bytes(bytes) => bytes.iter().map(|b| format!("{b:02x}")).collect(),
        other => other.to_display_string(),
    }
}

fn write_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}
