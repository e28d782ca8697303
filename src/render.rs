//! Plain-text rendering of the catalog and of query results.
//!
//! Renders results as aligned tables with auto-sized, capped columns.

use crate::catalog::{Catalog, QueryDefinition};
use crate::db::{ColumnInfo, Row};
use crate::query::ExecutionResult;

/// Maximum width for any column.
const MAX_COLUMN_WIDTH: usize = 40;

/// Minimum width for any column.
const MIN_COLUMN_WIDTH: usize = 4;

/// One line per catalog entry: id, title, description.
pub fn render_catalog(catalog: &Catalog) -> String {
    let mut out = String::new();
    for def in catalog {
        out.push_str(&format!("Q{:<3} {}\n", def.id, def.title));
        out.push_str(&format!("     {}\n", def.description));
    }
    out
}

/// Full view of one definition including its statement.
pub fn render_definition(def: &QueryDefinition) -> String {
    format!(
        "Q{}: {}\nDescription: {}\n\n{}\n",
        def.id,
        def.title,
        def.description,
        def.statement.trim()
    )
}

/// Renders the outcome of a run the way the dashboard presents it.
pub fn render_result(def: &QueryDefinition, result: &ExecutionResult) -> String {
    let heading = format!("Q{}: {}\n", def.id, def.title);

    match result {
        ExecutionResult::Success {
            columns,
            rows,
            elapsed_ms,
        } => format!(
            "{heading}Query executed in {elapsed_ms:.2} ms\n\
             Results Summary:\n  \
             Rows returned: {}\n  \
             Columns: {}\n  \
             Execution time: {elapsed_ms:.2} ms\n\n{}",
            rows.len(),
            columns.len(),
            render_table(columns, rows)
        ),
        ExecutionResult::EmptyResult { elapsed_ms, .. } => {
            format!("{heading}No data returned ({elapsed_ms:.2} ms)\n")
        }
        ExecutionResult::Failure { error_message, .. } => {
            format!("{heading}Query failed: {error_message}\n")
        }
    }
}

/// Renders rows as an aligned text table with a header separator.
pub fn render_table(columns: &[ColumnInfo], rows: &[Row]) -> String {
    let widths = column_widths(columns, rows);
    let mut out = String::new();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(col, &w)| pad(&truncate(&col.name, w), w))
        .collect();
    out.push_str(header.join(" | ").trim_end());
    out.push('\n');

    let separator: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&separator.join("-+-"));
    out.push('\n');

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(value, &w)| pad(&truncate(&value.to_display_string(), w), w))
            .collect();
        out.push_str(cells.join(" | ").trim_end());
        out.push('\n');
    }

    out
}

/// Calculates the display width for each column.
fn column_widths(columns: &[ColumnInfo], rows: &[Row]) -> Vec<usize> {
    let mut widths: Vec<usize> = columns
        .iter()
        .map(|col| col.name.chars().count().max(MIN_COLUMN_WIDTH))
        .collect();

    for row in rows {
        for (i, value) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(value.to_display_string().chars().count());
            }
        }
    }

    widths.iter().map(|&w| w.min(MAX_COLUMN_WIDTH)).collect()
}

/// Truncates a string to fit within the given width, adding ellipsis if needed.
fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let kept: String = s.chars().take(max_width - 3).collect();
        format!("{kept}...")
    }
}

fn pad(s: &str, width: usize) -> String {
    format!("{s:<width$}")
}
