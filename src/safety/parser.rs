//! SQL parsing and read-only classification.
//!
//! Uses sqlparser-rs with the generic dialect, since catalog statements may
//! target any supported backend.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use super::Verdict;

/// Classifies a statement's text.
pub fn classify_statement(sql: &str) -> Verdict {
    let statements = match Parser::parse_sql(&GenericDialect {}, sql) {
        Ok(statements) => statements,
        Err(e) => return Verdict::Unparsable(e.to_string()),
    };

    match statements.as_slice() {
        [] => Verdict::Unparsable("empty statement".to_string()),
        [statement] => classify(statement),
        many => Verdict::MultipleStatements(many.len()),
    }
}

fn classify(statement: &Statement) -> Verdict {
    match statement {
        Statement::Query(query) if query_is_read_only(query) => Verdict::ReadOnly,
        Statement::Query(_) => Verdict::Mutating("data-modifying query".to_string()),
        Statement::Explain {
            analyze: false, ..
        } => Verdict::ReadOnly,
        Statement::Insert(_) => Verdict::Mutating("INSERT".to_string()),
        Statement::Update { .. } => Verdict::Mutating("UPDATE".to_string()),
        Statement::Delete(_) => Verdict::Mutating("DELETE".to_string()),
        Statement::Drop { .. } => Verdict::Mutating("DROP".to_string()),
        Statement::Truncate { .. } => Verdict::Mutating("TRUNCATE".to_string()),
        Statement::AlterTable { .. } => Verdict::Mutating("ALTER".to_string()),
        Statement::CreateTable { .. } => Verdict::Mutating("CREATE".to_string()),
        _ => Verdict::Mutating("non-query statement".to_string()),
    }
}

/// Recursively checks CTEs, set operations and derived tables.
fn query_is_read_only(query: &Query) -> bool {
    let ctes_read_only = query
        .with
        .as_ref()
        .map_or(true, |with| with.cte_tables.iter().all(|cte| query_is_read_only(&cte.query)));

    ctes_read_only && set_expr_is_read_only(&query.body)
}

fn set_expr_is_read_only(set_expr: &SetExpr) -> bool {
    match set_expr {
        SetExpr::Select(select) => select_is_read_only(select),
        SetExpr::Query(query) => query_is_read_only(query),
        SetExpr::SetOperation { left, right, .. } => {
            set_expr_is_read_only(left) && set_expr_is_read_only(right)
        }
        SetExpr::Values(_) | SetExpr::Table(_) => true,
        // INSERT/UPDATE/DELETE bodies inside CTEs
        _ => false,
    }
}

fn select_is_read_only(select: &Select) -> bool {
    // SELECT ... INTO creates a table
    select.into.is_none() && select.from.iter().all(table_with_joins_is_read_only)
}

fn table_with_joins_is_read_only(twj: &TableWithJoins) -> bool {
    table_factor_is_read_only(&twj.relation)
        && twj
            .joins
            .iter()
            .all(|join| table_factor_is_read_only(&join.relation))
}

fn table_factor_is_read_only(factor: &TableFactor) -> bool {
    match factor {
        TableFactor::Derived { subquery, .. } => query_is_read_only(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => table_with_joins_is_read_only(table_with_joins),
        _ => true,
    }
}
