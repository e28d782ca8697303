//! Advisory read-only audit for catalog statements.
//!
//! Parses each statement with sqlparser and flags anything that is not a
//! single read-only query. Findings are reported, never enforced: the
//! executor sends statements to the backing store verbatim.

mod parser;

pub use parser::classify_statement;

use crate::catalog::Catalog;
use std::fmt;

/// How a statement was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A single query that reads data only.
    ReadOnly,
    /// A statement that writes data or changes schema (e.g. "DELETE").
    Mutating(String),
    /// More than one statement in the text.
    MultipleStatements(usize),
    /// The text could not be parsed.
    Unparsable(String),
}

impl Verdict {
    /// Returns true for a single read-only query.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "read-only"),
            Self::Mutating(kind) => write!(f, "modifies data ({kind})"),
            Self::MultipleStatements(n) => write!(f, "contains {n} statements"),
            Self::Unparsable(msg) => write!(f, "could not be parsed: {msg}"),
        }
    }
}

/// A catalog entry whose statement is not a single read-only query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditFinding {
    pub query_id: u32,
    pub title: String,
    pub verdict: Verdict,
}

impl fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} ({}) {}", self.query_id, self.title, self.verdict)
    }
}

/// Audits every catalog entry, returning findings in catalog order.
pub fn audit_catalog(catalog: &Catalog) -> Vec<AuditFinding> {
    catalog
        .iter()
        .filter_map(|def| {
            let verdict = classify_statement(&def.statement);
            (!verdict.is_read_only()).then(|| AuditFinding {
                query_id: def.id,
                title: def.title.clone(),
                verdict,
            })
        })
        .collect()
}
