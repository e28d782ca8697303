//! The fixed catalog of predefined analytical queries.
//!
//! Definitions are data, not code: the built-in set is a TOML table embedded
//! at compile time, and a replacement file can be supplied through config.
//! The catalog is built once at startup and is immutable afterwards.

use crate::error::{InsightsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// The built-in catalog definition file.
const BUILTIN_CATALOG: &str = include_str!("queries.toml");

/// One canned analytical question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDefinition {
    /// Positive, unique id; also the ordering key.
    pub id: u32,

    /// Short human-readable label.
    pub title: String,

    /// One-sentence explanation of intent.
    pub description: String,

    /// Read-only statement in the backing store's dialect.
    pub statement: String,
}

/// On-disk shape of a catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "query")]
    queries: Vec<QueryDefinition>,
}

/// Ordered, read-only collection of query definitions.
#[derive(Debug, Clone)]
pub struct Catalog {
    definitions: Vec<QueryDefinition>,
}

impl Catalog {
    /// Loads the built-in catalog.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_CATALOG)
    }

    /// Loads a catalog from a TOML file on disk.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            InsightsError::catalog(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates a catalog from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| InsightsError::catalog(format!("Invalid catalog file: {e}")))?;
        Self::from_definitions(file.queries)
    }

    /// Builds a catalog from definitions, sorted by id.
    pub fn from_definitions(mut definitions: Vec<QueryDefinition>) -> Result<Self> {
        if definitions.is_empty() {
            return Err(InsightsError::catalog("Catalog contains no queries"));
        }

        let mut seen = HashSet::new();
        for def in &definitions {
            if def.id == 0 {
                return Err(InsightsError::catalog(format!(
                    "Query '{}' has id 0; ids must be positive",
                    def.title
                )));
            }
            if !seen.insert(def.id) {
                return Err(InsightsError::catalog(format!(
                    "Duplicate query id {}",
                    def.id
                )));
            }
            if def.title.trim().is_empty() {
                return Err(InsightsError::catalog(format!(
                    "Query {} has an empty title",
                    def.id
                )));
            }
            if def.statement.trim().is_empty() {
                return Err(InsightsError::catalog(format!(
                    "Query {} has an empty statement",
                    def.id
                )));
            }
        }

        definitions.sort_by_key(|def| def.id);
        Ok(Self { definitions })
    }

    /// Returns every definition in id order.
    pub fn list_all(&self) -> &[QueryDefinition] {
        &self.definitions
    }

    /// Looks up the definition for `id`.
    pub fn get(&self, id: u32) -> Result<&QueryDefinition> {
        self.definitions
            .binary_search_by_key(&id, |def| def.id)
            .map(|index| &self.definitions[index])
            .map_err(|_| InsightsError::NotFound(id))
    }

    /// Iterates over the definitions in id order.
    pub fn iter(&self) -> std::slice::Iter<'_, QueryDefinition> {
        self.definitions.iter()
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Always false for a validated catalog.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a QueryDefinition;
    type IntoIter = std::slice::Iter<'a, QueryDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
