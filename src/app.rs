//! Command handlers behind the CLI.
//!
//! Each handler only reads the catalog, runs definitions through the
//! executor and renders what comes back. All output is returned as text so
//! the handlers can be tested without a terminal.

use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;

use crate::catalog::{Catalog, QueryDefinition};
use crate::config::ExportConfig;
use crate::db::ConnectionProvider;
use crate::error::{InsightsError, Result};
use crate::export;
use crate::query::{ExecutionResult, ExecutionStatus, QueryExecutor};
use crate::render;
use crate::safety::audit_catalog;

/// Output format for query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Summary plus aligned table.
    #[default]
    Text,
    /// One JSON document per run.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// What a single `run` produced.
#[derive(Debug)]
pub struct RunOutput {
    pub text: String,
    pub status: ExecutionStatus,
    pub exported: Option<PathBuf>,
}

/// What `run-all` produced.
#[derive(Debug)]
pub struct RunAllOutput {
    pub text: String,
    pub successful_runs: usize,
    pub failed_runs: usize,
}

#[derive(Serialize)]
struct RunRecord<'a> {
    query_id: u32,
    title: &'a str,
    #[serde(flatten)]
    result: &'a ExecutionResult,
}

/// The application: an immutable catalog plus export settings.
pub struct App {
    catalog: Catalog,
    export: ExportConfig,
}

impl App {
    /// Creates the application, logging any catalog audit findings.
    pub fn new(catalog: Catalog, export: ExportConfig) -> Self {
        for finding in audit_catalog(&catalog) {
            warn!("Catalog audit: {finding}");
        }
        Self { catalog, export }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Lists every query.
    pub fn list(&self) -> String {
        let mut out = render::render_catalog(&self.catalog);
        out.push_str(&format!("\nTotal Queries: {}\n", self.catalog.len()));
        out
    }

    /// Shows one query including its statement.
    pub fn show(&self, id: u32) -> Result<String> {
        self.catalog.get(id).map(render::render_definition)
    }

    /// Audits the catalog; returns the report and the number of findings.
    pub fn check(&self) -> (String, usize) {
        let findings = audit_catalog(&self.catalog);
        if findings.is_empty() {
            return (
                format!("All {} queries are read-only.\n", self.catalog.len()),
                0,
            );
        }

        let mut out = String::new();
        for finding in &findings {
            out.push_str(&format!("{finding}\n"));
        }
        (out, findings.len())
    }

    /// Runs one query and optionally exports a successful result.
    ///
    /// Fails only for an unknown id or an export error; query faults are
    /// part of the rendered output.
    pub async fn run(
        &self,
        provider: &dyn ConnectionProvider,
        id: u32,
        format: OutputFormat,
        export: bool,
    ) -> Result<RunOutput> {
        let def = self.catalog.get(id)?;
        let result = QueryExecutor::new(provider).run(def).await;

        let mut text = self.render(def, &result, format)?;
        let exported = if export && result.status() == ExecutionStatus::Success {
            let path =
                export::write_export(&self.export.directory, &self.export.file_prefix, id, &result)?;
            if format == OutputFormat::Text {
                text.push_str(&format!("\nResults exported to {}\n", path.display()));
            }
            Some(path)
        } else {
            None
        };

        Ok(RunOutput {
            text,
            status: result.status(),
            exported,
        })
    }

    /// Runs every query in catalog order, each as an independent attempt.
    pub async fn run_all(
        &self,
        provider: &dyn ConnectionProvider,
        format: OutputFormat,
    ) -> Result<RunAllOutput> {
        let executor = QueryExecutor::new(provider);
        let mut text = String::new();
        let mut successful_runs = 0;
        let mut failed_runs = 0;

        for def in &self.catalog {
            let result = executor.run(def).await;
            match result.status() {
                ExecutionStatus::Failure => failed_runs += 1,
                _ => successful_runs += 1,
            }
            text.push_str(&self.render(def, &result, format)?);
            if format == OutputFormat::Text {
                text.push_str("\n---\n\n");
            }
        }

        if format == OutputFormat::Text {
            text.push_str(&format!(
                "Total Queries: {}\nSuccessful Runs: {successful_runs}\n",
                self.catalog.len()
            ));
        }

        Ok(RunAllOutput {
            text,
            successful_runs,
            failed_runs,
        })
    }

    fn render(
        &self,
        def: &QueryDefinition,
        result: &ExecutionResult,
        format: OutputFormat,
    ) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(render::render_result(def, result)),
            OutputFormat::Json => {
                let record = RunRecord {
                    query_id: def.id,
                    title: &def.title,
                    result,
                };
                let json = serde_json::to_string(&record).map_err(|e| {
                    InsightsError::internal(format!("Cannot serialize result: {e}"))
                })?;
                Ok(json + "\n")
            }
        }
    }
}
