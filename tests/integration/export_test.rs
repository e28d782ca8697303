//! CSV export of real query results.

use super::common::{empty_store, seeded_store};
use pretty_assertions::assert_eq;
use ride_insights::app::{App, OutputFormat};
use ride_insights::catalog::Catalog;
use ride_insights::config::ExportConfig;
use ride_insights::export::{parse_csv, write_export};
use ride_insights::query::{ExecutionStatus, QueryExecutor};

fn export_config(dir: &std::path::Path) -> ExportConfig {
    ExportConfig {
        directory: dir.to_path_buf(),
        file_prefix: "ola_query".to_string(),
    }
}

#[tokio::test]
async fn test_exported_csv_matches_result() {
    let store = seeded_store().await;
    let catalog = Catalog::builtin().unwrap();
    let result = QueryExecutor::new(store.provider.as_ref())
        .run(catalog.get(10).unwrap())
        .await;
    assert_eq!(result.status(), ExecutionStatus::Success);

    let dir = tempfile::tempdir().unwrap();
    let path = write_export(dir.path(), "ola_query", 10, &result).unwrap();

    let file_name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("ola_query_10_"), "{file_name}");
    assert!(file_name.ends_with(".csv"));

    let (header, records) = parse_csv(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(header, result.column_names());

    let expected: Vec<Vec<String>> = result
        .rows()
        .unwrap()
        .iter()
        .map(|row| row.iter().map(|v| v.to_display_string()).collect())
        .collect();
    assert_eq!(records, expected);
}

#[tokio::test]
async fn test_null_cells_export_as_empty_fields() {
    let store = seeded_store().await;
    let catalog = Catalog::builtin().unwrap();
    let result = QueryExecutor::new(store.provider.as_ref())
        .run(catalog.get(1).unwrap())
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = write_export(dir.path(), "ola_query", 1, &result).unwrap();
    let (header, records) = parse_csv(&std::fs::read_to_string(&path).unwrap()).unwrap();

    let reason = header
        .iter()
        .position(|h| h == "Incomplete_Rides_Reason")
        .unwrap();
    assert_eq!(records.len(), 10);
    assert_eq!(records[0][reason], "");
    assert!(records
        .iter()
        .any(|record| record[reason] == "Vehicle Breakdown"));
}

#[tokio::test]
async fn test_app_export_through_run() {
    let store = seeded_store().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::new(Catalog::builtin().unwrap(), export_config(dir.path()));

    let output = app
        .run(store.provider.as_ref(), 4, OutputFormat::Json, true)
        .await
        .unwrap();

    let path = output.exported.unwrap();
    assert!(path.starts_with(dir.path()));
    let (header, records) = parse_csv(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(header, vec!["Customer_ID", "total_rides"]);
    assert_eq!(records[0], vec!["CID001", "5"]);
    assert_eq!(records.len(), 5);

    let json: serde_json::Value = serde_json::from_str(output.text.trim()).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["rows"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_empty_result_is_not_exported() {
    let store = empty_store().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::new(Catalog::builtin().unwrap(), export_config(dir.path()));

    let output = app
        .run(store.provider.as_ref(), 10, OutputFormat::Text, true)
        .await
        .unwrap();

    assert_eq!(output.status, ExecutionStatus::EmptyResult);
    assert!(output.exported.is_none());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
