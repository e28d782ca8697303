//! Query execution against a real SQLite store.

use super::common::{empty_store, seeded_store, sqlite_config};
use pretty_assertions::assert_eq;
use ride_insights::app::{App, OutputFormat};
use ride_insights::catalog::{Catalog, QueryDefinition};
use ride_insights::config::{DatabaseConfig, ExportConfig};
use ride_insights::db::{self, Value};
use ride_insights::query::{ExecutionResult, ExecutionStatus, FailureKind, QueryExecutor};

fn builtin(id: u32) -> QueryDefinition {
    Catalog::builtin().unwrap().get(id).unwrap().clone()
}

fn ad_hoc(statement: &str) -> QueryDefinition {
    QueryDefinition {
        id: 99,
        title: "Ad hoc".to_string(),
        description: "Test statement".to_string(),
        statement: statement.to_string(),
    }
}

#[tokio::test]
async fn test_top_customers_returns_five_rows_descending() {
    let store = seeded_store().await;
    let result = QueryExecutor::new(store.provider.as_ref())
        .run(&builtin(4))
        .await;

    assert_eq!(result.status(), ExecutionStatus::Success);
    assert_eq!(result.column_names(), vec!["Customer_ID", "total_rides"]);
    assert_eq!(result.row_count(), 5);
    assert!(result.elapsed_ms() > 0.0);

    let counts: Vec<i64> = result
        .records()
        .map(|r| match r.get("total_rides") {
            Some(Value::Int(n)) => *n,
            other => panic!("Expected Int for total_rides, got {:?}", other),
        })
        .collect();
    assert_eq!(counts, vec![5, 4, 3, 2, 2]);

    let first = result.records().next().unwrap();
    assert_eq!(first.get("Customer_ID"), Some(&Value::from("CID001")));
    assert!(result
        .records()
        .all(|r| r.get("Customer_ID") != Some(&Value::from("CID006"))));
}

#[tokio::test]
async fn test_aggregates_over_fixture() {
    let store = seeded_store().await;
    let executor = QueryExecutor::new(store.provider.as_ref());

    let cancelled = executor.run(&builtin(3)).await;
    assert_eq!(
        cancelled.rows().unwrap(),
        &[vec![Value::Int(3)]][..],
        "cancelled by customer"
    );

    let driver_issues = executor.run(&builtin(5)).await;
    assert_eq!(driver_issues.rows().unwrap(), &[vec![Value::Int(2)]][..]);

    let ratings = executor.run(&builtin(6)).await;
    assert_eq!(ratings.column_names(), vec!["max_rating", "min_rating"]);
    assert_eq!(
        ratings.rows().unwrap(),
        &[vec![Value::Float(4.7), Value::Float(3.6)]][..]
    );

    let revenue = executor.run(&builtin(9)).await;
    assert_eq!(revenue.rows().unwrap(), &[vec![Value::Int(3470)]][..]);
}

#[tokio::test]
async fn test_row_listings_over_fixture() {
    let store = seeded_store().await;
    let executor = QueryExecutor::new(store.provider.as_ref());

    let successful = executor.run(&builtin(1)).await;
    assert_eq!(successful.row_count(), 10);
    assert_eq!(successful.column_count(), 17);
    assert!(successful
        .records()
        .all(|r| r.get("Booking_Status") == Some(&Value::from("Success"))));

    let upi = executor.run(&builtin(7)).await;
    assert_eq!(upi.row_count(), 5);

    let incomplete = executor.run(&builtin(10)).await;
    assert_eq!(
        incomplete.column_names(),
        vec![
            "Booking_ID",
            "Customer_ID",
            "Vehicle_Type",
            "Incomplete_Rides_Reason"
        ]
    );
    let reasons: Vec<&Value> = incomplete
        .records()
        .filter_map(|r| r.get("Incomplete_Rides_Reason"))
        .collect();
    assert_eq!(
        reasons,
        vec![
            &Value::from("Vehicle Breakdown"),
            &Value::from("Customer Demand")
        ]
    );
}

#[tokio::test]
async fn test_grouped_averages_are_ordered() {
    let store = seeded_store().await;
    let executor = QueryExecutor::new(store.provider.as_ref());

    let distance = executor.run(&builtin(2)).await;
    assert_eq!(distance.row_count(), 6);
    let first = distance.records().next().unwrap();
    assert_eq!(first.get("Vehicle_Type"), Some(&Value::from("Prime SUV")));
    assert_eq!(first.get("avg_distance"), Some(&Value::Float(31.0)));

    let rating = executor.run(&builtin(8)).await;
    let vehicles: Vec<String> = rating
        .records()
        .map(|r| r.get("Vehicle_Type").unwrap().to_display_string())
        .collect();
    assert_eq!(
        vehicles,
        vec!["Prime SUV", "eBike", "Bike", "Prime Sedan", "Mini", "Auto"]
    );
}

#[tokio::test]
async fn test_no_matching_rows_is_empty_result_with_columns() {
    let store = empty_store().await;
    let result = QueryExecutor::new(store.provider.as_ref())
        .run(&builtin(10))
        .await;

    match &result {
        ExecutionResult::EmptyResult {
            columns,
            elapsed_ms,
        } => {
            assert_eq!(columns.len(), 4);
            assert_eq!(columns[0].name, "Booking_ID");
            assert!(*elapsed_ms > 0.0);
        }
        other => panic!("Expected EmptyResult, got {:?}", other),
    }
    assert_eq!(result.row_count(), 0);
}

#[tokio::test]
async fn test_aggregate_over_empty_table_still_succeeds() {
    let store = empty_store().await;
    let result = QueryExecutor::new(store.provider.as_ref())
        .run(&builtin(9))
        .await;

    // SUM over no rows is a single NULL row, not an empty result
    assert_eq!(result.status(), ExecutionStatus::Success);
    assert_eq!(result.rows().unwrap(), &[vec![Value::Null]][..]);
}

#[tokio::test]
async fn test_statement_error_does_not_affect_next_run() {
    let store = seeded_store().await;
    let executor = QueryExecutor::new(store.provider.as_ref());

    let failed = executor
        .run(&ad_hoc("SELECT * FROM ola_bookings;"))
        .await;
    match &failed {
        ExecutionResult::Failure {
            kind,
            error_message,
        } => {
            assert_eq!(*kind, FailureKind::Statement);
            assert!(error_message.contains("ola_bookings"), "{error_message}");
        }
        other => panic!("Expected Failure, got {:?}", other),
    }
    assert_eq!(failed.elapsed_ms(), 0.0);

    let next = executor.run(&builtin(3)).await;
    assert_eq!(next.status(), ExecutionStatus::Success);
}

#[tokio::test]
async fn test_unreachable_store_is_connection_failure() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-dir").join("rides.db");
    let config = DatabaseConfig::with_url(format!("sqlite://{}", missing.display()));
    let provider = db::connect(&config).unwrap();

    let result = QueryExecutor::new(provider.as_ref())
        .run(&builtin(1))
        .await;

    match &result {
        ExecutionResult::Failure {
            kind,
            error_message,
        } => {
            assert_eq!(*kind, FailureKind::Connection);
            assert!(!error_message.is_empty());
        }
        other => panic!("Expected Failure, got {:?}", other),
    }
    assert_eq!(result.elapsed_ms(), 0.0);
}

#[tokio::test]
async fn test_seed_rejects_broken_script() {
    let dir = tempfile::tempdir().unwrap();
    let provider = db::connect(&sqlite_config(dir.path())).unwrap();

    let result = db::seed(provider.as_ref(), "CREATE TABLE ola_rides (;").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_run_all_against_fixture() {
    let store = seeded_store().await;
    let app = App::new(Catalog::builtin().unwrap(), ExportConfig::default());

    let output = app
        .run_all(store.provider.as_ref(), OutputFormat::Text)
        .await
        .unwrap();

    assert_eq!(output.successful_runs, 10);
    assert_eq!(output.failed_runs, 0);
    assert!(output
        .text
        .ends_with("Total Queries: 10\nSuccessful Runs: 10\n"));
}

#[tokio::test]
async fn test_run_all_json_against_missing_table() {
    let dir = tempfile::tempdir().unwrap();
    let provider = db::connect(&sqlite_config(dir.path())).unwrap();
    let app = App::new(Catalog::builtin().unwrap(), ExportConfig::default());

    let output = app
        .run_all(provider.as_ref(), OutputFormat::Json)
        .await
        .unwrap();

    assert_eq!(output.failed_runs, 10);
    let lines: Vec<serde_json::Value> = output
        .text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 10);
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line["query_id"], i as u64 + 1);
        assert_eq!(line["status"], "failure");
        assert_eq!(line["kind"], "statement");
    }
}
