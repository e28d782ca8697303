//! Shared fixtures for the integration tests.

use ride_insights::config::DatabaseConfig;
use ride_insights::db::{self, ConnectionProvider};
use std::path::Path;
use tempfile::TempDir;

/// Seed script with 18 bookings across 7 customers.
pub const RIDES_FIXTURE: &str = include_str!("../../fixtures/rides.sql");

/// A seeded SQLite store living in its own temp directory.
pub struct TestStore {
    pub provider: Box<dyn ConnectionProvider>,
    // Keeps the database file alive for the duration of the test.
    _dir: TempDir,
}

/// Config for a SQLite file under `dir`, created on first open.
pub fn sqlite_config(dir: &Path) -> DatabaseConfig {
    let path = dir.join("rides.db");
    DatabaseConfig::with_url(format!("sqlite://{}?mode=rwc", path.display()))
}

/// Creates a SQLite store seeded with the ride fixture.
pub async fn seeded_store() -> TestStore {
    let dir = tempfile::tempdir().unwrap();
    let provider = db::connect(&sqlite_config(dir.path())).unwrap();
    db::seed(provider.as_ref(), RIDES_FIXTURE).await.unwrap();
    TestStore {
        provider,
        _dir: dir,
    }
}

/// Creates a store whose `ola_rides` table exists but holds no rows.
pub async fn empty_store() -> TestStore {
    let store = seeded_store().await;
    db::seed(store.provider.as_ref(), "DELETE FROM ola_rides;")
        .await
        .unwrap();
    store
}
