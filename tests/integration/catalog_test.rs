//! Catalog loading and lookup tests.

use ride_insights::catalog::Catalog;
use ride_insights::error::InsightsError;
use std::io::Write;

#[test]
fn test_builtin_catalog_is_complete_and_ordered() {
    let catalog = Catalog::builtin().unwrap();

    let ids: Vec<u32> = catalog.list_all().iter().map(|d| d.id).collect();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());

    for def in &catalog {
        assert!(!def.title.trim().is_empty());
        assert!(!def.description.trim().is_empty());
        assert!(def.statement.contains("ola_rides"));
    }
}

#[test]
fn test_lookup_unknown_id() {
    let catalog = Catalog::builtin().unwrap();

    assert_eq!(
        catalog.get(4).unwrap().title,
        "Top 5 Customers by Number of Rides"
    );
    for id in [0, 11, 99] {
        assert!(matches!(catalog.get(id), Err(InsightsError::NotFound(n)) if n == id));
    }
}

#[test]
fn test_catalog_file_replaces_builtin() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[[query]]
id = 20
title = "Rides per Day"
description = "Count bookings per calendar day."
statement = "SELECT Date, COUNT(*) AS rides FROM ola_rides GROUP BY Date ORDER BY Date;"

[[query]]
id = 3
title = "Distinct Customers"
description = "Count distinct customers."
statement = "SELECT COUNT(DISTINCT Customer_ID) AS customers FROM ola_rides;"
"#
    )
    .unwrap();

    let catalog = Catalog::load_from_file(file.path()).unwrap();

    let ids: Vec<u32> = catalog.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![3, 20]);
    assert!(catalog.get(1).is_err());
}

#[test]
fn test_catalog_file_with_duplicate_ids_rejected() {
    let content = r#"
[[query]]
id = 1
title = "A"
description = "a"
statement = "SELECT 1;"

[[query]]
id = 1
title = "B"
description = "b"
statement = "SELECT 2;"
"#;

    let err = Catalog::from_toml(content).unwrap_err();
    assert!(matches!(err, InsightsError::Catalog(_)));
}

#[test]
fn test_missing_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Catalog::load_from_file(&dir.path().join("nope.toml"));
    assert!(result.is_err());
}
