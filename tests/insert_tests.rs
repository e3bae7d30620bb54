use std::path::Path;

use sqlite_tasks::{Database, InsertRequest, LookupRequest, Value};
use tempfile::TempDir;

fn insert(json: serde_json::Value) -> InsertRequest {
    serde_json::from_value(json).unwrap()
}

fn rows_of(db_path: &Path, table: &str) -> Vec<sqlite_tasks::Row> {
    serde_json::from_value::<LookupRequest>(serde_json::json!({
        "db_path": db_path,
        "table": table
    }))
    .unwrap()
    .run()
    .unwrap()
}

#[test]
fn insert_creates_table_and_infers_types() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cats.db");

    let result = insert(serde_json::json!({
        "db_path": db_path,
        "table": "cats",
        "records": [
            {"id": 1, "name": "Whiskers", "weight": 4.2},
            {"id": 2, "name": "Fluffy", "weight": 5.0}
        ],
        "pk": "id"
    }))
    .run()
    .unwrap();
    assert!(result.changed);
    assert_eq!(result.rows_affected, Some(2));

    let db = Database::open_existing(&db_path).unwrap();
    assert_eq!(db.columns_of("cats").unwrap(), vec!["id", "name", "weight"]);
    let weight_type: String = db
        .conn()
        .query_row(
            "SELECT type FROM pragma_table_info('cats') WHERE name = 'weight'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(weight_type, "REAL");
}

#[test]
fn single_record_mapping_is_accepted() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cats.db");

    let result = insert(serde_json::json!({
        "db_path": db_path,
        "table": "cats",
        "records": {"id": 1, "name": "Whiskers"},
        "pk": "id"
    }))
    .run()
    .unwrap();
    assert_eq!(result.rows_affected, Some(1));
    assert_eq!(rows_of(&db_path, "cats").len(), 1);
}

#[test]
fn duplicate_pk_fails_then_replace_updates_in_place() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cats.db");

    insert(serde_json::json!({
        "db_path": db_path,
        "table": "cats",
        "records": {"id": 1, "name": "Whiskers"},
        "pk": "id"
    }))
    .run()
    .unwrap();

    // The documented catch-and-retry idiom: match on the engine text,
    // then retry with replace.
    let err = insert(serde_json::json!({
        "db_path": db_path,
        "table": "cats",
        "records": {"id": 1, "name": "Impostor"}
    }))
    .run()
    .unwrap_err();
    assert!(err.to_string().contains("UNIQUE constraint failed"));
    assert!(err.is_constraint_violation());

    let result = insert(serde_json::json!({
        "db_path": db_path,
        "table": "cats",
        "records": {"id": 1, "name": "Impostor"},
        "replace": true
    }))
    .run()
    .unwrap();
    assert!(result.changed);

    let rows = rows_of(&db_path, "cats");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], Value::Text("Impostor".to_string()));
}

#[test]
fn ignore_skips_conflicting_rows() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cats.db");

    insert(serde_json::json!({
        "db_path": db_path,
        "table": "cats",
        "records": {"id": 1, "name": "Whiskers"},
        "pk": "id"
    }))
    .run()
    .unwrap();

    let result = insert(serde_json::json!({
        "db_path": db_path,
        "table": "cats",
        "records": [
            {"id": 1, "name": "Impostor"},
            {"id": 2, "name": "Fluffy"}
        ],
        "ignore": true
    }))
    .run()
    .unwrap();
    assert_eq!(result.rows_affected, Some(1));

    let rows = rows_of(&db_path, "cats");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], Value::Text("Whiskers".to_string()));
}

#[test]
fn alter_adds_missing_columns() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cats.db");

    insert(serde_json::json!({
        "db_path": db_path,
        "table": "cats",
        "records": {"id": 1, "name": "Whiskers"},
        "pk": "id"
    }))
    .run()
    .unwrap();

    insert(serde_json::json!({
        "db_path": db_path,
        "table": "cats",
        "records": {"id": 2, "name": "Fluffy", "breed": "Persian"},
        "alter": true
    }))
    .run()
    .unwrap();

    let db = Database::open_existing(&db_path).unwrap();
    assert_eq!(db.columns_of("cats").unwrap(), vec!["id", "name", "breed"]);
    let rows = rows_of(&db_path, "cats");
    assert_eq!(rows[0]["breed"], Value::Null);
    assert_eq!(rows[1]["breed"], Value::Text("Persian".to_string()));
}

#[test]
fn unknown_column_without_alter_surfaces_engine_message() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cats.db");

    insert(serde_json::json!({
        "db_path": db_path,
        "table": "cats",
        "records": {"id": 1, "name": "Whiskers"}
    }))
    .run()
    .unwrap();

    let err = insert(serde_json::json!({
        "db_path": db_path,
        "table": "cats",
        "records": {"id": 2, "breed": "Persian"}
    }))
    .run()
    .unwrap_err();
    assert!(err.to_string().contains("no column named"));
}

#[test]
fn array_and_object_values_are_stored_as_json_text() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cats.db");

    let result = insert(serde_json::json!({
        "db_path": db_path,
        "table": "cats",
        "records": {
            "id": 1,
            "tags": [1, 2],
            "meta": {"breed": "Tabby", "age": 5}
        },
        "pk": "id"
    }))
    .run()
    .unwrap();
    assert_eq!(result.rows_affected, Some(1));

    let rows = rows_of(&db_path, "cats");
    assert_eq!(rows[0]["tags"], Value::Text("[1,2]".to_string()));
    assert_eq!(
        rows[0]["meta"],
        Value::Text(r#"{"breed":"Tabby","age":5}"#.to_string())
    );
}

#[test]
fn failed_insert_persists_no_partial_rows() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cats.db");

    // Large batch with a conflicting pk near the end: nothing from the
    // request may survive the rollback.
    let mut records: Vec<serde_json::Value> =
        (0..150).map(|id| serde_json::json!({"id": id, "name": format!("cat {id}")})).collect();
    records.push(serde_json::json!({"id": 0, "name": "dup"}));

    let err = insert(serde_json::json!({
        "db_path": db_path,
        "table": "cats",
        "records": records,
        "pk": "id"
    }))
    .run()
    .unwrap_err();
    assert!(err.is_constraint_violation());
    assert_eq!(rows_of(&db_path, "cats").len(), 0);
}

#[test]
fn empty_record_list_is_a_noop() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cats.db");

    let result = insert(serde_json::json!({
        "db_path": db_path,
        "table": "cats",
        "records": []
    }))
    .run()
    .unwrap();
    assert!(!result.changed);
    assert_eq!(result.rows_affected, Some(0));
}
