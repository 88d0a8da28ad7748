use crewboard_core::db::migrations::{current_user_version, latest_version, pending_versions};
use crewboard_core::db::{open_db, open_db_in_memory, DbError};
use crewboard_core::{RepoError, SqliteEntityStore};
use rusqlite::Connection;

const DIRECTORY_TABLES: [&str; 9] = [
    "employees",
    "departments",
    "employee_departments",
    "statuses",
    "projects",
    "tasks",
    "task_assignees",
    "task_dependencies",
    "assets",
];

#[test]
fn fresh_memory_database_has_every_directory_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    assert!(pending_versions(&conn).unwrap().is_empty());

    let present: Vec<String> = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name;")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    for table in DIRECTORY_TABLES {
        assert!(present.iter().any(|name| name == table), "missing table {table}");
    }
}

#[test]
fn reopening_a_file_does_not_duplicate_catalog_seed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crewboard.db");

    drop(open_db(&path).unwrap());
    let conn = open_db(&path).unwrap();

    let count = |table: &str| -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
            .unwrap()
    };
    assert_eq!(count("departments"), 7);
    assert_eq!(count("statuses"), 6);

    let (complete_id, complete_emoji): (i64, String) = conn
        .query_row(
            "SELECT id, emoji FROM statuses WHERE name = 'Complete';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(complete_id, 6);
    assert_eq!(complete_emoji, "✅");
}

#[test]
fn database_from_a_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    Connection::open(&path)
        .unwrap()
        .pragma_update(None, "user_version", 999)
        .unwrap();

    match open_db(&path) {
        Err(DbError::SchemaAhead { found, supported }) => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("newer schema must be refused"),
    }
}

#[test]
fn broken_step_is_rolled_back_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clash.db");
    // A pre-existing `employees` table with an incompatible shape makes step 1 fail.
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE employees (unrelated TEXT);")
        .unwrap();

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::Migration { version: 1, .. }));
    assert_eq!(err.code(), "db_migration_failed");

    let conn = Connection::open(&path).unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), 0);
}

#[test]
fn entity_store_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    match SqliteEntityStore::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        }) => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection must be rejected"),
    }
}
