//! Ordered schema steps and their executor.
//!
//! # Invariants
//! - Step numbers start at 1 and increase by exactly one.
//! - Each step commits together with its `PRAGMA user_version` bump, so a
//!   failed step leaves the database at the previous step.
//! - Catalog seed rows (departments, statuses) are inserted in id order; tag
//!   creation for new projects relies on that order.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;

/// `(step, sql)` pairs, applied in order.
const STEPS: &[(u32, &str)] = &[
    (1, include_str!("0001_init.sql")),
    (2, include_str!("0002_catalog_seed.sql")),
];

/// Schema step this build migrates up to.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |(version, _)| *version)
}

/// Reads the schema step recorded on the connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}

/// Steps not yet applied on `conn`, in application order.
pub fn pending_versions(conn: &Connection) -> DbResult<Vec<u32>> {
    let found = current_user_version(conn)?;
    ensure_not_ahead(found)?;
    Ok(STEPS
        .iter()
        .map(|(version, _)| *version)
        .filter(|version| *version > found)
        .collect())
}

/// Applies every pending step, one transaction per step.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = current_user_version(conn)?;
    ensure_not_ahead(found)?;

    for (version, sql) in STEPS.iter().filter(|(version, _)| *version > found) {
        apply_step(conn, *version, sql).map_err(|source| {
            error!("event=db_migrate module=db status=error version={version} error={source}");
            DbError::Migration {
                version: *version,
                source,
            }
        })?;
        info!("event=db_migrate module=db status=ok version={version}");
    }
    Ok(())
}

fn apply_step(conn: &mut Connection, version: u32, sql: &str) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(sql)?;
    tx.pragma_update(None, "user_version", version)?;
    tx.commit()
}

fn ensure_not_ahead(found: u32) -> DbResult<()> {
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaAhead { found, supported });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, current_user_version, latest_version, pending_versions, STEPS};
    use rusqlite::Connection;

    #[test]
    fn steps_are_contiguous_from_one() {
        for (index, (version, _)) in STEPS.iter().enumerate() {
            assert_eq!(*version as usize, index + 1);
        }
    }

    #[test]
    fn pending_versions_shrink_to_nothing_after_apply() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(pending_versions(&conn).unwrap(), vec![1, 2]);

        apply_migrations(&mut conn).unwrap();
        assert!(pending_versions(&conn).unwrap().is_empty());
        assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    }

    #[test]
    fn partially_migrated_database_resumes_from_its_step() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(STEPS[0].1).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();

        assert_eq!(pending_versions(&conn).unwrap(), vec![2]);
        apply_migrations(&mut conn).unwrap();

        let statuses: i64 = conn
            .query_row("SELECT COUNT(*) FROM statuses;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(statuses, 6);
    }
}
