//! Connection bootstrap.
//!
//! Every connection handed out here has `foreign_keys=ON`, a busy timeout and
//! a fully migrated schema.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a crewboard database lives.
#[derive(Debug, Clone, Copy)]
pub enum DbTarget<'a> {
    File(&'a Path),
    Memory,
}

impl DbTarget<'_> {
    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        match self {
            Self::File(path) => Connection::open(path),
            Self::Memory => Connection::open_in_memory(),
        }
    }
}

/// Opens (creating if needed) the database file at `path`.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_target(DbTarget::File(path.as_ref()))
}

/// Opens a private in-memory database; used by tests and dry runs.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_target(DbTarget::Memory)
}

/// Connects to `target`, configures it and applies pending migrations.
///
/// # Side effects
/// - Emits one `db_open` start event and one ok/error event carrying
///   `duration_ms` and, on failure, the [`DbError::code`].
pub fn open_target(target: DbTarget<'_>) -> DbResult<Connection> {
    let mode = target.mode();
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let outcome = target
        .connect()
        .map_err(DbError::from)
        .and_then(|mut conn| configure(&mut conn).map(|()| conn));
    let elapsed_ms = started_at.elapsed().as_millis();

    match &outcome {
        Ok(_) => info!("event=db_open module=db status=ok mode={mode} duration_ms={elapsed_ms}"),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={elapsed_ms} error_code={} error={err}",
            err.code()
        ),
    }
    outcome
}

fn configure(conn: &mut Connection) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)
}

#[cfg(test)]
mod tests {
    use super::{open_target, DbTarget};

    #[test]
    fn file_target_enables_foreign_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fk.db");
        let conn = open_target(DbTarget::File(&path)).unwrap();

        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
        assert!(path.exists());
    }
}
