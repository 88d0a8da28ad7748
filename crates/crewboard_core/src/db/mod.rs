//! SQLite storage bootstrap, schema migrations and the operator query path.
//!
//! # Responsibility
//! - Open crewboard databases (file or memory) with the connection pragmas
//!   the repositories depend on.
//! - Bring the schema up to [`migrations::latest_version`] step by step.
//! - Run ad hoc diagnostic statements for operators.
//!
//! # Invariants
//! - The schema step is recorded in `PRAGMA user_version`.
//! - No directory data is read or written on a connection whose migrations
//!   did not all succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod diagnostics;
pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_target, DbTarget};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build.
    SchemaAhead { found: u32, supported: u32 },
    /// A schema step failed and was rolled back; earlier steps stay applied.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
}

impl DbError {
    /// Stable code used in `db_open` log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "db_sqlite_failed",
            Self::SchemaAhead { .. } => "db_schema_ahead",
            Self::Migration { .. } => "db_migration_failed",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::SchemaAhead { found, supported } => write!(
                f,
                "database is at schema step {found} but this build only knows up to {supported}"
            ),
            Self::Migration { version, source } => {
                write!(f, "schema step {version} failed: {source}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::SchemaAhead { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
