//! Entity store: repository contracts and the SQLite implementation.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for the directory,
//!   projects, tasks and the static catalog.
//! - Keep SQL details behind [`SqliteEntityStore`].
//! - Translate SQLite constraint failures into semantic errors.
//!
//! # Invariants
//! - Write paths validate domain values before SQL mutations; SQL CHECK and
//!   UNIQUE constraints back them up.
//! - Each call runs in autocommit mode except
//!   [`EmployeeRepository::apply_directory_changes`], which commits once.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::validation::ValidationError;
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod catalog_repo;
pub mod employee_repo;
pub mod project_repo;
pub mod task_repo;
mod sql_types;

pub use catalog_repo::CatalogRepository;
pub use employee_repo::{DirectoryChange, EmployeeRepository};
pub use project_repo::ProjectRepository;
pub use task_repo::TaskRepository;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound { entity: &'static str, id: i64 },
    /// UNIQUE or PRIMARY KEY violation (duplicate registration, name reuse).
    UniquenessConflict(String),
    /// CHECK, FOREIGN KEY or NOT NULL violation.
    ConstraintViolation(String),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::UniquenessConflict(detail) => write!(f, "uniqueness conflict: {detail}"),
            Self::ConstraintViolation(detail) => write!(f, "constraint violation: {detail}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "entity store requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &value {
            if failure.code == ErrorCode::ConstraintViolation {
                let detail = message.clone().unwrap_or_else(|| failure.to_string());
                return match failure.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        Self::UniquenessConflict(detail)
                    }
                    _ => Self::ConstraintViolation(detail),
                };
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Everything the binding and command layers need from storage.
pub trait EntityStore:
    EmployeeRepository + ProjectRepository + TaskRepository + CatalogRepository
{
}

impl<T> EntityStore for T where
    T: EmployeeRepository + ProjectRepository + TaskRepository + CatalogRepository
{
}

/// SQLite-backed entity store borrowing a migrated connection.
#[derive(Debug)]
pub struct SqliteEntityStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntityStore<'conn> {
    /// Wraps a connection whose schema is at the latest migration.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}
