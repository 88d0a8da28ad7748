//! SQLite conversions for identifier and level newtypes.
//!
//! Platform snowflakes are `u64` but stored as SQLite INTEGER (`i64`); values
//! above `i64::MAX` are rejected rather than wrapped.

use crate::model::access::AccessLevel;
use crate::model::ids::{
    AssetId, ChannelId, DepartmentId, EmployeeId, MainThread, ProjectId, StatusId, TaskId, UserId,
};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

macro_rules! rowid_sql {
    ($($name:ident),+) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.0))
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    i64::column_result(value).map(Self)
                }
            }
        )+
    };
}

macro_rules! snowflake_sql {
    ($($name:ident),+) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    i64::try_from(self.0)
                        .map(ToSqlOutput::from)
                        .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    let raw = i64::column_result(value)?;
                    u64::try_from(raw)
                        .map(Self)
                        .map_err(|_| FromSqlError::OutOfRange(raw))
                }
            }
        )+
    };
}

rowid_sql!(EmployeeId, ProjectId, TaskId, AssetId, DepartmentId, StatusId);
snowflake_sql!(ChannelId, UserId);

impl ToSql for AccessLevel {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(*self)))
    }
}

impl FromSql for AccessLevel {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        AccessLevel::new(raw).map_err(|_| FromSqlError::OutOfRange(raw))
    }
}

impl ToSql for MainThread {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let thread = self.thread_id();
        i64::try_from(thread.0)
            .map(ToSqlOutput::from)
            .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))
    }
}

impl FromSql for MainThread {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        ChannelId::column_result(value).map(MainThread::from_stored)
    }
}
