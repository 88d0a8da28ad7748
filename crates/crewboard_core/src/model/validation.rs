//! Validation failures raised before any mutation happens.

use crate::model::ids::{ChannelId, DepartmentId, MessageId, TaskId};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input or reference rejected before any persisted or external write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Neither an internal nor an external selector was supplied.
    MissingSelector,
    AccessLevelOutOfRange(i64),
    UtcOffsetOutOfRange(i64),
    EmptyField(&'static str),
    FieldTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    InvalidDueDate(String),
    /// A task cannot depend on itself.
    SelfDependency(TaskId),
    /// Registration must grant an active level.
    InactiveRegistration,
    /// Level 0 is reserved for purged employees.
    InactiveUpdate,
    /// A patch carried no field to change.
    NoFieldsToUpdate,
    /// Command issued outside a thread of a forum channel.
    OutsideProjectForum(ChannelId),
    NotAProjectChannel(ChannelId),
    InvalidParentTask(ChannelId),
    UnknownDepartment(DepartmentId),
    ThreadMessageIdMismatch {
        thread: ChannelId,
        message: MessageId,
    },
    InvalidMention(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSelector => {
                write!(f, "must specify either an internal id or an external channel id")
            }
            Self::AccessLevelOutOfRange(value) => {
                write!(f, "access level {value} is outside 0..=5")
            }
            Self::UtcOffsetOutOfRange(value) => {
                write!(f, "UTC offset {value} is outside -12..=14")
            }
            Self::EmptyField(field) => write!(f, "`{field}` must not be empty"),
            Self::FieldTooLong { field, max, actual } => {
                write!(f, "`{field}` is {actual} characters long; maximum is {max}")
            }
            Self::InvalidDueDate(value) => {
                write!(f, "due date `{value}` is not a valid YYYY-MM-DD date")
            }
            Self::SelfDependency(id) => write!(f, "task {id} cannot depend on itself"),
            Self::InactiveRegistration => {
                write!(f, "employees must be registered with an access level of at least 1")
            }
            Self::InactiveUpdate => write!(
                f,
                "access level must be at least 1; departed employees are removed by a purge"
            ),
            Self::NoFieldsToUpdate => {
                write!(f, "at least one of `access_level` or `utc_offset` must be provided")
            }
            Self::OutsideProjectForum(_) => {
                write!(f, "this command must be used in a project forum channel")
            }
            Self::NotAProjectChannel(channel) => {
                write!(f, "{} is not a valid project", channel.mention())
            }
            Self::InvalidParentTask(channel) => {
                write!(f, "{} is not a valid task", channel.mention())
            }
            Self::UnknownDepartment(id) => write!(f, "department {id} does not exist"),
            Self::ThreadMessageIdMismatch { thread, message } => write!(
                f,
                "thread {thread} and its opening message {message} do not share an id"
            ),
            Self::InvalidMention(value) => write!(f, "`{value}` is not a valid mention or id"),
        }
    }
}

impl Error for ValidationError {}

/// Rejects blank values and values over `max` characters.
pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    check_length(field, value, max)
}

/// Rejects optional values over `max` characters.
pub(crate) fn check_optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(text) => check_length(field, text, max),
        None => Ok(()),
    }
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::FieldTooLong { field, max, actual });
    }
    Ok(())
}

/// Maps blank optional form input to `None`.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|text| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
