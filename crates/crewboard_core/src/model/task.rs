//! Task records and their relations (assignees, dependencies, assets).
//!
//! # Invariants
//! - Every task belongs to exactly one project and one thread.
//! - `parent_task_id` forms a forest; a parent is always a task of the same
//!   project (checked by the channel binding before creation).
//! - A dependency never links a task to itself. Longer cycles are not
//!   rejected.

use crate::model::ids::{AssetId, ChannelId, DepartmentId, ProjectId, StatusId, TaskId};
use crate::model::validation::{check_optional_text, require_text, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MAX_TASK_NAME_CHARS: usize = 150;
pub const MAX_TASK_TEXT_CHARS: usize = 2000;

static DUE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid due date regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub parent_task_id: Option<TaskId>,
    /// `YYYY-MM-DD`.
    pub due_date: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub status_id: Option<StatusId>,
    /// Unix epoch milliseconds.
    pub date_created: i64,
    pub thread_channel_id: ChannelId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub project_id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub parent_task_id: Option<TaskId>,
    pub due_date: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub status_id: Option<StatusId>,
    pub thread_channel_id: ChannelId,
}

impl NewTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_task_text(&self.name, self.description.as_deref())?;
        if let Some(due) = self.due_date.as_deref() {
            validate_due_date(due)?;
        }
        Ok(())
    }
}

/// Ordered `(parent, child)` pair: the child depends on the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskDependency {
    parent: TaskId,
    child: TaskId,
}

impl TaskDependency {
    pub fn new(parent: TaskId, child: TaskId) -> Result<Self, ValidationError> {
        if parent == child {
            return Err(ValidationError::SelfDependency(parent));
        }
        Ok(Self { parent, child })
    }

    pub fn parent(&self) -> TaskId {
        self.parent
    }

    pub fn child(&self) -> TaskId {
        self.child
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub task_id: TaskId,
    pub link: String,
    /// Unix epoch milliseconds.
    pub date_created: i64,
}

pub(crate) fn validate_task_text(
    name: &str,
    description: Option<&str>,
) -> Result<(), ValidationError> {
    require_text("name", name, MAX_TASK_NAME_CHARS)?;
    check_optional_text("description", description, MAX_TASK_TEXT_CHARS)
}

/// Accepts calendar dates in `YYYY-MM-DD` form.
pub fn validate_due_date(value: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidDueDate(value.to_string());
    let caps = DUE_DATE_RE.captures(value).ok_or_else(invalid)?;
    let field = |index: usize| -> Result<u32, ValidationError> {
        caps.get(index)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .ok_or_else(invalid)
    };
    let (year, month, day) = (field(1)?, field(2)?, field(3)?);
    if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
        return Err(invalid());
    }
    Ok(())
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}
