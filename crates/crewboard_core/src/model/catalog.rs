//! Static catalog rows seeded by migration.

use crate::model::ids::{DepartmentId, StatusId};
use serde::{Deserialize, Serialize};

/// Status name that counts a task as completed in project counters.
pub const COMPLETE_STATUS_NAME: &str = "Complete";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
}

/// Task status; each row becomes one forum tag per project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub id: StatusId,
    pub name: String,
    pub emoji: Option<String>,
}
