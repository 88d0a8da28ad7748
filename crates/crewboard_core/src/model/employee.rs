//! Employee directory records.
//!
//! # Invariants
//! - `external_id` is unique across the directory.
//! - `access_level == 0` means deactivated; rows are never deleted.
//! - `utc_offset` stays within `-12..=14` when set.

use crate::model::access::AccessLevel;
use crate::model::ids::{EmployeeId, UserId};
use crate::model::validation::{check_optional_text, ValidationError};
use serde::{Deserialize, Serialize};

pub const MAX_USERNAME_CHARS: usize = 100;
pub const MIN_UTC_OFFSET: i8 = -12;
pub const MAX_UTC_OFFSET: i8 = 14;

/// Persisted directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    /// Cached platform display name; cleared on purge.
    pub username: Option<String>,
    pub external_id: UserId,
    pub access_level: AccessLevel,
    pub utc_offset: Option<i8>,
    /// Unix epoch milliseconds.
    pub date_joined: i64,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.access_level.is_active()
    }

    /// Name shown in reports, falling back to the platform id.
    pub fn label(&self) -> String {
        match &self.username {
            Some(name) => name.clone(),
            None => format!("<unknown {}>", self.external_id),
        }
    }
}

/// Registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub username: Option<String>,
    pub external_id: UserId,
    pub access_level: AccessLevel,
    pub utc_offset: Option<i8>,
}

impl NewEmployee {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_optional_text("username", self.username.as_deref(), MAX_USERNAME_CHARS)?;
        if let Some(offset) = self.utc_offset {
            validate_utc_offset(i64::from(offset))?;
        }
        Ok(())
    }
}

/// Partial update applied on top of a loaded row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmployeePatch {
    pub access_level: Option<AccessLevel>,
    pub utc_offset: Option<i8>,
}

impl EmployeePatch {
    pub fn is_empty(&self) -> bool {
        self.access_level.is_none() && self.utc_offset.is_none()
    }

    /// Overwrites only the fields present in the patch.
    pub fn apply_to(&self, employee: &mut Employee) {
        if let Some(level) = self.access_level {
            employee.access_level = level;
        }
        if let Some(offset) = self.utc_offset {
            employee.utc_offset = Some(offset);
        }
    }

    /// Short description of the touched fields for user messages.
    pub fn describe(&self) -> &'static str {
        match (self.access_level.is_some(), self.utc_offset.is_some()) {
            (true, true) => "access level and UTC offset",
            (true, false) => "access level",
            (false, true) => "UTC offset",
            (false, false) => "nothing",
        }
    }
}

/// Validates a raw UTC offset and narrows it.
pub fn validate_utc_offset(value: i64) -> Result<i8, ValidationError> {
    match i8::try_from(value) {
        Ok(offset) if (MIN_UTC_OFFSET..=MAX_UTC_OFFSET).contains(&offset) => Ok(offset),
        _ => Err(ValidationError::UtcOffsetOutOfRange(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_utc_offset, Employee, EmployeePatch};
    use crate::model::access::AccessLevel;
    use crate::model::ids::{EmployeeId, UserId};

    fn employee() -> Employee {
        Employee {
            id: EmployeeId(1),
            username: Some("ada".to_string()),
            external_id: UserId(100),
            access_level: AccessLevel::new(2).unwrap(),
            utc_offset: Some(-5),
            date_joined: 0,
        }
    }

    #[test]
    fn patch_leaves_untouched_fields_alone() {
        let mut row = employee();
        EmployeePatch {
            access_level: Some(AccessLevel::new(3).unwrap()),
            utc_offset: None,
        }
        .apply_to(&mut row);
        assert_eq!(row.access_level.value(), 3);
        assert_eq!(row.utc_offset, Some(-5));
    }

    #[test]
    fn label_falls_back_to_platform_id() {
        let mut row = employee();
        assert_eq!(row.label(), "ada");
        row.username = None;
        row.access_level = AccessLevel::DEACTIVATED;
        assert!(!row.is_active());
        assert_eq!(row.label(), "<unknown 100>");
    }

    #[test]
    fn utc_offset_range_is_enforced() {
        assert_eq!(validate_utc_offset(14), Ok(14));
        assert_eq!(validate_utc_offset(-12), Ok(-12));
        assert!(validate_utc_offset(15).is_err());
        assert!(validate_utc_offset(-300).is_err());
    }
}
