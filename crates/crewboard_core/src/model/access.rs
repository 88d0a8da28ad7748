//! Access level value type.

use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Trust rank in `0..=5`. Level 0 marks a deactivated employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct AccessLevel(u8);

impl AccessLevel {
    pub const DEACTIVATED: Self = Self(0);
    pub const MIN_ACTIVE: Self = Self(1);
    pub const MAX: Self = Self(5);

    /// Validates the `0..=5` range.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        match u8::try_from(value) {
            Ok(level) if level <= Self::MAX.0 => Ok(Self(level)),
            _ => Err(ValidationError::AccessLevelOutOfRange(value)),
        }
    }

    /// Builds a level from a trusted literal, capping it at [`Self::MAX`].
    pub const fn saturating(value: u8) -> Self {
        if value > Self::MAX.0 {
            Self::MAX
        } else {
            Self(value)
        }
    }

    /// All six levels in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..=Self::MAX.0).map(Self)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_active(self) -> bool {
        self.0 > 0
    }
}

impl TryFrom<i64> for AccessLevel {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccessLevel> for i64 {
    fn from(value: AccessLevel) -> Self {
        i64::from(value.0)
    }
}

impl Display for AccessLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
