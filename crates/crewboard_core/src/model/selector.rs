//! Tagged lookup selectors.
//!
//! Callers running inside a thread only know the external channel id, while
//! internal callers hold row ids. A selector names exactly one of the two.

use crate::model::ids::{ChannelId, EmployeeId, ProjectId, TaskId, UserId};
use crate::model::validation::ValidationError;

/// Exactly one lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<I, E = ChannelId> {
    Internal(I),
    External(E),
}

/// Internal project id or project forum channel id.
pub type ProjectSelector = Selector<ProjectId>;
/// Internal task id or task thread channel id.
pub type TaskSelector = Selector<TaskId>;
/// Internal employee id or platform member id.
pub type EmployeeSelector = Selector<EmployeeId, UserId>;

impl<I, E> Selector<I, E> {
    /// Builds a selector from optional caller input.
    ///
    /// When both keys are present the external one wins; when neither is
    /// present the lookup is rejected.
    pub fn from_parts(internal: Option<I>, external: Option<E>) -> Result<Self, ValidationError> {
        match (internal, external) {
            (_, Some(external)) => Ok(Self::External(external)),
            (Some(internal), None) => Ok(Self::Internal(internal)),
            (None, None) => Err(ValidationError::MissingSelector),
        }
    }
}
