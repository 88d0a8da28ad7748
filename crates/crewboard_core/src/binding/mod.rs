//! External channel representation of projects and tasks.
//!
//! # Responsibility
//! - Create and edit the forum, tags, threads and pinned messages that mirror
//!   persisted projects and tasks.
//! - Resolve the owning project of any channel inside a project forum.
//!
//! # Invariants
//! - Every validation runs before the first external or persisted write.
//! - Platform writes and store writes are sequential, not atomic. A failure
//!   part-way leaves earlier writes in place; reconciliation or a later edit
//!   repairs drift.

use crate::model::validation::ValidationError;
use crate::platform::PlatformError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod channel_binding;
pub mod render;

pub use channel_binding::{BindingConfig, ChannelBinding, TaskRequest, MAIN_THREAD_NAME};

pub type BindingResult<T> = Result<T, BindingError>;

#[derive(Debug)]
pub enum BindingError {
    Validation(ValidationError),
    Repo(RepoError),
    Platform(PlatformError),
}

impl Display for BindingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Platform(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BindingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Platform(err) => Some(err),
        }
    }
}

impl From<ValidationError> for BindingError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for BindingError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<PlatformError> for BindingError {
    fn from(value: PlatformError) -> Self {
        Self::Platform(value)
    }
}
