//! Use-case services over the entity store and the chat platform.
//!
//! # Responsibility
//! - Apply the access policy before any mutation.
//! - Run directory reconciliation passes.
//! - Expose the command facade that maps requests to user-facing replies.
//!
//! # Invariants
//! - Services never bypass repository validation/persistence contracts.
//! - A denied request performs no persisted or external write.

use crate::binding::BindingError;
use crate::model::ids::UserId;
use crate::model::validation::ValidationError;
use crate::platform::PlatformError;
use crate::policy::access_policy::PolicyDenial;
use crate::policy::command::CommandKind;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod command_service;
pub mod employee_service;
pub mod reconciliation;

pub use command_service::{CommandReply, CommandService, QueryOutcome};
pub use employee_service::{Actor, EmployeeService, RegisterRequest, UpdateRequest};
pub use reconciliation::{
    MemberOutcome, MemberReport, ReconciliationMode, ReconciliationReport, ReconciliationService,
};

pub type ServiceResult<T> = Result<T, ServiceError>;

const DENIED_MARK: &str = ":lock:";
const ERROR_MARK: &str = ":x:";

/// Errors surfaced to the command boundary.
#[derive(Debug)]
pub enum ServiceError {
    AuthorizationDenied {
        command: CommandKind,
        denial: PolicyDenial,
    },
    Validation(ValidationError),
    AlreadyRegistered(UserId),
    NotRegistered(UserId),
    /// The target is not a member of the server.
    NotAMember(UserId),
    UniquenessConflict(String),
    ConstraintViolation(String),
    NotFound { entity: &'static str, id: i64 },
    /// A platform write failed; earlier writes of the same request are kept.
    ExternalWrite(PlatformError),
    Repo(RepoError),
}

impl ServiceError {
    /// Reply text shown to the invoking user.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthorizationDenied { command, denial } => denial_message(*command, denial),
            Self::Validation(err) => validation_message(err),
            Self::AlreadyRegistered(_) => format!("{ERROR_MARK} Employee is already registered."),
            Self::NotRegistered(user) => {
                format!("{ERROR_MARK} {} is not a registered employee.", user.mention())
            }
            Self::NotAMember(user) => {
                format!("{ERROR_MARK} {} is not a member of the server.", user.mention())
            }
            Self::UniquenessConflict(detail) => format!("{ERROR_MARK} {}", sentence(detail)),
            Self::ConstraintViolation(detail) => format!(
                "{ERROR_MARK} The request conflicts with stored data ({detail})."
            ),
            Self::NotFound { entity, id } => {
                format!("{ERROR_MARK} {} {id} was not found.", sentence_start(entity))
            }
            Self::ExternalWrite(err) => format!(
                "{ERROR_MARK} The chat platform rejected a change ({err}). Changes made before the failure were kept."
            ),
            Self::Repo(_) => format!(
                "{ERROR_MARK} Internal storage error. Please contact an administrator."
            ),
        }
    }
}

fn denial_message(command: CommandKind, denial: &PolicyDenial) -> String {
    match denial {
        PolicyDenial::InsufficientLevel { .. } => format!(
            "{DENIED_MARK} Insufficient permissions. Please contact an administrator if you believe this is an issue."
        ),
        PolicyDenial::GrantAtOrAboveOwn { .. } if command == CommandKind::RegisterEmployee => format!(
            "{ERROR_MARK} You cannot register an employee to an equal or higher access level than your own."
        ),
        PolicyDenial::GrantAtOrAboveOwn { .. } => format!(
            "{ERROR_MARK} You cannot update a user to an equal or higher access level than your own."
        ),
        PolicyDenial::PeerLevel(_) => format!(
            "{ERROR_MARK} You cannot change the access level of someone with the same access level as you."
        ),
        PolicyDenial::SelfTarget => format!(
            "{ERROR_MARK} You cannot update yourself. Contact an admin to update your own access level, or use `/set_utc_offset` to set your UTC offset."
        ),
    }
}

fn validation_message(err: &ValidationError) -> String {
    match err {
        ValidationError::NotAProjectChannel(channel) => {
            format!("{ERROR_MARK} {} is not a valid project.", channel.mention())
        }
        ValidationError::InvalidParentTask(channel) => {
            format!("{ERROR_MARK} {} is not a valid task.", channel.mention())
        }
        ValidationError::NoFieldsToUpdate => format!(
            "{ERROR_MARK} You must provide at least one of `access_level` or `utc_offset`."
        ),
        other => format!("{ERROR_MARK} {}", sentence(&other.to_string())),
    }
}

fn sentence_start(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn sentence(text: &str) -> String {
    let mut output = sentence_start(text);
    if !output.ends_with('.') {
        output.push('.');
    }
    output
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthorizationDenied { command, denial } => {
                write!(f, "`{command}` denied: {denial}")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::AlreadyRegistered(user) => write!(f, "employee {user} is already registered"),
            Self::NotRegistered(user) => write!(f, "user {user} is not a registered employee"),
            Self::NotAMember(user) => write!(f, "user {user} is not a server member"),
            Self::UniquenessConflict(detail) => write!(f, "uniqueness conflict: {detail}"),
            Self::ConstraintViolation(detail) => write!(f, "constraint violation: {detail}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::ExternalWrite(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::ExternalWrite(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::UniquenessConflict(detail) => Self::UniquenessConflict(detail),
            RepoError::ConstraintViolation(detail) => Self::ConstraintViolation(detail),
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Repo(other),
        }
    }
}

impl From<PlatformError> for ServiceError {
    fn from(value: PlatformError) -> Self {
        Self::ExternalWrite(value)
    }
}

impl From<BindingError> for ServiceError {
    fn from(value: BindingError) -> Self {
        match value {
            BindingError::Validation(err) => Self::Validation(err),
            BindingError::Repo(err) => err.into(),
            BindingError::Platform(err) => Self::ExternalWrite(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceError;
    use crate::model::access::AccessLevel;
    use crate::model::ids::{ChannelId, UserId};
    use crate::model::validation::ValidationError;
    use crate::policy::access_policy::PolicyDenial;
    use crate::policy::command::CommandKind;
    use crate::repo::RepoError;

    #[test]
    fn insufficient_level_uses_lock_message() {
        let err = ServiceError::AuthorizationDenied {
            command: CommandKind::ExecQuery,
            denial: PolicyDenial::InsufficientLevel {
                required: AccessLevel::MAX,
                actual: AccessLevel::MIN_ACTIVE,
            },
        };
        assert_eq!(
            err.user_message(),
            ":lock: Insufficient permissions. Please contact an administrator if you believe this is an issue."
        );
    }

    #[test]
    fn grant_denial_wording_depends_on_command() {
        let denial = PolicyDenial::GrantAtOrAboveOwn {
            actor: AccessLevel::saturating(3),
            requested: AccessLevel::saturating(3),
        };
        let register = ServiceError::AuthorizationDenied {
            command: CommandKind::RegisterEmployee,
            denial,
        };
        let update = ServiceError::AuthorizationDenied {
            command: CommandKind::UpdateEmployee,
            denial,
        };
        assert!(register.user_message().contains("register an employee"));
        assert!(update.user_message().contains("update a user"));
    }

    #[test]
    fn repo_errors_are_classified() {
        let err: ServiceError = RepoError::UniquenessConflict("name taken".to_string()).into();
        assert!(matches!(err, ServiceError::UniquenessConflict(_)));
        assert_eq!(err.user_message(), ":x: Name taken.");

        let err: ServiceError = RepoError::Validation(ValidationError::InvalidParentTask(
            ChannelId(12),
        ))
        .into();
        assert_eq!(err.user_message(), ":x: <#12> is not a valid task.");

        assert_eq!(
            ServiceError::NotRegistered(UserId(9)).user_message(),
            ":x: <@9> is not a registered employee."
        );
    }
}
