//! Employee directory use cases gated by the access policy.
//!
//! # Invariants
//! - Registration grants only levels strictly below the actor's own.
//! - Level changes go through `evaluate_modification`; UTC offset changes of
//!   another employee need only the command level.
//! - Nobody changes their own record through the privileged path.
//! - Only a purge sets level 0; updates keep employees active.

use crate::logging::log_value;
use crate::model::access::AccessLevel;
use crate::model::employee::{validate_utc_offset, Employee, EmployeePatch, NewEmployee};
use crate::model::ids::UserId;
use crate::model::selector::Selector;
use crate::model::validation::ValidationError;
use crate::policy::access_policy::{evaluate_grant, evaluate_modification, PolicyDenial};
use crate::policy::command::CommandKind;
use crate::repo::{EmployeeRepository, RepoError};
use crate::service::{ServiceError, ServiceResult};
use log::info;

/// Caller identity with the level the store holds for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user: UserId,
    pub level: AccessLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub user: UserId,
    pub display_name: Option<String>,
    /// Defaults to level 1 when omitted.
    pub access_level: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateRequest {
    pub user: UserId,
    pub access_level: Option<i64>,
    pub utc_offset: Option<i64>,
}

pub struct EmployeeService<'a, R: EmployeeRepository> {
    repo: &'a R,
}

impl<'a, R: EmployeeRepository> EmployeeService<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub fn register(&self, actor: &Actor, request: &RegisterRequest) -> ServiceResult<Employee> {
        let level = match request.access_level {
            Some(value) => AccessLevel::new(value)?,
            None => AccessLevel::MIN_ACTIVE,
        };
        if !level.is_active() {
            return Err(ValidationError::InactiveRegistration.into());
        }
        evaluate_grant(actor.level, level).map_err(|denial| ServiceError::AuthorizationDenied {
            command: CommandKind::RegisterEmployee,
            denial,
        })?;

        let employee = self
            .repo
            .create_employee(&NewEmployee {
                username: request.display_name.clone(),
                external_id: request.user,
                access_level: level,
                utc_offset: None,
            })
            .map_err(|err| match err {
                RepoError::UniquenessConflict(_) => ServiceError::AlreadyRegistered(request.user),
                other => other.into(),
            })?;

        info!(
            "event=employee_register module=service status=ok actor={} employee_id={} level={}",
            actor.user, employee.id, employee.access_level
        );
        Ok(employee)
    }

    /// Get-then-update of another employee's level and/or UTC offset.
    pub fn update(
        &self,
        actor: &Actor,
        request: &UpdateRequest,
    ) -> ServiceResult<(Employee, EmployeePatch)> {
        let deny = |denial: PolicyDenial| ServiceError::AuthorizationDenied {
            command: CommandKind::UpdateEmployee,
            denial,
        };
        if actor.user == request.user {
            return Err(deny(PolicyDenial::SelfTarget));
        }

        let patch = EmployeePatch {
            access_level: request.access_level.map(AccessLevel::new).transpose()?,
            utc_offset: request.utc_offset.map(validate_utc_offset).transpose()?,
        };
        if patch.is_empty() {
            return Err(ValidationError::NoFieldsToUpdate.into());
        }
        if patch.access_level.is_some_and(|level| !level.is_active()) {
            return Err(ValidationError::InactiveUpdate.into());
        }

        let mut employee = self
            .repo
            .find_employee(&Selector::External(request.user), true)?
            .ok_or(ServiceError::NotRegistered(request.user))?;
        if let Some(new_level) = patch.access_level {
            evaluate_modification(actor.level, employee.access_level, new_level, false)
                .map_err(deny)?;
        }

        patch.apply_to(&mut employee);
        self.repo.update_employee(&employee)?;
        info!(
            "event=employee_update module=service status=ok actor={} employee_id={} fields={}",
            actor.user,
            employee.id,
            log_value(patch.describe())
        );
        Ok((employee, patch))
    }

    /// Self-service UTC offset; needs only an active registration.
    pub fn set_own_utc_offset(&self, actor: &Actor, offset: i64) -> ServiceResult<Employee> {
        let offset = validate_utc_offset(offset)?;
        let mut employee = self
            .repo
            .find_employee(&Selector::External(actor.user), false)?
            .ok_or(ServiceError::NotRegistered(actor.user))?;

        EmployeePatch {
            access_level: None,
            utc_offset: Some(offset),
        }
        .apply_to(&mut employee);
        self.repo.update_employee(&employee)?;
        Ok(employee)
    }
}

#[cfg(test)]
mod tests {
    use super::{Actor, EmployeeService, RegisterRequest, UpdateRequest};
    use crate::db::open_db_in_memory;
    use crate::model::access::AccessLevel;
    use crate::model::ids::UserId;
    use crate::policy::access_policy::PolicyDenial;
    use crate::repo::SqliteEntityStore;
    use crate::service::ServiceError;

    fn actor(user: u64, level: u8) -> Actor {
        Actor {
            user: UserId(user),
            level: AccessLevel::saturating(level),
        }
    }

    #[test]
    fn duplicate_registration_is_reported_as_already_registered() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteEntityStore::try_new(&conn).unwrap();
        let service = EmployeeService::new(&store);
        let request = RegisterRequest {
            user: UserId(10),
            display_name: Some("ada".to_string()),
            access_level: Some(2),
        };

        service.register(&actor(1, 5), &request).unwrap();
        let err = service.register(&actor(1, 5), &request).unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyRegistered(UserId(10))));
        assert_eq!(err.user_message(), ":x: Employee is already registered.");
    }

    #[test]
    fn update_rejects_self_before_reading_the_store() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteEntityStore::try_new(&conn).unwrap();
        let service = EmployeeService::new(&store);

        let err = service
            .update(
                &actor(1, 5),
                &UpdateRequest {
                    user: UserId(1),
                    access_level: None,
                    utc_offset: Some(2),
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::AuthorizationDenied {
                denial: PolicyDenial::SelfTarget,
                ..
            }
        ));
    }

    #[test]
    fn offset_only_update_skips_level_rules() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteEntityStore::try_new(&conn).unwrap();
        let service = EmployeeService::new(&store);
        service
            .register(
                &actor(1, 5),
                &RegisterRequest {
                    user: UserId(20),
                    display_name: None,
                    access_level: Some(3),
                },
            )
            .unwrap();

        let (employee, patch) = service
            .update(
                &actor(2, 3),
                &UpdateRequest {
                    user: UserId(20),
                    access_level: None,
                    utc_offset: Some(-5),
                },
            )
            .unwrap();
        assert_eq!(employee.utc_offset, Some(-5));
        assert_eq!(patch.describe(), "UTC offset");
    }
}
