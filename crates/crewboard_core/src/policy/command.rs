//! Command catalogue and minimum levels.

use crate::model::access::AccessLevel;
use crate::policy::access_policy::{can_execute, PolicyDenial};
use std::fmt::{Display, Formatter};

/// Every externally invocable command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    ExecQuery,
    RefreshUsernames,
    PurgeEmployees,
    SyncCommands,
    RegisterEmployee,
    CreateProject,
    UpdateEmployee,
    EditProject,
    CreateTask,
    SetOwnUtcOffset,
}

impl CommandKind {
    pub const ALL: [CommandKind; 10] = [
        Self::ExecQuery,
        Self::RefreshUsernames,
        Self::PurgeEmployees,
        Self::SyncCommands,
        Self::RegisterEmployee,
        Self::CreateProject,
        Self::UpdateEmployee,
        Self::EditProject,
        Self::CreateTask,
        Self::SetOwnUtcOffset,
    ];

    /// Platform command name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExecQuery => "exec_query",
            Self::RefreshUsernames => "update_usernames",
            Self::PurgeEmployees => "purge_employees",
            Self::SyncCommands => "sync",
            Self::RegisterEmployee => "register_employee",
            Self::CreateProject => "create_project",
            Self::UpdateEmployee => "update_employee",
            Self::EditProject => "edit_project",
            Self::CreateTask => "create_task",
            Self::SetOwnUtcOffset => "set_utc_offset",
        }
    }

    /// Minimum level needed to run the command.
    pub fn required_level(self) -> AccessLevel {
        let value = match self {
            Self::ExecQuery
            | Self::RefreshUsernames
            | Self::PurgeEmployees
            | Self::SyncCommands => 5,
            Self::RegisterEmployee => 4,
            Self::CreateProject | Self::UpdateEmployee | Self::EditProject => 3,
            Self::CreateTask => 2,
            Self::SetOwnUtcOffset => 1,
        };
        AccessLevel::saturating(value)
    }
}

impl Display for CommandKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks the actor against the command's minimum level.
pub fn authorize(actor: AccessLevel, command: CommandKind) -> Result<(), PolicyDenial> {
    let required = command.required_level();
    if can_execute(actor, required) {
        Ok(())
    } else {
        Err(PolicyDenial::InsufficientLevel {
            required,
            actual: actor,
        })
    }
}
