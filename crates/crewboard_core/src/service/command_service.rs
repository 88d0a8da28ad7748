//! Command facade.
//!
//! Every command resolves the invoking user's level from the store (unknown
//! users are level 0), checks it against the command's minimum level and
//! only then runs. Each reply carries the typed result and the text shown to
//! the invoking user.

use crate::binding::{BindingConfig, ChannelBinding, TaskRequest};
use crate::db::diagnostics::{run_diagnostic_query, QueryFailure, QueryReport};
use crate::model::employee::Employee;
use crate::model::ids::{ChannelId, UserId};
use crate::model::project::{Project, ProjectDetails};
use crate::model::selector::Selector;
use crate::model::task::Task;
use crate::platform::ChatPlatform;
use crate::policy::command::{authorize, CommandKind};
use crate::repo::{EmployeeRepository, SqliteEntityStore};
use crate::service::employee_service::{Actor, EmployeeService, RegisterRequest, UpdateRequest};
use crate::service::reconciliation::{
    ReconciliationMode, ReconciliationReport, ReconciliationService,
};
use crate::service::{ServiceError, ServiceResult};
use log::{info, warn};
use rusqlite::Connection;

pub type QueryOutcome = Result<QueryReport, QueryFailure>;

/// Typed command result plus its user-facing text.
#[derive(Debug)]
pub struct CommandReply<T> {
    pub value: T,
    pub message: String,
}

impl<T> CommandReply<T> {
    fn new(value: T, message: impl Into<String>) -> Self {
        Self {
            value,
            message: message.into(),
        }
    }
}

pub struct CommandService<'a, P> {
    conn: &'a Connection,
    platform: &'a P,
    binding: BindingConfig,
}

impl<'a, P: ChatPlatform> CommandService<'a, P> {
    pub fn new(conn: &'a Connection, platform: &'a P, binding: BindingConfig) -> Self {
        Self {
            conn,
            platform,
            binding,
        }
    }

    pub fn register_employee(
        &self,
        invoker: UserId,
        target: UserId,
        access_level: Option<i64>,
    ) -> ServiceResult<CommandReply<Employee>> {
        let store = self.store()?;
        let actor = self.authorize(&store, invoker, CommandKind::RegisterEmployee)?;
        let display_name = self
            .platform
            .member_display_name(target)?
            .ok_or(ServiceError::NotAMember(target))?;

        let employee = EmployeeService::new(&store).register(
            &actor,
            &RegisterRequest {
                user: target,
                display_name: Some(display_name),
                access_level,
            },
        )?;
        let message = format!(
            ":white_check_mark: Successfully registered {} as an employee with access level {}.",
            target.mention(),
            employee.access_level
        );
        Ok(CommandReply::new(employee, message))
    }

    pub fn update_employee(
        &self,
        invoker: UserId,
        request: &UpdateRequest,
    ) -> ServiceResult<CommandReply<Employee>> {
        let store = self.store()?;
        let actor = self.authorize(&store, invoker, CommandKind::UpdateEmployee)?;

        let (employee, patch) = EmployeeService::new(&store).update(&actor, request)?;
        let message = format!(
            ":white_check_mark: Successfully modified {}'s {}.",
            request.user.mention(),
            patch.describe()
        );
        Ok(CommandReply::new(employee, message))
    }

    pub fn set_own_utc_offset(
        &self,
        invoker: UserId,
        offset: i64,
    ) -> ServiceResult<CommandReply<Employee>> {
        let store = self.store()?;
        let actor = self.authorize(&store, invoker, CommandKind::SetOwnUtcOffset)?;

        let employee = EmployeeService::new(&store).set_own_utc_offset(&actor, offset)?;
        let message = format!(":white_check_mark: Successfully set your UTC offset to {offset}.");
        Ok(CommandReply::new(employee, message))
    }

    pub fn refresh_usernames(
        &self,
        invoker: UserId,
    ) -> ServiceResult<CommandReply<ReconciliationReport>> {
        self.reconcile(invoker, CommandKind::RefreshUsernames, ReconciliationMode::Report)
    }

    pub fn purge_employees(
        &self,
        invoker: UserId,
    ) -> ServiceResult<CommandReply<ReconciliationReport>> {
        self.reconcile(invoker, CommandKind::PurgeEmployees, ReconciliationMode::Purge)
    }

    /// Republishes the command catalogue to the platform.
    pub fn sync_commands(&self, invoker: UserId) -> ServiceResult<CommandReply<usize>> {
        let store = self.store()?;
        self.authorize(&store, invoker, CommandKind::SyncCommands)?;

        let names: Vec<&str> = CommandKind::ALL.iter().map(|kind| kind.as_str()).collect();
        let published = self.platform.publish_commands(&names)?;
        info!(
            "event=commands_sync module=service status=ok actor={invoker} count={published}"
        );
        Ok(CommandReply::new(published, "Synced!"))
    }

    pub fn create_project(
        &self,
        invoker: UserId,
        details: ProjectDetails,
    ) -> ServiceResult<CommandReply<Project>> {
        let store = self.store()?;
        self.authorize(&store, invoker, CommandKind::CreateProject)?;

        let project = ChannelBinding::new(&store, self.platform, self.binding)
            .create_project(details)?;
        let message = format!(
            ":white_check_mark: Successfully created project in {}",
            project.forum_channel_id.mention()
        );
        Ok(CommandReply::new(project, message))
    }

    /// Edits the project owning the channel the command was issued in.
    pub fn edit_project(
        &self,
        invoker: UserId,
        invoked_in: ChannelId,
        details: ProjectDetails,
    ) -> ServiceResult<CommandReply<Project>> {
        let store = self.store()?;
        self.authorize(&store, invoker, CommandKind::EditProject)?;

        let binding = ChannelBinding::new(&store, self.platform, self.binding);
        let current = binding.resolve_project(invoked_in)?;
        let project = binding.edit_project(&Selector::Internal(current.id), details)?;
        Ok(CommandReply::new(
            project,
            ":white_check_mark: Successfully modified project",
        ))
    }

    pub fn create_task(
        &self,
        invoker: UserId,
        request: &TaskRequest,
    ) -> ServiceResult<CommandReply<Task>> {
        let store = self.store()?;
        self.authorize(&store, invoker, CommandKind::CreateTask)?;

        let task = ChannelBinding::new(&store, self.platform, self.binding).create_task(request)?;
        let message = format!(
            ":white_check_mark: Successfully created task in {}",
            task.thread_channel_id.mention()
        );
        Ok(CommandReply::new(task, message))
    }

    /// Raw statement against the live database. A failing statement is a
    /// successful command whose reply reports the failure.
    pub fn exec_query(
        &self,
        invoker: UserId,
        sql: &str,
    ) -> ServiceResult<CommandReply<QueryOutcome>> {
        let store = self.store()?;
        self.authorize(&store, invoker, CommandKind::ExecQuery)?;

        let outcome = run_diagnostic_query(self.conn, sql);
        let message = match &outcome {
            Ok(report) => report.render(),
            Err(failure) => failure.render(),
        };
        Ok(CommandReply::new(outcome, message))
    }

    fn reconcile(
        &self,
        invoker: UserId,
        command: CommandKind,
        mode: ReconciliationMode,
    ) -> ServiceResult<CommandReply<ReconciliationReport>> {
        let store = self.store()?;
        self.authorize(&store, invoker, command)?;

        let report = ReconciliationService::new(&store, self.platform).run(mode)?;
        let message = report.render();
        Ok(CommandReply::new(report, message))
    }

    fn store(&self) -> ServiceResult<SqliteEntityStore<'a>> {
        Ok(SqliteEntityStore::try_new(self.conn)?)
    }

    fn authorize(
        &self,
        store: &SqliteEntityStore<'_>,
        invoker: UserId,
        command: CommandKind,
    ) -> ServiceResult<Actor> {
        let level = store.access_level_of(invoker)?;
        if let Err(denial) = authorize(level, command) {
            warn!(
                "event=command_denied module=service status=error command={command} actor={invoker} level={level}"
            );
            return Err(ServiceError::AuthorizationDenied { command, denial });
        }
        info!("event=command_run module=service status=start command={command} actor={invoker}");
        Ok(Actor {
            user: invoker,
            level,
        })
    }
}
