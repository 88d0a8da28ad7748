use crate::binding::render::{project_overview, task_card, TaskCard, DEFAULT_EMBED_COLOR};
use crate::binding::{BindingError, BindingResult};
use crate::logging::log_value;
use crate::model::catalog::Status;
use crate::model::ids::{ChannelId, DepartmentId, MainThread, ProjectId};
use crate::model::project::{forum_channel_name, NewProject, Project, ProjectDetails, TaskCounters};
use crate::model::selector::{ProjectSelector, Selector};
use crate::model::task::{validate_due_date, validate_task_text, NewTask, Task};
use crate::model::validation::{blank_to_none, ValidationError};
use crate::platform::{
    ChannelKind, ChatPlatform, ForumRequest, OverwriteTarget, PermissionOverwrite, TagRequest,
};
use crate::repo::{EntityStore, RepoError};
use log::{info, warn};

/// Name of the pinned thread that carries a project's overview.
pub const MAIN_THREAD_NAME: &str = "General Discussion";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingConfig {
    /// Category new project forums are created under.
    pub projects_category: Option<ChannelId>,
    pub embed_color: u32,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            projects_category: None,
            embed_color: DEFAULT_EMBED_COLOR,
        }
    }
}

/// Task creation input, issued from a channel inside a project forum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub invoked_in: ChannelId,
    pub name: String,
    pub description: Option<String>,
    pub department: Option<DepartmentId>,
    /// Thread of the parent task; must belong to the same project.
    pub parent_thread: Option<ChannelId>,
    pub due_date: Option<String>,
}

/// Keeps the platform mirror of projects and tasks in step with the store.
pub struct ChannelBinding<'a, S, P> {
    store: &'a S,
    platform: &'a P,
    config: BindingConfig,
}

impl<'a, S: EntityStore, P: ChatPlatform> ChannelBinding<'a, S, P> {
    pub fn new(store: &'a S, platform: &'a P, config: BindingConfig) -> Self {
        Self {
            store,
            platform,
            config,
        }
    }

    /// Creates the forum, status tags and pinned overview thread, then
    /// persists the project row.
    pub fn create_project(&self, details: ProjectDetails) -> BindingResult<Project> {
        let details = details.normalized();
        details.validate()?;
        self.ensure_name_available(&details.name, None)?;
        let statuses = self.store.list_statuses()?;

        let forum_name = forum_channel_name(&details.name);
        info!(
            "event=project_create module=binding status=start forum={}",
            log_value(&forum_name)
        );

        let result = self.create_project_channels(&details, &forum_name, &statuses);
        let (forum, main_thread) = match result {
            Ok(created) => created,
            Err(err) => {
                warn!(
                    "event=project_create module=binding status=error forum={} error={}",
                    log_value(&forum_name),
                    log_value(&err.to_string())
                );
                return Err(err);
            }
        };

        let project = self.store.create_project(&NewProject {
            details,
            forum_channel_id: forum,
            main_thread,
        })?;
        info!(
            "event=project_create module=binding status=ok project_id={} forum_id={} thread_id={}",
            project.id,
            forum,
            main_thread.thread_id()
        );
        Ok(project)
    }

    /// Renames the forum, re-renders the overview in place and writes the row.
    pub fn edit_project(
        &self,
        selector: &ProjectSelector,
        details: ProjectDetails,
    ) -> BindingResult<Project> {
        let mut project = self.load_project(selector)?;
        let details = details.normalized();
        details.validate()?;
        self.ensure_name_available(&details.name, Some(project.id))?;

        let counters = self.store.task_counters(project.id)?;
        let main_thread = project.main_thread;
        self.platform
            .rename_channel(project.forum_channel_id, &forum_channel_name(&details.name))?;
        self.platform.edit_message(
            main_thread.thread_id(),
            main_thread.opening_message_id(),
            &project_overview(&details, counters, self.config.embed_color),
        )?;

        project.apply_details(&details);
        self.store.update_project(&project)?;
        info!(
            "event=project_edit module=binding status=ok project_id={} forum_id={}",
            project.id, project.forum_channel_id
        );
        Ok(project)
    }

    /// Two-hop lookup: channel to its parent forum, forum to project row.
    pub fn resolve_project(&self, channel: ChannelId) -> BindingResult<Project> {
        let forum = self.parent_forum(channel)?;
        self.store
            .find_project(&Selector::External(forum))?
            .ok_or(BindingError::Validation(ValidationError::NotAProjectChannel(
                forum,
            )))
    }

    /// Validates the request, creates the task thread with its pinned card and
    /// persists the task row.
    pub fn create_task(&self, request: &TaskRequest) -> BindingResult<Task> {
        let project = self.resolve_project(request.invoked_in)?;

        let name = request.name.trim().to_string();
        let description = blank_to_none(request.description.clone());
        let due_date = blank_to_none(request.due_date.clone());
        validate_task_text(&name, description.as_deref())?;
        if let Some(due) = due_date.as_deref() {
            validate_due_date(due)?;
        }

        let parent = match request.parent_thread {
            Some(thread) => {
                let parent = self
                    .store
                    .find_task(&Selector::External(thread))?
                    .filter(|task| task.project_id == project.id)
                    .ok_or(ValidationError::InvalidParentTask(thread))?;
                Some(parent)
            }
            None => None,
        };
        let department = match request.department {
            Some(id) => Some(
                self.store
                    .find_department(id)?
                    .ok_or(ValidationError::UnknownDepartment(id))?,
            ),
            None => None,
        };

        let card = task_card(
            &TaskCard {
                name: &name,
                description: description.as_deref(),
                parent_thread: parent.as_ref().map(|task| task.thread_channel_id),
                due_date: due_date.as_deref(),
                department: department.as_ref(),
                ..TaskCard::default()
            },
            self.config.embed_color,
        );
        let created = self
            .platform
            .create_thread(project.forum_channel_id, &name, &card)?;
        self.platform.pin_message(created.thread, created.message)?;

        let task = self.store.create_task(&NewTask {
            project_id: project.id,
            name,
            description,
            parent_task_id: parent.map(|task| task.id),
            due_date,
            department_id: department.map(|department| department.id),
            status_id: None,
            thread_channel_id: created.thread,
        })?;
        info!(
            "event=task_create module=binding status=ok project_id={} task_id={} thread_id={}",
            project.id, task.id, task.thread_channel_id
        );
        Ok(task)
    }

    /// Re-renders the overview with counters recomputed from the store.
    pub fn refresh_overview(&self, project: ProjectId) -> BindingResult<TaskCounters> {
        let project = self.load_project(&Selector::Internal(project))?;
        let counters = self.store.task_counters(project.id)?;
        self.platform.edit_message(
            project.main_thread.thread_id(),
            project.main_thread.opening_message_id(),
            &project_overview(&project.details(), counters, self.config.embed_color),
        )?;
        Ok(counters)
    }

    fn create_project_channels(
        &self,
        details: &ProjectDetails,
        forum_name: &str,
        statuses: &[Status],
    ) -> BindingResult<(ChannelId, MainThread)> {
        let forum = self.platform.create_forum(&ForumRequest {
            name: forum_name.to_string(),
            category: self.config.projects_category,
            overwrites: vec![PermissionOverwrite::deny_send_messages(
                OverwriteTarget::Everyone,
            )],
        })?;
        for status in statuses {
            self.platform.create_tag(
                forum,
                &TagRequest {
                    name: status.name.clone(),
                    emoji: status.emoji.clone(),
                    moderated: true,
                },
            )?;
        }

        let overview = project_overview(details, TaskCounters::default(), self.config.embed_color);
        let created = self
            .platform
            .create_thread(forum, MAIN_THREAD_NAME, &overview)?;
        let main_thread = MainThread::from_created(created)?;
        self.platform.pin_thread(main_thread.thread_id())?;
        self.platform
            .pin_message(main_thread.thread_id(), main_thread.opening_message_id())?;
        Ok((forum, main_thread))
    }

    fn load_project(&self, selector: &ProjectSelector) -> BindingResult<Project> {
        self.store.find_project(selector)?.ok_or_else(|| {
            let id = match selector {
                Selector::Internal(id) => id.0,
                Selector::External(channel) => i64::try_from(channel.0).unwrap_or(i64::MAX),
            };
            BindingError::Repo(RepoError::NotFound {
                entity: "project",
                id,
            })
        })
    }

    fn ensure_name_available(&self, name: &str, current: Option<ProjectId>) -> BindingResult<()> {
        match self.store.find_project_by_name(name)? {
            Some(existing) if Some(existing.id) != current => Err(BindingError::Repo(
                RepoError::UniquenessConflict(format!("project name `{name}` is already in use")),
            )),
            _ => Ok(()),
        }
    }

    fn parent_forum(&self, channel: ChannelId) -> BindingResult<ChannelId> {
        let outside = || BindingError::Validation(ValidationError::OutsideProjectForum(channel));
        let info = self
            .platform
            .get_or_fetch_channel(channel)?
            .ok_or_else(outside)?;
        if info.kind != ChannelKind::Thread {
            return Err(outside());
        }
        let forum = info.parent.ok_or_else(outside)?;
        let forum_info = self
            .platform
            .get_or_fetch_channel(forum)?
            .ok_or_else(outside)?;
        if forum_info.kind != ChannelKind::Forum {
            return Err(outside());
        }
        Ok(forum)
    }
}
