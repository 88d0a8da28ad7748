//! Task, assignee, dependency and asset persistence.
//!
//! # Invariants
//! - A task belongs to exactly one project and owns one unique thread id.
//! - `parent_task_id` references `tasks.id`.
//! - Dependencies are built through [`TaskDependency::new`]; the SQL CHECK
//!   rejects self-reference as well. Longer cycles are not detected.

use crate::model::catalog::COMPLETE_STATUS_NAME;
use crate::model::employee::Employee;
use crate::model::ids::{AssetId, EmployeeId, ProjectId, TaskId};
use crate::model::project::TaskCounters;
use crate::model::selector::{Selector, TaskSelector};
use crate::model::task::{
    validate_due_date, validate_task_text, Asset, NewTask, Task, TaskDependency,
    MAX_TASK_TEXT_CHARS,
};
use crate::model::validation::require_text;
use crate::repo::{EmployeeRepository, RepoError, RepoResult, SqliteEntityStore};
use rusqlite::{params, OptionalExtension, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    name,
    description,
    parent_task_id,
    due_date,
    department_id,
    status_id,
    date_created,
    thread_channel_id
FROM tasks";

/// Repository interface for tasks and their relations.
pub trait TaskRepository {
    fn create_task(&self, task: &NewTask) -> RepoResult<Task>;
    /// An external selector resolves by the task's thread id.
    fn find_task(&self, selector: &TaskSelector) -> RepoResult<Option<Task>>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn list_tasks(&self, project: ProjectId) -> RepoResult<Vec<Task>>;
    fn list_subtasks(&self, parent: TaskId) -> RepoResult<Vec<Task>>;
    fn task_counters(&self, project: ProjectId) -> RepoResult<TaskCounters>;
    fn add_assignee(&self, task: TaskId, employee: EmployeeId) -> RepoResult<()>;
    fn list_assignees(&self, task: TaskId) -> RepoResult<Vec<Employee>>;
    fn add_dependency(&self, dependency: TaskDependency) -> RepoResult<()>;
    /// Tasks that wait on `parent`.
    fn list_dependents(&self, parent: TaskId) -> RepoResult<Vec<TaskId>>;
    /// Tasks that `child` waits on.
    fn list_prerequisites(&self, child: TaskId) -> RepoResult<Vec<TaskId>>;
    fn add_asset(&self, task: TaskId, link: &str) -> RepoResult<Asset>;
    fn list_assets(&self, task: TaskId) -> RepoResult<Vec<Asset>>;
}

impl TaskRepository for SqliteEntityStore<'_> {
    fn create_task(&self, task: &NewTask) -> RepoResult<Task> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                project_id,
                name,
                description,
                parent_task_id,
                due_date,
                department_id,
                status_id,
                thread_channel_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                task.project_id,
                task.name.as_str(),
                task.description.as_deref(),
                task.parent_task_id,
                task.due_date.as_deref(),
                task.department_id,
                task.status_id,
                task.thread_channel_id,
            ],
        )?;

        let id = TaskId(self.conn.last_insert_rowid());
        self.find_task(&Selector::Internal(id))?
            .ok_or(RepoError::NotFound {
                entity: "task",
                id: id.0,
            })
    }

    fn find_task(&self, selector: &TaskSelector) -> RepoResult<Option<Task>> {
        let (column, key) = match selector {
            Selector::Internal(id) => ("id", id.0),
            Selector::External(channel) => match i64::try_from(channel.0) {
                Ok(value) => ("thread_channel_id", value),
                Err(_) => return Ok(None),
            },
        };

        let task = self
            .conn
            .query_row(
                &format!("{TASK_SELECT_SQL} WHERE {column} = ?1;"),
                params![key],
                |row| Ok(parse_task_row(row)),
            )
            .optional()?;
        task.transpose()
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        validate_task_text(&task.name, task.description.as_deref())?;
        if let Some(due) = task.due_date.as_deref() {
            validate_due_date(due)?;
        }

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                name = ?1,
                description = ?2,
                parent_task_id = ?3,
                due_date = ?4,
                department_id = ?5,
                status_id = ?6
             WHERE id = ?7;",
            params![
                task.name.as_str(),
                task.description.as_deref(),
                task.parent_task_id,
                task.due_date.as_deref(),
                task.department_id,
                task.status_id,
                task.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "task",
                id: task.id.0,
            });
        }
        Ok(())
    }

    fn list_tasks(&self, project: ProjectId) -> RepoResult<Vec<Task>> {
        self.query_tasks(
            &format!("{TASK_SELECT_SQL} WHERE project_id = ?1 ORDER BY id ASC;"),
            project.0,
        )
    }

    fn list_subtasks(&self, parent: TaskId) -> RepoResult<Vec<Task>> {
        self.query_tasks(
            &format!("{TASK_SELECT_SQL} WHERE parent_task_id = ?1 ORDER BY id ASC;"),
            parent.0,
        )
    }

    fn task_counters(&self, project: ProjectId) -> RepoResult<TaskCounters> {
        let (total, completed): (i64, i64) = self.conn.query_row(
            "SELECT
                COUNT(t.id),
                COALESCE(SUM(CASE WHEN s.name = ?2 THEN 1 ELSE 0 END), 0)
             FROM tasks t
             LEFT JOIN statuses s ON s.id = t.status_id
             WHERE t.project_id = ?1;",
            params![project, COMPLETE_STATUS_NAME],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let counter = |value: i64| {
            u32::try_from(value)
                .map_err(|_| RepoError::InvalidData(format!("task counter out of range: {value}")))
        };
        Ok(TaskCounters {
            total: counter(total)?,
            completed: counter(completed)?,
        })
    }

    fn add_assignee(&self, task: TaskId, employee: EmployeeId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO task_assignees (task_id, employee_id) VALUES (?1, ?2);",
            params![task, employee],
        )?;
        Ok(())
    }

    fn list_assignees(&self, task: TaskId) -> RepoResult<Vec<Employee>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id
             FROM task_assignees ta
             JOIN employees e ON e.id = ta.employee_id
             WHERE ta.task_id = ?1
             ORDER BY e.id ASC;",
        )?;
        let ids = stmt
            .query_map(params![task], |row| row.get::<_, EmployeeId>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut assignees = Vec::with_capacity(ids.len());
        for id in ids {
            let employee = self
                .find_employee(&Selector::Internal(id), true)?
                .ok_or(RepoError::NotFound {
                    entity: "employee",
                    id: id.0,
                })?;
            assignees.push(employee);
        }
        Ok(assignees)
    }

    fn add_dependency(&self, dependency: TaskDependency) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO task_dependencies (parent_task_id, child_task_id) VALUES (?1, ?2);",
            params![dependency.parent(), dependency.child()],
        )?;
        Ok(())
    }

    fn list_dependents(&self, parent: TaskId) -> RepoResult<Vec<TaskId>> {
        self.query_task_ids(
            "SELECT child_task_id FROM task_dependencies
             WHERE parent_task_id = ?1 ORDER BY child_task_id ASC;",
            parent,
        )
    }

    fn list_prerequisites(&self, child: TaskId) -> RepoResult<Vec<TaskId>> {
        self.query_task_ids(
            "SELECT parent_task_id FROM task_dependencies
             WHERE child_task_id = ?1 ORDER BY parent_task_id ASC;",
            child,
        )
    }

    fn add_asset(&self, task: TaskId, link: &str) -> RepoResult<Asset> {
        let link = link.trim();
        require_text("asset_link", link, MAX_TASK_TEXT_CHARS)?;

        self.conn.execute(
            "INSERT INTO assets (task_id, asset_link) VALUES (?1, ?2);",
            params![task, link],
        )?;

        let id = AssetId(self.conn.last_insert_rowid());
        let asset = self.conn.query_row(
            "SELECT id, task_id, asset_link, date_created FROM assets WHERE id = ?1;",
            params![id],
            parse_asset_row,
        )?;
        Ok(asset)
    }

    fn list_assets(&self, task: TaskId) -> RepoResult<Vec<Asset>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, asset_link, date_created
             FROM assets WHERE task_id = ?1 ORDER BY id ASC;",
        )?;
        let assets = stmt
            .query_map(params![task], parse_asset_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(assets)
    }
}

impl SqliteEntityStore<'_> {
    fn query_tasks(&self, sql: &str, key: i64) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params![key])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn query_task_ids(&self, sql: &str, key: TaskId) -> RepoResult<Vec<TaskId>> {
        let mut stmt = self.conn.prepare(sql)?;
        let ids = stmt
            .query_map(params![key], |row| row.get::<_, TaskId>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        parent_task_id: row.get(4)?,
        due_date: row.get(5)?,
        department_id: row.get(6)?,
        status_id: row.get(7)?,
        date_created: row.get(8)?,
        thread_channel_id: row.get(9)?,
    })
}

fn parse_asset_row(row: &Row<'_>) -> rusqlite::Result<Asset> {
    Ok(Asset {
        id: row.get(0)?,
        task_id: row.get(1)?,
        link: row.get(2)?,
        date_created: row.get(3)?,
    })
}
