//! Project persistence.
//!
//! # Invariants
//! - Project names are unique; the forum and main thread ids are unique.
//! - An external selector resolves by forum channel id only. Resolving from a
//!   sub-thread needs the platform and lives in the binding layer.

use crate::model::ids::ProjectId;
use crate::model::project::{NewProject, Project};
use crate::model::selector::{ProjectSelector, Selector};
use crate::repo::{RepoError, RepoResult, SqliteEntityStore};
use rusqlite::{params, OptionalExtension, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    docs_link,
    repo_link,
    storage_link,
    date_created,
    forum_channel_id,
    main_thread_id
FROM projects";

/// Repository interface for projects.
pub trait ProjectRepository {
    fn create_project(&self, project: &NewProject) -> RepoResult<Project>;
    fn find_project(&self, selector: &ProjectSelector) -> RepoResult<Option<Project>>;
    fn find_project_by_name(&self, name: &str) -> RepoResult<Option<Project>>;
    /// Writes name, description and links back; ids and timestamps are fixed.
    fn update_project(&self, project: &Project) -> RepoResult<()>;
    fn list_projects(&self) -> RepoResult<Vec<Project>>;
}

impl ProjectRepository for SqliteEntityStore<'_> {
    fn create_project(&self, project: &NewProject) -> RepoResult<Project> {
        project.details.validate()?;

        let details = &project.details;
        self.conn.execute(
            "INSERT INTO projects (
                name,
                description,
                docs_link,
                repo_link,
                storage_link,
                forum_channel_id,
                main_thread_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                details.name.as_str(),
                details.description.as_deref(),
                details.docs_link.as_deref(),
                details.repo_link.as_deref(),
                details.storage_link.as_deref(),
                project.forum_channel_id,
                project.main_thread,
            ],
        )?;

        let id = ProjectId(self.conn.last_insert_rowid());
        self.find_project(&Selector::Internal(id))?
            .ok_or(RepoError::NotFound {
                entity: "project",
                id: id.0,
            })
    }

    fn find_project(&self, selector: &ProjectSelector) -> RepoResult<Option<Project>> {
        let (column, key) = match selector {
            Selector::Internal(id) => ("id", id.0),
            Selector::External(channel) => match i64::try_from(channel.0) {
                Ok(value) => ("forum_channel_id", value),
                Err(_) => return Ok(None),
            },
        };

        let project = self
            .conn
            .query_row(
                &format!("{PROJECT_SELECT_SQL} WHERE {column} = ?1;"),
                params![key],
                |row| Ok(parse_project_row(row)),
            )
            .optional()?;
        project.transpose()
    }

    fn find_project_by_name(&self, name: &str) -> RepoResult<Option<Project>> {
        let project = self
            .conn
            .query_row(
                &format!("{PROJECT_SELECT_SQL} WHERE name = ?1;"),
                params![name],
                |row| Ok(parse_project_row(row)),
            )
            .optional()?;
        project.transpose()
    }

    fn update_project(&self, project: &Project) -> RepoResult<()> {
        project.details().validate()?;

        let changed = self.conn.execute(
            "UPDATE projects
             SET
                name = ?1,
                description = ?2,
                docs_link = ?3,
                repo_link = ?4,
                storage_link = ?5
             WHERE id = ?6;",
            params![
                project.name.as_str(),
                project.description.as_deref(),
                project.docs_link.as_deref(),
                project.repo_link.as_deref(),
                project.storage_link.as_deref(),
                project.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project",
                id: project.id.0,
            });
        }
        Ok(())
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        docs_link: row.get(3)?,
        repo_link: row.get(4)?,
        storage_link: row.get(5)?,
        date_created: row.get(6)?,
        forum_channel_id: row.get(7)?,
        main_thread: row.get(8)?,
    })
}
