//! Read access to the seeded department and status catalogs.

use crate::model::catalog::{Department, Status};
use crate::model::ids::{DepartmentId, StatusId};
use crate::repo::{RepoResult, SqliteEntityStore};
use rusqlite::{params, OptionalExtension};

pub trait CatalogRepository {
    fn list_departments(&self) -> RepoResult<Vec<Department>>;
    fn find_department(&self, id: DepartmentId) -> RepoResult<Option<Department>>;
    /// Table order; project tags are created in this order.
    fn list_statuses(&self) -> RepoResult<Vec<Status>>;
    fn find_status(&self, id: StatusId) -> RepoResult<Option<Status>>;
}

impl CatalogRepository for SqliteEntityStore<'_> {
    fn list_departments(&self) -> RepoResult<Vec<Department>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM departments ORDER BY id ASC;")?;
        let departments = stmt
            .query_map([], |row| {
                Ok(Department {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(departments)
    }

    fn find_department(&self, id: DepartmentId) -> RepoResult<Option<Department>> {
        let department = self
            .conn
            .query_row(
                "SELECT id, name FROM departments WHERE id = ?1;",
                params![id],
                |row| {
                    Ok(Department {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(department)
    }

    fn list_statuses(&self) -> RepoResult<Vec<Status>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, emoji FROM statuses ORDER BY id ASC;")?;
        let statuses = stmt
            .query_map([], |row| {
                Ok(Status {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    emoji: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(statuses)
    }

    fn find_status(&self, id: StatusId) -> RepoResult<Option<Status>> {
        let status = self
            .conn
            .query_row(
                "SELECT id, name, emoji FROM statuses WHERE id = ?1;",
                params![id],
                |row| {
                    Ok(Status {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        emoji: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::CatalogRepository;
    use crate::db::open_db_in_memory;
    use crate::model::catalog::COMPLETE_STATUS_NAME;
    use crate::model::ids::StatusId;
    use crate::repo::SqliteEntityStore;

    #[test]
    fn seeded_catalog_is_listed_in_table_order() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteEntityStore::try_new(&conn).unwrap();

        let departments: Vec<String> = store
            .list_departments()
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(
            departments,
            ["Mechanic", "Developer", "Artist", "Builder", "Marketing", "Finance", "HR"]
        );

        let statuses = store.list_statuses().unwrap();
        assert_eq!(statuses.len(), 6);
        assert_eq!(statuses[0].name, "Unassigned");
        assert_eq!(statuses[5].name, COMPLETE_STATUS_NAME);
        assert!(store.find_status(StatusId(99)).unwrap().is_none());
    }
}
