//! Employee directory persistence.
//!
//! # Invariants
//! - `external_id` is unique; a second registration of the same identity is a
//!   uniqueness conflict.
//! - Employees are never hard-deleted; deactivation sets level 0.
//! - Directory corrections are written in one transaction or not at all.

use crate::model::access::AccessLevel;
use crate::model::catalog::Department;
use crate::model::employee::{Employee, NewEmployee, MAX_USERNAME_CHARS};
use crate::model::ids::{DepartmentId, EmployeeId, UserId};
use crate::model::selector::{EmployeeSelector, Selector};
use crate::model::validation::check_optional_text;
use crate::repo::{RepoError, RepoResult, SqliteEntityStore};
use rusqlite::{params, OptionalExtension, Row, Transaction, TransactionBehavior};

const EMPLOYEE_SELECT_SQL: &str = "SELECT
    id,
    username,
    external_id,
    access_level,
    utc_offset,
    date_joined
FROM employees";

/// One correction produced by a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryChange {
    Rename { id: EmployeeId, username: String },
    /// Level 0 and display name cleared.
    Deactivate { id: EmployeeId },
}

/// Repository interface for the employee directory.
pub trait EmployeeRepository {
    fn create_employee(&self, employee: &NewEmployee) -> RepoResult<Employee>;
    /// Inactive (level 0) rows are skipped unless `include_inactive` is set.
    fn find_employee(
        &self,
        selector: &EmployeeSelector,
        include_inactive: bool,
    ) -> RepoResult<Option<Employee>>;
    /// Writes the full row back.
    fn update_employee(&self, employee: &Employee) -> RepoResult<()>;
    fn list_active_employees(&self) -> RepoResult<Vec<Employee>>;
    /// Level of the identity, or level 0 when it is not registered.
    fn access_level_of(&self, user: UserId) -> RepoResult<AccessLevel>;
    fn apply_directory_changes(&self, changes: &[DirectoryChange]) -> RepoResult<usize>;
    fn assign_department(&self, employee: EmployeeId, department: DepartmentId)
        -> RepoResult<()>;
    fn list_employee_departments(&self, employee: EmployeeId) -> RepoResult<Vec<Department>>;
}

impl EmployeeRepository for SqliteEntityStore<'_> {
    fn create_employee(&self, employee: &NewEmployee) -> RepoResult<Employee> {
        employee.validate()?;

        self.conn.execute(
            "INSERT INTO employees (username, external_id, access_level, utc_offset)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                employee.username.as_deref(),
                employee.external_id,
                employee.access_level,
                employee.utc_offset,
            ],
        )?;

        let id = EmployeeId(self.conn.last_insert_rowid());
        load_employee(self, id)
    }

    fn find_employee(
        &self,
        selector: &EmployeeSelector,
        include_inactive: bool,
    ) -> RepoResult<Option<Employee>> {
        let (column, key) = match selector {
            Selector::Internal(id) => ("id", id.0),
            Selector::External(user) => match i64::try_from(user.0) {
                Ok(value) => ("external_id", value),
                Err(_) => return Ok(None),
            },
        };

        let employee = self
            .conn
            .query_row(
                &format!(
                    "{EMPLOYEE_SELECT_SQL}
                     WHERE {column} = ?1
                       AND (?2 = 1 OR access_level > 0);"
                ),
                params![key, include_inactive],
                |row| Ok(parse_employee_row(row)),
            )
            .optional()?;

        employee.transpose()
    }

    fn update_employee(&self, employee: &Employee) -> RepoResult<()> {
        check_optional_text("username", employee.username.as_deref(), MAX_USERNAME_CHARS)?;

        let changed = self.conn.execute(
            "UPDATE employees
             SET
                username = ?1,
                access_level = ?2,
                utc_offset = ?3
             WHERE id = ?4;",
            params![
                employee.username.as_deref(),
                employee.access_level,
                employee.utc_offset,
                employee.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "employee",
                id: employee.id.0,
            });
        }
        Ok(())
    }

    fn list_active_employees(&self) -> RepoResult<Vec<Employee>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EMPLOYEE_SELECT_SQL} WHERE access_level > 0 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut employees = Vec::new();
        while let Some(row) = rows.next()? {
            employees.push(parse_employee_row(row)?);
        }
        Ok(employees)
    }

    fn access_level_of(&self, user: UserId) -> RepoResult<AccessLevel> {
        let employee = self.find_employee(&Selector::External(user), true)?;
        Ok(employee.map_or(AccessLevel::DEACTIVATED, |row| row.access_level))
    }

    fn apply_directory_changes(&self, changes: &[DirectoryChange]) -> RepoResult<usize> {
        if changes.is_empty() {
            return Ok(0);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for change in changes {
            let (changed, id) = match change {
                DirectoryChange::Rename { id, username } => {
                    check_optional_text("username", Some(username.as_str()), MAX_USERNAME_CHARS)?;
                    let changed = tx.execute(
                        "UPDATE employees SET username = ?1 WHERE id = ?2;",
                        params![username, id],
                    )?;
                    (changed, id)
                }
                DirectoryChange::Deactivate { id } => {
                    let changed = tx.execute(
                        "UPDATE employees SET access_level = 0, username = NULL WHERE id = ?1;",
                        params![id],
                    )?;
                    (changed, id)
                }
            };
            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: "employee",
                    id: id.0,
                });
            }
        }
        tx.commit()?;

        Ok(changes.len())
    }

    fn assign_department(
        &self,
        employee: EmployeeId,
        department: DepartmentId,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO employee_departments (employee_id, department_id) VALUES (?1, ?2);",
            params![employee, department],
        )?;
        Ok(())
    }

    fn list_employee_departments(&self, employee: EmployeeId) -> RepoResult<Vec<Department>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.id, d.name
             FROM employee_departments ed
             JOIN departments d ON d.id = ed.department_id
             WHERE ed.employee_id = ?1
             ORDER BY d.id ASC;",
        )?;
        let departments = stmt
            .query_map(params![employee], |row| {
                Ok(Department {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(departments)
    }
}

fn load_employee(store: &SqliteEntityStore<'_>, id: EmployeeId) -> RepoResult<Employee> {
    store
        .find_employee(&Selector::Internal(id), true)?
        .ok_or(RepoError::NotFound {
            entity: "employee",
            id: id.0,
        })
}

fn parse_employee_row(row: &Row<'_>) -> RepoResult<Employee> {
    let raw_offset: Option<i64> = row.get(4)?;
    let utc_offset = raw_offset
        .map(|value| {
            i8::try_from(value)
                .map_err(|_| RepoError::InvalidData(format!("utc_offset out of range: {value}")))
        })
        .transpose()?;

    Ok(Employee {
        id: row.get(0)?,
        username: row.get(1)?,
        external_id: row.get(2)?,
        access_level: row.get(3)?,
        utc_offset,
        date_joined: row.get(5)?,
    })
}
