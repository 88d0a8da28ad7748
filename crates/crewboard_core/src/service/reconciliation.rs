//! Directory reconciliation against platform membership.
//!
//! # Responsibility
//! - Compare every active employee with the platform member of the same
//!   identity and classify the drift.
//! - Persist renames and, in purge mode, deactivations.
//!
//! # Invariants
//! - One member's lookup never aborts the pass; failures are reported per
//!   member and cause no mutation for that member.
//! - All corrections commit in one transaction after every lookup finished.
//!   A failed commit leaves the directory untouched.
//! - Running a pass twice without membership changes yields no renames and
//!   the same missing set.

use crate::logging::log_value;
use crate::model::employee::Employee;
use crate::platform::{ChatPlatform, PlatformError};
use crate::repo::{DirectoryChange, EmployeeRepository};
use crate::service::ServiceResult;
use log::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationMode {
    /// Missing members are only reported.
    Report,
    /// Missing members are deactivated and their name cleared.
    Purge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberOutcome {
    Unchanged,
    Renamed {
        previous: Option<String>,
        current: String,
    },
    Missing,
    Purged,
    LookupFailed(PlatformError),
}

/// One employee as seen before the pass, and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberReport {
    pub employee: Employee,
    pub outcome: MemberOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub pass_id: Uuid,
    pub mode: ReconciliationMode,
    pub members: Vec<MemberReport>,
}

impl ReconciliationReport {
    pub fn checked(&self) -> usize {
        self.members.len()
    }

    pub fn unchanged(&self) -> usize {
        self.count(|outcome| matches!(outcome, MemberOutcome::Unchanged))
    }

    pub fn renamed(&self) -> usize {
        self.count(|outcome| matches!(outcome, MemberOutcome::Renamed { .. }))
    }

    pub fn missing(&self) -> usize {
        self.count(|outcome| matches!(outcome, MemberOutcome::Missing))
    }

    pub fn purged(&self) -> usize {
        self.count(|outcome| matches!(outcome, MemberOutcome::Purged))
    }

    pub fn lookup_failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, MemberOutcome::LookupFailed(_)))
    }

    /// Reply text for the refresh/purge commands.
    pub fn render(&self) -> String {
        let renamed: Vec<String> = self
            .members
            .iter()
            .filter_map(|member| match &member.outcome {
                MemberOutcome::Renamed { previous, current } => Some(format!(
                    "`{}` => `{current}` (ID: {})",
                    previous.as_deref().unwrap_or_default(),
                    member.employee.external_id
                )),
                _ => None,
            })
            .collect();
        let purged = self.lines(|outcome| matches!(outcome, MemberOutcome::Purged));
        let unresolved = self.lines(|outcome| {
            matches!(
                outcome,
                MemberOutcome::Missing | MemberOutcome::LookupFailed(_)
            )
        });

        let mut output = match self.mode {
            ReconciliationMode::Report if renamed.is_empty() => {
                ":white_check_mark: No usernames were updated.".to_string()
            }
            ReconciliationMode::Report => format!(
                ":white_check_mark: The following usernames were successfully updated:\n{}",
                renamed.join("\n")
            ),
            ReconciliationMode::Purge if purged.is_empty() => {
                ":white_check_mark: No employees were purged.".to_string()
            }
            ReconciliationMode::Purge => format!(
                ":white_check_mark: The following employees were successfully purged:\n{}",
                purged.join("\n")
            ),
        };
        if self.mode == ReconciliationMode::Purge && !renamed.is_empty() {
            output.push_str(&format!(
                "\n\nThe following usernames were successfully updated:\n{}",
                renamed.join("\n")
            ));
        }
        if !unresolved.is_empty() {
            output.push_str(&format!(
                "\n\nFailed to find the following users:\n{}\n\nThis may be because of a discord API error, or they have left the server and require manual purging via `/purge_employees`.",
                unresolved.join("\n")
            ));
        }
        output
    }

    fn count(&self, predicate: impl Fn(&MemberOutcome) -> bool) -> usize {
        self.members
            .iter()
            .filter(|member| predicate(&member.outcome))
            .count()
    }

    fn lines(&self, predicate: impl Fn(&MemberOutcome) -> bool) -> Vec<String> {
        self.members
            .iter()
            .filter(|member| predicate(&member.outcome))
            .map(|member| {
                format!(
                    "{} ({})",
                    member.employee.username.as_deref().unwrap_or("None"),
                    member.employee.external_id
                )
            })
            .collect()
    }
}

pub struct ReconciliationService<'a, R, P> {
    repo: &'a R,
    platform: &'a P,
}

impl<'a, R: EmployeeRepository, P: ChatPlatform> ReconciliationService<'a, R, P> {
    pub fn new(repo: &'a R, platform: &'a P) -> Self {
        Self { repo, platform }
    }

    pub fn run(&self, mode: ReconciliationMode) -> ServiceResult<ReconciliationReport> {
        let pass_id = Uuid::new_v4();
        let employees = self.repo.list_active_employees()?;
        info!(
            "event=reconcile_pass module=service status=start pass_id={pass_id} mode={mode:?} employees={}",
            employees.len()
        );

        let mut members = Vec::with_capacity(employees.len());
        let mut changes = Vec::new();
        for employee in employees {
            let outcome = self.classify(pass_id, mode, &employee);
            match &outcome {
                MemberOutcome::Renamed { current, .. } => changes.push(DirectoryChange::Rename {
                    id: employee.id,
                    username: current.clone(),
                }),
                MemberOutcome::Purged => {
                    changes.push(DirectoryChange::Deactivate { id: employee.id })
                }
                _ => {}
            }
            members.push(MemberReport { employee, outcome });
        }

        if let Err(err) = self.repo.apply_directory_changes(&changes) {
            warn!(
                "event=reconcile_pass module=service status=error pass_id={pass_id} error={}",
                log_value(&err.to_string())
            );
            return Err(err.into());
        }

        let report = ReconciliationReport {
            pass_id,
            mode,
            members,
        };
        info!(
            "event=reconcile_pass module=service status=ok pass_id={pass_id} checked={} renamed={} missing={} purged={} lookup_failed={}",
            report.checked(),
            report.renamed(),
            report.missing(),
            report.purged(),
            report.lookup_failed()
        );
        Ok(report)
    }

    fn classify(
        &self,
        pass_id: Uuid,
        mode: ReconciliationMode,
        employee: &Employee,
    ) -> MemberOutcome {
        match self.platform.member_display_name(employee.external_id) {
            Ok(Some(name)) if employee.username.as_deref() == Some(name.as_str()) => {
                MemberOutcome::Unchanged
            }
            Ok(Some(name)) => MemberOutcome::Renamed {
                previous: employee.username.clone(),
                current: name,
            },
            Ok(None) => match mode {
                ReconciliationMode::Report => MemberOutcome::Missing,
                ReconciliationMode::Purge => MemberOutcome::Purged,
            },
            Err(err) => {
                warn!(
                    "event=reconcile_lookup module=service status=error pass_id={pass_id} employee_id={} operation={} error={}",
                    employee.id,
                    err.operation(),
                    log_value(&err.to_string())
                );
                MemberOutcome::LookupFailed(err)
            }
        }
    }
}
