//! Project records and their forum naming rule.
//!
//! # Invariants
//! - `name` is unique and non-blank.
//! - A project is bound to exactly one forum channel for its whole life; edits
//!   rename the forum and re-render the overview message in place.

use crate::model::ids::{ChannelId, MainThread, ProjectId};
use crate::model::validation::{blank_to_none, check_optional_text, require_text, ValidationError};
use serde::{Deserialize, Serialize};

pub const MAX_PROJECT_NAME_CHARS: usize = 150;
pub const MAX_PROJECT_TEXT_CHARS: usize = 2000;

/// Persisted project row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub docs_link: Option<String>,
    pub repo_link: Option<String>,
    pub storage_link: Option<String>,
    /// Unix epoch milliseconds.
    pub date_created: i64,
    pub forum_channel_id: ChannelId,
    pub main_thread: MainThread,
}

impl Project {
    pub fn details(&self) -> ProjectDetails {
        ProjectDetails {
            name: self.name.clone(),
            description: self.description.clone(),
            docs_link: self.docs_link.clone(),
            repo_link: self.repo_link.clone(),
            storage_link: self.storage_link.clone(),
        }
    }

    /// Replaces every user-editable field.
    pub fn apply_details(&mut self, details: &ProjectDetails) {
        self.name = details.name.clone();
        self.description = details.description.clone();
        self.docs_link = details.docs_link.clone();
        self.repo_link = details.repo_link.clone();
        self.storage_link = details.storage_link.clone();
    }
}

/// User-editable project fields, as submitted by the create/edit forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub name: String,
    pub description: Option<String>,
    pub docs_link: Option<String>,
    pub repo_link: Option<String>,
    pub storage_link: Option<String>,
}

impl ProjectDetails {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Trims the name and turns blank optional fields into `None`.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            description: blank_to_none(self.description),
            docs_link: blank_to_none(self.docs_link),
            repo_link: blank_to_none(self.repo_link),
            storage_link: blank_to_none(self.storage_link),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, MAX_PROJECT_NAME_CHARS)?;
        check_optional_text("description", self.description.as_deref(), MAX_PROJECT_TEXT_CHARS)?;
        check_optional_text("docs_link", self.docs_link.as_deref(), MAX_PROJECT_TEXT_CHARS)?;
        check_optional_text("repo_link", self.repo_link.as_deref(), MAX_PROJECT_TEXT_CHARS)?;
        check_optional_text(
            "storage_link",
            self.storage_link.as_deref(),
            MAX_PROJECT_TEXT_CHARS,
        )?;
        Ok(())
    }
}

/// Insert payload: validated details plus the external ids created for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub details: ProjectDetails,
    pub forum_channel_id: ChannelId,
    pub main_thread: MainThread,
}

/// Task counters shown on the project overview message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounters {
    pub total: u32,
    pub completed: u32,
}

impl TaskCounters {
    pub fn incomplete(&self) -> u32 {
        self.total.saturating_sub(self.completed)
    }
}

/// Derives the forum channel name: lowercase, spaces become hyphens.
pub fn forum_channel_name(project_name: &str) -> String {
    project_name.replace(' ', "-").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{forum_channel_name, ProjectDetails, TaskCounters};
    use crate::model::validation::ValidationError;

    #[test]
    fn channel_name_is_lowercase_with_hyphens() {
        assert_eq!(forum_channel_name("Alpha Launch"), "alpha-launch");
        assert_eq!(forum_channel_name("Alpha Launch 2"), "alpha-launch-2");
        assert_eq!(forum_channel_name("ROVER"), "rover");
    }

    #[test]
    fn normalized_drops_blank_optional_fields() {
        let details = ProjectDetails {
            name: "  Rover ".to_string(),
            description: Some("   ".to_string()),
            docs_link: Some(" https://docs.example/rover ".to_string()),
            repo_link: None,
            storage_link: Some(String::new()),
        }
        .normalized();
        assert_eq!(details.name, "Rover");
        assert_eq!(details.description, None);
        assert_eq!(details.docs_link.as_deref(), Some("https://docs.example/rover"));
        assert_eq!(details.storage_link, None);
    }

    #[test]
    fn validate_rejects_blank_and_oversized_names() {
        assert_eq!(
            ProjectDetails::new(" ").validate(),
            Err(ValidationError::EmptyField("name"))
        );
        assert!(matches!(
            ProjectDetails::new("x".repeat(151)).validate(),
            Err(ValidationError::FieldTooLong { field: "name", .. })
        ));
    }

    #[test]
    fn incomplete_counter_is_derived() {
        let counters = TaskCounters {
            total: 5,
            completed: 2,
        };
        assert_eq!(counters.incomplete(), 3);
    }
}
