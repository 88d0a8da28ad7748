//! Rich-message rendering for project overviews and task cards.

use crate::model::catalog::{Department, Status};
use crate::model::ids::ChannelId;
use crate::model::project::{ProjectDetails, TaskCounters};
use crate::platform::{MessageField, RenderedMessage};

/// Accent color of every message the binding posts.
pub const DEFAULT_EMBED_COLOR: u32 = 4_705_791;
pub const NONE_SET: &str = "None Set";

pub const FIELD_DOCUMENTATION: &str = "Documentation";
pub const FIELD_REPOSITORY: &str = "Repository";
pub const FIELD_STORAGE: &str = "Storage";
pub const FIELD_TOTAL_TASKS: &str = "Total Tasks";
pub const FIELD_COMPLETED_TASKS: &str = "Completed Tasks";
pub const FIELD_INCOMPLETE_TASKS: &str = "Incomplete Tasks";

/// Overview posted as the opening message of a project's main thread.
///
/// Link fields are omitted when unset; the three counters are always present.
pub fn project_overview(
    details: &ProjectDetails,
    counters: TaskCounters,
    color: u32,
) -> RenderedMessage {
    let mut fields = Vec::new();
    let links = [
        (FIELD_DOCUMENTATION, &details.docs_link),
        (FIELD_REPOSITORY, &details.repo_link),
        (FIELD_STORAGE, &details.storage_link),
    ];
    for (name, value) in links {
        if let Some(value) = value {
            fields.push(field(name, value.clone(), false));
        }
    }
    fields.push(field(FIELD_TOTAL_TASKS, counters.total.to_string(), true));
    fields.push(field(FIELD_COMPLETED_TASKS, counters.completed.to_string(), true));
    fields.push(field(
        FIELD_INCOMPLETE_TASKS,
        counters.incomplete().to_string(),
        true,
    ));

    RenderedMessage {
        title: details.name.clone(),
        description: details.description.clone(),
        color,
        fields,
    }
}

/// Values shown on a task card.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskCard<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub parent_thread: Option<ChannelId>,
    pub assignee: Option<&'a str>,
    pub due_date: Option<&'a str>,
    pub department: Option<&'a Department>,
    pub status: Option<&'a Status>,
}

pub fn task_card(card: &TaskCard<'_>, color: u32) -> RenderedMessage {
    let or_none = |value: Option<String>| value.unwrap_or_else(|| NONE_SET.to_string());

    RenderedMessage {
        title: card.name.to_string(),
        description: card.description.map(str::to_string),
        color,
        fields: vec![
            field(
                "Parent Task",
                or_none(card.parent_thread.map(ChannelId::mention)),
                true,
            ),
            field("Assignee", or_none(card.assignee.map(str::to_string)), true),
            field("Due Date", or_none(card.due_date.map(str::to_string)), true),
            field(
                "Department",
                or_none(card.department.map(|department| department.name.clone())),
                true,
            ),
            field(
                "Status",
                or_none(card.status.map(|status| status.name.clone())),
                true,
            ),
        ],
    }
}

fn field(name: &str, value: String, inline: bool) -> MessageField {
    MessageField {
        name: name.to_string(),
        value,
        inline,
    }
}
