//! Chat platform boundary.
//!
//! # Responsibility
//! - Describe the channel, thread and message operations the core needs from
//!   the group-communication platform.
//! - Keep platform transport and caching out of binding and service code.
//!
//! # Invariants
//! - Absence is not an error: member and channel lookups return `Ok(None)`.
//! - A created thread reports the id of its opening message; callers check the
//!   shared identity through `MainThread::from_created`.

use crate::model::ids::{ChannelId, MessageId, TagId, ThreadWithMessage, UserId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;

pub use memory::InMemoryPlatform;

pub type PlatformResult<T> = Result<T, PlatformError>;

/// External write or lookup failure reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    Unavailable {
        operation: &'static str,
        message: String,
    },
    InvalidRequest {
        operation: &'static str,
        message: String,
    },
}

impl PlatformError {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Unavailable { operation, .. }
            | Self::InvalidRequest { operation, .. } => *operation,
        }
    }
}

impl Display for PlatformError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { operation, message } => {
                write!(f, "platform unavailable during {operation}: {message}")
            }
            Self::InvalidRequest { operation, message } => {
                write!(f, "invalid platform request for {operation}: {message}")
            }
        }
    }
}

impl Error for PlatformError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Forum,
    Thread,
    Text,
}

/// Snapshot of one platform channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub kind: ChannelKind,
    /// Forum of a thread, or category of a forum.
    pub parent: Option<ChannelId>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteTarget {
    /// The server-wide default role.
    Everyone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    SendMessages,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionOverwrite {
    pub target: OverwriteTarget,
    pub allow: Vec<Permission>,
    pub deny: Vec<Permission>,
}

impl PermissionOverwrite {
    /// Read-only forum for general membership; threads stay open.
    pub fn deny_send_messages(target: OverwriteTarget) -> Self {
        Self {
            target,
            allow: Vec::new(),
            deny: vec![Permission::SendMessages],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumRequest {
    pub name: String,
    pub category: Option<ChannelId>,
    pub overwrites: Vec<PermissionOverwrite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRequest {
    pub name: String,
    pub emoji: Option<String>,
    /// Only moderators may apply the tag.
    pub moderated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Platform-neutral rich message (title, body, colored accent, fields).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub title: String,
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<MessageField>,
}

impl RenderedMessage {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }
}

/// Operations the core performs against the chat platform.
pub trait ChatPlatform {
    fn create_forum(&self, request: &ForumRequest) -> PlatformResult<ChannelId>;
    fn create_tag(&self, forum: ChannelId, request: &TagRequest) -> PlatformResult<TagId>;
    fn create_thread(
        &self,
        forum: ChannelId,
        name: &str,
        message: &RenderedMessage,
    ) -> PlatformResult<ThreadWithMessage>;
    fn pin_thread(&self, thread: ChannelId) -> PlatformResult<()>;
    fn pin_message(&self, channel: ChannelId, message: MessageId) -> PlatformResult<()>;
    fn rename_channel(&self, channel: ChannelId, name: &str) -> PlatformResult<()>;
    fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: &RenderedMessage,
    ) -> PlatformResult<()>;
    /// Replaces the server's registered command list; returns how many were
    /// published.
    fn publish_commands(&self, names: &[&str]) -> PlatformResult<usize>;
    /// Current display name of a server member; `None` when not a member.
    fn member_display_name(&self, user: UserId) -> PlatformResult<Option<String>>;
    /// Local cache only; never performs a remote call.
    fn cached_channel(&self, channel: ChannelId) -> Option<ChannelInfo>;
    fn fetch_channel(&self, channel: ChannelId) -> PlatformResult<Option<ChannelInfo>>;

    /// Cache first, then one remote fetch.
    fn get_or_fetch_channel(&self, channel: ChannelId) -> PlatformResult<Option<ChannelInfo>> {
        if let Some(info) = self.cached_channel(channel) {
            return Ok(Some(info));
        }
        self.fetch_channel(channel)
    }
}
