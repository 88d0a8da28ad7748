//! Identifier newtypes.
//!
//! Internal ids are SQLite rowids. External ids are platform snowflakes; a
//! thread and its opening message share one numeric value, which is modeled
//! explicitly by [`ThreadWithMessage`] and [`MainThread`].

use crate::model::validation::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

static CHANNEL_MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:<#(\d+)>|(\d+))$").expect("valid channel mention regex"));
static USER_MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:<@!?(\d+)>|(\d+))$").expect("valid user mention regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartmentId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusId(pub i64);

/// Platform channel, forum or thread id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

/// Platform message id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

/// Platform member identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

/// Platform forum tag id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub u64);

macro_rules! display_inner {
    ($($name:ident),+) => {
        $(impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        })+
    };
}

display_inner!(
    EmployeeId,
    ProjectId,
    TaskId,
    AssetId,
    DepartmentId,
    StatusId,
    ChannelId,
    MessageId,
    UserId,
    TagId
);

impl ChannelId {
    /// Renders the platform mention markup for this channel.
    pub fn mention(self) -> String {
        format!("<#{}>", self.0)
    }

    /// Accepts `<#123>` or a bare numeric id.
    pub fn parse_mention(value: &str) -> Result<Self, ValidationError> {
        parse_snowflake(&CHANNEL_MENTION_RE, value).map(Self)
    }
}

impl UserId {
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }

    /// Accepts `<@123>`, `<@!123>` or a bare numeric id.
    pub fn parse_mention(value: &str) -> Result<Self, ValidationError> {
        parse_snowflake(&USER_MENTION_RE, value).map(Self)
    }
}

fn parse_snowflake(pattern: &Regex, value: &str) -> Result<u64, ValidationError> {
    let trimmed = value.trim();
    pattern
        .captures(trimmed)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .and_then(|digits| digits.as_str().parse::<u64>().ok())
        .ok_or_else(|| ValidationError::InvalidMention(trimmed.to_string()))
}

/// A freshly created thread together with its opening message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadWithMessage {
    pub thread: ChannelId,
    pub message: MessageId,
}

impl ThreadWithMessage {
    /// The platform gives a thread and its opening message the same id.
    pub fn shares_identity(&self) -> bool {
        self.thread.0 == self.message.0
    }
}

/// A project's designated thread. Its id doubles as the id of the pinned
/// overview message, so only one value is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MainThread(ChannelId);

impl MainThread {
    /// Accepts a created thread only if the shared-identity invariant holds.
    pub fn from_created(created: ThreadWithMessage) -> Result<Self, ValidationError> {
        if !created.shares_identity() {
            return Err(ValidationError::ThreadMessageIdMismatch {
                thread: created.thread,
                message: created.message,
            });
        }
        Ok(Self(created.thread))
    }

    /// Rebuilds the handle from a persisted thread id.
    pub fn from_stored(thread: ChannelId) -> Self {
        Self(thread)
    }

    pub fn thread_id(self) -> ChannelId {
        self.0
    }

    pub fn opening_message_id(self) -> MessageId {
        MessageId(self.0 .0)
    }
}
