//! Deterministic in-process platform.
//!
//! Backs tests and offline runs. Ids are allocated sequentially from 1000; a
//! thread and its opening message share one allocated id. Failures can be
//! injected per operation or per member lookup.

use crate::model::ids::{ChannelId, MessageId, TagId, ThreadWithMessage, UserId};
use crate::platform::{
    ChannelInfo, ChannelKind, ChatPlatform, ForumRequest, PermissionOverwrite, PlatformError,
    PlatformResult, RenderedMessage, TagRequest,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

const FIRST_ID: u64 = 1000;

#[derive(Debug, Clone)]
struct StoredMessage {
    channel: ChannelId,
    content: RenderedMessage,
    pinned: bool,
    edits: u32,
}

#[derive(Debug, Default)]
struct ForumState {
    tags: Vec<(TagId, TagRequest)>,
    overwrites: Vec<PermissionOverwrite>,
}

#[derive(Debug)]
struct PlatformState {
    next_id: u64,
    channels: BTreeMap<ChannelId, ChannelInfo>,
    cached: BTreeSet<ChannelId>,
    forums: BTreeMap<ChannelId, ForumState>,
    pinned_threads: BTreeSet<ChannelId>,
    messages: BTreeMap<MessageId, StoredMessage>,
    members: BTreeMap<UserId, String>,
    failing_operations: BTreeSet<&'static str>,
    failing_members: BTreeSet<UserId>,
    commands: Vec<String>,
    fetch_count: u32,
    write_count: u32,
}

impl Default for PlatformState {
    fn default() -> Self {
        Self {
            next_id: FIRST_ID,
            channels: BTreeMap::new(),
            cached: BTreeSet::new(),
            forums: BTreeMap::new(),
            pinned_threads: BTreeSet::new(),
            messages: BTreeMap::new(),
            members: BTreeMap::new(),
            failing_operations: BTreeSet::new(),
            failing_members: BTreeSet::new(),
            commands: Vec::new(),
            fetch_count: 0,
            write_count: 0,
        }
    }
}

impl PlatformState {
    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check(&self, operation: &'static str) -> PlatformResult<()> {
        if self.failing_operations.contains(operation) {
            return Err(PlatformError::Unavailable {
                operation,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn insert_channel(&mut self, info: ChannelInfo) {
        self.cached.insert(info.id);
        self.channels.insert(info.id, info);
    }

    fn message_mut(
        &mut self,
        operation: &'static str,
        channel: ChannelId,
        message: MessageId,
    ) -> PlatformResult<&mut StoredMessage> {
        match self.messages.get_mut(&message) {
            Some(stored) if stored.channel == channel => Ok(stored),
            _ => Err(PlatformError::InvalidRequest {
                operation,
                message: format!("message {message} not found in channel {channel}"),
            }),
        }
    }
}

/// In-memory [`ChatPlatform`] with inspection helpers.
#[derive(Debug, Default)]
pub struct InMemoryPlatform {
    state: RefCell<PlatformState>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, user: UserId, display_name: impl Into<String>) {
        self.state
            .borrow_mut()
            .members
            .insert(user, display_name.into());
    }

    pub fn remove_member(&self, user: UserId) {
        self.state.borrow_mut().members.remove(&user);
    }

    /// Creates a plain text channel, e.g. to issue commands outside any project.
    pub fn add_text_channel(&self, name: &str) -> ChannelId {
        let mut state = self.state.borrow_mut();
        let id = ChannelId(state.allocate());
        state.insert_channel(ChannelInfo {
            id,
            kind: ChannelKind::Text,
            parent: None,
            name: name.to_string(),
        });
        id
    }

    /// Makes every subsequent call of `operation` fail until cleared.
    pub fn fail_operation(&self, operation: &'static str) {
        self.state.borrow_mut().failing_operations.insert(operation);
    }

    /// Makes the display-name lookup of one member fail.
    pub fn fail_member_lookup(&self, user: UserId) {
        self.state.borrow_mut().failing_members.insert(user);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.borrow_mut();
        state.failing_operations.clear();
        state.failing_members.clear();
    }

    /// Drops a channel from the local cache; lookups then need a fetch.
    pub fn evict_from_cache(&self, channel: ChannelId) {
        self.state.borrow_mut().cached.remove(&channel);
    }

    pub fn fetch_count(&self) -> u32 {
        self.state.borrow().fetch_count
    }

    /// Number of successful mutating calls.
    pub fn write_count(&self) -> u32 {
        self.state.borrow().write_count
    }

    pub fn channel(&self, channel: ChannelId) -> Option<ChannelInfo> {
        self.state.borrow().channels.get(&channel).cloned()
    }

    pub fn forum_tags(&self, forum: ChannelId) -> Vec<TagRequest> {
        self.state
            .borrow()
            .forums
            .get(&forum)
            .map(|state| state.tags.iter().map(|(_, tag)| tag.clone()).collect())
            .unwrap_or_default()
    }

    pub fn forum_overwrites(&self, forum: ChannelId) -> Vec<PermissionOverwrite> {
        self.state
            .borrow()
            .forums
            .get(&forum)
            .map(|state| state.overwrites.clone())
            .unwrap_or_default()
    }

    pub fn threads_in(&self, forum: ChannelId) -> Vec<ChannelInfo> {
        self.state
            .borrow()
            .channels
            .values()
            .filter(|info| info.kind == ChannelKind::Thread && info.parent == Some(forum))
            .cloned()
            .collect()
    }

    pub fn message(&self, message: MessageId) -> Option<RenderedMessage> {
        self.state
            .borrow()
            .messages
            .get(&message)
            .map(|stored| stored.content.clone())
    }

    pub fn message_count(&self, channel: ChannelId) -> usize {
        self.state
            .borrow()
            .messages
            .values()
            .filter(|stored| stored.channel == channel)
            .count()
    }

    pub fn edit_count(&self, message: MessageId) -> u32 {
        self.state
            .borrow()
            .messages
            .get(&message)
            .map_or(0, |stored| stored.edits)
    }

    /// Command names from the last successful publish.
    pub fn published_commands(&self) -> Vec<String> {
        self.state.borrow().commands.clone()
    }

    pub fn is_thread_pinned(&self, thread: ChannelId) -> bool {
        self.state.borrow().pinned_threads.contains(&thread)
    }

    pub fn is_message_pinned(&self, message: MessageId) -> bool {
        self.state
            .borrow()
            .messages
            .get(&message)
            .is_some_and(|stored| stored.pinned)
    }
}

impl ChatPlatform for InMemoryPlatform {
    fn publish_commands(&self, names: &[&str]) -> PlatformResult<usize> {
        let mut state = self.state.borrow_mut();
        state.check("publish_commands")?;
        state.commands = names.iter().map(|name| name.to_string()).collect();
        state.write_count += 1;
        Ok(state.commands.len())
    }

    fn create_forum(&self, request: &ForumRequest) -> PlatformResult<ChannelId> {
        let mut state = self.state.borrow_mut();
        state.check("create_forum")?;
        if request.name.trim().is_empty() {
            return Err(PlatformError::InvalidRequest {
                operation: "create_forum",
                message: "forum name must not be empty".to_string(),
            });
        }

        let id = ChannelId(state.allocate());
        state.insert_channel(ChannelInfo {
            id,
            kind: ChannelKind::Forum,
            parent: request.category,
            name: request.name.clone(),
        });
        state.forums.insert(
            id,
            ForumState {
                tags: Vec::new(),
                overwrites: request.overwrites.clone(),
            },
        );
        state.write_count += 1;
        Ok(id)
    }

    fn create_tag(&self, forum: ChannelId, request: &TagRequest) -> PlatformResult<TagId> {
        let mut state = self.state.borrow_mut();
        state.check("create_tag")?;
        let id = TagId(state.allocate());
        let forum_state = state
            .forums
            .get_mut(&forum)
            .ok_or_else(|| PlatformError::InvalidRequest {
                operation: "create_tag",
                message: format!("channel {forum} is not a forum"),
            })?;
        forum_state.tags.push((id, request.clone()));
        state.write_count += 1;
        Ok(id)
    }

    fn create_thread(
        &self,
        forum: ChannelId,
        name: &str,
        message: &RenderedMessage,
    ) -> PlatformResult<ThreadWithMessage> {
        let mut state = self.state.borrow_mut();
        state.check("create_thread")?;
        if !state.forums.contains_key(&forum) {
            return Err(PlatformError::InvalidRequest {
                operation: "create_thread",
                message: format!("channel {forum} is not a forum"),
            });
        }

        let raw = state.allocate();
        let created = ThreadWithMessage {
            thread: ChannelId(raw),
            message: MessageId(raw),
        };
        state.insert_channel(ChannelInfo {
            id: created.thread,
            kind: ChannelKind::Thread,
            parent: Some(forum),
            name: name.to_string(),
        });
        state.messages.insert(
            created.message,
            StoredMessage {
                channel: created.thread,
                content: message.clone(),
                pinned: false,
                edits: 0,
            },
        );
        state.write_count += 1;
        Ok(created)
    }

    fn pin_thread(&self, thread: ChannelId) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();
        state.check("pin_thread")?;
        let is_thread = state
            .channels
            .get(&thread)
            .is_some_and(|info| info.kind == ChannelKind::Thread);
        if !is_thread {
            return Err(PlatformError::InvalidRequest {
                operation: "pin_thread",
                message: format!("channel {thread} is not a thread"),
            });
        }
        state.pinned_threads.insert(thread);
        state.write_count += 1;
        Ok(())
    }

    fn pin_message(&self, channel: ChannelId, message: MessageId) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();
        state.check("pin_message")?;
        state.message_mut("pin_message", channel, message)?.pinned = true;
        state.write_count += 1;
        Ok(())
    }

    fn rename_channel(&self, channel: ChannelId, name: &str) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();
        state.check("rename_channel")?;
        let info = state
            .channels
            .get_mut(&channel)
            .ok_or_else(|| PlatformError::InvalidRequest {
                operation: "rename_channel",
                message: format!("channel {channel} not found"),
            })?;
        info.name = name.to_string();
        state.write_count += 1;
        Ok(())
    }

    fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: &RenderedMessage,
    ) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();
        state.check("edit_message")?;
        let stored = state.message_mut("edit_message", channel, message)?;
        stored.content = content.clone();
        stored.edits += 1;
        state.write_count += 1;
        Ok(())
    }

    fn member_display_name(&self, user: UserId) -> PlatformResult<Option<String>> {
        let state = self.state.borrow();
        state.check("member_display_name")?;
        if state.failing_members.contains(&user) {
            return Err(PlatformError::Unavailable {
                operation: "member_display_name",
                message: format!("injected failure for member {user}"),
            });
        }
        Ok(state.members.get(&user).cloned())
    }

    fn cached_channel(&self, channel: ChannelId) -> Option<ChannelInfo> {
        let state = self.state.borrow();
        if !state.cached.contains(&channel) {
            return None;
        }
        state.channels.get(&channel).cloned()
    }

    fn fetch_channel(&self, channel: ChannelId) -> PlatformResult<Option<ChannelInfo>> {
        let mut state = self.state.borrow_mut();
        state.check("fetch_channel")?;
        state.fetch_count += 1;
        let info = state.channels.get(&channel).cloned();
        if info.is_some() {
            state.cached.insert(channel);
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryPlatform;
    use crate::model::ids::{ChannelId, UserId};
    use crate::platform::{ChatPlatform, ForumRequest, PlatformError, RenderedMessage};

    fn message() -> RenderedMessage {
        RenderedMessage {
            title: "Overview".to_string(),
            description: None,
            color: 0,
            fields: Vec::new(),
        }
    }

    #[test]
    fn thread_and_opening_message_share_id() {
        let platform = InMemoryPlatform::new();
        let forum = platform
            .create_forum(&ForumRequest {
                name: "alpha".to_string(),
                category: None,
                overwrites: Vec::new(),
            })
            .unwrap();
        let created = platform
            .create_thread(forum, "General Discussion", &message())
            .unwrap();
        assert!(created.shares_identity());
        assert_eq!(platform.message_count(created.thread), 1);
    }

    #[test]
    fn lookup_falls_back_to_fetch_after_eviction() {
        let platform = InMemoryPlatform::new();
        let channel = platform.add_text_channel("lobby");

        assert!(platform.get_or_fetch_channel(channel).unwrap().is_some());
        assert_eq!(platform.fetch_count(), 0);

        platform.evict_from_cache(channel);
        assert!(platform.get_or_fetch_channel(channel).unwrap().is_some());
        assert_eq!(platform.fetch_count(), 1);

        assert!(platform
            .get_or_fetch_channel(ChannelId(1))
            .unwrap()
            .is_none());
    }

    #[test]
    fn injected_member_failure_is_reported() {
        let platform = InMemoryPlatform::new();
        platform.add_member(UserId(7), "ada");
        platform.fail_member_lookup(UserId(7));
        assert!(matches!(
            platform.member_display_name(UserId(7)),
            Err(PlatformError::Unavailable { .. })
        ));
        platform.clear_failures();
        assert_eq!(
            platform.member_display_name(UserId(7)).unwrap().as_deref(),
            Some("ada")
        );
    }
}
