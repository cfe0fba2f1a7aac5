//! Conversation timeline.
//!
//! An append-only list of chat items. Pending bot placeholders are
//! resolved in place by id; nothing is ever removed.

use crate::format::{GREETING, PENDING_PLACEHOLDER};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Identifier of a timeline item, unique within a timeline.
pub type MessageId = u64;

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    /// Whether the message is still waiting to be resolved.
    pub pending: bool,
}

/// A message that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub role: Role,
    pub content: String,
    pub pending: bool,
}

impl NewMessage {
    /// A resolved bot message.
    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
            pending: false,
        }
    }

    /// A bot message still in progress.
    pub fn pending_bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
            pending: true,
        }
    }
}

/// One displayed unit of the chat view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TimelineItem {
    /// Date/context divider.
    Separator { id: MessageId, text: String },
    Message(Message),
}

impl TimelineItem {
    pub fn id(&self) -> MessageId {
        match self {
            Self::Separator { id, .. } => *id,
            Self::Message(m) => m.id,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(m) => Some(m),
            Self::Separator { .. } => None,
        }
    }

    /// Whether this is a bot message still waiting for its content.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Message(m) if m.pending)
    }
}

/// Ordered, append-only chat history.
#[derive(Debug, Clone)]
pub struct Timeline {
    items: Vec<TimelineItem>,
    next_id: MessageId,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }

    /// Create a timeline seeded with the chat header and greeting.
    pub fn with_greeting(now: DateTime<Local>) -> Self {
        let mut timeline = Self::new();
        timeline.append_separator("iMessage");
        timeline.append_separator(format!("Today {}", now.format("%-I:%M %p")));
        timeline.append_message(NewMessage::bot(GREETING));
        timeline
    }

    fn allocate_id(&mut self) -> MessageId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Get all items in append order.
    pub fn items(&self) -> &[TimelineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a message by id.
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.items
            .iter()
            .filter_map(TimelineItem::as_message)
            .find(|m| m.id == id)
    }

    fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.items.iter_mut().find_map(|item| match item {
            TimelineItem::Message(m) if m.id == id => Some(m),
            _ => None,
        })
    }

    /// Number of messages still pending.
    pub fn pending_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_pending()).count()
    }

    /// Index of the most recent user message, if any.
    pub fn last_user_index(&self) -> Option<usize> {
        self.items
            .iter()
            .rposition(|item| matches!(item, TimelineItem::Message(m) if m.role == Role::User))
    }

    /// Append a separator.
    pub fn append_separator(&mut self, text: impl Into<String>) -> MessageId {
        let id = self.allocate_id();
        self.items.push(TimelineItem::Separator {
            id,
            text: text.into(),
        });
        id
    }

    /// Append a user message followed by a pending bot placeholder.
    ///
    /// Returns the placeholder id. Blank text is rejected and leaves the
    /// timeline untouched.
    pub fn append_user_message(&mut self, text: &str) -> Result<MessageId, TimelineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TimelineError::EmptyMessage);
        }

        let user_id = self.allocate_id();
        self.items.push(TimelineItem::Message(Message {
            id: user_id,
            role: Role::User,
            content: text.to_string(),
            pending: false,
        }));

        Ok(self.append_message(NewMessage::pending_bot(PENDING_PLACEHOLDER)))
    }

    /// Append a message, returning its id.
    pub fn append_message(&mut self, message: NewMessage) -> MessageId {
        let id = self.allocate_id();
        self.items.push(TimelineItem::Message(Message {
            id,
            role: message.role,
            content: message.content,
            pending: message.pending,
        }));
        id
    }

    /// Replace a message's content and clear its pending flag.
    ///
    /// Unknown ids are ignored; returns whether a message was updated.
    pub fn resolve_pending(&mut self, id: MessageId, content: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(message) => {
                message.content = content.into();
                message.pending = false;
                true
            }
            None => {
                tracing::debug!(id, "Ignoring resolve for unknown message");
                false
            }
        }
    }

    /// Replace a message's content, leaving its pending flag alone.
    ///
    /// Unknown ids are ignored; returns whether a message was updated.
    pub fn update_content(&mut self, id: MessageId, content: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(message) => {
                message.content = content.into();
                true
            }
            None => false,
        }
    }
}

/// Errors from timeline mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    /// The message was empty after trimming.
    #[error("message is empty")]
    EmptyMessage,
}
