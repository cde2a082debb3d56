use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type MessageId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub profile_image: Option<String>,
    pub role: String,
}

/// A directed message between two users, as returned by the store with
/// its sender and receiver resolved where possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    #[serde(default)]
    pub sender: Option<UserSummary>,
    #[serde(default)]
    pub receiver: Option<UserSummary>,
}

impl Message {
    /// The other participant relative to `user_id`, or `None` when
    /// `user_id` is not a party to this message.
    pub fn counterparty_of(&self, user_id: &str) -> Option<&str> {
        if self.sender_id == user_id {
            Some(&self.receiver_id)
        } else if self.receiver_id == user_id {
            Some(&self.sender_id)
        } else {
            None
        }
    }

    pub fn counterparty_summary(&self, user_id: &str) -> Option<&UserSummary> {
        if self.sender_id == user_id {
            self.receiver.as_ref()
        } else if self.receiver_id == user_id {
            self.sender.as_ref()
        } else {
            None
        }
    }

    pub fn is_unread_for(&self, user_id: &str) -> bool {
        self.receiver_id == user_id && !self.is_read
    }
}

/// Per-counterparty summary shown in the conversation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub role: String,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    pub unread_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    None,
    Warn,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub allowed: bool,
    pub warning: Option<String>,
    pub action: Action,
}

impl Classification {
    pub fn clean() -> Self {
        Self {
            allowed: true,
            warning: None,
            action: Action::None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.action == Action::Block
    }

    pub fn needs_confirmation(&self) -> bool {
        self.action == Action::Warn
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_id: String,
    pub content: String,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReadRequest {
    pub ids: Vec<MessageId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationCheckRequest {
    pub content: String,
}
