use chrono::{DateTime, Utc};
use vox_shared::{Message, UserSummary};

/// Columns selected by [`MESSAGE_SELECT`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageRow {
    pub id: i64,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub created_at: String,
    pub is_read: bool,
    pub sender_name: Option<String>,
    pub sender_image: Option<String>,
    pub sender_role: Option<String>,
    pub receiver_name: Option<String>,
    pub receiver_image: Option<String>,
    pub receiver_role: Option<String>,
}

/// Message columns with both participants resolved. Users that no longer
/// exist come back as NULLs.
pub const MESSAGE_SELECT: &str = r#"SELECT m.id, m.sender_id, m.receiver_id, m.content, m.created_at, m.is_read,
       s.name AS sender_name, s.profile_image AS sender_image, s.role AS sender_role,
       r.name AS receiver_name, r.profile_image AS receiver_image, r.role AS receiver_role
   FROM "messages" m
   LEFT JOIN "users" s ON s.id = m.sender_id
   LEFT JOIN "users" r ON r.id = m.receiver_id"#;

fn summary(id: &str, name: Option<String>, image: Option<String>, role: Option<String>) -> Option<UserSummary> {
    Some(UserSummary {
        id: id.to_string(),
        name: name?,
        profile_image: image,
        role: role?,
    })
}

impl MessageRow {
    /// Convert into the shared model. Rows with an unparseable timestamp
    /// yield `None` and are dropped by callers.
    pub fn into_message(self) -> Option<Message> {
        let created_at = match DateTime::parse_from_rfc3339(&self.created_at) {
            Ok(t) => t.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!("Skipping message {} with bad timestamp: {}", self.id, e);
                return None;
            }
        };

        let sender = summary(&self.sender_id, self.sender_name, self.sender_image, self.sender_role);
        let receiver = summary(
            &self.receiver_id,
            self.receiver_name,
            self.receiver_image,
            self.receiver_role,
        );

        Some(Message {
            id: self.id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            content: self.content,
            created_at,
            is_read: self.is_read,
            sender,
            receiver,
        })
    }
}

pub fn into_messages(rows: Vec<MessageRow>) -> Vec<Message> {
    rows.into_iter().filter_map(MessageRow::into_message).collect()
}
