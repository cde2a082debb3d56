//! Folding a flat message list into per-counterparty conversations.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{Conversation, Message};

/// Decode store records one by one, dropping any that do not parse.
pub fn decode_messages(values: Vec<serde_json::Value>) -> Vec<Message> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Message>(value) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::debug!("Skipping malformed message record: {}", e);
                None
            }
        })
        .collect()
}

struct Fold<'a> {
    latest: &'a Message,
    unread: u32,
}

fn is_newer(candidate: &Message, current: &Message) -> bool {
    match candidate.created_at.cmp(&current.created_at) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => candidate.id > current.id,
    }
}

/// Summarize `messages` into one conversation per counterparty of
/// `current_user_id`, most recent first.
///
/// Records that do not involve the current user, that are addressed to
/// the sender, or whose counterparty cannot be resolved are skipped.
pub fn aggregate(messages: &[Message], current_user_id: &str) -> Vec<Conversation> {
    let mut folds: HashMap<&str, Fold<'_>> = HashMap::new();

    for message in messages {
        if message.sender_id == message.receiver_id {
            continue;
        }
        let Some(counterparty) = message.counterparty_of(current_user_id) else {
            continue;
        };
        if message.counterparty_summary(current_user_id).is_none() {
            continue;
        }

        let unread = u32::from(message.is_unread_for(current_user_id));
        folds
            .entry(counterparty)
            .and_modify(|fold| {
                if is_newer(message, fold.latest) {
                    fold.latest = message;
                }
                fold.unread += unread;
            })
            .or_insert(Fold {
                latest: message,
                unread,
            });
    }

    let mut conversations: Vec<Conversation> = folds
        .into_iter()
        .filter_map(|(counterparty, fold)| {
            // Summaries can differ between records; the newest one wins.
            let user = fold.latest.counterparty_summary(current_user_id)?;
            Some(Conversation {
                id: counterparty.to_string(),
                name: user.name.clone(),
                avatar: user.profile_image.clone(),
                role: user.role.clone(),
                last_message: fold.latest.content.clone(),
                last_message_time: fold.latest.created_at,
                unread_count: fold.unread,
            })
        })
        .collect();

    conversations.sort_by(|a, b| {
        b.last_message_time
            .cmp(&a.last_message_time)
            .then_with(|| a.id.cmp(&b.id))
    });
    conversations
}

/// Messages exchanged between `current_user_id` and `counterparty_id`,
/// oldest first.
pub fn thread(messages: &[Message], current_user_id: &str, counterparty_id: &str) -> Vec<Message> {
    let mut thread: Vec<Message> = messages
        .iter()
        .filter(|m| {
            (m.sender_id == current_user_id && m.receiver_id == counterparty_id)
                || (m.sender_id == counterparty_id && m.receiver_id == current_user_id)
        })
        .cloned()
        .collect();
    thread.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    thread
}
