use crate::models::{Conversation, Message, MessageId};

/// Ids of messages authored by `counterparty_id` that are still unread.
pub fn unread_from(counterparty_id: &str, messages: &[Message]) -> Vec<MessageId> {
    messages
        .iter()
        .filter(|m| m.sender_id == counterparty_id && !m.is_read)
        .map(|m| m.id)
        .collect()
}

/// Zero the unread counter of one conversation. Returns whether anything
/// changed.
pub fn clear_unread(conversations: &mut [Conversation], counterparty_id: &str) -> bool {
    match conversations.iter_mut().find(|c| c.id == counterparty_id) {
        Some(conversation) if conversation.unread_count > 0 => {
            conversation.unread_count = 0;
            true
        }
        _ => false,
    }
}

/// Flip the local read flag for `ids`. Never clears a flag.
pub fn mark_local_read(messages: &mut [Message], ids: &[MessageId]) {
    for message in messages.iter_mut().filter(|m| ids.contains(&m.id)) {
        message.is_read = true;
    }
}
