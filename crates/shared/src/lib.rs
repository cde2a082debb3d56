pub mod constants;
pub mod conversation;
pub mod models;
pub mod moderation;
pub mod read_state;
pub mod validation;

pub use conversation::{aggregate, decode_messages, thread};
pub use models::{Action, Classification, Conversation, Message, MessageId, UserSummary};
pub use moderation::{classify, Moderator};
