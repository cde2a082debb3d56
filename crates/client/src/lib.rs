pub mod config;
pub mod error;
pub mod messenger;
pub mod state;
pub mod store;

pub use config::{ClientConfig, PollIntervals};
pub use error::ClientError;
pub use messenger::{Messenger, SendOutcome};
pub use state::{MessagingState, Notice, NoticeKind, StateEvent};
pub use store::{HttpMessageStore, MessageStore};
