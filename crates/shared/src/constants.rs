pub const APP_NAME: &str = "Vox";

// Limits
pub const MAX_MESSAGE_LENGTH: usize = 4000;
pub const MAX_READ_BATCH: usize = 500;

pub const THREAD_PAGE_SIZE: i64 = 200;

// Polling
pub const CONVERSATION_POLL_INTERVAL_MS: u64 = 10_000;
pub const THREAD_POLL_INTERVAL_MS: u64 = 5_000;

// Sessions
pub const SESSION_COOKIE_NAME: &str = "vox.session_token";
