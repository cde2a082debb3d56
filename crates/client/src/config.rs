use std::env;
use std::time::Duration;

use vox_shared::constants::{CONVERSATION_POLL_INTERVAL_MS, THREAD_POLL_INTERVAL_MS};

/// How often the conversation list and the open thread are refetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub conversations: Duration,
    pub thread: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            conversations: Duration::from_millis(CONVERSATION_POLL_INTERVAL_MS),
            thread: Duration::from_millis(THREAD_POLL_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub session_token: Option<String>,
    pub poll: PollIntervals,
}

fn millis_var(name: &str, default: u64) -> Duration {
    let ms = env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(default);
    Duration::from_millis(ms)
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("VOX_API_URL").unwrap_or_else(|_| "http://localhost:3001".into()),
            session_token: env::var("VOX_SESSION_TOKEN").ok().filter(|t| !t.is_empty()),
            poll: PollIntervals {
                conversations: millis_var("VOX_CONVERSATION_POLL_MS", CONVERSATION_POLL_INTERVAL_MS),
                thread: millis_var("VOX_THREAD_POLL_MS", THREAD_POLL_INTERVAL_MS),
            },
        }
    }
}
