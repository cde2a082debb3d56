#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;
use vox_client::{ClientError, MessageStore, Messenger, MessagingState, PollIntervals};
use vox_shared::constants::THREAD_PAGE_SIZE;
use vox_shared::{Message, MessageId, Moderator, UserSummary};

pub const ME: &str = "me";

pub fn user(id: &str, role: &str) -> UserSummary {
    UserSummary {
        id: id.into(),
        name: format!("{}-name", id),
        profile_image: None,
        role: role.into(),
    }
}

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

/// Holds back one `fetch_thread` call until released.
#[derive(Default)]
pub struct Gate {
    pub started: Notify,
    pub release: Notify,
}

fn unavailable() -> ClientError {
    ClientError::Status {
        status: 503,
        message: "Service unavailable".into(),
    }
}

/// In-memory store standing in for the server.
pub struct FakeStore {
    users: Mutex<HashMap<String, UserSummary>>,
    messages: Mutex<Vec<Message>>,
    gates: Mutex<HashMap<String, Arc<Gate>>>,

    pub fetch_messages_calls: AtomicUsize,
    thread_calls: Mutex<HashMap<String, usize>>,
    pub mark_read_calls: Mutex<Vec<Vec<MessageId>>>,
    pub sent: Mutex<Vec<(String, String, bool)>>,

    pub fail_fetch: AtomicBool,
    pub fail_mark_read: AtomicBool,
    pub fail_send: AtomicBool,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        let store = Self {
            users: Mutex::new(HashMap::new()),
            messages: Mutex::new(Vec::new()),
            gates: Mutex::new(HashMap::new()),
            fetch_messages_calls: AtomicUsize::new(0),
            thread_calls: Mutex::new(HashMap::new()),
            mark_read_calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            fail_fetch: AtomicBool::new(false),
            fail_mark_read: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
        };
        store.add_user(user(ME, "client"));
        Arc::new(store)
    }

    pub fn add_user(&self, user: UserSummary) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }

    /// Insert a message `minutes` after a fixed base time. Returns its id.
    pub fn seed(&self, from: &str, to: &str, minutes: i64, is_read: bool) -> MessageId {
        let users = self.users.lock().unwrap();
        let mut messages = self.messages.lock().unwrap();
        let id = messages.len() as MessageId + 1;
        messages.push(Message {
            id,
            sender_id: from.into(),
            receiver_id: to.into(),
            content: format!("message {}", id),
            created_at: at(minutes),
            is_read,
            sender: users.get(from).cloned(),
            receiver: users.get(to).cloned(),
        });
        id
    }

    pub fn gate(&self, counterparty_id: &str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates
            .lock()
            .unwrap()
            .insert(counterparty_id.to_string(), gate.clone());
        gate
    }

    pub fn thread_calls(&self, counterparty_id: &str) -> usize {
        self.thread_calls
            .lock()
            .unwrap()
            .get(counterparty_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn is_read(&self, id: MessageId) -> bool {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.id == id && m.is_read)
    }

    pub fn mark_read_calls(&self) -> Vec<Vec<MessageId>> {
        self.mark_read_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageStore for FakeStore {
    async fn current_user(&self) -> Result<UserSummary, ClientError> {
        Ok(user(ME, "client"))
    }

    async fn fetch_messages(&self) -> Result<Vec<Message>, ClientError> {
        self.fetch_messages_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut messages: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.sender_id == ME || m.receiver_id == ME)
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(messages)
    }

    async fn fetch_thread(&self, counterparty_id: &str) -> Result<Vec<Message>, ClientError> {
        *self
            .thread_calls
            .lock()
            .unwrap()
            .entry(counterparty_id.to_string())
            .or_default() += 1;

        let gate = self.gates.lock().unwrap().remove(counterparty_id);
        // Snapshot before waiting, like a response already computed server-side.
        let mut snapshot = vox_shared::thread(&self.messages.lock().unwrap(), ME, counterparty_id);
        // Only the newest page, as the server returns it.
        let excess = snapshot.len().saturating_sub(THREAD_PAGE_SIZE as usize);
        snapshot.drain(..excess);
        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }

        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(snapshot)
    }

    async fn send(&self, receiver_id: &str, content: &str, confirmed: bool) -> Result<Message, ClientError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.sent
            .lock()
            .unwrap()
            .push((receiver_id.to_string(), content.to_string(), confirmed));

        let minutes = 1_000 + self.messages.lock().unwrap().len() as i64;
        let id = self.seed(ME, receiver_id, minutes, false);
        let mut messages = self.messages.lock().unwrap();
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .expect("seeded message");
        message.content = content.to_string();
        Ok(message.clone())
    }

    async fn mark_read(&self, ids: &[MessageId]) -> Result<u64, ClientError> {
        self.mark_read_calls.lock().unwrap().push(ids.to_vec());
        if self.fail_mark_read.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut updated = 0;
        for message in self
            .messages
            .lock()
            .unwrap()
            .iter_mut()
            .filter(|m| m.receiver_id == ME && !m.is_read && ids.contains(&m.id))
        {
            message.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }
}

pub fn messenger(store: Arc<FakeStore>) -> Messenger {
    messenger_with(store, Moderator::default())
}

pub fn messenger_with(store: Arc<FakeStore>, moderator: Moderator) -> Messenger {
    Messenger::new(
        store,
        MessagingState::new(),
        moderator,
        user(ME, "client"),
        PollIntervals::default(),
    )
}
