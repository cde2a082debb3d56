//! The messaging view-model and its owner.
//!
//! `MessagingState` is the single writer of the conversation list and the
//! open thread. Every async result is applied through a ticket taken
//! before the request went out; the write is accepted only if the ticket
//! still describes the live selection and is newer than what was last
//! applied. Check and write happen under the same lock.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use vox_shared::read_state;
use vox_shared::{Conversation, Message, MessageId};

const EVENT_CAPACITY: usize = 64;
// Oldest notices are dropped past this.
const NOTICE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Error,
    Blocked,
}

/// A user-facing, non-blocking notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Blocked,
            title: "Message blocked".into(),
            description: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    ConversationsChanged,
    SelectionChanged(Option<String>),
    ThreadChanged,
    Notice(Notice),
}

/// Guard for a conversation-list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListTicket {
    mount: u64,
    seq: u64,
}

/// Guard for a thread request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadTicket {
    mount: u64,
    selection: u64,
    seq: u64,
    counterparty: String,
}

impl ThreadTicket {
    pub fn counterparty(&self) -> &str {
        &self.counterparty
    }

    pub fn selection(&self) -> u64 {
        self.selection
    }
}

#[derive(Default)]
struct Inner {
    conversations: Vec<Conversation>,
    active: Option<String>,
    thread: Vec<Message>,
    // Inbound unread messages from the last applied list fetch.
    unread: Vec<Message>,
    notices: Vec<Notice>,

    mount: u64,
    selection: u64,
    next_list_seq: u64,
    applied_list_seq: u64,
    next_thread_seq: u64,
    applied_thread_seq: u64,
}

impl Inner {
    fn thread_is_live(&self, ticket: &ThreadTicket) -> bool {
        ticket.mount == self.mount
            && ticket.selection == self.selection
            && self.active.as_deref() == Some(ticket.counterparty.as_str())
    }
}

#[derive(Clone)]
pub struct MessagingState {
    inner: Arc<RwLock<Inner>>,
    events: broadcast::Sender<StateEvent>,
}

impl Default for MessagingState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessagingState {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StateEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    // ---- reads ----

    pub async fn conversations(&self) -> Vec<Conversation> {
        self.inner.read().await.conversations.clone()
    }

    pub async fn conversation(&self, counterparty_id: &str) -> Option<Conversation> {
        self.inner
            .read()
            .await
            .conversations
            .iter()
            .find(|c| c.id == counterparty_id)
            .cloned()
    }

    pub async fn active_conversation(&self) -> Option<String> {
        self.inner.read().await.active.clone()
    }

    pub async fn thread(&self) -> Vec<Message> {
        self.inner.read().await.thread.clone()
    }

    pub async fn notices(&self) -> Vec<Notice> {
        self.inner.read().await.notices.clone()
    }

    pub async fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.inner.write().await.notices)
    }

    pub async fn total_unread(&self) -> u32 {
        self.inner
            .read()
            .await
            .conversations
            .iter()
            .map(|c| c.unread_count)
            .sum()
    }

    // ---- lifecycle ----

    /// Start a new mount generation. Results of requests issued under an
    /// earlier generation are dropped from now on.
    pub(crate) async fn remount(&self) {
        let mut inner = self.inner.write().await;
        inner.mount += 1;
    }

    /// Leave the view: drop the selection and invalidate every outstanding
    /// request.
    pub(crate) async fn unmount(&self) {
        let had_selection = {
            let mut inner = self.inner.write().await;
            inner.mount += 1;
            inner.selection += 1;
            inner.thread.clear();
            inner.active.take().is_some()
        };
        if had_selection {
            self.emit(StateEvent::SelectionChanged(None));
        }
    }

    // ---- conversation list ----

    pub(crate) async fn list_ticket(&self) -> ListTicket {
        let mut inner = self.inner.write().await;
        inner.next_list_seq += 1;
        ListTicket {
            mount: inner.mount,
            seq: inner.next_list_seq,
        }
    }

    /// Replace the conversation list if `ticket` is still the freshest
    /// live request.
    pub(crate) async fn apply_conversations(
        &self,
        ticket: ListTicket,
        conversations: Vec<Conversation>,
        unread: Vec<Message>,
    ) -> bool {
        {
            let mut inner = self.inner.write().await;
            if ticket.mount != inner.mount || ticket.seq <= inner.applied_list_seq {
                return false;
            }
            inner.applied_list_seq = ticket.seq;
            inner.conversations = conversations;
            inner.unread = unread;
        }
        self.emit(StateEvent::ConversationsChanged);
        true
    }

    /// Optimistically zero one conversation's unread counter.
    pub async fn clear_unread(&self, counterparty_id: &str) -> bool {
        let changed = read_state::clear_unread(&mut self.inner.write().await.conversations, counterparty_id);
        if changed {
            self.emit(StateEvent::ConversationsChanged);
        }
        changed
    }

    // ---- selection and thread ----

    /// Make `counterparty_id` the active conversation and return the ticket
    /// for its first thread load.
    pub(crate) async fn select(&self, counterparty_id: &str) -> ThreadTicket {
        let ticket = {
            let mut inner = self.inner.write().await;
            inner.selection += 1;
            inner.active = Some(counterparty_id.to_string());
            inner.thread.clear();
            inner.next_thread_seq += 1;
            ThreadTicket {
                mount: inner.mount,
                selection: inner.selection,
                seq: inner.next_thread_seq,
                counterparty: counterparty_id.to_string(),
            }
        };
        self.emit(StateEvent::SelectionChanged(Some(counterparty_id.to_string())));
        self.emit(StateEvent::ThreadChanged);
        ticket
    }

    pub(crate) async fn clear_selection(&self) -> bool {
        let had_selection = {
            let mut inner = self.inner.write().await;
            inner.selection += 1;
            inner.thread.clear();
            inner.active.take().is_some()
        };
        if had_selection {
            self.emit(StateEvent::SelectionChanged(None));
            self.emit(StateEvent::ThreadChanged);
        }
        had_selection
    }

    /// A ticket for refetching the thread of selection `selection`, or
    /// `None` once that selection is gone.
    pub(crate) async fn thread_ticket(&self, selection: u64) -> Option<ThreadTicket> {
        let mut inner = self.inner.write().await;
        if inner.selection != selection {
            return None;
        }
        let counterparty = inner.active.clone()?;
        inner.next_thread_seq += 1;
        Some(ThreadTicket {
            mount: inner.mount,
            selection,
            seq: inner.next_thread_seq,
            counterparty,
        })
    }

    /// Ticket describing the current selection without reserving a new
    /// request slot. Used to scope optimistic appends.
    pub(crate) async fn current_thread(&self) -> Option<ThreadTicket> {
        let inner = self.inner.read().await;
        let counterparty = inner.active.clone()?;
        Some(ThreadTicket {
            mount: inner.mount,
            selection: inner.selection,
            seq: inner.applied_thread_seq,
            counterparty,
        })
    }

    pub(crate) async fn is_live(&self, ticket: &ThreadTicket) -> bool {
        self.inner.read().await.thread_is_live(ticket)
    }

    /// Replace the thread with a fetched one if `ticket` is still live and
    /// newer than the last applied fetch. Messages appended locally after
    /// the fetch went out (ids above anything fetched) are kept.
    pub(crate) async fn apply_thread(&self, ticket: &ThreadTicket, mut fetched: Vec<Message>) -> bool {
        {
            let mut inner = self.inner.write().await;
            if !inner.thread_is_live(ticket) || ticket.seq <= inner.applied_thread_seq {
                return false;
            }
            inner.applied_thread_seq = ticket.seq;

            let newest_fetched = fetched.iter().map(|m| m.id).max().unwrap_or(MessageId::MIN);
            let pending: Vec<Message> = inner
                .thread
                .iter()
                .filter(|m| m.id > newest_fetched)
                .cloned()
                .collect();
            fetched.extend(pending);
            inner.thread = fetched;
        }
        self.emit(StateEvent::ThreadChanged);
        true
    }

    /// Append a message the user just sent, if the conversation it belongs
    /// to is still open.
    pub(crate) async fn append_to_thread(&self, ticket: &ThreadTicket, message: Message) -> bool {
        {
            let mut inner = self.inner.write().await;
            if !inner.thread_is_live(ticket) {
                return false;
            }
            if inner.thread.iter().any(|m| m.id == message.id) {
                return true;
            }
            inner.thread.push(message);
        }
        self.emit(StateEvent::ThreadChanged);
        true
    }

    /// Unread messages from `counterparty_id` known from the conversation
    /// list that are missing from `thread`.
    pub(crate) async fn unread_outside(&self, counterparty_id: &str, thread: &[Message]) -> Vec<Message> {
        self.inner
            .read()
            .await
            .unread
            .iter()
            .filter(|m| m.sender_id == counterparty_id && !thread.iter().any(|t| t.id == m.id))
            .cloned()
            .collect()
    }

    pub(crate) async fn mark_read_locally(&self, ids: &[MessageId]) {
        let mut inner = self.inner.write().await;
        read_state::mark_local_read(&mut inner.thread, ids);
        inner.unread.retain(|m| !ids.contains(&m.id));
    }

    // ---- notices ----

    pub async fn push_notice(&self, notice: Notice) {
        {
            let mut inner = self.inner.write().await;
            let overflow = (inner.notices.len() + 1).saturating_sub(NOTICE_CAPACITY);
            inner.notices.drain(..overflow);
            inner.notices.push(notice.clone());
        }
        self.emit(StateEvent::Notice(notice));
    }
}
