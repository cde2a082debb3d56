//! Drives the messaging view: loads and polls conversations and the open
//! thread, reconciles read state, and sends messages through moderation.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use vox_shared::validation::validate_message_content;
use vox_shared::{aggregate, read_state, Action, Message, MessageId, Moderator, UserSummary};

use crate::config::PollIntervals;
use crate::error::ClientError;
use crate::state::{MessagingState, Notice, ThreadTicket};
use crate::store::MessageStore;

/// What happened to a send attempt that did not fail in transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent(Message),
    /// Nothing to send.
    Empty,
    Blocked { reason: String },
    /// The user declined to send after a warning.
    Declined { reason: String },
}

#[derive(Default)]
struct Pollers {
    mount: Option<CancellationToken>,
    thread: Option<CancellationToken>,
}

struct Inner {
    store: Arc<dyn MessageStore>,
    state: MessagingState,
    moderator: Moderator,
    user: UserSummary,
    intervals: PollIntervals,
    pollers: Mutex<Pollers>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let pollers = self.pollers.get_mut();
        if let Some(token) = pollers.thread.take() {
            token.cancel();
        }
        if let Some(token) = pollers.mount.take() {
            token.cancel();
        }
    }
}

#[derive(Clone)]
pub struct Messenger {
    inner: Arc<Inner>,
}

impl Messenger {
    pub fn new(
        store: Arc<dyn MessageStore>,
        state: MessagingState,
        moderator: Moderator,
        user: UserSummary,
        intervals: PollIntervals,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                state,
                moderator,
                user,
                intervals,
                pollers: Mutex::new(Pollers::default()),
            }),
        }
    }

    /// Resolve the current user from the store, then build a messenger.
    pub async fn connect(
        store: Arc<dyn MessageStore>,
        state: MessagingState,
        moderator: Moderator,
        intervals: PollIntervals,
    ) -> Result<Self, ClientError> {
        let user = store.current_user().await?;
        Ok(Self::new(store, state, moderator, user, intervals))
    }

    pub fn user(&self) -> &UserSummary {
        &self.inner.user
    }

    pub fn state(&self) -> &MessagingState {
        &self.inner.state
    }

    // ---- lifecycle ----

    /// Mount the view: load conversations once, then keep them fresh on the
    /// conversation interval. Calling it again restarts polling.
    pub async fn start(&self) {
        self.inner.state.remount().await;

        let token = CancellationToken::new();
        {
            let mut pollers = self.inner.pollers.lock().await;
            if let Some(old) = pollers.mount.replace(token.clone()) {
                old.cancel();
            }
            if let Some(old) = pollers.thread.take() {
                old.cancel();
            }
        }

        spawn_poller(
            Arc::downgrade(&self.inner),
            token,
            self.inner.intervals.conversations,
            |messenger| async move {
                if let Err(e) = messenger.refresh_conversations().await {
                    tracing::warn!("Conversation poll failed: {}", e);
                }
            },
        );

        if let Err(e) = self.refresh_conversations().await {
            tracing::error!("Failed to load conversations: {}", e);
            self.inner
                .state
                .push_notice(Notice::error("Failed to load conversations", e.to_string()))
                .await;
        }
    }

    /// Unmount the view. Timers stop; requests already in flight may still
    /// complete but their results are discarded.
    pub async fn shutdown(&self) {
        {
            let mut pollers = self.inner.pollers.lock().await;
            if let Some(token) = pollers.thread.take() {
                token.cancel();
            }
            if let Some(token) = pollers.mount.take() {
                token.cancel();
            }
        }
        self.inner.state.unmount().await;
        tracing::debug!("Messaging view unmounted");
    }

    // ---- conversations ----

    /// Refetch every message of the user and rebuild the conversation list.
    pub async fn refresh_conversations(&self) -> Result<(), ClientError> {
        let ticket = self.inner.state.list_ticket().await;
        let messages = self.inner.store.fetch_messages().await?;
        let conversations = aggregate(&messages, &self.inner.user.id);
        let unread = messages
            .into_iter()
            .filter(|m| m.is_unread_for(&self.inner.user.id))
            .collect();
        if !self.inner.state.apply_conversations(ticket, conversations, unread).await {
            tracing::debug!("Dropping stale conversation list");
        }
        Ok(())
    }

    // ---- selection ----

    /// Open the conversation with `counterparty_id`: load its thread, mark
    /// inbound messages read, and poll the thread until the selection
    /// changes.
    pub async fn select_conversation(&self, counterparty_id: &str) {
        let ticket = self.inner.state.select(counterparty_id).await;

        let token = {
            let mut pollers = self.inner.pollers.lock().await;
            if let Some(old) = pollers.thread.take() {
                old.cancel();
            }
            let token = match &pollers.mount {
                Some(mount) => mount.child_token(),
                None => CancellationToken::new(),
            };
            pollers.thread = Some(token.clone());
            token
        };

        let selection = ticket.selection();
        spawn_poller(
            Arc::downgrade(&self.inner),
            token,
            self.inner.intervals.thread,
            move |messenger| async move {
                let Some(ticket) = messenger.inner.state.thread_ticket(selection).await else {
                    return;
                };
                if let Err(e) = messenger.load_thread(&ticket).await {
                    tracing::warn!("Thread poll for {} failed: {}", ticket.counterparty(), e);
                }
            },
        );

        if let Err(e) = self.load_thread(&ticket).await {
            if self.inner.state.is_live(&ticket).await {
                tracing::error!("Failed to load messages with {}: {}", counterparty_id, e);
                self.inner
                    .state
                    .push_notice(Notice::error("Failed to load messages", e.to_string()))
                    .await;
            }
        }
    }

    /// Close the open conversation and stop polling its thread.
    pub async fn clear_selection(&self) {
        if let Some(token) = self.inner.pollers.lock().await.thread.take() {
            token.cancel();
        }
        self.inner.state.clear_selection().await;
    }

    async fn load_thread(&self, ticket: &ThreadTicket) -> Result<(), ClientError> {
        let mut messages = self.inner.store.fetch_thread(ticket.counterparty()).await?;
        if self.inner.state.apply_thread(ticket, messages.clone()).await {
            // The thread is one page; unread messages older than it still
            // count towards the badge.
            let older = self.inner.state.unread_outside(ticket.counterparty(), &messages).await;
            messages.extend(older);
            self.reconcile(ticket.counterparty(), &messages).await;
        } else {
            tracing::debug!("Dropping stale thread for {}", ticket.counterparty());
        }
        Ok(())
    }

    // ---- read state ----

    /// Mark every unread message from `counterparty_id` in `messages` as
    /// read. The local unread counter is zeroed before the store is asked
    /// and is not restored if the store fails; the next conversation poll
    /// brings back the server's view. Returns the ids submitted.
    pub async fn reconcile(&self, counterparty_id: &str, messages: &[Message]) -> Vec<MessageId> {
        let ids = read_state::unread_from(counterparty_id, messages);
        if ids.is_empty() {
            return ids;
        }

        self.inner.state.clear_unread(counterparty_id).await;
        self.inner.state.mark_read_locally(&ids).await;

        match self.inner.store.mark_read(&ids).await {
            Ok(updated) => {
                tracing::debug!("Marked {} of {} messages from {} read", updated, ids.len(), counterparty_id);
            }
            Err(e) => {
                tracing::warn!("Failed to mark messages from {} read: {}", counterparty_id, e);
            }
        }
        ids
    }

    // ---- sending ----

    /// Send `text` to the open conversation.
    ///
    /// Blocked content is never sent. Content that draws a warning is sent
    /// only if `confirm` returns true for the warning text.
    pub async fn send_message<F>(&self, text: &str, confirm: F) -> Result<SendOutcome, ClientError>
    where
        F: FnOnce(&str) -> bool,
    {
        let content = text.trim();
        if content.is_empty() {
            return Ok(SendOutcome::Empty);
        }

        let Some(ticket) = self.inner.state.current_thread().await else {
            return Err(ClientError::NotSelected);
        };

        if let Err(e) = validate_message_content(content) {
            self.inner
                .state
                .push_notice(Notice::error("Failed to send message", e.clone()))
                .await;
            return Err(ClientError::Validation(e));
        }

        let verdict = self.inner.moderator.classify(content);
        let reason = verdict.warning.clone().unwrap_or_default();
        let confirmed = match verdict.action {
            Action::Block => {
                tracing::info!("Send to {} blocked: {}", ticket.counterparty(), reason);
                self.inner.state.push_notice(Notice::blocked(reason.clone())).await;
                return Ok(SendOutcome::Blocked { reason });
            }
            Action::Warn => {
                if !confirm(&reason) {
                    return Ok(SendOutcome::Declined { reason });
                }
                true
            }
            Action::None => false,
        };

        let message = match self.inner.store.send(ticket.counterparty(), content, confirmed).await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!("Failed to send message to {}: {}", ticket.counterparty(), e);
                self.inner
                    .state
                    .push_notice(Notice::error("Failed to send message", e.to_string()))
                    .await;
                return Err(e);
            }
        };

        if !self.inner.state.append_to_thread(&ticket, message.clone()).await {
            tracing::debug!("Conversation changed while sending; not appending");
        }

        if let Err(e) = self.refresh_conversations().await {
            tracing::warn!("Conversation refresh after send failed: {}", e);
        }

        Ok(SendOutcome::Sent(message))
    }
}

/// Run `tick` every `period` (first run one period from now) until `token`
/// is cancelled or the messenger is gone.
fn spawn_poller<F, Fut>(inner: Weak<Inner>, token: CancellationToken, period: Duration, tick: F)
where
    F: Fn(Messenger) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(inner) = inner.upgrade() else { break };
                    tick(Messenger { inner }).await;
                }
            }
        }
    });
}
