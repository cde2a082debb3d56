//! Headless messaging watcher: keeps the conversation list (and optionally
//! one thread) in sync with the server and logs what changes.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use vox_client::{ClientConfig, HttpMessageStore, Messenger, MessagingState, StateEvent};
use vox_shared::Moderator;

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vox_client=info".into()),
        )
        .init();

    let config = ClientConfig::from_env();

    let Some(token) = config.session_token.as_deref() else {
        tracing::error!("VOX_SESSION_TOKEN must be set");
        std::process::exit(1);
    };

    let store = match HttpMessageStore::new(&config.api_url, token) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let state = MessagingState::new();
    let mut events = state.subscribe();

    let connected = Messenger::connect(Arc::new(store), state.clone(), Moderator::default(), config.poll).await;
    let messenger = match connected {
        Ok(messenger) => messenger,
        Err(e) => {
            tracing::error!("Failed to resolve current user: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Watching messages for {} ({})", messenger.user().name, messenger.user().id);
    messenger.start().await;

    if let Ok(counterparty) = std::env::var("VOX_OPEN_CONVERSATION") {
        messenger.select_conversation(&counterparty).await;
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(StateEvent::ConversationsChanged) => {
                    let conversations = state.conversations().await;
                    tracing::info!(
                        "{} conversations, {} unread",
                        conversations.len(),
                        state.total_unread().await
                    );
                    for c in conversations.iter().filter(|c| c.unread_count > 0) {
                        tracing::info!("  {} ({}): {} unread, last: {}", c.name, c.role, c.unread_count, c.last_message);
                    }
                }
                Ok(StateEvent::ThreadChanged) => {
                    let thread = state.thread().await;
                    if let Some(last) = thread.last() {
                        tracing::info!("Thread has {} messages, latest: {}", thread.len(), last.content);
                    }
                }
                Ok(StateEvent::SelectionChanged(selection)) => {
                    tracing::info!("Selected conversation: {:?}", selection);
                }
                Ok(StateEvent::Notice(notice)) => {
                    tracing::warn!("{}: {}", notice.title, notice.description);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Skipped {} state events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    messenger.shutdown().await;
}
