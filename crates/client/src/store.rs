//! The message store contract and its HTTP implementation.

use async_trait::async_trait;
use reqwest::{header, Client, Response, Url};
use serde::de::DeserializeOwned;
use vox_shared::models::{MarkReadRequest, MarkReadResponse, SendMessageRequest};
use vox_shared::{decode_messages, Message, MessageId, UserSummary};

use crate::error::ClientError;

/// Remote persistence for messages, scoped to the authenticated user.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// The authenticated user.
    async fn current_user(&self) -> Result<UserSummary, ClientError>;

    /// Every message the user sent or received. Malformed records are
    /// dropped rather than failing the batch.
    async fn fetch_messages(&self) -> Result<Vec<Message>, ClientError>;

    /// The thread with one counterparty, oldest first.
    async fn fetch_thread(&self, counterparty_id: &str) -> Result<Vec<Message>, ClientError>;

    /// Insert a message. `confirmed` acknowledges a moderation warning.
    async fn send(&self, receiver_id: &str, content: &str, confirmed: bool) -> Result<Message, ClientError>;

    /// Mark messages addressed to the user as read. Returns how many
    /// changed.
    async fn mark_read(&self, ids: &[MessageId]) -> Result<u64, ClientError>;
}

pub struct HttpMessageStore {
    http: Client,
    base_url: Url,
}

impl HttpMessageStore {
    pub fn new(base_url: &str, session_token: &str) -> Result<Self, ClientError> {
        let mut headers = header::HeaderMap::new();
        let auth = header::HeaderValue::from_str(&format!("Bearer {}", session_token))
            .map_err(|_| ClientError::Config("Session token is not a valid header value".into()))?;
        headers.insert(header::AUTHORIZATION, auth);

        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Config(format!("Invalid API URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!("Invalid API URL {}", base_url)));
        }

        let http = Client::builder().default_headers(headers).build()?;
        Ok(Self { http, base_url })
    }

    /// `/api/<segments>` under the base URL. Each segment is percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl MessageStore for HttpMessageStore {
    async fn current_user(&self) -> Result<UserSummary, ClientError> {
        let response = self.http.get(self.url(&["users", "me"])).send().await?;
        Self::json(response).await
    }

    async fn fetch_messages(&self) -> Result<Vec<Message>, ClientError> {
        let response = self.http.get(self.url(&["messages"])).send().await?;
        let records: Vec<serde_json::Value> = Self::json(response).await?;
        Ok(decode_messages(records))
    }

    async fn fetch_thread(&self, counterparty_id: &str) -> Result<Vec<Message>, ClientError> {
        let response = self
            .http
            .get(self.url(&["conversations", counterparty_id, "messages"]))
            .send()
            .await?;
        let records: Vec<serde_json::Value> = Self::json(response).await?;
        Ok(decode_messages(records))
    }

    async fn send(&self, receiver_id: &str, content: &str, confirmed: bool) -> Result<Message, ClientError> {
        let body = SendMessageRequest {
            receiver_id: receiver_id.to_string(),
            content: content.to_string(),
            confirmed,
        };
        let response = self.http.post(self.url(&["messages"])).json(&body).send().await?;
        Self::json(response).await
    }

    async fn mark_read(&self, ids: &[MessageId]) -> Result<u64, ClientError> {
        let body = MarkReadRequest { ids: ids.to_vec() };
        let response = self.http.post(self.url(&["messages", "read"])).json(&body).send().await?;
        let result: MarkReadResponse = Self::json(response).await?;
        Ok(result.updated)
    }
}
