//! The conversation-store client.
//!
//! The store is an external collaborator reached over a small REST surface;
//! [`ConversationStore`] is the seam the session manager is built against,
//! and [`HttpConversationStore`] is the production implementation.

use crate::session::Session;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use signbridge_core::{Message, Sender, SignbridgeError, SignbridgeResult};
use uuid::Uuid;

/// Client contract for the persistent conversation store.
///
/// The core pipeline consumes `create`/`append`/`end`; `get`/`list`/`delete`
/// serve the management surface.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Creates the record for a new conversation, seeded with its initial
    /// messages. Fails with [`SignbridgeError::Conflict`] if the identifier
    /// already exists.
    async fn create(&self, id: Uuid, seed: &[Message]) -> SignbridgeResult<()>;

    /// Appends one message to an existing conversation. Fails with
    /// [`SignbridgeError::NotFound`] for an unknown identifier.
    async fn append(&self, id: Uuid, sender: Sender, content: &str) -> SignbridgeResult<()>;

    /// Marks a conversation ended. Fails with [`SignbridgeError::NotFound`]
    /// for an unknown identifier.
    async fn end(&self, id: Uuid) -> SignbridgeResult<()>;

    /// Fetches one conversation.
    async fn get(&self, id: Uuid) -> SignbridgeResult<Session>;

    /// Fetches all conversations.
    async fn list(&self) -> SignbridgeResult<Vec<Session>>;

    /// Deletes one conversation.
    async fn delete(&self, id: Uuid) -> SignbridgeResult<()>;
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest<'a> {
    session_id: Uuid,
    messages: &'a [Message],
}

#[derive(Debug, Serialize)]
struct AppendRequest<'a> {
    sender: Sender,
    content: &'a str,
}

// ── HTTP implementation ─────────────────────────────────────────────────────

/// REST client for the conversation store.
pub struct HttpConversationStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpConversationStore {
    /// Creates a client against `base_url` (e.g. `http://localhost:5000/api`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn conversations_url(&self) -> String {
        format!("{}/conversations", self.base_url)
    }

    fn conversation_url(&self, id: Uuid) -> String {
        format!("{}/conversations/{id}", self.base_url)
    }
}

fn transport_error(e: reqwest::Error) -> SignbridgeError {
    SignbridgeError::Store(format!("request failed: {e}"))
}

fn unexpected_status(operation: &str, status: StatusCode) -> SignbridgeError {
    SignbridgeError::Store(format!("{operation} returned unexpected status {status}"))
}

#[async_trait]
impl ConversationStore for HttpConversationStore {
    async fn create(&self, id: Uuid, seed: &[Message]) -> SignbridgeResult<()> {
        let response = self
            .client
            .post(self.conversations_url())
            .json(&CreateRequest {
                session_id: id,
                messages: seed,
            })
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::CREATED => {
                tracing::debug!(session_id = %id, "conversation created");
                Ok(())
            }
            StatusCode::BAD_REQUEST => Err(SignbridgeError::Conflict(id)),
            status => Err(unexpected_status("create", status)),
        }
    }

    async fn append(&self, id: Uuid, sender: Sender, content: &str) -> SignbridgeResult<()> {
        let response = self
            .client
            .put(self.conversation_url(id))
            .json(&AppendRequest { sender, content })
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::OK => {
                tracing::debug!(session_id = %id, "message appended");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(SignbridgeError::NotFound(id)),
            status => Err(unexpected_status("append", status)),
        }
    }

    async fn end(&self, id: Uuid) -> SignbridgeResult<()> {
        let response = self
            .client
            .patch(format!("{}/end", self.conversation_url(id)))
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::OK => {
                tracing::debug!(session_id = %id, "conversation ended");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(SignbridgeError::NotFound(id)),
            status => Err(unexpected_status("end", status)),
        }
    }

    async fn get(&self, id: Uuid) -> SignbridgeResult<Session> {
        let response = self
            .client
            .get(self.conversation_url(id))
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::OK => response
                .json::<Session>()
                .await
                .map_err(|e| SignbridgeError::Store(format!("undecodable conversation: {e}"))),
            StatusCode::NOT_FOUND => Err(SignbridgeError::NotFound(id)),
            status => Err(unexpected_status("get", status)),
        }
    }

    async fn list(&self) -> SignbridgeResult<Vec<Session>> {
        let response = self
            .client
            .get(self.conversations_url())
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::OK => response
                .json::<Vec<Session>>()
                .await
                .map_err(|e| SignbridgeError::Store(format!("undecodable conversation list: {e}"))),
            status => Err(unexpected_status("list", status)),
        }
    }

    async fn delete(&self, id: Uuid) -> SignbridgeResult<()> {
        let response = self
            .client
            .delete(self.conversation_url(id))
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => Err(SignbridgeError::NotFound(id)),
            status => Err(unexpected_status("delete", status)),
        }
    }
}
