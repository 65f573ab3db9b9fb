//! The session object and its lifecycle state machine.

use crate::store::ConversationStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signbridge_core::{Message, Sender, SignbridgeError, SignbridgeResult};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// One conversation record, from start to end.
///
/// `session_id` is assigned once at creation and never reused; `messages` is
/// insertion-ordered and append-only; `end_time` is set at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque unique identifier.
    pub session_id: Uuid,
    /// When the session started.
    pub start_time: DateTime<Utc>,
    /// When the session ended, once it has.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Messages exchanged so far, in insertion order.
    pub messages: Vec<Message>,
}

impl Session {
    fn new(greeting: &str) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            start_time: Utc::now(),
            end_time: None,
            messages: vec![Message::agent(greeting)],
        }
    }

    /// Number of messages, seed greeting included.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// Where a [`SessionManager`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// `start()` has not been called.
    NotStarted,
    /// The session accepts messages.
    Active,
    /// Terminal; no further appends.
    Ended,
}

enum ManagerState {
    NotStarted,
    Active(Session),
    Ended(Session),
}

/// Owns one conversation's lifecycle and keeps the store in sync.
///
/// Store calls run as background tasks: a failure is logged and never rolls
/// back a local transition. Callers that need the outstanding calls settled
/// (shutdown, tests) use [`flush`](Self::flush).
pub struct SessionManager {
    store: Arc<dyn ConversationStore>,
    greeting: String,
    state: ManagerState,
    pending: Vec<JoinHandle<()>>,
}

impl SessionManager {
    /// Creates a manager in the `NotStarted` state.
    pub fn new(store: Arc<dyn ConversationStore>, greeting: impl Into<String>) -> Self {
        Self {
            store,
            greeting: greeting.into(),
            state: ManagerState::NotStarted,
            pending: Vec::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        match self.state {
            ManagerState::NotStarted => SessionState::NotStarted,
            ManagerState::Active(_) => SessionState::Active,
            ManagerState::Ended(_) => SessionState::Ended,
        }
    }

    /// The in-memory session, once started.
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            ManagerState::NotStarted => None,
            ManagerState::Active(session) | ManagerState::Ended(session) => Some(session),
        }
    }

    /// Starts the session: assigns a fresh identifier, seeds the message
    /// list with the agent greeting, and requests creation of the store
    /// record in the background.
    ///
    /// The manager is `Active` as soon as this returns; a remote create
    /// failure is logged, not fatal. Valid only from `NotStarted`.
    pub fn start(&mut self) -> SignbridgeResult<Uuid> {
        if !matches!(self.state, ManagerState::NotStarted) {
            return Err(SignbridgeError::InvalidTransition(
                "start is only valid before the session begins".to_string(),
            ));
        }

        let session = Session::new(&self.greeting);
        let id = session.session_id;
        let seed = session.messages.clone();
        self.state = ManagerState::Active(session);

        let store = Arc::clone(&self.store);
        self.pending.push(tokio::spawn(async move {
            if let Err(error) = store.create(id, &seed).await {
                tracing::warn!(session_id = %id, %error, "store create failed");
            }
        }));
        tracing::info!(session_id = %id, "session started");
        Ok(id)
    }

    /// Appends a message locally, then requests the store append in the
    /// background.
    ///
    /// Content must be non-empty after trimming; validation happens before
    /// any network call. Valid only while `Active`.
    pub fn add_message(&mut self, sender: Sender, content: &str) -> SignbridgeResult<()> {
        let session = match &mut self.state {
            ManagerState::NotStarted => {
                return Err(SignbridgeError::InvalidTransition(
                    "add_message requires an active session".to_string(),
                ));
            }
            ManagerState::Ended(_) => return Err(SignbridgeError::SessionAlreadyEnded),
            ManagerState::Active(session) => session,
        };
        if content.trim().is_empty() {
            return Err(SignbridgeError::InvalidMessage(
                "content must not be empty".to_string(),
            ));
        }

        session.messages.push(Message::new(sender, content));
        let id = session.session_id;
        let content = content.to_string();

        let store = Arc::clone(&self.store);
        self.pending.push(tokio::spawn(async move {
            if let Err(error) = store.append(id, sender, &content).await {
                tracing::warn!(session_id = %id, %error, "store append failed");
            }
        }));
        Ok(())
    }

    /// Ends the session.
    ///
    /// A session that never progressed past the seed greeting is left open:
    /// the call is a silent no-op and no store record is marked ended, so
    /// empty interactions are not persisted as completed ones. Otherwise the
    /// end time is recorded, the store is notified in the background, and
    /// the manager becomes `Ended` (terminal). Valid only while `Active`.
    pub fn end(&mut self) -> SignbridgeResult<()> {
        let session = match &mut self.state {
            ManagerState::NotStarted => {
                return Err(SignbridgeError::InvalidTransition(
                    "end requires an active session".to_string(),
                ));
            }
            ManagerState::Ended(_) => return Err(SignbridgeError::SessionAlreadyEnded),
            ManagerState::Active(session) => session,
        };
        if session.message_count() <= 1 {
            tracing::debug!(
                session_id = %session.session_id,
                "session holds only the greeting; leaving it open"
            );
            return Ok(());
        }

        session.end_time = Some(Utc::now());
        let id = session.session_id;

        let store = Arc::clone(&self.store);
        self.pending.push(tokio::spawn(async move {
            if let Err(error) = store.end(id).await {
                tracing::warn!(session_id = %id, %error, "store end failed");
            }
        }));

        if let ManagerState::Active(session) =
            std::mem::replace(&mut self.state, ManagerState::NotStarted)
        {
            self.state = ManagerState::Ended(session);
        }
        tracing::info!(session_id = %id, "session ended");
        Ok(())
    }

    /// Awaits all outstanding background store calls. Failures have already
    /// been logged by the tasks themselves.
    pub async fn flush(&mut self) {
        for handle in self.pending.drain(..) {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every store call for assertion.
    #[derive(Default)]
    struct RecordingStore {
        creates: Mutex<Vec<Uuid>>,
        appends: Mutex<Vec<(Uuid, Sender, String)>>,
        ends: Mutex<Vec<Uuid>>,
        fail: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn outcome(&self) -> SignbridgeResult<()> {
            if self.fail {
                Err(SignbridgeError::Store("injected failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ConversationStore for RecordingStore {
        async fn create(&self, id: Uuid, _seed: &[Message]) -> SignbridgeResult<()> {
            self.creates.lock().unwrap().push(id);
            self.outcome()
        }

        async fn append(&self, id: Uuid, sender: Sender, content: &str) -> SignbridgeResult<()> {
            self.appends
                .lock()
                .unwrap()
                .push((id, sender, content.to_string()));
            self.outcome()
        }

        async fn end(&self, id: Uuid) -> SignbridgeResult<()> {
            self.ends.lock().unwrap().push(id);
            self.outcome()
        }

        async fn get(&self, id: Uuid) -> SignbridgeResult<Session> {
            Err(SignbridgeError::NotFound(id))
        }

        async fn list(&self) -> SignbridgeResult<Vec<Session>> {
            Ok(Vec::new())
        }

        async fn delete(&self, id: Uuid) -> SignbridgeResult<()> {
            Err(SignbridgeError::NotFound(id))
        }
    }

    fn manager(store: &Arc<RecordingStore>) -> SessionManager {
        SessionManager::new(
            Arc::clone(store) as Arc<dyn ConversationStore>,
            "Hello! I am here to help.",
        )
    }

    #[tokio::test]
    async fn test_start_seeds_greeting_and_creates_record() {
        let store = Arc::new(RecordingStore::default());
        let mut manager = manager(&store);

        let id = manager.start().unwrap();
        assert_eq!(manager.state(), SessionState::Active);
        let session = manager.session().unwrap();
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.messages[0].sender, Sender::Agent);
        assert!(session.end_time.is_none());

        manager.flush().await;
        assert_eq!(store.creates.lock().unwrap().as_slice(), &[id]);
    }

    #[tokio::test]
    async fn test_start_twice_is_invalid_transition() {
        let store = Arc::new(RecordingStore::default());
        let mut manager = manager(&store);

        manager.start().unwrap();
        let err = manager.start().unwrap_err();
        assert!(matches!(err, SignbridgeError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_add_message_appends_locally_and_syncs_once() {
        let store = Arc::new(RecordingStore::default());
        let mut manager = manager(&store);
        let id = manager.start().unwrap();

        manager.add_message(Sender::Client, "Hello").unwrap();
        let session = manager.session().unwrap();
        assert_eq!(session.message_count(), 2);
        assert_eq!(session.messages[1].sender, Sender::Client);
        assert_eq!(session.messages[1].content, "Hello");

        manager.flush().await;
        let appends = store.appends.lock().unwrap();
        assert_eq!(appends.len(), 1);
        assert_eq!(appends[0], (id, Sender::Client, "Hello".to_string()));
    }

    #[tokio::test]
    async fn test_add_message_rejects_empty_content_before_any_call() {
        let store = Arc::new(RecordingStore::default());
        let mut manager = manager(&store);
        manager.start().unwrap();

        let err = manager.add_message(Sender::Client, "   ").unwrap_err();
        assert!(matches!(err, SignbridgeError::InvalidMessage(_)));
        assert_eq!(manager.session().unwrap().message_count(), 1);

        manager.flush().await;
        assert!(store.appends.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_message_before_start_is_invalid_transition() {
        let store = Arc::new(RecordingStore::default());
        let mut manager = manager(&store);
        let err = manager.add_message(Sender::Client, "Hello").unwrap_err();
        assert!(matches!(err, SignbridgeError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_end_with_only_greeting_is_a_silent_no_op() {
        let store = Arc::new(RecordingStore::default());
        let mut manager = manager(&store);
        manager.start().unwrap();

        manager.end().unwrap();
        assert_eq!(manager.state(), SessionState::Active);
        assert!(manager.session().unwrap().end_time.is_none());

        manager.flush().await;
        assert!(store.ends.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_end_after_exchange_is_terminal() {
        let store = Arc::new(RecordingStore::default());
        let mut manager = manager(&store);
        let id = manager.start().unwrap();
        manager.add_message(Sender::Client, "Hello").unwrap();

        manager.end().unwrap();
        assert_eq!(manager.state(), SessionState::Ended);
        let session = manager.session().unwrap();
        let ended_at = session.end_time.unwrap();
        assert!(ended_at >= session.start_time);

        // Terminal: further operations are rejected and end_time is frozen.
        assert!(matches!(
            manager.end().unwrap_err(),
            SignbridgeError::SessionAlreadyEnded
        ));
        assert!(matches!(
            manager.add_message(Sender::Client, "more").unwrap_err(),
            SignbridgeError::SessionAlreadyEnded
        ));
        assert_eq!(manager.session().unwrap().end_time, Some(ended_at));
        assert_eq!(manager.session().unwrap().message_count(), 2);

        manager.flush().await;
        assert_eq!(store.ends.lock().unwrap().as_slice(), &[id]);
    }

    #[tokio::test]
    async fn test_store_failures_never_roll_back_local_state() {
        let store = Arc::new(RecordingStore::failing());
        let mut manager = SessionManager::new(
            Arc::clone(&store) as Arc<dyn ConversationStore>,
            "Hello! I am here to help.",
        );

        manager.start().unwrap();
        manager.add_message(Sender::Client, "Hello").unwrap();
        manager.end().unwrap();
        manager.flush().await;

        // Every remote call failed, yet the local session is intact.
        assert_eq!(manager.state(), SessionState::Ended);
        let session = manager.session().unwrap();
        assert_eq!(session.message_count(), 2);
        assert!(session.end_time.is_some());
    }

    #[tokio::test]
    async fn test_message_order_is_call_order() {
        let store = Arc::new(RecordingStore::default());
        let mut manager = manager(&store);
        manager.start().unwrap();

        manager.add_message(Sender::Client, "first").unwrap();
        manager.add_message(Sender::Agent, "second").unwrap();
        manager.add_message(Sender::Client, "third").unwrap();

        let contents: Vec<&str> = manager
            .session()
            .unwrap()
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec!["Hello! I am here to help.", "first", "second", "third"]
        );
        manager.flush().await;
    }
}
