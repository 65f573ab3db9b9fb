//! Conversation session lifecycle and store synchronization.
//!
//! [`SessionManager`] owns one conversation's lifecycle
//! (not-started → active → ended), its in-memory message list, and
//! best-effort synchronization with the external conversation store. The
//! in-memory session is authoritative for the caller; the store holds the
//! durable copy and is updated fire-and-log, never transactionally.

pub mod session;
pub mod store;

pub use session::{Session, SessionManager, SessionState};
pub use store::{ConversationStore, HttpConversationStore};
