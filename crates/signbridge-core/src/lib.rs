//! Core types and error definitions for Signbridge.
//!
//! This crate provides the foundational types shared across all Signbridge
//! crates: the recognized symbol alphabet, classification results, message
//! representations, and the unified error enum.
//!
//! # Main types
//!
//! - [`SignbridgeError`] — Unified error enum for all Signbridge subsystems.
//! - [`SignbridgeResult`] — Convenience alias for `Result<T, SignbridgeError>`.
//! - [`Label`] — One of the 28 recognized symbols.
//! - [`ClassificationResult`] — One ranked classification of a single frame.
//! - [`Sender`] — Message author (agent or client).
//! - [`Message`] — A single message within a conversation session.

/// The recognized symbol alphabet.
pub mod label;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use label::Label;

// --- Error types ---

/// Top-level error type for Signbridge.
///
/// Each variant corresponds to a failure mode of one subsystem.
#[derive(Debug, thiserror::Error)]
pub enum SignbridgeError {
    /// The model artifact is missing, corrupt, or incompatible. Classification
    /// stays disabled until a reload succeeds.
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// `classify` was called before a load completed.
    #[error("Model is not ready")]
    ModelNotReady,

    /// No camera device is present, or the device is busy.
    #[error("Capture unavailable: {0}")]
    CaptureUnavailable(String),

    /// Camera access was refused.
    #[error("Camera permission denied")]
    PermissionDenied,

    /// A message was rejected before any network call.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// An operation was attempted on a terminal session.
    #[error("Session already ended")]
    SessionAlreadyEnded,

    /// A lifecycle operation was attempted in the wrong state.
    #[error("Invalid session transition: {0}")]
    InvalidTransition(String),

    /// The store already holds a conversation with this identifier.
    #[error("Conversation {0} already exists in the store")]
    Conflict(Uuid),

    /// The store holds no conversation with this identifier.
    #[error("Conversation {0} not found in the store")]
    NotFound(Uuid),

    /// A transport failure or unexpected response from the store.
    #[error("Store error: {0}")]
    Store(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`SignbridgeError`].
pub type SignbridgeResult<T> = Result<T, SignbridgeError>;

// --- Classification types ---

/// One ranked classification of a single captured frame.
///
/// Produced fresh per classify call and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// The most probable label.
    pub label: Label,
    /// Probability of [`Self::label`], in `[0, 1]`.
    pub confidence: f32,
    /// All labels with their probabilities, sorted descending by probability.
    pub ranked: Vec<(Label, f32)>,
}

impl ClassificationResult {
    /// Builds a result from one (label, probability) list. The list is sorted
    /// descending and the head becomes the top label.
    pub fn from_probabilities(mut ranked: Vec<(Label, f32)>) -> Self {
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let (label, confidence) = ranked.first().map_or((Label::A, 0.0), |&(l, c)| (l, c));
        Self {
            label,
            confidence,
            ranked,
        }
    }
}

// --- Message types ---

/// The author of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The automated agent.
    Agent,
    /// The signing user.
    Client,
}

/// A single message exchanged within a conversation session.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The message author.
    pub sender: Sender,
    /// The textual content.
    pub content: String,
    /// UTC timestamp of when the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a new message stamped with the current time.
    pub fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            sender,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a new message from [`Sender::Agent`].
    pub fn agent(content: impl Into<String>) -> Self {
        Self::new(Sender::Agent, content)
    }

    /// Creates a new message from [`Sender::Client`].
    pub fn client(content: impl Into<String>) -> Self {
        Self::new(Sender::Client, content)
    }
}
