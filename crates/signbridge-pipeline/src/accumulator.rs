//! Folds a stream of classification observations into the text buffer.

use signbridge_core::{ClassificationResult, Label};

/// Observations at or below this confidence are discarded outright.
pub const CONFIDENCE_GATE: f32 = 0.7;

/// A small state machine turning (label, confidence) observations into a
/// mutable text buffer.
///
/// The buffer lives for one streaming session: it is taken when the user
/// confirms a message and cleared when streaming stops.
#[derive(Debug, Default)]
pub struct TextAccumulator {
    buffer: String,
}

impl TextAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one observation.
    ///
    /// Low-confidence observations leave the buffer untouched. `DELETE`
    /// removes the last character (a no-op on an empty buffer), `SPACE`
    /// appends exactly one space, and any letter appends itself.
    pub fn observe(&mut self, observation: &ClassificationResult) {
        if observation.confidence <= CONFIDENCE_GATE {
            return;
        }
        match observation.label {
            Label::Delete => {
                self.buffer.pop();
            }
            Label::Space => self.buffer.push(' '),
            letter => {
                if let Some(ch) = letter.as_char() {
                    self.buffer.push(ch);
                }
            }
        }
    }

    /// The accumulated text so far.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Whether nothing has accumulated.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Takes the accumulated text, leaving the buffer empty. Called when the
    /// user confirms the text as a message.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }

    /// Discards the accumulated text. Called when streaming stops.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
