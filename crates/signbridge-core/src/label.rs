//! The closed set of 28 recognized symbols: the letters `A`–`Z` plus the
//! control symbols `SPACE` and `DELETE`.
//!
//! Variant order is significant: a label's discriminant is the index of the
//! corresponding output unit in the classification model, so [`Label::ALL`]
//! must stay aligned with the class list in the model manifest.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the 28 recognized symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum Label {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    /// Appends one space to the accumulated text.
    Space,
    /// Removes the last character of the accumulated text.
    Delete,
}

impl Label {
    /// Every label, in model output order.
    pub const ALL: [Label; 28] = [
        Label::A,
        Label::B,
        Label::C,
        Label::D,
        Label::E,
        Label::F,
        Label::G,
        Label::H,
        Label::I,
        Label::J,
        Label::K,
        Label::L,
        Label::M,
        Label::N,
        Label::O,
        Label::P,
        Label::Q,
        Label::R,
        Label::S,
        Label::T,
        Label::U,
        Label::V,
        Label::W,
        Label::X,
        Label::Y,
        Label::Z,
        Label::Space,
        Label::Delete,
    ];

    /// Number of labels in the alphabet.
    pub const COUNT: usize = Self::ALL.len();

    /// The label at a given model output index.
    pub fn from_index(index: usize) -> Option<Label> {
        Self::ALL.get(index).copied()
    }

    /// The model output index of this label.
    pub fn index(self) -> usize {
        self as usize
    }

    /// True for the control symbols `SPACE` and `DELETE`.
    pub fn is_control(self) -> bool {
        matches!(self, Label::Space | Label::Delete)
    }

    /// The literal character appended for this label, if any.
    ///
    /// Letters map to themselves; the control symbols have no literal
    /// character (their effect on the text buffer is positional).
    pub fn as_char(self) -> Option<char> {
        if self.is_control() {
            None
        } else {
            char::from_u32('A' as u32 + self.index() as u32)
        }
    }

    /// The upper-case name of this label, as it appears on the wire and in
    /// model manifests.
    pub fn as_str(self) -> &'static str {
        const NAMES: [&str; Label::COUNT] = [
            "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q",
            "R", "S", "T", "U", "V", "W", "X", "Y", "Z", "SPACE", "DELETE",
        ];
        NAMES[self.index()]
    }

    /// Parses an upper-case label name.
    pub fn from_name(name: &str) -> Option<Label> {
        Self::ALL.iter().copied().find(|l| l.as_str() == name)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
