use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the hidden half of a target word is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PresentationStyle {
    /// One bordered cell per hidden letter.
    Box,
    /// One underlined cell per hidden letter.
    Underline,
    /// A single free-form field per word with one shared underline.
    Span,
}

impl PresentationStyle {
    pub const ALL: [PresentationStyle; 3] = [
        PresentationStyle::Box,
        PresentationStyle::Underline,
        PresentationStyle::Span,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PresentationStyle::Box => "box",
            PresentationStyle::Underline => "underline",
            PresentationStyle::Span => "span",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PresentationStyle::Box => "Box Style",
            PresentationStyle::Underline => "Underline Style",
            PresentationStyle::Span => "Span Style",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PresentationStyle::Box => "Individual boxes for each missing letter",
            PresentationStyle::Underline => "Individual underlines for each missing letter",
            PresentationStyle::Span => "A single underline for all missing letters in a word",
        }
    }

    /// Whether each hidden letter is its own focusable field.
    pub fn has_letter_slots(self) -> bool {
        !matches!(self, PresentationStyle::Span)
    }

    /// Deterministic per-participant style: first character code modulo three.
    pub fn for_participant(participant_id: &str) -> Self {
        let code = participant_id.chars().next().map_or(0, |ch| ch as u32);
        Self::ALL[(code % Self::ALL.len() as u32) as usize]
    }

    /// Rotate through `styles` by test position. Falls back to `Box` for an empty rotation.
    pub fn for_position(position: usize, styles: &[PresentationStyle]) -> Self {
        if styles.is_empty() {
            return PresentationStyle::Box;
        }
        styles[position % styles.len()]
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for PresentationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown presentation style `{0}`")]
pub struct UnknownStyle(pub String);

impl FromStr for PresentationStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| UnknownStyle(s.to_string()))
    }
}
