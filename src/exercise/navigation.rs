use crate::exercise::style::PresentationStyle;
use crate::exercise::word::TargetWord;

/// Identifies one focusable input. In span style `slot` is always 0 and the
/// field covers the whole word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldId {
    pub word: usize,
    pub slot: usize,
}

/// Ordered list of focusable fields with an index cursor.
#[derive(Clone, Debug, Default)]
pub struct FieldOrder {
    fields: Vec<FieldId>,
    cursor: usize,
}

impl FieldOrder {
    pub fn new(words: &[TargetWord], style: PresentationStyle) -> Self {
        let fields = words
            .iter()
            .enumerate()
            .filter(|(_, w)| w.hidden_len() > 0)
            .flat_map(|(word, w)| {
                let slots = if style.has_letter_slots() {
                    w.hidden_len()
                } else {
                    1
                };
                (0..slots).map(move |slot| FieldId { word, slot })
            })
            .collect();
        Self { fields, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn current(&self) -> Option<FieldId> {
        self.fields.get(self.cursor).copied()
    }

    pub fn index(&self) -> usize {
        self.cursor
    }

    /// Move one field forward. Returns false at the last field.
    pub fn next(&mut self) -> bool {
        if self.cursor + 1 < self.fields.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Move one field back. Returns false at the first field.
    pub fn prev(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to the first field of the next word.
    pub fn next_word(&mut self) -> bool {
        let Some(current) = self.current() else {
            return false;
        };
        match self.fields[self.cursor..]
            .iter()
            .position(|f| f.word != current.word)
        {
            Some(offset) => {
                self.cursor += offset;
                true
            }
            None => false,
        }
    }

    /// Jump to the first field of the previous word.
    pub fn prev_word(&mut self) -> bool {
        let Some(current) = self.current() else {
            return false;
        };
        let Some(prev_last) = self.fields[..self.cursor]
            .iter()
            .rposition(|f| f.word != current.word)
        else {
            return false;
        };
        let prev_word = self.fields[prev_last].word;
        let first = self.fields[..=prev_last]
            .iter()
            .position(|f| f.word == prev_word)
            .unwrap_or(prev_last);
        self.cursor = first;
        true
    }

    pub fn focus(&mut self, field: FieldId) -> bool {
        match self.fields.iter().position(|f| *f == field) {
            Some(idx) => {
                self.cursor = idx;
                true
            }
            None => false,
        }
    }

    pub fn is_focused(&self, field: FieldId) -> bool {
        self.current() == Some(field)
    }
}
