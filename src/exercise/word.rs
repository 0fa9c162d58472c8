#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordStatus {
    Pending,
    Correct,
    Incorrect,
}

/// Number of leading letters shown for a word of `len` letters.
pub fn revealed_len(len: usize) -> usize {
    len.div_ceil(2)
}

/// A blanked word: the revealed prefix plus one input slot per hidden letter.
#[derive(Clone, Debug)]
pub struct TargetWord {
    pub source: Vec<char>,
    pub revealed: usize,
    pub slots: Vec<Option<char>>,
    pub status: WordStatus,
}

impl TargetWord {
    pub fn new(word: &str) -> Self {
        let source: Vec<char> = word.chars().collect();
        let revealed = revealed_len(source.len());
        let hidden = source.len() - revealed;
        Self {
            source,
            revealed,
            slots: vec![None; hidden],
            status: WordStatus::Pending,
        }
    }

    pub fn hidden_len(&self) -> usize {
        self.slots.len()
    }

    pub fn revealed_text(&self) -> String {
        self.source[..self.revealed].iter().collect()
    }

    pub fn source_text(&self) -> String {
        self.source.iter().collect()
    }

    /// Source letter behind hidden slot `slot`.
    pub fn expected(&self, slot: usize) -> char {
        self.source[self.revealed + slot]
    }

    /// Typed letters as `(position in word, char)` pairs; empty slots are skipped.
    pub fn answers(&self) -> Vec<(usize, char)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|ch| (self.revealed + i, ch)))
            .collect()
    }

    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.filled_count() == self.hidden_len()
    }

    pub fn slot_matches(&self, slot: usize) -> bool {
        match self.slots.get(slot).copied().flatten() {
            Some(typed) => letters_match(typed, self.expected(slot)),
            None => false,
        }
    }

    /// True only when every hidden letter matches, ignoring case.
    pub fn is_correct(&self) -> bool {
        (0..self.hidden_len()).all(|slot| self.slot_matches(slot))
    }

    pub fn set(&mut self, slot: usize, ch: char) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = Some(ch);
        }
    }

    pub fn clear(&mut self, slot: usize) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = None;
        }
    }

    /// Append to the first empty slot. Returns false when the word is full.
    pub fn push(&mut self, ch: char) -> bool {
        match self.slots.iter_mut().find(|s| s.is_none()) {
            Some(slot) => {
                *slot = Some(ch);
                true
            }
            None => false,
        }
    }

    /// Remove the last filled letter. Returns false when nothing was typed.
    pub fn pop(&mut self) -> bool {
        match self.slots.iter_mut().rev().find(|s| s.is_some()) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    /// Overwrite every slot that differs from the source letter.
    pub fn fill_expected(&mut self) {
        for i in 0..self.slots.len() {
            let expected = self.expected(i);
            if self.slots[i] != Some(expected) {
                self.slots[i] = Some(expected);
            }
        }
    }
}

pub fn letters_match(typed: char, expected: char) -> bool {
    typed == expected || typed.to_lowercase().eq(expected.to_lowercase())
}
