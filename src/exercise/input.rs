use crate::exercise::navigation::FieldOrder;
use crate::exercise::style::PresentationStyle;
use crate::exercise::word::TargetWord;

/// Keys the word widget understands, independent of the terminal backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidgetKey {
    Char(char),
    Backspace,
    Left,
    Right,
    Tab,
    BackTab,
    Enter,
}

/// Apply one key to the focused field. Returns true if any slot or the focus changed.
pub fn process_key(
    words: &mut [TargetWord],
    fields: &mut FieldOrder,
    style: PresentationStyle,
    key: WidgetKey,
) -> bool {
    match key {
        WidgetKey::Left => fields.prev(),
        WidgetKey::Right => fields.next(),
        WidgetKey::Char(ch) => process_char(words, fields, style, ch),
        WidgetKey::Backspace => process_backspace(words, fields, style),
        WidgetKey::Tab | WidgetKey::Enter if style == PresentationStyle::Span => fields.next_word(),
        WidgetKey::BackTab if style == PresentationStyle::Span => fields.prev_word(),
        WidgetKey::Tab | WidgetKey::Enter | WidgetKey::BackTab => false,
    }
}

pub fn process_char(
    words: &mut [TargetWord],
    fields: &mut FieldOrder,
    style: PresentationStyle,
    ch: char,
) -> bool {
    if ch.is_control() || ch.is_whitespace() {
        return false;
    }
    let Some(field) = fields.current() else {
        return false;
    };
    let Some(word) = words.get_mut(field.word) else {
        return false;
    };

    if style.has_letter_slots() {
        word.set(field.slot, ch);
        fields.next();
        true
    } else {
        word.push(ch)
    }
}

pub fn process_backspace(
    words: &mut [TargetWord],
    fields: &mut FieldOrder,
    style: PresentationStyle,
) -> bool {
    let Some(field) = fields.current() else {
        return false;
    };

    if style.has_letter_slots() {
        let Some(word) = words.get_mut(field.word) else {
            return false;
        };
        if word.slots[field.slot].is_some() {
            word.clear(field.slot);
            return true;
        }
        if !fields.prev() {
            return false;
        }
        if let Some(prev) = fields.current()
            && let Some(prev_word) = words.get_mut(prev.word)
        {
            prev_word.clear(prev.slot);
        }
        true
    } else {
        if words.get_mut(field.word).is_some_and(|w| w.pop()) {
            return true;
        }
        if !fields.prev_word() {
            return false;
        }
        if let Some(prev) = fields.current()
            && let Some(prev_word) = words.get_mut(prev.word)
        {
            prev_word.pop();
        }
        true
    }
}
