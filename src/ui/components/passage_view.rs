use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::exercise::navigation::FieldId;
use crate::exercise::style::PresentationStyle;
use crate::exercise::test::CTest;
use crate::exercise::word::{TargetWord, WordStatus};
use crate::text::passage::Segment;
use crate::ui::theme::{Theme, ThemeColors};

/// Renders a c-test passage in any presentation style.
pub struct PassageView<'a> {
    test: &'a CTest,
    theme: &'a Theme,
    title: Option<String>,
}

impl<'a> PassageView<'a> {
    pub fn new(test: &'a CTest, theme: &'a Theme) -> Self {
        Self {
            test,
            theme,
            title: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Words and their trailing punctuation, kept together when wrapping.
struct Group {
    spans: Vec<Span<'static>>,
    width: usize,
    has_focus: bool,
}

impl Group {
    fn new() -> Self {
        Self {
            spans: Vec::new(),
            width: 0,
            has_focus: false,
        }
    }

    fn push(&mut self, text: String, style: Style) {
        self.width += text.chars().count();
        self.spans.push(Span::styled(text, style));
    }

    fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

fn slot_style(
    word: &TargetWord,
    filled: bool,
    focused: bool,
    colors: &ThemeColors,
) -> Style {
    match word.status {
        WordStatus::Correct => Style::default().fg(colors.correct()),
        WordStatus::Incorrect => Style::default()
            .fg(colors.incorrect())
            .bg(colors.incorrect_bg()),
        WordStatus::Pending if focused => Style::default()
            .fg(colors.focus_fg())
            .bg(colors.focus_bg()),
        WordStatus::Pending if filled => Style::default().fg(colors.slot_filled()),
        WordStatus::Pending => Style::default().fg(colors.slot_empty()),
    }
}

/// Append the spans for one target word to `group`. `focus` is the focused
/// field of the whole test, if any.
fn push_word(
    group: &mut Group,
    word: &TargetWord,
    word_idx: usize,
    style: PresentationStyle,
    focus: Option<FieldId>,
    colors: &ThemeColors,
) {
    let is_focused = |slot: usize| focus == Some(FieldId { word: word_idx, slot });

    group.push(word.revealed_text(), Style::default().fg(colors.fg()));

    match style {
        PresentationStyle::Box => {
            for (slot, typed) in word.slots.iter().enumerate() {
                let focused = is_focused(slot);
                let style = slot_style(word, typed.is_some(), focused, colors);
                let bracket = if focused {
                    style
                } else {
                    Style::default().fg(colors.border())
                };
                group.push("[".to_string(), bracket);
                group.push(typed.unwrap_or(' ').to_string(), style);
                group.push("]".to_string(), bracket);
                group.has_focus |= focused;
            }
        }
        PresentationStyle::Underline => {
            for (slot, typed) in word.slots.iter().enumerate() {
                let focused = is_focused(slot);
                let style = slot_style(word, typed.is_some(), focused, colors)
                    .add_modifier(Modifier::UNDERLINED);
                group.push(typed.unwrap_or(' ').to_string(), style);
                group.has_focus |= focused;
            }
        }
        PresentationStyle::Span => {
            let focused = word.hidden_len() > 0 && is_focused(0);
            let field: String = word.slots.iter().map(|s| s.unwrap_or(' ')).collect();
            let style = slot_style(word, word.filled_count() > 0, focused, colors)
                .add_modifier(Modifier::UNDERLINED);
            group.push(field, style);
            group.has_focus |= focused;
        }
    }
}

/// A single word drawn on its own, e.g. for a style preview.
pub fn word_spans(
    word: &TargetWord,
    style: PresentationStyle,
    colors: &ThemeColors,
) -> Vec<Span<'static>> {
    let mut group = Group::new();
    push_word(&mut group, word, 0, style, None, colors);
    group.spans
}

/// Break a paragraph into wrap groups. Whitespace separates groups.
fn paragraph_groups(segments: &[Segment], test: &CTest, colors: &ThemeColors) -> Vec<Group> {
    let text_style = Style::default().fg(colors.fg());
    let focus = if test.is_read_only() {
        None
    } else {
        test.fields.current()
    };
    let mut groups = Vec::new();
    let mut current = Group::new();

    for segment in segments {
        match segment {
            Segment::Target(idx) => {
                if let Some(word) = test.words.get(*idx) {
                    push_word(&mut current, word, *idx, test.style, focus, colors);
                }
            }
            Segment::Plain(text) => {
                let mut piece = String::new();
                for ch in text.chars() {
                    if ch.is_whitespace() {
                        if !piece.is_empty() {
                            current.push(std::mem::take(&mut piece), text_style);
                        }
                        if !current.is_empty() {
                            groups.push(std::mem::replace(&mut current, Group::new()));
                        }
                    } else {
                        piece.push(ch);
                    }
                }
                if !piece.is_empty() {
                    current.push(piece, text_style);
                }
            }
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Lay out every paragraph into lines no wider than `width`, separated by a
/// blank line. Also returns the line holding the focused field.
pub fn layout_lines(test: &CTest, colors: &ThemeColors, width: usize) -> (Vec<Line<'static>>, Option<usize>) {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut focus_line = None;

    for (p_idx, segments) in test.passage.paragraphs.iter().enumerate() {
        if p_idx > 0 {
            lines.push(Line::from(""));
        }
        let mut line: Vec<Span<'static>> = Vec::new();
        let mut line_width = 0usize;

        for group in paragraph_groups(segments, test, colors) {
            let needed = if line.is_empty() { group.width } else { group.width + 1 };
            if !line.is_empty() && line_width + needed > width {
                lines.push(Line::from(std::mem::take(&mut line)));
                line_width = 0;
            }
            if !line.is_empty() {
                line.push(Span::raw(" "));
                line_width += 1;
            }
            if group.has_focus {
                focus_line = Some(lines.len());
            }
            line_width += group.width;
            line.extend(group.spans);
        }
        if !line.is_empty() {
            lines.push(Line::from(line));
        }
    }

    (lines, focus_line)
}

/// First visible line so that `focus` sits roughly mid-screen.
fn scroll_offset(total: usize, height: usize, focus: Option<usize>) -> usize {
    if total <= height {
        return 0;
    }
    let focus = focus.unwrap_or(0);
    focus.saturating_sub(height / 2).min(total - height)
}

impl Widget for PassageView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let border = if self.test.is_read_only() {
            colors.border()
        } else {
            colors.border_focused()
        };
        let mut block = Block::bordered()
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(colors.bg()));
        if let Some(title) = &self.title {
            block = block.title(format!(" {title} "));
        }
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width < 2 || inner.height == 0 {
            return;
        }

        // one column of padding on each side
        let text_area = Rect::new(inner.x + 1, inner.y, inner.width - 2, inner.height);
        let (lines, focus_line) = layout_lines(self.test, colors, text_area.width as usize);
        let offset = scroll_offset(lines.len(), text_area.height as usize, focus_line);

        Paragraph::new(lines)
            .scroll((offset as u16, 0))
            .render(text_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use crate::exercise::input::WidgetKey;

    fn make_test(style: PresentationStyle) -> CTest {
        CTest::from_paragraphs(
            "fox",
            &[
                "Intro sentence.".to_string(),
                "The quick brown fox jumps over the lazy dog.".to_string(),
            ],
            false,
            style,
            Duration::ZERO,
        )
    }

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_box_style_shows_bracketed_slots() {
        let test = make_test(PresentationStyle::Box);
        let (lines, focus) = layout_lines(&test, &ThemeColors::default(), 200);
        assert_eq!(
            plain(&lines),
            vec![
                "Intro sentence.",
                "",
                "The quick bro[ ][ ] fox jumps ov[ ][ ] the lazy dog."
            ]
        );
        assert_eq!(focus, Some(2));
    }

    #[test]
    fn test_underline_and_span_show_blank_cells() {
        for style in [PresentationStyle::Underline, PresentationStyle::Span] {
            let mut test = make_test(style);
            test.handle_key(WidgetKey::Char('w'));
            let (lines, _) = layout_lines(&test, &ThemeColors::default(), 200);
            assert_eq!(
                plain(&lines)[2],
                "The quick brow  fox jumps ov   the lazy dog.",
                "{style}"
            );
        }
    }

    #[test]
    fn test_focused_slot_is_highlighted() {
        let test = make_test(PresentationStyle::Underline);
        let colors = ThemeColors::default();
        let (lines, _) = layout_lines(&test, &colors, 200);
        let focused: Vec<_> = lines[2]
            .spans
            .iter()
            .filter(|s| s.style.bg == Some(colors.focus_bg()))
            .collect();
        assert_eq!(focused.len(), 1);
        assert!(focused[0].style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_checked_answers_use_result_colours() {
        let mut test = make_test(PresentationStyle::Box);
        for ch in "wn".chars() {
            test.handle_key(WidgetKey::Char(ch));
        }
        test.check_answers(Instant::now());
        let colors = ThemeColors::default();
        let (lines, focus) = layout_lines(&test, &colors, 200);
        assert_eq!(focus, None);
        let text = plain(&lines)[2].clone();
        assert!(text.contains("bro[w][n]"));
        assert!(text.contains("ov[e][r]"));
        assert!(lines[2].spans.iter().any(|s| s.style.fg == Some(colors.correct())));
        assert!(lines[2].spans.iter().any(|s| s.style.fg == Some(colors.incorrect())));
    }

    #[test]
    fn test_wrapping_keeps_words_whole() {
        let test = make_test(PresentationStyle::Box);
        let (lines, _) = layout_lines(&test, &ThemeColors::default(), 12);
        for line in plain(&lines) {
            assert!(line.chars().count() <= 12, "{line}");
        }
        assert!(plain(&lines).iter().any(|l| l.starts_with("bro[ ][ ]")));
    }

    #[test]
    fn test_word_spans_preview() {
        let mut word = TargetWord::new("psychology");
        for ch in "ology".chars() {
            word.push(ch);
        }
        let colors = ThemeColors::default();
        let text = |style| -> String {
            word_spans(&word, style, &colors)
                .iter()
                .map(|s| s.content.to_string())
                .collect()
        };
        assert_eq!(text(PresentationStyle::Box), "psych[o][l][o][g][y]");
        assert_eq!(text(PresentationStyle::Underline), "psychology");
        assert_eq!(text(PresentationStyle::Span), "psychology");
    }

    #[test]
    fn test_scroll_offset_follows_focus() {
        assert_eq!(scroll_offset(5, 10, Some(4)), 0);
        assert_eq!(scroll_offset(40, 10, Some(0)), 0);
        assert_eq!(scroll_offset(40, 10, Some(20)), 15);
        assert_eq!(scroll_offset(40, 10, Some(39)), 30);
    }

    #[test]
    fn test_render_into_buffer() {
        let test = make_test(PresentationStyle::Box);
        let theme = Theme::default();
        let area = Rect::new(0, 0, 70, 8);
        let mut buf = Buffer::empty(area);
        PassageView::new(&test, &theme).title("Biology").render(area, &mut buf);
        let row: String = (0..area.width).map(|x| buf[(x, 3)].symbol().to_string()).collect();
        assert!(row.contains("bro[ ][ ]"), "{row}");
    }
}
