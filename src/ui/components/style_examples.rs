use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::exercise::style::PresentationStyle;
use crate::exercise::word::TargetWord;
use crate::ui::components::passage_view::word_spans;
use crate::ui::theme::Theme;

const EXAMPLE_WORD: &str = "psychology";

/// The example word, answered, in every presentation style.
pub struct StyleExamples<'a> {
    theme: &'a Theme,
}

impl<'a> StyleExamples<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

fn answered_example() -> TargetWord {
    let mut word = TargetWord::new(EXAMPLE_WORD);
    word.fill_expected();
    word
}

impl Widget for StyleExamples<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(" Style examples ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));

        let word = answered_example();
        let mut lines = vec![Line::from("")];
        for style in PresentationStyle::ALL {
            lines.push(Line::from(Span::styled(
                format!("  Example of {}", style.label()),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                format!("  {}", style.description()),
                Style::default().fg(colors.text_muted()),
            )));
            let mut spans = vec![Span::raw("    ")];
            spans.extend(word_spans(&word, style, colors));
            lines.push(Line::from(spans));
            lines.push(Line::from(""));
        }

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
