use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget, Wrap};

use crate::ui::layout::centered_rect;
use crate::ui::theme::Theme;

/// Blocking modal message drawn over the current screen.
pub struct Notice<'a> {
    title: &'a str,
    message: &'a str,
    hint: &'a str,
    theme: &'a Theme,
}

impl<'a> Notice<'a> {
    pub fn new(title: &'a str, message: &'a str, hint: &'a str, theme: &'a Theme) -> Self {
        Self {
            title,
            message,
            hint,
            theme,
        }
    }
}

impl Widget for Notice<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let popup = centered_rect(50, 30, area);
        Clear.render(popup, buf);

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(colors.error()))
            .style(Style::default().bg(colors.bg()));

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                self.message,
                Style::default()
                    .fg(colors.fg())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(self.hint, Style::default().fg(colors.accent()))),
        ];
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(popup, buf);
    }
}
