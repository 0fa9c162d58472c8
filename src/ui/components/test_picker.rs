use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::exercise::style::PresentationStyle;
use crate::text::catalog::TextSummary;
use crate::ui::theme::Theme;

/// Text list for a single test, with the style to run it in.
pub struct TestPicker<'a> {
    summaries: &'a [TextSummary],
    selected: usize,
    style: PresentationStyle,
    theme: &'a Theme,
}

impl<'a> TestPicker<'a> {
    pub fn new(
        summaries: &'a [TextSummary],
        selected: usize,
        style: PresentationStyle,
        theme: &'a Theme,
    ) -> Self {
        Self {
            summaries,
            selected,
            style,
            theme,
        }
    }
}

/// First visible row so that `selected` stays on screen.
fn first_visible(selected: usize, height: usize) -> usize {
    if height == 0 {
        return 0;
    }
    selected.saturating_sub(height - 1)
}

impl Widget for TestPicker<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Choose a text ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(1)])
            .split(inner);

        Paragraph::new(Line::from(vec![
            Span::styled("  Style: ", Style::default().fg(colors.fg())),
            Span::styled(
                format!("\u{25c2} {} \u{25b8}", self.style.label()),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", self.style.description()),
                Style::default().fg(colors.text_muted()),
            ),
        ]))
        .render(layout[0], buf);

        let list_area = layout[1];
        let start = first_visible(self.selected, list_area.height as usize);
        let lines: Vec<Line> = self
            .summaries
            .iter()
            .enumerate()
            .skip(start)
            .take(list_area.height as usize)
            .map(|(i, summary)| {
                let is_selected = i == self.selected;
                let indicator = if is_selected { ">" } else { " " };
                let style = if is_selected {
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.fg())
                };
                Line::from(vec![
                    Span::styled(format!(" {indicator} {}", summary.title), style),
                    Span::styled(
                        format!("  ({})", summary.register_label()),
                        Style::default().fg(colors.text_muted()),
                    ),
                ])
            })
            .collect();
        Paragraph::new(lines).render(list_area, buf);
    }
}
