use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::result::TestSubmission;
use crate::ui::theme::Theme;

pub enum CompletionKind<'a> {
    Single(&'a TestSubmission),
    Session {
        participant_id: &'a str,
        completed: usize,
    },
}

/// Thank-you page shown once results are stored.
pub struct Completion<'a> {
    kind: CompletionKind<'a>,
    theme: &'a Theme,
}

impl<'a> Completion<'a> {
    pub fn new(kind: CompletionKind<'a>, theme: &'a Theme) -> Self {
        Self { kind, theme }
    }
}

/// One decimal place, or "n/a" for a test without target words.
pub fn format_score(score: f64) -> String {
    if score.is_finite() {
        format!("{score:.1}%")
    } else {
        "n/a".to_string()
    }
}

impl Widget for Completion<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let title = match self.kind {
            CompletionKind::Single(_) => " Test Completed ",
            CompletionKind::Session { .. } => " All Tests Completed ",
        };

        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Min(4),
                Constraint::Length(2),
            ])
            .split(inner);

        Paragraph::new(Line::from(Span::styled(
            "Thank You!",
            Style::default()
                .fg(colors.success())
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(layout[1], buf);

        let muted = Style::default().fg(colors.text_muted());
        let mut body = match self.kind {
            CompletionKind::Single(result) => vec![
                Line::from(Span::styled(
                    "Your test has been submitted successfully.",
                    Style::default().fg(colors.fg()),
                )),
                Line::from(vec![
                    Span::styled("Your score: ", Style::default().fg(colors.fg())),
                    Span::styled(
                        format_score(result.score),
                        Style::default()
                            .fg(colors.accent())
                            .add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(Span::styled(
                    format!(
                        "({} correct out of {} words)",
                        result.correct_words, result.total_words
                    ),
                    muted,
                )),
            ],
            CompletionKind::Session {
                participant_id,
                completed,
            } => vec![
                Line::from(Span::styled(
                    "You've completed all the c-tests. Thank you for your participation!",
                    Style::default().fg(colors.fg()),
                )),
                Line::from(Span::styled(
                    format!("{completed} tests \u{00b7} participant {participant_id}"),
                    muted,
                )),
            ],
        };
        body.push(Line::from(""));
        body.push(Line::from(Span::styled(
            "Your participation helps us understand which c-test format is most effective.",
            muted,
        )));
        Paragraph::new(body)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(layout[2], buf);

        Paragraph::new(Line::from(Span::styled(
            "[Enter] Return to menu  [q] Quit",
            Style::default().fg(colors.accent()),
        )))
        .alignment(Alignment::Center)
        .render(layout[3], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(80.0), "80.0%");
        assert_eq!(format_score(66.666), "66.7%");
        assert_eq!(format_score(f64::NAN), "n/a");
    }
}
