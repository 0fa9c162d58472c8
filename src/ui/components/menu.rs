use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Sequential,
    AllAtOnce,
    SingleTest,
    StyleExamples,
    Quit,
}

pub struct MenuItem {
    pub key: char,
    pub label: &'static str,
    pub description: &'static str,
    pub action: MenuAction,
}

pub struct Menu<'a> {
    pub items: Vec<MenuItem>,
    pub selected: usize,
    pub theme: &'a Theme,
    pub text_count: usize,
}

impl<'a> Menu<'a> {
    pub fn new(theme: &'a Theme, text_count: usize) -> Self {
        Self {
            items: vec![
                MenuItem {
                    key: '1',
                    label: "Sequential session",
                    description: "Every text in turn, one presentation style throughout",
                    action: MenuAction::Sequential,
                },
                MenuItem {
                    key: '2',
                    label: "All-at-once session",
                    description: "Every text on one page, styles rotating between texts",
                    action: MenuAction::AllAtOnce,
                },
                MenuItem {
                    key: '3',
                    label: "Single test",
                    description: "Pick one text and a style",
                    action: MenuAction::SingleTest,
                },
                MenuItem {
                    key: 'e',
                    label: "Style examples",
                    description: "See how each presentation style looks",
                    action: MenuAction::StyleExamples,
                },
                MenuItem {
                    key: 'q',
                    label: "Quit",
                    description: "Leave ctest",
                    action: MenuAction::Quit,
                },
            ],
            selected: 0,
            theme,
            text_count,
        }
    }

    pub fn next(&mut self) {
        self.selected = (self.selected + 1) % self.items.len();
    }

    pub fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.items.len() - 1;
        }
    }

    pub fn selected_action(&self) -> Option<MenuAction> {
        self.items.get(self.selected).map(|item| item.action)
    }

    pub fn action_for_key(&self, key: char) -> Option<MenuAction> {
        self.items
            .iter()
            .find(|item| item.key == key)
            .map(|item| item.action)
    }
}

impl Widget for &Menu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let title_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "ctest",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("C-test reading study \u{00b7} {} texts", self.text_count),
                Style::default().fg(colors.fg()),
            )),
            Line::from(""),
        ];
        Paragraph::new(title_lines)
            .alignment(Alignment::Center)
            .render(layout[0], buf);

        let menu_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                self.items
                    .iter()
                    .map(|_| Constraint::Length(3))
                    .collect::<Vec<_>>(),
            )
            .split(layout[2]);

        for (i, item) in self.items.iter().enumerate() {
            let is_selected = i == self.selected;
            let indicator = if is_selected { ">" } else { " " };
            let label_style = if is_selected {
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };

            let lines = vec![
                Line::from(Span::styled(
                    format!(" {indicator} [{}] {}", item.key, item.label),
                    label_style,
                )),
                Line::from(Span::styled(
                    format!("     {}", item.description),
                    Style::default().fg(colors.text_muted()),
                )),
            ];

            if let Some(slot) = menu_layout.get(i) {
                Paragraph::new(lines).render(*slot, buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_wraps_selection() {
        let theme = Theme::default();
        let mut menu = Menu::new(&theme, 12);
        menu.prev();
        assert_eq!(menu.selected_action(), Some(MenuAction::Quit));
        menu.next();
        assert_eq!(menu.selected_action(), Some(MenuAction::Sequential));
    }

    #[test]
    fn test_menu_shortcuts() {
        let theme = Theme::default();
        let menu = Menu::new(&theme, 12);
        assert_eq!(menu.action_for_key('2'), Some(MenuAction::AllAtOnce));
        assert_eq!(menu.action_for_key('e'), Some(MenuAction::StyleExamples));
        assert_eq!(menu.action_for_key('z'), None);
    }
}
