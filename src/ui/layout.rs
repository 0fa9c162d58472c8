use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Header, body and hint footer. The footer grows to fit wrapped hints.
pub struct AppLayout {
    pub header: Rect,
    pub main: Rect,
    pub footer: Rect,
}

impl AppLayout {
    pub fn new(area: Rect, footer_lines: u16) -> Self {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(footer_lines.max(1)),
            ])
            .split(area);

        Self {
            header: vertical[0],
            main: vertical[1],
            footer: vertical[2],
        }
    }
}

/// Width of the reading column: comfortable line length on wide terminals.
pub fn reading_column(area: Rect, max_width: u16) -> Rect {
    if area.width <= max_width {
        return area;
    }
    let left = area.x + (area.width - max_width) / 2;
    Rect::new(left, area.y, max_width, area.height)
}

/// Greedily pack footer hints into indented lines no wider than `width`.
/// A hint longer than the line still gets a line of its own.
pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    const INDENT: &str = "  ";
    const GAP: &str = "  ";

    if width == 0 {
        return Vec::new();
    }
    let mut lines: Vec<String> = Vec::new();
    for hint in hints.iter().copied().filter(|h| !h.is_empty()) {
        match lines.last_mut() {
            Some(line) if line.chars().count() + GAP.len() + hint.chars().count() <= width => {
                line.push_str(GAP);
                line.push_str(hint);
            }
            _ => lines.push(format!("{INDENT}{hint}")),
        }
    }
    lines
}

/// A popup covering the given share of `area`, at least 48x8 cells when
/// `area` allows it.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    fn side(len: u16, percent: u16, min: u16) -> u16 {
        let scaled = (u32::from(len) * u32::from(percent.min(100)) / 100) as u16;
        scaled.max(min).min(len)
    }

    let width = side(area.width, percent_x, 48);
    let height = side(area.height, percent_y, 8);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
