use std::cmp::min;

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::DueStatus;

pub const BG_BASE: Color = Color::Rgb(14, 17, 23);
pub const BG_PANEL: Color = Color::Rgb(22, 26, 34);
pub const BG_ACCENT: Color = Color::Rgb(32, 37, 47);
pub const FG_ACCENT: Color = Color::Rgb(120, 161, 255);

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = min(width, area.width);
    let h = min(height, area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(w)) / 2,
        y: area.y + (area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}

pub fn inset_rect(area: Rect, padding: u16) -> Rect {
    if area.width == 0 || area.height == 0 {
        return area;
    }
    let px = padding.min(area.width / 2);
    let py = padding.min(area.height / 2);
    Rect {
        x: area.x + px,
        y: area.y + py,
        width: area.width.saturating_sub(px * 2),
        height: area.height.saturating_sub(py * 2),
    }
}

/// `#rrggbb` or `#rgb` to a terminal color; anything else is `None`.
pub fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(Color::Rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        3 => {
            let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Some(Color::Rgb(expand(0)?, expand(1)?, expand(2)?))
        }
        _ => None,
    }
}

pub fn category_style(color: &str) -> Style {
    Style::default().fg(parse_hex_color(color).unwrap_or(Color::Gray))
}

pub fn due_style(status: Option<DueStatus>) -> Style {
    match status {
        Some(DueStatus::PastDue) => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Some(DueStatus::DueToday) => Style::default().fg(Color::Rgb(255, 165, 0)),
        Some(DueStatus::DueSoon) => Style::default().fg(Color::Yellow),
        Some(DueStatus::DueLater) => Style::default().fg(Color::Green),
        None => Style::default().fg(Color::DarkGray),
    }
}

pub fn build_help_lines() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Tab / Shift+Tab", "Switch between Tasks and Categories"),
        ("j / k or ↓ / ↑", "Move selection"),
        ("q", "Quit"),
        ("h", "Toggle this help overlay"),
        ("a", "Add a task or category"),
        ("Space / d", "Toggle done"),
        ("e", "Rename task / modify category"),
        ("x / Delete", "Delete (with confirmation)"),
        ("X", "Delete every visible task"),
        ("f", "Cycle category filter"),
        ("r", "Reload from the backend"),
        ("Tab (in form)", "Next field"),
        ("← / → (in form)", "Pick category"),
        ("Esc", "Cancel/close overlays"),
    ]
}

pub fn accent_title(text: &str) -> Line<'static> {
    Line::from(vec![Span::styled(
        text.to_owned(),
        Style::default().fg(FG_ACCENT).add_modifier(Modifier::BOLD),
    )])
}
