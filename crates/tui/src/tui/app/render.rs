use std::cmp::min;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use ratatui::Frame;

use crate::core::page::OVERDUE_BANNER;
use crate::core::render::NO_CATEGORY_LABEL;
use crate::tui::buffer::TextBuffer;
use crate::tui::constants::APP_VERSION;
use crate::tui::helpers::{
    accent_title, build_help_lines, category_style, centered_rect, due_style, inset_rect,
    BG_ACCENT, BG_BASE, BG_PANEL, FG_ACCENT,
};

use super::{App, ConfirmChoice, FormField, InputMode, Page, PendingConfirm};

impl App {
    pub(crate) fn draw(&mut self, f: &mut Frame<'_>) {
        let size = f.size();
        f.render_widget(Clear, size);
        f.render_widget(Block::default().style(Style::default().bg(BG_BASE)), size);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(2),
            ])
            .split(size);

        self.draw_header(f, chunks[0]);
        self.draw_tabs(f, chunks[1]);
        self.draw_banner(f, chunks[2]);
        match self.page {
            Page::Tasks => self.draw_tasks(f, chunks[3]),
            Page::Categories => self.draw_categories(f, chunks[3]),
        }
        self.draw_footer(f, chunks[4]);

        match self.input_mode {
            InputMode::AddTask => self.draw_task_form(f, size),
            InputMode::Rename => self.draw_rename_overlay(f, size),
            InputMode::CategoryForm => self.draw_category_form(f, size),
            InputMode::Help => self.draw_help_overlay(f, size),
            InputMode::Confirm => self.draw_confirm_overlay(f, size),
            InputMode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(area);

        let left_line = Line::from(vec![
            Span::styled(
                format!(" tdl v{} ", APP_VERSION),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("· {}", self.filter_label())),
            Span::raw("  "),
            Span::styled(self.backend_label(), Style::default().fg(Color::DarkGray)),
        ]);
        f.render_widget(
            Paragraph::new(left_line).style(Style::default().bg(BG_BASE)),
            cols[0],
        );

        let done = self.tasks.rows().iter().filter(|row| row.done.completed).count();
        let right_line = Line::from(vec![Span::styled(
            format!("{}/{} done ", done, self.tasks.rows().len()),
            Style::default().fg(Color::DarkGray),
        )]);
        f.render_widget(
            Paragraph::new(right_line)
                .alignment(Alignment::Right)
                .style(Style::default().bg(BG_BASE)),
            cols[1],
        );
    }

    fn draw_tabs(&self, f: &mut Frame<'_>, area: Rect) {
        let titles = vec![
            Line::from(format!("Tasks ({})", self.tasks.visible_rows().count())),
            Line::from(format!("Categories ({})", self.categories.rows().len())),
        ];
        let tabs = Tabs::new(titles)
            .select(self.page.index())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(accent_title("Views"))
                    .border_style(Style::default().fg(Color::DarkGray))
                    .style(Style::default().bg(BG_PANEL)),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Green)
                    .bg(BG_ACCENT)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(tabs, area);
    }

    fn draw_banner(&self, f: &mut Frame<'_>, area: Rect) {
        if !self.screen.overdue {
            return;
        }
        let line = Line::from(vec![Span::styled(
            format!(" {} ", OVERDUE_BANNER),
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )]);
        f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
    }

    fn draw_empty(&self, f: &mut Frame<'_>, area: Rect, lines: Vec<Line<'static>>) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(area);
        f.render_widget(Clear, area);
        f.render_widget(block, area);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let height = (lines.len() as u16).saturating_add(2).min(inner.height);
        let content_area = centered_rect(inner.width.min(80), height, inner);
        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Center)
                .style(Style::default().bg(BG_PANEL)),
            content_area,
        );
    }

    fn draw_tasks(&mut self, f: &mut Frame<'_>, area: Rect) {
        if self.tasks.visible_rows().next().is_none() {
            let lines = vec![
                Line::from(Span::styled(
                    "No tasks here",
                    Style::default().fg(FG_ACCENT).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "Press `a` to add one, `f` to change the filter",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            self.draw_empty(f, area, lines);
            return;
        }

        let header = Row::new(vec![
            Cell::from(""),
            Cell::from("Title"),
            Cell::from("Category"),
            Cell::from("Due"),
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = self
            .tasks
            .visible_rows()
            .map(|row| {
                let check = if row.done.checked { "[x]" } else { "[ ]" };
                let title_style = if row.done.completed {
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(check),
                    Cell::from(row.title.clone()).style(title_style),
                    Cell::from(row.category.title.clone())
                        .style(category_style(&row.category.color)),
                    Cell::from(row.due.text.clone()).style(due_style(row.due.status)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(3),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
            Constraint::Min(12),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .style(Style::default().bg(BG_PANEL)),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .bg(BG_ACCENT)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_categories(&mut self, f: &mut Frame<'_>, area: Rect) {
        if self.categories.rows().is_empty() {
            let lines = vec![
                Line::from(Span::styled(
                    "No categories yet",
                    Style::default().fg(FG_ACCENT).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "Press `a` to create one",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            self.draw_empty(f, area, lines);
            return;
        }

        let header = Row::new(vec![Cell::from(""), Cell::from("Title"), Cell::from("Color")])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = self
            .categories
            .rows()
            .iter()
            .map(|row| {
                Row::new(vec![
                    Cell::from("■").style(category_style(&row.category.color)),
                    Cell::from(row.category.title.clone()),
                    Cell::from(row.category.color.clone())
                        .style(Style::default().fg(Color::DarkGray)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(2),
            Constraint::Percentage(60),
            Constraint::Min(8),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .style(Style::default().bg(BG_PANEL)),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .bg(BG_ACCENT)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        f.render_stateful_widget(table, area, &mut self.category_state);
    }

    fn draw_footer(&self, f: &mut Frame<'_>, area: Rect) {
        let lines = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        let status_line = if let Some(status) = &self.screen.status {
            Line::from(vec![Span::styled(status.text.clone(), status.style())])
        } else {
            Line::from(vec![Span::raw("Ready")])
        };
        f.render_widget(Paragraph::new(status_line), lines[0]);

        let help = match (self.input_mode, self.page) {
            (InputMode::Normal, Page::Tasks) => {
                "tab categories | j/k move | a add | space done | e rename | x delete | X clear | f filter | r reload | h help | q quit"
            }
            (InputMode::Normal, Page::Categories) => {
                "tab tasks | j/k move | a add | e modify | x delete | r reload | h help | q quit"
            }
            (InputMode::AddTask, _) => "Tab next field • ←/→ category • Enter save • Esc cancel",
            (InputMode::Rename, _) => "Enter to save • Esc to cancel",
            (InputMode::CategoryForm, _) => "Tab next field • Enter save • Esc cancel",
            (InputMode::Help, _) => "Enter/Esc to close",
            (InputMode::Confirm, _) => "←/→ choose • y/n • Enter confirm • Esc cancel",
        };
        let help_line = Line::from(vec![Span::styled(
            help,
            Style::default().fg(Color::DarkGray),
        )]);
        f.render_widget(Paragraph::new(help_line), lines[1]);
    }

    fn draw_task_form(&self, f: &mut Frame<'_>, area: Rect) {
        let width = min(area.width.saturating_sub(10), 70);
        let popup_area = centered_rect(width, 11, area);
        f.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title("Add Task"))
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(popup_area);
        f.render_widget(block, popup_area);

        let fields = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(inner);

        let form = &self.task_form;
        draw_field(
            f,
            fields[0],
            "Title",
            &form.title,
            form.field == FormField::Title,
        );
        draw_field(
            f,
            fields[1],
            "Due (today, fri, +3d, 2024-05-01)",
            &form.due,
            form.field == FormField::Due,
        );

        let (label, style) = match self.form_category().and_then(|id| self.cache.get(id)) {
            Some(category) => (category.title.clone(), category_style(&category.color)),
            None => (NO_CATEGORY_LABEL.to_string(), Style::default().fg(Color::Gray)),
        };
        let focused = form.field == FormField::Category;
        let picker = Line::from(vec![
            Span::styled("◀ ", Style::default().fg(Color::DarkGray)),
            Span::styled(label, style.add_modifier(Modifier::BOLD)),
            Span::styled(" ▶", Style::default().fg(Color::DarkGray)),
        ]);
        f.render_widget(
            Paragraph::new(picker).block(field_block("Category", focused)),
            fields[2],
        );
    }

    fn draw_rename_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let width = min(area.width.saturating_sub(10), 70);
        let popup_area = centered_rect(width, 3, area);
        f.render_widget(Clear, popup_area);
        draw_field(f, popup_area, "Rename Task", &self.rename, true);
    }

    fn draw_category_form(&self, f: &mut Frame<'_>, area: Rect) {
        let width = min(area.width.saturating_sub(10), 60);
        let popup_area = centered_rect(width, 8, area);
        f.render_widget(Clear, popup_area);

        let title = match self.category_form.editing {
            Some(_) => "Modify Category",
            None => "Add Category",
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title(title))
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(popup_area);
        f.render_widget(block, popup_area);

        let fields = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(3)])
            .split(inner);

        let form = &self.category_form;
        draw_field(
            f,
            fields[0],
            "Title",
            &form.title,
            form.field != FormField::Category,
        );
        draw_field(
            f,
            fields[1],
            "Color (#rrggbb)",
            &form.color,
            form.field == FormField::Category,
        );
    }

    fn draw_help_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let lines = build_help_lines();
        let width = min(area.width.saturating_sub(10), 100);
        let height = min(lines.len() as u16 + 4, area.height.saturating_sub(2)).max(10);
        let popup_area = centered_rect(width, height, area);
        f.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title("Keyboard Reference"))
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(popup_area);
        f.render_widget(block, popup_area);

        let help_lines: Vec<Line> = lines
            .into_iter()
            .map(|(combo, desc)| {
                Line::from(vec![
                    Span::styled(combo, Style::default().fg(Color::Cyan)),
                    Span::raw("  "),
                    Span::raw(desc),
                ])
            })
            .collect();

        if inner.width < 3 || inner.height < 3 {
            return;
        }

        f.render_widget(
            Paragraph::new(help_lines)
                .wrap(Wrap { trim: true })
                .style(Style::default().bg(BG_PANEL)),
            inset_rect(inner, 1),
        );
    }

    fn confirm_prompt(&self) -> String {
        match self.confirm {
            Some(PendingConfirm::DeleteTask(id)) => self
                .tasks
                .row(id)
                .map(|row| row.delete_label.clone())
                .unwrap_or_else(|| "Delete selected task?".to_string()),
            Some(PendingConfirm::ClearTasks) => format!(
                "Delete all {} visible task(s)?",
                self.tasks.visible_rows().count()
            ),
            Some(PendingConfirm::DeleteCategory(id)) => self
                .categories
                .rows()
                .iter()
                .find(|row| row.category.id == id)
                .map(|row| row.delete_label.clone())
                .unwrap_or_else(|| "Delete selected category?".to_string()),
            None => String::new(),
        }
    }

    fn draw_confirm_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let width = min(area.width.saturating_sub(20), 60).max(40);
        let popup_area = centered_rect(width, 8, area);
        f.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title("Confirm Deletion"))
            .border_style(Style::default().fg(Color::Red))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(popup_area);
        f.render_widget(block, popup_area);

        let yes_style = if self.confirm_choice == ConfirmChoice::Yes {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Red)
        };
        let no_style = if self.confirm_choice == ConfirmChoice::No {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Gray)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };

        let lines = vec![
            Line::from(vec![Span::styled(
                "This action cannot be undone.",
                Style::default().fg(Color::Red),
            )]),
            Line::from(vec![Span::styled(
                self.confirm_prompt(),
                Style::default().fg(Color::White),
            )]),
            Line::default(),
            Line::from(vec![
                Span::styled("  Yes  ", yes_style),
                Span::raw("    "),
                Span::styled("  No  ", no_style),
            ]),
        ];

        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Center)
                .style(Style::default().bg(BG_PANEL)),
            inset_rect(inner, 1),
        );
    }
}

fn field_block(title: &str, focused: bool) -> Block<'static> {
    let border = if focused { FG_ACCENT } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .title(accent_title(title))
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(BG_PANEL))
}

fn draw_field(f: &mut Frame<'_>, area: Rect, title: &str, buffer: &TextBuffer, focused: bool) {
    let block = field_block(title, focused);
    let inner = block.inner(area);
    f.render_widget(
        Paragraph::new(buffer.as_str().to_string()).block(block),
        area,
    );
    if focused && inner.width > 0 {
        let col = (buffer.cursor_col() as u16).min(inner.width.saturating_sub(1));
        f.set_cursor(inner.x + col, inner.y);
    }
}
