use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pretty_assertions::assert_eq;
use ratatui::layout::Rect;
use ratatui::style::Color;
use tempfile::TempDir;

use super::{App, InputMode, Page};
use crate::config::AppConfig;
use crate::core::{Database, StatusKind};
use crate::model::{CategoryFilter, NewTask};
use crate::tui::helpers::{centered_rect, parse_hex_color};

fn offline_app() -> (TempDir, App) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = AppConfig::from_data_dir(dir.path().to_path_buf())
        .expect("config")
        .offline();
    let app = App::new(config).expect("app");
    (dir, app)
}

fn press(app: &mut App, code: KeyCode) {
    app.on_key(KeyEvent::new(code, KeyModifiers::NONE))
        .expect("key handled");
}

fn type_text(app: &mut App, text: &str) {
    for ch in text.chars() {
        press(app, KeyCode::Char(ch));
    }
}

fn titles(app: &App) -> Vec<String> {
    app.tasks.visible_rows().map(|row| row.title.clone()).collect()
}

fn status_text(app: &App) -> Option<(String, StatusKind)> {
    app.screen
        .status
        .as_ref()
        .map(|status| (status.text.clone(), status.kind))
}

#[test]
fn centered_rect_keeps_within_bounds() {
    let area = Rect {
        x: 0,
        y: 0,
        width: 80,
        height: 24,
    };
    let rect = centered_rect(40, 10, area);
    assert!(rect.x >= area.x);
    assert!(rect.y >= area.y);
    assert_eq!(rect.width, 40);
    assert_eq!(rect.height, 10);
}

#[test]
fn hex_colors_parse_long_and_short_forms() {
    assert_eq!(parse_hex_color("#ff8000"), Some(Color::Rgb(255, 128, 0)));
    assert_eq!(parse_hex_color("#f80"), Some(Color::Rgb(255, 136, 0)));
    assert_eq!(parse_hex_color("ff8000"), None);
    assert_eq!(parse_hex_color("#gg0000"), None);
    assert_eq!(parse_hex_color("#ééé"), None);
}

#[test]
fn adding_a_task_through_the_form() {
    let (_dir, mut app) = offline_app();
    assert!(titles(&app).is_empty());

    press(&mut app, KeyCode::Char('a'));
    assert_eq!(app.input_mode, InputMode::AddTask);
    type_text(&mut app, "Buy milk");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.input_mode, InputMode::Normal);
    assert_eq!(titles(&app), vec!["Buy milk".to_string()]);
    assert_eq!(
        status_text(&app),
        Some(("Task created without category".to_string(), StatusKind::Info))
    );
}

#[test]
fn empty_title_keeps_the_form_open() {
    let (_dir, mut app) = offline_app();

    press(&mut app, KeyCode::Char('a'));
    type_text(&mut app, "   ");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.input_mode, InputMode::AddTask);
    assert!(titles(&app).is_empty());
    assert_eq!(
        status_text(&app),
        Some(("Task cannot be empty".to_string(), StatusKind::Error))
    );
}

#[test]
fn toggling_and_renaming_the_selected_task() {
    let (_dir, mut app) = offline_app();
    press(&mut app, KeyCode::Char('a'));
    type_text(&mut app, "Write report");
    press(&mut app, KeyCode::Enter);

    press(&mut app, KeyCode::Char(' '));
    let row = app.tasks.visible_rows().next().expect("row");
    assert!(row.done.checked);
    assert!(row.done.completed);

    press(&mut app, KeyCode::Char('e'));
    assert_eq!(app.input_mode, InputMode::Rename);
    press(&mut app, KeyCode::Backspace);
    press(&mut app, KeyCode::Backspace);
    press(&mut app, KeyCode::Backspace);
    press(&mut app, KeyCode::Backspace);
    press(&mut app, KeyCode::Backspace);
    press(&mut app, KeyCode::Backspace);
    type_text(&mut app, "memo");
    press(&mut app, KeyCode::Enter);

    assert_eq!(titles(&app), vec!["Write memo".to_string()]);

    // Persisted: a reload shows the same state.
    press(&mut app, KeyCode::Char('r'));
    let row = app.tasks.visible_rows().next().expect("row");
    assert_eq!(row.title, "Write memo");
    assert!(row.done.checked);
}

#[test]
fn clearing_requires_confirmation() {
    let (_dir, mut app) = offline_app();
    for title in ["one", "two"] {
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, title);
        press(&mut app, KeyCode::Enter);
    }

    press(&mut app, KeyCode::Char('X'));
    assert_eq!(app.input_mode, InputMode::Confirm);
    press(&mut app, KeyCode::Enter);
    assert_eq!(titles(&app).len(), 2);

    press(&mut app, KeyCode::Char('X'));
    press(&mut app, KeyCode::Char('y'));
    assert!(titles(&app).is_empty());
    assert_eq!(
        status_text(&app),
        Some(("All tasks successfully deleted".to_string(), StatusKind::Info))
    );

    press(&mut app, KeyCode::Char('X'));
    assert_eq!(app.input_mode, InputMode::Normal);
    assert_eq!(
        status_text(&app),
        Some(("Todo-list already clean.".to_string(), StatusKind::Info))
    );
}

#[test]
fn categories_tab_adds_a_category_and_filter_cycles_through_it() {
    let (_dir, mut app) = offline_app();

    press(&mut app, KeyCode::Tab);
    assert_eq!(app.page, Page::Categories);
    press(&mut app, KeyCode::Char('a'));
    type_text(&mut app, "Work");
    press(&mut app, KeyCode::Tab);
    for _ in 0..7 {
        press(&mut app, KeyCode::Backspace);
    }
    type_text(&mut app, "00ff00");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.input_mode, InputMode::Normal);
    assert_eq!(app.categories.rows().len(), 1);
    let category = app.categories.rows()[0].category.clone();
    assert_eq!(category.title, "Work");
    assert_eq!(category.color, "#00ff00");

    press(&mut app, KeyCode::Tab);
    assert_eq!(app.page, Page::Tasks);

    press(&mut app, KeyCode::Char('a'));
    type_text(&mut app, "Deploy");
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Enter);
    assert_eq!(
        status_text(&app),
        Some(("Task created in category Work".to_string(), StatusKind::Info))
    );

    press(&mut app, KeyCode::Char('a'));
    type_text(&mut app, "Loose end");
    press(&mut app, KeyCode::Enter);

    press(&mut app, KeyCode::Char('f'));
    assert_eq!(app.tasks.filter(), CategoryFilter::Uncategorized);
    assert_eq!(titles(&app), vec!["Loose end".to_string()]);

    press(&mut app, KeyCode::Char('f'));
    assert_eq!(app.tasks.filter(), CategoryFilter::Category(category.id));
    assert_eq!(titles(&app), vec!["Deploy".to_string()]);

    press(&mut app, KeyCode::Char('f'));
    assert_eq!(app.tasks.filter(), CategoryFilter::All);
    assert_eq!(titles(&app).len(), 2);
}

#[test]
fn deleting_a_category_untags_its_tasks() {
    let (_dir, mut app) = offline_app();
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Char('a'));
    type_text(&mut app, "Home");
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Tab);

    press(&mut app, KeyCode::Char('a'));
    type_text(&mut app, "Vacuum");
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Enter);

    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Char('x'));
    assert_eq!(app.input_mode, InputMode::Confirm);
    press(&mut app, KeyCode::Left);
    press(&mut app, KeyCode::Enter);

    assert!(app.categories.rows().is_empty());
    let row = app.tasks.visible_rows().next().expect("row");
    assert_eq!(row.category.id, None);
    assert_eq!(row.category.title, "No category");
}

#[test]
fn overdue_tasks_raise_the_banner() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = AppConfig::from_data_dir(dir.path().to_path_buf())
        .expect("config")
        .offline();
    let database = Database::initialize(&config).expect("database");
    database
        .insert_task(&NewTask {
            title: "File taxes".into(),
            due_date: Some("2000-04-15".into()),
            done: false,
        })
        .expect("insert");
    drop(database);

    let mut app = App::new(config).expect("app");
    assert!(app.screen.overdue);

    press(&mut app, KeyCode::Char('x'));
    press(&mut app, KeyCode::Char('y'));
    assert!(!app.screen.overdue);
    assert!(titles(&app).is_empty());
}

#[test]
fn ctrl_c_and_q_quit() {
    let (_dir, mut app) = offline_app();
    app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
        .expect("key handled");
    assert!(app.should_quit());

    let (_dir, mut app) = offline_app();
    press(&mut app, KeyCode::Char('q'));
    assert!(app.should_quit());
}
