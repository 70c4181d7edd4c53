use std::time::Instant;

use anyhow::{Context, Result};
use ratatui::style::{Color, Style};
use ratatui::widgets::TableState;
use tokio::runtime::Runtime;

use super::buffer::TextBuffer;
use super::constants::*;
use crate::config::{AppConfig, BackendKind};
use crate::core::backend::{self, TodoBackend};
use crate::core::page::PageSettings;
use crate::core::{
    CategoryCache, CategoryForm, CategoryPage, StatusKind, StatusMessage, TaskForm, TodoPage, View,
};
use crate::model::{CategoryFilter, CategoryId, TaskId};

mod input;
mod render;
#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Tasks,
    Categories,
}

impl Page {
    fn index(self) -> usize {
        match self {
            Page::Tasks => 0,
            Page::Categories => 1,
        }
    }

    fn toggle(self) -> Self {
        match self {
            Page::Tasks => Page::Categories,
            Page::Categories => Page::Tasks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    AddTask,
    Rename,
    CategoryForm,
    Help,
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfirmChoice {
    Yes,
    No,
}

impl ConfirmChoice {
    fn toggle(self) -> Self {
        match self {
            ConfirmChoice::Yes => ConfirmChoice::No,
            ConfirmChoice::No => ConfirmChoice::Yes,
        }
    }
}

/// What the confirmation overlay is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingConfirm {
    DeleteTask(TaskId),
    ClearTasks,
    DeleteCategory(CategoryId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Title,
    Due,
    Category,
}

impl FormField {
    fn next(self, with_due: bool) -> Self {
        match (self, with_due) {
            (FormField::Title, true) => FormField::Due,
            (FormField::Due, _) => FormField::Category,
            (FormField::Title, false) => FormField::Category,
            (FormField::Category, _) => FormField::Title,
        }
    }
}

/// Fields of the new-task overlay.
#[derive(Debug, Clone)]
struct TaskFormState {
    title: TextBuffer,
    due: TextBuffer,
    /// 0 is "No category"; otherwise an index into the cache plus one.
    category_index: usize,
    field: FormField,
}

impl TaskFormState {
    fn new() -> Self {
        Self {
            title: TextBuffer::new(),
            due: TextBuffer::new(),
            category_index: 0,
            field: FormField::Title,
        }
    }

    fn focused(&mut self) -> Option<&mut TextBuffer> {
        match self.field {
            FormField::Title => Some(&mut self.title),
            FormField::Due => Some(&mut self.due),
            FormField::Category => None,
        }
    }
}

/// Fields of the add/modify category overlay. `Due` is unused here and the
/// `Category` field holds the color.
#[derive(Debug, Clone)]
struct CategoryFormState {
    editing: Option<CategoryId>,
    title: TextBuffer,
    color: TextBuffer,
    field: FormField,
}

impl CategoryFormState {
    fn new() -> Self {
        let defaults = CategoryForm::default();
        let mut color = TextBuffer::new();
        color.set(defaults.color);
        Self {
            editing: None,
            title: TextBuffer::new(),
            color,
            field: FormField::Title,
        }
    }

    fn focused(&mut self) -> &mut TextBuffer {
        match self.field {
            FormField::Title | FormField::Due => &mut self.title,
            FormField::Category => &mut self.color,
        }
    }

    fn to_form(&self) -> CategoryForm {
        CategoryForm {
            title: self.title.as_str().to_string(),
            color: self.color.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct StatusLine {
    text: String,
    kind: StatusKind,
    created_at: Instant,
}

impl StatusLine {
    fn style(&self) -> Style {
        match self.kind {
            StatusKind::Info => Style::default().fg(Color::Cyan),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// The [`View`] the pages report to: status line, overdue banner, and the
/// answer picked in the confirmation overlay.
#[derive(Debug, Default)]
struct Screen {
    status: Option<StatusLine>,
    overdue: bool,
    confirm_answer: bool,
}

impl View for Screen {
    fn show_status(&mut self, message: StatusMessage) {
        self.status = Some(StatusLine {
            text: message.text,
            kind: message.kind,
            created_at: Instant::now(),
        });
    }

    fn hide_status(&mut self) {
        self.status = None;
    }

    fn set_overdue_banner(&mut self, visible: bool) {
        self.overdue = visible;
    }

    fn confirm(&mut self, _prompt: &str) -> bool {
        std::mem::take(&mut self.confirm_answer)
    }
}

pub(crate) struct App {
    config: AppConfig,
    runtime: Runtime,
    tasks: TodoPage<dyn TodoBackend>,
    categories: CategoryPage<dyn TodoBackend>,
    cache: CategoryCache,
    screen: Screen,
    page: Page,
    selected: usize,
    table_state: TableState,
    category_selected: usize,
    category_state: TableState,
    input_mode: InputMode,
    task_form: TaskFormState,
    category_form: CategoryFormState,
    rename: TextBuffer,
    renaming: Option<TaskId>,
    confirm: Option<PendingConfirm>,
    confirm_choice: ConfirmChoice,
    should_quit: bool,
}

impl App {
    pub(crate) fn new(config: AppConfig) -> Result<Self> {
        let backend = backend::connect(&config)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;

        let mut app = Self {
            tasks: TodoPage::new(backend.clone(), PageSettings::from(&config)),
            categories: CategoryPage::new(backend),
            config,
            runtime,
            cache: CategoryCache::new(),
            screen: Screen::default(),
            page: Page::Tasks,
            selected: 0,
            table_state: TableState::default(),
            category_selected: 0,
            category_state: TableState::default(),
            input_mode: InputMode::Normal,
            task_form: TaskFormState::new(),
            category_form: CategoryFormState::new(),
            rename: TextBuffer::new(),
            renaming: None,
            confirm: None,
            confirm_choice: ConfirmChoice::No,
            should_quit: false,
        };
        app.refresh();
        Ok(app)
    }

    /// Reload categories and tasks, then rebuild the category rows.
    pub(crate) fn refresh(&mut self) {
        self.runtime
            .block_on(self.tasks.load(&mut self.cache, &mut self.screen));
        self.categories.sync(&self.cache);
        self.clamp_selection();
    }

    pub(crate) fn on_tick(&mut self) {
        if let Some(status) = &self.screen.status {
            if status.created_at.elapsed() > STATUS_TTL {
                self.screen.hide_status();
            }
        }
    }

    pub(crate) fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn backend_label(&self) -> String {
        match self.config.backend() {
            BackendKind::Rest => self.config.api_url().to_string(),
            BackendKind::Local => format!("offline: {}", self.config.db_path().display()),
        }
    }

    fn visible_task_ids(&self) -> Vec<TaskId> {
        self.tasks.visible_rows().map(|row| row.id).collect()
    }

    fn selected_task_id(&self) -> Option<TaskId> {
        self.tasks
            .visible_rows()
            .nth(self.selected)
            .map(|row| row.id)
    }

    fn selected_category_id(&self) -> Option<CategoryId> {
        self.categories
            .rows()
            .get(self.category_selected)
            .map(|row| row.category.id)
    }

    fn clamp_selection(&mut self) {
        let visible = self.tasks.visible_rows().count();
        if visible == 0 {
            self.selected = 0;
            self.table_state.select(None);
        } else {
            self.selected = self.selected.min(visible - 1);
            self.table_state.select(Some(self.selected));
        }

        let categories = self.categories.rows().len();
        if categories == 0 {
            self.category_selected = 0;
            self.category_state.select(None);
        } else {
            self.category_selected = self.category_selected.min(categories - 1);
            self.category_state.select(Some(self.category_selected));
        }
    }

    fn select_next(&mut self) {
        match self.page {
            Page::Tasks => self.selected = self.selected.saturating_add(1),
            Page::Categories => self.category_selected = self.category_selected.saturating_add(1),
        }
        self.clamp_selection();
    }

    fn select_prev(&mut self) {
        match self.page {
            Page::Tasks => self.selected = self.selected.saturating_sub(1),
            Page::Categories => self.category_selected = self.category_selected.saturating_sub(1),
        }
        self.clamp_selection();
    }

    fn select_task_by_id(&mut self, id: TaskId) {
        if let Some(idx) = self.visible_task_ids().iter().position(|row| *row == id) {
            self.selected = idx;
            self.table_state.select(Some(idx));
        }
    }

    fn switch_page(&mut self) {
        self.page = self.page.toggle();
        self.input_mode = InputMode::Normal;
        self.clamp_selection();
    }

    /// All → Uncategorized → each category → All.
    fn cycle_filter(&mut self) {
        let ids: Vec<CategoryId> = self.cache.iter().map(|category| category.id).collect();
        let next = match self.tasks.filter() {
            CategoryFilter::All => CategoryFilter::Uncategorized,
            CategoryFilter::Uncategorized => ids
                .first()
                .map(|id| CategoryFilter::Category(*id))
                .unwrap_or(CategoryFilter::All),
            CategoryFilter::Category(current) => ids
                .iter()
                .skip_while(|id| **id != current)
                .nth(1)
                .map(|id| CategoryFilter::Category(*id))
                .unwrap_or(CategoryFilter::All),
        };
        self.tasks.set_filter(next, &mut self.screen);
        self.selected = 0;
        self.clamp_selection();
        self.set_status_info(format!("Showing: {}", self.filter_label()));
    }

    fn filter_label(&self) -> String {
        match self.tasks.filter() {
            CategoryFilter::All => "all tasks".to_string(),
            CategoryFilter::Uncategorized => "uncategorized".to_string(),
            CategoryFilter::Category(id) => self
                .cache
                .get(id)
                .map(|category| category.title.clone())
                .unwrap_or_else(|| format!("category {}", id)),
        }
    }

    fn begin_add_task(&mut self) {
        self.task_form = TaskFormState::new();
        if let CategoryFilter::Category(id) = self.tasks.filter() {
            if let Some(idx) = self.cache.iter().position(|category| category.id == id) {
                self.task_form.category_index = idx + 1;
            }
        }
        self.input_mode = InputMode::AddTask;
        self.set_status_info(STATUS_ENTER_ADD);
    }

    fn cycle_form_category(&mut self, forward: bool) {
        let options = self.cache.len() + 1;
        let index = &mut self.task_form.category_index;
        *index = if forward {
            (*index + 1) % options
        } else {
            (*index + options - 1) % options
        };
    }

    fn form_category(&self) -> Option<CategoryId> {
        match self.task_form.category_index {
            0 => None,
            n => self.cache.iter().nth(n - 1).map(|category| category.id),
        }
    }

    fn submit_task_form(&mut self) {
        let form = TaskForm {
            title: self.task_form.title.as_str().to_string(),
            due_date: self.task_form.due.as_str().to_string(),
            category: self.form_category(),
        };
        let created = self
            .runtime
            .block_on(self.tasks.add_task(&form, &self.cache, &mut self.screen));
        if let Some(id) = created {
            self.input_mode = InputMode::Normal;
            self.task_form = TaskFormState::new();
            self.clamp_selection();
            self.select_task_by_id(id);
        }
    }

    fn toggle_selected(&mut self) {
        let Some(id) = self.selected_task_id() else {
            self.set_status_info("Nothing to toggle");
            return;
        };
        self.runtime
            .block_on(self.tasks.toggle_done(id, &mut self.screen));
    }

    fn begin_rename(&mut self) {
        let Some(row) = self
            .selected_task_id()
            .and_then(|id| self.tasks.row(id))
        else {
            self.set_status_info("Nothing to rename");
            return;
        };
        self.renaming = Some(row.id);
        self.rename.set(row.title.clone());
        self.input_mode = InputMode::Rename;
        self.set_status_info(STATUS_ENTER_RENAME);
    }

    fn submit_rename(&mut self) {
        if let Some(id) = self.renaming.take() {
            let title = self.rename.as_str().to_string();
            self.runtime
                .block_on(self.tasks.edit_task_title(id, &title, &mut self.screen));
        }
        self.rename.clear();
        self.input_mode = InputMode::Normal;
    }

    fn begin_category_form(&mut self, editing: Option<CategoryId>) {
        let mut state = CategoryFormState::new();
        if let Some(category) = editing.and_then(|id| self.cache.get(id)) {
            state.title.set(category.title.clone());
            state.color.set(category.color.clone());
            state.editing = Some(category.id);
        } else if editing.is_some() {
            self.set_status_info("Nothing to modify");
            return;
        }
        self.category_form = state;
        self.input_mode = InputMode::CategoryForm;
        self.set_status_info(STATUS_ENTER_CATEGORY);
    }

    fn submit_category_form(&mut self) {
        let form = self.category_form.to_form();
        let succeeded = match self.category_form.editing {
            Some(id) => {
                self.runtime.block_on(self.categories.modify_category(
                    id,
                    &form,
                    &mut self.cache,
                    &mut self.screen,
                ));
                !self.screen_shows_error()
            }
            None => self
                .runtime
                .block_on(
                    self.categories
                        .add_category(&form, &mut self.cache, &mut self.screen),
                )
                .is_some(),
        };
        if succeeded {
            self.input_mode = InputMode::Normal;
            self.tasks.rerender(&self.cache, &mut self.screen);
            self.clamp_selection();
        }
    }

    fn screen_shows_error(&self) -> bool {
        matches!(
            &self.screen.status,
            Some(StatusLine {
                kind: StatusKind::Error,
                ..
            })
        )
    }

    fn prompt_confirm(&mut self, pending: PendingConfirm) {
        self.confirm = Some(pending);
        self.confirm_choice = ConfirmChoice::No;
        self.input_mode = InputMode::Confirm;
        self.set_status_info(STATUS_CONFIRM);
    }

    fn prompt_delete(&mut self) {
        match self.page {
            Page::Tasks => match self.selected_task_id() {
                Some(id) => self.prompt_confirm(PendingConfirm::DeleteTask(id)),
                None => self.set_status_info("Nothing to delete"),
            },
            Page::Categories => match self.selected_category_id() {
                Some(id) => self.prompt_confirm(PendingConfirm::DeleteCategory(id)),
                None => self.set_status_info("Nothing to delete"),
            },
        }
    }

    fn prompt_clear(&mut self) {
        if self.visible_task_ids().is_empty() {
            // Reports "already clean" without asking.
            self.runtime
                .block_on(self.tasks.clear_tasks(&mut self.screen));
            return;
        }
        self.prompt_confirm(PendingConfirm::ClearTasks);
    }

    fn resolve_confirm(&mut self, choice: ConfirmChoice) {
        self.input_mode = InputMode::Normal;
        let Some(pending) = self.confirm.take() else {
            return;
        };
        if choice == ConfirmChoice::No {
            self.set_status_info("Deletion cancelled");
            return;
        }

        match pending {
            PendingConfirm::DeleteTask(id) => {
                self.runtime
                    .block_on(self.tasks.delete_task(id, &mut self.screen));
                if self.tasks.row(id).is_none() {
                    self.set_status_info("Deleted task");
                }
            }
            PendingConfirm::ClearTasks => {
                self.screen.confirm_answer = true;
                self.runtime
                    .block_on(self.tasks.clear_tasks(&mut self.screen));
                self.screen.confirm_answer = false;
            }
            PendingConfirm::DeleteCategory(id) => {
                self.runtime.block_on(self.categories.delete_category(
                    id,
                    &mut self.cache,
                    &mut self.screen,
                ));
                self.tasks.rerender(&self.cache, &mut self.screen);
            }
        }
        self.clamp_selection();
    }

    pub(crate) fn set_status_info<T: Into<String>>(&mut self, message: T) {
        self.screen.show_status(StatusMessage::info(message));
    }
}
