//! Page controllers: the task list and the category list.
//!
//! Controllers own their rendered rows and report to a [`View`]. Backend
//! failures are logged and turned into status messages; they never propagate
//! to the caller.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{error, info};

use crate::backend::TodoBackend;
use crate::cache::CategoryCache;
use crate::config::AppConfig;
use crate::due::DEFAULT_SOON_THRESHOLD_DAYS;
use crate::form::{validate_title, CategoryForm, TaskForm, ValidationError};
use crate::model::{
    Category, CategoryFilter, CategoryId, CategoryTaskLink, NewTask, TaskId, TaskPatch,
};
use crate::optimistic::Pending;
use crate::render::{
    render_category, render_task, CategoryRow, CategoryTag, RenderContext, TaskRow,
};
use crate::view::{StatusMessage, View};

pub const OVERDUE_BANNER: &str = "You have overdue tasks!";
pub const LOAD_TASKS_FAILED: &str = "Could not load tasks. Check the log for details";
pub const LOAD_CATEGORIES_FAILED: &str = "Could not load categories. Check the log for details";
pub const CREATE_TASK_FAILED: &str = "Failed to create task. Please try again.";
pub const UPDATE_TASK_FAILED: &str = "Failed to update task. Please try again.";
pub const DELETE_TASK_FAILED: &str = "Failed to delete task. Please try again.";
pub const ALREADY_CLEAN: &str = "Todo-list already clean.";
pub const CONFIRM_CLEAR: &str = "Are you sure you want to delete all tasks?";
pub const CLEARED_ALL: &str = "All tasks successfully deleted";
pub const CLEARED_CATEGORY: &str = "All tasks of this category successfully deleted";
pub const CLEAR_FAILED: &str = "Failed to delete all tasks. Check the log for details.";
pub const CREATE_CATEGORY_FAILED: &str = "Failed to create category. Please try again.";
pub const UPDATE_CATEGORY_FAILED: &str = "Failed to update category. Please try again.";
pub const DELETE_CATEGORY_FAILED: &str = "Failed to delete category. Please try again.";

/// Knobs the task page takes from [`AppConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSettings {
    pub soon_threshold_days: i64,
    pub require_due_date: bool,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            soon_threshold_days: DEFAULT_SOON_THRESHOLD_DAYS,
            require_due_date: false,
        }
    }
}

impl From<&AppConfig> for PageSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            soon_threshold_days: config.soon_threshold_days(),
            require_due_date: config.require_due_date(),
        }
    }
}

pub struct TodoPage<B: TodoBackend + ?Sized> {
    backend: Arc<B>,
    settings: PageSettings,
    pinned_today: Option<NaiveDate>,
    rows: Vec<TaskRow>,
    filter: CategoryFilter,
    overdue: bool,
}

impl<B: TodoBackend + ?Sized> TodoPage<B> {
    pub fn new(backend: Arc<B>, settings: PageSettings) -> Self {
        Self {
            backend,
            settings,
            pinned_today: None,
            rows: Vec::new(),
            filter: CategoryFilter::All,
            overdue: false,
        }
    }

    /// Classify due dates against `today` instead of the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.pinned_today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.pinned_today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn rows(&self) -> &[TaskRow] {
        &self.rows
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &TaskRow> {
        self.rows.iter().filter(|row| !row.hidden)
    }

    pub fn row(&self, id: TaskId) -> Option<&TaskRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    pub fn overdue_banner(&self) -> bool {
        self.overdue
    }

    /// Fetch categories, then tasks, and render every row.
    pub async fn load(&mut self, cache: &mut CategoryCache, view: &mut dyn View) {
        let categories = match self.backend.list_categories().await {
            Ok(categories) => categories,
            Err(err) => return self.load_failed(&err, view),
        };
        cache.replace_all(categories);

        let tasks = match self.backend.list_tasks().await {
            Ok(tasks) => tasks,
            Err(err) => return self.load_failed(&err, view),
        };

        let ctx = self.render_context(cache);
        self.rows = tasks.iter().map(|task| render_task(task, &ctx)).collect();
        info!(tasks = self.rows.len(), categories = cache.len(), "tasks loaded");
        self.apply_filter();
        self.refresh_banner(view);
    }

    fn load_failed(&mut self, err: &dyn std::error::Error, view: &mut dyn View) {
        error!(error = %err, "failed to load tasks");
        self.rows.clear();
        view.show_status(StatusMessage::error(LOAD_TASKS_FAILED));
        self.refresh_banner(view);
    }

    /// Validate the form, create the task, link its category, and append
    /// the rendered row.
    pub async fn add_task(
        &mut self,
        form: &TaskForm,
        cache: &CategoryCache,
        view: &mut dyn View,
    ) -> Option<TaskId> {
        let new_task = match self.check_form(form, cache) {
            Ok(new_task) => new_task,
            Err(err) => {
                view.show_status(StatusMessage::error(err.to_string()));
                return None;
            }
        };

        let mut task = match self.backend.create_task(&new_task).await {
            Ok(task) => task,
            Err(err) => {
                error!(error = %err, "failed to create task");
                view.show_status(StatusMessage::error(CREATE_TASK_FAILED));
                return None;
            }
        };
        task.categories.clear();

        let mut message = StatusMessage::info("Task created without category");
        if let Some(category) = form.category.and_then(|id| cache.get(id)) {
            let link = CategoryTaskLink {
                category_id: category.id,
                todo_id: task.id,
            };
            match self.backend.link_category(&link).await {
                Ok(_) => {
                    task.categories.push(category.clone());
                    message = StatusMessage::info(format!(
                        "Task created in category {}",
                        category.title
                    ));
                }
                Err(err) => {
                    error!(error = %err, task = task.id, category = category.id, "failed to link category");
                    message = StatusMessage::error(format!(
                        "Task created but could not be added to category {}",
                        category.title
                    ));
                }
            }
        }

        let ctx = self.render_context(cache);
        let mut row = render_task(&task, &ctx);
        row.hidden = !self.filter.matches(row.category.id);
        self.rows.push(row);
        view.show_status(message);
        self.refresh_banner(view);
        Some(task.id)
    }

    fn check_form(&self, form: &TaskForm, cache: &CategoryCache) -> Result<NewTask, ValidationError> {
        let new_task = form.validate(self.today(), self.settings.require_due_date)?;
        if let Some(id) = form.category {
            if !cache.contains(id) {
                return Err(ValidationError::UnknownCategory(id));
            }
        }
        Ok(new_task)
    }

    /// Flip the done state locally, then persist it; reverts on failure.
    pub async fn toggle_done(&mut self, id: TaskId, view: &mut dyn View) {
        let Some(row) = self.row_mut(id) else {
            return;
        };
        let done = !row.done.checked;
        let pending = Pending::apply(&mut row.done, |state| state.set(done));

        match self.backend.update_task(id, &TaskPatch::done(done)).await {
            Ok(updated) => {
                pending.commit();
                if let (Some(task), Some(row)) = (updated, self.row_mut(id)) {
                    row.done.set(task.done);
                }
            }
            Err(err) => {
                error!(error = %err, task = id, "failed to update task");
                if let Some(row) = self.row_mut(id) {
                    pending.rollback(&mut row.done);
                }
                view.show_status(StatusMessage::error(UPDATE_TASK_FAILED));
            }
        }
    }

    /// Rename a task locally, then persist it; reverts on failure.
    pub async fn edit_task_title(&mut self, id: TaskId, title: &str, view: &mut dyn View) {
        let title = match validate_title(title) {
            Ok(title) => title,
            Err(err) => {
                view.show_status(StatusMessage::error(err.to_string()));
                return;
            }
        };
        let Some(row) = self.row_mut(id) else {
            return;
        };
        let pending = Pending::apply(row, |row| row.set_title(title.clone()));

        match self.backend.update_task(id, &TaskPatch::title(title)).await {
            Ok(updated) => {
                pending.commit();
                if let (Some(task), Some(row)) = (updated, self.row_mut(id)) {
                    row.set_title(task.title);
                }
                view.show_status(StatusMessage::info("Task renamed"));
            }
            Err(err) => {
                error!(error = %err, task = id, "failed to rename task");
                if let Some(row) = self.row_mut(id) {
                    pending.rollback(row);
                }
                view.show_status(StatusMessage::error(UPDATE_TASK_FAILED));
            }
        }
    }

    pub async fn delete_task(&mut self, id: TaskId, view: &mut dyn View) {
        match self.backend.delete_task(id).await {
            Ok(()) => {
                self.rows.retain(|row| row.id != id);
                self.refresh_banner(view);
            }
            Err(err) => {
                error!(error = %err, task = id, "failed to delete task");
                view.show_status(StatusMessage::error(DELETE_TASK_FAILED));
            }
        }
    }

    /// Delete every visible task after confirmation.
    ///
    /// With the `All` filter this is one bulk delete; otherwise rows are
    /// deleted one at a time and the first failure stops the loop.
    pub async fn clear_tasks(&mut self, view: &mut dyn View) {
        let targets: Vec<TaskId> = self.visible_rows().map(|row| row.id).collect();
        if targets.is_empty() {
            view.show_status(StatusMessage::info(ALREADY_CLEAN));
            return;
        }
        if !view.confirm(CONFIRM_CLEAR) {
            return;
        }

        if self.filter == CategoryFilter::All {
            match self.backend.delete_all_tasks().await {
                Ok(()) => {
                    self.rows.clear();
                    view.show_status(StatusMessage::info(CLEARED_ALL));
                }
                Err(err) => {
                    error!(error = %err, "failed to delete all tasks");
                    view.show_status(StatusMessage::error(CLEAR_FAILED));
                }
            }
            self.refresh_banner(view);
            return;
        }

        for id in targets {
            if let Err(err) = self.backend.delete_task(id).await {
                error!(error = %err, task = id, filter = %self.filter, "bulk delete stopped");
                view.show_status(StatusMessage::error(CLEAR_FAILED));
                self.refresh_banner(view);
                return;
            }
            self.rows.retain(|row| row.id != id);
        }
        view.show_status(StatusMessage::info(CLEARED_CATEGORY));
        self.refresh_banner(view);
    }

    pub fn set_filter(&mut self, filter: CategoryFilter, view: &mut dyn View) {
        self.filter = filter;
        self.apply_filter();
        self.refresh_banner(view);
    }

    /// Re-resolve every row's category tag after the cache changed.
    pub fn rerender(&mut self, cache: &CategoryCache, view: &mut dyn View) {
        for row in &mut self.rows {
            if let Some(id) = row.category.id {
                row.category = match cache.get(id) {
                    Some(category) => CategoryTag {
                        id: Some(category.id),
                        title: category.title.clone(),
                        color: category.color.clone(),
                    },
                    None => CategoryTag::none(),
                };
            }
        }
        if let CategoryFilter::Category(id) = self.filter {
            if !cache.contains(id) {
                self.filter = CategoryFilter::All;
            }
        }
        self.apply_filter();
        self.refresh_banner(view);
    }

    fn apply_filter(&mut self) {
        let filter = self.filter;
        for row in &mut self.rows {
            row.hidden = !filter.matches(row.category.id);
        }
    }

    // Hidden rows count too.
    fn refresh_banner(&mut self, view: &mut dyn View) {
        self.overdue = self.rows.iter().any(|row| row.due.is_past_due());
        view.set_overdue_banner(self.overdue);
    }

    fn row_mut(&mut self, id: TaskId) -> Option<&mut TaskRow> {
        self.rows.iter_mut().find(|row| row.id == id)
    }

    fn render_context<'a>(&self, cache: &'a CategoryCache) -> RenderContext<'a> {
        RenderContext {
            cache,
            today: self.today(),
            soon_threshold_days: self.settings.soon_threshold_days,
        }
    }
}

pub struct CategoryPage<B: TodoBackend + ?Sized> {
    backend: Arc<B>,
    rows: Vec<CategoryRow>,
}

impl<B: TodoBackend + ?Sized> CategoryPage<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            rows: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[CategoryRow] {
        &self.rows
    }

    pub async fn load(&mut self, cache: &mut CategoryCache, view: &mut dyn View) {
        match self.backend.list_categories().await {
            Ok(categories) => {
                cache.replace_all(categories);
                self.sync(cache);
            }
            Err(err) => {
                error!(error = %err, "failed to load categories");
                self.rows.clear();
                view.show_status(StatusMessage::error(LOAD_CATEGORIES_FAILED));
            }
        }
    }

    /// Rebuild the rows from the cache without a network call.
    pub fn sync(&mut self, cache: &CategoryCache) {
        self.rows = cache.iter().map(render_category).collect();
    }

    pub async fn add_category(
        &mut self,
        form: &CategoryForm,
        cache: &mut CategoryCache,
        view: &mut dyn View,
    ) -> Option<CategoryId> {
        let new_category = match form.validate() {
            Ok(new_category) => new_category,
            Err(err) => {
                view.show_status(StatusMessage::error(err.to_string()));
                return None;
            }
        };

        match self.backend.create_category(&new_category).await {
            Ok(category) => {
                let id = category.id;
                view.show_status(StatusMessage::info(format!(
                    "Category {} created",
                    category.title
                )));
                self.rows.push(render_category(&category));
                cache.insert(category);
                Some(id)
            }
            Err(err) => {
                error!(error = %err, "failed to create category");
                view.show_status(StatusMessage::error(CREATE_CATEGORY_FAILED));
                None
            }
        }
    }

    /// Patch title and/or color. Nothing local changes on failure.
    pub async fn modify_category(
        &mut self,
        id: CategoryId,
        form: &CategoryForm,
        cache: &mut CategoryCache,
        view: &mut dyn View,
    ) {
        let patch = match form.validate_patch() {
            Ok(patch) => patch,
            Err(err) => {
                view.show_status(StatusMessage::error(err.to_string()));
                return;
            }
        };
        let Some(current) = cache.get(id).cloned() else {
            view.show_status(StatusMessage::error(
                ValidationError::UnknownCategory(id).to_string(),
            ));
            return;
        };

        match self.backend.update_category(id, &patch).await {
            Ok(updated) => {
                let category = updated.unwrap_or_else(|| Category {
                    id,
                    title: patch.title.clone().unwrap_or(current.title),
                    color: patch.color.clone().unwrap_or(current.color),
                });
                if let Some(row) = self.rows.iter_mut().find(|row| row.category.id == id) {
                    *row = render_category(&category);
                }
                view.show_status(StatusMessage::info(format!(
                    "Category {} updated",
                    category.title
                )));
                cache.insert(category);
            }
            Err(err) => {
                error!(error = %err, category = id, "failed to update category");
                view.show_status(StatusMessage::error(UPDATE_CATEGORY_FAILED));
            }
        }
    }

    pub async fn delete_category(
        &mut self,
        id: CategoryId,
        cache: &mut CategoryCache,
        view: &mut dyn View,
    ) {
        match self.backend.delete_category(id).await {
            Ok(()) => {
                self.rows.retain(|row| row.category.id != id);
                if let Some(category) = cache.remove(id) {
                    view.show_status(StatusMessage::info(format!(
                        "Category {} deleted",
                        category.title
                    )));
                }
            }
            Err(err) => {
                error!(error = %err, category = id, "failed to delete category");
                view.show_status(StatusMessage::error(DELETE_CATEGORY_FAILED));
            }
        }
    }
}
