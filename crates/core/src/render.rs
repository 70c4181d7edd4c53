//! Builds the rows the pages display from task and category records.
//!
//! Rendering is pure: everything a row needs comes from the record, the
//! [`CategoryCache`], and the injected day.

use chrono::NaiveDate;

use crate::cache::CategoryCache;
use crate::due::{self, DueStatus};
use crate::model::{Category, CategoryId, Task, TaskId};

pub const NO_CATEGORY_LABEL: &str = "No category";
pub const NO_DUE_DATE_LABEL: &str = "No due date";
pub const NO_CATEGORY_COLOR: &str = "#808080";

/// Checkbox plus the strike-through state of its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoneState {
    pub checked: bool,
    pub completed: bool,
}

impl DoneState {
    pub fn new(done: bool) -> Self {
        Self {
            checked: done,
            completed: done,
        }
    }

    pub fn set(&mut self, done: bool) {
        self.checked = done;
        self.completed = done;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTag {
    /// `None` for the "No category" fallback.
    pub id: Option<CategoryId>,
    pub title: String,
    pub color: String,
}

impl CategoryTag {
    pub fn none() -> Self {
        Self {
            id: None,
            title: NO_CATEGORY_LABEL.to_string(),
            color: NO_CATEGORY_COLOR.to_string(),
        }
    }

    fn from_category(category: &Category) -> Self {
        Self {
            id: Some(category.id),
            title: category.title.clone(),
            color: category.color.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueElement {
    pub date: Option<String>,
    pub text: String,
    pub status: Option<DueStatus>,
}

impl DueElement {
    pub fn is_past_due(&self) -> bool {
        self.status == Some(DueStatus::PastDue)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: TaskId,
    pub title: String,
    pub done: DoneState,
    pub category: CategoryTag,
    pub due: DueElement,
    pub delete_label: String,
    pub hidden: bool,
}

impl TaskRow {
    pub fn set_title<T: Into<String>>(&mut self, title: T) {
        self.title = title.into();
        self.delete_label = delete_task_label(&self.title);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub category: Category,
    pub modify_label: String,
    pub delete_label: String,
}

/// Inputs shared by every row of one render pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub cache: &'a CategoryCache,
    pub today: NaiveDate,
    pub soon_threshold_days: i64,
}

pub fn render_task(task: &Task, ctx: &RenderContext<'_>) -> TaskRow {
    let category = task
        .primary_category()
        .and_then(|category| ctx.cache.get(category.id))
        .map(CategoryTag::from_category)
        .unwrap_or_else(CategoryTag::none);

    let date = task
        .due_date
        .as_deref()
        .map(str::trim)
        .filter(|date| !date.is_empty())
        .map(str::to_string);
    let status = due::classify_on(date.as_deref(), ctx.today, ctx.soon_threshold_days);
    let text = match (&date, due::parse_due_date(date.as_deref().unwrap_or_default())) {
        (_, Some(parsed)) => parsed.format("%Y-%m-%d").to_string(),
        (Some(raw), None) => raw.clone(),
        (None, None) => NO_DUE_DATE_LABEL.to_string(),
    };

    TaskRow {
        id: task.id,
        title: task.title.clone(),
        done: DoneState::new(task.done),
        category,
        due: DueElement { date, text, status },
        delete_label: delete_task_label(&task.title),
        hidden: false,
    }
}

pub fn render_category(category: &Category) -> CategoryRow {
    CategoryRow {
        category: category.clone(),
        modify_label: format!("Modify category {}", category.title),
        delete_label: format!("Delete category: {}", category.title),
    }
}

fn delete_task_label(title: &str) -> String {
    format!("Delete task: {}", title)
}
