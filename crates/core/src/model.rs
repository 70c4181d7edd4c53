use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Deserializer, Serialize};

pub type TaskId = i64;
pub type CategoryId = i64;

/// Category id used by the "Uncategorized" filter entry.
pub const NO_CATEGORY_ID: CategoryId = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    pub color: String,
}

/// A task row as the backend represents it, with its categories embedded
/// (`select=*,categories(*)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default, deserialize_with = "nullable_list")]
    pub categories: Vec<Category>,
}

impl Task {
    /// The category shown for this task.
    ///
    /// Links are many-to-many on the wire but the client assigns at most one;
    /// when several are present the first one wins.
    pub fn primary_category(&self) -> Option<&Category> {
        self.categories.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub title: String,
    pub due_date: Option<String>,
    pub done: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

impl TaskPatch {
    pub fn done(done: bool) -> Self {
        Self {
            done: Some(done),
            ..Self::default()
        }
    }

    pub fn title<T: Into<String>>(title: T) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCategory {
    pub title: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Join record associating a category with a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTaskLink {
    pub category_id: CategoryId,
    pub todo_id: TaskId,
}

/// Which tasks the task page shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Uncategorized,
    Category(CategoryId),
}

impl CategoryFilter {
    /// Whether a row tagged with `category` passes the filter.
    pub fn matches(&self, category: Option<CategoryId>) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Uncategorized => category.is_none(),
            CategoryFilter::Category(id) => category == Some(*id),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "all"),
            CategoryFilter::Uncategorized => write!(f, "none"),
            CategoryFilter::Category(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(CategoryFilter::All),
            "none" | "uncategorized" => Ok(CategoryFilter::Uncategorized),
            other => {
                let id: CategoryId = other.parse().map_err(|_| {
                    anyhow!(
                        "Unknown category filter '{}': expected all|none|<category id>",
                        other
                    )
                })?;
                if id == NO_CATEGORY_ID {
                    Ok(CategoryFilter::Uncategorized)
                } else {
                    Ok(CategoryFilter::Category(id))
                }
            }
        }
    }
}

fn nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn task_deserializes_embedded_categories() {
        let raw = r##"{"id":3,"title":"Water plants","due_date":"2024-05-01","done":false,
            "categories":[{"id":7,"title":"Home","color":"#00ff00"}]}"##;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.primary_category().map(|c| c.id), Some(7));
        assert_eq!(task.due_date.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn task_tolerates_missing_or_null_categories() {
        let missing: Task = serde_json::from_str(r#"{"id":1,"title":"a","done":true}"#).unwrap();
        let null: Task =
            serde_json::from_str(r#"{"id":2,"title":"b","due_date":null,"categories":null}"#)
                .unwrap();
        assert!(missing.categories.is_empty());
        assert!(null.categories.is_empty());
        assert!(null.due_date.is_none());
        assert!(!null.done);
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let json = serde_json::to_string(&TaskPatch::done(true)).unwrap();
        assert_eq!(json, r#"{"done":true}"#);

        let json = serde_json::to_string(&CategoryPatch {
            title: None,
            color: Some("#123456".into()),
        })
        .unwrap();
        assert_eq!(json, r##"{"color":"#123456"}"##);
    }

    #[rstest]
    #[case("all", CategoryFilter::All)]
    #[case("none", CategoryFilter::Uncategorized)]
    #[case("0", CategoryFilter::Uncategorized)]
    #[case(" 12 ", CategoryFilter::Category(12))]
    fn category_filter_parses(#[case] input: &str, #[case] expected: CategoryFilter) {
        assert_eq!(input.parse::<CategoryFilter>().unwrap(), expected);
    }

    #[test]
    fn category_filter_rejects_garbage() {
        assert!("groceries".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn category_filter_matches_tags() {
        assert!(CategoryFilter::All.matches(None));
        assert!(CategoryFilter::Uncategorized.matches(None));
        assert!(!CategoryFilter::Uncategorized.matches(Some(3)));
        assert!(CategoryFilter::Category(3).matches(Some(3)));
        assert!(!CategoryFilter::Category(3).matches(None));
    }
}
