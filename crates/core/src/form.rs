use chrono::{Datelike, Days, Duration, Months, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::model::{CategoryId, CategoryPatch, NewCategory, NewTask};

pub const DEFAULT_CATEGORY_COLOR: &str = "#ff0000";

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{6}|[0-9a-fA-F]{3})$").expect("valid color pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Task cannot be empty")]
    EmptyTitle,
    #[error("Category cannot be empty")]
    EmptyCategoryTitle,
    #[error("Please pick a due date")]
    MissingDueDate,
    #[error("Unrecognized due date '{0}'. Try YYYY-MM-DD, today, tomorrow, +3d, mon")]
    InvalidDueDate(String),
    #[error("Due date {0} is already in the past")]
    DueDateInPast(NaiveDate),
    #[error("Color '{0}' must be a hex value such as #ff0000")]
    InvalidColor(String),
    #[error("Unknown category {0}")]
    UnknownCategory(CategoryId),
}

/// Values typed into the new-task form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub due_date: String,
    pub category: Option<CategoryId>,
}

impl TaskForm {
    pub fn new<T: Into<String>>(title: T) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Check the form and build the payload for the backend.
    ///
    /// Blank titles, unrecognized dates and dates before `today` are
    /// rejected; a blank date is rejected only when `require_due_date` is set.
    pub fn validate(
        &self,
        today: NaiveDate,
        require_due_date: bool,
    ) -> Result<NewTask, ValidationError> {
        let title = validate_title(&self.title)?;
        let due_date = match self.due_date.trim() {
            "" if require_due_date => return Err(ValidationError::MissingDueDate),
            "" => None,
            raw => {
                let date = parse_due_input(raw, today)?;
                if date < today {
                    return Err(ValidationError::DueDateInPast(date));
                }
                Some(date.format("%Y-%m-%d").to_string())
            }
        };
        Ok(NewTask {
            title,
            due_date,
            done: false,
        })
    }
}

pub fn validate_title(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Values typed into the category form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryForm {
    pub title: String,
    pub color: String,
}

impl Default for CategoryForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            color: DEFAULT_CATEGORY_COLOR.to_string(),
        }
    }
}

impl CategoryForm {
    pub fn validate(&self) -> Result<NewCategory, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyCategoryTitle);
        }
        Ok(NewCategory {
            title: title.to_string(),
            color: normalize_color(&self.color)?,
        })
    }

    /// Like [`validate`](Self::validate) but blank fields are left unchanged.
    pub fn validate_patch(&self) -> Result<CategoryPatch, ValidationError> {
        let title = Some(self.title.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let color = match self.color.trim() {
            "" => None,
            raw => Some(normalize_color(raw)?),
        };
        if title.is_none() && color.is_none() {
            return Err(ValidationError::EmptyCategoryTitle);
        }
        Ok(CategoryPatch { title, color })
    }
}

pub fn normalize_color(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let candidate = if trimmed.starts_with('#') {
        trimmed.to_string()
    } else {
        format!("#{}", trimmed)
    };
    if !HEX_COLOR.is_match(&candidate) {
        return Err(ValidationError::InvalidColor(raw.to_string()));
    }
    Ok(candidate.to_ascii_lowercase())
}

/// Parse due-date input: `YYYY-MM-DD`, `today`, `tomorrow`, `+3d`, `+2w`,
/// `+1m`, or a weekday name (next occurrence, never today).
pub fn parse_due_input(input: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();
    let invalid = || ValidationError::InvalidDueDate(trimmed.to_string());
    let lower = trimmed.to_ascii_lowercase();

    match lower.as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        _ => {}
    }

    if let Some(offset) = lower.strip_prefix('+') {
        return parse_relative(offset, today).ok_or_else(invalid);
    }

    if let Some(weekday) = parse_weekday(&lower) {
        let mut days_ahead = (weekday.num_days_from_monday() as i64
            - today.weekday().num_days_from_monday() as i64)
            .rem_euclid(7);
        if days_ahead == 0 {
            days_ahead = 7;
        }
        return Ok(today + Duration::days(days_ahead));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| invalid())
}

fn parse_relative(offset: &str, today: NaiveDate) -> Option<NaiveDate> {
    let (split, unit) = offset.char_indices().last()?;
    let value: u32 = offset[..split].parse().ok()?;
    match unit {
        'd' => today.checked_add_days(Days::new(value.into())),
        'w' => today.checked_add_days(Days::new(u64::from(value) * 7)),
        'm' => today.checked_add_months(Months::new(value)),
        _ => None,
    }
}

fn parse_weekday(label: &str) -> Option<Weekday> {
    match label {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    // A Sunday.
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn blank_titles_are_rejected(#[case] title: &str) {
        let form = TaskForm::new(title);
        assert_eq!(form.validate(today(), false), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn title_is_trimmed_and_date_optional() {
        let form = TaskForm::new("  Buy milk ");
        let task = form.validate(today(), false).unwrap();
        assert_eq!(
            task,
            NewTask {
                title: "Buy milk".into(),
                due_date: None,
                done: false,
            }
        );
        assert_eq!(
            form.validate(today(), true),
            Err(ValidationError::MissingDueDate)
        );
    }

    #[test]
    fn past_due_dates_are_rejected() {
        let mut form = TaskForm::new("Late");
        form.due_date = "2024-03-09".into();
        assert_eq!(
            form.validate(today(), false),
            Err(ValidationError::DueDateInPast(date(2024, 3, 9)))
        );
        form.due_date = "today".into();
        assert_eq!(
            form.validate(today(), false).unwrap().due_date.as_deref(),
            Some("2024-03-10")
        );
    }

    #[test]
    fn out_of_range_offset_is_a_validation_error() {
        let mut form = TaskForm::new("Someday");
        form.due_date = "+99999999w".into();
        assert_eq!(
            form.validate(today(), false),
            Err(ValidationError::InvalidDueDate("+99999999w".into()))
        );
    }

    #[rstest]
    #[case("2024-04-01", date(2024, 4, 1))]
    #[case("tomorrow", date(2024, 3, 11))]
    #[case("+3d", date(2024, 3, 13))]
    #[case("+2w", date(2024, 3, 24))]
    #[case("+1m", date(2024, 4, 10))]
    #[case("mon", date(2024, 3, 11))]
    #[case("Sunday", date(2024, 3, 17))]
    fn due_input_forms(#[case] input: &str, #[case] expected: NaiveDate) {
        assert_eq!(parse_due_input(input, today()).unwrap(), expected);
    }

    #[rstest]
    #[case("soon")]
    #[case("+d")]
    #[case("+3y")]
    #[case("2024-13-01")]
    #[case("+3é")]
    #[case("+é")]
    #[case("+4000000000d")]
    #[case("+99999999w")]
    #[case("+4000000000m")]
    fn unrecognized_due_input(#[case] input: &str) {
        assert!(matches!(
            parse_due_input(input, today()),
            Err(ValidationError::InvalidDueDate(_))
        ));
    }

    #[rstest]
    #[case("#FF8800", "#ff8800")]
    #[case("00ff00", "#00ff00")]
    #[case("#abc", "#abc")]
    fn colors_are_normalized(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_color(input).unwrap(), expected);
    }

    #[test]
    fn category_form_requires_title_and_valid_color() {
        let form = CategoryForm {
            title: " ".into(),
            ..CategoryForm::default()
        };
        assert_eq!(form.validate(), Err(ValidationError::EmptyCategoryTitle));

        let form = CategoryForm {
            title: "Work".into(),
            color: "blue".into(),
        };
        assert!(matches!(
            form.validate(),
            Err(ValidationError::InvalidColor(_))
        ));
    }

    #[test]
    fn category_patch_keeps_blank_fields_unchanged() {
        let form = CategoryForm {
            title: "".into(),
            color: "#123456".into(),
        };
        assert_eq!(
            form.validate_patch().unwrap(),
            CategoryPatch {
                title: None,
                color: Some("#123456".into()),
            }
        );

        let empty = CategoryForm {
            title: "".into(),
            color: "".into(),
        };
        assert!(empty.validate_patch().is_err());
    }
}
