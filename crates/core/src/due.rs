//! Due-date classification relative to the local calendar day.

use std::fmt;

use chrono::{DateTime, Local, NaiveDate};
use clap::ValueEnum;

/// Tasks due within this many days (inclusive) count as "due soon".
pub const DEFAULT_SOON_THRESHOLD_DAYS: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
#[clap(rename_all = "kebab-case")]
pub enum DueStatus {
    PastDue,
    DueToday,
    DueSoon,
    DueLater,
}

impl DueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DueStatus::PastDue => "past-due",
            DueStatus::DueToday => "due-today",
            DueStatus::DueSoon => "due-soon",
            DueStatus::DueLater => "due-later",
        }
    }

    /// Marker class attached to a rendered due date.
    pub fn css_class(&self) -> &'static str {
        match self {
            DueStatus::PastDue => "due-date--past-due",
            DueStatus::DueToday => "due-date--due-today",
            DueStatus::DueSoon => "due-date--due-soon",
            DueStatus::DueLater => "due-date--due-later",
        }
    }
}

impl fmt::Display for DueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a stored due date into a local calendar day.
///
/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps. Blank input is `None`
/// before any parsing happens.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.with_timezone(&Local).date_naive())
}

/// Bucket a calendar day against `today`.
pub fn classify_date(date: NaiveDate, today: NaiveDate, soon_threshold_days: i64) -> DueStatus {
    let day_diff = date.signed_duration_since(today).num_days();
    if day_diff < 0 {
        DueStatus::PastDue
    } else if day_diff == 0 {
        DueStatus::DueToday
    } else if day_diff <= soon_threshold_days {
        DueStatus::DueSoon
    } else {
        DueStatus::DueLater
    }
}

/// Classify a raw due date against an explicit `today`.
///
/// Absent, blank, and unparseable dates get no classification.
pub fn classify_on(
    raw: Option<&str>,
    today: NaiveDate,
    soon_threshold_days: i64,
) -> Option<DueStatus> {
    let date = parse_due_date(raw?)?;
    Some(classify_date(date, today, soon_threshold_days))
}

/// Classify a raw due date against the current local day.
pub fn classify(raw: Option<&str>, soon_threshold_days: i64) -> Option<DueStatus> {
    classify_on(raw, Local::now().date_naive(), soon_threshold_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn offset(days: i64) -> String {
        (today() + Duration::days(days))
            .format("%Y-%m-%d")
            .to_string()
    }

    #[rstest]
    #[case(-400, DueStatus::PastDue)]
    #[case(-1, DueStatus::PastDue)]
    #[case(0, DueStatus::DueToday)]
    #[case(1, DueStatus::DueSoon)]
    #[case(4, DueStatus::DueSoon)]
    #[case(5, DueStatus::DueLater)]
    #[case(90, DueStatus::DueLater)]
    fn buckets_relative_to_today(#[case] days: i64, #[case] expected: DueStatus) {
        let raw = offset(days);
        assert_eq!(
            classify_on(Some(&raw), today(), DEFAULT_SOON_THRESHOLD_DAYS),
            Some(expected)
        );
    }

    #[test]
    fn threshold_is_configurable() {
        let raw = offset(6);
        assert_eq!(classify_on(Some(&raw), today(), 7), Some(DueStatus::DueSoon));
        assert_eq!(classify_on(Some(&raw), today(), 2), Some(DueStatus::DueLater));
        let tomorrow = offset(1);
        assert_eq!(
            classify_on(Some(&tomorrow), today(), 0),
            Some(DueStatus::DueLater)
        );
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    #[case(Some("not a date"))]
    #[case(Some("2024-02-30"))]
    fn absent_or_invalid_dates_are_unclassified(#[case] raw: Option<&str>) {
        assert_eq!(classify_on(raw, today(), DEFAULT_SOON_THRESHOLD_DAYS), None);
    }

    #[test]
    fn timestamps_use_their_calendar_day() {
        let date = parse_due_date("2024-03-12T10:00:00+00:00").unwrap();
        let local = DateTime::parse_from_rfc3339("2024-03-12T10:00:00+00:00")
            .unwrap()
            .with_timezone(&Local)
            .date_naive();
        assert_eq!(date, local);
    }

    #[test]
    fn status_classes_are_distinct() {
        assert_eq!(DueStatus::PastDue.css_class(), "due-date--past-due");
        assert_eq!(DueStatus::DueLater.to_string(), "due-later");
    }
}
