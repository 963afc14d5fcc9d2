use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Task {
    pub id: u64,
    pub project_id: u64,
    /// Severed (set to NULL), never cascaded, when the user is deleted.
    pub assigned_to: Option<u64>,
    pub title: String,
    pub description: Option<String>,
    /// One of `To-Do`, `In Progress`, `Done`.
    pub status: String,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub deadline: Option<NaiveDate>,
    /// Higher number means higher priority.
    pub priority: i32,
    pub comments: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display, strum::EnumString)]
pub enum TaskStatus {
    #[serde(rename = "To-Do")]
    #[strum(serialize = "To-Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    #[strum(serialize = "In Progress")]
    InProgress,
    Done,
}

/// The deadline check applies only when both dates are present.
pub fn validate_task_deadline(
    deadline: Option<NaiveDate>,
    project_end: Option<NaiveDate>,
) -> Result<(), &'static str> {
    if let (Some(deadline), Some(end)) = (deadline, project_end) {
        if deadline > end {
            return Err("task deadline cannot be after the project's end date");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn deadline_within_project_accepted() {
        assert!(validate_task_deadline(Some(d("2024-06-10")), Some(d("2024-06-30"))).is_ok());
        assert!(validate_task_deadline(Some(d("2024-06-30")), Some(d("2024-06-30"))).is_ok());
    }

    #[test]
    fn deadline_past_project_end_rejected() {
        assert!(validate_task_deadline(Some(d("2024-07-01")), Some(d("2024-06-30"))).is_err());
    }

    #[test]
    fn missing_dates_skip_the_check() {
        assert!(validate_task_deadline(None, Some(d("2024-06-30"))).is_ok());
        assert!(validate_task_deadline(Some(d("2024-07-01")), None).is_ok());
    }

    #[test]
    fn status_strings() {
        assert_eq!(TaskStatus::ToDo.to_string(), "To-Do");
        assert_eq!(TaskStatus::InProgress.to_string(), "In Progress");
        assert_eq!("Done".parse::<TaskStatus>().unwrap(), TaskStatus::Done);
    }
}
