use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: u64,
    pub user_id: Option<u64>,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub reason: String,
    /// One of `Pending`, `Approved`, `Rejected`.
    pub status: String,
    #[schema(value_type = String, format = "date-time")]
    pub requested_at: Option<DateTime<Utc>>,
    /// Stamped together with `approval_date` on the Pending -> terminal
    /// transition; cleared (not cascaded) if the approver is deleted.
    pub approved_by: Option<u64>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub approval_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display, strum::EnumString)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// Creation-time invariants: start must not be in the past, end must not be
/// before start. These are the only two server-enforced leave rules.
pub fn validate_leave_dates(
    start_date: NaiveDate,
    end_date: NaiveDate,
    today: NaiveDate,
) -> Result<(), &'static str> {
    if start_date < today {
        return Err("start_date cannot be in the past");
    }
    if end_date < start_date {
        return Err("end_date cannot be before start_date");
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
    fn past_start_rejected() {
        let today = d("2024-06-10");
        assert!(validate_leave_dates(d("2024-06-09"), d("2024-06-12"), today).is_err());
    }

    #[test]
    fn end_before_start_rejected() {
        let today = d("2024-06-10");
        assert!(validate_leave_dates(d("2024-06-12"), d("2024-06-11"), today).is_err());
    }

    #[test]
    fn single_day_today_accepted() {
        let today = d("2024-06-10");
        assert!(validate_leave_dates(today, today, today).is_ok());
    }

    #[test]
    fn future_range_accepted() {
        let today = d("2024-06-10");
        assert!(validate_leave_dates(d("2024-06-10"), d("2024-06-12"), today).is_ok());
    }
}
