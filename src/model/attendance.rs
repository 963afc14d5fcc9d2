use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One row per (user, date), enforced by a unique key. `working_hours` is
/// derived from the two timestamps on every save path and never written
/// independently.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub user_id: Option<u64>,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub clock_in: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub clock_out: Option<NaiveDateTime>,
    #[schema(example = 7.5, nullable = true)]
    pub working_hours: Option<f64>,
}

/// round((clock_out - clock_in) / 3600, 2) when both timestamps are present,
/// otherwise None.
pub fn working_hours(
    clock_in: Option<NaiveDateTime>,
    clock_out: Option<NaiveDateTime>,
) -> Option<f64> {
    let (ci, co) = (clock_in?, clock_out?);
    let secs = (co - ci).num_seconds() as f64;
    Some((secs / 3600.0 * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(d: &str, t: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .unwrap()
            .and_time(t.parse().unwrap())
    }

    #[test]
    fn full_day() {
        let hours = working_hours(
            Some(dt("2024-06-10", "09:00:00")),
            Some(dt("2024-06-10", "17:30:00")),
        );
        assert_eq!(hours, Some(8.5));
    }

    #[test]
    fn sub_minute_span() {
        let hours = working_hours(
            Some(dt("2024-06-10", "09:00:00")),
            Some(dt("2024-06-10", "09:00:36")),
        );
        assert_eq!(hours, Some(0.01));
    }

    #[test]
    fn multi_day_span() {
        let hours = working_hours(
            Some(dt("2024-06-10", "22:00:00")),
            Some(dt("2024-06-12", "10:00:00")),
        );
        assert_eq!(hours, Some(36.0));
    }

    #[test]
    fn open_or_empty_record_has_no_hours() {
        assert_eq!(working_hours(Some(dt("2024-06-10", "09:00:00")), None), None);
        assert_eq!(working_hours(None, Some(dt("2024-06-10", "17:00:00"))), None);
        assert_eq!(working_hours(None, None), None);
    }
}
