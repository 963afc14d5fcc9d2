use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Project {
    pub id: u64,
    /// Unique.
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub end_date: Option<NaiveDate>,
}

pub fn validate_project_dates(
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> Result<(), &'static str> {
    if let Some(end) = end_date {
        if end < start_date {
            return Err("end_date cannot be before start_date");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_ended_project_is_valid() {
        assert!(validate_project_dates("2024-01-01".parse().unwrap(), None).is_ok());
    }

    #[test]
    fn inverted_range_rejected() {
        assert!(
            validate_project_dates(
                "2024-06-01".parse().unwrap(),
                Some("2024-05-01".parse().unwrap())
            )
            .is_err()
        );
    }
}
