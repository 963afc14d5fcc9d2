use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Announcement {
    pub id: u64,
    pub created_by: Option<u64>,
    pub title: String,
    pub content: String,
    /// One of `all`, `manager`, `employee`.
    pub visible_to: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[strum(serialize = "all")]
    All,
    #[strum(serialize = "manager")]
    Manager,
    #[strum(serialize = "employee")]
    Employee,
}
