use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    pub serial_number: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub purchase_date: Option<NaiveDate>,
    /// Severed (set to NULL), never cascaded, when the user is deleted.
    pub assigned_to: Option<u64>,
    /// One of `in-use`, `maintenance`, `retired`, `available`.
    pub status: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    #[serde(rename = "in-use")]
    #[strum(serialize = "in-use")]
    InUse,
    #[strum(serialize = "maintenance")]
    Maintenance,
    #[strum(serialize = "retired")]
    Retired,
    #[strum(serialize = "available")]
    Available,
}
