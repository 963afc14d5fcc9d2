use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Document {
    pub id: u64,
    pub uploaded_by: Option<u64>,
    pub title: String,
    /// Stored file name inside the document directory; the record and the
    /// file are deleted together, file first.
    pub file_path: String,
    pub original_name: String,
    pub content_type: Option<String>,
    pub department: String,
    /// One of `public`, `private`.
    pub access_level: String,
    #[schema(value_type = String, format = "date-time")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[strum(serialize = "public")]
    Public,
    #[strum(serialize = "private")]
    Private,
}
