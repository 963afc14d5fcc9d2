use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Joined view of a user and its employee profile, as served by the
/// employee list and detail endpoints.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "user_id": 7,
        "username": "jdoe",
        "email": "jdoe@company.com",
        "role_id": 3,
        "department": "IT",
        "designation": "Backend Engineer",
        "phone": "+8801712345678",
        "join_date": "2024-01-01",
        "status": "active"
    })
)]
pub struct EmployeeProfile {
    #[schema(example = 7)]
    pub user_id: u64,

    #[schema(example = "jdoe")]
    pub username: String,

    #[schema(example = "jdoe@company.com")]
    pub email: String,

    #[schema(example = 3)]
    pub role_id: u8,

    #[schema(example = "IT")]
    pub department: String,

    #[schema(example = "Backend Engineer")]
    pub designation: String,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub join_date: NaiveDate,

    #[schema(example = "active")]
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    #[strum(serialize = "active")]
    Active,
    #[strum(serialize = "inactive")]
    Inactive,
}
