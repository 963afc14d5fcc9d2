use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Link between a local account and an external identity provider.
/// One row per user, upserted on every social login.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct SocialProfile {
    pub id: u64,
    pub user_id: u64,
    pub provider: String,
    pub provider_id: String,
    pub avatar_url: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
}
