use crate::auth::auth::AuthUser;
use crate::model::employee::EmployeeProfile;
use crate::model::social_profile::SocialProfile;
use crate::model::user::User;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub username: String,
    #[schema(example = "Employee")]
    pub role: String,
    pub department: Option<String>,
    /// Employees: own pending requests. Manager/Admin: requests waiting on
    /// a decision.
    pub pending_leave_requests: i64,
    /// Present only for employees: whether today's row is open, closed or
    /// absent.
    pub attendance_today: Option<String>,
    /// Present only for Manager/Admin.
    pub employee_count: Option<i64>,
}

/// Role-aware landing payload.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Dashboard data", body = DashboardResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let actor = auth
        .actor_with_department(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to load actor department");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let internal = |e: sqlx::Error| {
        error!(error = %e, "Dashboard query failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    };

    let (pending_leave_requests, attendance_today, employee_count) = if actor.is_manager_or_admin()
    {
        let pending = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM leave_requests WHERE status = 'Pending'",
        )
        .fetch_one(pool.get_ref())
        .await
        .map_err(internal)?;

        let employees = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employee_profiles")
            .fetch_one(pool.get_ref())
            .await
            .map_err(internal)?;

        (pending, None, Some(employees))
    } else {
        let pending = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM leave_requests WHERE user_id = ? AND status = 'Pending'",
        )
        .bind(actor.user_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(internal)?;

        let today = Utc::now().date_naive();
        let row = sqlx::query_as::<_, (Option<chrono::NaiveDateTime>, Option<chrono::NaiveDateTime>)>(
            "SELECT clock_in, clock_out FROM attendance WHERE user_id = ? AND date = ?",
        )
        .bind(actor.user_id)
        .bind(today)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(internal)?;

        let state = match row {
            None | Some((None, _)) => "not clocked in",
            Some((Some(_), None)) => "clocked in",
            Some((Some(_), Some(_))) => "clocked out",
        };

        (pending, Some(state.to_string()), None)
    };

    Ok(HttpResponse::Ok().json(DashboardResponse {
        username: auth.username.clone(),
        role: auth.role.as_str().to_string(),
        department: actor.department,
        pending_leave_requests,
        attendance_today,
        employee_count,
    }))
}

#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
    #[schema(example = "Employee")]
    pub role: String,
    pub is_active: bool,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub last_login_at: Option<DateTime<Utc>>,
    pub employee: Option<EmployeeProfile>,
    /// Linked social provider, if the account ever signed in socially.
    pub social_provider: Option<String>,
    pub avatar_url: Option<String>,
}

/// The caller's own account, profile and social link.
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Profile data", body = ProfileResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let internal = |e: sqlx::Error| {
        error!(error = %e, "Profile query failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    };

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password, role_id, is_active, last_login_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(auth.user_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(internal)?;

    let Some(user) = user else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Account not found"
        })));
    };

    let employee = sqlx::query_as::<_, EmployeeProfile>(
        r#"
        SELECT p.user_id, u.username, u.email, u.role_id,
               p.department, p.designation, p.phone, p.join_date, p.status
        FROM employee_profiles p
        JOIN users u ON u.id = p.user_id
        WHERE p.user_id = ?
        "#,
    )
    .bind(auth.user_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(internal)?;

    let social = sqlx::query_as::<_, SocialProfile>(
        r#"
        SELECT id, user_id, provider, provider_id, avatar_url,
               access_token, refresh_token, last_login_at
        FROM social_profiles
        WHERE user_id = ?
        "#,
    )
    .bind(auth.user_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(internal)?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        username: user.username,
        email: user.email,
        role: auth.role.as_str().to_string(),
        is_active: user.is_active,
        last_login_at: user.last_login_at,
        employee,
        social_provider: social.as_ref().map(|s| s.provider.clone()),
        avatar_url: social.and_then(|s| s.avatar_url),
    }))
}
