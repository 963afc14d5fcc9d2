use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::attendance::{Attendance, working_hours};
use crate::policy::{self, Bind};
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

/// Clock-in endpoint. One row per (user, day); a second clock-in before a
/// clock-out is a no-op, as is any clock action after the day is closed.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/clock-in",
    responses(
        (status = 200, description = "Clocked in, or already clocked in (no-op)", body = Object, example = json!({
            "message": "Clocked in"
        })),
        (status = 303, description = "Employees only"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_clock(&actor) {
        return Err(policy::deny_to(&config.list_path("attendance")));
    }

    let today = Utc::now().date_naive();
    let now = Utc::now().naive_utc();

    ensure_today_row(pool.get_ref(), actor.user_id, today).await?;

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET clock_in = ?
        WHERE user_id = ? AND date = ? AND clock_in IS NULL
        "#,
    )
    .bind(now)
    .bind(actor.user_id)
    .bind(today)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, user_id = actor.user_id, "Clock-in failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Already clocked in today"
        })));
    }

    recompute_hours(pool.get_ref(), actor.user_id, today).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Clocked in"
    })))
}

/// Clock-out endpoint. A clock-out with no open clock-in is a no-op.
#[utoipa::path(
    put,
    path = "/api/v1/attendance/clock-out",
    responses(
        (status = 200, description = "Clocked out, or nothing to close (no-op)", body = Object, example = json!({
            "message": "Clocked out"
        })),
        (status = 303, description = "Employees only"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_clock(&actor) {
        return Err(policy::deny_to(&config.list_path("attendance")));
    }

    let today = Utc::now().date_naive();
    let now = Utc::now().naive_utc();

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET clock_out = ?
        WHERE user_id = ? AND date = ?
        AND clock_in IS NOT NULL
        AND clock_out IS NULL
        "#,
    )
    .bind(now)
    .bind(actor.user_id)
    .bind(today)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, user_id = actor.user_id, "Clock-out failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "No open clock-in today"
        })));
    }

    recompute_hours(pool.get_ref(), actor.user_id, today).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Clocked out"
    })))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Filter by user (effective for Manager/Admin only; employees are
    /// always scoped to themselves)
    pub user_id: Option<u64>,
}

#[derive(serde::Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<Attendance>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Attendance history; Manager/Admin see everyone, employees themselves.
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance history", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    let scope = policy::attendance_scope(&actor);

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    scope.push_onto(&mut where_sql);

    let mut extra: Vec<Bind> = Vec::new();
    if actor.is_manager_or_admin() {
        if let Some(user_id) = query.user_id {
            where_sql.push_str(" AND user_id = ?");
            extra.push(Bind::U64(user_id));
        }
    }

    let binds: Vec<&Bind> = scope.binds.iter().chain(extra.iter()).collect();

    let count_sql = format!("SELECT COUNT(*) FROM attendance{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &binds {
        count_q = match b {
            Bind::U64(v) => count_q.bind(*v),
            Bind::Str(s) => count_q.bind(s.clone()),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, user_id, date, clock_in, clock_out, working_hours
        FROM attendance
        {}
        ORDER BY date DESC, id
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Attendance>(&data_sql);
    for b in &binds {
        data_q = match b {
            Bind::U64(v) => data_q.bind(*v),
            Bind::Str(s) => data_q.bind(s.clone()),
        };
    }

    let rows = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch attendance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: rows,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/attendance/{id}",
    params(("id", Path, description = "Attendance ID")),
    responses(
        (status = 200, description = "Attendance record", body = Attendance),
        (status = 303, description = "Not the caller's record"),
        (status = 404, description = "Attendance record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_get(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    let id = path.into_inner();

    let row = sqlx::query_as::<_, Attendance>(
        "SELECT id, user_id, date, clock_in, clock_out, working_hours FROM attendance WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to fetch attendance record");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(row) = row else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Attendance record not found"
        })));
    };

    if !policy::can_view_attendance(&actor, row.user_id) {
        return Err(policy::deny_to(&config.list_path("attendance")));
    }

    Ok(HttpResponse::Ok().json(row))
}

#[derive(Deserialize, ToSchema)]
pub struct EditAttendance {
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub clock_in: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub clock_out: Option<NaiveDateTime>,
}

/// Direct timestamp correction for Manager/Admin. Hours are recomputed on
/// this path too, so the derived field can never drift.
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{id}",
    params(("id", Path, description = "Attendance ID")),
    request_body = EditAttendance,
    responses(
        (status = 200, description = "Attendance updated"),
        (status = 303, description = "Manager/Admin only"),
        (status = 400, description = "clock_out not after clock_in"),
        (status = 404, description = "Attendance record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_edit(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<EditAttendance>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_edit_attendance(&actor) {
        return Err(policy::deny_to(&config.list_path("attendance")));
    }

    if let (Some(ci), Some(co)) = (payload.clock_in, payload.clock_out) {
        if co <= ci {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "clock_out must be after clock_in"
            })));
        }
    }

    let id = path.into_inner();
    let hours = working_hours(payload.clock_in, payload.clock_out);

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET clock_in = ?, clock_out = ?, working_hours = ?
        WHERE id = ?
        "#,
    )
    .bind(payload.clock_in)
    .bind(payload.clock_out)
    .bind(hours)
    .bind(id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to edit attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Attendance record not found"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance updated"
    })))
}

/// Get-or-create for today; the unique key on (user_id, date) absorbs races
/// between simultaneous clock-ins.
async fn ensure_today_row(
    pool: &MySqlPool,
    user_id: u64,
    today: NaiveDate,
) -> actix_web::Result<()> {
    sqlx::query("INSERT IGNORE INTO attendance (user_id, date) VALUES (?, ?)")
        .bind(user_id)
        .bind(today)
        .execute(pool)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to ensure attendance row");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
    Ok(())
}

/// Rereads the timestamps and writes the derived hours back.
async fn recompute_hours(
    pool: &MySqlPool,
    user_id: u64,
    date: NaiveDate,
) -> actix_web::Result<()> {
    let row = sqlx::query_as::<_, (Option<NaiveDateTime>, Option<NaiveDateTime>)>(
        "SELECT clock_in, clock_out FROM attendance WHERE user_id = ? AND date = ?",
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!(error = %e, user_id, "Failed to reread attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some((clock_in, clock_out)) = row else {
        return Ok(());
    };

    sqlx::query("UPDATE attendance SET working_hours = ? WHERE user_id = ? AND date = ?")
        .bind(working_hours(clock_in, clock_out))
        .bind(user_id)
        .bind(date)
        .execute(pool)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to store working hours");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(())
}
