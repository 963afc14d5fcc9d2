use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::holiday::PublicHoliday;
use crate::policy;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateHoliday {
    #[schema(example = "2026-12-25", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Christmas Day")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateHoliday {
    #[schema(format = "date", value_type = String, nullable = true)]
    pub date: Option<NaiveDate>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Reference data visible to every authenticated user, ordered by date.
#[utoipa::path(
    get,
    path = "/api/v1/holidays",
    responses(
        (status = 200, description = "Holiday list", body = [PublicHoliday]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn holiday_list(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let holidays = sqlx::query_as::<_, PublicHoliday>(
        "SELECT id, date, name, description FROM public_holidays ORDER BY date",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch holidays");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(holidays))
}

#[utoipa::path(
    post,
    path = "/api/v1/holidays",
    request_body = CreateHoliday,
    responses(
        (status = 201, description = "Holiday created"),
        (status = 303, description = "Admin only"),
        (status = 409, description = "A holiday on that date already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn holiday_create(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateHoliday>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_manage_holidays(&actor) {
        return Err(policy::deny_to(&config.list_path("holidays")));
    }

    let result =
        sqlx::query("INSERT INTO public_holidays (date, name, description) VALUES (?, ?, ?)")
            .bind(payload.date)
            .bind(&payload.name)
            .bind(&payload.description)
            .execute(pool.get_ref())
            .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(serde_json::json!({
            "message": "Holiday created"
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(serde_json::json!({
                        "message": "A holiday on that date already exists"
                    })));
                }
            }
            error!(error = %e, "Failed to create holiday");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/holidays/{id}",
    params(("id", Path, description = "Holiday ID")),
    request_body = UpdateHoliday,
    responses(
        (status = 200, description = "Holiday updated"),
        (status = 303, description = "Admin only"),
        (status = 404, description = "Holiday not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn holiday_update(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<UpdateHoliday>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_manage_holidays(&actor) {
        return Err(policy::deny_to(&config.list_path("holidays")));
    }

    let id = path.into_inner();
    let result = sqlx::query(
        r#"
        UPDATE public_holidays
        SET date = COALESCE(?, date),
            name = COALESCE(?, name),
            description = COALESCE(?, description)
        WHERE id = ?
        "#,
    )
    .bind(payload.date)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to update holiday");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Holiday not found"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Holiday updated"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/holidays/{id}",
    params(("id", Path, description = "Holiday ID")),
    responses(
        (status = 200, description = "Holiday deleted"),
        (status = 303, description = "Admin only"),
        (status = 404, description = "Holiday not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Holidays"
)]
pub async fn holiday_delete(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_manage_holidays(&actor) {
        return Err(policy::deny_to(&config.list_path("holidays")));
    }

    let id = path.into_inner();
    let result = sqlx::query("DELETE FROM public_holidays WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete holiday");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Holiday not found"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Holiday deleted"
    })))
}
