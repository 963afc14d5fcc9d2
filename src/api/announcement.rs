use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::announcement::{Announcement, Visibility};
use crate::policy::{self, Bind};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateAnnouncement {
    #[schema(example = "Office closed on Friday")]
    pub title: String,
    pub content: String,
    #[schema(example = "all")]
    pub visible_to: Visibility,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateAnnouncement {
    pub title: Option<String>,
    pub content: Option<String>,
    pub visible_to: Option<Visibility>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AnnouncementQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(serde::Serialize, ToSchema)]
pub struct AnnouncementListResponse {
    pub data: Vec<Announcement>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// List announcements visible to the caller's role, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/announcements",
    params(AnnouncementQuery),
    responses(
        (status = 200, description = "Paginated announcement list", body = AnnouncementListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
pub async fn announcement_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AnnouncementQuery>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    let scope = policy::announcement_scope(&actor);

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    scope.push_onto(&mut where_sql);

    let count_sql = format!("SELECT COUNT(*) FROM announcements{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &scope.binds {
        count_q = match b {
            Bind::U64(v) => count_q.bind(*v),
            Bind::Str(s) => count_q.bind(s.clone()),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count announcements");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, created_by, title, content, visible_to, created_at, updated_at
        FROM announcements
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Announcement>(&data_sql);
    for b in &scope.binds {
        data_q = match b {
            Bind::U64(v) => data_q.bind(*v),
            Bind::Str(s) => data_q.bind(s.clone()),
        };
    }

    let announcements = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch announcements");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(AnnouncementListResponse {
        data: announcements,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/announcements/{id}",
    params(("id", Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement found", body = Announcement),
        (status = 303, description = "Not visible to this role"),
        (status = 404, description = "Announcement not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
pub async fn announcement_get(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    let id = path.into_inner();

    let announcement = fetch_announcement(pool.get_ref(), id).await?;
    let Some(announcement) = announcement else {
        return Ok(not_found());
    };

    if !policy::can_view_announcement(&actor, &announcement.visible_to) {
        return Err(policy::deny_to(&config.list_path("announcements")));
    }

    Ok(HttpResponse::Ok().json(announcement))
}

#[utoipa::path(
    post,
    path = "/api/v1/announcements",
    request_body = CreateAnnouncement,
    responses(
        (status = 201, description = "Announcement created"),
        (status = 303, description = "Caller may not create announcements")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
pub async fn announcement_create(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateAnnouncement>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_create_announcement(&actor) {
        return Err(policy::deny_to(&config.list_path("announcements")));
    }

    sqlx::query(
        r#"
        INSERT INTO announcements (created_by, title, content, visible_to)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(actor.user_id)
    .bind(&payload.title)
    .bind(&payload.content)
    .bind(payload.visible_to.to_string())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create announcement");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Announcement created"
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/announcements/{id}",
    params(("id", Path, description = "Announcement ID")),
    request_body = UpdateAnnouncement,
    responses(
        (status = 200, description = "Announcement updated"),
        (status = 303, description = "Caller is not the creator or an Admin"),
        (status = 404, description = "Announcement not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
pub async fn announcement_update(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAnnouncement>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    let id = path.into_inner();

    let announcement = fetch_announcement(pool.get_ref(), id).await?;
    let Some(announcement) = announcement else {
        return Ok(not_found());
    };

    if !policy::can_edit_announcement(&actor, announcement.created_by) {
        return Err(policy::deny_to(&config.list_path("announcements")));
    }

    sqlx::query(
        r#"
        UPDATE announcements
        SET title = COALESCE(?, title),
            content = COALESCE(?, content),
            visible_to = COALESCE(?, visible_to)
        WHERE id = ?
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.content)
    .bind(payload.visible_to.map(|v| v.to_string()))
    .bind(id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to update announcement");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Announcement updated"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/announcements/{id}",
    params(("id", Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement deleted"),
        (status = 303, description = "Admin only"),
        (status = 404, description = "Announcement not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
pub async fn announcement_delete(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_delete_announcement(&actor) {
        return Err(policy::deny_to(&config.list_path("announcements")));
    }

    let id = path.into_inner();
    let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete announcement");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(not_found());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Announcement deleted"
    })))
}

async fn fetch_announcement(
    pool: &MySqlPool,
    id: u64,
) -> actix_web::Result<Option<Announcement>> {
    sqlx::query_as::<_, Announcement>(
        r#"
        SELECT id, created_by, title, content, visible_to, created_at, updated_at
        FROM announcements
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to fetch announcement");
        actix_web::error::ErrorInternalServerError("Internal Server Error").into()
    })
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "message": "Announcement not found"
    }))
}
