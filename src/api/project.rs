use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::project::{Project, validate_project_dates};
use crate::policy;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateProject {
    #[schema(example = "Website relaunch")]
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ProjectQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(serde::Serialize, ToSchema)]
pub struct ProjectListResponse {
    pub data: Vec<Project>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Project administration is a Manager/Admin surface; employees interact
/// with projects only through their assigned tasks.
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    params(ProjectQuery),
    responses(
        (status = 200, description = "Paginated project list", body = ProjectListResponse),
        (status = 303, description = "Manager/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn project_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<ProjectQuery>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_view_projects(&actor) {
        return Err(policy::deny_to(&config.list_path("dashboard")));
    }

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to count projects");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let projects = sqlx::query_as::<_, Project>(
        r#"
        SELECT id, name, description, start_date, end_date
        FROM projects
        ORDER BY name
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(per_page as i64)
    .bind(offset as i64)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch projects");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(ProjectListResponse {
        data: projects,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/projects",
    request_body = CreateProject,
    responses(
        (status = 201, description = "Project created"),
        (status = 303, description = "Manager/Admin only"),
        (status = 400, description = "Invalid date range"),
        (status = 409, description = "Project name already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn project_create(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateProject>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_manage_projects(&actor) {
        return Err(policy::deny_to(&config.list_path("dashboard")));
    }

    if let Err(msg) = validate_project_dates(payload.start_date, payload.end_date) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": msg })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO projects (name, description, start_date, end_date)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(serde_json::json!({
            "message": "Project created"
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(serde_json::json!({
                        "message": "Project name already exists"
                    })));
                }
            }
            error!(error = %e, "Failed to create project");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}",
    params(("id", Path, description = "Project ID")),
    request_body = UpdateProject,
    responses(
        (status = 200, description = "Project updated"),
        (status = 303, description = "Manager/Admin only"),
        (status = 400, description = "Invalid date range"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn project_update(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<UpdateProject>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_manage_projects(&actor) {
        return Err(policy::deny_to(&config.list_path("dashboard")));
    }

    let id = path.into_inner();
    let project = sqlx::query_as::<_, Project>(
        "SELECT id, name, description, start_date, end_date FROM projects WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to fetch project");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(project) = project else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Project not found"
        })));
    };

    let start = payload.start_date.unwrap_or(project.start_date);
    let end = payload.end_date.or(project.end_date);
    if let Err(msg) = validate_project_dates(start, end) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": msg })));
    }

    sqlx::query(
        r#"
        UPDATE projects
        SET name = COALESCE(?, name),
            description = COALESCE(?, description),
            start_date = ?,
            end_date = ?
        WHERE id = ?
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(start)
    .bind(end)
    .bind(id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to update project");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Project updated"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    params(("id", Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project deleted"),
        (status = 303, description = "Admin only"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn project_delete(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_delete_project(&actor) {
        return Err(policy::deny_to(&config.list_path("dashboard")));
    }

    let id = path.into_inner();
    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete project");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Project not found"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Project deleted"
    })))
}
