use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::task::{Task, TaskStatus, validate_task_deadline};
use crate::policy::{self, Bind};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateTask {
    pub project_id: u64,
    pub assigned_to: Option<u64>,
    #[schema(example = "Draft the migration plan")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "To-Do")]
    pub status: Option<TaskStatus>,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub deadline: Option<NaiveDate>,
    #[schema(example = 1)]
    pub priority: Option<i32>,
    pub comments: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTask {
    /// Changing the project requires Manager/Admin.
    pub project_id: Option<u64>,
    /// Changing the assignee requires Manager/Admin; an explicit null
    /// clears the assignment.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = u64, nullable = true)]
    pub assigned_to: Option<Option<u64>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub deadline: Option<NaiveDate>,
    pub priority: Option<i32>,
    pub comments: Option<String>,
}

fn double_option<'de, D>(de: D) -> Result<Option<Option<u64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct TaskQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Filter by project
    pub project_id: Option<u64>,
    /// Filter by status
    pub status: Option<String>,
}

#[derive(serde::Serialize, ToSchema)]
pub struct TaskListResponse {
    pub data: Vec<Task>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Manager/Admin see every task; employees only what is assigned to them.
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    params(TaskQuery),
    responses(
        (status = 200, description = "Paginated task list", body = TaskListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn task_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TaskQuery>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    let scope = policy::task_scope(&actor);

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    scope.push_onto(&mut where_sql);

    let mut extra: Vec<Bind> = Vec::new();
    if let Some(project_id) = query.project_id {
        where_sql.push_str(" AND project_id = ?");
        extra.push(Bind::U64(project_id));
    }
    if let Some(status) = &query.status {
        where_sql.push_str(" AND status = ?");
        extra.push(Bind::Str(status.clone()));
    }

    let binds: Vec<&Bind> = scope.binds.iter().chain(extra.iter()).collect();

    let count_sql = format!("SELECT COUNT(*) FROM tasks{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &binds {
        count_q = match b {
            Bind::U64(v) => count_q.bind(*v),
            Bind::Str(s) => count_q.bind(s.clone()),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count tasks");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, project_id, assigned_to, title, description, status,
               deadline, priority, comments, created_at, updated_at
        FROM tasks
        {}
        ORDER BY deadline IS NULL, deadline, priority DESC, title
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Task>(&data_sql);
    for b in &binds {
        data_q = match b {
            Bind::U64(v) => data_q.bind(*v),
            Bind::Str(s) => data_q.bind(s.clone()),
        };
    }

    let tasks = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch tasks");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(TaskListResponse {
        data: tasks,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(("id", Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task found", body = Task),
        (status = 303, description = "Not assigned to the caller"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn task_get(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    let id = path.into_inner();

    let task = fetch_task(pool.get_ref(), id).await?;
    let Some(task) = task else {
        return Ok(not_found());
    };

    if !policy::can_view_task(&actor, task.assigned_to) {
        return Err(policy::deny_to(&config.list_path("tasks")));
    }

    Ok(HttpResponse::Ok().json(task))
}

#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = CreateTask,
    responses(
        (status = 201, description = "Task created"),
        (status = 303, description = "Manager/Admin only"),
        (status = 400, description = "Unknown project or deadline past project end")
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn task_create(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateTask>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_create_task(&actor) {
        return Err(policy::deny_to(&config.list_path("tasks")));
    }

    let Some(project_end) = project_end_date(pool.get_ref(), payload.project_id).await? else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Unknown project"
        })));
    };

    if let Err(msg) = validate_task_deadline(payload.deadline, project_end) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": msg })));
    }

    let status = payload.status.unwrap_or(TaskStatus::ToDo);

    sqlx::query(
        r#"
        INSERT INTO tasks
            (project_id, assigned_to, title, description, status, deadline, priority, comments)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.project_id)
    .bind(payload.assigned_to)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(status.to_string())
    .bind(payload.deadline)
    .bind(payload.priority.unwrap_or(0))
    .bind(&payload.comments)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create task");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Task created"
    })))
}

/// Edit rules: Manager/Admin are unrestricted; the assignee may edit
/// everything except `assigned_to` and `project_id`. Submitting the current
/// values counts as no change and is allowed.
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    params(("id", Path, description = "Task ID")),
    request_body = UpdateTask,
    responses(
        (status = 200, description = "Task updated"),
        (status = 303, description = "Caller may not edit this task or these fields"),
        (status = 400, description = "Unknown project or deadline past project end"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn task_update(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<UpdateTask>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    let id = path.into_inner();

    let task = fetch_task(pool.get_ref(), id).await?;
    let Some(task) = task else {
        return Ok(not_found());
    };

    if !policy::can_edit_task(&actor, task.assigned_to) {
        return Err(policy::deny_to(&config.list_path("tasks")));
    }

    let project_id = payload.project_id.unwrap_or(task.project_id);
    let assigned_to = match payload.assigned_to {
        Some(value) => value,
        None => task.assigned_to,
    };

    let reassigns = project_id != task.project_id || assigned_to != task.assigned_to;
    if reassigns && !policy::can_reassign_task(&actor) {
        return Err(policy::deny_to(&config.list_path("tasks")));
    }

    let Some(project_end) = project_end_date(pool.get_ref(), project_id).await? else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Unknown project"
        })));
    };

    let deadline = payload.deadline.or(task.deadline);
    if let Err(msg) = validate_task_deadline(deadline, project_end) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": msg })));
    }

    sqlx::query(
        r#"
        UPDATE tasks
        SET project_id = ?,
            assigned_to = ?,
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            status = COALESCE(?, status),
            deadline = ?,
            priority = COALESCE(?, priority),
            comments = COALESCE(?, comments)
        WHERE id = ?
        "#,
    )
    .bind(project_id)
    .bind(assigned_to)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.status.map(|s| s.to_string()))
    .bind(deadline)
    .bind(payload.priority)
    .bind(&payload.comments)
    .bind(id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to update task");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Task updated"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(("id", Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted"),
        (status = 303, description = "Admin only"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn task_delete(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_delete_task(&actor) {
        return Err(policy::deny_to(&config.list_path("tasks")));
    }

    let id = path.into_inner();
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete task");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(not_found());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Task deleted"
    })))
}

async fn fetch_task(pool: &MySqlPool, id: u64) -> actix_web::Result<Option<Task>> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT id, project_id, assigned_to, title, description, status,
               deadline, priority, comments, created_at, updated_at
        FROM tasks
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to fetch task");
        actix_web::error::ErrorInternalServerError("Internal Server Error").into()
    })
}

/// `None` when the project does not exist; `Some(end_date)` otherwise.
async fn project_end_date(
    pool: &MySqlPool,
    project_id: u64,
) -> actix_web::Result<Option<Option<NaiveDate>>> {
    sqlx::query_scalar::<_, Option<NaiveDate>>("SELECT end_date FROM projects WHERE id = ?")
        .bind(project_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            error!(error = %e, project_id, "Failed to fetch project end date");
            actix_web::error::ErrorInternalServerError("Internal Server Error").into()
        })
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "message": "Task not found"
    }))
}
