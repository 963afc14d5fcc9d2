use crate::auth::auth::AuthUser;
use crate::auth::handlers::is_username_available;
use crate::auth::password::hash_password;
use crate::config::Config;
use crate::model::employee::{EmployeeProfile, ProfileStatus};
use crate::model::role::Role;
use crate::policy;
use crate::utils::db_utils::{build_update_sql, execute_update};
use crate::utils::{username_cache, username_filter};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

/// Profile columns an Admin may patch through the dynamic update path.
const PROFILE_COLUMNS: &[&str] = &["department", "designation", "phone", "join_date", "status"];

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "jdoe@company.com", format = "email")]
    pub email: String,
    pub password: String,
    #[schema(example = "Employee")]
    pub role: Role,
    #[schema(example = "IT")]
    pub department: String,
    #[schema(example = "Backend Engineer")]
    pub designation: String,
    pub phone: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub join_date: NaiveDate,
    pub status: Option<ProfileStatus>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub department: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(serde::Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<EmployeeProfile>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Employee directory for Manager/Admin.
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 303, description = "Manager/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_list_employees(&actor) {
        return Err(policy::deny_to(&config.list_path("dashboard")));
    }

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(department) = &query.department {
        conditions.push("p.department = ?");
        bindings.push(department.clone());
    }

    if let Some(status) = &query.status {
        conditions.push("p.status = ?");
        bindings.push(status.clone());
    }

    if let Some(search) = &query.search {
        conditions.push("(u.username LIKE ? OR u.email LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone());
        bindings.push(like);
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!(
        "SELECT COUNT(*) FROM employee_profiles p JOIN users u ON u.id = p.user_id {}",
        where_clause
    );
    debug!(sql = %count_sql, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count employees");
        actix_web::error::ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        r#"
        SELECT p.user_id, u.username, u.email, u.role_id,
               p.department, p.designation, p.phone, p.join_date, p.status
        FROM employee_profiles p
        JOIN users u ON u.id = p.user_id
        {}
        ORDER BY u.username
        LIMIT ? OFFSET ?
        "#,
        where_clause
    );

    let mut data_query = sqlx::query_as::<_, EmployeeProfile>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch employees");
        actix_web::error::ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Creates the user and its profile in one transaction: both rows persist
/// or neither does.
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created"),
        (status = 303, description = "Admin only"),
        (status = 409, description = "Username or email already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_manage_employees(&actor) {
        return Err(policy::deny_to(&config.list_path("employees")));
    }

    let username = payload.username.trim();
    if username.is_empty() || payload.email.trim().is_empty() || payload.password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "username, email and password must not be empty"
        })));
    }

    if !is_username_available(username, pool.get_ref()).await {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Username already taken"
        })));
    }

    let hashed = hash_password(&payload.password);
    let status = payload.status.unwrap_or(ProfileStatus::Active);

    let mut tx = pool.get_ref().begin().await.map_err(|e| {
        error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"INSERT INTO users (username, email, password, role_id) VALUES (?, ?, ?, ?)"#,
    )
    .bind(username)
    .bind(payload.email.trim())
    .bind(&hashed)
    .bind(payload.role.id())
    .execute(&mut *tx)
    .await;

    let user_id = match result {
        Ok(res) => res.last_insert_id(),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Username or email already exists"
                    })));
                }
            }
            error!(error = %e, "Failed to create user");
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    };

    sqlx::query(
        r#"
        INSERT INTO employee_profiles (user_id, department, designation, phone, join_date, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(payload.department.trim())
    .bind(payload.designation.trim())
    .bind(&payload.phone)
    .bind(payload.join_date)
    .bind(status.to_string())
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create employee profile");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        error!(error = %e, "Failed to commit employee creation");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    username_filter::insert(username);
    username_cache::mark_taken(username).await;

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee created"
    })))
}

/// Get Employee by user ID
#[utoipa::path(
    get,
    path = "/api/v1/employees/{user_id}",
    params(("user_id", Path, description = "User ID")),
    responses(
        (status = 200, description = "Employee found", body = EmployeeProfile),
        (status = 303, description = "Manager/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_list_employees(&actor) {
        return Err(policy::deny_to(&config.list_path("dashboard")));
    }

    let user_id = path.into_inner();

    let employee = sqlx::query_as::<_, EmployeeProfile>(
        r#"
        SELECT p.user_id, u.username, u.email, u.role_id,
               p.department, p.designation, p.phone, p.join_date, p.status
        FROM employee_profiles p
        JOIN users u ON u.id = p.user_id
        WHERE p.user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, user_id, "Failed to fetch employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}

/// Dynamic profile patch plus an optional role change. The `role` key is
/// peeled off for the users table; everything else must be a whitelisted
/// profile column.
#[utoipa::path(
    put,
    path = "/api/v1/employees/{user_id}",
    params(("user_id", Path, description = "User ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated"),
        (status = 303, description = "Admin only"),
        (status = 400, description = "Unknown field"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_manage_employees(&actor) {
        return Err(policy::deny_to(&config.list_path("employees")));
    }

    let user_id = path.into_inner();
    let mut payload = body.into_inner();

    let role = match payload.as_object_mut() {
        Some(obj) => obj.remove("role"),
        None => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Payload must be a JSON object"
            })));
        }
    };

    if let Some(role_value) = role {
        let role: Role = serde_json::from_value(role_value)
            .map_err(|_| actix_web::error::ErrorBadRequest("Invalid role"))?;

        let res = sqlx::query("UPDATE users SET role_id = ? WHERE id = ?")
            .bind(role.id())
            .bind(user_id)
            .execute(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, user_id, "Failed to update role");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

        if res.rows_affected() == 0 {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Employee not found"
            })));
        }
    }

    if payload.as_object().is_some_and(|o| !o.is_empty()) {
        let update = build_update_sql(
            "employee_profiles",
            &payload,
            PROFILE_COLUMNS,
            "user_id",
            user_id,
        )?;

        let affected = execute_update(pool.get_ref(), update)
            .await
            .map_err(actix_web::error::ErrorInternalServerError)?;

        if affected == 0 {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Employee not found"
            })));
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated"
    })))
}

/// Deletes the account while severing, not cascading, every reference from
/// dependent resources, all inside one transaction.
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{user_id}",
    params(("user_id", Path, description = "User ID")),
    responses(
        (status = 200, description = "Employee deleted"),
        (status = 303, description = "Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_manage_employees(&actor) {
        return Err(policy::deny_to(&config.list_path("employees")));
    }

    let user_id = path.into_inner();

    let username = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to fetch user");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(username) = username else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    let mut tx = pool.get_ref().begin().await.map_err(|e| {
        error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let severs = [
        "UPDATE assets SET assigned_to = NULL WHERE assigned_to = ?",
        "UPDATE tasks SET assigned_to = NULL WHERE assigned_to = ?",
        "UPDATE leave_requests SET approved_by = NULL WHERE approved_by = ?",
        "UPDATE leave_requests SET user_id = NULL WHERE user_id = ?",
        "UPDATE documents SET uploaded_by = NULL WHERE uploaded_by = ?",
        "UPDATE announcements SET created_by = NULL WHERE created_by = ?",
        "UPDATE attendance SET user_id = NULL WHERE user_id = ?",
        "DELETE FROM social_profiles WHERE user_id = ?",
        "DELETE FROM refresh_tokens WHERE user_id = ?",
        "DELETE FROM employee_profiles WHERE user_id = ?",
    ];

    for sql in severs {
        sqlx::query(sql)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!(error = %e, user_id, sql, "Failed to sever reference");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
    }

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to delete user");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    tx.commit().await.map_err(|e| {
        error!(error = %e, "Failed to commit employee deletion");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    username_filter::remove(&username);
    username_cache::forget(&username).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted"
    })))
}
