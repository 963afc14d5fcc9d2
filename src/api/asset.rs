use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::asset::{Asset, AssetStatus};
use crate::policy::{self, Bind};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateAsset {
    #[schema(example = "ThinkPad T14")]
    pub name: String,
    #[schema(example = "SN-0042")]
    pub serial_number: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub purchase_date: Option<NaiveDate>,
    pub assigned_to: Option<u64>,
    #[schema(example = "available")]
    pub status: AssetStatus,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateAsset {
    pub name: Option<String>,
    pub serial_number: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub purchase_date: Option<NaiveDate>,
    /// Absent leaves the assignment alone; an explicit null clears it.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = u64, nullable = true)]
    pub assigned_to: Option<Option<u64>>,
    pub status: Option<AssetStatus>,
}

fn double_option<'de, D>(de: D) -> Result<Option<Option<u64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AssetQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Filter by status
    pub status: Option<String>,
}

#[derive(serde::Serialize, ToSchema)]
pub struct AssetListResponse {
    pub data: Vec<Asset>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Employees see only their own assignments and the available pool.
#[utoipa::path(
    get,
    path = "/api/v1/assets",
    params(AssetQuery),
    responses(
        (status = 200, description = "Paginated asset list", body = AssetListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn asset_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AssetQuery>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    let scope = policy::asset_scope(&actor);

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    scope.push_onto(&mut where_sql);

    let mut extra: Vec<Bind> = Vec::new();
    if let Some(status) = &query.status {
        where_sql.push_str(" AND status = ?");
        extra.push(Bind::Str(status.clone()));
    }

    let binds: Vec<&Bind> = scope.binds.iter().chain(extra.iter()).collect();

    let count_sql = format!("SELECT COUNT(*) FROM assets{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &binds {
        count_q = match b {
            Bind::U64(v) => count_q.bind(*v),
            Bind::Str(s) => count_q.bind(s.clone()),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count assets");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, name, serial_number, description, purchase_date,
               assigned_to, status, created_at, updated_at
        FROM assets
        {}
        ORDER BY name
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Asset>(&data_sql);
    for b in &binds {
        data_q = match b {
            Bind::U64(v) => data_q.bind(*v),
            Bind::Str(s) => data_q.bind(s.clone()),
        };
    }

    let assets = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch assets");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(AssetListResponse {
        data: assets,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/assets/{id}",
    params(("id", Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Asset found", body = Asset),
        (status = 303, description = "Not visible to this actor"),
        (status = 404, description = "Asset not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn asset_get(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    let id = path.into_inner();

    let asset = fetch_asset(pool.get_ref(), id).await?;
    let Some(asset) = asset else {
        return Ok(not_found());
    };

    if !policy::can_view_asset(&actor, asset.assigned_to, &asset.status) {
        return Err(policy::deny_to(&config.list_path("assets")));
    }

    Ok(HttpResponse::Ok().json(asset))
}

#[utoipa::path(
    post,
    path = "/api/v1/assets",
    request_body = CreateAsset,
    responses(
        (status = 201, description = "Asset created"),
        (status = 303, description = "Admin only"),
        (status = 409, description = "Duplicate serial number")
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn asset_create(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateAsset>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_manage_assets(&actor) {
        return Err(policy::deny_to(&config.list_path("assets")));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO assets (name, serial_number, description, purchase_date, assigned_to, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.serial_number)
    .bind(&payload.description)
    .bind(payload.purchase_date)
    .bind(payload.assigned_to)
    .bind(payload.status.to_string())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(serde_json::json!({
            "message": "Asset created"
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(serde_json::json!({
                        "message": "Serial number already exists"
                    })));
                }
            }
            error!(error = %e, "Failed to create asset");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/assets/{id}",
    params(("id", Path, description = "Asset ID")),
    request_body = UpdateAsset,
    responses(
        (status = 200, description = "Asset updated"),
        (status = 303, description = "Admin only"),
        (status = 404, description = "Asset not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn asset_update(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAsset>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_manage_assets(&actor) {
        return Err(policy::deny_to(&config.list_path("assets")));
    }

    let id = path.into_inner();
    let asset = fetch_asset(pool.get_ref(), id).await?;
    let Some(asset) = asset else {
        return Ok(not_found());
    };

    // Two-state assignment field: absent leaves it alone, null clears it.
    let assigned_to = match payload.assigned_to {
        Some(value) => value,
        None => asset.assigned_to,
    };

    sqlx::query(
        r#"
        UPDATE assets
        SET name = COALESCE(?, name),
            serial_number = COALESCE(?, serial_number),
            description = COALESCE(?, description),
            purchase_date = COALESCE(?, purchase_date),
            assigned_to = ?,
            status = COALESCE(?, status)
        WHERE id = ?
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.serial_number)
    .bind(&payload.description)
    .bind(payload.purchase_date)
    .bind(assigned_to)
    .bind(payload.status.map(|s| s.to_string()))
    .bind(id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to update asset");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Asset updated"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/assets/{id}",
    params(("id", Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Asset deleted"),
        (status = 303, description = "Admin only"),
        (status = 404, description = "Asset not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn asset_delete(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_manage_assets(&actor) {
        return Err(policy::deny_to(&config.list_path("assets")));
    }

    let id = path.into_inner();
    let result = sqlx::query("DELETE FROM assets WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete asset");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(not_found());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Asset deleted"
    })))
}

async fn fetch_asset(pool: &MySqlPool, id: u64) -> actix_web::Result<Option<Asset>> {
    sqlx::query_as::<_, Asset>(
        r#"
        SELECT id, name, serial_number, description, purchase_date,
               assigned_to, status, created_at, updated_at
        FROM assets
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to fetch asset");
        actix_web::error::ErrorInternalServerError("Internal Server Error").into()
    })
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "message": "Asset not found"
    }))
}
