use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::document::{AccessLevel, Document};
use crate::policy::{self, Bind};
use crate::storage::DocumentStore;
use actix_multipart::Multipart;
use actix_web::{HttpResponse, Responder, web};
use futures_util::StreamExt;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

/// Upload cap, matching what the store is expected to hold (office PDFs,
/// sheets, scans).
const MAX_FILE_SIZE: usize = 20 * 1024 * 1024;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct DocumentQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Filter by department
    pub department: Option<String>,
}

#[derive(serde::Serialize, ToSchema)]
pub struct DocumentListResponse {
    pub data: Vec<Document>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Admin sees everything; everyone else sees public documents plus private
/// ones of their own department.
#[utoipa::path(
    get,
    path = "/api/v1/documents",
    params(DocumentQuery),
    responses(
        (status = 200, description = "Paginated document list", body = DocumentListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn document_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DocumentQuery>,
) -> actix_web::Result<impl Responder> {
    let actor = auth
        .actor_with_department(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to load actor department");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
    let scope = policy::document_scope(&actor);

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    scope.push_onto(&mut where_sql);

    let mut extra: Vec<Bind> = Vec::new();
    if let Some(department) = &query.department {
        where_sql.push_str(" AND department = ?");
        extra.push(Bind::Str(department.clone()));
    }

    let binds: Vec<&Bind> = scope.binds.iter().chain(extra.iter()).collect();

    let count_sql = format!("SELECT COUNT(*) FROM documents{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &binds {
        count_q = match b {
            Bind::U64(v) => count_q.bind(*v),
            Bind::Str(s) => count_q.bind(s.clone()),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count documents");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, uploaded_by, title, file_path, original_name, content_type,
               department, access_level, uploaded_at
        FROM documents
        {}
        ORDER BY uploaded_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Document>(&data_sql);
    for b in &binds {
        data_q = match b {
            Bind::U64(v) => data_q.bind(*v),
            Bind::Str(s) => data_q.bind(s.clone()),
        };
    }

    let documents = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch documents");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(DocumentListResponse {
        data: documents,
        page,
        per_page,
        total,
    }))
}

/// Multipart upload: a `file` part plus `title`, `department` and
/// `access_level` text parts.
#[utoipa::path(
    post,
    path = "/api/v1/documents",
    responses(
        (status = 201, description = "Document stored"),
        (status = 303, description = "Manager/Admin only"),
        (status = 400, description = "Missing part or file too large")
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn document_upload(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    store: web::Data<DocumentStore>,
    mut payload: Multipart,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_upload_document(&actor) {
        return Err(policy::deny_to(&config.list_path("documents")));
    }

    let mut title: Option<String> = None;
    let mut department: Option<String> = None;
    let mut access_level: Option<AccessLevel> = None;
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut original_name: Option<String> = None;
    let mut content_type: Option<String> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(actix_web::error::ErrorBadRequest)?;
        let name = field.name().to_string();

        if name == "file" {
            original_name = field
                .content_disposition()
                .get_filename()
                .map(|s| s.to_string());
            content_type = field.content_type().map(|m| m.to_string());

            let mut data = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(actix_web::error::ErrorBadRequest)?;
                if data.len() + chunk.len() > MAX_FILE_SIZE {
                    return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                        "message": "File too large"
                    })));
                }
                data.extend_from_slice(&chunk);
            }
            file_bytes = Some(data);
        } else {
            let mut data = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(actix_web::error::ErrorBadRequest)?;
                data.extend_from_slice(&chunk);
            }
            let text = String::from_utf8(data)
                .map_err(|_| actix_web::error::ErrorBadRequest("Invalid UTF-8 field"))?;

            match name.as_str() {
                "title" => title = Some(text),
                "department" => department = Some(text),
                "access_level" => {
                    access_level = Some(text.parse().map_err(|_| {
                        actix_web::error::ErrorBadRequest(
                            "access_level must be 'public' or 'private'",
                        )
                    })?);
                }
                _ => {} // unknown parts are ignored
            }
        }
    }

    let (Some(title), Some(department), Some(access_level), Some(file_bytes)) =
        (title, department, access_level, file_bytes)
    else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "title, department, access_level and file parts are required"
        })));
    };

    if title.trim().is_empty() || department.trim().is_empty() || file_bytes.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "title, department and file must not be empty"
        })));
    }

    let original_name = original_name.unwrap_or_else(|| "upload".to_string());

    let stored_name = {
        let store = store.get_ref().clone();
        let original = original_name.clone();
        web::block(move || store.save(&original, &file_bytes))
            .await
            .map_err(actix_web::error::ErrorInternalServerError)?
            .map_err(|e| {
                error!(error = %e, "Failed to store document file");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?
    };

    let insert = sqlx::query(
        r#"
        INSERT INTO documents
            (uploaded_by, title, file_path, original_name, content_type, department, access_level)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(actor.user_id)
    .bind(title.trim())
    .bind(&stored_name)
    .bind(&original_name)
    .bind(&content_type)
    .bind(department.trim())
    .bind(access_level.to_string())
    .execute(pool.get_ref())
    .await;

    if let Err(e) = insert {
        // Do not leave an orphan blob behind a failed insert
        let store = store.get_ref().clone();
        let name = stored_name.clone();
        let _ = web::block(move || store.remove(&name)).await;

        error!(error = %e, "Failed to record document");
        return Err(actix_web::error::ErrorInternalServerError(
            "Internal Server Error",
        ));
    }

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Document uploaded"
    })))
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateDocument {
    pub title: Option<String>,
    pub department: Option<String>,
    pub access_level: Option<AccessLevel>,
}

/// Metadata edit; the stored file itself is immutable.
#[utoipa::path(
    put,
    path = "/api/v1/documents/{id}",
    params(("id", Path, description = "Document ID")),
    request_body = UpdateDocument,
    responses(
        (status = 200, description = "Document updated"),
        (status = 303, description = "Caller is not the uploader or an Admin"),
        (status = 404, description = "Document not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn document_update(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<UpdateDocument>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    let id = path.into_inner();

    let document = fetch_document(pool.get_ref(), id).await?;
    let Some(document) = document else {
        return Ok(not_found());
    };

    if !policy::can_edit_document(&actor, document.uploaded_by) {
        return Err(policy::deny_to(&config.list_path("documents")));
    }

    sqlx::query(
        r#"
        UPDATE documents
        SET title = COALESCE(?, title),
            department = COALESCE(?, department),
            access_level = COALESCE(?, access_level)
        WHERE id = ?
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.department)
    .bind(payload.access_level.map(|a| a.to_string()))
    .bind(id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to update document");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Document updated"
    })))
}

/// Admin-only; removes the stored file before the record so a failed file
/// removal never leaves a record pointing at nothing.
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{id}",
    params(("id", Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document deleted"),
        (status = 303, description = "Admin only"),
        (status = 404, description = "Document not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn document_delete(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    store: web::Data<DocumentStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    if !policy::can_delete_document(&actor) {
        return Err(policy::deny_to(&config.list_path("documents")));
    }

    let id = path.into_inner();
    let document = fetch_document(pool.get_ref(), id).await?;
    let Some(document) = document else {
        return Ok(not_found());
    };

    {
        let store = store.get_ref().clone();
        let name = document.file_path.clone();
        web::block(move || store.remove(&name))
            .await
            .map_err(actix_web::error::ErrorInternalServerError)?
            .map_err(|e| {
                error!(error = %e, id, "Failed to remove document file");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
    }

    sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete document");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Document deleted"
    })))
}

/// Denied access and a missing file are both a 404; whether the document
/// exists is not revealed.
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}/download",
    params(("id", Path, description = "Document ID")),
    responses(
        (status = 200, description = "File contents"),
        (status = 404, description = "Not found or not accessible")
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn document_download(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    store: web::Data<DocumentStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth
        .actor_with_department(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to load actor department");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let id = path.into_inner();
    let document = fetch_document(pool.get_ref(), id).await?;
    let Some(document) = document else {
        return Ok(not_found());
    };

    if !policy::can_view_document(&actor, &document.access_level, &document.department) {
        return Ok(not_found());
    }

    let bytes = {
        let store = store.get_ref().clone();
        let name = document.file_path.clone();
        web::block(move || store.read(&name))
            .await
            .map_err(actix_web::error::ErrorInternalServerError)?
    };

    let bytes = match bytes {
        Ok(b) => b,
        Err(e) => {
            error!(error = %e, id, "Document file missing or unreadable");
            return Ok(not_found());
        }
    };

    Ok(HttpResponse::Ok()
        .content_type(
            document
                .content_type
                .as_deref()
                .unwrap_or("application/octet-stream")
                .to_string(),
        )
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", document.original_name),
        ))
        .body(bytes))
}

async fn fetch_document(pool: &MySqlPool, id: u64) -> actix_web::Result<Option<Document>> {
    sqlx::query_as::<_, Document>(
        r#"
        SELECT id, uploaded_by, title, file_path, original_name, content_type,
               department, access_level, uploaded_at
        FROM documents
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to fetch document");
        actix_web::error::ErrorInternalServerError("Internal Server Error").into()
    })
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "message": "Document not found"
    }))
}
