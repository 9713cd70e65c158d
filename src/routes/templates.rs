use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::templates::TemplateMeta;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Template, TemplateVersion};
use crate::pagination::{search_pattern, Envelope, PageRequest, Paginated};
use crate::routes::{deleted, non_blank, required, ApiResult, PageResult};
use crate::state::SharedState;
use crate::storage::{self, sanitize_file_name, StoredFile};
use crate::upload;

const TEMPLATE_FOLDER: &str = "templates";
const SHARED_UPLOAD_FOLDER: &str = "documents";

/// Only standalone uploads (`documents/<year>/...`) may become templates;
/// files under `documents/<employee_id>/` belong to an employee.
fn shared_upload_path(file_path: &str) -> Result<&str, AppError> {
    let mut segments = file_path.split('/');
    let folder = segments.next();
    let owner = segments.next().unwrap_or_default();
    if folder != Some(SHARED_UPLOAD_FOLDER) || Uuid::parse_str(owner).is_ok() {
        return Err(AppError::Validation(
            "file_path must reference a shared upload".to_string(),
        ));
    }
    Ok(file_path)
}

fn is_template_file(file_path: &str) -> bool {
    file_path
        .strip_prefix(TEMPLATE_FOLDER)
        .is_some_and(|rest| rest.starts_with('/'))
}

async fn discard(state: &SharedState, stored: &StoredFile) {
    if let Err(err) = state.storage.delete(&stored.file_path).await {
        tracing::warn!("Failed to remove orphaned upload {}: {err}", stored.file_path);
    }
}

#[derive(Default, Serialize, Deserialize)]
pub struct ListTemplates {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct TemplateRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
}

/// Register a template for a file already sent to `/upload/documents`.
#[derive(Serialize, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub file_path: String,
    pub file_name: Option<String>,
}

async fn load(state: &SharedState, id: Uuid) -> Result<Template, AppError> {
    db::templates::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<ListTemplates>,
) -> PageResult<Template> {
    let page = PageRequest::new(q.page, q.per_page);
    let search = search_pattern(q.search.as_deref());
    let category = non_blank(q.category.as_deref());
    let rows = db::templates::list(
        &state.pool,
        search.as_deref(),
        category,
        page.limit(),
        page.offset(),
    )
    .await?;
    let total = db::templates::count(&state.pool, search.as_deref(), category).await?;
    Ok(Json(Paginated::new(rows, page, total)))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateTemplate>,
) -> ApiResult<Template> {
    auth.require_hr()?;
    let meta = TemplateMeta {
        name: required(&req.name, "name")?,
        description: non_blank(req.description.as_deref()),
        category: required(&req.category, "category")?,
    };
    let file_path = shared_upload_path(required(&req.file_path, "file_path")?)?;
    let file_name = req
        .file_name
        .as_deref()
        .map(sanitize_file_name)
        .unwrap_or_else(|| sanitize_file_name(file_path));
    let mime_type = storage::mime_for(&file_name).map_err(AppError::Validation)?;
    let bytes = state
        .storage
        .read(file_path)
        .await
        .map_err(|_| AppError::Validation("Referenced file does not exist".to_string()))?;

    // Templates keep their own copy under `templates/`
    let stored = state
        .storage
        .save(TEMPLATE_FOLDER, &file_name, mime_type, &bytes)
        .await
        .map_err(AppError::Internal)?;
    let template = match db::templates::create(&state.pool, &meta, &stored, auth.user_id).await {
        Ok(t) => t,
        Err(e) => {
            discard(&state, &stored).await;
            return Err(e.into());
        }
    };

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "template.created",
        "template",
        Some(template.id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(template)))
}

pub async fn upload(
    auth: AuthUser,
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Template> {
    auth.require_hr()?;
    let mut form = upload::parse_multipart(&headers, body)
        .await
        .map_err(AppError::BadRequest)?;
    let file = form.require_file()?;
    let meta = TemplateMeta {
        name: required(form.field("name").unwrap_or_default(), "name")?,
        description: form.field("description"),
        category: required(form.field("category").unwrap_or_default(), "category")?,
    };
    let stored = upload::store(state.storage.as_ref(), TEMPLATE_FOLDER, &file).await?;

    let template = match db::templates::create(&state.pool, &meta, &stored, auth.user_id).await {
        Ok(t) => t,
        Err(e) => {
            discard(&state, &stored).await;
            return Err(e.into());
        }
    };

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "template.uploaded",
        "template",
        Some(template.id),
        Some(serde_json::json!({ "file_name": template.file_name })),
    )
    .await;

    Ok(Json(Envelope::new(template)))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Template> {
    Ok(Json(Envelope::new(load(&state, id).await?)))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TemplateRequest>,
) -> ApiResult<Template> {
    auth.require_hr()?;
    let meta = TemplateMeta {
        name: required(&req.name, "name")?,
        description: non_blank(req.description.as_deref()),
        category: required(&req.category, "category")?,
    };
    let template = db::templates::update_meta(&state.pool, id, &meta, auth.user_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Template not found".to_string()),
            e => AppError::from_write(e, "Template already exists"),
        })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "template.updated",
        "template",
        Some(id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(template)))
}

pub async fn upload_version(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Template> {
    auth.require_hr()?;
    load(&state, id).await?;
    let mut form = upload::parse_multipart(&headers, body)
        .await
        .map_err(AppError::BadRequest)?;
    let file = form.require_file()?;
    let stored = upload::store(state.storage.as_ref(), TEMPLATE_FOLDER, &file).await?;

    let template = match db::templates::add_version(&state.pool, id, &stored, auth.user_id).await {
        Ok(Some(t)) => t,
        Ok(None) => {
            discard(&state, &stored).await;
            return Err(AppError::NotFound("Template not found".to_string()));
        }
        Err(e) => {
            discard(&state, &stored).await;
            return Err(e.into());
        }
    };

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "template.version_uploaded",
        "template",
        Some(id),
        Some(serde_json::json!({ "version": template.version })),
    )
    .await;

    Ok(Json(Envelope::new(template)))
}

pub async fn versions(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<TemplateVersion>> {
    load(&state, id).await?;
    Ok(Json(Envelope::new(
        db::templates::versions(&state.pool, id).await?,
    )))
}

pub async fn download(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let template = load(&state, id).await?;
    let bytes = state
        .storage
        .read(&template.file_path)
        .await
        .map_err(AppError::Internal)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_file_name(&template.file_name)
    );
    Ok((
        [
            (header::CONTENT_TYPE, template.file_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_hr()?;
    let paths = db::templates::delete(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;
    for path in paths.iter().filter(|p| is_template_file(p)) {
        if let Err(e) = state.storage.delete(&path).await {
            tracing::warn!("Failed to remove template file {path}: {e}");
        }
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "template.deleted",
        "template",
        Some(id),
        None,
    )
    .await;

    Ok(deleted())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_shared_uploads_become_templates() {
        assert!(shared_upload_path("documents/2026/01/a.pdf").is_ok());
        let employee = format!("documents/{}/2026/01/a.pdf", Uuid::now_v7());
        assert!(shared_upload_path(&employee).is_err());
        assert!(shared_upload_path("templates/2026/01/a.pdf").is_err());
        assert!(shared_upload_path("avatars/a.png").is_err());
    }

    #[test]
    fn delete_is_limited_to_template_files() {
        assert!(is_template_file("templates/2026/01/a.pdf"));
        assert!(!is_template_file("documents/2026/01/a.pdf"));
        assert!(!is_template_file("templatesx/a.pdf"));
    }
}
