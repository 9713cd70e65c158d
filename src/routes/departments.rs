use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::departments::DepartmentInput;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::Department;
use crate::pagination::{search_pattern, Envelope, PageRequest, Paginated};
use crate::routes::{deleted, non_blank, required, ApiResult, PageResult};
use crate::state::SharedState;

#[derive(Default, Serialize, Deserialize)]
pub struct ListDepartments {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub company_id: Option<Uuid>,
}

#[derive(Serialize, Deserialize)]
pub struct DepartmentRequest {
    pub company_id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl DepartmentRequest {
    fn input(&self) -> Result<DepartmentInput<'_>, AppError> {
        Ok(DepartmentInput {
            company_id: self.company_id,
            name: required(&self.name, "name")?,
            code: non_blank(self.code.as_deref()),
            description: non_blank(self.description.as_deref()),
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

const DUPLICATE_NAME: &str = "A department with this name already exists in the company";

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<ListDepartments>,
) -> PageResult<Department> {
    let page = PageRequest::new(q.page, q.per_page);
    let search = search_pattern(q.search.as_deref());
    let rows = db::departments::list(
        &state.pool,
        search.as_deref(),
        q.company_id,
        page.limit(),
        page.offset(),
    )
    .await?;
    let total = db::departments::count(&state.pool, search.as_deref(), q.company_id).await?;
    Ok(Json(Paginated::new(rows, page, total)))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<DepartmentRequest>,
) -> ApiResult<Department> {
    auth.require_hr()?;
    let department = db::departments::create(&state.pool, &req.input()?)
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_NAME))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "department.created",
        "department",
        Some(department.id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(department)))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Department> {
    let department = db::departments::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;
    Ok(Json(Envelope::new(department)))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<DepartmentRequest>,
) -> ApiResult<Department> {
    auth.require_hr()?;
    let department = db::departments::update(&state.pool, id, &req.input()?)
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_NAME))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "department.updated",
        "department",
        Some(id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(department)))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_hr()?;
    let rows = db::departments::delete(&state.pool, id)
        .await
        .map_err(|e| AppError::from_write(e, "Department is still referenced"))?;
    if rows == 0 {
        return Err(AppError::NotFound("Department not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "department.deleted",
        "department",
        Some(id),
        None,
    )
    .await;

    Ok(deleted())
}
