use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::positions::PositionInput;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::Position;
use crate::pagination::{search_pattern, Envelope, PageRequest, Paginated};
use crate::routes::{deleted, non_blank, required, ApiResult, PageResult};
use crate::state::SharedState;

#[derive(Default, Serialize, Deserialize)]
pub struct ListPositions {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub company_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
}

#[derive(Serialize, Deserialize)]
pub struct PositionRequest {
    pub company_id: Uuid,
    pub department_id: Option<Uuid>,
    pub name: String,
    pub level: Option<i32>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl PositionRequest {
    fn input(&self) -> Result<PositionInput<'_>, AppError> {
        let level = self.level.unwrap_or(1);
        if level < 1 {
            return Err(AppError::Validation("level must be at least 1".to_string()));
        }
        Ok(PositionInput {
            company_id: self.company_id,
            department_id: self.department_id,
            name: required(&self.name, "name")?,
            level,
            description: non_blank(self.description.as_deref()),
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<ListPositions>,
) -> PageResult<Position> {
    let page = PageRequest::new(q.page, q.per_page);
    let search = search_pattern(q.search.as_deref());
    let rows = db::positions::list(
        &state.pool,
        search.as_deref(),
        q.company_id,
        q.department_id,
        page.limit(),
        page.offset(),
    )
    .await?;
    let total =
        db::positions::count(&state.pool, search.as_deref(), q.company_id, q.department_id).await?;
    Ok(Json(Paginated::new(rows, page, total)))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<PositionRequest>,
) -> ApiResult<Position> {
    auth.require_hr()?;
    let position = db::positions::create(&state.pool, &req.input()?)
        .await
        .map_err(|e| AppError::from_write(e, "Position already exists"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "position.created",
        "position",
        Some(position.id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(position)))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Position> {
    let position = db::positions::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Position not found".to_string()))?;
    Ok(Json(Envelope::new(position)))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PositionRequest>,
) -> ApiResult<Position> {
    auth.require_hr()?;
    let position = db::positions::update(&state.pool, id, &req.input()?)
        .await
        .map_err(|e| AppError::from_write(e, "Position already exists"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "position.updated",
        "position",
        Some(id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(position)))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_hr()?;
    let rows = db::positions::delete(&state.pool, id)
        .await
        .map_err(|e| AppError::from_write(e, "Position is still referenced"))?;
    if rows == 0 {
        return Err(AppError::NotFound("Position not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "position.deleted",
        "position",
        Some(id),
        None,
    )
    .await;

    Ok(deleted())
}
