use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::Notification;
use crate::pagination::{Envelope, PageRequest, Paginated};
use crate::routes::{deleted, ApiResult, PageResult};
use crate::state::SharedState;

#[derive(Default, Serialize, Deserialize)]
pub struct ListNotifications {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Serialize, Deserialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Serialize, Deserialize)]
pub struct MarkedRead {
    pub updated: u64,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<ListNotifications>,
) -> PageResult<Notification> {
    let page = PageRequest::new(q.page, q.per_page);
    let rows = db::notifications::list(
        &state.pool,
        auth.user_id,
        q.unread_only,
        page.limit(),
        page.offset(),
    )
    .await?;
    let total = db::notifications::count(&state.pool, auth.user_id, q.unread_only).await?;
    Ok(Json(Paginated::new(rows, page, total)))
}

pub async fn unread_count(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> ApiResult<UnreadCount> {
    let count = db::notifications::count(&state.pool, auth.user_id, true).await?;
    Ok(Json(Envelope::new(UnreadCount { count })))
}

pub async fn mark_read(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Notification> {
    let notification = db::notifications::mark_read(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
    Ok(Json(Envelope::new(notification)))
}

pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> ApiResult<MarkedRead> {
    let updated = db::notifications::mark_all_read(&state.pool, auth.user_id).await?;
    Ok(Json(Envelope::new(MarkedRead { updated })))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    if db::notifications::delete(&state.pool, id, auth.user_id).await? == 0 {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    Ok(deleted())
}
