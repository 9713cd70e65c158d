use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::work_locations::WorkLocationInput;
use crate::error::AppError;
use crate::geo;
use crate::middleware::audit;
use crate::models::WorkLocation;
use crate::pagination::{Envelope, PageRequest, Paginated};
use crate::routes::{deleted, non_blank, required, ApiResult, PageResult};
use crate::state::SharedState;

pub const MIN_RADIUS_METERS: i32 = 10;
pub const MAX_RADIUS_METERS: i32 = 5_000;

#[derive(Default, Serialize, Deserialize)]
pub struct ListWorkLocations {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub company_id: Option<Uuid>,
}

#[derive(Serialize, Deserialize)]
pub struct WorkLocationRequest {
    pub company_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: Option<i32>,
    pub is_active: Option<bool>,
}

impl WorkLocationRequest {
    fn input(&self) -> Result<WorkLocationInput<'_>, AppError> {
        if !geo::valid_coordinates(self.latitude, self.longitude) {
            return Err(AppError::Validation(
                "latitude must be within [-90, 90] and longitude within [-180, 180]".to_string(),
            ));
        }
        let radius_meters = self.radius_meters.unwrap_or(100);
        if !(MIN_RADIUS_METERS..=MAX_RADIUS_METERS).contains(&radius_meters) {
            return Err(AppError::Validation(format!(
                "radius_meters must be between {MIN_RADIUS_METERS} and {MAX_RADIUS_METERS}"
            )));
        }
        Ok(WorkLocationInput {
            company_id: self.company_id,
            name: required(&self.name, "name")?,
            address: non_blank(self.address.as_deref()),
            latitude: self.latitude,
            longitude: self.longitude,
            radius_meters,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<ListWorkLocations>,
) -> PageResult<WorkLocation> {
    let page = PageRequest::new(q.page, q.per_page);
    let rows =
        db::work_locations::list(&state.pool, q.company_id, page.limit(), page.offset()).await?;
    let total = db::work_locations::count(&state.pool, q.company_id).await?;
    Ok(Json(Paginated::new(rows, page, total)))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<WorkLocationRequest>,
) -> ApiResult<WorkLocation> {
    auth.require_hr()?;
    let location = db::work_locations::create(&state.pool, &req.input()?)
        .await
        .map_err(|e| AppError::from_write(e, "Work location already exists"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "work_location.created",
        "work_location",
        Some(location.id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(location)))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WorkLocation> {
    let location = db::work_locations::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Work location not found".to_string()))?;
    Ok(Json(Envelope::new(location)))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<WorkLocationRequest>,
) -> ApiResult<WorkLocation> {
    auth.require_hr()?;
    let location = db::work_locations::update(&state.pool, id, &req.input()?)
        .await
        .map_err(|e| AppError::from_write(e, "Work location already exists"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "work_location.updated",
        "work_location",
        Some(id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(location)))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_hr()?;
    if db::work_locations::delete(&state.pool, id).await? == 0 {
        return Err(AppError::NotFound("Work location not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "work_location.deleted",
        "work_location",
        Some(id),
        None,
    )
    .await;

    Ok(deleted())
}
