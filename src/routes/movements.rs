use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::roles::Role;
use crate::db;
use crate::db::movements::{MovementFilter, NewMovement};
use crate::error::AppError;
use crate::middleware::{audit, notify};
use crate::models::{
    EmployeeMovement, MovementAction, MovementStatus, MovementType, NotificationKind, Placement,
};
use crate::pagination::{search_pattern, Envelope, PageRequest, Paginated};
use crate::routes::{deleted, non_blank, ApiResult, PageResult};
use crate::state::SharedState;

const MOVEMENT_ROLES: [Role; 3] = [Role::Admin, Role::Hr, Role::Manager];

#[derive(Default, Serialize, Deserialize)]
pub struct ListMovements {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub movement_type: Option<String>,
    pub employee_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateMovement {
    pub employee_id: Uuid,
    pub movement_type: String,
    pub effective_date: NaiveDate,
    pub new_company_id: Option<Uuid>,
    pub new_department_id: Option<Uuid>,
    pub new_position_id: Option<Uuid>,
    pub new_salary: Option<i64>,
    pub reason: Option<String>,
    /// Save as a draft instead of submitting straight away.
    #[serde(default)]
    pub draft: bool,
}

impl CreateMovement {
    fn proposed(&self) -> Placement {
        Placement {
            company_id: self.new_company_id,
            department_id: self.new_department_id,
            position_id: self.new_position_id,
            salary: self.new_salary,
        }
    }
}

#[derive(Default, Serialize, Deserialize)]
pub struct DecisionNotes {
    pub notes: Option<String>,
}

#[derive(Default, Serialize, Deserialize)]
pub struct ReasonRequest {
    pub reason: Option<String>,
}

async fn load(state: &SharedState, id: Uuid) -> Result<EmployeeMovement, AppError> {
    db::movements::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement not found".to_string()))
}

/// A conditional transition matched nothing: tell missing apart from a status conflict.
async fn transition_failed(state: &SharedState, id: Uuid, action: MovementAction) -> AppError {
    match db::movements::find_by_id(&state.pool, id).await {
        Ok(Some(current)) => {
            let verb = match action {
                MovementAction::Submit => "submit",
                MovementAction::Approve => "approve",
                MovementAction::Reject => "reject",
                MovementAction::Apply => "apply",
                MovementAction::Cancel => "cancel",
                MovementAction::Delete => "delete",
            };
            AppError::Conflict(format!("Cannot {verb} a movement that is {}", current.status))
        }
        Ok(None) => AppError::NotFound("Movement not found".to_string()),
        Err(e) => AppError::Database(e),
    }
}

async fn record(
    auth: &AuthUser,
    state: &SharedState,
    movement: &EmployeeMovement,
    action: MovementAction,
) {
    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        &format!("movement.{}", action.verb()),
        "employee_movement",
        Some(movement.id),
        Some(serde_json::json!({
            "employee_id": movement.employee_id,
            "status": movement.status,
        })),
    )
    .await;
}

fn type_label(movement: &EmployeeMovement) -> &'static str {
    MovementType::parse(&movement.movement_type).map_or("Movement", |t| t.label())
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<ListMovements>,
) -> PageResult<EmployeeMovement> {
    auth.require_any(&MOVEMENT_ROLES)?;
    let page = PageRequest::new(q.page, q.per_page);
    let filter = MovementFilter {
        status: q.status,
        movement_type: q.movement_type,
        employee_id: q.employee_id,
        search: search_pattern(q.search.as_deref()),
    };
    let rows = db::movements::list(&state.pool, &filter, page.limit(), page.offset()).await?;
    let total = db::movements::count(&state.pool, &filter).await?;
    Ok(Json(Paginated::new(rows, page, total)))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateMovement>,
) -> ApiResult<EmployeeMovement> {
    auth.require_any(&MOVEMENT_ROLES)?;
    let movement_type = MovementType::parse(&req.movement_type).ok_or_else(|| {
        let names: Vec<&str> = MovementType::ALL.iter().map(|t| t.as_str()).collect();
        AppError::Validation(format!("movement_type must be one of {}", names.join(", ")))
    })?;
    if req.new_salary.is_some_and(|s| s <= 0) {
        return Err(AppError::Validation(
            "new_salary must be greater than zero".to_string(),
        ));
    }

    let employee = db::employees::find_by_id(&state.pool, req.employee_id)
        .await?
        .ok_or_else(|| AppError::Validation("Employee does not exist".to_string()))?;
    if auth.employee_id == Some(employee.id) {
        return Err(AppError::Forbidden(
            "You cannot request a movement for yourself".to_string(),
        ));
    }

    let current = Placement {
        company_id: Some(employee.company_id),
        department_id: employee.department_id,
        position_id: employee.position_id,
        salary: Some(employee.base_salary),
    };
    let proposed = req.proposed();
    if !proposed.changes(&current) {
        return Err(AppError::Validation(
            "A movement must change the company, department, position or salary".to_string(),
        ));
    }

    let status = if req.draft {
        MovementStatus::Draft
    } else {
        MovementStatus::Pending
    };
    let movement = db::movements::create(
        &state.pool,
        &NewMovement {
            employee_id: employee.id,
            movement_type: movement_type.as_str(),
            status,
            effective_date: req.effective_date,
            old: current,
            new: proposed,
            reason: non_blank(req.reason.as_deref()),
            requested_by: auth.user_id,
        },
    )
    .await
    .map_err(|e| AppError::from_write(e, "Movement already exists"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "movement.created",
        "employee_movement",
        Some(movement.id),
        Some(serde_json::json!({
            "employee_id": movement.employee_id,
            "movement_type": movement.movement_type,
            "status": movement.status,
        })),
    )
    .await;

    Ok(Json(Envelope::new(movement)))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<EmployeeMovement> {
    let movement = load(&state, id).await?;
    if auth.employee_id != Some(movement.employee_id) {
        auth.require_any(&MOVEMENT_ROLES)?;
    }
    Ok(Json(Envelope::new(movement)))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_any(&MOVEMENT_ROLES)?;
    if !db::movements::delete_undecided(&state.pool, id).await? {
        return Err(transition_failed(&state, id, MovementAction::Delete).await);
    }
    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "movement.deleted",
        "employee_movement",
        Some(id),
        None,
    )
    .await;
    Ok(deleted())
}

pub async fn submit(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<EmployeeMovement> {
    auth.require_any(&MOVEMENT_ROLES)?;
    let Some(movement) = db::movements::submit(&state.pool, id).await? else {
        return Err(transition_failed(&state, id, MovementAction::Submit).await);
    };
    record(&auth, &state, &movement, MovementAction::Submit).await;
    Ok(Json(Envelope::new(movement)))
}

pub async fn approve(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    body: Option<Json<DecisionNotes>>,
) -> ApiResult<EmployeeMovement> {
    auth.require_any(&[Role::Admin, Role::Hr])?;
    let notes = body.map(|Json(b)| b).unwrap_or_default().notes;
    let current = load(&state, id).await?;
    if current.requested_by == Some(auth.user_id) && !auth.is_admin() {
        return Err(AppError::Forbidden(
            "A movement cannot be approved by its requester".to_string(),
        ));
    }

    let Some(movement) =
        db::movements::approve(&state.pool, id, auth.user_id, non_blank(notes.as_deref())).await?
    else {
        return Err(transition_failed(&state, id, MovementAction::Approve).await);
    };
    record(&auth, &state, &movement, MovementAction::Approve).await;

    if let Some(requester) = movement.requested_by {
        notify::user(
            &state,
            requester,
            NotificationKind::Movement,
            &format!("{} approved", type_label(&movement)),
            &format!(
                "The movement effective {} has been approved",
                movement.effective_date
            ),
            &format!("/movements/{}", movement.id),
        )
        .await;
    }

    Ok(Json(Envelope::new(movement)))
}

pub async fn reject(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> ApiResult<EmployeeMovement> {
    auth.require_any(&[Role::Admin, Role::Hr])?;
    let reason = body.map(|Json(b)| b).unwrap_or_default().reason;
    let reason = non_blank(reason.as_deref())
        .ok_or_else(|| AppError::Validation("A rejection reason is required".to_string()))?;

    let Some(movement) = db::movements::reject(&state.pool, id, auth.user_id, reason).await? else {
        return Err(transition_failed(&state, id, MovementAction::Reject).await);
    };
    record(&auth, &state, &movement, MovementAction::Reject).await;

    if let Some(requester) = movement.requested_by {
        notify::user(
            &state,
            requester,
            NotificationKind::Movement,
            &format!("{} rejected", type_label(&movement)),
            &format!("The movement was rejected: {reason}"),
            &format!("/movements/{}", movement.id),
        )
        .await;
    }

    Ok(Json(Envelope::new(movement)))
}

pub async fn apply(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<EmployeeMovement> {
    auth.require_hr()?;
    let Some(movement) = db::movements::apply(&state.pool, id, auth.user_id).await? else {
        return Err(transition_failed(&state, id, MovementAction::Apply).await);
    };
    record(&auth, &state, &movement, MovementAction::Apply).await;

    notify::employee(
        &state,
        movement.employee_id,
        NotificationKind::Movement,
        &format!("{} applied", type_label(&movement)),
        &format!(
            "Your new placement is effective {}",
            movement.effective_date
        ),
        "/profile",
    )
    .await;

    Ok(Json(Envelope::new(movement)))
}

pub async fn cancel(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> ApiResult<EmployeeMovement> {
    auth.require_hr()?;
    let reason = body.map(|Json(b)| b).unwrap_or_default().reason;
    let Some(movement) =
        db::movements::cancel(&state.pool, id, auth.user_id, non_blank(reason.as_deref())).await?
    else {
        return Err(transition_failed(&state, id, MovementAction::Cancel).await);
    };
    record(&auth, &state, &movement, MovementAction::Cancel).await;
    Ok(Json(Envelope::new(movement)))
}
