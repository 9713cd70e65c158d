use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::roles::Role;
use crate::db;
use crate::db::leave_requests::{LeaveFilter, NewLeave};
use crate::error::AppError;
use crate::middleware::{audit, notify};
use crate::models::{weekdays_between, LeaveBalance, LeaveRequest, NotificationKind, LEAVE_TYPES};
use crate::pagination::{Envelope, PageRequest, Paginated};
use crate::routes::{non_blank, ApiResult, PageResult};
use crate::state::SharedState;

const APPROVER_ROLES: [Role; 3] = [Role::Admin, Role::Hr, Role::Manager];

#[derive(Deserialize)]
pub struct CreateLeave {
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize)]
pub struct ListLeave {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub employee_id: Option<Uuid>,
    pub status: Option<String>,
    pub leave_type: Option<String>,
}

#[derive(Deserialize)]
pub struct ApproveLeave {
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct RejectLeave {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct BalanceQuery {
    pub year: Option<i32>,
    pub employee_id: Option<Uuid>,
}

async fn balance_for(
    state: &SharedState,
    employee_id: Uuid,
    year: i32,
) -> Result<LeaveBalance, AppError> {
    let (used, pending) = db::leave_requests::annual_usage(&state.pool, employee_id, year).await?;
    Ok(LeaveBalance::new(
        year,
        state.config.annual_leave_days,
        used as i32,
        pending as i32,
    ))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateLeave>,
) -> ApiResult<LeaveRequest> {
    let employee_id = auth.require_employee()?;
    if !LEAVE_TYPES.contains(&req.leave_type.as_str()) {
        return Err(AppError::Validation(format!(
            "leave_type must be one of {}",
            LEAVE_TYPES.join(", ")
        )));
    }
    if req.end_date < req.start_date {
        return Err(AppError::Validation(
            "end_date must not be before start_date".to_string(),
        ));
    }
    let days = weekdays_between(req.start_date, req.end_date);
    if days == 0 {
        return Err(AppError::Validation(
            "The requested range contains no working days".to_string(),
        ));
    }

    if req.leave_type == "annual" {
        if req.start_date.year() != req.end_date.year() {
            return Err(AppError::Validation(
                "Annual leave cannot span two calendar years".to_string(),
            ));
        }
        let balance = balance_for(&state, employee_id, req.start_date.year()).await?;
        if days > balance.remaining {
            return Err(AppError::Validation(format!(
                "Insufficient annual leave: requested {days} days, {} remaining",
                balance.remaining
            )));
        }
    }

    if db::leave_requests::overlaps(&state.pool, employee_id, req.start_date, req.end_date).await? {
        return Err(AppError::Conflict(
            "You already have a leave request covering these dates".to_string(),
        ));
    }

    let leave = db::leave_requests::create(
        &state.pool,
        &NewLeave {
            employee_id,
            leave_type: &req.leave_type,
            start_date: req.start_date,
            end_date: req.end_date,
            days,
            reason: req.reason.trim(),
        },
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "leave.requested",
        "leave_request",
        Some(leave.id),
        Some(serde_json::json!({ "days": days, "leave_type": leave.leave_type })),
    )
    .await;

    Ok(Json(Envelope::new(leave)))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<ListLeave>,
) -> PageResult<LeaveRequest> {
    let employee_id = if auth.has_any(&APPROVER_ROLES) {
        q.employee_id
    } else {
        Some(auth.require_employee()?)
    };
    let page = PageRequest::new(q.page, q.per_page);
    let filter = LeaveFilter {
        employee_id,
        status: q.status,
        leave_type: q.leave_type,
    };
    let rows = db::leave_requests::list(&state.pool, &filter, page.limit(), page.offset()).await?;
    let total = db::leave_requests::count(&state.pool, &filter).await?;
    Ok(Json(Paginated::new(rows, page, total)))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<LeaveRequest> {
    let leave = db::leave_requests::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))?;
    if auth.employee_id != Some(leave.employee_id) {
        auth.require_any(&APPROVER_ROLES)?;
    }
    Ok(Json(Envelope::new(leave)))
}

async fn decide(
    auth: &AuthUser,
    state: &SharedState,
    id: Uuid,
    status: &str,
    notes: Option<&str>,
) -> Result<LeaveRequest, AppError> {
    auth.require_any(&APPROVER_ROLES)?;
    let current = db::leave_requests::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))?;
    if auth.employee_id == Some(current.employee_id) {
        return Err(AppError::Forbidden(
            "You cannot decide on your own leave request".to_string(),
        ));
    }

    let leave = db::leave_requests::decide(&state.pool, id, status, auth.user_id, notes)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!("Leave request is already {}", current.status))
        })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        &format!("leave.{status}"),
        "leave_request",
        Some(id),
        None,
    )
    .await;

    let message = match notes {
        Some(n) => format!(
            "Your {} leave from {} to {} was {status}: {n}",
            leave.leave_type, leave.start_date, leave.end_date
        ),
        None => format!(
            "Your {} leave from {} to {} was {status}",
            leave.leave_type, leave.start_date, leave.end_date
        ),
    };
    notify::employee(
        state,
        leave.employee_id,
        NotificationKind::Leave,
        &format!("Leave request {status}"),
        &message,
        "/leave",
    )
    .await;

    Ok(leave)
}

pub async fn approve(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ApproveLeave>>,
) -> ApiResult<LeaveRequest> {
    let notes = body.and_then(|Json(b)| b.notes);
    let leave = decide(&auth, &state, id, "approved", non_blank(notes.as_deref())).await?;
    Ok(Json(Envelope::new(leave)))
}

pub async fn reject(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectLeave>,
) -> ApiResult<LeaveRequest> {
    let reason = non_blank(req.reason.as_deref())
        .ok_or_else(|| AppError::Validation("A rejection reason is required".to_string()))?;
    let leave = decide(&auth, &state, id, "rejected", Some(reason)).await?;
    Ok(Json(Envelope::new(leave)))
}

pub async fn cancel(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<LeaveRequest> {
    let employee_id = auth.require_employee()?;
    let current = db::leave_requests::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))?;
    if current.employee_id != employee_id {
        return Err(AppError::Forbidden(
            "Only the requester can cancel a leave request".to_string(),
        ));
    }

    let leave = db::leave_requests::cancel(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!("Leave request is already {}", current.status))
        })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "leave.cancelled",
        "leave_request",
        Some(id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(leave)))
}

pub async fn balance(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<BalanceQuery>,
) -> ApiResult<LeaveBalance> {
    let employee_id = match q.employee_id {
        Some(id) if auth.employee_id != Some(id) => {
            auth.require_any(&APPROVER_ROLES)?;
            id
        }
        Some(id) => id,
        None => auth.require_employee()?,
    };
    let year = q.year.unwrap_or_else(|| {
        Utc::now()
            .with_timezone(&state.config.local_offset())
            .year()
    });
    Ok(Json(Envelope::new(balance_for(&state, employee_id, year).await?)))
}
