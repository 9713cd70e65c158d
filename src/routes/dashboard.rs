use axum::extract::State;
use axum::Json;
use chrono::{Datelike, Utc};
use serde::Serialize;

use crate::auth::extractor::AuthUser;
use crate::auth::roles::Role;
use crate::db;
use crate::db::dashboard::{CompanyHeadcount, StatusCount};
use crate::error::AppError;
use crate::models::MovementStatus;
use crate::pagination::Envelope;
use crate::routes::ApiResult;
use crate::state::SharedState;

#[derive(Serialize)]
pub struct TodayAttendance {
    pub present: i64,
    pub late: i64,
}

#[derive(Serialize)]
pub struct DashboardSummary {
    pub headcount: i64,
    pub by_status: Vec<StatusCount>,
    pub by_company: Vec<CompanyHeadcount>,
    pub new_hires_this_month: i64,
    pub pending_movements: i64,
    pub pending_leave_requests: i64,
    pub attendance_today: TodayAttendance,
}

pub async fn summary(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> ApiResult<DashboardSummary> {
    auth.require_any(&[Role::Admin, Role::Hr, Role::Ceo])?;

    let today = Utc::now()
        .with_timezone(&state.config.local_offset())
        .date_naive();
    let month_start = today
        .with_day(1)
        .ok_or_else(|| AppError::Internal("Invalid month start".to_string()))?;

    let pool = &state.pool;
    let (by_status, by_company, new_hires, pending_movements, pending_leave, (present, late)) =
        tokio::try_join!(
            db::dashboard::headcount_by_status(pool),
            db::dashboard::headcount_by_company(pool),
            db::dashboard::hires_since(pool, month_start),
            db::movements::count_by_status(pool, MovementStatus::Pending),
            db::leave_requests::count_pending(pool),
            db::attendance::day_summary(pool, today),
        )?;

    let headcount = by_status
        .iter()
        .filter(|s| matches!(s.status.as_str(), "active" | "probation"))
        .map(|s| s.count)
        .sum();

    Ok(Json(Envelope::new(DashboardSummary {
        headcount,
        by_status,
        by_company,
        new_hires_this_month: new_hires,
        pending_movements,
        pending_leave_requests: pending_leave,
        attendance_today: TodayAttendance { present, late },
    })))
}
