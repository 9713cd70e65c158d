use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::roles::Role;
use crate::db;
use crate::db::attendance::{AttendanceFilter, ClockIn};
use crate::error::AppError;
use crate::geo;
use crate::middleware::audit;
use crate::models::{AttendanceRecord, EmploymentStatus};
use crate::pagination::{Envelope, PageRequest, Paginated};
use crate::routes::{non_blank, ApiResult, PageResult};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ClockRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct ListAttendance {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub employee_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<String>,
}

/// `late` once the local clock is past the start of the workday.
pub fn attendance_status(local_time: NaiveTime, workday_start: NaiveTime) -> &'static str {
    if local_time > workday_start {
        "late"
    } else {
        "present"
    }
}

fn check_coordinates(req: &ClockRequest) -> Result<(), AppError> {
    if geo::valid_coordinates(req.latitude, req.longitude) {
        Ok(())
    } else {
        Err(AppError::Validation("Invalid coordinates".to_string()))
    }
}

pub async fn clock_in(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ClockRequest>,
) -> ApiResult<AttendanceRecord> {
    let employee_id = auth.require_employee()?;
    check_coordinates(&req)?;

    let employee = db::employees::find_by_id(&state.pool, employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;
    let working = EmploymentStatus::parse(&employee.employment_status)
        .is_some_and(|s| s.is_working());
    if !working {
        return Err(AppError::Forbidden("Only active employees can clock in".to_string()));
    }

    if let Some(location_id) = employee.work_location_id {
        let location = db::work_locations::find_by_id(&state.pool, location_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Work location not found".to_string()))?;
        let radius = f64::from(location.radius_meters);
        let inside = geo::within_radius(
            req.latitude,
            req.longitude,
            location.latitude,
            location.longitude,
            radius,
        );
        if !inside {
            let distance = geo::distance_meters(
                req.latitude,
                req.longitude,
                location.latitude,
                location.longitude,
            );
            return Err(AppError::Validation(format!(
                "You are {:.0} m from {}; clock-in is allowed within {} m",
                distance, location.name, location.radius_meters
            )));
        }
    }

    let now = Utc::now();
    let local = now.with_timezone(&state.config.local_offset());
    let status = attendance_status(local.time(), state.config.workday_start);

    let record = db::attendance::clock_in(
        &state.pool,
        &ClockIn {
            employee_id,
            work_date: local.date_naive(),
            work_location_id: employee.work_location_id,
            at: now,
            latitude: req.latitude,
            longitude: req.longitude,
            status,
            notes: non_blank(req.notes.as_deref()),
        },
    )
    .await
    .map_err(|e| AppError::from_write(e, "You have already clocked in today"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "attendance.clock_in",
        "attendance",
        Some(record.id),
        Some(serde_json::json!({ "status": status })),
    )
    .await;

    Ok(Json(Envelope::new(record)))
}

pub async fn clock_out(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ClockRequest>,
) -> ApiResult<AttendanceRecord> {
    let employee_id = auth.require_employee()?;
    check_coordinates(&req)?;

    let now = Utc::now();
    let work_date = now.with_timezone(&state.config.local_offset()).date_naive();

    let closed = db::attendance::clock_out(
        &state.pool,
        employee_id,
        work_date,
        now,
        req.latitude,
        req.longitude,
    )
    .await?;

    let record = match closed {
        Some(record) => record,
        None => {
            return match db::attendance::find_for_date(&state.pool, employee_id, work_date).await? {
                Some(_) => Err(AppError::Conflict(
                    "You have already clocked out today".to_string(),
                )),
                None => Err(AppError::Validation("You have not clocked in today".to_string())),
            };
        }
    };

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "attendance.clock_out",
        "attendance",
        Some(record.id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(record)))
}

pub async fn today(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> ApiResult<Option<AttendanceRecord>> {
    let employee_id = auth.require_employee()?;
    let work_date = Utc::now()
        .with_timezone(&state.config.local_offset())
        .date_naive();
    let record = db::attendance::find_for_date(&state.pool, employee_id, work_date).await?;
    Ok(Json(Envelope::new(record)))
}

pub async fn mine(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<ListAttendance>,
) -> PageResult<AttendanceRecord> {
    let employee_id = auth.require_employee()?;
    let page = PageRequest::new(q.page, q.per_page);
    let filter = AttendanceFilter {
        employee_id: Some(employee_id),
        from: q.from,
        to: q.to,
        status: q.status,
    };
    let rows = db::attendance::list(&state.pool, &filter, page.limit(), page.offset()).await?;
    let total = db::attendance::count(&state.pool, &filter).await?;
    Ok(Json(Paginated::new(rows, page, total)))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<ListAttendance>,
) -> PageResult<AttendanceRecord> {
    auth.require_any(&[Role::Admin, Role::Hr, Role::Manager])?;
    let page = PageRequest::new(q.page, q.per_page);
    let filter = AttendanceFilter {
        employee_id: q.employee_id,
        from: q.from,
        to: q.to,
        status: q.status,
    };
    let rows = db::attendance::list(&state.pool, &filter, page.limit(), page.offset()).await?;
    let total = db::attendance::count(&state.pool, &filter).await?;
    Ok(Json(Paginated::new(rows, page, total)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn on_time_until_workday_start() {
        assert_eq!(attendance_status(t(7, 45), t(8, 0)), "present");
        assert_eq!(attendance_status(t(8, 0), t(8, 0)), "present");
        assert_eq!(attendance_status(t(8, 1), t(8, 0)), "late");
    }
}
