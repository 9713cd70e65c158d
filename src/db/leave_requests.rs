use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::LeaveRequest;

#[derive(Debug, Default)]
pub struct LeaveFilter {
    pub employee_id: Option<Uuid>,
    pub status: Option<String>,
    pub leave_type: Option<String>,
}

const LEAVE_FILTER: &str = "WHERE ($1::UUID IS NULL OR employee_id = $1)
      AND ($2::TEXT IS NULL OR status = $2)
      AND ($3::TEXT IS NULL OR leave_type = $3)";

pub struct NewLeave<'a> {
    pub employee_id: Uuid,
    pub leave_type: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i32,
    pub reason: &'a str,
}

pub async fn create(pool: &PgPool, l: &NewLeave<'_>) -> Result<LeaveRequest, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>(
        "INSERT INTO leave_requests (employee_id, leave_type, start_date, end_date, days, reason)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(l.employee_id)
    .bind(l.leave_type)
    .bind(l.start_date)
    .bind(l.end_date)
    .bind(l.days)
    .bind(l.reason)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>("SELECT * FROM leave_requests WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(
    pool: &PgPool,
    filter: &LeaveFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT * FROM leave_requests {LEAVE_FILTER} ORDER BY start_date DESC LIMIT $4 OFFSET $5"
    ))
    .bind(filter.employee_id)
    .bind(filter.status.as_deref())
    .bind(filter.leave_type.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, filter: &LeaveFilter) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM leave_requests {LEAVE_FILTER}"))
        .bind(filter.employee_id)
        .bind(filter.status.as_deref())
        .bind(filter.leave_type.as_deref())
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

/// Whether a live (pending or approved) request overlaps the date range.
pub async fn overlaps(
    pool: &PgPool,
    employee_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (
             SELECT 1 FROM leave_requests
             WHERE employee_id = $1 AND status IN ('pending', 'approved')
               AND start_date <= $3 AND end_date >= $2)",
    )
    .bind(employee_id)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// `(approved_days, pending_days)` of annual leave starting in `year`.
pub async fn annual_usage(
    pool: &PgPool,
    employee_id: Uuid,
    year: i32,
) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as(
        "SELECT COALESCE(SUM(days) FILTER (WHERE status = 'approved'), 0)::BIGINT,
                COALESCE(SUM(days) FILTER (WHERE status = 'pending'), 0)::BIGINT
         FROM leave_requests
         WHERE employee_id = $1 AND leave_type = 'annual'
           AND EXTRACT(YEAR FROM start_date)::INT = $2",
    )
    .bind(employee_id)
    .bind(year)
    .fetch_one(pool)
    .await
}

/// Records a decision on a pending request; `None` when it was no longer pending.
pub async fn decide(
    pool: &PgPool,
    id: Uuid,
    status: &str,
    reviewer: Uuid,
    notes: Option<&str>,
) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>(
        "UPDATE leave_requests SET status = $2, reviewed_by = $3, reviewed_at = now(),
            review_notes = $4, updated_at = now()
         WHERE id = $1 AND status = 'pending' RETURNING *",
    )
    .bind(id)
    .bind(status)
    .bind(reviewer)
    .bind(notes)
    .fetch_optional(pool)
    .await
}

pub async fn cancel(pool: &PgPool, id: Uuid) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>(
        "UPDATE leave_requests SET status = 'cancelled', updated_at = now()
         WHERE id = $1 AND status = 'pending' RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn count_pending(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leave_requests WHERE status = 'pending'")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}
