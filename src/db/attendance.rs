use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::AttendanceRecord;

#[derive(Debug, Default)]
pub struct AttendanceFilter {
    pub employee_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<String>,
}

const ATTENDANCE_FILTER: &str = "WHERE ($1::UUID IS NULL OR employee_id = $1)
      AND ($2::DATE IS NULL OR work_date >= $2)
      AND ($3::DATE IS NULL OR work_date <= $3)
      AND ($4::TEXT IS NULL OR status = $4)";

pub struct ClockIn<'a> {
    pub employee_id: Uuid,
    pub work_date: NaiveDate,
    pub work_location_id: Option<Uuid>,
    pub at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub status: &'a str,
    pub notes: Option<&'a str>,
}

/// Inserts today's record. A second clock-in for the same date hits the unique key.
pub async fn clock_in(pool: &PgPool, c: &ClockIn<'_>) -> Result<AttendanceRecord, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        "INSERT INTO attendance_records
            (employee_id, work_date, work_location_id, clock_in_at, clock_in_latitude,
             clock_in_longitude, status, notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(c.employee_id)
    .bind(c.work_date)
    .bind(c.work_location_id)
    .bind(c.at)
    .bind(c.latitude)
    .bind(c.longitude)
    .bind(c.status)
    .bind(c.notes)
    .fetch_one(pool)
    .await
}

/// Closes the day; `None` when there is no open record for that date.
pub async fn clock_out(
    pool: &PgPool,
    employee_id: Uuid,
    work_date: NaiveDate,
    at: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        "UPDATE attendance_records SET clock_out_at = $3, clock_out_latitude = $4,
            clock_out_longitude = $5
         WHERE employee_id = $1 AND work_date = $2 AND clock_out_at IS NULL
         RETURNING *",
    )
    .bind(employee_id)
    .bind(work_date)
    .bind(at)
    .bind(latitude)
    .bind(longitude)
    .fetch_optional(pool)
    .await
}

pub async fn find_for_date(
    pool: &PgPool,
    employee_id: Uuid,
    work_date: NaiveDate,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        "SELECT * FROM attendance_records WHERE employee_id = $1 AND work_date = $2",
    )
    .bind(employee_id)
    .bind(work_date)
    .fetch_optional(pool)
    .await
}

pub async fn list(
    pool: &PgPool,
    filter: &AttendanceFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT * FROM attendance_records {ATTENDANCE_FILTER}
         ORDER BY work_date DESC, clock_in_at DESC LIMIT $5 OFFSET $6"
    ))
    .bind(filter.employee_id)
    .bind(filter.from)
    .bind(filter.to)
    .bind(filter.status.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, filter: &AttendanceFilter) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM attendance_records {ATTENDANCE_FILTER}"
    ))
    .bind(filter.employee_id)
    .bind(filter.from)
    .bind(filter.to)
    .bind(filter.status.as_deref())
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// `(present, late)` counts for one work date.
pub async fn day_summary(pool: &PgPool, work_date: NaiveDate) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as(
        "SELECT COUNT(*) FILTER (WHERE status = 'present'), COUNT(*) FILTER (WHERE status = 'late')
         FROM attendance_records WHERE work_date = $1",
    )
    .bind(work_date)
    .fetch_one(pool)
    .await
}
