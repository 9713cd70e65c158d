use sqlx::PgPool;
use uuid::Uuid;

use crate::models::WorkLocation;

pub struct WorkLocationInput<'a> {
    pub company_id: Uuid,
    pub name: &'a str,
    pub address: Option<&'a str>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: i32,
    pub is_active: bool,
}

pub async fn create(
    pool: &PgPool,
    input: &WorkLocationInput<'_>,
) -> Result<WorkLocation, sqlx::Error> {
    sqlx::query_as::<_, WorkLocation>(
        "INSERT INTO work_locations (company_id, name, address, latitude, longitude, radius_meters, is_active)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(input.company_id)
    .bind(input.name)
    .bind(input.address)
    .bind(input.latitude)
    .bind(input.longitude)
    .bind(input.radius_meters)
    .bind(input.is_active)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<WorkLocation>, sqlx::Error> {
    sqlx::query_as::<_, WorkLocation>("SELECT * FROM work_locations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(
    pool: &PgPool,
    company_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<WorkLocation>, sqlx::Error> {
    sqlx::query_as::<_, WorkLocation>(
        "SELECT * FROM work_locations WHERE ($1::UUID IS NULL OR company_id = $1)
         ORDER BY name LIMIT $2 OFFSET $3",
    )
    .bind(company_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, company_id: Option<Uuid>) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM work_locations WHERE ($1::UUID IS NULL OR company_id = $1)",
    )
    .bind(company_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// Active locations of a company, used to resolve a clock-in geofence.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    input: &WorkLocationInput<'_>,
) -> Result<WorkLocation, sqlx::Error> {
    sqlx::query_as::<_, WorkLocation>(
        "UPDATE work_locations SET company_id = $2, name = $3, address = $4, latitude = $5,
            longitude = $6, radius_meters = $7, is_active = $8, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(input.company_id)
    .bind(input.name)
    .bind(input.address)
    .bind(input.latitude)
    .bind(input.longitude)
    .bind(input.radius_meters)
    .bind(input.is_active)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM work_locations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
