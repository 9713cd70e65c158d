use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Position;

const POSITION_FILTER: &str = "WHERE ($1::TEXT IS NULL OR name ILIKE $1)
      AND ($2::UUID IS NULL OR company_id = $2)
      AND ($3::UUID IS NULL OR department_id = $3)";

pub struct PositionInput<'a> {
    pub company_id: Uuid,
    pub department_id: Option<Uuid>,
    pub name: &'a str,
    pub level: i32,
    pub description: Option<&'a str>,
    pub is_active: bool,
}

pub async fn create(pool: &PgPool, input: &PositionInput<'_>) -> Result<Position, sqlx::Error> {
    sqlx::query_as::<_, Position>(
        "INSERT INTO positions (company_id, department_id, name, level, description, is_active)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(input.company_id)
    .bind(input.department_id)
    .bind(input.name)
    .bind(input.level)
    .bind(input.description)
    .bind(input.is_active)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Position>, sqlx::Error> {
    sqlx::query_as::<_, Position>("SELECT * FROM positions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(
    pool: &PgPool,
    search: Option<&str>,
    company_id: Option<Uuid>,
    department_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Position>, sqlx::Error> {
    sqlx::query_as::<_, Position>(&format!(
        "SELECT * FROM positions {POSITION_FILTER} ORDER BY level DESC, name LIMIT $4 OFFSET $5"
    ))
    .bind(search)
    .bind(company_id)
    .bind(department_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(
    pool: &PgPool,
    search: Option<&str>,
    company_id: Option<Uuid>,
    department_id: Option<Uuid>,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM positions {POSITION_FILTER}"))
        .bind(search)
        .bind(company_id)
        .bind(department_id)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    input: &PositionInput<'_>,
) -> Result<Position, sqlx::Error> {
    sqlx::query_as::<_, Position>(
        "UPDATE positions SET company_id = $2, department_id = $3, name = $4, level = $5,
            description = $6, is_active = $7, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(input.company_id)
    .bind(input.department_id)
    .bind(input.name)
    .bind(input.level)
    .bind(input.description)
    .bind(input.is_active)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM positions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
