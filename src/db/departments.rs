use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Department;

const DEPARTMENT_FILTER: &str = "WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR code ILIKE $1)
      AND ($2::UUID IS NULL OR company_id = $2)";

pub struct DepartmentInput<'a> {
    pub company_id: Uuid,
    pub name: &'a str,
    pub code: Option<&'a str>,
    pub description: Option<&'a str>,
    pub is_active: bool,
}

pub async fn create(pool: &PgPool, input: &DepartmentInput<'_>) -> Result<Department, sqlx::Error> {
    sqlx::query_as::<_, Department>(
        "INSERT INTO departments (company_id, name, code, description, is_active)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(input.company_id)
    .bind(input.name)
    .bind(input.code)
    .bind(input.description)
    .bind(input.is_active)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(
    pool: &PgPool,
    search: Option<&str>,
    company_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>(&format!(
        "SELECT * FROM departments {DEPARTMENT_FILTER} ORDER BY name LIMIT $3 OFFSET $4"
    ))
    .bind(search)
    .bind(company_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(
    pool: &PgPool,
    search: Option<&str>,
    company_id: Option<Uuid>,
) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM departments {DEPARTMENT_FILTER}");
    let row: (i64,) = sqlx::query_as(&sql)
        .bind(search)
        .bind(company_id)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    input: &DepartmentInput<'_>,
) -> Result<Department, sqlx::Error> {
    sqlx::query_as::<_, Department>(
        "UPDATE departments SET company_id = $2, name = $3, code = $4, description = $5,
            is_active = $6, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(input.company_id)
    .bind(input.name)
    .bind(input.code)
    .bind(input.description)
    .bind(input.is_active)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM departments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
