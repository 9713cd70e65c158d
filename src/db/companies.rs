use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Company;

pub struct CompanyFilter {
    pub search: Option<String>,
    pub company_type: Option<String>,
    pub parent_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

const COMPANY_FILTER: &str = "WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR code ILIKE $1)
      AND ($2::TEXT IS NULL OR company_type = $2)
      AND ($3::UUID IS NULL OR parent_id = $3)
      AND ($4::BOOLEAN IS NULL OR is_active = $4)";

pub struct CompanyInput<'a> {
    pub name: &'a str,
    pub code: &'a str,
    pub company_type: &'a str,
    pub parent_id: Option<Uuid>,
    pub address: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub is_active: bool,
}

pub async fn create(pool: &PgPool, input: &CompanyInput<'_>) -> Result<Company, sqlx::Error> {
    sqlx::query_as::<_, Company>(
        "INSERT INTO companies (name, code, company_type, parent_id, address, phone, email, is_active)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(input.name)
    .bind(input.code)
    .bind(input.company_type)
    .bind(input.parent_id)
    .bind(input.address)
    .bind(input.phone)
    .bind(input.email)
    .bind(input.is_active)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Company>, sqlx::Error> {
    sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(
    pool: &PgPool,
    filter: &CompanyFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Company>, sqlx::Error> {
    sqlx::query_as::<_, Company>(&format!(
        "SELECT * FROM companies {COMPANY_FILTER} ORDER BY name LIMIT $5 OFFSET $6"
    ))
    .bind(filter.search.as_deref())
    .bind(filter.company_type.as_deref())
    .bind(filter.parent_id)
    .bind(filter.is_active)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, filter: &CompanyFilter) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM companies {COMPANY_FILTER}"))
        .bind(filter.search.as_deref())
        .bind(filter.company_type.as_deref())
        .bind(filter.parent_id)
        .bind(filter.is_active)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    input: &CompanyInput<'_>,
) -> Result<Company, sqlx::Error> {
    sqlx::query_as::<_, Company>(
        "UPDATE companies SET name = $2, code = $3, company_type = $4, parent_id = $5,
            address = $6, phone = $7, email = $8, is_active = $9, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(input.name)
    .bind(input.code)
    .bind(input.company_type)
    .bind(input.parent_id)
    .bind(input.address)
    .bind(input.phone)
    .bind(input.email)
    .bind(input.is_active)
    .fetch_one(pool)
    .await
}

/// True when `candidate` is `id` itself or one of its descendants.
pub async fn is_descendant(pool: &PgPool, id: Uuid, candidate: Uuid) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "WITH RECURSIVE tree AS (
             SELECT id FROM companies WHERE id = $1
             UNION
             SELECT c.id FROM companies c JOIN tree t ON c.parent_id = t.id
         )
         SELECT EXISTS (SELECT 1 FROM tree WHERE id = $2)",
    )
    .bind(id)
    .bind(candidate)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn employee_count(pool: &PgPool, id: Uuid) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM employees WHERE company_id = $1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM companies WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
