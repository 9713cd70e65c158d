use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CompanyHeadcount {
    pub company_id: Uuid,
    pub company_name: String,
    pub count: i64,
}

pub async fn headcount_by_status(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
    sqlx::query_as::<_, StatusCount>(
        "SELECT employment_status AS status, COUNT(*) AS count FROM employees
         GROUP BY employment_status ORDER BY employment_status",
    )
    .fetch_all(pool)
    .await
}

/// Working headcount (active and probation) per company.
pub async fn headcount_by_company(pool: &PgPool) -> Result<Vec<CompanyHeadcount>, sqlx::Error> {
    sqlx::query_as::<_, CompanyHeadcount>(
        "SELECT c.id AS company_id, c.name AS company_name, COUNT(e.id) AS count
         FROM companies c
         LEFT JOIN employees e ON e.company_id = c.id
             AND e.employment_status IN ('active', 'probation')
         GROUP BY c.id, c.name ORDER BY c.name",
    )
    .fetch_all(pool)
    .await
}

pub async fn hires_since(pool: &PgPool, since: NaiveDate) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM employees WHERE hire_date >= $1")
        .bind(since)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}
