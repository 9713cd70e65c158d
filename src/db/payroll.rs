use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{PtkpStatus, TaxBracket, TerConfig};

// TER configs

pub async fn list_ter(
    pool: &PgPool,
    category: Option<&str>,
) -> Result<Vec<TerConfig>, sqlx::Error> {
    sqlx::query_as::<_, TerConfig>(
        "SELECT * FROM ter_configs WHERE ($1::TEXT IS NULL OR category = $1)
         ORDER BY category, min_income",
    )
    .bind(category)
    .fetch_all(pool)
    .await
}

pub async fn find_ter(pool: &PgPool, id: Uuid) -> Result<Option<TerConfig>, sqlx::Error> {
    sqlx::query_as::<_, TerConfig>("SELECT * FROM ter_configs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create_ter(
    pool: &PgPool,
    category: &str,
    min_income: i64,
    max_income: Option<i64>,
    rate_bps: i32,
) -> Result<TerConfig, sqlx::Error> {
    sqlx::query_as::<_, TerConfig>(
        "INSERT INTO ter_configs (category, min_income, max_income, rate_bps)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(category)
    .bind(min_income)
    .bind(max_income)
    .bind(rate_bps)
    .fetch_one(pool)
    .await
}

pub async fn update_ter(
    pool: &PgPool,
    id: Uuid,
    category: &str,
    min_income: i64,
    max_income: Option<i64>,
    rate_bps: i32,
) -> Result<TerConfig, sqlx::Error> {
    sqlx::query_as::<_, TerConfig>(
        "UPDATE ter_configs SET category = $2, min_income = $3, max_income = $4, rate_bps = $5,
            updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(category)
    .bind(min_income)
    .bind(max_income)
    .bind(rate_bps)
    .fetch_one(pool)
    .await
}

pub async fn delete_ter(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM ter_configs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

// Tax brackets

pub async fn list_brackets(
    pool: &PgPool,
    effective_year: Option<i32>,
) -> Result<Vec<TaxBracket>, sqlx::Error> {
    sqlx::query_as::<_, TaxBracket>(
        "SELECT * FROM tax_brackets WHERE ($1::INT IS NULL OR effective_year = $1)
         ORDER BY effective_year DESC, min_income",
    )
    .bind(effective_year)
    .fetch_all(pool)
    .await
}

/// Brackets of the most recent year not after `year`.
pub async fn brackets_for_year(pool: &PgPool, year: i32) -> Result<Vec<TaxBracket>, sqlx::Error> {
    sqlx::query_as::<_, TaxBracket>(
        "SELECT * FROM tax_brackets
         WHERE effective_year = (SELECT MAX(effective_year) FROM tax_brackets WHERE effective_year <= $1)
         ORDER BY min_income",
    )
    .bind(year)
    .fetch_all(pool)
    .await
}

pub async fn create_bracket(
    pool: &PgPool,
    min_income: i64,
    max_income: Option<i64>,
    rate_bps: i32,
    effective_year: i32,
) -> Result<TaxBracket, sqlx::Error> {
    sqlx::query_as::<_, TaxBracket>(
        "INSERT INTO tax_brackets (min_income, max_income, rate_bps, effective_year)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(min_income)
    .bind(max_income)
    .bind(rate_bps)
    .bind(effective_year)
    .fetch_one(pool)
    .await
}

pub async fn update_bracket(
    pool: &PgPool,
    id: Uuid,
    min_income: i64,
    max_income: Option<i64>,
    rate_bps: i32,
    effective_year: i32,
) -> Result<TaxBracket, sqlx::Error> {
    sqlx::query_as::<_, TaxBracket>(
        "UPDATE tax_brackets SET min_income = $2, max_income = $3, rate_bps = $4,
            effective_year = $5, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(min_income)
    .bind(max_income)
    .bind(rate_bps)
    .bind(effective_year)
    .fetch_one(pool)
    .await
}

pub async fn delete_bracket(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tax_brackets WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

// PTKP statuses

pub async fn list_ptkp(pool: &PgPool) -> Result<Vec<PtkpStatus>, sqlx::Error> {
    sqlx::query_as::<_, PtkpStatus>("SELECT * FROM ptkp_statuses ORDER BY code")
        .fetch_all(pool)
        .await
}

pub async fn find_ptkp(pool: &PgPool, id: Uuid) -> Result<Option<PtkpStatus>, sqlx::Error> {
    sqlx::query_as::<_, PtkpStatus>("SELECT * FROM ptkp_statuses WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_ptkp_by_code(
    pool: &PgPool,
    code: &str,
) -> Result<Option<PtkpStatus>, sqlx::Error> {
    sqlx::query_as::<_, PtkpStatus>("SELECT * FROM ptkp_statuses WHERE code = $1")
        .bind(code)
        .fetch_optional(pool)
        .await
}

pub async fn create_ptkp(
    pool: &PgPool,
    code: &str,
    description: &str,
    annual_amount: i64,
    ter_category: &str,
) -> Result<PtkpStatus, sqlx::Error> {
    sqlx::query_as::<_, PtkpStatus>(
        "INSERT INTO ptkp_statuses (code, description, annual_amount, ter_category)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(code)
    .bind(description)
    .bind(annual_amount)
    .bind(ter_category)
    .fetch_one(pool)
    .await
}

pub async fn update_ptkp(
    pool: &PgPool,
    id: Uuid,
    code: &str,
    description: &str,
    annual_amount: i64,
    ter_category: &str,
) -> Result<PtkpStatus, sqlx::Error> {
    sqlx::query_as::<_, PtkpStatus>(
        "UPDATE ptkp_statuses SET code = $2, description = $3, annual_amount = $4,
            ter_category = $5, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(code)
    .bind(description)
    .bind(annual_amount)
    .bind(ter_category)
    .fetch_one(pool)
    .await
}

pub async fn delete_ptkp(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM ptkp_statuses WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
