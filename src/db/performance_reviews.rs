use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PerformanceReview;

const REVIEW_FILTER: &str = "WHERE ($1::UUID IS NULL OR employee_id = $1)
      AND ($2::UUID IS NULL OR reviewer_id = $2)
      AND ($3::TEXT IS NULL OR status = $3)
      AND ($4::TEXT IS NULL OR period = $4)";

#[derive(Debug, Default)]
pub struct ReviewFilter {
    pub employee_id: Option<Uuid>,
    pub reviewer_id: Option<Uuid>,
    pub status: Option<String>,
    pub period: Option<String>,
}

pub struct ReviewInput<'a> {
    pub period: &'a str,
    pub overall_rating: Option<i16>,
    pub goals: Option<&'a str>,
    pub strengths: Option<&'a str>,
    pub improvements: Option<&'a str>,
}

pub async fn create(
    pool: &PgPool,
    employee_id: Uuid,
    reviewer_id: Option<Uuid>,
    input: &ReviewInput<'_>,
) -> Result<PerformanceReview, sqlx::Error> {
    sqlx::query_as::<_, PerformanceReview>(
        "INSERT INTO performance_reviews
            (employee_id, reviewer_id, period, overall_rating, goals, strengths, improvements)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(employee_id)
    .bind(reviewer_id)
    .bind(input.period)
    .bind(input.overall_rating)
    .bind(input.goals)
    .bind(input.strengths)
    .bind(input.improvements)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<PerformanceReview>, sqlx::Error> {
    sqlx::query_as::<_, PerformanceReview>("SELECT * FROM performance_reviews WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(
    pool: &PgPool,
    filter: &ReviewFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<PerformanceReview>, sqlx::Error> {
    sqlx::query_as::<_, PerformanceReview>(&format!(
        "SELECT * FROM performance_reviews {REVIEW_FILTER}
         ORDER BY period DESC, created_at DESC LIMIT $5 OFFSET $6"
    ))
    .bind(filter.employee_id)
    .bind(filter.reviewer_id)
    .bind(filter.status.as_deref())
    .bind(filter.period.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, filter: &ReviewFilter) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM performance_reviews {REVIEW_FILTER}"
    ))
    .bind(filter.employee_id)
    .bind(filter.reviewer_id)
    .bind(filter.status.as_deref())
    .bind(filter.period.as_deref())
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// Edits a draft; `None` once the review has left draft.
pub async fn update_draft(
    pool: &PgPool,
    id: Uuid,
    input: &ReviewInput<'_>,
) -> Result<Option<PerformanceReview>, sqlx::Error> {
    sqlx::query_as::<_, PerformanceReview>(
        "UPDATE performance_reviews SET period = $2, overall_rating = $3, goals = $4,
            strengths = $5, improvements = $6, updated_at = now()
         WHERE id = $1 AND status = 'draft' RETURNING *",
    )
    .bind(id)
    .bind(input.period)
    .bind(input.overall_rating)
    .bind(input.goals)
    .bind(input.strengths)
    .bind(input.improvements)
    .fetch_optional(pool)
    .await
}

pub async fn submit(pool: &PgPool, id: Uuid) -> Result<Option<PerformanceReview>, sqlx::Error> {
    sqlx::query_as::<_, PerformanceReview>(
        "UPDATE performance_reviews SET status = 'submitted', submitted_at = now(), updated_at = now()
         WHERE id = $1 AND status = 'draft' AND overall_rating IS NOT NULL RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn acknowledge(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<PerformanceReview>, sqlx::Error> {
    sqlx::query_as::<_, PerformanceReview>(
        "UPDATE performance_reviews SET status = 'acknowledged', acknowledged_at = now(),
            updated_at = now()
         WHERE id = $1 AND status = 'submitted' RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_draft(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM performance_reviews WHERE id = $1 AND status = 'draft'")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}
