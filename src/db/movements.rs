use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{EmployeeMovement, MovementAction, MovementStatus, Placement};

#[derive(Debug, Default)]
pub struct MovementFilter {
    pub status: Option<String>,
    pub movement_type: Option<String>,
    pub employee_id: Option<Uuid>,
    pub search: Option<String>,
}

const MOVEMENT_FILTER: &str = "WHERE ($1::TEXT IS NULL OR m.status = $1)
      AND ($2::TEXT IS NULL OR m.movement_type = $2)
      AND ($3::UUID IS NULL OR m.employee_id = $3)
      AND ($4::TEXT IS NULL OR e.full_name ILIKE $4 OR e.employee_number ILIKE $4)";

pub struct NewMovement<'a> {
    pub employee_id: Uuid,
    pub movement_type: &'a str,
    pub status: MovementStatus,
    pub effective_date: NaiveDate,
    pub old: Placement,
    pub new: Placement,
    pub reason: Option<&'a str>,
    pub requested_by: Uuid,
}

fn source_statuses(action: MovementAction) -> Vec<&'static str> {
    MovementStatus::sources(action)
        .iter()
        .map(MovementStatus::as_str)
        .collect()
}

fn target_status(action: MovementAction) -> &'static str {
    action.target().map_or("", |status| status.as_str())
}

pub async fn create(pool: &PgPool, m: &NewMovement<'_>) -> Result<EmployeeMovement, sqlx::Error> {
    sqlx::query_as::<_, EmployeeMovement>(
        "INSERT INTO employee_movements (
            employee_id, movement_type, status, effective_date,
            old_company_id, old_department_id, old_position_id, old_salary,
            new_company_id, new_department_id, new_position_id, new_salary,
            reason, requested_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
         RETURNING *",
    )
    .bind(m.employee_id)
    .bind(m.movement_type)
    .bind(m.status.as_str())
    .bind(m.effective_date)
    .bind(m.old.company_id)
    .bind(m.old.department_id)
    .bind(m.old.position_id)
    .bind(m.old.salary)
    .bind(m.new.company_id)
    .bind(m.new.department_id)
    .bind(m.new.position_id)
    .bind(m.new.salary)
    .bind(m.reason)
    .bind(m.requested_by)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<EmployeeMovement>, sqlx::Error> {
    sqlx::query_as::<_, EmployeeMovement>("SELECT * FROM employee_movements WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(
    pool: &PgPool,
    filter: &MovementFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<EmployeeMovement>, sqlx::Error> {
    sqlx::query_as::<_, EmployeeMovement>(&format!(
        "SELECT m.* FROM employee_movements m JOIN employees e ON e.id = m.employee_id
         {MOVEMENT_FILTER} ORDER BY m.created_at DESC LIMIT $5 OFFSET $6"
    ))
    .bind(filter.status.as_deref())
    .bind(filter.movement_type.as_deref())
    .bind(filter.employee_id)
    .bind(filter.search.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, filter: &MovementFilter) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM employee_movements m JOIN employees e ON e.id = m.employee_id
         {MOVEMENT_FILTER}"
    ))
    .bind(filter.status.as_deref())
    .bind(filter.movement_type.as_deref())
    .bind(filter.employee_id)
    .bind(filter.search.as_deref())
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn count_by_status(pool: &PgPool, status: MovementStatus) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM employee_movements WHERE status = $1")
        .bind(status.as_str())
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

// Transitions. Each one only matches rows still in an allowed source status, so
// `None` means the movement is missing or another request moved it first.

pub async fn submit(pool: &PgPool, id: Uuid) -> Result<Option<EmployeeMovement>, sqlx::Error> {
    sqlx::query_as::<_, EmployeeMovement>(
        "UPDATE employee_movements SET status = $3, updated_at = now()
         WHERE id = $1 AND status = ANY($2) RETURNING *",
    )
    .bind(id)
    .bind(source_statuses(MovementAction::Submit))
    .bind(target_status(MovementAction::Submit))
    .fetch_optional(pool)
    .await
}

pub async fn approve(
    pool: &PgPool,
    id: Uuid,
    approver: Uuid,
    notes: Option<&str>,
) -> Result<Option<EmployeeMovement>, sqlx::Error> {
    sqlx::query_as::<_, EmployeeMovement>(
        "UPDATE employee_movements SET status = $5, approved_by = $3,
            approved_at = now(), approval_notes = $4, updated_at = now()
         WHERE id = $1 AND status = ANY($2) RETURNING *",
    )
    .bind(id)
    .bind(source_statuses(MovementAction::Approve))
    .bind(approver)
    .bind(notes)
    .bind(target_status(MovementAction::Approve))
    .fetch_optional(pool)
    .await
}

pub async fn reject(
    pool: &PgPool,
    id: Uuid,
    rejecter: Uuid,
    reason: &str,
) -> Result<Option<EmployeeMovement>, sqlx::Error> {
    sqlx::query_as::<_, EmployeeMovement>(
        "UPDATE employee_movements SET status = $5, rejected_by = $3,
            rejected_at = now(), rejection_reason = $4, updated_at = now()
         WHERE id = $1 AND status = ANY($2) RETURNING *",
    )
    .bind(id)
    .bind(source_statuses(MovementAction::Reject))
    .bind(rejecter)
    .bind(reason)
    .bind(target_status(MovementAction::Reject))
    .fetch_optional(pool)
    .await
}

pub async fn cancel(
    pool: &PgPool,
    id: Uuid,
    cancelled_by: Uuid,
    reason: Option<&str>,
) -> Result<Option<EmployeeMovement>, sqlx::Error> {
    sqlx::query_as::<_, EmployeeMovement>(
        "UPDATE employee_movements SET status = $5, cancelled_by = $3,
            cancelled_at = now(), cancellation_reason = $4, updated_at = now()
         WHERE id = $1 AND status = ANY($2) AND NOT is_applied RETURNING *",
    )
    .bind(id)
    .bind(source_statuses(MovementAction::Cancel))
    .bind(cancelled_by)
    .bind(reason)
    .bind(target_status(MovementAction::Cancel))
    .fetch_optional(pool)
    .await
}

/// Deletes a movement that has not been decided yet. Returns false when nothing matched.
pub async fn delete_undecided(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM employee_movements WHERE id = $1 AND status = ANY($2)")
        .bind(id)
        .bind(source_statuses(MovementAction::Delete))
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Copy the approved placement onto the employee and mark the movement applied,
/// all in one transaction. Both rows are locked for the duration.
pub async fn apply(
    pool: &PgPool,
    id: Uuid,
    applied_by: Uuid,
) -> Result<Option<EmployeeMovement>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let movement = sqlx::query_as::<_, EmployeeMovement>(
        "SELECT * FROM employee_movements WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(movement) = movement.filter(EmployeeMovement::can_apply) else {
        tx.rollback().await?;
        return Ok(None);
    };

    sqlx::query("SELECT id FROM employees WHERE id = $1 FOR UPDATE")
        .bind(movement.employee_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "UPDATE employees SET
            company_id = COALESCE($2, company_id),
            department_id = COALESCE($3, department_id),
            position_id = COALESCE($4, position_id),
            base_salary = COALESCE($5, base_salary),
            updated_at = now()
         WHERE id = $1",
    )
    .bind(movement.employee_id)
    .bind(movement.new_company_id)
    .bind(movement.new_department_id)
    .bind(movement.new_position_id)
    .bind(movement.new_salary)
    .execute(&mut *tx)
    .await?;

    let applied = sqlx::query_as::<_, EmployeeMovement>(
        "UPDATE employee_movements SET status = $3, is_applied = true,
            applied_by = $2, applied_at = now(), updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(applied_by)
    .bind(target_status(MovementAction::Apply))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(applied))
}
