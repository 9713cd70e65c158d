use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{RoleRecord, User, UserWithRoles};

pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

const USER_FILTER: &str = "WHERE ($1::TEXT IS NULL OR u.name ILIKE $1 OR u.email ILIKE $1)
      AND ($2::TEXT IS NULL OR EXISTS (
            SELECT 1 FROM user_roles ur JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = u.id AND r.name = $2))
      AND ($3::BOOLEAN IS NULL OR u.is_active = $3)";

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    email: &str,
    password_hash: &str,
    name: &str,
    employee_id: Option<Uuid>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, name, employee_id)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(employee_id)
    .fetch_one(executor)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_employee<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    employee_id: Uuid,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE employee_id = $1")
        .bind(employee_id)
        .fetch_optional(executor)
        .await
}

pub async fn count_all<'e, E: sqlx::PgExecutor<'e>>(executor: E) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(executor)
        .await?;
    Ok(row.0)
}

pub async fn list(
    pool: &PgPool,
    filter: &UserFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT u.* FROM users u {USER_FILTER} ORDER BY u.created_at DESC LIMIT $4 OFFSET $5"
    ))
    .bind(filter.search.as_deref())
    .bind(filter.role.as_deref())
    .bind(filter.is_active)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, filter: &UserFilter) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM users u {USER_FILTER}"))
        .bind(filter.search.as_deref())
        .bind(filter.role.as_deref())
        .bind(filter.is_active)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub struct UserChanges<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub is_active: Option<bool>,
    /// `Some(None)` unlinks the employee.
    pub employee_id: Option<Option<Uuid>>,
}

pub async fn update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    changes: &UserChanges<'_>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET
            name = COALESCE($2, name),
            email = COALESCE($3, email),
            is_active = COALESCE($4, is_active),
            employee_id = CASE WHEN $5 THEN $6 ELSE employee_id END,
            updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(changes.name)
    .bind(changes.email)
    .bind(changes.is_active)
    .bind(changes.employee_id.is_some())
    .bind(changes.employee_id.flatten())
    .fetch_one(executor)
    .await
}

pub async fn update_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn touch_last_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn deactivate_for_employee<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    employee_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET is_active = false, updated_at = now() WHERE employee_id = $1")
        .bind(employee_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

// Roles

pub async fn list_roles(pool: &PgPool) -> Result<Vec<RoleRecord>, sqlx::Error> {
    sqlx::query_as::<_, RoleRecord>("SELECT * FROM roles ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn role_names<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT r.name FROM user_roles ur JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = $1 ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Replace the user's role set. Unknown names are ignored by the join; callers validate first.
pub async fn set_roles(
    tx: &mut sqlx::PgConnection,
    user_id: Uuid,
    roles: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        "INSERT INTO user_roles (user_id, role_id)
         SELECT $1, id FROM roles WHERE name = ANY($2)",
    )
    .bind(user_id)
    .bind(roles)
    .execute(&mut *tx)
    .await?;
    Ok(())
}

/// Attach role names to a page of users with one query.
pub async fn with_roles(
    pool: &PgPool,
    users: Vec<User>,
) -> Result<Vec<UserWithRoles>, sqlx::Error> {
    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let pairs: Vec<(Uuid, String)> = sqlx::query_as(
        "SELECT ur.user_id, r.name FROM user_roles ur JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = ANY($1) ORDER BY r.name",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    Ok(users
        .into_iter()
        .map(|user| {
            let roles = pairs
                .iter()
                .filter(|(uid, _)| *uid == user.id)
                .map(|(_, name)| name.clone())
                .collect();
            UserWithRoles { user, roles }
        })
        .collect())
}
