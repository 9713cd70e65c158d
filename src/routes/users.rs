use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::auth::roles::Role;
use crate::db;
use crate::db::users::{UserChanges, UserFilter};
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{RoleRecord, UserWithRoles};
use crate::pagination::{search_pattern, Envelope, PageRequest, Paginated};
use crate::routes::{deleted, ApiResult, PageResult};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ListUsers {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub employee_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub roles: Option<Vec<String>>,
    /// Explicit `null` unlinks the employee; absence leaves it unchanged.
    #[serde(default, deserialize_with = "double_option")]
    pub employee_id: Option<Option<Uuid>>,
}

#[derive(Deserialize)]
pub struct ResetUserPassword {
    pub password: String,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}

/// Normalise and check role names against the known set.
fn validate_roles(roles: &[String]) -> Result<Vec<String>, AppError> {
    let mut out = Vec::with_capacity(roles.len());
    for name in roles {
        let role = Role::parse(name.trim())
            .ok_or_else(|| AppError::Validation(format!("Unknown role: {name}")))?;
        if !out.contains(&role.to_string()) {
            out.push(role.to_string());
        }
    }
    if out.is_empty() {
        out.push(Role::Employee.to_string());
    }
    Ok(out)
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') || email.len() > 254 {
        return Err(AppError::Validation("A valid email address is required".to_string()));
    }
    Ok(())
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<ListUsers>,
) -> PageResult<UserWithRoles> {
    auth.require_admin()?;
    let page = PageRequest::new(q.page, q.per_page);
    let filter = UserFilter {
        search: search_pattern(q.search.as_deref()),
        role: q.role,
        is_active: q.is_active,
    };
    let users = db::users::list(&state.pool, &filter, page.limit(), page.offset()).await?;
    let total = db::users::count(&state.pool, &filter).await?;
    let users = db::users::with_roles(&state.pool, users).await?;
    Ok(Json(Paginated::new(users, page, total)))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateUser>,
) -> ApiResult<UserWithRoles> {
    auth.require_admin()?;
    validate_email(&req.email)?;
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    let roles = validate_roles(&req.roles)?;
    let pw_hash = password::hash_validated(&req.password)?;

    if let Some(employee_id) = req.employee_id {
        db::employees::find_by_id(&state.pool, employee_id)
            .await?
            .ok_or_else(|| AppError::Validation("Employee does not exist".to_string()))?;
    }

    let mut tx = state.pool.begin().await?;
    let user = db::users::create(
        &mut *tx,
        req.email.trim(),
        &pw_hash,
        req.name.trim(),
        req.employee_id,
    )
    .await
    .map_err(|e| AppError::from_write(e, "Email or employee is already linked to a user"))?;
    db::users::set_roles(&mut tx, user.id, &roles).await?;
    tx.commit().await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.created",
        "user",
        Some(user.id),
        Some(serde_json::json!({ "roles": roles })),
    )
    .await;

    if let Some(mailer) = state.system_mailer.clone() {
        let (email, name, base_url) = (
            user.email.clone(),
            user.name.clone(),
            state.config.base_url.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = mailer.send_account_created(&email, &name, &base_url).await {
                tracing::warn!("Failed to send welcome email: {e}");
            }
        });
    }

    Ok(Json(Envelope::new(UserWithRoles { user, roles })))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<UserWithRoles> {
    auth.require_admin()?;
    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let roles = db::users::role_names(&state.pool, id).await?;
    Ok(Json(Envelope::new(UserWithRoles { user, roles })))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUser>,
) -> ApiResult<UserWithRoles> {
    auth.require_admin()?;
    if let Some(email) = &req.email {
        validate_email(email)?;
    }
    let roles = req.roles.as_deref().map(validate_roles).transpose()?;
    if id == auth.user_id && req.is_active == Some(false) {
        return Err(AppError::BadRequest("You cannot deactivate your own account".to_string()));
    }

    let changes = UserChanges {
        name: req.name.as_deref().map(str::trim),
        email: req.email.as_deref().map(str::trim),
        is_active: req.is_active,
        employee_id: req.employee_id,
    };

    let mut tx = state.pool.begin().await?;
    let user = db::users::update(&mut *tx, id, &changes)
        .await
        .map_err(|e| AppError::from_write(e, "Email or employee is already linked to a user"))?;
    if let Some(roles) = &roles {
        db::users::set_roles(&mut tx, id, roles).await?;
    }
    if req.is_active == Some(false) {
        db::refresh_tokens::delete_all_for_user(&mut *tx, id).await?;
    }
    tx.commit().await?;

    let roles = db::users::role_names(&state.pool, id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.updated",
        "user",
        Some(id),
        Some(serde_json::json!({ "roles": roles, "is_active": user.is_active })),
    )
    .await;

    Ok(Json(Envelope::new(UserWithRoles { user, roles })))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_admin()?;
    if id == auth.user_id {
        return Err(AppError::BadRequest("You cannot delete your own account".to_string()));
    }
    if db::users::delete(&state.pool, id).await? == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.deleted",
        "user",
        Some(id),
        None,
    )
    .await;
    Ok(deleted())
}

pub async fn reset_password(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ResetUserPassword>,
) -> ApiResult<serde_json::Value> {
    auth.require_admin()?;
    let pw_hash = password::hash_validated(&req.password)?;
    db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    db::users::update_password(&state.pool, id, &pw_hash).await?;
    db::refresh_tokens::delete_all_for_user(&state.pool, id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.password_reset",
        "user",
        Some(id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(
        serde_json::json!({ "message": "Password reset successfully" }),
    )))
}

pub async fn list_roles(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> ApiResult<Vec<RoleRecord>> {
    let roles = db::users::list_roles(&state.pool).await?;
    Ok(Json(Envelope::new(roles)))
}
