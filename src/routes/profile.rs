use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::crypto;
use crate::db;
use crate::db::employees::ProfileFields;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Disclosure, EmployeeView, UserWithRoles};
use crate::pagination::Envelope;
use crate::routes::{non_blank, ApiResult};
use crate::state::SharedState;

#[derive(Serialize, Deserialize)]
pub struct Profile {
    pub user: UserWithRoles,
    pub employee: Option<EmployeeView>,
}

/// The only employee fields a user may change about themself.
#[derive(Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

fn pick(new: Option<String>, old: Option<String>) -> Option<String> {
    match new {
        Some(v) => non_blank(Some(&v)).map(str::to_string),
        None => old,
    }
}

pub async fn get(auth: AuthUser, State(state): State<SharedState>) -> ApiResult<Profile> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
    let roles = db::users::role_names(&state.pool, user.id).await?;

    let employee = match user.employee_id {
        Some(id) => db::employees::find_by_id(&state.pool, id)
            .await?
            .map(|e| EmployeeView::build(e, &state.config.encryption_key, Disclosure::Full)),
        None => None,
    };

    Ok(Json(Envelope::new(Profile {
        user: UserWithRoles { user, roles },
        employee,
    })))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<UpdateProfile>,
) -> ApiResult<EmployeeView> {
    let employee_id = auth.require_employee()?;
    let current = db::employees::find_by_id(&state.pool, employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    let bank_account_encrypted = match req.bank_account_number {
        Some(v) => crypto::encrypt_opt(Some(v.as_str()), &state.config.encryption_key)
            .map_err(AppError::Internal)?,
        None => current.bank_account_encrypted,
    };
    let fields = ProfileFields {
        phone: pick(req.phone, current.phone),
        address: pick(req.address, current.address),
        bank_name: pick(req.bank_name, current.bank_name),
        bank_account_encrypted,
        emergency_contact_name: pick(req.emergency_contact_name, current.emergency_contact_name),
        emergency_contact_phone: pick(
            req.emergency_contact_phone,
            current.emergency_contact_phone,
        ),
    };

    let employee = db::employees::update_profile(&state.pool, employee_id, &fields).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "profile.updated",
        "employee",
        Some(employee_id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(EmployeeView::build(
        employee,
        &state.config.encryption_key,
        Disclosure::Full,
    ))))
}
