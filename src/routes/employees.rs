use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::roles::Role;
use crate::crypto;
use crate::db;
use crate::db::employees::{EmployeeFilter, EmployeeInput};
use crate::db::movements::MovementFilter;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{
    Disclosure, EmployeeDocument, EmployeeMovement, EmployeeView, EmploymentStatus,
    EMPLOYMENT_TYPES,
};
use crate::pagination::{search_pattern, Envelope, PageRequest, Paginated};
use crate::routes::{deleted, non_blank, ApiResult, PageResult};
use crate::state::SharedState;

/// Roles that may browse the employee directory.
const DIRECTORY_ROLES: [Role; 4] = [Role::Admin, Role::Hr, Role::Manager, Role::Ceo];

const DUPLICATE_EMPLOYEE: &str = "An employee with this number or email already exists";

#[derive(Default, Serialize, Deserialize)]
pub struct ListEmployees {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub company_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub position_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub employment_status: Option<String>,
}

#[derive(Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create and update share one body; on update every field is optional and
/// absent fields keep their stored value.
#[derive(Default, Serialize, Deserialize)]
pub struct EmployeeRequest {
    pub employee_number: Option<String>,
    pub company_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub position_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub work_location_id: Option<Uuid>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub employment_status: Option<String>,
    pub employment_type: Option<String>,
    pub base_salary: Option<i64>,
    pub ptkp_code: Option<String>,
    /// Plaintext NPWP; an empty string clears it.
    pub tax_id: Option<String>,
    pub bank_name: Option<String>,
    /// Plaintext account number; an empty string clears it.
    pub bank_account_number: Option<String>,
    pub bpjs_kesehatan_number: Option<String>,
    pub bpjs_ketenagakerjaan_number: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

fn missing(field: &str) -> AppError {
    AppError::Validation(format!("{field} is required"))
}

fn owned(value: Option<String>) -> Option<String> {
    non_blank(value.as_deref()).map(str::to_string)
}

/// Replace `slot` when the request carries the field; blank clears it.
fn merge(slot: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value {
        *slot = owned(Some(v));
    }
}

impl EmployeeRequest {
    fn into_new(self, key: &str) -> Result<EmployeeInput, AppError> {
        let base = EmployeeInput {
            employee_number: owned(self.employee_number.clone())
                .ok_or_else(|| missing("employee_number"))?,
            company_id: self.company_id.ok_or_else(|| missing("company_id"))?,
            department_id: None,
            position_id: None,
            manager_id: None,
            work_location_id: None,
            full_name: owned(self.full_name.clone()).ok_or_else(|| missing("full_name"))?,
            email: owned(self.email.clone()).ok_or_else(|| missing("email"))?,
            phone: None,
            gender: None,
            birth_date: None,
            address: None,
            hire_date: self.hire_date.ok_or_else(|| missing("hire_date"))?,
            employment_status: EmploymentStatus::Active.as_str().to_string(),
            employment_type: EMPLOYMENT_TYPES[0].to_string(),
            base_salary: 0,
            ptkp_code: None,
            tax_id_encrypted: None,
            bank_name: None,
            bank_account_encrypted: None,
            bpjs_kesehatan_number: None,
            bpjs_ketenagakerjaan_number: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
        };
        self.apply_to(base, key)
    }

    fn apply_to(self, mut e: EmployeeInput, key: &str) -> Result<EmployeeInput, AppError> {
        if let Some(v) = owned(self.employee_number) {
            e.employee_number = v;
        }
        if let Some(v) = self.company_id {
            e.company_id = v;
        }
        e.department_id = self.department_id.or(e.department_id);
        e.position_id = self.position_id.or(e.position_id);
        e.manager_id = self.manager_id.or(e.manager_id);
        e.work_location_id = self.work_location_id.or(e.work_location_id);
        if let Some(v) = owned(self.full_name) {
            e.full_name = v;
        }
        if let Some(v) = owned(self.email) {
            e.email = v;
        }
        merge(&mut e.phone, self.phone);
        merge(&mut e.gender, self.gender);
        e.birth_date = self.birth_date.or(e.birth_date);
        merge(&mut e.address, self.address);
        if let Some(v) = self.hire_date {
            e.hire_date = v;
        }
        if let Some(v) = self.employment_status {
            e.employment_status = v;
        }
        if let Some(v) = self.employment_type {
            e.employment_type = v;
        }
        if let Some(v) = self.base_salary {
            e.base_salary = v;
        }
        merge(&mut e.ptkp_code, self.ptkp_code);
        if let Some(v) = self.tax_id {
            e.tax_id_encrypted =
                crypto::encrypt_opt(Some(v.as_str()), key).map_err(AppError::Internal)?;
        }
        merge(&mut e.bank_name, self.bank_name);
        if let Some(v) = self.bank_account_number {
            e.bank_account_encrypted =
                crypto::encrypt_opt(Some(v.as_str()), key).map_err(AppError::Internal)?;
        }
        merge(&mut e.bpjs_kesehatan_number, self.bpjs_kesehatan_number);
        merge(&mut e.bpjs_ketenagakerjaan_number, self.bpjs_ketenagakerjaan_number);
        merge(&mut e.emergency_contact_name, self.emergency_contact_name);
        merge(&mut e.emergency_contact_phone, self.emergency_contact_phone);
        Ok(e)
    }
}

fn validate(e: &EmployeeInput) -> Result<(), AppError> {
    if !e.email.contains('@') {
        return Err(AppError::Validation("A valid email address is required".to_string()));
    }
    if EmploymentStatus::parse(&e.employment_status).is_none() {
        return Err(AppError::Validation(format!(
            "employment_status must be one of {}",
            EmploymentStatus::ALL.map(|s| s.as_str()).join(", ")
        )));
    }
    if !EMPLOYMENT_TYPES.contains(&e.employment_type.as_str()) {
        return Err(AppError::Validation(format!(
            "employment_type must be one of {}",
            EMPLOYMENT_TYPES.join(", ")
        )));
    }
    if e.gender.as_deref().is_some_and(|g| g != "male" && g != "female") {
        return Err(AppError::Validation("gender must be male or female".to_string()));
    }
    if e.base_salary < 0 {
        return Err(AppError::Validation("base_salary cannot be negative".to_string()));
    }
    Ok(())
}

async fn validate_ptkp(state: &SharedState, e: &EmployeeInput) -> Result<(), AppError> {
    let Some(code) = &e.ptkp_code else {
        return Ok(());
    };
    if db::payroll::find_ptkp_by_code(&state.pool, code).await?.is_none() {
        return Err(AppError::Validation(format!("Unknown PTKP status: {code}")));
    }
    Ok(())
}

/// HR staff and the employee themself see identifiers in full; others see them masked.
pub(crate) fn disclosure_for(auth: &AuthUser, employee_id: Uuid) -> Disclosure {
    if auth.is_hr() || auth.employee_id == Some(employee_id) {
        Disclosure::Full
    } else {
        Disclosure::Masked
    }
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<ListEmployees>,
) -> PageResult<EmployeeView> {
    auth.require_any(&DIRECTORY_ROLES)?;
    let page = PageRequest::new(q.page, q.per_page);
    let filter = EmployeeFilter {
        search: search_pattern(q.search.as_deref()),
        company_id: q.company_id,
        department_id: q.department_id,
        position_id: q.position_id,
        manager_id: q.manager_id,
        employment_status: q.employment_status,
    };
    let rows = db::employees::list(&state.pool, &filter, page.limit(), page.offset()).await?;
    let total = db::employees::count(&state.pool, &filter).await?;

    let key = &state.config.encryption_key;
    let views = rows
        .into_iter()
        .map(|e| {
            let disclosure = disclosure_for(&auth, e.id);
            EmployeeView::build(e, key, disclosure)
        })
        .collect();
    Ok(Json(Paginated::new(views, page, total)))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<EmployeeRequest>,
) -> ApiResult<EmployeeView> {
    auth.require_hr()?;
    let input = req.into_new(&state.config.encryption_key)?;
    validate(&input)?;
    validate_ptkp(&state, &input).await?;

    let employee = db::employees::create(&state.pool, &input)
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_EMPLOYEE))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "employee.created",
        "employee",
        Some(employee.id),
        Some(serde_json::json!({ "employee_number": employee.employee_number })),
    )
    .await;

    Ok(Json(Envelope::new(EmployeeView::build(
        employee,
        &state.config.encryption_key,
        Disclosure::Full,
    ))))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<EmployeeView> {
    if auth.employee_id != Some(id) {
        auth.require_any(&DIRECTORY_ROLES)?;
    }
    let employee = db::employees::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;
    let disclosure = disclosure_for(&auth, id);
    Ok(Json(Envelope::new(EmployeeView::build(
        employee,
        &state.config.encryption_key,
        disclosure,
    ))))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<EmployeeRequest>,
) -> ApiResult<EmployeeView> {
    auth.require_hr()?;
    let current = db::employees::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;
    if req.manager_id == Some(id) {
        return Err(AppError::Validation("An employee cannot manage themself".to_string()));
    }

    let input = req.apply_to(EmployeeInput::from(current), &state.config.encryption_key)?;
    validate(&input)?;
    validate_ptkp(&state, &input).await?;

    let employee = db::employees::update(&state.pool, id, &input)
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_EMPLOYEE))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "employee.updated",
        "employee",
        Some(id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(EmployeeView::build(
        employee,
        &state.config.encryption_key,
        Disclosure::Full,
    ))))
}

/// Soft delete: the employee becomes inactive and its login is disabled.
pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<EmployeeView> {
    auth.require_hr()?;
    let today = Utc::now().with_timezone(&state.config.local_offset()).date_naive();
    let employee = db::employees::deactivate(&state.pool, id, today)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Employee not found".to_string()),
            e => AppError::Database(e),
        })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "employee.deactivated",
        "employee",
        Some(id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(EmployeeView::build(
        employee,
        &state.config.encryption_key,
        Disclosure::Full,
    ))))
}

pub async fn list_documents(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<EmployeeDocument>> {
    if auth.employee_id != Some(id) {
        auth.require_hr()?;
    }
    let documents = db::employees::list_documents(&state.pool, id).await?;
    Ok(Json(Envelope::new(documents)))
}

pub async fn delete_document(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((id, document_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<serde_json::Value> {
    auth.require_hr()?;
    let document = db::employees::find_document(&state.pool, id, document_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    db::employees::delete_document(&state.pool, document.id).await?;
    if let Err(e) = state.storage.delete(&document.file_path).await {
        tracing::warn!("Failed to remove stored document {}: {e}", document.file_path);
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "employee_document.deleted",
        "employee",
        Some(id),
        Some(serde_json::json!({ "document_id": document_id, "file_name": document.file_name })),
    )
    .await;

    Ok(deleted())
}

pub async fn list_movements(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(q): Query<PageQuery>,
) -> PageResult<EmployeeMovement> {
    if auth.employee_id != Some(id) {
        auth.require_any(&DIRECTORY_ROLES)?;
    }
    let page = PageRequest::new(q.page, q.per_page);
    let filter = MovementFilter {
        employee_id: Some(id),
        ..Default::default()
    };
    let rows = db::movements::list(&state.pool, &filter, page.limit(), page.offset()).await?;
    let total = db::movements::count(&state.pool, &filter).await?;
    Ok(Json(Paginated::new(rows, page, total)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "test-encryption-key-32-chars-ok!";

    fn minimal() -> EmployeeRequest {
        EmployeeRequest {
            employee_number: Some("EMP-7".into()),
            company_id: Some(Uuid::now_v7()),
            full_name: Some("Budi Santoso".into()),
            email: Some("budi@corp.id".into()),
            hire_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..Default::default()
        }
    }

    #[test]
    fn create_requires_core_fields() {
        let mut req = minimal();
        req.full_name = Some("   ".into());
        assert!(matches!(req.into_new(KEY), Err(AppError::Validation(_))));
    }

    #[test]
    fn create_defaults_status_and_type() {
        let input = minimal().into_new(KEY).unwrap();
        assert_eq!(input.employment_status, "active");
        assert_eq!(input.employment_type, "permanent");
        assert!(validate(&input).is_ok());
    }

    #[test]
    fn update_keeps_absent_fields_and_clears_blank_ones() {
        let mut base = minimal().into_new(KEY).unwrap();
        base.phone = Some("0812".into());
        base.address = Some("Jl. Sudirman".into());

        let patch = EmployeeRequest {
            phone: Some(String::new()),
            base_salary: Some(9_000_000),
            ..Default::default()
        };
        let merged = patch.apply_to(base, KEY).unwrap();
        assert_eq!(merged.phone, None);
        assert_eq!(merged.address.as_deref(), Some("Jl. Sudirman"));
        assert_eq!(merged.base_salary, 9_000_000);
        assert_eq!(merged.full_name, "Budi Santoso");
    }

    #[test]
    fn identifiers_are_encrypted_on_write() {
        let mut req = minimal();
        req.tax_id = Some("092543943407000".into());
        let input = req.into_new(KEY).unwrap();
        let cipher = input.tax_id_encrypted.unwrap();
        assert_ne!(cipher, b"092543943407000".to_vec());
        assert_eq!(crypto::decrypt(&cipher, KEY).unwrap(), "092543943407000");
    }

    #[test]
    fn invalid_status_is_rejected() {
        let mut input = minimal().into_new(KEY).unwrap();
        input.employment_status = "fired".into();
        assert!(validate(&input).is_err());
    }
}
