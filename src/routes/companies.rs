use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::companies::{CompanyFilter, CompanyInput};
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Company, CompanyType};
use crate::pagination::{search_pattern, Envelope, PageRequest, Paginated};
use crate::routes::{deleted, non_blank, required, ApiResult, PageResult};
use crate::state::SharedState;

#[derive(Default, Serialize, Deserialize)]
pub struct ListCompanies {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub company_type: Option<String>,
    pub parent_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Serialize, Deserialize)]
pub struct CompanyRequest {
    pub name: String,
    pub code: String,
    pub company_type: String,
    pub parent_id: Option<Uuid>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

impl CompanyRequest {
    fn validate(&self) -> Result<CompanyType, AppError> {
        required(&self.name, "name")?;
        required(&self.code, "code")?;
        let company_type = CompanyType::parse(&self.company_type).ok_or_else(|| {
            AppError::Validation(
                "company_type must be one of holding, subsidiary, branch".to_string(),
            )
        })?;
        if company_type == CompanyType::Holding && self.parent_id.is_some() {
            return Err(AppError::Validation(
                "A holding company cannot have a parent".to_string(),
            ));
        }
        Ok(company_type)
    }

    fn input(&self) -> CompanyInput<'_> {
        CompanyInput {
            name: self.name.trim(),
            code: self.code.trim(),
            company_type: self.company_type.as_str(),
            parent_id: self.parent_id,
            address: non_blank(self.address.as_deref()),
            phone: non_blank(self.phone.as_deref()),
            email: non_blank(self.email.as_deref()),
            is_active: self.is_active.unwrap_or(true),
        }
    }
}

const DUPLICATE_CODE: &str = "A company with this code already exists";

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<ListCompanies>,
) -> PageResult<Company> {
    let page = PageRequest::new(q.page, q.per_page);
    let filter = CompanyFilter {
        search: search_pattern(q.search.as_deref()),
        company_type: q.company_type,
        parent_id: q.parent_id,
        is_active: q.is_active,
    };
    let companies = db::companies::list(&state.pool, &filter, page.limit(), page.offset()).await?;
    let total = db::companies::count(&state.pool, &filter).await?;
    Ok(Json(Paginated::new(companies, page, total)))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CompanyRequest>,
) -> ApiResult<Company> {
    auth.require_hr()?;
    req.validate()?;
    if let Some(parent_id) = req.parent_id {
        db::companies::find_by_id(&state.pool, parent_id)
            .await?
            .ok_or_else(|| AppError::Validation("Parent company does not exist".to_string()))?;
    }

    let company = db::companies::create(&state.pool, &req.input())
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_CODE))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "company.created",
        "company",
        Some(company.id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(company)))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Company> {
    let company = db::companies::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;
    Ok(Json(Envelope::new(company)))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CompanyRequest>,
) -> ApiResult<Company> {
    auth.require_hr()?;
    req.validate()?;
    if let Some(parent_id) = req.parent_id {
        if parent_id == id {
            return Err(AppError::Validation("A company cannot be its own parent".to_string()));
        }
        if db::companies::is_descendant(&state.pool, id, parent_id).await? {
            return Err(AppError::Validation(
                "Parent company cannot be one of this company's subsidiaries".to_string(),
            ));
        }
    }

    let company = db::companies::update(&state.pool, id, &req.input())
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Company not found".to_string()),
            e => AppError::from_write(e, DUPLICATE_CODE),
        })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "company.updated",
        "company",
        Some(id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(company)))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_hr()?;
    if db::companies::employee_count(&state.pool, id).await? > 0 {
        return Err(AppError::Conflict(
            "Company still has employees and cannot be deleted".to_string(),
        ));
    }
    let rows = db::companies::delete(&state.pool, id)
        .await
        .map_err(|e| AppError::from_write(e, "Company is still referenced"))?;
    if rows == 0 {
        return Err(AppError::NotFound("Company not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "company.deleted",
        "company",
        Some(id),
        None,
    )
    .await;

    Ok(deleted())
}
