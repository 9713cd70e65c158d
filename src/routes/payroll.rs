use std::sync::LazyLock;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{PtkpStatus, TaxBracket, TerConfig, TER_CATEGORIES};
use crate::pagination::Envelope;
use crate::routes::{deleted, required, ApiResult};
use crate::state::SharedState;
use crate::tax::{self, Band, TaxSimulation};

static PTKP_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(TK|K|K/I)/[0-3]$").unwrap());

#[derive(Default, Serialize, Deserialize)]
pub struct TerQuery {
    pub category: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct TerRequest {
    pub category: String,
    pub min_income: i64,
    pub max_income: Option<i64>,
    pub rate_bps: i32,
}

#[derive(Default, Serialize, Deserialize)]
pub struct BracketQuery {
    pub effective_year: Option<i32>,
}

#[derive(Serialize, Deserialize)]
pub struct BracketRequest {
    pub min_income: i64,
    pub max_income: Option<i64>,
    pub rate_bps: i32,
    pub effective_year: i32,
}

#[derive(Serialize, Deserialize)]
pub struct PtkpRequest {
    pub code: String,
    pub description: String,
    pub annual_amount: i64,
    pub ter_category: String,
}

#[derive(Serialize, Deserialize)]
pub struct SimulationRequest {
    pub monthly_gross: i64,
    pub ptkp_code: String,
}

fn validate_range(min_income: i64, max_income: Option<i64>, rate_bps: i32) -> Result<(), AppError> {
    if min_income < 0 {
        return Err(AppError::Validation("min_income cannot be negative".to_string()));
    }
    if max_income.is_some_and(|max| max <= min_income) {
        return Err(AppError::Validation(
            "max_income must be greater than min_income".to_string(),
        ));
    }
    if !(0..=10_000).contains(&rate_bps) {
        return Err(AppError::Validation(
            "rate_bps must be between 0 and 10000".to_string(),
        ));
    }
    Ok(())
}

fn validate_category(category: &str) -> Result<(), AppError> {
    if TER_CATEGORIES.contains(&category) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "category must be one of {}",
            TER_CATEGORIES.join(", ")
        )))
    }
}

type OverlapCheck = fn(&[Band]) -> Option<(Band, Band)>;

/// Rejects `candidate` if it overlaps any of `existing` (minus the row being replaced).
fn check_overlap(
    candidate: Band,
    existing: impl Iterator<Item = (Uuid, Band)>,
    replacing: Option<Uuid>,
    find: OverlapCheck,
) -> Result<(), AppError> {
    let mut bands: Vec<Band> = existing
        .filter(|(id, _)| Some(*id) != replacing)
        .map(|(_, band)| band)
        .collect();
    bands.push(candidate);
    match find(&bands) {
        Some((a, b)) => Err(AppError::Conflict(format!(
            "Range overlaps an existing band ({} / {})",
            a.label(),
            b.label()
        ))),
        None => Ok(()),
    }
}

fn ter_band(t: &TerConfig) -> Band {
    Band {
        min_income: t.min_income,
        max_income: t.max_income,
        rate_bps: t.rate_bps,
    }
}

fn bracket_band(b: &TaxBracket) -> Band {
    Band {
        min_income: b.min_income,
        max_income: b.max_income,
        rate_bps: b.rate_bps,
    }
}

// TER configs

async fn record(
    state: &SharedState,
    auth: &AuthUser,
    action: &str,
    resource_type: &str,
    id: Uuid,
) {
    audit::log_event(&state.pool, Some(auth.user_id), action, resource_type, Some(id), None)
        .await;
}

pub async fn list_ter(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<TerQuery>,
) -> ApiResult<Vec<TerConfig>> {
    let rows = db::payroll::list_ter(&state.pool, q.category.as_deref()).await?;
    Ok(Json(Envelope::new(rows)))
}

async fn validate_ter(
    state: &SharedState,
    req: &TerRequest,
    replacing: Option<Uuid>,
) -> Result<(), AppError> {
    validate_category(&req.category)?;
    validate_range(req.min_income, req.max_income, req.rate_bps)?;
    let existing = db::payroll::list_ter(&state.pool, Some(&req.category)).await?;
    check_overlap(
        Band {
            min_income: req.min_income,
            max_income: req.max_income,
            rate_bps: req.rate_bps,
        },
        existing.iter().map(|t| (t.id, ter_band(t))),
        replacing,
        tax::find_inclusive_overlap,
    )
}

pub async fn create_ter(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<TerRequest>,
) -> ApiResult<TerConfig> {
    auth.require_hr()?;
    validate_ter(&state, &req, None).await?;
    let row = db::payroll::create_ter(
        &state.pool,
        &req.category,
        req.min_income,
        req.max_income,
        req.rate_bps,
    )
    .await
    .map_err(|e| AppError::from_write(e, "TER band already exists"))?;

    record(&state, &auth, "payroll.ter_created", "ter_config", row.id).await;
    Ok(Json(Envelope::new(row)))
}

pub async fn update_ter(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TerRequest>,
) -> ApiResult<TerConfig> {
    auth.require_hr()?;
    db::payroll::find_ter(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("TER config not found".to_string()))?;
    validate_ter(&state, &req, Some(id)).await?;
    let row = db::payroll::update_ter(
        &state.pool,
        id,
        &req.category,
        req.min_income,
        req.max_income,
        req.rate_bps,
    )
    .await
    .map_err(|e| AppError::from_write(e, "TER band already exists"))?;

    record(&state, &auth, "payroll.ter_updated", "ter_config", id).await;
    Ok(Json(Envelope::new(row)))
}

pub async fn delete_ter(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_hr()?;
    if db::payroll::delete_ter(&state.pool, id).await? == 0 {
        return Err(AppError::NotFound("TER config not found".to_string()));
    }
    record(&state, &auth, "payroll.ter_deleted", "ter_config", id).await;
    Ok(deleted())
}

// Progressive brackets

pub async fn list_brackets(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<BracketQuery>,
) -> ApiResult<Vec<TaxBracket>> {
    let rows = db::payroll::list_brackets(&state.pool, q.effective_year).await?;
    Ok(Json(Envelope::new(rows)))
}

async fn validate_bracket(
    state: &SharedState,
    req: &BracketRequest,
    replacing: Option<Uuid>,
) -> Result<(), AppError> {
    validate_range(req.min_income, req.max_income, req.rate_bps)?;
    if !(2000..=2100).contains(&req.effective_year) {
        return Err(AppError::Validation("effective_year is out of range".to_string()));
    }
    let existing = db::payroll::list_brackets(&state.pool, Some(req.effective_year)).await?;
    check_overlap(
        Band {
            min_income: req.min_income,
            max_income: req.max_income,
            rate_bps: req.rate_bps,
        },
        existing.iter().map(|b| (b.id, bracket_band(b))),
        replacing,
        tax::find_overlap,
    )
}

pub async fn create_bracket(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<BracketRequest>,
) -> ApiResult<TaxBracket> {
    auth.require_hr()?;
    validate_bracket(&state, &req, None).await?;
    let row = db::payroll::create_bracket(
        &state.pool,
        req.min_income,
        req.max_income,
        req.rate_bps,
        req.effective_year,
    )
    .await
    .map_err(|e| AppError::from_write(e, "Tax bracket already exists"))?;

    record(&state, &auth, "payroll.bracket_created", "tax_bracket", row.id).await;
    Ok(Json(Envelope::new(row)))
}

pub async fn update_bracket(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<BracketRequest>,
) -> ApiResult<TaxBracket> {
    auth.require_hr()?;
    validate_bracket(&state, &req, Some(id)).await?;
    let row = db::payroll::update_bracket(
        &state.pool,
        id,
        req.min_income,
        req.max_income,
        req.rate_bps,
        req.effective_year,
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("Tax bracket not found".to_string()),
        e => AppError::from_write(e, "Tax bracket already exists"),
    })?;

    record(&state, &auth, "payroll.bracket_updated", "tax_bracket", id).await;
    Ok(Json(Envelope::new(row)))
}

pub async fn delete_bracket(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_hr()?;
    if db::payroll::delete_bracket(&state.pool, id).await? == 0 {
        return Err(AppError::NotFound("Tax bracket not found".to_string()));
    }
    record(&state, &auth, "payroll.bracket_deleted", "tax_bracket", id).await;
    Ok(deleted())
}

// PTKP statuses

pub async fn list_ptkp(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> ApiResult<Vec<PtkpStatus>> {
    Ok(Json(Envelope::new(db::payroll::list_ptkp(&state.pool).await?)))
}

impl PtkpRequest {
    fn validate(&self) -> Result<(), AppError> {
        let code = required(&self.code, "code")?;
        if !PTKP_CODE_RE.is_match(code) {
            return Err(AppError::Validation(
                "code must look like TK/0, K/1 or K/I/2".to_string(),
            ));
        }
        required(&self.description, "description")?;
        validate_category(&self.ter_category)?;
        if self.annual_amount <= 0 {
            return Err(AppError::Validation(
                "annual_amount must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

const DUPLICATE_PTKP: &str = "A PTKP status with this code already exists";

pub async fn create_ptkp(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<PtkpRequest>,
) -> ApiResult<PtkpStatus> {
    auth.require_hr()?;
    req.validate()?;
    let row = db::payroll::create_ptkp(
        &state.pool,
        req.code.trim(),
        req.description.trim(),
        req.annual_amount,
        &req.ter_category,
    )
    .await
    .map_err(|e| AppError::from_write(e, DUPLICATE_PTKP))?;

    record(&state, &auth, "payroll.ptkp_created", "ptkp_status", row.id).await;
    Ok(Json(Envelope::new(row)))
}

pub async fn update_ptkp(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PtkpRequest>,
) -> ApiResult<PtkpStatus> {
    auth.require_hr()?;
    req.validate()?;
    db::payroll::find_ptkp(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("PTKP status not found".to_string()))?;
    let row = db::payroll::update_ptkp(
        &state.pool,
        id,
        req.code.trim(),
        req.description.trim(),
        req.annual_amount,
        &req.ter_category,
    )
    .await
    .map_err(|e| AppError::from_write(e, DUPLICATE_PTKP))?;

    record(&state, &auth, "payroll.ptkp_updated", "ptkp_status", id).await;
    Ok(Json(Envelope::new(row)))
}

pub async fn delete_ptkp(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_hr()?;
    if db::payroll::delete_ptkp(&state.pool, id).await? == 0 {
        return Err(AppError::NotFound("PTKP status not found".to_string()));
    }
    record(&state, &auth, "payroll.ptkp_deleted", "ptkp_status", id).await;
    Ok(deleted())
}

pub async fn tax_simulation(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<SimulationRequest>,
) -> ApiResult<TaxSimulation> {
    if req.monthly_gross < 0 {
        return Err(AppError::Validation(
            "monthly_gross cannot be negative".to_string(),
        ));
    }
    let ptkp = db::payroll::find_ptkp_by_code(&state.pool, req.ptkp_code.trim())
        .await?
        .ok_or_else(|| AppError::Validation(format!("Unknown PTKP code {}", req.ptkp_code)))?;

    let ter = db::payroll::list_ter(&state.pool, Some(&ptkp.ter_category)).await?;
    let ter_bands: Vec<Band> = ter.iter().map(ter_band).collect();
    let ter_rate_bps = tax::ter_rate(req.monthly_gross, &ter_bands).ok_or_else(|| {
        AppError::Validation(format!(
            "No TER band of category {} covers {}",
            ptkp.ter_category,
            tax::format_rupiah(req.monthly_gross)
        ))
    })?;

    let year = Utc::now()
        .with_timezone(&state.config.local_offset())
        .year();
    let brackets = db::payroll::brackets_for_year(&state.pool, year).await?;
    let bracket_bands: Vec<Band> = brackets.iter().map(bracket_band).collect();

    let monthly_withholding = tax::ter_withholding(req.monthly_gross, ter_rate_bps);
    let annual_taxable_income = tax::annual_taxable_income(req.monthly_gross, ptkp.annual_amount);
    let annual_tax = tax::progressive_tax(annual_taxable_income, &bracket_bands);

    Ok(Json(Envelope::new(TaxSimulation {
        monthly_gross: req.monthly_gross,
        ptkp_code: ptkp.code,
        ter_category: ptkp.ter_category,
        ter_rate_bps,
        ter_rate_label: tax::format_rate(ter_rate_bps),
        monthly_withholding,
        annual_taxable_income,
        annual_tax,
        monthly_gross_label: tax::format_rupiah(req.monthly_gross),
        monthly_withholding_label: tax::format_rupiah(monthly_withholding),
        annual_tax_label: tax::format_rupiah(annual_tax),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(min: i64, max: Option<i64>) -> Band {
        Band {
            min_income: min,
            max_income: max,
            rate_bps: 100,
        }
    }

    #[test]
    fn range_validation() {
        assert!(validate_range(0, Some(100), 500).is_ok());
        assert!(validate_range(0, None, 0).is_ok());
        assert!(validate_range(100, Some(100), 500).is_err());
        assert!(validate_range(-1, None, 500).is_err());
        assert!(validate_range(0, None, 10_001).is_err());
    }

    #[test]
    fn overlap_ignores_the_row_being_replaced() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let existing = [(a, band(0, Some(100))), (b, band(100, None))];

        let find = tax::find_overlap;
        assert!(check_overlap(band(0, Some(150)), existing.into_iter(), None, find).is_err());
        assert!(check_overlap(band(0, Some(100)), existing.into_iter(), Some(a), find).is_ok());
    }

    #[test]
    fn ptkp_codes() {
        for code in ["TK/0", "K/3", "K/I/2"] {
            assert!(PTKP_CODE_RE.is_match(code), "{code}");
        }
        for code in ["TK/4", "k/1", "K1", "K/I/"] {
            assert!(!PTKP_CODE_RE.is_match(code), "{code}");
        }
    }

    #[test]
    fn categories() {
        assert!(validate_category("A").is_ok());
        assert!(validate_category("D").is_err());
    }
}
