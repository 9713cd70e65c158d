use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::roles::Role;
use crate::db;
use crate::db::performance_reviews::{ReviewFilter, ReviewInput};
use crate::error::AppError;
use crate::middleware::{audit, notify};
use crate::models::{NotificationKind, PerformanceReview};
use crate::pagination::{Envelope, PageRequest, Paginated};
use crate::routes::{deleted, non_blank, required, ApiResult, PageResult};
use crate::state::SharedState;

const REVIEWER_ROLES: [Role; 3] = [Role::Admin, Role::Hr, Role::Manager];

#[derive(Deserialize)]
pub struct ListReviews {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub employee_id: Option<Uuid>,
    pub status: Option<String>,
    pub period: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateReview {
    pub employee_id: Uuid,
    pub period: String,
    pub overall_rating: Option<i16>,
    pub goals: Option<String>,
    pub strengths: Option<String>,
    pub improvements: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateReview {
    pub period: String,
    pub overall_rating: Option<i16>,
    pub goals: Option<String>,
    pub strengths: Option<String>,
    pub improvements: Option<String>,
}

fn validate_rating(rating: Option<i16>) -> Result<(), AppError> {
    match rating {
        Some(r) if !(1..=5).contains(&r) => Err(AppError::Validation(
            "overall_rating must be between 1 and 5".to_string(),
        )),
        _ => Ok(()),
    }
}

async fn load(state: &SharedState, id: Uuid) -> Result<PerformanceReview, AppError> {
    db::performance_reviews::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Performance review not found".to_string()))
}

/// HR staff or the review's author may manage it.
fn require_author(auth: &AuthUser, review: &PerformanceReview) -> Result<(), AppError> {
    if auth.is_hr() || (review.reviewer_id.is_some() && auth.employee_id == review.reviewer_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the reviewer can change this review".to_string(),
        ))
    }
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<ListReviews>,
) -> PageResult<PerformanceReview> {
    let page = PageRequest::new(q.page, q.per_page);
    let mut filter = ReviewFilter {
        employee_id: q.employee_id,
        reviewer_id: None,
        status: q.status,
        period: q.period,
    };
    if !auth.is_hr() {
        let me = auth.require_employee()?;
        if auth.has_role(Role::Manager) && q.employee_id != Some(me) {
            filter.reviewer_id = Some(me);
        } else {
            filter.employee_id = Some(me);
        }
    }
    let rows =
        db::performance_reviews::list(&state.pool, &filter, page.limit(), page.offset()).await?;
    let total = db::performance_reviews::count(&state.pool, &filter).await?;
    Ok(Json(Paginated::new(rows, page, total)))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateReview>,
) -> ApiResult<PerformanceReview> {
    auth.require_any(&REVIEWER_ROLES)?;
    let period = required(&req.period, "period")?;
    validate_rating(req.overall_rating)?;
    if auth.employee_id == Some(req.employee_id) {
        return Err(AppError::Validation("You cannot review yourself".to_string()));
    }
    db::employees::find_by_id(&state.pool, req.employee_id)
        .await?
        .ok_or_else(|| AppError::Validation("Employee does not exist".to_string()))?;

    let input = ReviewInput {
        period,
        overall_rating: req.overall_rating,
        goals: non_blank(req.goals.as_deref()),
        strengths: non_blank(req.strengths.as_deref()),
        improvements: non_blank(req.improvements.as_deref()),
    };
    let review =
        db::performance_reviews::create(&state.pool, req.employee_id, auth.employee_id, &input)
            .await
            .map_err(|e| {
                AppError::from_write(e, "A review for this employee and period already exists")
            })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "review.created",
        "performance_review",
        Some(review.id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(review)))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<PerformanceReview> {
    let review = load(&state, id).await?;
    let involved = auth.employee_id.is_some()
        && (auth.employee_id == Some(review.employee_id) || auth.employee_id == review.reviewer_id);
    if !involved && !auth.is_hr() {
        return Err(AppError::Forbidden(
            "You do not have access to this review".to_string(),
        ));
    }
    Ok(Json(Envelope::new(review)))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReview>,
) -> ApiResult<PerformanceReview> {
    let current = load(&state, id).await?;
    require_author(&auth, &current)?;
    let period = required(&req.period, "period")?;
    validate_rating(req.overall_rating)?;

    let input = ReviewInput {
        period,
        overall_rating: req.overall_rating,
        goals: non_blank(req.goals.as_deref()),
        strengths: non_blank(req.strengths.as_deref()),
        improvements: non_blank(req.improvements.as_deref()),
    };
    let review = db::performance_reviews::update_draft(&state.pool, id, &input)
        .await
        .map_err(|e| {
            AppError::from_write(e, "A review for this employee and period already exists")
        })?
        .ok_or_else(|| AppError::Conflict("Only draft reviews can be edited".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "review.updated",
        "performance_review",
        Some(id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(review)))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let current = load(&state, id).await?;
    require_author(&auth, &current)?;
    if !db::performance_reviews::delete_draft(&state.pool, id).await? {
        return Err(AppError::Conflict(
            "Only draft reviews can be deleted".to_string(),
        ));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "review.deleted",
        "performance_review",
        Some(id),
        None,
    )
    .await;

    Ok(deleted())
}

pub async fn submit(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<PerformanceReview> {
    let current = load(&state, id).await?;
    require_author(&auth, &current)?;
    if current.status == "draft" && current.overall_rating.is_none() {
        return Err(AppError::Validation(
            "An overall rating is required before submitting".to_string(),
        ));
    }
    let review = db::performance_reviews::submit(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Review is already {}", current.status)))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "review.submitted",
        "performance_review",
        Some(id),
        None,
    )
    .await;

    notify::employee(
        &state,
        review.employee_id,
        NotificationKind::Performance,
        "Performance review submitted",
        &format!("Your performance review for {} is ready to acknowledge", review.period),
        &format!("/performance/{}", review.id),
    )
    .await;

    Ok(Json(Envelope::new(review)))
}

pub async fn acknowledge(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<PerformanceReview> {
    let current = load(&state, id).await?;
    if auth.employee_id != Some(current.employee_id) {
        return Err(AppError::Forbidden(
            "Only the reviewed employee can acknowledge a review".to_string(),
        ));
    }
    let review = db::performance_reviews::acknowledge(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!("Review cannot be acknowledged while {}", current.status))
        })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "review.acknowledged",
        "performance_review",
        Some(id),
        None,
    )
    .await;

    Ok(Json(Envelope::new(review)))
}
