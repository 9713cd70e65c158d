pub mod attendance;
pub mod audit;
pub mod auth;
pub mod companies;
pub mod dashboard;
pub mod departments;
pub mod employees;
pub mod leave;
pub mod movements;
pub mod notifications;
pub mod payroll;
pub mod performance;
pub mod positions;
pub mod profile;
pub mod templates;
pub mod uploads;
pub mod users;
pub mod work_locations;

use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::error::AppError;
use crate::pagination::{Envelope, Paginated};
use crate::state::SharedState;

pub type ApiResult<T> = Result<Json<Envelope<T>>, AppError>;
pub type PageResult<T> = Result<Json<Paginated<T>>, AppError>;

/// Body returned by every successful DELETE.
pub fn deleted() -> Json<Envelope<serde_json::Value>> {
    Json(Envelope::new(serde_json::json!({ "deleted": true })))
}

/// Trimmed value, or `None` when absent or blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::Validation(format!("{field} is required")))
    } else {
        Ok(trimmed)
    }
}

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/api/v1/auth/reset-password", post(auth::reset_password))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        // Users
        .route("/api/v1/users", get(users::list).post(users::create))
        .route(
            "/api/v1/users/{id}",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route(
            "/api/v1/users/{id}/reset-password",
            post(users::reset_password),
        )
        .route("/api/v1/roles", get(users::list_roles))
        // Organization
        .route(
            "/api/v1/companies",
            get(companies::list).post(companies::create),
        )
        .route(
            "/api/v1/companies/{id}",
            get(companies::get)
                .put(companies::update)
                .delete(companies::delete),
        )
        .route(
            "/api/v1/departments",
            get(departments::list).post(departments::create),
        )
        .route(
            "/api/v1/departments/{id}",
            get(departments::get)
                .put(departments::update)
                .delete(departments::delete),
        )
        .route(
            "/api/v1/positions",
            get(positions::list).post(positions::create),
        )
        .route(
            "/api/v1/positions/{id}",
            get(positions::get)
                .put(positions::update)
                .delete(positions::delete),
        )
        .route(
            "/api/v1/work-locations",
            get(work_locations::list).post(work_locations::create),
        )
        .route(
            "/api/v1/work-locations/{id}",
            get(work_locations::get)
                .put(work_locations::update)
                .delete(work_locations::delete),
        )
        // Employees
        .route(
            "/api/v1/employees",
            get(employees::list).post(employees::create),
        )
        .route(
            "/api/v1/employees/{id}",
            get(employees::get)
                .put(employees::update)
                .delete(employees::delete),
        )
        .route(
            "/api/v1/employees/{id}/documents",
            get(employees::list_documents),
        )
        .route(
            "/api/v1/employees/{id}/documents/{doc_id}",
            axum::routing::delete(employees::delete_document),
        )
        .route(
            "/api/v1/employees/{id}/movements",
            get(employees::list_movements),
        )
        .route("/api/v1/profile", get(profile::get).put(profile::update))
        // Attendance
        .route("/api/v1/attendance", get(attendance::list))
        .route("/api/v1/attendance/clock-in", post(attendance::clock_in))
        .route("/api/v1/attendance/clock-out", post(attendance::clock_out))
        .route("/api/v1/attendance/today", get(attendance::today))
        .route("/api/v1/attendance/me", get(attendance::mine))
        // Leave
        .route(
            "/api/v1/leave-requests",
            get(leave::list).post(leave::create),
        )
        .route("/api/v1/leave-requests/{id}", get(leave::get))
        .route("/api/v1/leave-requests/{id}/approve", post(leave::approve))
        .route("/api/v1/leave-requests/{id}/reject", post(leave::reject))
        .route("/api/v1/leave-requests/{id}/cancel", post(leave::cancel))
        .route("/api/v1/leave-balance", get(leave::balance))
        // Payroll settings
        .route(
            "/api/v1/payroll/ter-configs",
            get(payroll::list_ter).post(payroll::create_ter),
        )
        .route(
            "/api/v1/payroll/ter-configs/{id}",
            put(payroll::update_ter).delete(payroll::delete_ter),
        )
        .route(
            "/api/v1/payroll/tax-brackets",
            get(payroll::list_brackets).post(payroll::create_bracket),
        )
        .route(
            "/api/v1/payroll/tax-brackets/{id}",
            put(payroll::update_bracket).delete(payroll::delete_bracket),
        )
        .route(
            "/api/v1/payroll/ptkp",
            get(payroll::list_ptkp).post(payroll::create_ptkp),
        )
        .route(
            "/api/v1/payroll/ptkp/{id}",
            put(payroll::update_ptkp).delete(payroll::delete_ptkp),
        )
        .route(
            "/api/v1/payroll/tax-simulation",
            post(payroll::tax_simulation),
        )
        // Performance
        .route(
            "/api/v1/performance-reviews",
            get(performance::list).post(performance::create),
        )
        .route(
            "/api/v1/performance-reviews/{id}",
            get(performance::get)
                .put(performance::update)
                .delete(performance::delete),
        )
        .route(
            "/api/v1/performance-reviews/{id}/submit",
            post(performance::submit),
        )
        .route(
            "/api/v1/performance-reviews/{id}/acknowledge",
            post(performance::acknowledge),
        )
        // Movements
        .route(
            "/api/v1/movements",
            get(movements::list).post(movements::create),
        )
        .route(
            "/api/v1/movements/{id}",
            get(movements::get).delete(movements::delete),
        )
        .route("/api/v1/movements/{id}/submit", post(movements::submit))
        .route("/api/v1/movements/{id}/approve", post(movements::approve))
        .route("/api/v1/movements/{id}/reject", post(movements::reject))
        .route("/api/v1/movements/{id}/apply", post(movements::apply))
        .route("/api/v1/movements/{id}/cancel", post(movements::cancel))
        // Templates
        .route(
            "/api/v1/templates",
            get(templates::list).post(templates::create),
        )
        .route("/api/v1/templates/upload", post(templates::upload))
        .route(
            "/api/v1/templates/{id}",
            get(templates::get)
                .put(templates::update)
                .delete(templates::delete),
        )
        .route(
            "/api/v1/templates/{id}/upload",
            post(templates::upload_version),
        )
        .route("/api/v1/templates/{id}/versions", get(templates::versions))
        .route("/api/v1/templates/{id}/download", get(templates::download))
        // Uploads
        .route("/api/v1/upload/documents", post(uploads::upload_document))
        // Notifications
        .route("/api/v1/notifications", get(notifications::list))
        .route(
            "/api/v1/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route(
            "/api/v1/notifications/read-all",
            put(notifications::mark_all_read),
        )
        .route(
            "/api/v1/notifications/{id}",
            axum::routing::delete(notifications::delete),
        )
        .route(
            "/api/v1/notifications/{id}/read",
            put(notifications::mark_read),
        )
        // Dashboard and audit
        .route("/api/v1/dashboard/summary", get(dashboard::summary))
        .route("/api/v1/audit-events", get(audit::list))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_dropped() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" hr ")), Some("hr"));
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn required_names_the_field() {
        assert_eq!(required(" x ", "name").unwrap(), "x");
        match required("", "code") {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "code is required"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
