pub mod attendance;
pub mod audit;
pub mod companies;
pub mod dashboard;
pub mod departments;
pub mod employees;
pub mod leave_requests;
pub mod movements;
pub mod notifications;
pub mod password_reset_tokens;
pub mod payroll;
pub mod performance_reviews;
pub mod positions;
pub mod refresh_tokens;
pub mod templates;
pub mod users;
pub mod work_locations;
