mod attendance;
mod audit_event;
mod company;
mod department;
mod employee;
mod leave_request;
mod movement;
mod notification;
mod password_reset_token;
mod payroll;
mod performance_review;
mod position;
mod refresh_token;
mod template;
mod user;
mod work_location;

pub use attendance::AttendanceRecord;
pub use audit_event::AuditEvent;
pub use company::{Company, CompanyType};
pub use department::Department;
pub use employee::{
    Disclosure, Employee, EmployeeDocument, EmployeeView, EmploymentStatus, EMPLOYMENT_TYPES,
};
pub use leave_request::{weekdays_between, LeaveBalance, LeaveRequest, LEAVE_TYPES};
pub use movement::{EmployeeMovement, MovementAction, MovementStatus, MovementType, Placement};
pub use notification::{Notification, NotificationKind};
pub use password_reset_token::PasswordResetToken;
pub use payroll::{PtkpStatus, TaxBracket, TerConfig, TER_CATEGORIES};
pub use performance_review::PerformanceReview;
pub use position::Position;
pub use refresh_token::RefreshToken;
pub use template::{Template, TemplateVersion};
pub use user::{RoleRecord, User, UserWithRoles};
pub use work_location::WorkLocation;
