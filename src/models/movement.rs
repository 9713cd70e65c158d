use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct EmployeeMovement {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub movement_type: String,
    pub status: String,
    pub effective_date: NaiveDate,
    pub old_company_id: Option<Uuid>,
    pub old_department_id: Option<Uuid>,
    pub old_position_id: Option<Uuid>,
    pub old_salary: Option<i64>,
    pub new_company_id: Option<Uuid>,
    pub new_department_id: Option<Uuid>,
    pub new_position_id: Option<Uuid>,
    pub new_salary: Option<i64>,
    pub reason: Option<String>,
    pub requested_by: Option<Uuid>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_notes: Option<String>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub is_applied: bool,
    pub applied_by: Option<Uuid>,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmployeeMovement {
    pub fn status(&self) -> Option<MovementStatus> {
        MovementStatus::parse(&self.status)
    }

    /// Apply is only offered for approved movements that have not been applied yet.
    pub fn can_apply(&self) -> bool {
        !self.is_applied
            && self
                .status()
                .and_then(|s| s.next(MovementAction::Apply))
                .is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Applied,
}

/// Operations that move a movement between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementAction {
    Submit,
    Approve,
    Reject,
    Apply,
    Cancel,
    Delete,
}

impl MovementAction {
    pub fn verb(&self) -> &'static str {
        match self {
            MovementAction::Submit => "submitted",
            MovementAction::Approve => "approved",
            MovementAction::Reject => "rejected",
            MovementAction::Apply => "applied",
            MovementAction::Cancel => "cancelled",
            MovementAction::Delete => "deleted",
        }
    }

    /// Status written by the action. Delete removes the row instead.
    pub fn target(&self) -> Option<MovementStatus> {
        match self {
            MovementAction::Submit => Some(MovementStatus::Pending),
            MovementAction::Approve => Some(MovementStatus::Approved),
            MovementAction::Reject => Some(MovementStatus::Rejected),
            MovementAction::Apply => Some(MovementStatus::Applied),
            MovementAction::Cancel => Some(MovementStatus::Cancelled),
            MovementAction::Delete => None,
        }
    }
}

impl MovementStatus {
    pub const ALL: [MovementStatus; 6] = [
        MovementStatus::Draft,
        MovementStatus::Pending,
        MovementStatus::Approved,
        MovementStatus::Rejected,
        MovementStatus::Cancelled,
        MovementStatus::Applied,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementStatus::Draft => "draft",
            MovementStatus::Pending => "pending",
            MovementStatus::Approved => "approved",
            MovementStatus::Rejected => "rejected",
            MovementStatus::Cancelled => "cancelled",
            MovementStatus::Applied => "applied",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }

    /// Statuses from which `action` is allowed. Delete has no target status.
    pub fn sources(action: MovementAction) -> &'static [MovementStatus] {
        match action {
            MovementAction::Submit => &[MovementStatus::Draft],
            MovementAction::Approve => &[MovementStatus::Pending],
            MovementAction::Reject => &[MovementStatus::Pending],
            MovementAction::Apply => &[MovementStatus::Approved],
            MovementAction::Cancel => &[
                MovementStatus::Draft,
                MovementStatus::Pending,
                MovementStatus::Approved,
            ],
            MovementAction::Delete => &[MovementStatus::Draft, MovementStatus::Pending],
        }
    }

    /// Status reached by performing `action` from `self`, if the transition exists.
    pub fn next(&self, action: MovementAction) -> Option<MovementStatus> {
        if self.allows(action) {
            action.target()
        } else {
            None
        }
    }

    pub fn allows(&self, action: MovementAction) -> bool {
        Self::sources(action).contains(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Promotion,
    Demotion,
    Transfer,
    Mutation,
    SalaryAdjustment,
}

impl MovementType {
    pub const ALL: [MovementType; 5] = [
        MovementType::Promotion,
        MovementType::Demotion,
        MovementType::Transfer,
        MovementType::Mutation,
        MovementType::SalaryAdjustment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Promotion => "promotion",
            MovementType::Demotion => "demotion",
            MovementType::Transfer => "transfer",
            MovementType::Mutation => "mutation",
            MovementType::SalaryAdjustment => "salary_adjustment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MovementType::Promotion => "Promotion",
            MovementType::Demotion => "Demotion",
            MovementType::Transfer => "Transfer",
            MovementType::Mutation => "Mutation",
            MovementType::SalaryAdjustment => "Salary adjustment",
        }
    }
}

/// Proposed placement and pay, compared against the employee's current values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    pub company_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub position_id: Option<Uuid>,
    pub salary: Option<i64>,
}

impl Placement {
    /// True when at least one proposed value is present and differs from `current`.
    pub fn changes(&self, current: &Placement) -> bool {
        let differs = |new: Option<Uuid>, old: Option<Uuid>| new.is_some() && new != old;
        differs(self.company_id, current.company_id)
            || differs(self.department_id, current.department_id)
            || differs(self.position_id, current.position_id)
            || (self.salary.is_some() && self.salary != current.salary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_the_only_decision_point() {
        for status in MovementStatus::ALL {
            let approvable = status.next(MovementAction::Approve).is_some();
            let rejectable = status.next(MovementAction::Reject).is_some();
            assert_eq!(approvable, status == MovementStatus::Pending, "{status:?}");
            assert_eq!(rejectable, status == MovementStatus::Pending, "{status:?}");
        }
    }

    #[test]
    fn applied_is_only_reachable_from_approved() {
        for status in MovementStatus::ALL {
            let next = status.next(MovementAction::Apply);
            if status == MovementStatus::Approved {
                assert_eq!(next, Some(MovementStatus::Applied));
            } else {
                assert_eq!(next, None, "{status:?} must not apply");
            }
        }
    }

    #[test]
    fn terminal_states_accept_nothing() {
        let actions = [
            MovementAction::Submit,
            MovementAction::Approve,
            MovementAction::Reject,
            MovementAction::Apply,
            MovementAction::Cancel,
            MovementAction::Delete,
        ];
        let terminal = [
            MovementStatus::Applied,
            MovementStatus::Rejected,
            MovementStatus::Cancelled,
        ];
        for status in terminal {
            for action in actions {
                assert!(!status.allows(action), "{status:?} allowed {action:?}");
            }
        }
    }

    #[test]
    fn delete_only_before_decision() {
        assert!(MovementStatus::Pending.allows(MovementAction::Delete));
        assert!(MovementStatus::Draft.allows(MovementAction::Delete));
        assert!(!MovementStatus::Approved.allows(MovementAction::Delete));
        assert_eq!(MovementStatus::Pending.next(MovementAction::Delete), None);
    }

    #[test]
    fn draft_submits_to_pending() {
        assert_eq!(
            MovementStatus::Draft.next(MovementAction::Submit),
            Some(MovementStatus::Pending)
        );
        assert_eq!(MovementStatus::Pending.next(MovementAction::Submit), None);
    }

    #[test]
    fn placement_requires_a_real_change() {
        let company = Uuid::now_v7();
        let current = Placement {
            company_id: Some(company),
            department_id: None,
            position_id: None,
            salary: Some(10_000_000),
        };
        assert!(!Placement::default().changes(&current));
        assert!(!Placement {
            company_id: Some(company),
            salary: Some(10_000_000),
            ..Default::default()
        }
        .changes(&current));
        assert!(Placement {
            salary: Some(15_000_000),
            ..Default::default()
        }
        .changes(&current));
    }

    #[test]
    fn type_names_round_trip() {
        for t in MovementType::ALL {
            assert_eq!(MovementType::parse(t.as_str()), Some(t));
        }
        assert_eq!(
            serde_json::to_value(MovementType::SalaryAdjustment).unwrap(),
            "salary_adjustment"
        );
    }
}
