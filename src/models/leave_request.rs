use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i32,
    pub reason: String,
    pub status: String,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const LEAVE_TYPES: [&str; 5] = ["annual", "sick", "unpaid", "maternity", "other"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaveBalance {
    pub year: i32,
    pub entitlement: i32,
    pub used: i32,
    pub pending: i32,
    pub remaining: i32,
}

impl LeaveBalance {
    pub fn new(year: i32, entitlement: i32, used: i32, pending: i32) -> Self {
        Self {
            year,
            entitlement,
            used,
            pending,
            remaining: (entitlement - used - pending).max(0),
        }
    }
}

/// Working days (Monday to Friday) in `start ..= end`. Zero when the range is inverted.
pub fn weekdays_between(start: NaiveDate, end: NaiveDate) -> i32 {
    use chrono::{Datelike, Weekday};

    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekends_are_not_counted() {
        // Mon 2025-03-03 .. Sun 2025-03-09
        assert_eq!(weekdays_between(d(2025, 3, 3), d(2025, 3, 9)), 5);
        assert_eq!(weekdays_between(d(2025, 3, 8), d(2025, 3, 9)), 0);
        assert_eq!(weekdays_between(d(2025, 3, 7), d(2025, 3, 10)), 2);
    }

    #[test]
    fn single_day_and_inverted_ranges() {
        assert_eq!(weekdays_between(d(2025, 3, 4), d(2025, 3, 4)), 1);
        assert_eq!(weekdays_between(d(2025, 3, 5), d(2025, 3, 4)), 0);
    }

    #[test]
    fn balance_never_goes_negative() {
        let b = LeaveBalance::new(2025, 12, 10, 4);
        assert_eq!(b.remaining, 0);
        assert_eq!(LeaveBalance::new(2025, 12, 3, 2).remaining, 7);
    }
}
