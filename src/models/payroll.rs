use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Monthly TER (average effective rate) band for one PTKP category.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TerConfig {
    pub id: Uuid,
    pub category: String,
    pub min_income: i64,
    pub max_income: Option<i64>,
    pub rate_bps: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Annual progressive income tax bracket.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TaxBracket {
    pub id: Uuid,
    pub min_income: i64,
    pub max_income: Option<i64>,
    pub rate_bps: i32,
    pub effective_year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Non-taxable income threshold for a marital/dependant status such as `K/1`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct PtkpStatus {
    pub id: Uuid,
    pub code: String,
    pub description: String,
    pub annual_amount: i64,
    pub ter_category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const TER_CATEGORIES: [&str; 3] = ["A", "B", "C"];
