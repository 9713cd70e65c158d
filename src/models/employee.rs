use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub employee_number: String,
    pub company_id: Uuid,
    pub department_id: Option<Uuid>,
    pub position_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub work_location_id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub hire_date: NaiveDate,
    pub termination_date: Option<NaiveDate>,
    pub employment_status: String,
    pub employment_type: String,
    pub base_salary: i64,
    pub ptkp_code: Option<String>,
    #[serde(skip)]
    pub tax_id_encrypted: Option<Vec<u8>>,
    pub bank_name: Option<String>,
    #[serde(skip)]
    pub bank_account_encrypted: Option<Vec<u8>>,
    pub bpjs_kesehatan_number: Option<String>,
    pub bpjs_ketenagakerjaan_number: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How much of the encrypted identifiers a reader may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disclosure {
    Full,
    Masked,
}

/// API representation of an employee with identifiers decrypted or masked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeView {
    #[serde(flatten)]
    pub employee: Employee,
    pub tax_id: Option<String>,
    pub bank_account_number: Option<String>,
}

impl EmployeeView {
    pub fn build(employee: Employee, key: &str, disclosure: Disclosure) -> Self {
        let reveal = |data: Option<&[u8]>| {
            crypto::decrypt_opt(data, key).map(|plain| match disclosure {
                Disclosure::Full => plain,
                Disclosure::Masked => crypto::mask(&plain),
            })
        };
        let tax_id = reveal(employee.tax_id_encrypted.as_deref());
        let bank_account_number = reveal(employee.bank_account_encrypted.as_deref());
        Self {
            employee,
            tax_id,
            bank_account_number,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmploymentStatus {
    Active,
    Probation,
    Inactive,
    Resigned,
    Terminated,
}

impl EmploymentStatus {
    pub const ALL: [EmploymentStatus; 5] = [
        EmploymentStatus::Active,
        EmploymentStatus::Probation,
        EmploymentStatus::Inactive,
        EmploymentStatus::Resigned,
        EmploymentStatus::Terminated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentStatus::Active => "active",
            EmploymentStatus::Probation => "probation",
            EmploymentStatus::Inactive => "inactive",
            EmploymentStatus::Resigned => "resigned",
            EmploymentStatus::Terminated => "terminated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }

    /// Statuses that count towards headcount and may clock in.
    pub fn is_working(&self) -> bool {
        matches!(self, EmploymentStatus::Active | EmploymentStatus::Probation)
    }
}

pub const EMPLOYMENT_TYPES: [&str; 3] = ["permanent", "contract", "intern"];

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct EmployeeDocument {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub document_type: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "test-encryption-key-32-chars-ok!";

    fn sample() -> Employee {
        let now = Utc::now();
        Employee {
            id: Uuid::now_v7(),
            employee_number: "EMP-001".to_string(),
            company_id: Uuid::now_v7(),
            department_id: None,
            position_id: None,
            manager_id: None,
            work_location_id: None,
            full_name: "Siti Rahma".to_string(),
            email: "siti@corp.id".to_string(),
            phone: None,
            gender: Some("female".to_string()),
            birth_date: None,
            address: None,
            hire_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            termination_date: None,
            employment_status: "active".to_string(),
            employment_type: "permanent".to_string(),
            base_salary: 12_000_000,
            ptkp_code: Some("TK/0".to_string()),
            tax_id_encrypted: crypto::encrypt_opt(Some("092543943407000"), KEY).unwrap(),
            bank_name: Some("BCA".to_string()),
            bank_account_encrypted: crypto::encrypt_opt(Some("1234567890"), KEY).unwrap(),
            bpjs_kesehatan_number: None,
            bpjs_ketenagakerjaan_number: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn full_disclosure_decrypts_identifiers() {
        let view = EmployeeView::build(sample(), KEY, Disclosure::Full);
        assert_eq!(view.tax_id.as_deref(), Some("092543943407000"));
        assert_eq!(view.bank_account_number.as_deref(), Some("1234567890"));
    }

    #[test]
    fn masked_disclosure_hides_all_but_last_four() {
        let view = EmployeeView::build(sample(), KEY, Disclosure::Masked);
        assert_eq!(view.bank_account_number.as_deref(), Some("******7890"));
    }

    #[test]
    fn ciphertext_never_serialized() {
        let value =
            serde_json::to_value(EmployeeView::build(sample(), KEY, Disclosure::Full)).unwrap();
        assert!(value.get("tax_id_encrypted").is_none());
        assert!(value.get("bank_account_encrypted").is_none());
        assert_eq!(value["full_name"], "Siti Rahma");
    }

    #[test]
    fn working_statuses() {
        assert!(EmploymentStatus::Probation.is_working());
        assert!(!EmploymentStatus::Inactive.is_working());
        assert_eq!(EmploymentStatus::parse("resigned"), Some(EmploymentStatus::Resigned));
        assert_eq!(EmploymentStatus::parse("fired"), None);
    }
}
