use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Employee, EmployeeDocument};
use crate::storage::StoredFile;

#[derive(Debug, Default)]
pub struct EmployeeFilter {
    pub search: Option<String>,
    pub company_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub position_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub employment_status: Option<String>,
}

const EMPLOYEE_FILTER: &str = "WHERE ($1::TEXT IS NULL OR full_name ILIKE $1 OR employee_number ILIKE $1 OR email ILIKE $1)
      AND ($2::UUID IS NULL OR company_id = $2)
      AND ($3::UUID IS NULL OR department_id = $3)
      AND ($4::UUID IS NULL OR position_id = $4)
      AND ($5::UUID IS NULL OR manager_id = $5)
      AND ($6::TEXT IS NULL OR employment_status = $6)";

/// Full column set written on create and update. Callers merge partial edits first.
pub struct EmployeeInput {
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
    pub employment_status: String,
    pub employment_type: String,
    pub base_salary: i64,
    pub ptkp_code: Option<String>,
    pub tax_id_encrypted: Option<Vec<u8>>,
    pub bank_name: Option<String>,
    pub bank_account_encrypted: Option<Vec<u8>>,
    pub bpjs_kesehatan_number: Option<String>,
    pub bpjs_ketenagakerjaan_number: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

impl From<Employee> for EmployeeInput {
    fn from(e: Employee) -> Self {
        Self {
            employee_number: e.employee_number,
            company_id: e.company_id,
            department_id: e.department_id,
            position_id: e.position_id,
            manager_id: e.manager_id,
            work_location_id: e.work_location_id,
            full_name: e.full_name,
            email: e.email,
            phone: e.phone,
            gender: e.gender,
            birth_date: e.birth_date,
            address: e.address,
            hire_date: e.hire_date,
            employment_status: e.employment_status,
            employment_type: e.employment_type,
            base_salary: e.base_salary,
            ptkp_code: e.ptkp_code,
            tax_id_encrypted: e.tax_id_encrypted,
            bank_name: e.bank_name,
            bank_account_encrypted: e.bank_account_encrypted,
            bpjs_kesehatan_number: e.bpjs_kesehatan_number,
            bpjs_ketenagakerjaan_number: e.bpjs_ketenagakerjaan_number,
            emergency_contact_name: e.emergency_contact_name,
            emergency_contact_phone: e.emergency_contact_phone,
        }
    }
}

pub async fn create(pool: &PgPool, input: &EmployeeInput) -> Result<Employee, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "INSERT INTO employees (
            employee_number, company_id, department_id, position_id, manager_id, work_location_id,
            full_name, email, phone, gender, birth_date, address, hire_date,
            employment_status, employment_type, base_salary, ptkp_code, tax_id_encrypted,
            bank_name, bank_account_encrypted, bpjs_kesehatan_number, bpjs_ketenagakerjaan_number,
            emergency_contact_name, emergency_contact_phone)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
                 $19, $20, $21, $22, $23, $24)
         RETURNING *",
    )
    .bind(&input.employee_number)
    .bind(input.company_id)
    .bind(input.department_id)
    .bind(input.position_id)
    .bind(input.manager_id)
    .bind(input.work_location_id)
    .bind(&input.full_name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.gender)
    .bind(input.birth_date)
    .bind(&input.address)
    .bind(input.hire_date)
    .bind(&input.employment_status)
    .bind(&input.employment_type)
    .bind(input.base_salary)
    .bind(&input.ptkp_code)
    .bind(&input.tax_id_encrypted)
    .bind(&input.bank_name)
    .bind(&input.bank_account_encrypted)
    .bind(&input.bpjs_kesehatan_number)
    .bind(&input.bpjs_ketenagakerjaan_number)
    .bind(&input.emergency_contact_name)
    .bind(&input.emergency_contact_phone)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    input: &EmployeeInput,
) -> Result<Employee, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "UPDATE employees SET
            employee_number = $2, company_id = $3, department_id = $4, position_id = $5,
            manager_id = $6, work_location_id = $7, full_name = $8, email = $9, phone = $10,
            gender = $11, birth_date = $12, address = $13, hire_date = $14,
            employment_status = $15, employment_type = $16, base_salary = $17, ptkp_code = $18,
            tax_id_encrypted = $19, bank_name = $20, bank_account_encrypted = $21,
            bpjs_kesehatan_number = $22, bpjs_ketenagakerjaan_number = $23,
            emergency_contact_name = $24, emergency_contact_phone = $25, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&input.employee_number)
    .bind(input.company_id)
    .bind(input.department_id)
    .bind(input.position_id)
    .bind(input.manager_id)
    .bind(input.work_location_id)
    .bind(&input.full_name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.gender)
    .bind(input.birth_date)
    .bind(&input.address)
    .bind(input.hire_date)
    .bind(&input.employment_status)
    .bind(&input.employment_type)
    .bind(input.base_salary)
    .bind(&input.ptkp_code)
    .bind(&input.tax_id_encrypted)
    .bind(&input.bank_name)
    .bind(&input.bank_account_encrypted)
    .bind(&input.bpjs_kesehatan_number)
    .bind(&input.bpjs_ketenagakerjaan_number)
    .bind(&input.emergency_contact_name)
    .bind(&input.emergency_contact_phone)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list(
    pool: &PgPool,
    filter: &EmployeeFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(&format!(
        "SELECT * FROM employees {EMPLOYEE_FILTER} ORDER BY full_name LIMIT $7 OFFSET $8"
    ))
    .bind(filter.search.as_deref())
    .bind(filter.company_id)
    .bind(filter.department_id)
    .bind(filter.position_id)
    .bind(filter.manager_id)
    .bind(filter.employment_status.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, filter: &EmployeeFilter) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM employees {EMPLOYEE_FILTER}"))
        .bind(filter.search.as_deref())
        .bind(filter.company_id)
        .bind(filter.department_id)
        .bind(filter.position_id)
        .bind(filter.manager_id)
        .bind(filter.employment_status.as_deref())
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

/// Self-service contact and payout fields, already merged with the stored values.
pub struct ProfileFields {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_encrypted: Option<Vec<u8>>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    fields: &ProfileFields,
) -> Result<Employee, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "UPDATE employees SET phone = $2, address = $3, bank_name = $4,
            bank_account_encrypted = $5, emergency_contact_name = $6,
            emergency_contact_phone = $7, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&fields.phone)
    .bind(&fields.address)
    .bind(&fields.bank_name)
    .bind(&fields.bank_account_encrypted)
    .bind(&fields.emergency_contact_name)
    .bind(&fields.emergency_contact_phone)
    .fetch_one(pool)
    .await
}

/// Soft delete: the row stays for history, the linked login is disabled.
pub async fn deactivate(
    pool: &PgPool,
    id: Uuid,
    termination_date: NaiveDate,
) -> Result<Employee, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let employee = sqlx::query_as::<_, Employee>(
        "UPDATE employees SET employment_status = 'inactive',
            termination_date = COALESCE(termination_date, $2), updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(termination_date)
    .fetch_one(&mut *tx)
    .await?;
    super::users::deactivate_for_employee(&mut *tx, id).await?;
    tx.commit().await?;
    Ok(employee)
}

// Documents

pub async fn add_document(
    pool: &PgPool,
    employee_id: Uuid,
    document_type: &str,
    file: &StoredFile,
    uploaded_by: Uuid,
) -> Result<EmployeeDocument, sqlx::Error> {
    sqlx::query_as::<_, EmployeeDocument>(
        "INSERT INTO employee_documents
            (employee_id, document_type, file_name, file_path, file_size, mime_type, uploaded_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(employee_id)
    .bind(document_type)
    .bind(&file.file_name)
    .bind(&file.file_path)
    .bind(file.file_size)
    .bind(&file.mime_type)
    .bind(uploaded_by)
    .fetch_one(pool)
    .await
}

pub async fn list_documents(
    pool: &PgPool,
    employee_id: Uuid,
) -> Result<Vec<EmployeeDocument>, sqlx::Error> {
    sqlx::query_as::<_, EmployeeDocument>(
        "SELECT * FROM employee_documents WHERE employee_id = $1 ORDER BY created_at DESC",
    )
    .bind(employee_id)
    .fetch_all(pool)
    .await
}

pub async fn find_document(
    pool: &PgPool,
    employee_id: Uuid,
    document_id: Uuid,
) -> Result<Option<EmployeeDocument>, sqlx::Error> {
    sqlx::query_as::<_, EmployeeDocument>(
        "SELECT * FROM employee_documents WHERE id = $1 AND employee_id = $2",
    )
    .bind(document_id)
    .bind(employee_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_document(pool: &PgPool, document_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM employee_documents WHERE id = $1")
        .bind(document_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
