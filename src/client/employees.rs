use uuid::Uuid;

use crate::client::{file_part, ApiClient, ClientResult};
use crate::models::{EmployeeDocument, EmployeeMovement, EmployeeView};
use crate::pagination::Paginated;
use crate::routes::employees::{EmployeeRequest, ListEmployees, PageQuery};
use crate::routes::profile::{Profile, UpdateProfile};
use crate::routes::uploads::UploadResponse;

pub async fn list(
    client: &ApiClient,
    params: &ListEmployees,
) -> ClientResult<Paginated<EmployeeView>> {
    client.get_page("/employees", params).await
}

pub async fn get(client: &ApiClient, id: Uuid) -> ClientResult<EmployeeView> {
    client.get(&format!("/employees/{id}")).await
}

pub async fn create(client: &ApiClient, body: &EmployeeRequest) -> ClientResult<EmployeeView> {
    client.post("/employees", body).await
}

/// Partial update: `None` fields keep their stored value.
pub async fn update(
    client: &ApiClient,
    id: Uuid,
    body: &EmployeeRequest,
) -> ClientResult<EmployeeView> {
    client.put(&format!("/employees/{id}"), body).await
}

/// Soft delete: the employee becomes inactive and their login is disabled.
pub async fn deactivate(client: &ApiClient, id: Uuid) -> ClientResult<()> {
    client.delete(&format!("/employees/{id}")).await
}

pub async fn documents(client: &ApiClient, id: Uuid) -> ClientResult<Vec<EmployeeDocument>> {
    client.get(&format!("/employees/{id}/documents")).await
}

pub async fn delete_document(client: &ApiClient, id: Uuid, document_id: Uuid) -> ClientResult<()> {
    client
        .delete(&format!("/employees/{id}/documents/{document_id}"))
        .await
}

pub async fn movement_history(
    client: &ApiClient,
    id: Uuid,
    params: &PageQuery,
) -> ClientResult<Paginated<EmployeeMovement>> {
    client
        .get_page(&format!("/employees/{id}/movements"), params)
        .await
}

/// Upload a file, filed as an employee document when `employee_id` is given.
pub async fn upload_document(
    client: &ApiClient,
    file_name: &str,
    bytes: Vec<u8>,
    employee_id: Option<Uuid>,
    document_type: Option<&str>,
) -> ClientResult<UploadResponse> {
    let mut form = reqwest::multipart::Form::new().part("file", file_part(file_name, bytes));
    if let Some(id) = employee_id {
        form = form.text("employee_id", id.to_string());
    }
    if let Some(kind) = document_type {
        form = form.text("document_type", kind.to_string());
    }
    client.upload("/upload/documents", form).await
}

pub async fn profile(client: &ApiClient) -> ClientResult<Profile> {
    client.get("/profile").await
}

pub async fn update_profile(client: &ApiClient, body: &UpdateProfile) -> ClientResult<Profile> {
    client.put("/profile", body).await
}
