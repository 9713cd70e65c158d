use bytes::Bytes;
use uuid::Uuid;

use crate::client::{file_part, ApiClient, ClientResult};
use crate::models::{Template, TemplateVersion};
use crate::pagination::Paginated;
use crate::routes::templates::{CreateTemplate, ListTemplates, TemplateRequest};

pub async fn list(client: &ApiClient, params: &ListTemplates) -> ClientResult<Paginated<Template>> {
    client.get_page("/templates", params).await
}

pub async fn get(client: &ApiClient, id: Uuid) -> ClientResult<Template> {
    client.get(&format!("/templates/{id}")).await
}

/// Register a template for a file already uploaded through `/upload/documents`.
pub async fn create(client: &ApiClient, body: &CreateTemplate) -> ClientResult<Template> {
    client.post("/templates", body).await
}

pub async fn update(
    client: &ApiClient,
    id: Uuid,
    body: &TemplateRequest,
) -> ClientResult<Template> {
    client.put(&format!("/templates/{id}"), body).await
}

pub async fn delete(client: &ApiClient, id: Uuid) -> ClientResult<()> {
    client.delete(&format!("/templates/{id}")).await
}

/// Upload a new template; it starts at version 1.
pub async fn upload(
    client: &ApiClient,
    meta: &TemplateRequest,
    file_name: &str,
    bytes: Vec<u8>,
) -> ClientResult<Template> {
    let mut form = reqwest::multipart::Form::new()
        .text("name", meta.name.clone())
        .text("category", meta.category.clone())
        .part("file", file_part(file_name, bytes));
    if let Some(description) = &meta.description {
        form = form.text("description", description.clone());
    }
    client.upload("/templates/upload", form).await
}

pub async fn upload_version(
    client: &ApiClient,
    id: Uuid,
    file_name: &str,
    bytes: Vec<u8>,
) -> ClientResult<Template> {
    let form = reqwest::multipart::Form::new().part("file", file_part(file_name, bytes));
    client.upload(&format!("/templates/{id}/upload"), form).await
}

pub async fn versions(client: &ApiClient, id: Uuid) -> ClientResult<Vec<TemplateVersion>> {
    client.get(&format!("/templates/{id}/versions")).await
}

pub async fn download(client: &ApiClient, id: Uuid) -> ClientResult<Bytes> {
    client.download(&format!("/templates/{id}/download")).await
}
