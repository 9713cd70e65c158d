use uuid::Uuid;

use crate::client::{ApiClient, ClientError, ClientResult};
use crate::models::EmployeeMovement;
use crate::pagination::Paginated;
use crate::routes::movements::{CreateMovement, DecisionNotes, ListMovements, ReasonRequest};

pub async fn list(
    client: &ApiClient,
    params: &ListMovements,
) -> ClientResult<Paginated<EmployeeMovement>> {
    client.get_page("/movements", params).await
}

pub async fn get(client: &ApiClient, id: Uuid) -> ClientResult<EmployeeMovement> {
    client.get(&format!("/movements/{id}")).await
}

pub async fn create(client: &ApiClient, body: &CreateMovement) -> ClientResult<EmployeeMovement> {
    client.post("/movements", body).await
}

/// Only drafts and pending movements can be deleted; the server answers 409 otherwise.
pub async fn delete(client: &ApiClient, id: Uuid) -> ClientResult<()> {
    client.delete(&format!("/movements/{id}")).await
}

pub async fn submit(client: &ApiClient, id: Uuid) -> ClientResult<EmployeeMovement> {
    client.post_empty(&format!("/movements/{id}/submit")).await
}

pub async fn approve(
    client: &ApiClient,
    id: Uuid,
    notes: Option<&str>,
) -> ClientResult<EmployeeMovement> {
    let body = DecisionNotes {
        notes: notes.map(str::to_string),
    };
    client.post(&format!("/movements/{id}/approve"), &body).await
}

/// Refuses a blank reason without contacting the server.
pub async fn reject(client: &ApiClient, id: Uuid, reason: &str) -> ClientResult<EmployeeMovement> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ClientError::InvalidInput(
            "A rejection reason is required".to_string(),
        ));
    }
    let body = ReasonRequest {
        reason: Some(reason.to_string()),
    };
    client.post(&format!("/movements/{id}/reject"), &body).await
}

pub async fn apply(client: &ApiClient, id: Uuid) -> ClientResult<EmployeeMovement> {
    client.post_empty(&format!("/movements/{id}/apply")).await
}

pub async fn cancel(
    client: &ApiClient,
    id: Uuid,
    reason: Option<&str>,
) -> ClientResult<EmployeeMovement> {
    let body = ReasonRequest {
        reason: reason.map(str::to_string),
    };
    client.post(&format!("/movements/{id}/cancel"), &body).await
}
