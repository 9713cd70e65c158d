use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::EmployeeDocument;
use crate::pagination::Envelope;
use crate::routes::ApiResult;
use crate::state::SharedState;
use crate::storage::StoredFile;
use crate::upload;

#[derive(Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub file: StoredFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<EmployeeDocument>,
}

/// `POST /upload/documents`: store a file, optionally filing it against an employee.
pub async fn upload_document(
    auth: AuthUser,
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<UploadResponse> {
    let mut form = upload::parse_multipart(&headers, body)
        .await
        .map_err(AppError::BadRequest)?;
    let file = form.require_file()?;

    let employee_id = form
        .field("employee_id")
        .map(|raw| {
            Uuid::parse_str(raw)
                .map_err(|_| AppError::Validation("employee_id is not a valid id".to_string()))
        })
        .transpose()?;
    if let Some(employee_id) = employee_id {
        if auth.employee_id != Some(employee_id) {
            auth.require_hr()?;
        }
        db::employees::find_by_id(&state.pool, employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;
    }
    let document_type = form.field("document_type").unwrap_or("other").to_string();

    let folder = match employee_id {
        Some(id) => format!("documents/{id}"),
        None => "documents".to_string(),
    };
    let stored = upload::store(state.storage.as_ref(), &folder, &file).await?;

    let document = match employee_id {
        Some(employee_id) => {
            let document = db::employees::add_document(
                &state.pool,
                employee_id,
                &document_type,
                &stored,
                auth.user_id,
            )
            .await?;
            audit::log_event(
                &state.pool,
                Some(auth.user_id),
                "employee_document.uploaded",
                "employee",
                Some(employee_id),
                Some(serde_json::json!({
                    "document_id": document.id,
                    "document_type": document_type,
                })),
            )
            .await;
            Some(document)
        }
        None => None,
    };

    tracing::debug!(path = %stored.file_path, size = stored.file_size, "stored upload");
    Ok(Json(Envelope::new(UploadResponse {
        file: stored,
        document,
    })))
}
