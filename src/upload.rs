use std::collections::HashMap;

use axum::http::HeaderMap;
use bytes::Bytes;

use crate::error::AppError;
use crate::storage::{self, FileStorage, StoredFile};

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// A parsed multipart body: at most one `file` part plus plain text fields.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl MultipartForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn require_file(&mut self) -> Result<UploadedFile, AppError> {
        self.file
            .take()
            .ok_or_else(|| AppError::BadRequest("Missing 'file' part".to_string()))
    }
}

/// Parse multipart form data using multer.
pub async fn parse_multipart(headers: &HeaderMap, body: Bytes) -> Result<MultipartForm, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Expected multipart/form-data with a boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut form = MultipartForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let name = field.name().unwrap_or("unknown").to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| format!("File read error: {e}"))?;
            form.file = Some(UploadedFile { file_name, bytes });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| format!("Field read error: {e}"))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// Validate type and size of an uploaded file, then hand it to storage.
pub async fn store(
    storage: &dyn FileStorage,
    folder: &str,
    file: &UploadedFile,
) -> Result<StoredFile, AppError> {
    if file.bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    let mime = storage::mime_for(&file.file_name).map_err(AppError::Validation)?;

    storage
        .save(folder, &file.file_name, mime, &file.bytes)
        .await
        .map_err(AppError::Internal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multipart_body(boundary: &str) -> Bytes {
        let body = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"document_type\"\r\n\r\n\
             contract\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"kontrak.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n\
             %PDF-1.4\r\n\
             --{b}--\r\n",
            b = boundary
        );
        Bytes::from(body)
    }

    #[tokio::test]
    async fn parses_file_and_fields() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            "multipart/form-data; boundary=XyZ".parse().unwrap(),
        );

        let mut form = parse_multipart(&headers, multipart_body("XyZ")).await.unwrap();
        assert_eq!(form.field("document_type"), Some("contract"));
        let file = form.require_file().unwrap();
        assert_eq!(file.file_name, "kontrak.pdf");
        assert_eq!(&file.bytes[..], b"%PDF-1.4");
    }

    #[tokio::test]
    async fn missing_boundary_is_an_error() {
        let headers = HeaderMap::new();
        assert!(parse_multipart(&headers, Bytes::new()).await.is_err());
    }
}
