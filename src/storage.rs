use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata returned for every stored upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
}

/// Where uploaded file bytes live. Only the relative `file_path` is stored in the database.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn save(
        &self,
        folder: &str,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, String>;

    async fn read(&self, file_path: &str) -> Result<Vec<u8>, String>;

    async fn delete(&self, file_path: &str) -> Result<(), String>;
}

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, file_path: &str) -> Result<PathBuf, String> {
        let relative = Path::new(file_path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || file_path.is_empty() {
            return Err(format!("Invalid file path: {file_path}"));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn save(
        &self,
        folder: &str,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, String> {
        let now = Utc::now();
        let extension = extension_of(file_name).unwrap_or_else(|| "bin".to_string());
        let relative = format!(
            "{folder}/{}/{:02}/{}.{extension}",
            now.year(),
            now.month(),
            Uuid::now_v7()
        );
        let target = self.resolve(&relative)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("Failed to create upload directory: {e}"))?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| format!("Failed to write upload: {e}"))?;

        tracing::debug!("Stored {} bytes at {relative}", bytes.len());

        Ok(StoredFile {
            file_path: relative,
            file_name: sanitize_file_name(file_name),
            file_size: bytes.len() as i64,
            mime_type: mime_type.to_string(),
        })
    }

    async fn read(&self, file_path: &str) -> Result<Vec<u8>, String> {
        let path = self.resolve(file_path)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| format!("Failed to read {file_path}: {e}"))
    }

    async fn delete(&self, file_path: &str) -> Result<(), String> {
        let path = self.resolve(file_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("Failed to delete {file_path}: {e}")),
        }
    }
}

/// Accepted upload types, keyed by lowercase extension.
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
];

pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Resolve the MIME type from the extension, rejecting anything outside the allow-list.
pub fn mime_for(file_name: &str) -> Result<&'static str, String> {
    let ext = extension_of(file_name).ok_or_else(|| "File has no extension".to_string())?;
    ALLOWED_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == ext)
        .map(|(_, mime)| *mime)
        .ok_or_else(|| format!("File type .{ext} is not allowed"))
}

/// Strip directories and control characters from a client-supplied name.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect();
    if cleaned.trim().is_empty() {
        "file".to_string()
    } else {
        cleaned.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_allow_list() {
        assert_eq!(mime_for("Kontrak.PDF").unwrap(), "application/pdf");
        assert_eq!(mime_for("photo.jpeg").unwrap(), "image/jpeg");
        assert!(mime_for("script.sh").is_err());
        assert!(mime_for("README").is_err());
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\cv.pdf"), "cv.pdf");
        assert_eq!(sanitize_file_name("   "), "file");
    }

    #[test]
    fn resolve_rejects_traversal() {
        let storage = LocalStorage::new("/tmp/hrms");
        assert!(storage.resolve("../secret").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
        assert!(storage.resolve("").is_err());
        assert!(storage.resolve("documents/2026/01/a.pdf").is_ok());
    }

    #[tokio::test]
    async fn save_read_delete() {
        let root = std::env::temp_dir().join(format!("hrms-storage-{}", Uuid::now_v7()));
        let storage = LocalStorage::new(&root);

        let stored = storage
            .save("documents", "ktp.png", "image/png", b"png-bytes")
            .await
            .unwrap();
        assert!(stored.file_path.starts_with("documents/"));
        assert!(stored.file_path.ends_with(".png"));
        assert_eq!(stored.file_size, 9);

        assert_eq!(storage.read(&stored.file_path).await.unwrap(), b"png-bytes");
        storage.delete(&stored.file_path).await.unwrap();
        assert!(storage.read(&stored.file_path).await.is_err());

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
