use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error as ThisError;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UploadedFile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub original_filename: String,
    pub object_key: String,
    pub content_type: String,
    pub description: Option<String>,
    pub size_bytes: i64,
    pub sha256: String,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedFile {
    pub fn extension(&self) -> String {
        file_extension(&self.original_filename).unwrap_or_default()
    }

    pub fn is_text(&self) -> bool {
        self.content_type == "text/plain"
    }
}

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: Uuid,
    pub filename: String,
    pub description: Option<String>,
    pub file_type: String,
    pub content_type: String,
    pub file_size: i64,
    pub sha256: String,
    pub upload_date: DateTime<Utc>,
}

impl From<&UploadedFile> for FileResponse {
    fn from(file: &UploadedFile) -> Self {
        Self {
            id: file.id,
            filename: file.original_filename.clone(),
            description: file.description.clone(),
            file_type: file.extension(),
            content_type: file.content_type.clone(),
            file_size: file.size_bytes,
            sha256: file.sha256.clone(),
            upload_date: file.uploaded_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
}

#[derive(Debug, Serialize)]
pub struct FileAnalysisResponse {
    pub filename: String,
    pub analysis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

/// Extension → MIME type for every document type the analyzer accepts
pub const ALLOWED_FILE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
];

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024; // 10 MB

pub fn file_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// MIME type for an allowed filename, `None` when the type is not accepted
pub fn mime_for_filename(filename: &str) -> Option<&'static str> {
    let ext = file_extension(filename)?;
    ALLOWED_FILE_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == ext)
        .map(|(_, mime)| *mime)
}

#[derive(Debug, ThisError)]
pub enum StorageError {
    #[error("Failed to upload object {key}: {message}")]
    Upload { key: String, message: String },

    #[error("Object {key} not found: {message}")]
    NotFound { key: String, message: String },

    #[error("Failed to read object body: {0}")]
    Body(String),

    #[error("Failed to delete object {key}: {message}")]
    Delete { key: String, message: String },

    #[error("Bucket initialisation failed: {0}")]
    Bucket(String),
}
