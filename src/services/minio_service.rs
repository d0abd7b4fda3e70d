use crate::config::minio::MinIOSettings;
use crate::models::file::StorageError;
use aws_sdk_s3::{Client as S3Client, primitives::ByteStream};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Document storage on an S3-compatible server
#[derive(Clone, Debug)]
pub struct MinIOService {
    client: Arc<S3Client>,
    bucket_name: String,
}

impl MinIOService {
    /// Builds the client only; nothing is sent until `init_bucket` or the
    /// first object call.
    pub fn new(settings: &MinIOSettings) -> Self {
        Self {
            client: Arc::new(settings.s3_client()),
            bucket_name: settings.bucket_name.clone(),
        }
    }

    pub fn object_key(user_id: Uuid, file_id: Uuid, extension: &str) -> String {
        format!("users/{}/{}.{}", user_id, file_id, extension)
    }

    pub async fn init_bucket(&self) -> Result<(), StorageError> {
        info!("Initializing MinIO bucket: {}", self.bucket_name);

        let bucket_exists = self
            .client
            .head_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
            .is_ok();

        if bucket_exists {
            info!("MinIO bucket already exists");
            return Ok(());
        }

        info!("Creating MinIO bucket: {}", self.bucket_name);
        self.client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
            .map_err(|e| StorageError::Bucket(e.to_string()))?;
        info!("MinIO bucket created successfully");
        Ok(())
    }

    pub async fn upload_file(
        &self,
        object_key: &str,
        file_data: Bytes,
        content_type: &str,
        user_id: Uuid,
    ) -> Result<(), StorageError> {
        info!("Uploading file to MinIO: {} (size: {} bytes)", object_key, file_data.len());

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(object_key)
            .body(ByteStream::from(file_data))
            .content_type(content_type)
            .metadata("user_id", user_id.to_string())
            .metadata("uploaded_at", chrono::Utc::now().to_rfc3339())
            .send()
            .await
            .map_err(|e| {
                error!("Failed to upload file to MinIO: {}", e);
                StorageError::Upload {
                    key: object_key.to_string(),
                    message: e.to_string(),
                }
            })?;

        info!("File uploaded successfully to MinIO: {}", object_key);
        Ok(())
    }

    /// Object bytes and their stored content type
    pub async fn get_file(&self, object_key: &str) -> Result<(Bytes, String), StorageError> {
        info!("Downloading file from MinIO: {}", object_key);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(object_key)
            .send()
            .await
            .map_err(|e| {
                warn!("File not found in MinIO: {} - {}", object_key, e);
                StorageError::NotFound {
                    key: object_key.to_string(),
                    message: e.to_string(),
                }
            })?;

        let content_type = response
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Body(e.to_string()))?
            .into_bytes();

        info!(
            "File downloaded successfully from MinIO: {} (size: {} bytes)",
            object_key,
            bytes.len()
        );
        Ok((bytes, content_type))
    }

    pub async fn delete_file(&self, object_key: &str) -> Result<(), StorageError> {
        info!("Deleting file from MinIO: {}", object_key);

        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(object_key)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to delete file from MinIO: {}", e);
                StorageError::Delete {
                    key: object_key.to_string(),
                    message: e.to_string(),
                }
            })?;

        info!("File deleted successfully from MinIO: {}", object_key);
        Ok(())
    }
}
