use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_web::{web, HttpResponse};
use bytes::Bytes;
use chrono::Utc;
use serde_json::json;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::context::build_profile_context;
use crate::context::prompt::{
    assemble_prompt, file_analysis_fallback, file_analysis_question, resolve_outcome,
};
use crate::db::files::{delete_file_record, fetch_user_file, fetch_user_files, insert_file};
use crate::db::helpers::{database_error, require_record};
use crate::db::profile::fetch_profile;
use crate::handlers::{bad_request, user_id_from_claims};
use crate::middleware::auth::Claims;
use crate::models::file::{
    file_extension, mime_for_filename, FileAnalysisResponse, FileListResponse, FileResponse,
    UploadedFile, ALLOWED_FILE_TYPES, MAX_FILE_SIZE,
};
use crate::services::{GeminiService, MinIOService};

/// Text files longer than this are cut before going into the prompt
const MAX_INLINE_TEXT_CHARS: usize = 20_000;

#[derive(Debug, MultipartForm)]
pub struct FileUploadForm {
    // Slightly above MAX_FILE_SIZE so oversize uploads get a readable error
    #[multipart(limit = "11MB")]
    pub file: TempFile,
    pub description: Option<Text<String>>,
}

#[tracing::instrument(
    name = "Upload document",
    skip(form, pool, minio_service, claims),
    fields(
        username = %claims.username,
        file_name = %form.file.file_name.as_deref().unwrap_or("unknown")
    )
)]
pub async fn upload_file(
    MultipartForm(form): MultipartForm<FileUploadForm>,
    pool: web::Data<PgPool>,
    minio_service: web::Data<MinIOService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let original_filename = form
        .file
        .file_name
        .as_deref()
        .map(str::trim)
        .unwrap_or("")
        .to_string();
    if original_filename.is_empty() {
        return bad_request("No file selected");
    }

    let (extension, content_type) = match (file_extension(&original_filename), mime_for_filename(&original_filename)) {
        (Some(ext), Some(mime)) => (ext, mime),
        _ => {
            let allowed: Vec<&str> = ALLOWED_FILE_TYPES.iter().map(|(ext, _)| *ext).collect();
            return bad_request(format!("File type not allowed. Allowed types: {}", allowed.join(", ")));
        }
    };

    if form.file.size > MAX_FILE_SIZE {
        return bad_request(format!(
            "File too large. Maximum size: {} MB",
            MAX_FILE_SIZE / (1024 * 1024)
        ));
    }

    let data = match std::fs::read(form.file.file.path()) {
        Ok(data) => Bytes::from(data),
        Err(e) => {
            tracing::error!("Failed to read uploaded file: {}", e);
            return HttpResponse::InternalServerError().json(json!({
                "error": "Failed to process file"
            }));
        }
    };

    let file_id = Uuid::new_v4();
    let object_key = MinIOService::object_key(user_id, file_id, &extension);
    let sha256 = hex::encode(Sha256::digest(&data));
    let size_bytes = data.len() as i64;

    if let Err(e) = minio_service
        .upload_file(&object_key, data, content_type, user_id)
        .await
    {
        tracing::error!("Storage upload failed: {}", e);
        return HttpResponse::InternalServerError().json(json!({
            "error": "Failed to store file"
        }));
    }

    let record = UploadedFile {
        id: file_id,
        user_id,
        original_filename,
        object_key,
        content_type: content_type.to_string(),
        description: form
            .description
            .map(|d| d.into_inner().trim().to_string())
            .filter(|d| !d.is_empty()),
        size_bytes,
        sha256,
        uploaded_at: Utc::now(),
    };

    if let Err(e) = insert_file(&pool, &record).await {
        // Don't leave an orphaned object behind
        if let Err(storage_err) = minio_service.delete_file(&record.object_key).await {
            tracing::warn!("Failed to remove orphaned object: {}", storage_err);
        }
        return database_error(e);
    }

    tracing::info!("Document {} uploaded ({} bytes)", record.id, record.size_bytes);
    HttpResponse::Created().json(json!({
        "message": "File uploaded successfully",
        "file": FileResponse::from(&record)
    }))
}

#[tracing::instrument(
    name = "List documents",
    skip(pool, claims),
    fields(username = %claims.username)
)]
pub async fn list_files(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match fetch_user_files(&pool, user_id).await {
        Ok(files) => HttpResponse::Ok().json(FileListResponse {
            files: files.iter().map(FileResponse::from).collect(),
        }),
        Err(e) => database_error(e),
    }
}

#[tracing::instrument(
    name = "Delete document",
    skip(pool, minio_service, claims),
    fields(username = %claims.username, file_id = %path)
)]
pub async fn delete_file(
    pool: web::Data<PgPool>,
    minio_service: web::Data<MinIOService>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let file_id = path.into_inner();

    let file = match require_record(fetch_user_file(&pool, user_id, file_id).await, "File not found") {
        Ok(file) => file,
        Err(response) => return response,
    };

    // A missing object must not block removing the row
    if let Err(e) = minio_service.delete_file(&file.object_key).await {
        tracing::warn!("Failed to delete stored object {}: {}", file.object_key, e);
    }

    match delete_file_record(&pool, user_id, file_id).await {
        Ok(_) => HttpResponse::Ok().json(json!({ "message": "File deleted successfully" })),
        Err(e) => database_error(e),
    }
}

#[tracing::instrument(
    name = "Analyze document",
    skip(pool, minio_service, gemini, claims),
    fields(username = %claims.username, file_id = %path)
)]
pub async fn analyze_file(
    pool: web::Data<PgPool>,
    minio_service: web::Data<MinIOService>,
    gemini: web::Data<GeminiService>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let file_id = path.into_inner();

    let file = match require_record(fetch_user_file(&pool, user_id, file_id).await, "File not found") {
        Ok(file) => file,
        Err(response) => return response,
    };

    let profile = match fetch_profile(&pool, user_id).await {
        Ok(profile) => profile,
        Err(e) => return database_error(e),
    };
    let profile_block = build_profile_context(profile.as_ref());
    let question = file_analysis_question(&file.original_filename, file.description.as_deref());

    let result = match minio_service.get_file(&file.object_key).await {
        Ok((data, _)) if file.is_text() => {
            let text: String = String::from_utf8_lossy(&data)
                .chars()
                .take(MAX_INLINE_TEXT_CHARS)
                .collect();
            let document_block = format!("Document contents ({}):\n{}", file.original_filename, text);
            let prompt = assemble_prompt(&profile_block, &document_block, &question);
            gemini.generate_text(&prompt).await
        }
        Ok((data, _)) => {
            let prompt = assemble_prompt(&profile_block, "", &question);
            gemini
                .generate_with_attachment(&prompt, &data, &file.content_type)
                .await
        }
        Err(e) => {
            tracing::error!("Failed to load document for analysis: {}", e);
            return HttpResponse::InternalServerError().json(json!({
                "error": "Failed to load file"
            }));
        }
    };

    let outcome = resolve_outcome(result, || file_analysis_fallback(&file.original_filename));

    HttpResponse::Ok().json(FileAnalysisResponse {
        filename: file.original_filename.clone(),
        fallback: outcome.fallback_flag(),
        analysis: outcome.into_text(),
    })
}
