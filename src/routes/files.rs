use actix_multipart::form::MultipartForm;
use actix_web::{delete, get, post, web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::handlers::file_handler::{
    analyze_file, delete_file, list_files, upload_file, FileUploadForm,
};
use crate::middleware::auth::Claims;
use crate::services::{GeminiService, MinIOService};

#[post("/upload")]
async fn upload(
    form: MultipartForm<FileUploadForm>,
    pool: web::Data<PgPool>,
    minio_service: web::Data<MinIOService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    upload_file(form, pool, minio_service, claims).await
}

#[get("")]
async fn get_files(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    list_files(pool, claims).await
}

#[delete("/{file_id}")]
async fn remove_file(
    pool: web::Data<PgPool>,
    minio_service: web::Data<MinIOService>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    delete_file(pool, minio_service, claims, path).await
}

#[post("/analyze/{file_id}")]
async fn analyze(
    pool: web::Data<PgPool>,
    minio_service: web::Data<MinIOService>,
    gemini: web::Data<GeminiService>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    analyze_file(pool, minio_service, gemini, claims, path).await
}
