use sqlx::PgPool;
use uuid::Uuid;

use crate::models::file::UploadedFile;

const FILE_COLUMNS: &str = "id, user_id, original_filename, object_key, content_type, description, size_bytes, sha256, uploaded_at";

pub async fn insert_file(pool: &PgPool, file: &UploadedFile) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO uploaded_files (
            id, user_id, original_filename, object_key, content_type,
            description, size_bytes, sha256, uploaded_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(file.id)
    .bind(file.user_id)
    .bind(&file.original_filename)
    .bind(&file.object_key)
    .bind(&file.content_type)
    .bind(&file.description)
    .bind(file.size_bytes)
    .bind(&file.sha256)
    .bind(file.uploaded_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn fetch_user_files(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<UploadedFile>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM uploaded_files WHERE user_id = $1 ORDER BY uploaded_at DESC",
        FILE_COLUMNS
    );
    sqlx::query_as::<_, UploadedFile>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
}

pub async fn fetch_user_file(
    pool: &PgPool,
    user_id: Uuid,
    file_id: Uuid,
) -> Result<Option<UploadedFile>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM uploaded_files WHERE id = $1 AND user_id = $2",
        FILE_COLUMNS
    );
    sqlx::query_as::<_, UploadedFile>(&sql)
        .bind(file_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn delete_file_record(
    pool: &PgPool,
    user_id: Uuid,
    file_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM uploaded_files WHERE id = $1 AND user_id = $2")
        .bind(file_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
