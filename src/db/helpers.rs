//! Helpers that turn query results into early-return error responses.
//!
//! ```ignore
//! let followup = match require_record(fetch_followup(pool, user_id, id).await, "Follow-up not found") {
//!     Ok(f) => f,
//!     Err(response) => return response,
//! };
//! ```

use actix_web::HttpResponse;
use serde_json::json;

/// Result type for database operations that return an HttpResponse on error
pub type DbResult<T> = Result<T, HttpResponse>;

/// Unwrap an optional database result, returning NotFound if None.
pub fn require_record<T>(
    result: Result<Option<T>, sqlx::Error>,
    not_found_message: &str,
) -> DbResult<T> {
    match result {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err(HttpResponse::NotFound().json(json!({
            "error": not_found_message
        }))),
        Err(e) => Err(database_error(e)),
    }
}

pub fn database_error(e: sqlx::Error) -> HttpResponse {
    tracing::error!("Database error: {}", e);
    HttpResponse::InternalServerError().json(json!({
        "error": "Database error"
    }))
}
