use actix_web::HttpResponse;
use serde_json::json;
use uuid::Uuid;

use crate::middleware::auth::Claims;

pub mod analytics_handler;
pub mod auth_handler;
pub mod backend_health_handler;
pub mod chat_handler;
pub mod file_handler;
pub mod followup_handler;
pub mod profile_handler;
pub mod registration_handler;
pub mod wearable_handler;

/// User id from the token subject, or a 400 response.
pub(crate) fn user_id_from_claims(claims: &Claims) -> Result<Uuid, HttpResponse> {
    claims.user_id().ok_or_else(|| {
        tracing::error!("Failed to parse user ID from token subject: {}", claims.sub);
        HttpResponse::BadRequest().json(json!({
            "error": "Invalid user ID"
        }))
    })
}

pub(crate) fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "error": message.into() }))
}
