use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::db::helpers::{database_error, require_record};
use crate::db::profile::{fetch_profile, replace_profile};
use crate::handlers::{bad_request, user_id_from_claims};
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::profile::UpdateProfileRequest;

#[tracing::instrument(
    name = "Get user profile",
    skip(pool, claims),
    fields(username = %claims.username)
)]
pub async fn get_profile(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match require_record(fetch_profile(&pool, user_id).await, "Profile not found") {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(response) => response,
    }
}

#[tracing::instrument(
    name = "Update user profile",
    skip(pool, claims, body),
    fields(username = %claims.username)
)]
pub async fn update_profile(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: web::Json<UpdateProfileRequest>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    if let Err(message) = body.validate() {
        return bad_request(message);
    }

    let profile = body.into_inner().into_profile();
    match replace_profile(&pool, user_id, &profile).await {
        Ok(()) => {
            tracing::info!("Profile updated for user {}", user_id);
            HttpResponse::Ok().json(ApiResponse::success("Profile updated successfully", profile))
        }
        Err(e) => database_error(e),
    }
}
