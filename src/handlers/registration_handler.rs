use actix_web::{web, HttpResponse};
use secrecy::ExposeSecret;
use serde_json::json;
use sqlx::PgPool;

use crate::config::jwt::JwtSettings;
use crate::db::users::{insert_user_with_profile, username_exists};
use crate::middleware::auth::issue_token;
use crate::models::auth::{AuthResponse, Credentials};
use crate::utils::password::hash_password;

#[tracing::instrument(
    name = "Adding a new user",
    // Don't show arguments
    skip(user_form, pool, jwt_settings),
    fields(
        username = %user_form.username
    )
)]
pub async fn register_user(
    user_form: web::Json<Credentials>,
    pool: web::Data<PgPool>,
    jwt_settings: web::Data<JwtSettings>,
) -> HttpResponse {
    let username = user_form.username.trim();
    if username.is_empty() || user_form.password.expose_secret().is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "Username and password are required"
        }));
    }

    match username_exists(&pool, username).await {
        Ok(true) => {
            return HttpResponse::BadRequest().json(json!({
                "error": "Username already exists"
            }));
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!("Failed to check username: {:?}", e);
            return HttpResponse::InternalServerError().finish();
        }
    }

    let password_hash = match hash_password(user_form.password.expose_secret()) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Failed to hash password: {:?}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let user_id = match insert_user_with_profile(&pool, username, &password_hash).await {
        Ok(id) => id,
        // Lost a race against a concurrent registration of the same name
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return HttpResponse::BadRequest().json(json!({
                "error": "Username already exists"
            }));
        }
        Err(e) => {
            tracing::error!("Failed to register user: {:?}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let token = match issue_token(user_id, username, &jwt_settings) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Error generating JWT token: {:?}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    tracing::info!("User registered: {}", user_id);
    HttpResponse::Created().json(AuthResponse {
        message: "Registration successful".to_string(),
        username: username.to_string(),
        token,
    })
}
