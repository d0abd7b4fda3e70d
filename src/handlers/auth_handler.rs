use actix_web::{web, HttpResponse};
use secrecy::ExposeSecret;
use serde_json::json;
use sqlx::PgPool;

use crate::config::jwt::JwtSettings;
use crate::db::users::find_user_by_username;
use crate::middleware::auth::{issue_token, Claims};
use crate::models::auth::{AuthResponse, AuthStatusResponse, Credentials};
use crate::utils::password::verify_password;

#[tracing::instrument(
    name = "Login user attempt",
    skip(login_form, pool, jwt_settings),
    fields(
        username = %login_form.username
    )
)]
pub async fn login_user(
    login_form: web::Json<Credentials>,
    pool: web::Data<PgPool>,
    jwt_settings: web::Data<JwtSettings>
) -> HttpResponse {
    let user = match find_user_by_username(&pool, login_form.username.trim()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::info!("User not found or invalid credentials");
            return invalid_credentials();
        }
        Err(e) => {
            tracing::error!("Database error occurred: {:?}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    if !verify_password(login_form.password.expose_secret(), &user.password_hash) {
        tracing::info!("Invalid password");
        return invalid_credentials();
    }

    let token = match issue_token(user.id, &user.username, &jwt_settings) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Error generating JWT token: {:?}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    HttpResponse::Ok().json(AuthResponse {
        message: "Login successful".to_string(),
        username: user.username,
        token,
    })
}

fn invalid_credentials() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({
        "error": "Invalid credentials"
    }))
}

/// Tokens are stateless; the client drops its copy.
pub async fn logout_user() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Logged out successfully"
    }))
}

#[tracing::instrument(name = "Auth status", skip(claims), fields(username = %claims.username))]
pub async fn auth_status(claims: web::ReqData<Claims>) -> HttpResponse {
    HttpResponse::Ok().json(AuthStatusResponse {
        authenticated: true,
        username: Some(claims.username.clone()),
    })
}
