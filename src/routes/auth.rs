use actix_web::{get, post, web, HttpResponse};
use sqlx::PgPool;

use crate::config::jwt::JwtSettings;
use crate::handlers::auth_handler::{auth_status, login_user, logout_user};
use crate::handlers::registration_handler::register_user;
use crate::middleware::auth::{AuthMiddleware, Claims};
use crate::models::auth::Credentials;

#[post("/register")]
async fn register(
    user_form: web::Json<Credentials>,
    pool: web::Data<PgPool>,
    jwt_settings: web::Data<JwtSettings>,
) -> HttpResponse {
    register_user(user_form, pool, jwt_settings).await
}

#[post("/login")]
async fn login(
    login_form: web::Json<Credentials>,
    pool: web::Data<PgPool>,
    jwt_settings: web::Data<JwtSettings>
) -> HttpResponse {
    login_user(login_form, pool, jwt_settings).await
}

#[post("/logout")]
async fn logout() -> HttpResponse {
    logout_user().await
}

#[get("/status", wrap = "AuthMiddleware")]
async fn status(claims: web::ReqData<Claims>) -> HttpResponse {
    auth_status(claims).await
}
