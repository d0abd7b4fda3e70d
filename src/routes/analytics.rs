use actix_web::{get, web, HttpResponse};
use sqlx::PgPool;

use crate::handlers::analytics_handler;
use crate::middleware::auth::Claims;
use crate::models::analytics::TrendsQuery;
use crate::services::GeminiService;

#[get("/dashboard")]
async fn dashboard(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    analytics_handler::dashboard(pool, claims).await
}

#[get("/trends")]
async fn trends(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    query: web::Query<TrendsQuery>,
) -> HttpResponse {
    analytics_handler::trends(pool, claims, query).await
}

#[get("/insights")]
async fn insights(
    pool: web::Data<PgPool>,
    gemini: web::Data<GeminiService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    analytics_handler::insights(pool, gemini, claims).await
}
