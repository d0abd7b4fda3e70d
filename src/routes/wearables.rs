use actix_web::{get, post, web, HttpResponse};
use sqlx::PgPool;

use crate::handlers::wearable_handler;
use crate::middleware::auth::Claims;
use crate::models::common::WindowQuery;
use crate::models::wearable::{
    ConnectRequest, DemoDataRequest, DisconnectRequest, FitbitCallbackRequest,
    IngestMetricRequest, TimeseriesQuery,
};
use crate::services::{FitbitService, GeminiService};

#[get("/status")]
async fn status(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    wearable_handler::wearable_status(pool, claims).await
}

#[post("/connect")]
async fn connect(
    pool: web::Data<PgPool>,
    fitbit: web::Data<FitbitService>,
    claims: web::ReqData<Claims>,
    data: web::Json<ConnectRequest>,
) -> HttpResponse {
    wearable_handler::connect_wearable(pool, fitbit, claims, data).await
}

#[post("/callback/fitbit")]
async fn fitbit_callback(
    pool: web::Data<PgPool>,
    fitbit: web::Data<FitbitService>,
    claims: web::ReqData<Claims>,
    data: web::Json<FitbitCallbackRequest>,
) -> HttpResponse {
    wearable_handler::fitbit_callback(pool, fitbit, claims, data).await
}

#[post("/disconnect")]
async fn disconnect(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    data: Option<web::Json<DisconnectRequest>>,
) -> HttpResponse {
    wearable_handler::disconnect_wearable(pool, claims, data).await
}

#[post("/demo-data")]
async fn demo_data(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    data: Option<web::Json<DemoDataRequest>>,
) -> HttpResponse {
    wearable_handler::generate_demo_data(pool, claims, data).await
}

#[post("/metrics")]
async fn ingest_metric(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    data: web::Json<IngestMetricRequest>,
) -> HttpResponse {
    wearable_handler::ingest_metric(pool, claims, data).await
}

#[post("/sync")]
async fn sync(
    pool: web::Data<PgPool>,
    fitbit: web::Data<FitbitService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    wearable_handler::sync_wearable(pool, fitbit, claims).await
}

#[get("/summary")]
async fn summary(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    query: web::Query<WindowQuery>,
) -> HttpResponse {
    wearable_handler::wearable_summary(pool, claims, query).await
}

#[get("/timeseries")]
async fn timeseries(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    query: web::Query<TimeseriesQuery>,
) -> HttpResponse {
    wearable_handler::wearable_timeseries(pool, claims, query).await
}

#[get("/recommendations")]
async fn recommendations(
    pool: web::Data<PgPool>,
    gemini: web::Data<GeminiService>,
    claims: web::ReqData<Claims>,
    query: web::Query<WindowQuery>,
) -> HttpResponse {
    wearable_handler::wearable_recommendations(pool, gemini, claims, query).await
}
