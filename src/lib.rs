use actix_web::{http, web, App, HttpServer};
use actix_web::dev::Server;
use tracing_actix_web::TracingLogger;
use sqlx::PgPool;
use std::net::TcpListener;
use actix_cors::Cors;

pub mod config;
pub mod context;
mod routes;
mod handlers;
pub mod models;
pub mod utils;
pub mod middleware;
pub mod db;
pub mod services;
pub mod telemetry;
use crate::routes::init_routes;
use crate::config::jwt::JwtSettings;
use crate::services::{FitbitService, GeminiService, MinIOService};
use std::sync::Arc;

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    jwt_settings: JwtSettings,
    gemini_service: GeminiService,
    minio_service: MinIOService,
    fitbit_service: Arc<FitbitService>,
    allowed_origins: Vec<String>,
) -> Result<Server, std::io::Error> {
    let db_pool_data = web::Data::new(db_pool);
    let jwt_settings = web::Data::new(jwt_settings);
    let gemini_data = web::Data::new(gemini_service);
    let minio_service_data = web::Data::new(minio_service);
    // Shared with the scheduler, so it is already behind an Arc
    let fitbit_data = web::Data::from(fitbit_service);

    let server = HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![
                http::header::AUTHORIZATION,
                http::header::ACCEPT,
                http::header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(db_pool_data.clone())
            .app_data(jwt_settings.clone())
            .app_data(gemini_data.clone())
            .app_data(minio_service_data.clone())
            .app_data(fitbit_data.clone())
            .configure(init_routes)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
