use std::net::TcpListener;
use std::sync::Arc;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use medlm_backend::run;
use medlm_backend::config::settings::get_config;
use medlm_backend::telemetry::{get_subscriber, init_subscriber};
use medlm_backend::services::{FitbitService, GeminiService, MinIOService, SchedulerService};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Panic if we can't read the config
    let config = get_config().expect("Failed to read the config.");

    let subscriber = get_subscriber(
        "medlm-backend".into(),
        config.application.log_level.clone(),
        std::io::stdout
    );
    init_subscriber(subscriber);

    // Only try to establish connection when actually used
    let connection_pool = PgPoolOptions::new()
        .max_connections(32)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_lazy_with(
            config
                .database
                .connect_options()
                .expect("Invalid database settings"),
        );

    let gemini_service = GeminiService::new(config.gemini.clone())
        .expect("Failed to create Gemini client");

    let minio_service = MinIOService::new(&config.minio);
    if let Err(e) = minio_service.init_bucket().await {
        // Document endpoints fail until storage is reachable; the rest keeps working
        tracing::warn!("Failed to initialize document bucket: {}", e);
    }

    // OAuth state tokens are signed with the JWT secret
    let fitbit_service = Arc::new(
        FitbitService::new(config.fitbit.clone(), config.jwt.secret.clone())
            .expect("Failed to create Fitbit client"),
    );

    let scheduler_service = match SchedulerService::new(connection_pool.clone(), fitbit_service.clone()).await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            tracing::error!("Failed to create scheduler service: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = scheduler_service.start().await {
        tracing::error!("Failed to start scheduler: {}", e);
        std::process::exit(1);
    }

    let address = format!("{}:{}", config.application.host, config.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Listening on {}", address);

    run(
        listener,
        connection_pool,
        config.jwt.clone(),
        gemini_service,
        minio_service,
        fitbit_service,
        config.application.allowed_origins.clone(),
    )?.await?;

    if let Err(e) = scheduler_service.stop().await {
        tracing::warn!("Failed to stop scheduler: {}", e);
    }
    Ok(())
}
