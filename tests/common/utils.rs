use secrecy::SecretString;
use serde_json::json;
use sqlx::{PgPool, PgConnection, Connection, Executor};
use std::net::TcpListener;
use std::sync::Arc;
use uuid::Uuid;
use once_cell::sync::Lazy;
use reqwest::Client;

use medlm_backend::run;
use medlm_backend::config::settings::{get_config, DatabaseSettings};
use medlm_backend::services::{FitbitService, GeminiService, MinIOService};
use medlm_backend::telemetry::{get_subscriber, init_subscriber};

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::stdout
        );
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::sink
        );
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
}

pub struct TestUser {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

/// Spawns the app on a random port against a fresh database.
///
/// The model key and Fitbit credentials are blanked so every model call
/// takes the fallback path and no request leaves the machine.
pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut configuration = get_config().expect("Failed to read configuration.");
    configuration.database.db_name = Uuid::new_v4().to_string();
    configuration.database.db_url = None;
    configuration.gemini.api_key = SecretString::new("".into());
    configuration.fitbit.client_id = String::new();
    configuration.fitbit.client_secret = SecretString::new("".into());

    let connection_pool = configure_db(&configuration.database).await;
    let gemini_service = GeminiService::new(configuration.gemini.clone())
        .expect("Failed to build Gemini client");
    let minio_service = MinIOService::new(&configuration.minio);
    // Only the document tests need storage; the others run without MinIO
    if let Err(e) = minio_service.init_bucket().await {
        tracing::warn!("MinIO bucket not available for tests: {}", e);
    }
    let fitbit_service = Arc::new(
        FitbitService::new(configuration.fitbit.clone(), configuration.jwt.secret.clone())
            .expect("Failed to build Fitbit client"),
    );

    let server = run(
        listener,
        connection_pool.clone(),
        configuration.jwt.clone(),
        gemini_service,
        minio_service,
        fitbit_service,
        configuration.application.allowed_origins.clone(),
    )
    .expect("Failed to bind address");
    // Launch the server as a background task
    let _ = tokio::spawn(server);

    TestApp {
        address,
        db_pool: connection_pool,
    }
}

pub async fn configure_db(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect_with(&config.server_options())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.db_name).as_str())
        .await
        .expect("Failed to create database.");

    // Migrate database
    let connection_pool = PgPool::connect_with(
        config.connect_options().expect("Invalid database settings"),
    )
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database");

    connection_pool
}

pub async fn create_test_user_and_login(app_address: &str) -> TestUser {
    let client = Client::new();
    let username = format!("testuser{}", Uuid::new_v4().simple());
    let password = "password123";

    let register_response = client
        .post(&format!("{}/auth/register", app_address))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to register user.");
    assert_eq!(register_response.status().as_u16(), 201);

    let login_response = client
        .post(&format!("{}/auth/login", app_address))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to execute login request.");

    let login_response: serde_json::Value = login_response.json().await.expect("Failed to parse login response");
    let token = login_response["token"].as_str().expect("No token in response").to_string();

    TestUser {
        user_id: user_id_from_token(&token),
        username,
        token,
    }
}

/// Reads the `sub` claim without verifying the signature.
fn user_id_from_token(token: &str) -> Uuid {
    use base64::Engine;

    let payload = token.split('.').nth(1).expect("Malformed token");
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .expect("Token payload is not base64");
    let claims: serde_json::Value = serde_json::from_slice(&bytes).expect("Token payload is not JSON");
    Uuid::parse_str(claims["sub"].as_str().expect("No sub claim")).expect("sub is not a UUID")
}

pub async fn get_authed(client: &Client, url: &str, token: &str) -> reqwest::Response {
    client
        .get(url)
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to execute request.")
}

pub async fn post_authed(
    client: &Client,
    url: &str,
    token: &str,
    body: serde_json::Value,
) -> reqwest::Response {
    client
        .post(url)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.")
}
