use std::env;
use config::{Config, ConfigError, File};
use dotenv::dotenv;
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgConnectOptions;

use crate::config::fitbit::FitbitSettings;
use crate::config::gemini::GeminiSettings;
use crate::config::jwt::JwtSettings;
use crate::config::minio::MinIOSettings;

#[derive(serde::Deserialize, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub gemini: GeminiSettings,
    pub minio: MinIOSettings,
    pub fitbit: FitbitSettings,
}

#[derive(serde::Deserialize, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Frontend origins allowed by CORS
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(serde::Deserialize, Debug)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub db_name: String,
    #[serde(default)]
    pub db_url: Option<SecretString>,
}

impl DatabaseSettings {
    /// Options for the application database. A full `db_url` wins over the
    /// individual fields.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        match &self.db_url {
            Some(url) => url.expose_secret().parse(),
            None => Ok(self.server_options().database(&self.db_name)),
        }
    }

    /// Options for the server without selecting a database.
    pub fn server_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(self.password.expose_secret())
    }
}

pub fn get_config() -> Result<Settings, ConfigError> {
    dotenv().ok();

    let configuration_directory = env::current_dir()
        .map_err(|e| ConfigError::Message(format!("Failed to determine the current directory: {}", e)))?
        .join("configuration");

    let environment = Environment::try_from(
        env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".into()),
    )
    .map_err(ConfigError::Message)?;

    let mut settings = Config::builder()
        .add_source(File::from(configuration_directory.join("base.yml")))
        .add_source(File::from(
            configuration_directory.join(format!("{}.yml", environment.as_str())),
        ))
        // e.g. APP__GEMINI__MODEL=gemini-1.5-pro
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?
        .try_deserialize::<Settings>()?;

    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Plain variables set by the hosting platform or a `.env` file.
fn apply_env_overrides(settings: &mut Settings) {
    if let Some(url) = secret_from_env("DATABASE_URL") {
        settings.database.db_url = Some(url);
    }
    if let Some(secret) = secret_from_env("JWT_SECRET") {
        settings.jwt.secret = secret;
    }
    if let Some(api_key) = secret_from_env("GOOGLE_API_KEY") {
        settings.gemini.api_key = api_key;
    }
}

fn secret_from_env(name: &str) -> Option<SecretString> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(|value| SecretString::new(value.into_boxed_str()))
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}
