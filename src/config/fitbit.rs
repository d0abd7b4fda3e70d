use serde::Deserialize;
use secrecy::{ExposeSecret, SecretString};

#[derive(Deserialize, Debug, Clone)]
pub struct FitbitSettings {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub api_base_url: String,
    pub scopes: Vec<String>,
    /// Cron expression (with seconds) for the background sync job
    pub sync_cron: String,
    pub state_ttl_minutes: i64,
}

impl FitbitSettings {
    pub fn is_configured(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.expose_secret().trim().is_empty()
    }
}
