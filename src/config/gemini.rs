use serde::Deserialize;
use secrecy::{ExposeSecret, SecretString};

#[derive(Deserialize, Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GeminiSettings {
    /// An empty key disables the model; every request takes the fallback path.
    pub fn is_configured(&self) -> bool {
        !self.api_key.expose_secret().trim().is_empty()
    }

    pub fn generate_content_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}
