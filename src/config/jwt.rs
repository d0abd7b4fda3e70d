use chrono::Duration;
use secrecy::SecretString;
use serde::Deserialize;

/// HS256 signing key and token lifetime. The same secret also signs the
/// wearable OAuth `state`.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    pub secret: SecretString,
    pub expiration_hours: i64,
}

impl JwtSettings {
    pub fn token_lifetime(&self) -> Duration {
        Duration::hours(self.expiration_hours.max(1))
    }
}
