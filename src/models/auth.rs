use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Body of both `/auth/register` and `/auth/login`. Missing fields
/// deserialize as empty so the handlers can answer with their own message.
#[derive(Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default = "blank_password")]
    pub password: SecretString,
}

fn blank_password() -> SecretString {
    SecretString::new("".into())
}

#[derive(Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub username: String,
    pub token: String,
}

#[derive(Serialize, Deserialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}
