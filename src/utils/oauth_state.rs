use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error as ThisError;
use uuid::Uuid;

use crate::models::wearable::WearableProvider;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum OAuthStateError {
    #[error("Invalid state format")]
    Malformed,
    #[error("State was issued for another user")]
    UserMismatch,
    #[error("State has expired")]
    Expired,
    #[error("Invalid state signature")]
    BadSignature,
    #[error("Failed to create HMAC: {0}")]
    Hmac(String),
}

/// Signed `state` parameter for the OAuth authorization redirect. It ties
/// the callback to the user who started the flow and expires after a few
/// minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthState {
    pub user_id: Uuid,
    pub provider: WearableProvider,
    pub expires_at: DateTime<Utc>,
    pub nonce: String,
}

impl OAuthState {
    pub fn new(user_id: Uuid, provider: WearableProvider, validity_minutes: i64) -> Self {
        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);

        Self {
            user_id,
            provider,
            expires_at: Utc::now() + Duration::minutes(validity_minutes),
            nonce: hex::encode(nonce),
        }
    }

    fn payload(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.user_id,
            self.provider.as_str(),
            self.expires_at.timestamp(),
            self.nonce
        )
    }

    fn sign(payload: &str, secret: &SecretString) -> Result<String, OAuthStateError> {
        let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .map_err(|e| OAuthStateError::Hmac(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    pub fn generate_token(&self, secret: &SecretString) -> Result<String, OAuthStateError> {
        let payload = self.payload();
        let signature = Self::sign(&payload, secret)?;
        Ok(format!("{}.{}", payload, signature))
    }

    pub fn validate_token(
        token: &str,
        secret: &SecretString,
        expected_user_id: Uuid,
    ) -> Result<Self, OAuthStateError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 5 {
            return Err(OAuthStateError::Malformed);
        }

        let user_id = Uuid::parse_str(parts[0]).map_err(|_| OAuthStateError::Malformed)?;
        let provider = parts[1]
            .parse::<WearableProvider>()
            .map_err(|_| OAuthStateError::Malformed)?;
        let expires_at = parts[2]
            .parse::<i64>()
            .ok()
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .ok_or(OAuthStateError::Malformed)?;

        let state = Self {
            user_id,
            provider,
            expires_at,
            nonce: parts[3].to_string(),
        };

        // Signature first so a forged token never reveals anything else
        let expected_signature = Self::sign(&state.payload(), secret)?;
        if parts[4] != expected_signature {
            return Err(OAuthStateError::BadSignature);
        }

        if state.user_id != expected_user_id {
            return Err(OAuthStateError::UserMismatch);
        }

        if state.is_expired() {
            return Err(OAuthStateError::Expired);
        }

        Ok(state)
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
