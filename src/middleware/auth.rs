use std::future::{ready, Ready};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    http::header,
    web, Error, HttpMessage,
};
use chrono::Utc;
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::jwt::JwtSettings;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    /// Expiry as a UTC unix timestamp
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// Issue an HS256 token for a freshly authenticated user.
pub fn issue_token(
    user_id: Uuid,
    username: &str,
    jwt_settings: &JwtSettings,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        exp: (Utc::now() + jwt_settings.token_lifetime()).timestamp() as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_settings.secret.expose_secret().as_bytes()),
    )
}

/// Verify signature and expiry of a token.
pub fn decode_token(
    token: &str,
    jwt_settings: &JwtSettings,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_settings.secret.expose_secret().as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
}

fn bearer_token(req: &ServiceRequest) -> Result<&str, Error> {
    req.headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ErrorUnauthorized("Missing authorization header"))?
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ErrorUnauthorized("Expected a bearer token"))
}

fn authenticate(req: &ServiceRequest) -> Result<Claims, Error> {
    let jwt_settings = req
        .app_data::<web::Data<JwtSettings>>()
        .ok_or_else(|| ErrorUnauthorized("Authentication is not configured"))?;

    decode_token(bearer_token(req)?, jwt_settings).map_err(|e| {
        tracing::info!("Rejected token: {:?}", e);
        ErrorUnauthorized("Invalid token")
    })
}

/// Guards a scope: requests without a valid bearer token get 401, the rest
/// carry their `Claims` in the request extensions.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(&req) {
            Ok(claims) => {
                // Read by handlers as web::ReqData<Claims>
                req.extensions_mut().insert(claims);
                Box::pin(self.service.call(req))
            }
            Err(e) => Box::pin(async move { Err(e) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn settings(secret: &str) -> JwtSettings {
        JwtSettings {
            secret: SecretString::new(secret.into()),
            expiration_hours: 24,
        }
    }

    #[test]
    fn token_carries_the_user() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "sam", &settings("s3cret")).unwrap();

        let claims = decode_token(&token, &settings("s3cret")).unwrap();
        assert_eq!(claims.user_id(), Some(user_id));
        assert_eq!(claims.username, "sam");
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let token = issue_token(Uuid::new_v4(), "sam", &settings("one")).unwrap();
        assert!(decode_token(&token, &settings("two")).is_err());
    }
}
