use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

pub mod session;

pub use session::{MemorySessionStore, PgSessionStore, SessionStore};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication credentials were not provided.")]
    MissingCredentials,

    #[error("Invalid Authorization header. {0}")]
    InvalidHeader(&'static str),

    #[error("Error decoding token: {0}")]
    InvalidToken(String),

    #[error("CSRF Failed: CSRF token missing or incorrect.")]
    CsrfFailed,

    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Session store error: {0}")]
    Session(String),
}

/// JWT payload issued by the host platform's identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub preferred_username: String,
    pub user_id: u64,
    #[serde(default)]
    pub administrator: bool,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(
        preferred_username: String,
        user_id: u64,
        administrator: bool,
        roles: Vec<String>,
        security: &SecurityConfig,
    ) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(security.jwt_expiry_hours as i64)).timestamp();

        Self {
            preferred_username,
            user_id,
            administrator,
            roles,
            iss: security.jwt_issuer.clone(),
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Jwt,
    Session,
}

/// Authenticated caller, injected into request extensions by the auth middleware
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub administrator: bool,
    pub roles: Vec<String>,
    pub method: AuthMethod,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.preferred_username,
            administrator: claims.administrator,
            roles: claims.roles,
            method: AuthMethod::Jwt,
        }
    }
}

pub fn generate_jwt(claims: &Claims, security: &SecurityConfig) -> Result<String, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Validate a JWT and extract its claims
pub fn validate_jwt(token: &str, security: &SecurityConfig) -> Result<Claims, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    if let Some(issuer) = &security.jwt_issuer {
        validation.set_issuer(&[issuer]);
    }

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

/// Schemes this service reads tokens from, matched case-insensitively
const TOKEN_SCHEMES: [&str; 2] = ["JWT", "Bearer"];

/// Pull the token out of an `Authorization: JWT <token>` or `Bearer <token>` header.
///
/// Returns `Ok(None)` for any other scheme so session authentication can still run.
pub fn extract_token(header: &str) -> Result<Option<&str>, AuthError> {
    let mut parts = header.split_whitespace();
    let Some(scheme) = parts.next() else {
        return Ok(None);
    };
    if !TOKEN_SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        return Ok(None);
    }

    let token = parts
        .next()
        .ok_or(AuthError::InvalidHeader("No credentials provided."))?;
    if parts.next().is_some() {
        return Err(AuthError::InvalidHeader("Credentials string should not contain spaces."));
    }
    Ok(Some(token))
}
