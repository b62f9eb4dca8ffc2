//! Session tokens.
//!
//! Sessions are HS256-signed JWTs issued by the auth provider that fronts the
//! web app; this server only validates them. [`generate_session_token`] exists
//! for local tooling and tests, which need to mint a session for a user.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use mailroom_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by every session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// Platform role (`"admin"` or `"user"`).
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier.
    pub jti: String,
}

/// Configuration for session token validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret shared with the auth provider.
    pub secret: String,
    /// Lifetime of tokens minted by [`generate_session_token`], in minutes.
    pub session_expiry_mins: i64,
}

const DEFAULT_SESSION_EXPIRY_MINS: i64 = 60;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var               | Required | Default |
    /// |-----------------------|----------|---------|
    /// | `JWT_SECRET`          | **yes**  | --      |
    /// | `SESSION_EXPIRY_MINS` | no       | `60`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let session_expiry_mins: i64 = std::env::var("SESSION_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_SESSION_EXPIRY_MINS.to_string())
            .parse()
            .expect("SESSION_EXPIRY_MINS must be a valid i64");

        Self {
            secret,
            session_expiry_mins,
        }
    }
}

/// Mint a session token for the given user.
pub fn generate_session_token(
    user_id: DbId,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        exp: now + config.session_expiry_mins * 60,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate a session token, returning its [`Claims`].
///
/// Checks the signature and expiration.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
