//! Connection token verification.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sketchroom_core::protocol::{CLOSE_AUTH_FAILED, CLOSE_MISSING_TOKEN};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,
    #[error("Authentication failed")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("Authentication failed")]
    MissingUser,
}

impl AuthError {
    /// WebSocket close code sent to the rejected client.
    pub fn close_code(&self) -> u16 {
        match self {
            AuthError::MissingToken => CLOSE_MISSING_TOKEN,
            AuthError::Invalid(_) | AuthError::MissingUser => CLOSE_AUTH_FAILED,
        }
    }
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// Resolves a connection token to a user identity.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: Option<&str>) -> Result<String, AuthError>;
}

/// HS256 JWT verifier sharing a secret with the token issuer.
pub struct JwtVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Issuers sign bare `{userId}` payloads; `exp` is checked only when present.
        validation.required_spec_claims.clear();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a token for `user_id`.
    pub fn issue(&self, user_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            user_id: user_id.to_string(),
            exp: None,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: Option<&str>) -> Result<String, AuthError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(AuthError::Invalid)?;
        if data.claims.user_id.is_empty() {
            return Err(AuthError::MissingUser);
        }
        Ok(data.claims.user_id)
    }
}
