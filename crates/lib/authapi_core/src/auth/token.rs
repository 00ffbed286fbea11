//! Signed session tokens (JWT, HS512, 24h expiry).

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::TokenClaims;

/// Fixed issuer written into every token.
pub const ISSUER: &str = "authapi";

/// Token lifetime: 24 hours.
pub const TOKEN_EXPIRY_SECS: i64 = 24 * 60 * 60;

const ALGORITHM: Algorithm = Algorithm::HS512;

/// Issues and verifies session tokens with a symmetric secret.
///
/// Stateless: every call is independent and only reads the secret.
#[derive(Clone)]
pub struct TokenProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl TokenProvider {
    /// Create a provider from the signing secret. The secret must not be empty.
    pub fn new(secret: &[u8]) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Token("signing secret must not be empty".into()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }

    /// Sign a token for the given subject. `iat`, `nbf` and `exp` come from a
    /// single clock reading, so `exp - iat` is exactly [`TOKEN_EXPIRY_SECS`].
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = TokenClaims {
            user_id,
            email: email.to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + Duration::seconds(TOKEN_EXPIRY_SECS)).timestamp(),
        };
        encode(&Header::new(ALGORITHM), &claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, %user_id, "token signing failed");
            AuthError::Token(format!("jwt encode: {e}"))
        })
    }

    /// Verify signature, issuer, not-before and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::Token(format!("jwt decode: {e}")))
    }
}
