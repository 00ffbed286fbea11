//! Authentication domain models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::validate_credentials;
use crate::auth::AuthError;

/// A registered account.
///
/// Fields are private so the identity cannot change after creation. The
/// password hash is never serialized and is redacted from `Debug`.
#[derive(Clone, Serialize)]
pub struct Account {
    user_id: Uuid,
    email: String,
    #[serde(skip_serializing)]
    password_hash: String,
    last_login: DateTime<Utc>,
    created: DateTime<Utc>,
}

impl Account {
    /// Build a new account with a fresh random identity; last-login and
    /// creation are both set to now.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: Uuid::new_v4(),
            email: email.into(),
            password_hash: password_hash.into(),
            last_login: now,
            created: now,
        }
    }

    /// Rebuild an account loaded from storage.
    pub fn from_parts(
        user_id: Uuid,
        email: String,
        password_hash: String,
        last_login: DateTime<Utc>,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            email,
            password_hash,
            last_login,
            created,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn last_login(&self) -> DateTime<Utc> {
        self.last_login
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("last_login", &self.last_login)
            .field("created", &self.created)
            .finish()
    }
}

/// Register/login request body.
#[derive(Clone, Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl AuthRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Check the request shape: email present and well-formed, password
    /// present.
    pub fn validate(&self) -> Result<(), AuthError> {
        let errors = validate_credentials(&self.email, &self.password);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AuthError::Validation(errors.join("; ")))
        }
    }
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// JWT claims embedded in session tokens. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Account identity.
    pub user_id: Uuid,
    /// Account email.
    pub email: String,
    /// Issuer (always `authapi`).
    pub iss: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Not before (unix timestamp).
    pub nbf: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_has_fresh_identity_and_equal_timestamps() {
        let a = Account::new("a@x.com", "$2b$hash");
        let b = Account::new("a@x.com", "$2b$hash");
        assert_ne!(a.user_id(), b.user_id());
        assert_eq!(a.user_id().get_version(), Some(uuid::Version::Random));
        assert_eq!(a.last_login(), a.created());
        assert_eq!(a.email(), "a@x.com");
    }

    #[test]
    fn account_json_omits_password_hash() {
        let account = Account::new("a@x.com", "$2b$10$secrethash");
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@x.com");
        assert!(!json.to_string().contains("secrethash"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let account = Account::new("a@x.com", "$2b$10$secrethash");
        assert!(!format!("{account:?}").contains("secrethash"));

        let req = AuthRequest::new("a@x.com", "hunter2");
        assert!(!format!("{req:?}").contains("hunter2"));
    }

    #[test]
    fn request_validation() {
        assert!(AuthRequest::new("a@x.com", "pw1").validate().is_ok());
        assert!(matches!(
            AuthRequest::new("not-an-email", "pw1").validate(),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            AuthRequest::new("a@x.com", "").validate(),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn request_missing_fields_deserialize_as_empty() {
        let req: AuthRequest = serde_json::from_str(r#"{"email":"a@x.com"}"#).unwrap();
        assert!(req.password.is_empty());
        assert!(req.validate().is_err());
    }
}
