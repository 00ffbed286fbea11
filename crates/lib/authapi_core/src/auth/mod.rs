//! Authentication logic.
//!
//! Password hashing, session token issuance/verification, and the error
//! taxonomy shared by the store, the service and `authapi_api`.

pub mod password;
pub mod token;

use thiserror::Error;

/// Authentication errors.
///
/// The first four variants are expected domain outcomes; the rest are
/// infrastructure failures that surface as an opaque server error.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user already exists")]
    AlreadyExists,

    #[error("user not found")]
    NotFound,

    #[error("invalid password")]
    InvalidPassword,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl AuthError {
    /// Whether this is a named domain outcome rather than an infrastructure
    /// failure.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            AuthError::AlreadyExists
                | AuthError::NotFound
                | AuthError::InvalidPassword
                | AuthError::Validation(_)
        )
    }
}
