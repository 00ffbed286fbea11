//! Password hashing via bcrypt.
//!
//! Passwords longer than [`MAX_PASSWORD_BYTES`] are rejected rather than
//! silently truncated.

use bcrypt::BcryptError;

use super::AuthError;

/// bcrypt cost factor (the conventional default of 10).
pub const BCRYPT_COST: u32 = 10;

/// Longest password bcrypt can hash without truncation.
pub const MAX_PASSWORD_BYTES: usize = 72;

fn map_bcrypt_error(op: &'static str, e: BcryptError) -> AuthError {
    if let BcryptError::Truncation(_) = e {
        return AuthError::Validation(format!(
            "password must be at most {MAX_PASSWORD_BYTES} bytes"
        ));
    }
    tracing::error!(error = %e, op, "bcrypt failed");
    AuthError::Internal(format!("bcrypt {op}: {e}"))
}

/// Hash a password with bcrypt (cost 10, random salt).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::non_truncating_hash(password, BCRYPT_COST).map_err(|e| map_bcrypt_error("hash", e))
}

/// Verify a password against a bcrypt hash.
///
/// A malformed stored hash is an infrastructure error, not a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::non_truncating_verify(password, hash).map_err(|e| map_bcrypt_error("verify", e))
}

fn join_error(task: &'static str, e: tokio::task::JoinError) -> AuthError {
    tracing::error!(error = %e, task, "blocking bcrypt task failed");
    AuthError::Internal(format!("{task} task: {e}"))
}

/// Run [`hash_password`] on the blocking pool.
pub async fn hash_password_async(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| join_error("hash", e))?
}

/// Run [`verify_password`] on the blocking pool.
pub async fn verify_password_async(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| join_error("verify", e))?
}
