//! Request field validation.

use crate::auth::password::MAX_PASSWORD_BYTES;

const MAX_EMAIL_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 255;

/// Check that a string has the shape of an email address.
///
/// This is a shape check, not deliverability: one `@`, a non-empty local
/// part without whitespace, and a dotted domain of alphanumeric/hyphen labels.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty()
        || local.len() > MAX_LOCAL_LEN
        || local.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return false;
    }

    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN || !domain.contains('.') {
        return false;
    }

    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Validate an email/password pair, returning the list of problems
/// (empty = valid).
pub fn validate_credentials(email: &str, password: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if email.trim().is_empty() {
        errors.push("email is required".to_string());
    } else if !is_valid_email(email) {
        errors.push("email must be a valid email address".to_string());
    }

    if password.is_empty() {
        errors.push("password is required".to_string());
    } else if password.len() > MAX_PASSWORD_BYTES {
        errors.push(format!(
            "password must be at most {MAX_PASSWORD_BYTES} bytes"
        ));
    }

    errors
}
