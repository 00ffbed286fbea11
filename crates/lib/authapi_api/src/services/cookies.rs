//! Cookie service: the httpOnly session token cookie.

use axum_extra::extract::cookie::Cookie;

/// Cookie name for the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Build the httpOnly, secure, site-wide cookie carrying the token.
pub fn token_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE.to_string(), token.to_string()))
        .http_only(true)
        .secure(true)
        .path("/".to_string())
        .build()
}
