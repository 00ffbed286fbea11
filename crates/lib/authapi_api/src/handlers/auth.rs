//! Authentication request handlers.

use authapi_core::models::auth::AuthRequest;
use authapi_core::service::AuthGrant;
use authapi_core::store::AccountStore;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::AppState;
use crate::error::{AppError, AppResult, MessageResponse};
use crate::services::cookies::token_cookie;

/// Header carrying the account identity.
pub const X_UID: &str = "x-uid";
/// Header carrying the account email.
pub const X_EMAIL: &str = "x-email";

/// `POST /auth/register`: create an account, respond 201 with a token.
pub async fn register_handler<S: AccountStore + 'static>(
    State(state): State<AppState<S>>,
    jar: CookieJar,
    body: Result<Json<AuthRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(req) = body?;
    let cancel = state.shutdown.child_token();
    let grant = state.accounts.register(&req, &cancel).await?;
    grant_response(
        StatusCode::CREATED,
        jar,
        &grant,
        "user registered successfully",
    )
}

/// `POST /auth/login`: authenticate, respond 200 with a token.
pub async fn login_handler<S: AccountStore + 'static>(
    State(state): State<AppState<S>>,
    jar: CookieJar,
    body: Result<Json<AuthRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(req) = body?;
    let cancel = state.shutdown.child_token();
    let grant = state.accounts.login(&req, &cancel).await?;
    grant_response(StatusCode::OK, jar, &grant, "user logged in successfully")
}

/// Token in `Authorization`, identity in `X-Uid`/`X-Email`, and the same
/// token in the `token` cookie.
fn grant_response(
    status: StatusCode,
    jar: CookieJar,
    grant: &AuthGrant,
    message: &str,
) -> AppResult<Response> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, header_value(&grant.token)?);
    headers.insert(
        HeaderName::from_static(X_UID),
        header_value(&grant.account.user_id().to_string())?,
    );
    headers.insert(
        HeaderName::from_static(X_EMAIL),
        header_value(grant.account.email())?,
    );

    let jar = jar.add(token_cookie(&grant.token));
    Ok((status, headers, jar, Json(MessageResponse::new(message))).into_response())
}

fn header_value(value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_bytes(value.as_bytes())
        .map_err(|e| AppError::Internal(format!("invalid header value: {e}")))
}
