//! # authapi_api
//!
//! HTTP API library for authapi: the axum router, handlers, and the mapping
//! from service errors to status codes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use std::sync::Arc;

use authapi_core::service::AccountService;
use authapi_core::store::AccountStore;
use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ApiConfig;
use crate::handlers::{auth, health};

/// Route paths.
pub mod routes {
    pub const GET_HEALTH: &str = "/health";
    pub const POST_AUTH_REGISTER: &str = "/auth/register";
    pub const POST_AUTH_LOGIN: &str = "/auth/login";
}

/// Shared application state passed to all handlers.
///
/// Holds no configuration: secrets stay with the binary and the router
/// builder.
pub struct AppState<S> {
    /// Register/login service.
    pub accounts: Arc<AccountService<S>>,
    /// Cancelled on shutdown; each request runs under a child token.
    pub shutdown: CancellationToken,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            accounts: Arc::clone(&self.accounts),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<S: AccountStore> AppState<S> {
    pub fn new(accounts: AccountService<S>) -> Self {
        Self {
            accounts: Arc::new(accounts),
            shutdown: CancellationToken::new(),
        }
    }
}

/// Builds the Axum router with all routes and shared state. `config` only
/// shapes the CORS policy and is not retained.
pub fn router<S: AccountStore + 'static>(state: AppState<S>, config: &ApiConfig) -> Router {
    let cors = cors_layer(config);

    let auth_routes = Router::new()
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler::<S>))
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler::<S>))
        .layer(axum::middleware::from_fn(
            middleware::security_headers::apply_security_headers,
        ));

    Router::new()
        .route(routes::GET_HEALTH, get(health::health_handler))
        .merge(auth_routes)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// CORS policy from configuration. Credentials are allowed, so origins and
/// headers are explicit lists.
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let headers: Vec<HeaderName> = config
        .allowed_headers
        .iter()
        .filter(|h| h.as_str() != "*")
        .filter_map(|h| match HeaderName::from_bytes(h.as_bytes()) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(header = %h, "ignoring invalid CORS header");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_headers(headers.clone())
        .expose_headers(headers)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_credentials(true)
}
