//! # authapi_core
//!
//! Core account and credential logic for authapi: password hashing, signed
//! session tokens, the account store boundary, and the register/login
//! service built on top of them.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod service;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
