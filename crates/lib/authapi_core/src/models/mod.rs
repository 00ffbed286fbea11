//! Domain models.

pub mod auth;
pub mod validation;
