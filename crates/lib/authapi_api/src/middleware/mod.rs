//! Request/response middleware.

pub mod security_headers;
