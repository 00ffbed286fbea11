//! Response helpers shared by handlers.

pub mod cookies;
