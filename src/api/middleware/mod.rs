//! API middleware components

pub mod admin_auth;
pub mod client_id;
pub mod logging;
pub mod security;

pub use admin_auth::{bearer_token, RequireAdmin};
pub use client_id::ClientId;
pub use logging::logging_middleware;
pub use security::security_headers_middleware;
