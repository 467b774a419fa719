//! Infrastructure layer - storage, cache and service implementations

pub mod api_key;
pub mod cache;
pub mod logging;
pub mod maintenance;
pub mod rate_limit;
pub mod services;
pub mod session;
pub mod store;
