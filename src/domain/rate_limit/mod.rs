//! Rate limit domain - fixed window throttling keyed by client identifier

mod entity;
mod repository;

pub use entity::{RateLimitPolicy, RateLimitResult, RateLimitWindow};
pub use repository::RateLimitStore;
