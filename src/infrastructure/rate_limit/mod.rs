//! Rate limiting - fixed window counters on file or in-memory storage

mod file;
mod in_memory;
mod limiter;

pub use file::FileRateLimitStore;
pub use in_memory::InMemoryRateLimitStore;
pub use limiter::RateLimiter;
