//! Admin session infrastructure

mod in_memory;
mod password;
mod service;

pub use in_memory::InMemorySessionStore;
pub use password::{is_phc_string, Argon2Hasher, PasswordHasher};
pub use service::{AdminCredentials, SessionService};
