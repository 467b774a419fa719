//! Admin session domain
//!
//! Sessions are opaque bearer tokens issued at login. Only the SHA-256 digest
//! of a token is stored.

mod entity;
mod repository;

pub use entity::{AdminSession, IssuedSession, SessionTokenHash};
pub use repository::SessionStore;
