//! API key domain
//!
//! Raw API keys are bearer secrets handed to game clients. Only their
//! digest ([`KeyHash`]) is ever persisted or used as a lookup key.

mod entity;
mod validation;

pub use entity::{GeneratedApiKey, KeyHash};
pub use validation::{validate_api_key_syntax, ApiKeyValidationError, MAX_API_KEY_LENGTH, MIN_API_KEY_LENGTH};
