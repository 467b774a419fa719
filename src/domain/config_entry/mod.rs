//! Configuration entry domain

pub mod content_filter;
mod entity;
mod validation;
mod value;

pub use entity::{ConfigEntry, ConfigEntryId, ConfigEntryUpdate, ConfigKey, NewConfigEntry};
pub use validation::{
    validate_config_key, ConfigKeyValidationError, ValidationLimits, MAX_CONFIG_KEY_LENGTH,
};
pub use value::{decode_value, encode_value, value_size};
