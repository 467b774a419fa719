//! API key infrastructure implementations

mod codec;

pub use codec::{API_KEY_PREFIX, KeyCodec, sha256_hex};
