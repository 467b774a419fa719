//! Configuration cache - file artifacts kept consistent by rebuild-on-write

mod config_cache;
mod file;

pub use config_cache::ConfigCache;
pub use file::FileArtifactStore;
