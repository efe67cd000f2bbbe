//! Streamer construction errors.

use terra_config::ConfigError;
use terra_gen::RegistryError;

/// Errors that can occur when constructing a [`crate::TerrainStreamer`].
///
/// All of these are unrecoverable misconfigurations surfaced before any
/// background work starts; transient generation faults never appear
/// here.
#[derive(Debug, thiserror::Error)]
pub enum StreamerError {
    /// The world configuration failed validation.
    #[error("invalid world configuration: {0}")]
    Config(#[from] ConfigError),

    /// Biome registration failed (duplicate names).
    #[error("biome registration failed: {0}")]
    Registry(#[from] RegistryError),
}
