//! Configuration error types.

/// Errors that can occur when loading, saving, or validating
/// configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    Read(#[source] std::io::Error),

    /// Failed to write the config file to disk.
    #[error("failed to write config: {0}")]
    Write(#[source] std::io::Error),

    /// Failed to parse RON content.
    #[error("failed to parse config: {0}")]
    Parse(#[source] ron::error::SpannedError),

    /// Failed to serialize config to RON.
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] ron::Error),

    /// The biome list is empty; terrain cannot be generated.
    #[error("biome list is empty")]
    EmptyBiomeList,

    /// The chunk resolution is zero.
    #[error("chunk resolution must be positive")]
    ZeroResolution,

    /// The chunk world size is not strictly positive.
    #[error("chunk size must be positive, got {0}")]
    NonPositiveChunkSize(f32),

    /// The view distance is not strictly positive.
    #[error("view distance must be positive, got {0}")]
    NonPositiveViewDistance(f32),

    /// Voronoi seed points per chunk is zero.
    #[error("seed points per chunk must be positive")]
    ZeroSeedPoints,

    /// The LOD ladder is malformed.
    #[error("invalid LOD ladder: {0}")]
    LodLadder(String),

    /// A biome definition has out-of-range parameters.
    #[error("invalid biome '{name}': {reason}")]
    InvalidBiome { name: String, reason: String },
}
