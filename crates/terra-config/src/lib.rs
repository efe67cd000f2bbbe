//! World configuration: serde structs with sensible defaults, RON
//! persistence, and fail-fast validation.
//!
//! Validation runs at streamer construction; a config that passes
//! [`WorldConfig::validate`] cannot produce a construction-time panic in
//! the generation crates.

mod config;
mod error;

pub use config::{
    BiomeConfig, ChunkConfig, DebugConfig, LodConfig, PipelineConfig, PlaceableConfig,
    SplatStrategyConfig, StreamingConfig, WorldConfig,
};
pub use error::ConfigError;
