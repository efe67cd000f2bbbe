//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level world configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Chunk geometry settings.
    pub chunk: ChunkConfig,
    /// Streaming window settings.
    pub streaming: StreamingConfig,
    /// Worker pool and queue settings.
    pub pipeline: PipelineConfig,
    /// Level-of-detail ladder.
    pub lod: LodConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
    /// Global world seed. Regenerating any chunk with the same seed
    /// yields an identical layout.
    pub seed: u64,
    /// Voronoi seed points generated per chunk cell.
    pub points_per_chunk: usize,
    /// Splat channel assignment strategy.
    pub splat_strategy: SplatStrategyConfig,
    /// Biome definitions in registration order.
    pub biomes: Vec<BiomeConfig>,
}

/// Chunk geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkConfig {
    /// Logical resolution: cells per chunk side (`resolution + 1`
    /// samples per side).
    pub resolution: u32,
    /// World-space width of one chunk.
    pub size: f32,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            resolution: 240,
            size: 240.0,
        }
    }
}

/// Streaming window settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// View distance in world units; chunks whose bounds lie within it
    /// are visible.
    pub view_distance: f32,
    /// Optional hard clip on the chunk window radius, in chunks.
    pub max_chunk_radius: Option<i32>,
    /// Evict chunk records after this many consecutive invisible ticks.
    /// `None` (the default) never evicts: memory grows with explored
    /// area.
    pub evict_after_ticks: Option<u64>,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            view_distance: 480.0,
            max_chunk_radius: None,
            evict_after_ticks: None,
        }
    }
}

/// Worker pool and queue settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker thread count. `0` picks `max(1, cpus - 2)`, leaving
    /// headroom for the main and render threads.
    pub worker_threads: usize,
    /// Bounded task queue capacity; full-queue submissions are retried
    /// on a later tick.
    pub task_capacity: usize,
    /// Bounded capacity of each per-stage result queue.
    pub result_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            task_capacity: 64,
            result_capacity: 128,
        }
    }
}

/// Level-of-detail ladder: `factors[i]` applies below `thresholds[i]`,
/// and `factors.last()` beyond the last threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
    /// Distance boundaries between LOD tiers, strictly increasing.
    pub thresholds: Vec<f32>,
    /// Mesh stride factor per tier; one longer than `thresholds`. Every
    /// factor must divide the chunk resolution.
    pub factors: Vec<u32>,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            thresholds: vec![240.0, 480.0],
            factors: vec![1, 4, 8],
        }
    }
}

/// Debug/development settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g. "debug", "info", "warn").
    pub log_level: String,
    /// Log every chunk event at debug level.
    pub log_chunk_events: bool,
}

/// Splat channel assignment strategy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SplatStrategyConfig {
    /// Channel = biome index modulo channel count.
    #[default]
    BiomeIndexed,
    /// Channel from the biome height band containing the normalized
    /// elevation.
    HeightBanded,
}

/// One biome definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BiomeConfig {
    /// Unique biome name.
    pub name: String,
    /// First-octave noise amplitude in world height units.
    pub amplitude: f64,
    /// First-octave noise frequency in cycles per chunk width.
    pub frequency: f64,
    /// Octave amplitude decay, in `(0, 1)`.
    pub persistence: f64,
    /// Octave frequency growth.
    pub lacunarity: f64,
    /// Octave count.
    pub octaves: u32,
    /// Normalized height band lower edge.
    pub height_min: f32,
    /// Normalized height band upper edge.
    pub height_max: f32,
    /// Objects placeable in this biome.
    pub placeables: Vec<PlaceableConfig>,
}

impl Default for BiomeConfig {
    fn default() -> Self {
        Self {
            name: "plains".to_string(),
            amplitude: 20.0,
            frequency: 1.0,
            persistence: 0.5,
            lacunarity: 2.0,
            octaves: 4,
            height_min: 0.0,
            height_max: 1.0,
            placeables: Vec::new(),
        }
    }
}

/// One placeable object descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaceableConfig {
    /// Archetype name handed to the spawning collaborator.
    pub name: String,
    /// Spawn probability per grid cell, in `[0, 1]`.
    pub density: f64,
    /// Maximum tolerated terrain slope; `None` ignores slope.
    pub max_slope: Option<f32>,
}

impl Default for PlaceableConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            density: 0.0,
            max_slope: None,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk: ChunkConfig::default(),
            streaming: StreamingConfig::default(),
            pipeline: PipelineConfig::default(),
            lod: LodConfig::default(),
            debug: DebugConfig::default(),
            seed: 0,
            points_per_chunk: 8,
            splat_strategy: SplatStrategyConfig::default(),
            biomes: Vec::new(),
        }
    }
}

impl WorldConfig {
    /// A ready-to-run configuration with one default biome.
    pub fn with_default_biome() -> Self {
        Self {
            biomes: vec![BiomeConfig::default()],
            ..Self::default()
        }
    }

    /// Load configuration from a RON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        ron::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Save configuration to a RON file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] or [`ConfigError::Write`].
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::default();
        let content =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// Reject unrecoverable misconfigurations.
    ///
    /// Run once at streamer construction: an invalid world cannot be
    /// repaired at runtime, so this fails fast instead of surfacing as a
    /// generation fault later.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.biomes.is_empty() {
            return Err(ConfigError::EmptyBiomeList);
        }
        if self.chunk.resolution == 0 {
            return Err(ConfigError::ZeroResolution);
        }
        if self.chunk.size <= 0.0 {
            return Err(ConfigError::NonPositiveChunkSize(self.chunk.size));
        }
        if self.streaming.view_distance <= 0.0 {
            return Err(ConfigError::NonPositiveViewDistance(
                self.streaming.view_distance,
            ));
        }
        if self.points_per_chunk == 0 {
            return Err(ConfigError::ZeroSeedPoints);
        }
        self.validate_lod()?;
        for biome in &self.biomes {
            validate_biome(biome)?;
        }
        Ok(())
    }

    fn validate_lod(&self) -> Result<(), ConfigError> {
        let lod = &self.lod;
        if lod.factors.is_empty() {
            return Err(ConfigError::LodLadder("no LOD factors".to_string()));
        }
        if lod.factors.len() != lod.thresholds.len() + 1 {
            return Err(ConfigError::LodLadder(format!(
                "{} factors require {} thresholds, got {}",
                lod.factors.len(),
                lod.factors.len() - 1,
                lod.thresholds.len()
            )));
        }
        for (i, &t) in lod.thresholds.iter().enumerate() {
            if t <= 0.0 {
                return Err(ConfigError::LodLadder(format!(
                    "threshold {t} is not positive"
                )));
            }
            if i > 0 && t <= lod.thresholds[i - 1] {
                return Err(ConfigError::LodLadder(
                    "thresholds must be strictly increasing".to_string(),
                ));
            }
        }
        for &f in &lod.factors {
            if f == 0 {
                return Err(ConfigError::LodLadder("factor 0 is invalid".to_string()));
            }
            if self.chunk.resolution % f != 0 {
                return Err(ConfigError::LodLadder(format!(
                    "factor {f} does not divide resolution {}",
                    self.chunk.resolution
                )));
            }
        }
        Ok(())
    }
}

fn validate_biome(biome: &BiomeConfig) -> Result<(), ConfigError> {
    let fail = |reason: &str| {
        Err(ConfigError::InvalidBiome {
            name: biome.name.clone(),
            reason: reason.to_string(),
        })
    };
    if biome.name.is_empty() {
        return fail("name is empty");
    }
    if !(biome.persistence > 0.0 && biome.persistence < 1.0) {
        return fail("persistence must be in (0, 1)");
    }
    if biome.octaves == 0 {
        return fail("octaves must be positive");
    }
    if biome.lacunarity <= 0.0 {
        return fail("lacunarity must be positive");
    }
    if biome.height_min > biome.height_max {
        return fail("height band is inverted");
    }
    for p in &biome.placeables {
        if !(0.0..=1.0).contains(&p.density) {
            return fail("placeable density must be in [0, 1]");
        }
    }
    Ok(())
}
