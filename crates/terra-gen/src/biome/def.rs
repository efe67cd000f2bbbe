//! Biome definition: read-only parameter bundle shared by many chunks.

use crate::NoiseParams;

/// Descriptor for an object type placeable in a biome (trees, rocks,
/// vegetation). Consumed by the placement stage.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceableDef {
    /// Archetype name handed to the spawning collaborator (e.g. "pine").
    pub name: String,
    /// Probability of a spawn candidate per grid cell, in `[0.0, 1.0]`.
    pub density: f64,
    /// Maximum terrain slope (rise over run) this object tolerates.
    /// `None` places regardless of slope.
    pub max_slope: Option<f32>,
}

/// Full descriptor for a biome type.
///
/// Read-only configuration data; registered once and referenced by
/// [`terra_world::BiomeId`] everywhere else.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeDef {
    /// Human-readable biome name (e.g. "temperate_forest").
    pub name: String,
    /// Fractal noise parameters used for elevation inside this biome.
    pub noise: NoiseParams,
    /// Lower edge of the biome's normalized height band, in `[0.0, 1.0]`.
    pub height_min: f32,
    /// Upper edge of the biome's normalized height band, in `[0.0, 1.0]`.
    pub height_max: f32,
    /// Objects that may be placed on this biome's terrain.
    pub placeables: Vec<PlaceableDef>,
}

impl BiomeDef {
    /// A bare biome with default noise, full height band, and no
    /// placeables. Convenient for tests and minimal configs.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            noise: NoiseParams::default(),
            height_min: 0.0,
            height_max: 1.0,
            placeables: Vec::new(),
        }
    }
}
