//! Procedural terrain generation: octaved value noise, Voronoi biome
//! assignment, per-chunk heightfield construction, and object placement.

mod heightfield;
mod noise_field;
mod placement;
mod seed;

pub mod biome;

pub use biome::{
    BiomeDef, BiomeRegistry, PlaceableDef, RegistryError, SeedPoint, VoronoiBiomeField,
};
pub use heightfield::{ElevationStats, Heightfield, HeightfieldBuilder};
pub use noise_field::{FractalNoiseField, NoiseParams};
pub use placement::{AcceptAll, Placement, PlacementBuilder, PlacementValidator};
pub use seed::{cell_rng, derive_cell_seed};
