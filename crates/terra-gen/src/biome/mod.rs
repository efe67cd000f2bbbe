//! Biome definitions, the index-based registry, and Voronoi biome
//! assignment over lazily-memoized per-chunk seed points.

mod def;
mod registry;
mod voronoi;

pub use def::{BiomeDef, PlaceableDef};
pub use registry::{BiomeRegistry, RegistryError};
pub use voronoi::{SeedPoint, VoronoiBiomeField};
