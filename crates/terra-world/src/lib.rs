//! World identity and data-model types: chunk coordinates, dense
//! elevation/biome grids, and the biome identifier.

mod coord;
mod grid;

pub use coord::ChunkCoord;
pub use grid::{BiomeGrid, ElevationGrid};

/// Unique identifier for a biome.
///
/// Assigned as a stable index at registration time; grids and splat
/// channels refer to biomes by this index, never by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BiomeId(pub u16);
