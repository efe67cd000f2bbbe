//! Deterministic seeded generation utilities.
//!
//! Derives per-chunk RNG streams from the world seed and a chunk
//! coordinate, so regenerating any chunk yields an identical layout.

use std::hash::{DefaultHasher, Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use terra_world::ChunkCoord;

/// Derive a u64 seed for a chunk cell from the world seed and coordinate.
///
/// Uses SipHash (via std's `DefaultHasher`) to combine the world seed with
/// the coordinate into a well-distributed u64. Deterministic for a fixed
/// `(world_seed, coord)` pair.
pub fn derive_cell_seed(world_seed: u64, coord: ChunkCoord) -> u64 {
    let mut hasher = DefaultHasher::new();
    world_seed.hash(&mut hasher);
    coord.x.hash(&mut hasher);
    coord.y.hash(&mut hasher);
    hasher.finish()
}

/// Derive a deterministic RNG for a specific chunk cell.
///
/// The returned RNG produces an identical sequence for the same
/// `(world_seed, coord)` pair regardless of which thread runs it.
pub fn cell_rng(world_seed: u64, coord: ChunkCoord) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_cell_seed(world_seed, coord))
}
