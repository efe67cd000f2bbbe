use glam::Vec2;
use serde::{Deserialize, Serialize};
use terra_math::Aabb2;

/// Integer coordinate of a chunk on the world grid.
///
/// The identity key for all per-chunk state: grids, seed-point cells,
/// pipeline requests, and chunk records are all keyed by this value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    /// Create a coordinate from its components.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The chunk containing a world-plane position.
    ///
    /// Positions exactly on a chunk edge belong to the chunk with the
    /// larger coordinate (floor division).
    pub fn from_world(pos: Vec2, chunk_size: f32) -> Self {
        Self {
            x: (pos.x / chunk_size).floor() as i32,
            y: (pos.y / chunk_size).floor() as i32,
        }
    }

    /// World position of the chunk's minimum corner.
    pub fn world_min(&self, chunk_size: f32) -> Vec2 {
        Vec2::new(self.x as f32 * chunk_size, self.y as f32 * chunk_size)
    }

    /// World position of the chunk's center.
    pub fn world_center(&self, chunk_size: f32) -> Vec2 {
        self.world_min(chunk_size) + Vec2::splat(chunk_size * 0.5)
    }

    /// The chunk's world-plane bounding box.
    pub fn bounds(&self, chunk_size: f32) -> Aabb2 {
        let min = self.world_min(chunk_size);
        Aabb2::new(min, min + Vec2::splat(chunk_size))
    }

    /// The 3x3 neighborhood centered on this chunk (self plus the eight
    /// surrounding chunks), in row-major order.
    ///
    /// Nearest-seed-point queries must consider this whole neighborhood:
    /// a point near a chunk edge may be closer to a seed generated for
    /// the adjacent chunk than to any seed in its own.
    pub fn neighborhood(&self) -> [ChunkCoord; 9] {
        let mut out = [*self; 9];
        let mut i = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                out[i] = ChunkCoord::new(self.x + dx, self.y + dy);
                i += 1;
            }
        }
        out
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
