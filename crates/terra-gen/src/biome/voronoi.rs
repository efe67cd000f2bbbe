//! Voronoi biome assignment over lazily-generated per-chunk seed points.
//!
//! Each chunk coordinate owns a deterministic set of seed points, each
//! bound to a biome. A world position belongs to the biome of the
//! nearest seed point across the 3x3 chunk neighborhood around it.
//! Cells are generated on first demand, exactly once, and memoized for
//! the lifetime of the field (one world session).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use glam::Vec2;
use rand::Rng;
use terra_world::{BiomeId, ChunkCoord};

use super::BiomeRegistry;
use crate::seed::cell_rng;

/// A Voronoi seed point: world-space position plus its biome.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeedPoint {
    /// World-plane position inside the owning chunk's extent.
    pub position: Vec2,
    /// Biome assigned to the Voronoi region around this point.
    pub biome: BiomeId,
}

/// Concurrent, memoizing nearest-biome index.
///
/// Explicitly constructed and shared via `Arc` between the streamer and
/// the worker pool; there is no global state. The cell cache grows
/// monotonically with explored area and is never evicted, because seed
/// layouts must stay stable under in-flight queries.
pub struct VoronoiBiomeField {
    cells: DashMap<ChunkCoord, Arc<Vec<SeedPoint>>>,
    registry: Arc<BiomeRegistry>,
    world_seed: u64,
    chunk_size: f32,
    points_per_chunk: usize,
    generations: AtomicU64,
}

impl VoronoiBiomeField {
    /// Create an empty field.
    ///
    /// # Panics
    ///
    /// Panics if the registry is empty, `chunk_size` is not positive, or
    /// `points_per_chunk` is zero. Callers validate their configuration
    /// before construction; these are programming errors here.
    pub fn new(
        registry: Arc<BiomeRegistry>,
        world_seed: u64,
        chunk_size: f32,
        points_per_chunk: usize,
    ) -> Self {
        assert!(!registry.is_empty(), "biome registry must not be empty");
        assert!(chunk_size > 0.0, "chunk_size must be positive");
        assert!(points_per_chunk > 0, "points_per_chunk must be positive");
        Self {
            cells: DashMap::new(),
            registry,
            world_seed,
            chunk_size,
            points_per_chunk,
            generations: AtomicU64::new(0),
        }
    }

    /// The biome whose seed point lies closest to `pos`.
    ///
    /// Derives the containing chunk coordinate and delegates to
    /// [`Self::closest_biome_in`]. Pure in its observable result: the
    /// same position always maps to the same biome for a fixed world
    /// seed, regardless of call order or thread interleaving.
    pub fn closest_biome(&self, pos: Vec2) -> BiomeId {
        self.closest_biome_in(pos, ChunkCoord::from_world(pos, self.chunk_size))
    }

    /// The biome closest to `pos`, where `coord` is the chunk containing
    /// `pos`.
    ///
    /// Scans seed points across the full 3x3 neighborhood: a query point
    /// near a chunk edge may be closer to a seed generated for the
    /// adjacent chunk, and ignoring neighbors would put a visible biome
    /// seam on every chunk boundary.
    pub fn closest_biome_in(&self, pos: Vec2, coord: ChunkCoord) -> BiomeId {
        let mut best = BiomeId(0);
        let mut best_d2 = f32::INFINITY;
        for neighbor in coord.neighborhood() {
            let points = self.cell_points(neighbor);
            for point in points.iter() {
                // Squared distance: no square root per comparison.
                let d2 = point.position.distance_squared(pos);
                if d2 < best_d2 {
                    best_d2 = d2;
                    best = point.biome;
                }
            }
        }
        best
    }

    /// The seed points of one cell, generating them on first access.
    ///
    /// Generation is exactly-once per coordinate: the map entry's shard
    /// lock is held for the duration of the generation closure, so a
    /// second thread asking for the same coordinate blocks until the
    /// first finishes, then reads the memoized set. A cell is never
    /// regenerated or overwritten.
    pub fn cell_points(&self, coord: ChunkCoord) -> Arc<Vec<SeedPoint>> {
        if let Some(points) = self.cells.get(&coord) {
            return Arc::clone(&points);
        }
        let entry = self
            .cells
            .entry(coord)
            .or_insert_with(|| Arc::new(self.generate_cell(coord)));
        Arc::clone(&entry)
    }

    /// Number of cell generations performed so far.
    ///
    /// Observable counter for the exactly-once contract: hammering one
    /// never-seen coordinate from many threads must raise this by the
    /// neighborhood size only.
    pub fn generation_count(&self) -> u64 {
        self.generations.load(Ordering::Relaxed)
    }

    /// Number of cells currently memoized.
    pub fn cached_cell_count(&self) -> usize {
        self.cells.len()
    }

    fn generate_cell(&self, coord: ChunkCoord) -> Vec<SeedPoint> {
        self.generations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(%coord, points = self.points_per_chunk, "generating seed cell");
        let mut rng = cell_rng(self.world_seed, coord);
        let min = coord.world_min(self.chunk_size);
        let biome_count = self.registry.len() as u16;

        (0..self.points_per_chunk)
            .map(|_| {
                let offset = Vec2::new(rng.random::<f32>(), rng.random::<f32>()) * self.chunk_size;
                let biome = BiomeId(rng.random_range(0..biome_count));
                SeedPoint {
                    position: min + offset,
                    biome,
                }
            })
            .collect()
    }
}
