//! Per-chunk heightfield construction: biome lookup per cell, fractal
//! noise with that biome's parameters, and running global elevation
//! statistics.
//!
//! This is the most expensive per-chunk computation
//! (O(resolution^2 * octaves)) and always runs on a worker thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec2;
use terra_world::{BiomeGrid, BiomeId, ChunkCoord, ElevationGrid};

use crate::biome::{BiomeRegistry, VoronoiBiomeField};
use crate::noise_field::FractalNoiseField;

/// Running minimum/maximum elevation observed across all built chunks.
///
/// Shared between worker threads via lock-free f32-bits compare-exchange.
/// Used for height-banded splat weighting, which needs the observed
/// global range rather than a per-chunk one.
pub struct ElevationStats {
    min_bits: AtomicU32,
    max_bits: AtomicU32,
}

impl ElevationStats {
    /// Create stats with an empty observation range.
    pub fn new() -> Self {
        Self {
            min_bits: AtomicU32::new(f32::INFINITY.to_bits()),
            max_bits: AtomicU32::new(f32::NEG_INFINITY.to_bits()),
        }
    }

    /// Fold one elevation sample into the running range.
    pub fn observe(&self, value: f32) {
        let _ = self
            .min_bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                (value < f32::from_bits(bits)).then(|| value.to_bits())
            });
        let _ = self
            .max_bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                (value > f32::from_bits(bits)).then(|| value.to_bits())
            });
    }

    /// Smallest elevation observed so far (`+inf` before any sample).
    pub fn min(&self) -> f32 {
        f32::from_bits(self.min_bits.load(Ordering::Relaxed))
    }

    /// Largest elevation observed so far (`-inf` before any sample).
    pub fn max(&self) -> f32 {
        f32::from_bits(self.max_bits.load(Ordering::Relaxed))
    }
}

impl Default for ElevationStats {
    fn default() -> Self {
        Self::new()
    }
}

/// The stage-1 artifact: elevation and biome grids built together.
#[derive(Clone, Debug)]
pub struct Heightfield {
    pub elevation: ElevationGrid,
    pub biomes: BiomeGrid,
}

/// Builds per-chunk heightfields by combining Voronoi biome assignment
/// with per-biome fractal noise.
///
/// Holds only shared immutable state plus the atomic stats, so one
/// builder is shared by the whole worker pool.
pub struct HeightfieldBuilder {
    noise: FractalNoiseField,
    field: Arc<VoronoiBiomeField>,
    registry: Arc<BiomeRegistry>,
    stats: Arc<ElevationStats>,
    chunk_size: f32,
}

impl HeightfieldBuilder {
    /// Create a builder over the shared noise field, biome field, and
    /// registry.
    pub fn new(
        noise: FractalNoiseField,
        field: Arc<VoronoiBiomeField>,
        registry: Arc<BiomeRegistry>,
        stats: Arc<ElevationStats>,
        chunk_size: f32,
    ) -> Self {
        Self {
            noise,
            field,
            registry,
            stats,
            chunk_size,
        }
    }

    /// Shared elevation statistics updated by every build.
    pub fn stats(&self) -> &Arc<ElevationStats> {
        &self.stats
    }

    /// Build the heightfield for one chunk at the given logical
    /// resolution (cells per side).
    ///
    /// Sample `(x, y)` lies at world position
    /// `chunk_min + (x, y) * (chunk_size / resolution)`, so the edge
    /// samples of adjacent chunks evaluate at identical world positions
    /// and the produced grids are seam-free by construction.
    pub fn build(&self, coord: ChunkCoord, resolution: u32) -> Heightfield {
        let origin = coord.world_min(self.chunk_size);
        let cell = self.chunk_size / resolution as f32;

        let mut elevation = ElevationGrid::new(resolution);
        let mut biomes = BiomeGrid::new(resolution, BiomeId(0));

        for y in 0..=resolution {
            for x in 0..=resolution {
                let world = origin + Vec2::new(x as f32, y as f32) * cell;
                let biome = self.field.closest_biome(world);
                let params = &self.registry.get(biome).noise;
                let h = self
                    .noise
                    .sample(f64::from(world.x), f64::from(world.y), params);

                self.stats.observe(h);
                elevation.set(x, y, h);
                biomes.set(x, y, biome);
            }
        }

        Heightfield { elevation, biomes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::BiomeDef;
    use crate::noise_field::NoiseParams;

    fn one_biome_builder(seed: u64, chunk_size: f32) -> HeightfieldBuilder {
        let mut reg = BiomeRegistry::new();
        reg.register(BiomeDef {
            name: "plains".into(),
            noise: NoiseParams {
                amplitude: 20.0,
                frequency: 1.0,
                persistence: 0.5,
                lacunarity: 2.0,
                octaves: 4,
            },
            height_min: 0.0,
            height_max: 1.0,
            placeables: Vec::new(),
        })
        .unwrap();
        let registry = Arc::new(reg);
        let field = Arc::new(VoronoiBiomeField::new(
            Arc::clone(&registry),
            seed,
            chunk_size,
            8,
        ));
        HeightfieldBuilder::new(
            FractalNoiseField::new(seed, f64::from(chunk_size)),
            field,
            registry,
            Arc::new(ElevationStats::new()),
            chunk_size,
        )
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = one_biome_builder(42, 240.0);
        let a = builder.build(ChunkCoord::new(2, -1), 32);
        let b = builder.build(ChunkCoord::new(2, -1), 32);
        assert_eq!(a.elevation, b.elevation);
        assert_eq!(a.biomes, b.biomes);
    }

    #[test]
    fn test_adjacent_chunks_share_edge_values() {
        // End-to-end seam scenario: resolution 240 (241 samples per
        // side), one biome, amplitude 20, frequency 1, persistence 0.5,
        // octaves 4, lacunarity 2, seed 42. The east edge of (0,0) and
        // the west edge of (1,0) sample identical world positions and
        // must match exactly.
        let builder = one_biome_builder(42, 240.0);
        let resolution = 240;
        let left = builder.build(ChunkCoord::new(0, 0), resolution);
        let right = builder.build(ChunkCoord::new(1, 0), resolution);

        for y in 0..=resolution {
            let l = left.elevation.get(resolution, y);
            let r = right.elevation.get(0, y);
            assert!(
                (l - r).abs() < 1e-6,
                "seam mismatch at row {y}: {l} vs {r}"
            );
            assert_eq!(
                left.biomes.get(resolution, y),
                right.biomes.get(0, y),
                "biome seam mismatch at row {y}"
            );
        }
    }

    #[test]
    fn test_stats_track_observed_range() {
        let builder = one_biome_builder(7, 120.0);
        let hf = builder.build(ChunkCoord::new(0, 0), 16);
        let stats = builder.stats();

        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for &v in hf.elevation.values() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        assert!(stats.min() <= lo);
        assert!(stats.max() >= hi);
        assert!(stats.min().is_finite() && stats.max().is_finite());
    }

    #[test]
    fn test_stats_concurrent_observe() {
        let stats = Arc::new(ElevationStats::new());
        std::thread::scope(|scope| {
            for t in 0..8 {
                let stats = Arc::clone(&stats);
                scope.spawn(move || {
                    for i in 0..10_000 {
                        stats.observe((t * 10_000 + i) as f32);
                    }
                });
            }
        });
        assert_eq!(stats.min(), 0.0);
        assert_eq!(stats.max(), 79_999.0);
    }
}
