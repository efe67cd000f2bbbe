//! Object-placement data generation: the third pipeline stage.
//!
//! Walks a chunk's biome grid and produces validated spawn candidates
//! for the biome's placeable objects, using a per-chunk deterministic
//! RNG stream independent of the one that lays out Voronoi seeds.

use std::sync::Arc;

use glam::Vec3;
use rand::Rng;
use terra_world::{BiomeGrid, BiomeId, ChunkCoord, ElevationGrid};

use crate::biome::BiomeRegistry;
use crate::seed::cell_rng;

/// Salt mixed into the world seed so placement draws are decoupled from
/// seed-point layout draws for the same chunk.
const PLACEMENT_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// A validated spawn candidate produced by the placement stage.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// World-space spawn position (y is elevation).
    pub position: Vec3,
    /// Biome the candidate landed in.
    pub biome: BiomeId,
    /// Placeable archetype name from the biome definition.
    pub archetype: String,
}

/// Decides whether a candidate spawn position is usable.
///
/// The seam to the navigation-mesh collaborator: the engine supplies an
/// implementation that checks the candidate against walkable geometry.
pub trait PlacementValidator: Send + Sync {
    /// Returns `true` if an object may spawn at `position`.
    fn is_valid(&self, position: Vec3) -> bool;
}

/// Validator that accepts every candidate. The default when no
/// navigation collaborator is wired in.
pub struct AcceptAll;

impl PlacementValidator for AcceptAll {
    fn is_valid(&self, _position: Vec3) -> bool {
        true
    }
}

/// Builds placement data for one chunk from its finished heightfield.
pub struct PlacementBuilder {
    registry: Arc<BiomeRegistry>,
    validator: Arc<dyn PlacementValidator>,
    world_seed: u64,
    chunk_size: f32,
}

impl PlacementBuilder {
    /// Create a builder with the given validator.
    pub fn new(
        registry: Arc<BiomeRegistry>,
        validator: Arc<dyn PlacementValidator>,
        world_seed: u64,
        chunk_size: f32,
    ) -> Self {
        Self {
            registry,
            validator,
            world_seed,
            chunk_size,
        }
    }

    /// Generate spawn candidates for `coord` from its elevation and
    /// biome grids.
    ///
    /// Deterministic for a fixed `(world_seed, coord, grids)` triple;
    /// candidates failing the slope limit or the validator are dropped.
    pub fn build(
        &self,
        coord: ChunkCoord,
        elevation: &ElevationGrid,
        biomes: &BiomeGrid,
    ) -> Vec<Placement> {
        let resolution = elevation.resolution();
        let cell = self.chunk_size / resolution as f32;
        let origin = coord.world_min(self.chunk_size);
        let mut rng = cell_rng(self.world_seed ^ PLACEMENT_SALT, coord);
        let mut out = Vec::new();

        for y in 0..resolution {
            for x in 0..resolution {
                let biome = biomes.get(x, y);
                let def = self.registry.get(biome);
                if def.placeables.is_empty() {
                    continue;
                }
                let height = elevation.get(x, y);
                let slope = cell_slope(elevation, x, y, cell);

                for placeable in &def.placeables {
                    if rng.random::<f64>() >= placeable.density {
                        continue;
                    }
                    if let Some(max_slope) = placeable.max_slope
                        && slope > max_slope
                    {
                        continue;
                    }
                    // Jitter inside the cell so rows of objects don't
                    // align to the sample lattice.
                    let jitter = Vec3::new(rng.random::<f32>(), 0.0, rng.random::<f32>()) * cell;
                    let position = Vec3::new(
                        origin.x + x as f32 * cell,
                        height,
                        origin.y + y as f32 * cell,
                    ) + jitter;
                    if self.validator.is_valid(position) {
                        out.push(Placement {
                            position,
                            biome,
                            archetype: placeable.name.clone(),
                        });
                    }
                }
            }
        }

        out
    }
}

/// Local slope (rise over run) at cell `(x, y)` from its +x/+y samples.
fn cell_slope(elevation: &ElevationGrid, x: u32, y: u32, cell: f32) -> f32 {
    let h = elevation.get(x, y);
    let dx = (elevation.get(x + 1, y) - h).abs();
    let dy = (elevation.get(x, y + 1) - h).abs();
    dx.max(dy) / cell
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::{BiomeDef, PlaceableDef, VoronoiBiomeField};
    use crate::heightfield::{ElevationStats, Heightfield, HeightfieldBuilder};
    use crate::noise_field::{FractalNoiseField, NoiseParams};

    struct RejectAll;

    impl PlacementValidator for RejectAll {
        fn is_valid(&self, _position: Vec3) -> bool {
            false
        }
    }

    fn forest_registry(density: f64) -> Arc<BiomeRegistry> {
        let mut reg = BiomeRegistry::new();
        reg.register(BiomeDef {
            name: "forest".into(),
            noise: NoiseParams::default(),
            height_min: 0.0,
            height_max: 1.0,
            placeables: vec![PlaceableDef {
                name: "pine".into(),
                density,
                max_slope: None,
            }],
        })
        .unwrap();
        Arc::new(reg)
    }

    fn heightfield_for(registry: &Arc<BiomeRegistry>, coord: ChunkCoord) -> Heightfield {
        let field = Arc::new(VoronoiBiomeField::new(Arc::clone(registry), 42, 64.0, 8));
        let builder = HeightfieldBuilder::new(
            FractalNoiseField::new(42, 64.0),
            field,
            Arc::clone(registry),
            Arc::new(ElevationStats::new()),
            64.0,
        );
        builder.build(coord, 16)
    }

    #[test]
    fn test_placements_deterministic() {
        let registry = forest_registry(0.5);
        let coord = ChunkCoord::new(1, 2);
        let hf = heightfield_for(&registry, coord);
        let builder =
            PlacementBuilder::new(Arc::clone(&registry), Arc::new(AcceptAll), 42, 64.0);
        assert_eq!(builder.build(coord, &hf.elevation, &hf.biomes),
            builder.build(coord, &hf.elevation, &hf.biomes));
    }

    #[test]
    fn test_density_one_fills_every_cell() {
        let registry = forest_registry(1.0);
        let coord = ChunkCoord::new(0, 0);
        let hf = heightfield_for(&registry, coord);
        let builder =
            PlacementBuilder::new(Arc::clone(&registry), Arc::new(AcceptAll), 42, 64.0);
        let placements = builder.build(coord, &hf.elevation, &hf.biomes);
        assert_eq!(placements.len(), 16 * 16, "density 1.0 spawns per cell");
        for p in &placements {
            assert_eq!(p.archetype, "pine");
        }
    }

    #[test]
    fn test_zero_density_places_nothing() {
        let registry = forest_registry(0.0);
        let coord = ChunkCoord::new(0, 0);
        let hf = heightfield_for(&registry, coord);
        let builder =
            PlacementBuilder::new(Arc::clone(&registry), Arc::new(AcceptAll), 42, 64.0);
        assert!(builder.build(coord, &hf.elevation, &hf.biomes).is_empty());
    }

    #[test]
    fn test_validator_rejects_candidates() {
        let registry = forest_registry(1.0);
        let coord = ChunkCoord::new(0, 0);
        let hf = heightfield_for(&registry, coord);
        let builder =
            PlacementBuilder::new(Arc::clone(&registry), Arc::new(RejectAll), 42, 64.0);
        assert!(builder.build(coord, &hf.elevation, &hf.biomes).is_empty());
    }

    #[test]
    fn test_positions_fall_inside_chunk_bounds() {
        let registry = forest_registry(1.0);
        let coord = ChunkCoord::new(-2, 3);
        let hf = heightfield_for(&registry, coord);
        let builder =
            PlacementBuilder::new(Arc::clone(&registry), Arc::new(AcceptAll), 42, 64.0);
        let bounds = coord.bounds(64.0);
        for p in builder.build(coord, &hf.elevation, &hf.biomes) {
            assert!(
                bounds.contains_point(glam::Vec2::new(p.position.x, p.position.z)),
                "placement {:?} escaped chunk bounds",
                p.position
            );
        }
    }
}
