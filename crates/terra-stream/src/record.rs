//! Per-chunk state owned by the main thread.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use terra_gen::Placement;
use terra_math::Aabb2;
use terra_mesh::{MeshBuffer, SplatBuffer};
use terra_world::{BiomeGrid, ChunkCoord, ElevationGrid};

use crate::pipeline::StageKind;

/// The chunk table: all records ever created, keyed by coordinate.
pub type ChunkTable = FxHashMap<ChunkCoord, ChunkRecord>;

/// Where a chunk sits in the generation pipeline.
///
/// Stages advance strictly in order and only during the main-thread
/// drain; background workers never touch a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkStage {
    /// Waiting for elevation + biome grids.
    ElevationPending,
    /// Grids present; waiting for mesh + splat buffers.
    MeshPending,
    /// Mesh present; waiting for placement data.
    PlacementPending,
    /// All three artifacts present.
    Complete,
    /// The named stage faulted. The record keeps the artifacts of every
    /// earlier stage and is only retried after leaving and re-entering
    /// the view window.
    Faulted { stage: StageKind },
}

/// All state for one streamed chunk.
///
/// Created by the streamer on first request and touched exclusively by
/// the main thread afterwards; workers receive only cheap `Arc` clones
/// of the immutable grids.
#[derive(Debug)]
pub struct ChunkRecord {
    /// Identity key.
    pub coord: ChunkCoord,
    /// World-plane footprint used for visibility tests.
    pub bounds: Aabb2,
    /// Pipeline position.
    pub stage: ChunkStage,
    /// LOD factor the streamer currently wants for this chunk.
    pub desired_lod: u32,
    /// LOD factor of the mesh currently stored, if any.
    pub built_lod: Option<u32>,
    /// Stage-1 elevation grid, shared with later stages.
    pub elevation: Option<Arc<ElevationGrid>>,
    /// Stage-1 biome grid, shared with later stages.
    pub biomes: Option<Arc<BiomeGrid>>,
    /// Stage-2 mesh buffer, awaiting GPU upload by the consumer.
    pub mesh: Option<MeshBuffer>,
    /// Stage-2 splat weights.
    pub splat: Option<SplatBuffer>,
    /// Stage-3 placement candidates.
    pub placements: Option<Vec<Placement>>,
    /// Inside the view distance as of the last tick.
    pub visible: bool,
    /// Tick index when this chunk was last visible.
    pub last_visible_tick: u64,
}

impl ChunkRecord {
    /// Fresh record for a newly-requested chunk.
    pub fn new(coord: ChunkCoord, bounds: Aabb2, desired_lod: u32, tick: u64) -> Self {
        Self {
            coord,
            bounds,
            stage: ChunkStage::ElevationPending,
            desired_lod,
            built_lod: None,
            elevation: None,
            biomes: None,
            mesh: None,
            splat: None,
            placements: None,
            visible: false,
            last_visible_tick: tick,
        }
    }

    /// True once stage 1 has delivered both grids.
    pub fn has_grids(&self) -> bool {
        self.elevation.is_some() && self.biomes.is_some()
    }
}
