//! Chunk lifecycle events returned from the per-tick drain.

use terra_world::ChunkCoord;

use crate::pipeline::StageKind;

/// An observable chunk state change, emitted in drain order from
/// [`crate::TerrainStreamer::tick`].
///
/// Events are delivered on the thread that called `tick`, which is the
/// only correct place to create GPU resources from the finished buffers
/// stored on the [`crate::ChunkRecord`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkEvent {
    /// Stage 1 finished: elevation and biome grids are on the record.
    ElevationReady { coord: ChunkCoord },
    /// Stage 2 finished: mesh and splat buffers are on the record,
    /// built at the given LOD factor. Upload them now.
    MeshReady { coord: ChunkCoord, lod_factor: u32 },
    /// Stage 3 finished: placement candidates are on the record.
    PlacementsReady { coord: ChunkCoord, count: usize },
    /// A background stage faulted; the chunk keeps its last completed
    /// artifacts and will not be retried while it stays in view.
    ChunkFaulted { coord: ChunkCoord, stage: StageKind },
    /// The record was evicted after prolonged invisibility.
    ChunkEvicted { coord: ChunkCoord },
}
