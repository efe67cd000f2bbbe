//! Chunk streaming: the staged background generation pipeline and the
//! viewer-driven streamer that feeds it.
//!
//! One logical main thread owns the chunk table, calls
//! [`TerrainStreamer::tick`] once per frame, and is the only place
//! finished buffers become visible; a bounded worker pool computes
//! elevation, mesh/splat, and placement artifacts and hands them back
//! through per-stage result queues drained during the tick.

mod error;
mod events;
mod lod;
mod pipeline;
mod record;
mod streamer;

pub use error::StreamerError;
pub use events::ChunkEvent;
pub use lod::LodLadder;
pub use pipeline::{GenerationPipeline, StageContext, StageKind};
pub use record::{ChunkRecord, ChunkStage, ChunkTable};
pub use streamer::TerrainStreamer;
