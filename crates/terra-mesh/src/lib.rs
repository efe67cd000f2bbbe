//! CPU-side terrain mesh and splat-weight construction.
//!
//! Everything in this crate is a pure function of its inputs and safe to
//! run on worker threads. The produced buffers are raw arrays; committing
//! them to GPU resources is the consumer's job and happens only on the
//! thread that owns the render context.

mod builder;
mod splat;
mod vertex;

pub use builder::{MeshError, build_mesh};
pub use splat::{SPLAT_CHANNELS, SplatBuffer, SplatStrategy, build_splat};
pub use vertex::{MeshBuffer, TerrainVertex};
