//! Mesh buffer and GPU-facing vertex layout.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

/// Interleaved vertex layout matching a position + UV vertex buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    /// World-space position relative to the chunk origin.
    pub position: [f32; 3],
    /// Texture coordinate in `[0, 1]^2` across the chunk.
    pub uv: [f32; 2],
}

// 20 bytes, no padding: safe to upload as a packed vertex buffer.
const_assert_eq!(std::mem::size_of::<TerrainVertex>(), 20);

/// A renderable chunk mesh: vertex positions, UVs, and triangle indices.
///
/// Built once per chunk per LOD factor. Immutable after construction;
/// the consumer uploads it to GPU buffers on the owning thread.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffer {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshBuffer {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleave positions and UVs into a packed vertex array.
    pub fn interleaved(&self) -> Vec<TerrainVertex> {
        self.positions
            .iter()
            .zip(&self.uvs)
            .map(|(&position, &uv)| TerrainVertex { position, uv })
            .collect()
    }
}
