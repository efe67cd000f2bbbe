//! Level-of-detail heightfield meshing.
//!
//! A LOD factor collapses the sampling stride over the elevation grid:
//! factor 1 keeps every sample, factor `k` keeps every `k`-th, producing
//! `(resolution / k + 1)^2` vertices covering the same world extent.

use terra_world::ElevationGrid;

use crate::vertex::MeshBuffer;

/// Errors from mesh construction.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    /// The LOD factor must be at least 1.
    #[error("LOD factor must be >= 1, got {0}")]
    ZeroLod(u32),
    /// The LOD factor must divide the grid resolution so strided rows
    /// still land on the grid's far edge.
    #[error("LOD factor {lod_factor} does not divide resolution {resolution}")]
    LodMismatch { resolution: u32, lod_factor: u32 },
}

/// Build a mesh from an elevation grid at the given LOD factor.
///
/// Vertices sit at `(x * cell_size, elevation, y * cell_size)` with UVs
/// `(x / resolution, y / resolution)`; each retained 2x2 sample block
/// emits the triangles `(v, v + row, v + 1)` and
/// `(v + 1, v + row, v + row + 1)` where `row` is the strided row width.
/// The winding is identical at every LOD factor, so recomputed normals
/// face the same way on every level.
pub fn build_mesh(
    grid: &ElevationGrid,
    lod_factor: u32,
    cell_size: f32,
) -> Result<MeshBuffer, MeshError> {
    if lod_factor == 0 {
        return Err(MeshError::ZeroLod(lod_factor));
    }
    let resolution = grid.resolution();
    if resolution % lod_factor != 0 {
        return Err(MeshError::LodMismatch {
            resolution,
            lod_factor,
        });
    }

    let row = resolution / lod_factor + 1;
    let vertex_count = (row * row) as usize;
    let mut mesh = MeshBuffer {
        positions: Vec::with_capacity(vertex_count),
        uvs: Vec::with_capacity(vertex_count),
        indices: Vec::with_capacity(((row - 1) * (row - 1) * 6) as usize),
    };

    let mut v: u32 = 0;
    let mut y = 0;
    while y <= resolution {
        let mut x = 0;
        while x <= resolution {
            mesh.positions.push([
                x as f32 * cell_size,
                grid.get(x, y),
                y as f32 * cell_size,
            ]);
            mesh.uvs
                .push([x as f32 / resolution as f32, y as f32 / resolution as f32]);

            if x < resolution && y < resolution {
                mesh.indices
                    .extend_from_slice(&[v, v + row, v + 1, v + 1, v + row, v + row + 1]);
            }

            v += 1;
            x += lod_factor;
        }
        y += lod_factor;
    }

    Ok(mesh)
}
