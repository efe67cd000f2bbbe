//! Dense per-chunk sample grids.
//!
//! A chunk with logical resolution `N` stores `(N + 1) x (N + 1)` samples
//! so that adjacent chunks share their edge row/column of world positions.
//! Grids are built once on a worker thread and immutable afterwards
//! (shared behind `Arc` once handed off).

use crate::BiomeId;

/// Dense row-major grid of elevation samples for one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct ElevationGrid {
    resolution: u32,
    values: Vec<f32>,
}

impl ElevationGrid {
    /// Create a zero-filled grid for a chunk of logical resolution
    /// `resolution` (cells per side; `resolution + 1` samples per side).
    pub fn new(resolution: u32) -> Self {
        let side = resolution as usize + 1;
        Self {
            resolution,
            values: vec![0.0; side * side],
        }
    }

    /// Logical resolution (cells per side).
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Samples per side (`resolution + 1`).
    pub fn side(&self) -> u32 {
        self.resolution + 1
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x <= self.resolution && y <= self.resolution);
        (y * self.side() + x) as usize
    }

    /// Elevation at sample `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` exceeds the resolution.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[self.index(x, y)]
    }

    /// Set the elevation at sample `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` exceeds the resolution.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        let i = self.index(x, y);
        self.values[i] = value;
    }

    /// Raw row-major sample slice.
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Dense row-major grid of biome assignments, same shape as [`ElevationGrid`].
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeGrid {
    resolution: u32,
    values: Vec<BiomeId>,
}

impl BiomeGrid {
    /// Create a grid filled with `fill` for a chunk of logical resolution
    /// `resolution`.
    pub fn new(resolution: u32, fill: BiomeId) -> Self {
        let side = resolution as usize + 1;
        Self {
            resolution,
            values: vec![fill; side * side],
        }
    }

    /// Logical resolution (cells per side).
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Samples per side (`resolution + 1`).
    pub fn side(&self) -> u32 {
        self.resolution + 1
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x <= self.resolution && y <= self.resolution);
        (y * self.side() + x) as usize
    }

    /// Biome at sample `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` exceeds the resolution.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> BiomeId {
        self.values[self.index(x, y)]
    }

    /// Set the biome at sample `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` exceeds the resolution.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, id: BiomeId) {
        let i = self.index(x, y);
        self.values[i] = id;
    }

    /// Raw row-major sample slice.
    pub fn values(&self) -> &[BiomeId] {
        &self.values
    }
}
