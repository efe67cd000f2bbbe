//! Splat-weight generation: per-texel texture-blend weights.
//!
//! Two strategies, selected by configuration: biome-indexed (each biome
//! owns a fixed channel) and height-banded (the channel of the first
//! biome whose height band contains the normalized elevation). Under
//! either strategy exactly one channel is set to full weight per texel;
//! there is no cross-band blending in this design.

use terra_gen::BiomeRegistry;
use terra_world::{BiomeGrid, BiomeId, ElevationGrid};

/// Weight channels per splat texel (RGBA).
pub const SPLAT_CHANNELS: usize = 4;

/// How splat channels are assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplatStrategy {
    /// Channel = biome index modulo [`SPLAT_CHANNELS`].
    BiomeIndexed,
    /// Channel of the first registered biome whose `[height_min,
    /// height_max]` band contains the elevation, normalized against the
    /// observed global range.
    HeightBanded,
}

/// Per-texel RGBA blend weights for one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct SplatBuffer {
    side: u32,
    weights: Vec<[f32; SPLAT_CHANNELS]>,
}

impl SplatBuffer {
    /// Texels per side (matches the grid's samples per side).
    pub fn side(&self) -> u32 {
        self.side
    }

    /// Weights at texel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` is outside the texel grid.
    pub fn get(&self, x: u32, y: u32) -> [f32; SPLAT_CHANNELS] {
        assert!(x < self.side && y < self.side);
        self.weights[(y * self.side + x) as usize]
    }

    /// Raw row-major weight slice.
    pub fn weights(&self) -> &[[f32; SPLAT_CHANNELS]] {
        &self.weights
    }
}

/// Build the splat weights for one chunk.
///
/// `observed_range` is the global `(min, max)` elevation seen so far;
/// only the height-banded strategy reads it.
pub fn build_splat(
    strategy: SplatStrategy,
    elevation: &ElevationGrid,
    biomes: &BiomeGrid,
    registry: &BiomeRegistry,
    observed_range: (f32, f32),
) -> SplatBuffer {
    let side = elevation.side();
    let mut weights = Vec::with_capacity((side * side) as usize);

    for y in 0..side {
        for x in 0..side {
            let channel = match strategy {
                SplatStrategy::BiomeIndexed => channel_for(biomes.get(x, y)),
                SplatStrategy::HeightBanded => {
                    height_band_channel(elevation.get(x, y), registry, observed_range)
                }
            };
            let mut texel = [0.0; SPLAT_CHANNELS];
            texel[channel] = 1.0;
            weights.push(texel);
        }
    }

    SplatBuffer { side, weights }
}

#[inline]
fn channel_for(id: BiomeId) -> usize {
    id.0 as usize % SPLAT_CHANNELS
}

fn height_band_channel(
    elevation: f32,
    registry: &BiomeRegistry,
    (min, max): (f32, f32),
) -> usize {
    let range = max - min;
    let t = if range > 0.0 {
        ((elevation - min) / range).clamp(0.0, 1.0)
    } else {
        0.0
    };
    for (id, def) in registry.iter() {
        if t >= def.height_min && t <= def.height_max {
            return channel_for(id);
        }
    }
    // No band matched (gaps in the configured ladder): fall back to the
    // last registered biome.
    channel_for(BiomeId(registry.len().saturating_sub(1) as u16))
}
