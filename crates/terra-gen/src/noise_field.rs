//! Multi-octave fractal value-noise elevation sampler.
//!
//! Composites octaves of coherent 2D value noise, with per-biome
//! amplitude/frequency/persistence/lacunarity, to produce elevation
//! values with features at many spatial frequencies.

use std::hash::{DefaultHasher, Hash, Hasher};

use noise::{NoiseFn, Value};

/// Octave amplitudes below this contribute less than visual precision
/// and terminate the accumulation loop early.
const MIN_AMPLITUDE: f64 = 1e-3;

/// Per-biome fractal noise parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseParams {
    /// Amplitude of the first octave, in world height units.
    pub amplitude: f64,
    /// Frequency of the first octave, in cycles per chunk width.
    pub frequency: f64,
    /// Amplitude multiplier between successive octaves, in `(0, 1)`.
    pub persistence: f64,
    /// Frequency multiplier between successive octaves. Default: 2.0.
    pub lacunarity: f64,
    /// Number of octaves to composite.
    pub octaves: u32,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            amplitude: 20.0,
            frequency: 1.0,
            persistence: 0.5,
            lacunarity: 2.0,
            octaves: 4,
        }
    }
}

impl NoiseParams {
    /// Theoretical maximum absolute elevation (geometric series sum of the
    /// octave amplitudes). The true bound regardless of octave count is
    /// `amplitude / (1 - persistence)`.
    pub fn max_amplitude(&self) -> f64 {
        let mut sum = 0.0;
        let mut amp = self.amplitude;
        for _ in 0..self.octaves {
            sum += amp;
            amp *= self.persistence;
        }
        sum
    }
}

/// Samples elevation as fractal Brownian motion over coherent value noise.
///
/// A single noise source is shared by every biome; the biome only varies
/// the octave parameters, so adjacent samples in different biomes read
/// from the same underlying field. Pure and `Send + Sync`: safe to call
/// concurrently from any number of worker threads.
pub struct FractalNoiseField {
    source: Value,
    inv_scale: f64,
}

impl FractalNoiseField {
    /// Create a field from a world seed and the world-space width that
    /// one frequency cycle spans (the chunk size).
    ///
    /// # Panics
    ///
    /// Panics if `world_scale` is not strictly positive.
    pub fn new(seed: u64, world_scale: f64) -> Self {
        assert!(world_scale > 0.0, "world_scale must be positive");
        // The backing source takes a 32-bit seed; hash the world seed
        // down so its high bits still influence the field.
        let mut hasher = DefaultHasher::new();
        seed.hash(&mut hasher);
        Self {
            source: Value::new(hasher.finish() as u32),
            inv_scale: 1.0 / world_scale,
        }
    }

    /// Sample the accumulated octave noise at a world-plane position.
    ///
    /// Each octave samples the value-noise source at
    /// `(x * inv_scale * freq, y * inv_scale * freq)` (noise output in
    /// `[-1, 1]`), scales by the running amplitude, and accumulates; then
    /// `freq *= lacunarity`, `amp *= persistence`. Octaves whose amplitude
    /// has decayed below `1e-3` are skipped (negligible contribution).
    pub fn sample(&self, world_x: f64, world_y: f64, params: &NoiseParams) -> f32 {
        let mut total = 0.0;
        let mut frequency = params.frequency;
        let mut amplitude = params.amplitude;

        for _ in 0..params.octaves {
            if amplitude < MIN_AMPLITUDE {
                break;
            }
            let nx = world_x * self.inv_scale * frequency;
            let ny = world_y * self.inv_scale * frequency;
            total += self.source.get([nx, ny]) * amplitude;

            frequency *= params.lacunarity;
            amplitude *= params.persistence;
        }

        total as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn field(seed: u64) -> FractalNoiseField {
        FractalNoiseField::new(seed, 240.0)
    }

    #[test]
    fn test_determinism_same_seed_same_coord() {
        let params = NoiseParams::default();
        let a = field(42).sample(100.0, 200.0, &params);
        let b = field(42).sample(100.0, 200.0, &params);
        assert_eq!(a, b, "same seed + same coord must match: {a} vs {b}");
    }

    #[test]
    fn test_different_seeds_produce_different_elevations() {
        let params = NoiseParams::default();
        let a = field(1).sample(500.0, 500.0, &params);
        let b = field(999).sample(500.0, 500.0, &params);
        assert!(
            (f64::from(a) - f64::from(b)).abs() > EPSILON,
            "different seeds should diverge: {a} vs {b}"
        );
    }

    #[test]
    fn test_high_seed_bits_change_the_field() {
        let params = NoiseParams::default();
        let a = field(7).sample(500.0, 500.0, &params);
        let b = field(7 | (1 << 40)).sample(500.0, 500.0, &params);
        assert!(
            (f64::from(a) - f64::from(b)).abs() > EPSILON,
            "seeds differing only in high bits must diverge: {a} vs {b}"
        );
    }

    #[test]
    fn test_elevation_bounded_by_geometric_series() {
        // |sum| <= amplitude / (1 - persistence) for any octave count.
        let params = NoiseParams {
            amplitude: 20.0,
            persistence: 0.5,
            octaves: 32,
            ..Default::default()
        };
        let bound = params.amplitude / (1.0 - params.persistence);
        let f = field(7);
        for i in 0..2_000 {
            let x = i as f64 * 13.7;
            let y = i as f64 * -5.3;
            let h = f64::from(f.sample(x, y, &params));
            assert!(
                h.abs() <= bound,
                "elevation {h} at ({x}, {y}) exceeds bound {bound}"
            );
        }
    }

    #[test]
    fn test_amplitude_cutoff_matches_full_accumulation() {
        // With persistence 0.5 and amplitude 20, octaves beyond ~15 fall
        // under the 1e-3 cutoff; adding more octaves must not change the
        // result.
        let base = NoiseParams {
            octaves: 15,
            ..Default::default()
        };
        let extended = NoiseParams {
            octaves: 64,
            ..base.clone()
        };
        let f = field(42);
        let a = f.sample(321.0, 123.0, &base);
        let b = f.sample(321.0, 123.0, &extended);
        assert_eq!(a, b, "octaves past the cutoff must contribute nothing");
    }

    #[test]
    fn test_zero_amplitude_returns_zero() {
        let params = NoiseParams {
            amplitude: 0.0,
            ..Default::default()
        };
        let h = field(42).sample(123.0, 456.0, &params);
        assert_eq!(h, 0.0, "zero amplitude should produce zero elevation");
    }

    #[test]
    fn test_max_amplitude_geometric_sum() {
        let params = NoiseParams {
            amplitude: 1000.0,
            persistence: 0.5,
            octaves: 4,
            ..Default::default()
        };
        assert!((params.max_amplitude() - 1875.0).abs() < EPSILON);
    }

    #[test]
    fn test_more_octaves_adds_detail() {
        let one = NoiseParams {
            octaves: 1,
            ..Default::default()
        };
        let eight = NoiseParams {
            octaves: 8,
            ..Default::default()
        };
        let f = field(7);
        let step = 0.5;
        let count = 1000;
        let mut diff_1 = 0.0_f64;
        let mut diff_8 = 0.0_f64;
        for i in 0..count {
            let x = i as f64 * step;
            diff_1 += f64::from(f.sample(x + step, 0.0, &one) - f.sample(x, 0.0, &one)).abs();
            diff_8 += f64::from(f.sample(x + step, 0.0, &eight) - f.sample(x, 0.0, &eight)).abs();
        }
        assert!(
            diff_8 > diff_1,
            "8 octaves should carry more high-frequency detail: {diff_1} vs {diff_8}"
        );
    }
}
