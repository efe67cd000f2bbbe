//! Distance-based LOD factor selection.

use terra_config::LodConfig;

/// Maps viewer distance to a mesh stride factor.
///
/// `factors[i]` applies to distances below `thresholds[i]`; the last
/// factor extends to infinity. Built from an already-validated
/// [`LodConfig`], so the invariants (strictly increasing thresholds,
/// one more factor than thresholds, factors divide the resolution)
/// hold by construction.
#[derive(Clone, Debug)]
pub struct LodLadder {
    thresholds: Vec<f32>,
    factors: Vec<u32>,
}

impl LodLadder {
    /// Build a ladder from validated configuration.
    pub fn from_config(config: &LodConfig) -> Self {
        debug_assert_eq!(config.factors.len(), config.thresholds.len() + 1);
        Self {
            thresholds: config.thresholds.clone(),
            factors: config.factors.clone(),
        }
    }

    /// The stride factor for a chunk at `distance` from the viewer.
    ///
    /// Distances below the first threshold get full detail; beyond the
    /// last threshold the coarsest factor applies.
    pub fn select(&self, distance: f32) -> u32 {
        debug_assert!(distance >= 0.0, "distance must be non-negative");
        for (i, &threshold) in self.thresholds.iter().enumerate() {
            if distance < threshold {
                return self.factors[i];
            }
        }
        *self.factors.last().expect("ladder has at least one factor")
    }

    /// The finest configured factor.
    pub fn finest(&self) -> u32 {
        self.factors[0]
    }
}
